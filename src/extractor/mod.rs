//! 画像からのメタデータ抽出
//!
//! exiftoolを優先し、起動できない・何も返さない場合はExifを直接読む。

mod exif;
mod exiftool;

pub use self::exif::{format_exposure_time, format_focal_length, read_fields};
pub use self::exiftool::{parse_output, run_exiftool};

use crate::config::SelectorConfig;
use crate::error::Result;
use rt_profile_common::FieldSet;
use std::path::{Path, PathBuf};
use std::process::Command;

/// フィールド一覧ファイルの名前（キャッシュフォルダ内）
pub const FIELD_LISTING_FILE_NAME: &str = "exif_fields.txt";

/// 画像のフィールドを抽出
///
/// どちらの方法でも取れなければ空のフィールドセット（エラーにはしない）。
pub fn extract_fields(image: &Path, config: &SelectorConfig) -> FieldSet {
    match run_exiftool(&config.exiftool, image, config.encoding) {
        Ok(fields) if !fields.is_empty() => {
            tracing::debug!("exiftool: {}フィールド", fields.len());
            return fields;
        }
        Ok(_) => tracing::warn!("exiftoolの出力が空です: {}", image.display()),
        Err(e) => tracing::warn!("{}", e),
    }

    match read_fields(image) {
        Ok(fields) => {
            tracing::info!("Exifを直接読み込み: {}フィールド", fields.len());
            fields
        }
        Err(e) => {
            tracing::warn!("Exifを読めません: {}", e);
            FieldSet::new()
        }
    }
}

/// `key=value` の一覧
pub fn format_fields(fields: &FieldSet) -> String {
    let mut out = String::new();
    for (name, value) in fields {
        out.push_str(name);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// ルール作成用のフィールド一覧を書き出す
pub fn write_field_listing(fields: &FieldSet, image: &Path, cache_dir: &Path) -> Result<PathBuf> {
    let path = cache_dir.join(FIELD_LISTING_FILE_NAME);
    let text = format!(
        "You are seeing this file because ViewExifKeys is enabled in RTProfileSelector.ini.\n\n\
         Exif fields for image [{}]:\n\n{}",
        image.display(),
        format_fields(fields)
    );
    std::fs::write(&path, text)?;
    Ok(path)
}

/// フィールド一覧を書き出してテキストビューアで開く（終了を待たない）
pub fn show_fields(fields: &FieldSet, image: &Path, cache_dir: &Path, viewer: &str) -> Result<()> {
    let path = write_field_listing(fields, image, cache_dir)?;
    let child = Command::new(viewer).arg(&path).spawn()?;
    tracing::debug!("ビューア起動: {} (pid {})", viewer, child.id());
    Ok(())
}
