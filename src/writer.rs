//! 出力ファイルの書き込み
//!
//! - 生成したプロファイル: 同じフォルダの一時ファイルに書いてから置き換える
//! - デバッグ用の副産物（トレース・最終プロファイルのコピー・フィールド一覧）:
//!   失敗しても警告のみ

use crate::config::SelectorConfig;
use crate::error::{Result, SelectorError};
use crate::extractor::format_fields;
use rt_profile_common::FieldSet;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// テキストをアトミックに書き込む
///
/// 置き換えは1回のリネームで行う。失敗した場合、既存のファイルはそのまま残る。
pub fn write_atomic(target: &Path, text: &str) -> Result<()> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let write_err =
        |e: std::io::Error| SelectorError::ProfileWrite(format!("{}: {}", target.display(), e));

    let mut temp = NamedTempFile::new_in(parent).map_err(write_err)?;
    temp.write_all(text.as_bytes()).map_err(write_err)?;
    temp.flush().map_err(write_err)?;
    temp.persist(target).map_err(|e| write_err(e.error))?;

    tracing::debug!("書き込み: {}", target.display());
    Ok(())
}

/// デバッグトレースの先頭
pub fn trace_header(image: &Path, profile: &Path) -> String {
    format!(
        "; RTProfileSelector debug trace\n; Image: {}\n; Base profile: {}\n; Created: {}\n\n",
        image.display(),
        profile.display(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

/// デバッグ用ファイルをまとめて書く（DebugFiles=1 のとき）
pub fn write_debug_files(
    config: &SelectorConfig,
    image: &Path,
    profile: &Path,
    fields: &FieldSet,
    text: &str,
    trace: &str,
) {
    if !config.debug_files {
        return;
    }

    let trace = format!("{}{}", trace_header(image, profile), trace);
    let files = [
        (config.debug_trace_path(), trace.as_str()),
        (config.last_profile_path(), text),
    ];
    for (path, content) in files {
        write_side_file(&path, content);
    }
    write_side_file(&config.fields_dump_path(), &format_fields(fields));
}

fn write_side_file(path: &Path, content: &str) {
    if let Err(e) = std::fs::write(path, content) {
        tracing::warn!("デバッグファイルを書けません: {}: {}", path.display(), e);
    }
}
