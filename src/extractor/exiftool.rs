//! exiftool連携
//!
//! `exiftool -t -m -q -q <画像>` の出力（`フィールド名<TAB>値` の行）を読む。

use crate::error::{Result, SelectorError};
use rt_profile_common::{FieldSet, TextEncoding};
use std::path::Path;
use std::process::Command;

const EXIFTOOL_ARGS: [&str; 4] = ["-t", "-m", "-q", "-q"];

/// exiftoolを実行してフィールドを取得（終了まで待つ）
pub fn run_exiftool(exiftool: &str, image: &Path, encoding: TextEncoding) -> Result<FieldSet> {
    tracing::debug!(
        "exiftool呼び出し: {} {} \"{}\"",
        exiftool,
        EXIFTOOL_ARGS.join(" "),
        image.display()
    );

    let output = Command::new(exiftool)
        .args(EXIFTOOL_ARGS)
        .arg(image)
        .output()
        .map_err(|e| SelectorError::ExifTool(format!("{} を起動できません: {}", exiftool, e)))?;

    let stdout = encoding.decode(&output.stdout);

    if !output.status.success() && stdout.trim().is_empty() {
        let stderr = encoding.decode(&output.stderr);
        return Err(SelectorError::ExifTool(format!(
            "exiftool failed (code {:?}): {}",
            output.status.code(),
            stderr.trim()
        )));
    }

    Ok(parse_output(&stdout))
}

/// タブ区切りの出力を読む
///
/// タブのない行は無視。同じフィールド名は最初の値を使う。
pub fn parse_output(text: &str) -> FieldSet {
    let mut fields = FieldSet::new();
    for line in text.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let Some((name, value)) = line.split_once('\t') else {
            continue;
        };
        fields
            .entry(name.to_string())
            .or_insert_with(|| value.to_string());
    }
    fields
}
