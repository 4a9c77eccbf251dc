//! 共有型の定義
//!
//! - FieldSet: 画像から抽出したメタデータ（exiftoolのフィールド名 → 値）
//! - TextEncoding: 構造化テキストを読む際の文字コード

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 抽出済みメタデータ（フィールド名は大文字小文字を区別）
pub type FieldSet = BTreeMap<String, String>;

/// ルール・プロファイル処理で参照するフィールド名
pub mod field {
    pub const LENS_ID: &str = "Lens ID";
    pub const LENS_TYPE: &str = "Lens Type";
    pub const LENS_MODEL: &str = "Lens Model";
    pub const CAMERA_MODEL: &str = "Camera Model Name";
    pub const MAKE: &str = "Make";
    pub const ISO: &str = "ISO";
    pub const FOCAL_LENGTH: &str = "Focal Length";
    pub const EXPOSURE_TIME: &str = "Exposure Time";
    pub const F_NUMBER: &str = "F Number";
    pub const DATE_TIME_ORIGINAL: &str = "Date/Time Original";
}

/// テキストファイルの文字コード
///
/// 読み込み関数に明示的に渡す。プロセス全体のロケールには依存しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1（1バイト = 1文字）
    Latin1,
}

impl TextEncoding {
    /// バイト列を文字列に変換（UTF-8の不正なバイトは置換文字になる）
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        }
    }
}

impl std::str::FromStr for TextEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            other => Err(Error::Config(format!("不明なエンコーディング: {}", other))),
        }
    }
}
