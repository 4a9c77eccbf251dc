//! RawTherapee から渡されるキーファイル
//!
//! ```ini
//! [RT General]
//! ImageFileName=C:\\Photos\\DSCF0001.RAF
//! OutputProfileFileName=C:\\Temp\\out.pp3
//! CachePath=C:\\Users\\me\\AppData\\Local\\RawTherapee
//! DefaultProcParams=C:\\Users\\me\\RawTherapee\\profiles\\Default.pp3
//! ```

use crate::error::{Result, SelectorError};
use rt_profile_common::ini::{Document, ParseMode};
use rt_profile_common::paths::{remove_double_separators, PathStyle};
use rt_profile_common::TextEncoding;
use std::path::{Path, PathBuf};

pub const GENERAL_SECTION: &str = "RT General";

const IMAGE_FILE_NAME: &str = "ImageFileName";
const OUTPUT_PROFILE_FILE_NAME: &str = "OutputProfileFileName";
const CACHE_PATH: &str = "CachePath";
const DEFAULT_PROC_PARAMS: &str = "DefaultProcParams";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFile {
    /// 処理対象の画像
    pub image: PathBuf,
    /// 生成したプロファイルの書き込み先
    pub output_profile: PathBuf,
    /// RawTherapeeのキャッシュフォルダ
    pub cache_dir: PathBuf,
    /// ルールが一致しない場合のプロファイル
    pub default_profile: PathBuf,
}

impl KeyFile {
    pub fn load(path: &Path, encoding: TextEncoding) -> Result<Self> {
        let doc = Document::try_load(path, ParseMode::Unique, encoding).map_err(|e| {
            SelectorError::InvalidKeyFile(format!("{}: {}", path.display(), e))
        })?;
        Self::from_document(&doc, PathStyle::native())
    }

    pub fn from_document(doc: &Document, style: PathStyle) -> Result<Self> {
        let value = |key: &str| -> Result<String> {
            doc.value(GENERAL_SECTION, key)
                .filter(|v| !v.is_empty())
                .map(|v| remove_double_separators(v, style))
                .ok_or_else(|| {
                    SelectorError::InvalidKeyFile(format!(
                        "[{}] {} がありません",
                        GENERAL_SECTION, key
                    ))
                })
        };

        let image = value(IMAGE_FILE_NAME)?;
        let output_profile = value(OUTPUT_PROFILE_FILE_NAME)?;
        let cache_dir = value(CACHE_PATH)?;
        let default_profile = value(DEFAULT_PROC_PARAMS)?;

        if !default_profile.contains(style.separator()) {
            return Err(SelectorError::InvalidKeyFile(format!(
                "DefaultProcParams にフォルダが含まれていません: {}",
                default_profile
            )));
        }

        Ok(Self {
            image: PathBuf::from(image),
            output_profile: PathBuf::from(output_profile),
            cache_dir: PathBuf::from(cache_dir),
            default_profile: PathBuf::from(default_profile),
        })
    }

    /// デフォルトプロファイルのフォルダ（RTCustomProfilesPath 未指定時のカスタムプロファイルフォルダ）
    pub fn default_profile_dir(&self) -> &Path {
        self.default_profile.parent().unwrap_or_else(|| Path::new("."))
    }
}
