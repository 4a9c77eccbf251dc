//! メイン設定 `RTProfileSelector.ini`
//!
//! ```ini
//! [General]
//! RTCustomProfilesPath=C:\\Users\\me\\RawTherapee\\profiles
//! ExifTool=C:\\Tools\\exiftool.exe
//! ComplexRulesEnabled=1
//! ViewExifKeys=0
//! Encoding=utf-8
//! DebugFiles=1
//!
//! [ISO Profile Sections]
//! Directional Pyramid Denoising=1
//! ```
//!
//! `[General]` 以外のセクションは `@Sections=[グループ名]` の展開に使う。

use crate::error::{Result, SelectorError};
use rt_profile_common::aggregator::ProfileLocations;
use rt_profile_common::ini::{Document, ParseMode};
use rt_profile_common::paths::{remove_double_separators, PathStyle};
use rt_profile_common::TextEncoding;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "RTProfileSelector.ini";
pub const RULES_FILE_NAME: &str = "RTProfileSelectorRules.ini";
pub const LOG_FILE_NAME: &str = "RTProfileSelector.log";
pub const DEBUG_TRACE_FILE_NAME: &str = "RTProfileSelector.debug.txt";
pub const LAST_PROFILE_FILE_NAME: &str = "RTProfileSelector.last.pp3";
pub const FIELDS_DUMP_FILE_NAME: &str = "RTProfileSelector.fields.txt";
pub const ISO_PROFILES_DIR: &str = "ISO Profiles";
pub const LENS_PROFILES_DIR: &str = "Lens Profiles";

const GENERAL_SECTION: &str = "General";

mod keys {
    pub const CUSTOM_PROFILES_PATH: &str = "RTCustomProfilesPath";
    pub const EXIFTOOL: &str = "ExifTool";
    pub const COMPLEX_RULES: &str = "ComplexRulesEnabled";
    pub const VIEW_EXIF_KEYS: &str = "ViewExifKeys";
    pub const TEXT_VIEWER: &str = "TextViewer";
    pub const ENCODING: &str = "Encoding";
    pub const DEBUG_FILES: &str = "DebugFiles";
}

#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// 設定・ルール・部分プロファイルを置くフォルダ
    pub base_dir: PathBuf,
    /// 未指定ならキーファイルの DefaultProcParams のフォルダ
    pub custom_profiles_dir: Option<PathBuf>,
    pub exiftool: String,
    pub complex_rules: bool,
    pub view_exif_keys: bool,
    pub text_viewer: String,
    pub encoding: TextEncoding,
    pub debug_files: bool,
    /// 設定ファイル全体（グループ展開・ISOフィルタ用）
    pub document: Document,
}

impl SelectorConfig {
    /// `<base_dir>/RTProfileSelector.ini` を読み込む
    ///
    /// ファイルがなければ既定値。フォルダがない・`Encoding` が不正な場合はエラー。
    pub fn load(base_dir: &Path) -> Result<Self> {
        if !base_dir.is_dir() {
            return Err(SelectorError::Config(format!(
                "フォルダが見つかりません: {}",
                base_dir.display()
            )));
        }

        let path = base_dir.join(CONFIG_FILE_NAME);
        let mut document = Document::load(&path, ParseMode::Unique, TextEncoding::Utf8);

        let encoding: TextEncoding = document
            .value(GENERAL_SECTION, keys::ENCODING)
            .unwrap_or_default()
            .parse()?;
        if encoding != TextEncoding::Utf8 {
            document = Document::load(&path, ParseMode::Unique, encoding);
        }

        Ok(Self::from_document(base_dir, document, encoding))
    }

    pub fn from_document(base_dir: &Path, document: Document, encoding: TextEncoding) -> Self {
        let style = PathStyle::native();
        let general = |key: &str| {
            document
                .value(GENERAL_SECTION, key)
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let custom_profiles_dir = general(keys::CUSTOM_PROFILES_PATH)
            .map(|p| PathBuf::from(remove_double_separators(p, style)));

        let exiftool = general(keys::EXIFTOOL)
            .map(|p| remove_double_separators(p, style))
            .unwrap_or_else(|| default_exiftool(base_dir));

        let text_viewer = general(keys::TEXT_VIEWER)
            .map(str::to_string)
            .unwrap_or_else(default_text_viewer);

        let complex_rules = general(keys::COMPLEX_RULES) != Some("0");
        let view_exif_keys = general(keys::VIEW_EXIF_KEYS) == Some("1");
        let debug_files = general(keys::DEBUG_FILES) == Some("1");

        Self {
            base_dir: base_dir.to_path_buf(),
            custom_profiles_dir,
            exiftool,
            complex_rules,
            view_exif_keys,
            text_viewer,
            encoding,
            debug_files,
            document,
        }
    }

    /// 実行ファイルのフォルダ（取得できなければユーザー設定フォルダ）
    pub fn default_base_dir() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .or_else(|| dirs::config_dir().map(|d| d.join("RTProfileSelector")))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn rules_path(&self) -> PathBuf {
        self.base_dir.join(RULES_FILE_NAME)
    }

    pub fn debug_trace_path(&self) -> PathBuf {
        self.base_dir.join(DEBUG_TRACE_FILE_NAME)
    }

    pub fn last_profile_path(&self) -> PathBuf {
        self.base_dir.join(LAST_PROFILE_FILE_NAME)
    }

    pub fn fields_dump_path(&self) -> PathBuf {
        self.base_dir.join(FIELDS_DUMP_FILE_NAME)
    }

    /// 部分プロファイルの置き場所
    ///
    /// # Arguments
    /// * `default_profile_dir` - RTCustomProfilesPath 未指定時に使うフォルダ
    pub fn profile_locations(&self, default_profile_dir: &Path) -> ProfileLocations {
        ProfileLocations {
            custom_profiles_dir: self
                .custom_profiles_dir
                .clone()
                .unwrap_or_else(|| default_profile_dir.to_path_buf()),
            iso_profiles_dir: self.base_dir.join(ISO_PROFILES_DIR),
            lens_profiles_dir: self.base_dir.join(LENS_PROFILES_DIR),
            path_style: PathStyle::native(),
        }
    }
}

fn default_exiftool(base_dir: &Path) -> String {
    if cfg!(windows) {
        base_dir.join("exiftool").display().to_string()
    } else {
        "exiftool".to_string()
    }
}

fn default_text_viewer() -> String {
    if cfg!(windows) {
        "notepad.exe".to_string()
    } else {
        "gedit".to_string()
    }
}
