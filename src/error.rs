use thiserror::Error;

#[derive(Error, Debug)]
pub enum SelectorError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("キーファイルが不正です: {0}")]
    InvalidKeyFile(String),

    #[error("ベースプロファイルを読めません: {path}: {source}")]
    ProfileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("プロファイルの書き込みに失敗: {0}")]
    ProfileWrite(String),

    #[error("exiftool実行エラー: {0}")]
    ExifTool(String),

    #[error("Exif読み込みエラー: {0}")]
    ExifRead(String),

    #[error("JSON変換エラー: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] rt_profile_common::Error),
}

pub type Result<T> = std::result::Result<T, SelectorError>;
