//! パス区切り文字の変換
//!
//! RawTherapeeのキーファイル/.pp3 では Windows のパスが `\\` で書かれる。
//! 対象の区切り規則を `PathStyle` で明示して変換する。

use serde::Serialize;

/// パスの区切り規則
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PathStyle {
    /// `\` 区切り。.pp3 への出力時は `\\` にエスケープする
    Windows,
    /// `/` 区切り
    Unix,
}

impl PathStyle {
    /// 実行中のOSの規則
    pub fn native() -> Self {
        if cfg!(windows) {
            PathStyle::Windows
        } else {
            PathStyle::Unix
        }
    }

    pub fn separator(&self) -> char {
        match self {
            PathStyle::Windows => '\\',
            PathStyle::Unix => '/',
        }
    }

    /// もう一方の規則の区切り文字
    pub fn reverse_separator(&self) -> char {
        match self {
            PathStyle::Windows => '/',
            PathStyle::Unix => '\\',
        }
    }
}

/// 連続した区切り文字（`\\` または `//`）を1つにする
pub fn remove_double_separators(path: &str, style: PathStyle) -> String {
    let sep = style.separator();
    let double: String = [sep, sep].iter().collect();
    path.replace(&double, &sep.to_string())
}

/// .pp3 に書くために区切り文字をエスケープする（Windowsのみ `\` → `\\`）
pub fn add_double_separators(path: &str, style: PathStyle) -> String {
    match style {
        PathStyle::Windows => path.replace('\\', "\\\\"),
        PathStyle::Unix => path.to_string(),
    }
}

/// .pp3 出力用に整形（既存のエスケープを外してから付け直す）
pub fn adjust_output_separators(path: &str, style: PathStyle) -> String {
    add_double_separators(&remove_double_separators(path, style), style)
}

/// 逆向きの区切り文字を規則の区切り文字に置き換える
pub fn to_style(path: &str, style: PathStyle) -> String {
    path.replace(style.reverse_separator(), &style.separator().to_string())
}
