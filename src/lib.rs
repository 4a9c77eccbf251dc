//! RTProfileSelector
//!
//! RawTherapeeのカスタムプロファイルビルダー。画像のExifフィールドをルールと照合して
//! .pp3 プロファイルを選び、部分プロファイルを重ねて書き出す。
//! 照合・集約・マージは rt_profile_common が行う。

pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod keyfile;
pub mod logging;
pub mod selector;
pub mod writer;
