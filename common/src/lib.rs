//! RTProfileSelector Common Library
//!
//! Exifフィールドとルールの照合、部分プロファイルの集約、
//! .pp3 プロファイルへのマージを行うコア部分（ファイル書き込みやCLIは含まない）

pub mod aggregator;
pub mod error;
pub mod ini;
pub mod matcher;
pub mod merge;
pub mod numeric;
pub mod overrides;
pub mod paths;
pub mod rules;
pub mod types;

pub use aggregator::{Aggregator, DocumentSource, FsSource, ProfileLocations};
pub use error::{Error, Result};
pub use ini::{Document, Entry, ParseMode, Section};
pub use matcher::{match_value, RuleExpr};
pub use merge::{merge_profile, MergeOutput};
pub use overrides::OverrideSet;
pub use paths::PathStyle;
pub use rules::{
    select_best_full_match, select_partial_matches, FullMatch, PartialMatch, TargetSections,
};
pub use types::{FieldSet, TextEncoding};
