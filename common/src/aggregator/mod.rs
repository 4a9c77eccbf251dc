//! 部分プロファイルの集約
//!
//! 3種類の部分プロファイルを決まった順に上書きセットへ積み上げる。
//! 後の処理が前の処理の同じエントリを上書きする。
//!
//! ## 処理順
//! 1. ルールで一致した部分プロファイル（ランク昇順、エントリ単位でマージ）
//! 2. カメラ/ISO別の部分プロファイル（セクション単位で置換）
//! 3. レンズ別の歪曲補正（`[LensProfile]` の置換、または `[Distortion] Amount` の計算）
//!
//! 最後に `[Version]` を取り除く（ベースプロファイルの値を常に使う）。
//! 各処理の失敗（数値が読めない・ファイルがない）はその処理だけを飛ばす。

pub mod iso;
pub mod lens;

use crate::ini::{Document, ParseMode};
use crate::overrides::OverrideSet;
use crate::paths::{to_style, PathStyle};
use crate::rules::PartialMatch;
use crate::types::{FieldSet, TextEncoding};
use std::path::{Path, PathBuf};

/// .pp3 のバージョンセクション
pub const VERSION_SECTION: &str = "Version";

/// 部分プロファイル文書の読み込み元
pub trait DocumentSource {
    /// Uniqueモードで読み込む。読めなければ空の文書
    fn load(&self, path: &Path) -> Document;
}

/// ファイルシステムから読む
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource {
    pub encoding: TextEncoding,
}

impl FsSource {
    pub fn new(encoding: TextEncoding) -> Self {
        Self { encoding }
    }
}

impl DocumentSource for FsSource {
    fn load(&self, path: &Path) -> Document {
        Document::load(path, ParseMode::Unique, self.encoding)
    }
}

/// 部分プロファイルの置き場所
#[derive(Debug, Clone)]
pub struct ProfileLocations {
    /// RawTherapeeのカスタムプロファイルフォルダ
    pub custom_profiles_dir: PathBuf,
    /// `ISO Profiles` フォルダ
    pub iso_profiles_dir: PathBuf,
    /// `Lens Profiles` フォルダ
    pub lens_profiles_dir: PathBuf,
    /// 設定ファイル内のパスの区切り規則
    pub path_style: PathStyle,
}

impl ProfileLocations {
    /// 設定値のファイル名をフォルダと結合（逆向きの区切り文字は変換）
    pub fn resolve(&self, dir: &Path, name: &str) -> PathBuf {
        dir.join(to_style(name, self.path_style))
    }

    pub fn custom_profile(&self, name: &str) -> PathBuf {
        self.resolve(&self.custom_profiles_dir, name)
    }
}

/// 部分プロファイル集約
pub struct Aggregator<'a, S: DocumentSource> {
    source: &'a S,
    main_config: &'a Document,
    locations: &'a ProfileLocations,
}

impl<'a, S: DocumentSource> Aggregator<'a, S> {
    pub fn new(source: &'a S, main_config: &'a Document, locations: &'a ProfileLocations) -> Self {
        Self {
            source,
            main_config,
            locations,
        }
    }

    /// 3種類の部分プロファイルを集約して上書きセットを作る
    pub fn aggregate(&self, partials: &[PartialMatch], fields: &FieldSet) -> OverrideSet {
        let mut overrides = OverrideSet::new();

        self.apply_rule_partials(partials, &mut overrides);

        if !self.apply_iso_partial(fields, &mut overrides) {
            tracing::debug!("ISO別部分プロファイル: 適用なし");
        }
        if !self.apply_lens_partial(fields, &mut overrides) {
            tracing::debug!("レンズ別部分プロファイル: 適用なし");
        }

        overrides.remove_section(VERSION_SECTION);
        overrides
    }

    /// ルール一致した部分プロファイルをランク順にマージ
    pub fn apply_rule_partials(&self, partials: &[PartialMatch], overrides: &mut OverrideSet) {
        for partial in partials {
            let path = self.locations.custom_profile(&partial.profile_name);
            let doc = self.source.load(&path);
            if doc.is_empty() {
                tracing::debug!("部分プロファイルが空: {}", path.display());
                continue;
            }

            for section in doc.into_sections() {
                if partial.targets.contains(&section.name) {
                    overrides.merge_section(section);
                }
            }
        }
    }

    /// カメラ/ISO別の部分プロファイルを適用
    pub fn apply_iso_partial(&self, fields: &FieldSet, overrides: &mut OverrideSet) -> bool {
        iso::apply(self.source, self.main_config, self.locations, fields, overrides)
    }

    /// レンズ別の歪曲補正を適用
    pub fn apply_lens_partial(&self, fields: &FieldSet, overrides: &mut OverrideSet) -> bool {
        lens::apply(self.source, self.locations, fields, overrides)
    }
}
