//! プロファイル選択の実行
//!
//! 1回の実行の流れ:
//! 1. キーファイルを読む
//! 2. 画像のフィールドを抽出
//! 3. 完全ルールでベースプロファイルを決める（一致なし → DefaultProcParams）
//! 4. 部分ルール・ISO・レンズの部分プロファイルを集約
//! 5. ベースプロファイルにマージして書き込む

use crate::config::SelectorConfig;
use crate::error::{Result, SelectorError};
use crate::extractor;
use crate::keyfile::KeyFile;
use crate::writer;
use rt_profile_common::ini::{Document, ParseMode};
use rt_profile_common::{
    merge_profile, select_best_full_match, select_partial_matches, Aggregator, FieldSet, FsSource,
    FullMatch, MergeOutput, OverrideSet, PartialMatch,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 実行結果の概要
#[derive(Debug, Clone, Serialize)]
pub struct SelectionReport {
    pub image: PathBuf,
    /// マージに使ったベースプロファイル（既定プロファイル未指定で一致なしなら `None`）
    pub base_profile: Option<PathBuf>,
    pub full_match: Option<FullMatch>,
    /// 適用順（ランク昇順）
    pub partial_matches: Vec<PartialMatch>,
    /// 上書きセットのセクション名と各エントリの出所
    pub overrides: Vec<OverrideSummary>,
    /// 書き込んだプロファイル（ドライランでは `None`）
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverrideSummary {
    pub section: String,
    pub entries: Vec<OverrideEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverrideEntry {
    pub key: String,
    pub value: String,
    pub source: String,
}

/// ルール照合と集約の結果（マージ前）
#[derive(Debug, Clone)]
pub struct Resolution {
    pub full_match: Option<FullMatch>,
    pub base_profile: Option<PathBuf>,
    pub partial_matches: Vec<PartialMatch>,
    pub overrides: OverrideSet,
}

impl Resolution {
    pub fn report(&self, image: &Path) -> SelectionReport {
        SelectionReport {
            image: image.to_path_buf(),
            base_profile: self.base_profile.clone(),
            full_match: self.full_match.clone(),
            partial_matches: self.partial_matches.clone(),
            overrides: summarize(&self.overrides),
            output: None,
        }
    }
}

impl SelectionReport {
    /// 整形済みJSON（`explain --json`）
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn summarize(overrides: &OverrideSet) -> Vec<OverrideSummary> {
    overrides
        .iter()
        .map(|(section, entries)| OverrideSummary {
            section: section.clone(),
            entries: entries
                .iter()
                .map(|(key, entry)| OverrideEntry {
                    key: key.clone(),
                    value: entry.value.clone(),
                    source: entry.source.clone(),
                })
                .collect(),
        })
        .collect()
}

pub struct Selector<'a> {
    config: &'a SelectorConfig,
    rules: Document,
}

impl<'a> Selector<'a> {
    /// ルール文書（Multiモード）を読み込む
    pub fn new(config: &'a SelectorConfig) -> Self {
        let rules = Document::load(&config.rules_path(), ParseMode::Multi, config.encoding);
        tracing::debug!("ルール: {}セクション", rules.len());
        Self::with_rules(config, rules)
    }

    pub fn with_rules(config: &'a SelectorConfig, rules: Document) -> Self {
        Self { config, rules }
    }

    /// ルール照合と部分プロファイルの集約
    ///
    /// # Arguments
    /// * `fields` - 画像のフィールド
    /// * `default_profile` - 完全ルールが一致しない場合のベースプロファイル
    /// * `default_profile_dir` - RTCustomProfilesPath 未指定時のカスタムプロファイルフォルダ
    pub fn resolve(
        &self,
        fields: &FieldSet,
        default_profile: Option<&Path>,
        default_profile_dir: &Path,
    ) -> Resolution {
        let complex = self.config.complex_rules;
        let locations = self.config.profile_locations(default_profile_dir);

        let full_match = select_best_full_match(&self.rules, fields, complex);
        let base_profile = match &full_match {
            Some(m) => Some(locations.custom_profile(&m.profile_name)),
            None => {
                tracing::info!("一致する完全ルールなし: 既定プロファイルを使用");
                default_profile.map(Path::to_path_buf)
            }
        };

        let partial_matches =
            select_partial_matches(&self.rules, &self.config.document, fields, complex);

        let source = FsSource::new(self.config.encoding);
        let overrides = Aggregator::new(&source, &self.config.document, &locations)
            .aggregate(&partial_matches, fields);

        Resolution {
            full_match,
            base_profile,
            partial_matches,
            overrides,
        }
    }

    /// 照合・集約してベースプロファイルにマージ
    pub fn select(
        &self,
        fields: &FieldSet,
        default_profile: &Path,
        default_profile_dir: &Path,
    ) -> Result<(Resolution, MergeOutput)> {
        let resolution = self.resolve(fields, Some(default_profile), default_profile_dir);
        let base = resolution
            .base_profile
            .clone()
            .unwrap_or_else(|| default_profile.to_path_buf());

        let bytes = std::fs::read(&base).map_err(|source| SelectorError::ProfileRead {
            path: base.display().to_string(),
            source,
        })?;
        let base_text = self.config.encoding.decode(&bytes);

        let merged = merge_profile(
            &base_text,
            &base.display().to_string(),
            resolution.overrides.clone(),
        );
        Ok((resolution, merged))
    }
}

/// RawTherapeeのキーファイルで1回分の選択を実行
pub fn run_keyfile(config: &SelectorConfig, keyfile_path: &Path) -> Result<SelectionReport> {
    let key = KeyFile::load(keyfile_path, config.encoding)?;
    tracing::info!("画像: {}", key.image.display());

    let fields = extractor::extract_fields(&key.image, config);
    // フィールドが取れなかった画像では一覧を出さない
    if config.view_exif_keys && !fields.is_empty() {
        let shown =
            extractor::show_fields(&fields, &key.image, &key.cache_dir, &config.text_viewer);
        if let Err(e) = shown {
            tracing::warn!("フィールド一覧を表示できません: {}", e);
        }
    }

    let (report, merged) = select_for_image(
        config,
        &key.image,
        &fields,
        &key.default_profile,
        key.default_profile_dir(),
    )?;

    writer::write_atomic(&key.output_profile, &merged.text)?;

    let base = report.base_profile.as_deref().unwrap_or(&key.default_profile);
    writer::write_debug_files(config, &key.image, base, &fields, &merged.text, &merged.trace);

    tracing::info!(
        "プロファイル生成: {} (ベース: {})",
        key.output_profile.display(),
        base.display()
    );

    Ok(SelectionReport {
        output: Some(key.output_profile.clone()),
        ..report
    })
}

/// フィールドからプロファイルを選択してマージ（書き込みはしない）
pub fn select_for_image(
    config: &SelectorConfig,
    image: &Path,
    fields: &FieldSet,
    default_profile: &Path,
    default_profile_dir: &Path,
) -> Result<(SelectionReport, MergeOutput)> {
    let selector = Selector::new(config);
    let (resolution, merged) = selector.select(fields, default_profile, default_profile_dir)?;
    Ok((resolution.report(image), merged))
}

/// ドライラン: 照合と集約の結果だけを返す
pub fn explain(
    config: &SelectorConfig,
    image: &Path,
    default_profile: Option<&Path>,
) -> SelectionReport {
    let fields = extractor::extract_fields(image, config);

    let default_profile_dir = default_profile
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.base_dir.clone());

    Selector::new(config)
        .resolve(&fields, default_profile, &default_profile_dir)
        .report(image)
}
