//! ルール照合
//!
//! ルールファイル（Multiモード）の各セクションは、セクション名が
//! プロファイルのファイル名、キーがExifフィールド名、値がルール式。
//!
//! - 完全ルール: `@Sections` を持たない。一致すればそのプロファイル全体を使う
//! - 部分ルール: `@Sections` で対象セクションを指定し、値を上書きする。
//!   `@Rank`（既定0）の昇順に適用するので、ランクの高いものが最後に勝つ
//!
//! `@` で始まるキーは設定用で、フィールドとは照合しない。

use crate::ini::{Document, Section};
use crate::matcher::match_value;
use crate::numeric::parse_rank;
use crate::types::FieldSet;
use serde::Serialize;
use std::collections::BTreeSet;

/// 設定用キーの接頭辞
pub const PRIVATE_KEY_PREFIX: char = '@';
/// 部分ルールの対象セクション
pub const SECTIONS_KEY: &str = "@Sections";
/// 部分ルールの適用順
pub const RANK_KEY: &str = "@Rank";
/// 全セクション
pub const WILDCARD: &str = "*";

/// 設定用キーか
pub fn is_private_key(key: &str) -> bool {
    key.starts_with(PRIVATE_KEY_PREFIX)
}

/// 部分ルールか
pub fn is_partial_rule(section: &Section) -> bool {
    section.entries.contains_key(SECTIONS_KEY)
}

/// セクションのルールがすべて一致するか
///
/// 照合対象のキーが1つもないセクションは一致しない。
pub fn section_matches(section: &Section, fields: &FieldSet, complex_rules: bool) -> bool {
    let mut compared = 0usize;
    for (key, entry) in &section.entries {
        if is_private_key(key) {
            continue;
        }
        compared += 1;
        match fields.get(key) {
            Some(value) if match_value(value, &entry.value, complex_rules) => {}
            _ => return false,
        }
    }
    compared > 0
}

/// 完全ルールの一致結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FullMatch {
    /// ルール文書内のセクション位置
    pub index: usize,
    /// プロファイル名（セクション名）
    pub profile_name: String,
    /// セクションのキー数（設定用キーを含む）
    pub key_count: usize,
}

/// 最も良く一致する完全ルールを選ぶ
///
/// キー数が最大のもの。同数なら文書内で先に出たもの。
/// 一致なしの場合は `None`（呼び出し側は既定プロファイルを使う）。
pub fn select_best_full_match(
    rules: &Document,
    fields: &FieldSet,
    complex_rules: bool,
) -> Option<FullMatch> {
    let mut best: Option<FullMatch> = None;

    for (index, section) in rules.sections().iter().enumerate() {
        if is_partial_rule(section) || !section_matches(section, fields, complex_rules) {
            continue;
        }

        let key_count = section.len();
        tracing::debug!("完全ルール一致: [{}] ({}キー)", section.name, key_count);

        if best.as_ref().map_or(true, |b| key_count > b.key_count) {
            best = Some(FullMatch {
                index,
                profile_name: section.name.clone(),
                key_count,
            });
        }
    }

    best
}

/// 部分プロファイルから取り込むセクション
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TargetSections {
    /// すべてのセクション
    All,
    /// 指定したセクションのみ
    Named(BTreeSet<String>),
}

impl Default for TargetSections {
    fn default() -> Self {
        TargetSections::Named(BTreeSet::new())
    }
}

impl TargetSections {
    /// セクションを取り込むか
    pub fn contains(&self, section: &str) -> bool {
        match self {
            TargetSections::All => true,
            TargetSections::Named(names) => names.contains(section),
        }
    }

    fn insert(&mut self, section: &str) {
        if let TargetSections::Named(names) = self {
            names.insert(section.to_string());
        }
    }

    /// `@Sections` の値を展開して追加
    ///
    /// - `*` → 全セクション（それまでの指定を破棄し、以降の項目も読まない）
    /// - `[Group]` → メイン設定の `[Group]` で値が "1" のキーすべて
    /// - その他 → セクション名
    fn extend_from(&mut self, spec: &str, main_config: &Document) {
        for token in spec.split(',') {
            if token.is_empty() {
                continue;
            }
            if token == WILDCARD {
                *self = TargetSections::All;
                break;
            }
            if let Some(group) = token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
                if let Some(section) = main_config.section(group) {
                    for (key, entry) in &section.entries {
                        if entry.value == "1" {
                            self.insert(key);
                        }
                    }
                }
            } else {
                self.insert(token);
            }
        }
    }
}

/// 部分ルールの一致結果（同じプロファイル名は1件にまとめる）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialMatch {
    pub profile_name: String,
    pub targets: TargetSections,
}

/// 一致する部分ルールをランク順に並べる
///
/// 同じプロファイル名が複数のルールで一致した場合、対象セクションは和集合になり、
/// 並び順は最初に現れた位置のまま。
pub fn select_partial_matches(
    rules: &Document,
    main_config: &Document,
    fields: &FieldSet,
    complex_rules: bool,
) -> Vec<PartialMatch> {
    let mut matched: Vec<(i64, &Section)> = rules
        .sections()
        .iter()
        .filter(|s| is_partial_rule(s) && section_matches(s, fields, complex_rules))
        .map(|s| (s.get(RANK_KEY).map(parse_rank).unwrap_or(0), s))
        .collect();

    // 安定ソート: 同ランクは文書順
    matched.sort_by_key(|(rank, _)| *rank);

    let mut partials: Vec<PartialMatch> = Vec::new();
    for (rank, section) in matched {
        tracing::debug!("部分ルール一致: [{}] rank={}", section.name, rank);

        let pos = match partials.iter().position(|p| p.profile_name == section.name) {
            Some(pos) => pos,
            None => {
                partials.push(PartialMatch {
                    profile_name: section.name.clone(),
                    targets: TargetSections::default(),
                });
                partials.len() - 1
            }
        };

        if let Some(spec) = section.get(SECTIONS_KEY) {
            partials[pos].targets.extend_from(spec, main_config);
        }
    }

    partials
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> FieldSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_section_without_comparable_keys_never_matches() {
        let rules = Document::parse_multi("[a.pp3]\n@Rank=1\n[b.pp3]\n", "r");
        let f = fields(&[("ISO", "100")]);
        assert!(!section_matches(&rules.sections()[0], &f, true));
        assert!(!section_matches(&rules.sections()[1], &f, true));
    }

    #[test]
    fn test_missing_field_fails_match() {
        let rules = Document::parse_multi("[a.pp3]\nISO=100\nMake=Fuji\n", "r");
        let f = fields(&[("ISO", "100")]);
        assert!(!section_matches(&rules.sections()[0], &f, true));
    }

    #[test]
    fn test_best_full_match_prefers_more_keys() {
        let text = "\
[two.pp3]
Camera Model Name=X100
ISO=100~800
[three.pp3]
Camera Model Name=X100
ISO=100~800
Make=FUJIFILM
";
        let rules = Document::parse_multi(text, "r");
        let f = fields(&[
            ("Camera Model Name", "X100"),
            ("ISO", "400"),
            ("Make", "FUJIFILM"),
        ]);
        let m = select_best_full_match(&rules, &f, true).unwrap();
        assert_eq!(m.profile_name, "three.pp3");
        assert_eq!(m.index, 1);
        assert_eq!(m.key_count, 3);
    }

    #[test]
    fn test_best_full_match_tie_picks_first() {
        let text = "\
[first.pp3]
Camera Model Name=X100
ISO=400
[second.pp3]
Camera Model Name=X100
Make=FUJIFILM
";
        let rules = Document::parse_multi(text, "r");
        let f = fields(&[
            ("Camera Model Name", "X100"),
            ("ISO", "400"),
            ("Make", "FUJIFILM"),
        ]);
        let m = select_best_full_match(&rules, &f, true).unwrap();
        assert_eq!(m.profile_name, "first.pp3");
    }

    #[test]
    fn test_full_match_ignores_partial_rules() {
        let text = "\
[partial.pp3]
@Sections=*
Camera Model Name=X100
ISO=400
[full.pp3]
Camera Model Name=X100
";
        let rules = Document::parse_multi(text, "r");
        let f = fields(&[("Camera Model Name", "X100"), ("ISO", "400")]);
        let m = select_best_full_match(&rules, &f, true).unwrap();
        assert_eq!(m.profile_name, "full.pp3");
    }

    #[test]
    fn test_full_match_counts_private_keys() {
        let text = "\
[plain.pp3]
Camera Model Name=X100
ISO=400
[annotated.pp3]
@Note=preferred
Camera Model Name=X100
ISO=400
";
        let rules = Document::parse_multi(text, "r");
        let f = fields(&[("Camera Model Name", "X100"), ("ISO", "400")]);
        let m = select_best_full_match(&rules, &f, true).unwrap();
        assert_eq!(m.profile_name, "annotated.pp3");
    }

    #[test]
    fn test_no_full_match() {
        let rules = Document::parse_multi("[a.pp3]\nCamera Model Name=X-T2\n", "r");
        let f = fields(&[("Camera Model Name", "X100")]);
        assert!(select_best_full_match(&rules, &f, true).is_none());
    }

    #[test]
    fn test_duplicate_rule_names_match_independently() {
        let text = "\
[shared.pp3]
Camera Model Name=X-T2
[shared.pp3]
Camera Model Name=X100
";
        let rules = Document::parse_multi(text, "r");
        let f = fields(&[("Camera Model Name", "X100")]);
        let m = select_best_full_match(&rules, &f, true).unwrap();
        assert_eq!(m.index, 1);
    }

    #[test]
    fn test_partials_sorted_by_rank() {
        let text = "\
[high.pp3]
@Sections=Exposure
@Rank=5
ISO=400
[low.pp3]
@Sections=Exposure
@Rank=-1
ISO=400
[default.pp3]
@Sections=Exposure
ISO=400
";
        let rules = Document::parse_multi(text, "r");
        let f = fields(&[("ISO", "400")]);
        let partials = select_partial_matches(&rules, &Document::default(), &f, true);
        let names: Vec<&str> = partials.iter().map(|p| p.profile_name.as_str()).collect();
        assert_eq!(names, vec!["low.pp3", "default.pp3", "high.pp3"]);
    }

    #[test]
    fn test_partial_non_numeric_rank_is_zero() {
        let text = "\
[a.pp3]
@Sections=Exposure
@Rank=1
ISO=400
[b.pp3]
@Sections=Exposure
@Rank=top
ISO=400
";
        let rules = Document::parse_multi(text, "r");
        let f = fields(&[("ISO", "400")]);
        let partials = select_partial_matches(&rules, &Document::default(), &f, true);
        assert_eq!(partials[0].profile_name, "b.pp3");
        assert_eq!(partials[1].profile_name, "a.pp3");
    }

    #[test]
    fn test_partial_sections_named_list() {
        let rules = Document::parse_multi("[p.pp3]\n@Sections=Exposure,Sharpening\nISO=400\n", "r");
        let f = fields(&[("ISO", "400")]);
        let partials = select_partial_matches(&rules, &Document::default(), &f, true);
        assert_eq!(partials.len(), 1);
        assert!(partials[0].targets.contains("Exposure"));
        assert!(partials[0].targets.contains("Sharpening"));
        assert!(!partials[0].targets.contains("Color"));
    }

    #[test]
    fn test_partial_wildcard_overrides_names() {
        let rules = Document::parse_multi("[p.pp3]\n@Sections=Exposure,*,Color\nISO=400\n", "r");
        let f = fields(&[("ISO", "400")]);
        let partials = select_partial_matches(&rules, &Document::default(), &f, true);
        assert_eq!(partials[0].targets, TargetSections::All);
    }

    #[test]
    fn test_partial_group_expansion() {
        let main = Document::parse_unique(
            "[Noise Sections]\nDirectional Pyramid Denoising=1\n\
             Impulse Denoising=0\nSharpening=1\n",
            "RTProfileSelector.ini",
        );
        let rules =
            Document::parse_multi("[nr.pp3]\n@Sections=[Noise Sections],Color\nISO=3200\n", "r");
        let f = fields(&[("ISO", "3200")]);
        let partials = select_partial_matches(&rules, &main, &f, true);
        let targets = &partials[0].targets;
        assert!(targets.contains("Directional Pyramid Denoising"));
        assert!(targets.contains("Sharpening"));
        assert!(targets.contains("Color"));
        assert!(!targets.contains("Impulse Denoising"));
    }

    #[test]
    fn test_partial_missing_group_adds_nothing() {
        let rules = Document::parse_multi("[p.pp3]\n@Sections=[Missing]\nISO=400\n", "r");
        let f = fields(&[("ISO", "400")]);
        let partials = select_partial_matches(&rules, &Document::default(), &f, true);
        assert_eq!(partials[0].targets, TargetSections::Named(BTreeSet::new()));
    }

    #[test]
    fn test_same_profile_accumulates_sections() {
        let text = "\
[p.pp3]
@Sections=Exposure
ISO=400
[other.pp3]
@Sections=*
ISO=400
[p.pp3]
@Sections=Color
Camera Model Name=X100
";
        let rules = Document::parse_multi(text, "r");
        let f = fields(&[("ISO", "400"), ("Camera Model Name", "X100")]);
        let partials = select_partial_matches(&rules, &Document::default(), &f, true);
        assert_eq!(partials.len(), 2);
        assert_eq!(partials[0].profile_name, "p.pp3");
        assert!(partials[0].targets.contains("Exposure"));
        assert!(partials[0].targets.contains("Color"));
        assert_eq!(partials[1].targets, TargetSections::All);
    }

    #[test]
    fn test_partial_rule_requires_comparable_key() {
        let rules = Document::parse_multi("[p.pp3]\n@Sections=*\n@Rank=2\n", "r");
        let f = fields(&[("ISO", "400")]);
        assert!(select_partial_matches(&rules, &Document::default(), &f, true).is_empty());
    }
}
