//! 上書きセット
//!
//! 部分プロファイルから集めた `セクション → エントリ` のマップ。
//! 集約中は Aggregator だけが変更し、完成後はマージエンジンに渡して消費する。

use crate::ini::{Entries, Entry, Section};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverrideSet {
    sections: BTreeMap<String, Entries>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// エントリ単位でマージ（既存キーは上書き、既存の他のキーは残す）
    pub fn merge_section(&mut self, section: Section) {
        self.sections
            .entry(section.name)
            .or_default()
            .extend(section.entries);
    }

    /// セクション全体を置き換え
    pub fn replace_section(&mut self, section: Section) {
        self.sections.insert(section.name, section.entries);
    }

    /// 1エントリを設定
    pub fn set_entry(&mut self, section: &str, key: &str, entry: Entry) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), entry);
    }

    pub fn remove_section(&mut self, name: &str) -> Option<Entries> {
        self.sections.remove(name)
    }

    pub fn section(&self, name: &str) -> Option<&Entries> {
        self.sections.get(name)
    }

    /// `[section] key` の値
    pub fn value(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(|e| e.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entries)> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl IntoIterator for OverrideSet {
    type Item = (String, Entries);
    type IntoIter = std::collections::btree_map::IntoIter<String, Entries>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.into_iter()
    }
}
