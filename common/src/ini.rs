//! 構造化テキスト（INI形式）ストア
//!
//! RawTherapeeの .pp3 プロファイルと RTProfileSelector のルール/設定ファイルは
//! 同じ `[Section]` / `Key=Value` 形式。各エントリは読み込み元（ソース）を保持し、
//! デバッグ出力で値の出所を示すのに使う。
//!
//! ## 行の解釈
//! 1. 行末の `\r` を除去
//! 2. `[name]`（2文字以上、`[`で始まり`]`で終わる）→ セクション開始
//! 3. `=` を含み、`=` の前が空でなく、`;` で始まらない行 → エントリ
//! 4. 最初のセクションより前の行は無視
//!
//! ## 読み込みモード
//! - Unique: 同名セクションを1つに統合（後のキーが上書き）。
//!   別々のルールが同じ名前を使うと黙って混ざる点に注意。
//! - Multi: 同名セクションを別インスタンスとして出現順に保持（ルールファイル用）

use crate::error::Result;
use crate::types::TextEncoding;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// エントリ（値 + 出所）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub value: String,
    pub source: String,
}

impl Entry {
    pub fn new(value: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            source: source.into(),
        }
    }
}

/// セクション内のエントリ（キー順）
pub type Entries = BTreeMap<String, Entry>;

/// セクション
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Section {
    pub name: String,
    pub entries: Entries,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Entries::new(),
        }
    }

    /// キーの値を取得
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.value.as_str())
    }

    /// キーの値が "1" か（有効フラグ）
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key) == Some("1")
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: Entry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 読み込みモード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// 同名セクションを統合
    Unique,
    /// 同名セクションを別々に保持
    Multi,
}

/// 構造化テキスト文書（セクションの出現順を保持）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    sections: Vec<Section>,
}

impl Document {
    /// テキストを解析
    ///
    /// # Arguments
    /// * `text` - 文書テキスト
    /// * `mode` - 同名セクションの扱い
    /// * `source` - 各エントリに記録する出所（通常はファイルパス）
    pub fn parse(text: &str, mode: ParseMode, source: &str) -> Self {
        let mut doc = Document::default();
        // 現在のセクション（sections内のインデックス）
        let mut current: Option<usize> = None;

        for raw in text.lines() {
            let line = strip_return(raw);

            if let Some(name) = parse_section(line) {
                current = if name.is_empty() {
                    None
                } else {
                    Some(doc.open_section(name, mode))
                };
                continue;
            }

            let Some(idx) = current else { continue };
            if let Some((key, value)) = parse_entry(line) {
                doc.sections[idx].insert(key, Entry::new(value, source));
            }
        }

        doc
    }

    /// Unique モードで解析
    pub fn parse_unique(text: &str, source: &str) -> Self {
        Self::parse(text, ParseMode::Unique, source)
    }

    /// Multi モードで解析
    pub fn parse_multi(text: &str, source: &str) -> Self {
        Self::parse(text, ParseMode::Multi, source)
    }

    /// ファイルを読み込み（読めなければIOエラー）
    pub fn try_load(path: &Path, mode: ParseMode, encoding: TextEncoding) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let text = encoding.decode(&bytes);
        Ok(Self::parse(&text, mode, &path.display().to_string()))
    }

    /// ファイルを読み込み
    ///
    /// 開けないファイルは空の文書として扱う（「空ファイル」と区別しない）。
    pub fn load(path: &Path, mode: ParseMode, encoding: TextEncoding) -> Self {
        match Self::try_load(path, mode, encoding) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!("文書を読めません（空として扱う）: {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn open_section(&mut self, name: &str, mode: ParseMode) -> usize {
        if mode == ParseMode::Unique {
            if let Some(idx) = self.sections.iter().position(|s| s.name == name) {
                return idx;
            }
        }
        self.sections.push(Section::new(name));
        self.sections.len() - 1
    }

    /// 名前でセクションを取得（Multiモードでは最初の1つ）
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// `[section] key` の値を取得
    pub fn value(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(key))
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Windowsで作られたファイルの行末 `\r` を除去
pub fn strip_return(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// セクション行なら名前を返す
pub fn parse_section(line: &str) -> Option<&str> {
    if line.len() < 2 {
        return None;
    }
    line.strip_prefix('[')?.strip_suffix(']')
}

/// エントリ行なら (key, value) を返す
pub fn parse_entry(line: &str) -> Option<(&str, &str)> {
    if line.starts_with(';') {
        return None;
    }
    let eq = line.find('=')?;
    if eq == 0 {
        return None;
    }
    Some((&line[..eq], &line[eq + 1..]))
}
