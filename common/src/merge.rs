//! プロファイルのマージ
//!
//! ベースプロファイルのテキストを1行ずつ流し、上書きセットの値を差し込む。
//!
//! - セクション開始時、上書きセットに同名セクションがあれば作業バッファへ移す
//!   （消費済み。末尾で再出力しない）
//! - バッファにあるキーの行は上書き値で出力し、バッファから消す
//! - セクション終了時、バッファに残ったエントリをそのセクションの末尾に追加
//! - 最後に、ベースにないセクションを `[Section]` ブロックとして追加
//!
//! 出力と並行してデバッグトレースを作る。トレースは各エントリの前に
//! `; <出所>` のコメント行を入れる。

use crate::ini::{parse_entry, parse_section, strip_return, Entries, Entry};
use crate::overrides::OverrideSet;

/// トレースの出所コメントの接頭辞
pub const TRACE_PREFIX: &str = "; ";

/// マージ結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutput {
    /// 最終プロファイル
    pub text: String,
    /// 出所コメント付きの同じ内容
    pub trace: String,
}

/// 出力行（本文）とトレース行を並行して組み立てる
#[derive(Default)]
struct MergeWriter {
    lines: Vec<String>,
    trace: Vec<String>,
    /// 現在のセクションで最後に出力した非空行の直後（本文/トレース）
    tail: usize,
    trace_tail: usize,
}

impl MergeWriter {
    fn push_plain(&mut self, line: &str) {
        self.lines.push(line.to_string());
        self.trace.push(line.to_string());
        if !line.trim().is_empty() {
            self.mark_tail();
        }
    }

    fn push_entry(&mut self, key: &str, value: &str, source: &str) {
        self.lines.push(format!("{}={}", key, value));
        self.trace.push(format!("{}{}", TRACE_PREFIX, source));
        self.trace.push(format!("{}={}", key, value));
        self.mark_tail();
    }

    /// ベースの行をそのまま出力（トレースには出所を付ける）
    fn push_base_entry(&mut self, line: &str, source: &str) {
        self.lines.push(line.to_string());
        self.trace.push(format!("{}{}", TRACE_PREFIX, source));
        self.trace.push(line.to_string());
        self.mark_tail();
    }

    fn mark_tail(&mut self) {
        self.tail = self.lines.len();
        self.trace_tail = self.trace.len();
    }

    /// 残ったエントリを現在のセクションの最終行の後ろに差し込む
    fn flush(&mut self, leftovers: Entries) {
        if leftovers.is_empty() {
            return;
        }
        let mut lines = Vec::with_capacity(leftovers.len());
        let mut trace = Vec::with_capacity(leftovers.len() * 2);
        for (key, entry) in leftovers {
            trace.push(format!("{}{}", TRACE_PREFIX, entry.source));
            trace.push(format!("{}={}", key, entry.value));
            lines.push(format!("{}={}", key, entry.value));
        }

        let (n, tn) = (lines.len(), trace.len());
        self.lines.splice(self.tail..self.tail, lines);
        self.trace.splice(self.trace_tail..self.trace_tail, trace);
        self.tail += n;
        self.trace_tail += tn;
    }

    /// 新しいセクションを追加する前の空行
    fn separate_block(&mut self) {
        if self.lines.last().is_some_and(|l| !l.trim().is_empty()) {
            self.push_plain("");
        }
    }

    fn finish(self) -> MergeOutput {
        MergeOutput {
            text: join_lines(&self.lines),
            trace: join_lines(&self.trace),
        }
    }
}

fn join_lines(lines: &[String]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// ベースプロファイルに上書きセットを適用
///
/// # Arguments
/// * `base_text` - ベースプロファイルのテキスト
/// * `base_source` - ベース由来の行の出所（通常はファイルパス）
/// * `overrides` - 適用する上書きセット（消費する）
pub fn merge_profile(
    base_text: &str,
    base_source: &str,
    mut overrides: OverrideSet,
) -> MergeOutput {
    let mut out = MergeWriter::default();
    let mut in_section = false;
    // 現在のセクションの作業バッファ
    let mut pending: Entries = Entries::new();

    for raw in base_text.lines() {
        let line = strip_return(raw);

        if let Some(name) = parse_section(line) {
            out.flush(std::mem::take(&mut pending));
            in_section = !name.is_empty();
            if !in_section {
                continue;
            }
            if let Some(entries) = overrides.remove_section(name) {
                pending = entries;
            }
            out.push_plain(line);
            continue;
        }

        if !in_section {
            continue;
        }

        match parse_entry(line) {
            Some((key, _)) => match pending.remove(key) {
                Some(Entry { value, source }) => out.push_entry(key, &value, &source),
                None => out.push_base_entry(line, base_source),
            },
            None => out.push_plain(line),
        }
    }

    out.flush(pending);

    for (name, entries) in overrides {
        out.separate_block();
        out.push_plain(&format!("[{}]", name));
        for (key, entry) in &entries {
            out.push_entry(key, &entry.value, &entry.source);
        }
    }

    out.finish()
}
