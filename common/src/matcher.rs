//! ルール値の照合
//!
//! ルールファイルの値は小さな式として評価する（複合ルール有効時）:
//!
//! | 書式 | 意味 | 例 |
//! |------|------|-----|
//! | `A\|B\|C` | いずれかに一致 | `Photo Style=Dynamic (B&W)\|Monochrome` |
//! | `!A` | 否定（先頭の空白の後に`!`） | `White Balance=!Manual` |
//! | `a~b` | 数値範囲（両端を含む） | `ISO=200~400`, `Focal Length=12.0 mm ~ 14.0 mm` |
//! | `a~*` / `*~b` | 片側のみの範囲 | `ISO=400~*` |
//! | その他 | 文字列の完全一致 | `Camera Model Name=X100` |
//!
//! Exif側の値に `!` `~` `|` が含まれる場合は、どちらの意図か曖昧なので
//! 単純な文字列比較になる。

use crate::numeric::{eval_number, parse_number};

/// 予約文字
pub const RESERVED_CHARS: [char; 3] = ['!', '~', '|'];

/// ルール値の構文木
#[derive(Debug, Clone, PartialEq)]
pub enum RuleExpr {
    /// 文字列の完全一致
    Literal { value: String, negated: bool },
    /// 数値範囲。`None` の側は無制限
    Range {
        low: Option<f64>,
        high: Option<f64>,
        negated: bool,
    },
    /// `左|残り`（残りは再帰的に分割）
    Either(Box<RuleExpr>, Box<RuleExpr>),
}

impl RuleExpr {
    /// ルール値を解析（最初の `|` で左右に分け、右側は再帰）
    pub fn parse(rule: &str) -> Self {
        if let Some(pipe) = rule.find('|') {
            return RuleExpr::Either(
                Box::new(Self::parse_term(&rule[..pipe])),
                Box::new(Self::parse(&rule[pipe + 1..])),
            );
        }
        Self::parse_term(rule)
    }

    fn parse_term(term: &str) -> Self {
        let value = term.trim_start_matches(['\t', ' ']);
        let (negated, value) = match value.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, value),
        };

        match value.find('~') {
            Some(tilde) => RuleExpr::Range {
                low: parse_number(&value[..tilde]),
                high: parse_number(&value[tilde + 1..]),
                negated,
            },
            None => RuleExpr::Literal {
                value: value.to_string(),
                negated,
            },
        }
    }

    /// フィールド値が式を満たすか
    pub fn matches(&self, field_value: &str) -> bool {
        match self {
            RuleExpr::Either(left, rest) => left.matches(field_value) || rest.matches(field_value),
            RuleExpr::Literal { value, negated } => (field_value == value) ^ negated,
            RuleExpr::Range { low, high, negated } => {
                // 両側とも数値でなければ範囲として成立しない
                if low.is_none() && high.is_none() {
                    return false;
                }
                let low = low.unwrap_or(f64::NEG_INFINITY);
                let high = high.unwrap_or(f64::INFINITY);
                let v = eval_number(field_value, 0.0);
                (v >= low && v <= high) ^ negated
            }
        }
    }
}

/// フィールド値がルール値に一致するか
///
/// # Arguments
/// * `field_value` - Exifから取得した値
/// * `rule` - ルールファイルの値
/// * `complex_rules` - 複合ルール（否定・範囲・列挙）を評価するか
pub fn match_value(field_value: &str, rule: &str, complex_rules: bool) -> bool {
    if !complex_rules || field_value.contains(RESERVED_CHARS) {
        return field_value == rule;
    }
    RuleExpr::parse(rule).matches(field_value)
}
