//! 寛容な数値パーサー
//!
//! Exifの値は "1/1300"（露出時間）や "23.0 mm"（焦点距離）のように
//! 分数や単位付きで出てくる。先頭の数値部分だけを読み、失敗は `None` で返す。

use regex::Regex;

lazy_static::lazy_static! {
    // 先頭の浮動小数点数（空白・符号・指数を許容）
    static ref FLOAT_PREFIX_RE: Regex =
        Regex::new(r"^\s*[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap();
    // 先頭の整数
    static ref INT_PREFIX_RE: Regex = Regex::new(r"^\s*[+-]?\d+").unwrap();
}

/// 先頭の数値部分を f64 として読む（"12.0 mm" → 12.0）
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let m = FLOAT_PREFIX_RE.find(s)?;
    m.as_str().trim_start().parse::<f64>().ok()
}

/// 先頭の整数部分を読む（"400" → 400, "2abc" → 2）
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let m = INT_PREFIX_RE.find(s)?;
    m.as_str().trim_start().parse::<i64>().ok()
}

/// 分数を含む数値を読む
///
/// `/` があれば `分子/分母` として割り算する。分母が0、またはどちらかが
/// 数値として読めなければ `None`。
pub fn parse_number(s: &str) -> Option<f64> {
    match s.find('/') {
        None => parse_float_prefix(s),
        Some(div) => {
            let denominator = parse_float_prefix(&s[div + 1..])?;
            if denominator == 0.0 {
                return None;
            }
            let numerator = parse_float_prefix(&s[..div])?;
            Some(numerator / denominator)
        }
    }
}

/// `parse_number` の結果、読めなければ `default`
pub fn eval_number(s: &str, default: f64) -> f64 {
    parse_number(s).unwrap_or(default)
}

/// `@Rank` の値（読めなければ0）
pub fn parse_rank(s: &str) -> i64 {
    parse_int_prefix(s).unwrap_or(0)
}
