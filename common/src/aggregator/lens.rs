//! レンズ別の歪曲補正
//!
//! `Lens Profiles/lens.<Lens ID>.ini` を読む。
//! - `[LensProfile]` があれば、そのままコピー（LCPFileのパスは出力用に整形）
//! - なければ `[Distortion]` の `焦点距離=補正量` から画像の焦点距離の補正量を求める
//!
//! ```ini
//! [Distortion]
//! 12=0.08
//! 25=0.0
//! 32=-0.02
//! ```

use super::{DocumentSource, ProfileLocations};
use crate::ini::{Document, Entry};
use crate::numeric::parse_float_prefix;
use crate::overrides::OverrideSet;
use crate::paths::adjust_output_separators;
use crate::types::{field, FieldSet};
use std::path::PathBuf;

pub const LENS_PROFILE_SECTION: &str = "LensProfile";
pub const LCP_FILE_KEY: &str = "LCPFile";
pub const DISTORTION_SECTION: &str = "Distortion";
pub const AMOUNT_KEY: &str = "Amount";

/// 焦点距離の単位
const FOCAL_LENGTH_UNIT: &str = "mm";

/// レンズ別ファイル
pub fn lens_file_path(locations: &ProfileLocations, lens_id: &str) -> PathBuf {
    locations.lens_profiles_dir.join(format!("lens.{}.ini", lens_id))
}

/// 焦点距離を読む（"23.0 mm" → 23.0）。単位がない・0・読めない場合は `None`
pub fn parse_focal_length(value: &str) -> Option<f64> {
    let unit = value.find(FOCAL_LENGTH_UNIT)?;
    parse_float_prefix(&value[..unit]).filter(|&fl| fl != 0.0)
}

/// `[Distortion]` から (焦点距離, 補正量) の昇順リストを作る
///
/// 数値として読めない行は無視。同じ焦点距離は後の行が勝つ。
pub fn build_curve(doc: &Document) -> Vec<(f64, f64)> {
    let mut curve: Vec<(f64, f64)> = Vec::new();
    let Some(section) = doc.section(DISTORTION_SECTION) else {
        return curve;
    };

    for (key, entry) in &section.entries {
        let (Some(focal), Some(amount)) =
            (parse_float_prefix(key), parse_float_prefix(&entry.value))
        else {
            tracing::debug!("歪曲補正の不正な行: {}={}", key, entry.value);
            continue;
        };
        match curve.iter_mut().find(|(f, _)| *f == focal) {
            Some(point) => point.1 = amount,
            None => curve.push((focal, amount)),
        }
    }

    curve.sort_by(|a, b| a.0.total_cmp(&b.0));
    curve
}

/// 焦点距離に対する補正量
///
/// 完全一致 → その値、範囲内 → 前後2点の線形補間、範囲外 → 端の値。
/// 結果が0の場合は「データなし」として `None`。
pub fn distortion_amount(curve: &[(f64, f64)], focal_length: f64) -> Option<f64> {
    let first = curve.first()?;
    let last = curve.last()?;

    // focal_length 以上の最初の点
    let upper = curve.partition_point(|(f, _)| *f < focal_length);

    let amount = if upper < curve.len() && curve[upper].0 == focal_length {
        curve[upper].1
    } else if upper == 0 {
        first.1
    } else if upper == curve.len() {
        last.1
    } else {
        let (fl1, amt1) = curve[upper - 1];
        let (fl2, amt2) = curve[upper];
        amt1 + ((focal_length - fl1) / (fl2 - fl1)) * (amt2 - amt1)
    };

    (amount != 0.0).then_some(amount)
}

/// .pp3 に書く補正量の書式（小数点以下3桁）
pub fn format_amount(amount: f64) -> String {
    format!("{:.3}", amount)
}

/// レンズ別ファイルを探す: Lens ID → Lens Type → Camera Model Name
fn load_lens_document<S: DocumentSource>(
    source: &S,
    locations: &ProfileLocations,
    fields: &FieldSet,
) -> Option<(PathBuf, Document)> {
    let lens_id = fields
        .get(field::LENS_ID)
        .or_else(|| fields.get(field::LENS_TYPE));

    let candidates = [lens_id, fields.get(field::CAMERA_MODEL)];
    for id in candidates.into_iter().flatten() {
        let path = lens_file_path(locations, id);
        let doc = source.load(&path);
        if !doc.is_empty() {
            return Some((path, doc));
        }
        tracing::debug!("レンズ別ファイルなし: {}", path.display());
    }
    None
}

/// レンズ別の補正を上書きセットへ
pub fn apply<S: DocumentSource>(
    source: &S,
    locations: &ProfileLocations,
    fields: &FieldSet,
    overrides: &mut OverrideSet,
) -> bool {
    let Some((path, doc)) = load_lens_document(source, locations, fields) else {
        return false;
    };

    if let Some(lens_profile) = doc.section(LENS_PROFILE_SECTION).filter(|s| !s.is_empty()) {
        let mut lens_profile = lens_profile.clone();
        if let Some(lcp) = lens_profile.entries.get_mut(LCP_FILE_KEY) {
            lcp.value = adjust_output_separators(&lcp.value, locations.path_style);
        }
        overrides.replace_section(lens_profile);
        return true;
    }

    let curve = build_curve(&doc);
    if curve.is_empty() {
        tracing::debug!("[Distortion] がありません: {}", path.display());
        return false;
    }

    let focal_length = fields.get(field::FOCAL_LENGTH).and_then(|v| parse_focal_length(v));
    let Some(focal_length) = focal_length else {
        tracing::debug!("焦点距離が読めません: {:?}", fields.get(field::FOCAL_LENGTH));
        return false;
    };

    let Some(amount) = distortion_amount(&curve, focal_length) else {
        return false;
    };

    tracing::debug!("歪曲補正: {}mm → {}", focal_length, format_amount(amount));
    overrides.set_entry(
        DISTORTION_SECTION,
        AMOUNT_KEY,
        Entry::new(format_amount(amount), format!("calculated from {}", path.display())),
    );
    true
}
