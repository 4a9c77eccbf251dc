//! カメラ/ISO別の部分プロファイル
//!
//! `ISO Profiles/iso.<Camera Model Name>.ini` の `[Profiles]` に
//! `ISO=プロファイル名` を並べておく。画像のISOと一致する行、なければ
//! それより小さい最も近いISOの行を使う。
//!
//! ```ini
//! [Profiles]
//! 200=X100 ISO200.pp3
//! 1600=X100 ISO1600.pp3
//! ```

use super::{DocumentSource, ProfileLocations};
use crate::ini::Document;
use crate::numeric::parse_int_prefix;
use crate::overrides::OverrideSet;
use crate::types::{field, FieldSet};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// ISO別プロファイルの対応表セクション
pub const PROFILES_SECTION: &str = "Profiles";
/// メイン設定のコピー対象フィルタ
pub const FILTER_SECTION: &str = "ISO Profile Sections";

/// カメラ別の対応表ファイル
pub fn association_path(locations: &ProfileLocations, camera_model: &str) -> PathBuf {
    locations
        .iso_profiles_dir
        .join(format!("iso.{}.ini", camera_model))
}

/// ISO値を読む（正の整数のみ）
pub fn parse_iso(value: &str) -> Option<i64> {
    parse_int_prefix(value).filter(|&iso| iso > 0)
}

/// 対応表から使うプロファイル名を選ぶ
///
/// 完全一致、なければ画像のISO未満で最大のもの。
/// 画像のISOが最小の行より小さければ `None`。
pub fn select_profile(associations: &BTreeMap<i64, String>, iso: i64) -> Option<&str> {
    associations
        .range(..=iso)
        .next_back()
        .map(|(_, name)| name.as_str())
}

/// `[Profiles]` から対応表を作る（ISOが読めない行は無視）
pub fn build_associations(doc: &Document) -> BTreeMap<i64, String> {
    let mut associations = BTreeMap::new();
    if let Some(section) = doc.section(PROFILES_SECTION) {
        for (key, entry) in &section.entries {
            match parse_int_prefix(key) {
                Some(iso) => {
                    associations.insert(iso, entry.value.clone());
                }
                None => tracing::debug!("ISO対応表の不正なキー: {}", key),
            }
        }
    }
    associations
}

/// ISO別の部分プロファイルを上書きセットへ（セクション単位で置換）
pub fn apply<S: DocumentSource>(
    source: &S,
    main_config: &Document,
    locations: &ProfileLocations,
    fields: &FieldSet,
    overrides: &mut OverrideSet,
) -> bool {
    let Some(camera_model) = fields.get(field::CAMERA_MODEL) else {
        return false;
    };
    let Some(iso) = fields.get(field::ISO).and_then(|v| parse_iso(v)) else {
        tracing::debug!("ISOが読めません: {:?}", fields.get(field::ISO));
        return false;
    };

    let assoc_path = association_path(locations, camera_model);
    let associations = build_associations(&source.load(&assoc_path));
    if associations.is_empty() {
        tracing::debug!("ISO対応表がありません: {}", assoc_path.display());
        return false;
    }

    let Some(profile_name) = select_profile(&associations, iso).filter(|n| !n.is_empty()) else {
        tracing::debug!("ISO {} に対応するプロファイルなし", iso);
        return false;
    };

    // カスタムプロファイルフォルダ → ISO Profiles フォルダの順に探す
    let mut doc = source.load(&locations.custom_profile(profile_name));
    if doc.is_empty() {
        doc = source.load(&locations.resolve(&locations.iso_profiles_dir, profile_name));
    }
    if doc.is_empty() {
        tracing::debug!("ISO別プロファイルが空: {}", profile_name);
        return false;
    }

    tracing::debug!("ISO {} → {}", iso, profile_name);

    let filter = main_config.section(FILTER_SECTION);
    for section in doc.into_sections() {
        let copy = filter.map_or(true, |f| f.is_enabled(&section.name));
        if copy {
            overrides.replace_section(section);
        }
    }

    true
}
