//! Exifの直接読み込み（exiftoolが使えない場合）
//!
//! 取れるフィールドは限られるが、名前と値の書式はexiftoolに合わせる。

use crate::error::{Result, SelectorError};
use exif::{In, Tag, Value};
use rt_profile_common::types::field;
use rt_profile_common::FieldSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn read_fields(path: &Path) -> Result<FieldSet> {
    let file = File::open(path)?;
    let mut bufreader = BufReader::new(file);
    let exif = exif::Reader::new()
        .read_from_container(&mut bufreader)
        .map_err(|e| SelectorError::ExifRead(format!("{}: {}", path.display(), e)))?;

    let mut fields = FieldSet::new();
    let mut put = |name: &str, value: Option<String>| {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            fields.insert(name.to_string(), v);
        }
    };

    let get = |tag: Tag| exif.get_field(tag, In::PRIMARY).map(|f| &f.value);

    put(field::MAKE, get(Tag::Make).and_then(ascii));
    put(field::CAMERA_MODEL, get(Tag::Model).and_then(ascii));

    let lens = get(Tag::LensModel).and_then(ascii);
    put(field::LENS_ID, lens.clone());
    put(field::LENS_MODEL, lens);

    put(
        field::ISO,
        get(Tag::PhotographicSensitivity)
            .and_then(|v| v.get_uint(0))
            .map(|iso| iso.to_string()),
    );
    put(
        field::FOCAL_LENGTH,
        get(Tag::FocalLength).and_then(rational).map(format_focal_length),
    );
    put(
        field::EXPOSURE_TIME,
        get(Tag::ExposureTime).and_then(rational).map(format_exposure_time),
    );
    put(
        field::F_NUMBER,
        get(Tag::FNumber).and_then(rational).map(|f| format!("{:.1}", f)),
    );
    put(
        field::DATE_TIME_ORIGINAL,
        get(Tag::DateTimeOriginal).and_then(ascii),
    );

    Ok(fields)
}

fn ascii(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim_end_matches('\0').trim().to_string()),
        _ => None,
    }
}

fn rational(value: &Value) -> Option<f64> {
    match value {
        Value::Rational(v) => v.first().filter(|r| r.denom != 0).map(|r| r.to_f64()),
        _ => None,
    }
}

/// "23.0 mm"
pub fn format_focal_length(focal_length: f64) -> String {
    format!("{:.1} mm", focal_length)
}

/// 1秒未満は "1/250"、それ以上は "2" や "1.5"
pub fn format_exposure_time(seconds: f64) -> String {
    if seconds > 0.0 && seconds < 1.0 {
        format!("1/{}", (1.0 / seconds).round())
    } else {
        let text = format!("{:.1}", seconds);
        text.strip_suffix(".0").map(str::to_string).unwrap_or(text)
    }
}
