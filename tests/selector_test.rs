//! プロファイル選択の結合テスト
//!
//! 一時フォルダに設定・ルール・プロファイルを置いて一連の処理を検証

use rt_profile_common::FieldSet;
use rt_profile_selector::config::SelectorConfig;
use rt_profile_selector::error::SelectorError;
use rt_profile_selector::extractor::FIELD_LISTING_FILE_NAME;
use rt_profile_selector::selector::{explain, run_keyfile, select_for_image};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const PROFILE_A: &str = "\
[Version]
AppVersion=5.9
Version=346

[Exposure]
Compensation=0
Saturation=5

[Distortion]
Amount=0
";

const DEFAULT_PROFILE: &str = "[Exposure]\nCompensation=0\n";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(general_extra: &str, rules: &str) -> Self {
        let dir = tempdir().expect("Failed to create temp dir");
        let base = dir.path();
        let profiles = base.join("profiles");
        fs::create_dir_all(&profiles).unwrap();
        fs::create_dir_all(base.join("Lens Profiles")).unwrap();
        fs::create_dir_all(base.join("ISO Profiles")).unwrap();

        fs::write(
            base.join("RTProfileSelector.ini"),
            format!(
                "[General]\nRTCustomProfilesPath={}\nExifTool=/nonexistent/bin/exiftool-12345\n{}",
                profiles.display(),
                general_extra
            ),
        )
        .unwrap();
        fs::write(base.join("RTProfileSelectorRules.ini"), rules).unwrap();
        fs::write(profiles.join("profileA.pp3"), PROFILE_A).unwrap();
        fs::write(profiles.join("Default.pp3"), DEFAULT_PROFILE).unwrap();
        fs::write(
            base.join("Lens Profiles").join("lens.X100.ini"),
            "[Distortion]\n20=1.0\n30=1.4\n",
        )
        .unwrap();

        Self { dir }
    }

    fn base(&self) -> &Path {
        self.dir.path()
    }

    fn profiles(&self) -> PathBuf {
        self.base().join("profiles")
    }

    fn config(&self) -> SelectorConfig {
        SelectorConfig::load(self.base()).expect("設定読み込み失敗")
    }

    fn write(&self, relative: &str, text: &str) {
        fs::write(self.base().join(relative), text).unwrap();
    }

    /// 画像（Exifなし）とキーファイルを作る
    fn keyfile(&self) -> PathBuf {
        let image = self.base().join("photo.RAF");
        fs::write(&image, "not an image").unwrap();

        let keyfile = self.base().join("key.txt");
        fs::write(
            &keyfile,
            format!(
                "[RT General]\nImageFileName={}\nOutputProfileFileName={}\n\
                 CachePath={}\nDefaultProcParams={}\n",
                image.display(),
                self.base().join("out.pp3").display(),
                self.base().display(),
                self.profiles().join("Default.pp3").display()
            ),
        )
        .unwrap();
        keyfile
    }
}

fn fields(pairs: &[(&str, &str)]) -> FieldSet {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// 完全ルールでベースを選び、レンズ別の歪曲補正を補間して書き込む
#[test]
fn test_full_match_with_lens_distortion() {
    let fx = Fixture::new("", "[profileA.pp3]\nCamera Model Name=X100\n");
    let config = fx.config();
    let f = fields(&[
        ("Camera Model Name", "X100"),
        ("ISO", "400"),
        ("Focal Length", "23.0 mm"),
    ]);

    let default = fx.profiles().join("Default.pp3");
    let (report, merged) =
        select_for_image(&config, Path::new("photo.RAF"), &f, &default, &fx.profiles()).unwrap();

    assert_eq!(report.base_profile, Some(fx.profiles().join("profileA.pp3")));
    assert_eq!(report.full_match.as_ref().map(|m| m.profile_name.as_str()), Some("profileA.pp3"));

    // 20→1.0, 30→1.4 の23mmは線形補間で 1.12
    assert!(merged.text.contains("[Distortion]\nAmount=1.120\n"));
    assert_eq!(merged.text.matches("[Distortion]").count(), 1);
    // それ以外はベースのまま
    assert!(merged.text.starts_with("[Version]\nAppVersion=5.9\nVersion=346\n"));
    assert!(merged.text.contains("[Exposure]\nCompensation=0\nSaturation=5\n"));
    assert!(merged.trace.contains("; calculated from "));
}

/// ランク順・グループ展開・ISO別プロファイルの組み合わせ
#[test]
fn test_partials_groups_and_iso() {
    let rules = "\
[profileA.pp3]
Camera Model Name=X100

[bw.pp3]
@Sections=[Monochrome Sections]
@Rank=1
Film Mode=B&W|Monochrome

[warm.pp3]
@Sections=Exposure,White Balance
Film Mode=!Velvia
";
    let fx = Fixture::new("\n[Monochrome Sections]\nBlack & White=1\nVibrance=0\n", rules);
    fx.write(
        "profiles/bw.pp3",
        "[Black & White]\nEnabled=true\n[Vibrance]\nEnabled=false\n[Exposure]\nCompensation=9\n",
    );
    fx.write(
        "profiles/warm.pp3",
        "[Exposure]\nCompensation=1\n[White Balance]\nTemperature=6000\n",
    );
    fx.write("ISO Profiles/iso.X100.ini", "[Profiles]\n200=iso200.pp3\n3200=iso3200.pp3\n");
    fx.write("ISO Profiles/iso200.pp3", "[Directional Pyramid Denoising]\nEnabled=true\n");

    let config = fx.config();
    let f = fields(&[
        ("Camera Model Name", "X100"),
        ("ISO", "400"),
        ("Film Mode", "Monochrome"),
    ]);
    let default = fx.profiles().join("Default.pp3");
    let (report, merged) =
        select_for_image(&config, Path::new("photo.RAF"), &f, &default, &fx.profiles()).unwrap();

    // rank 0 の warm が先、rank 1 の bw が後
    let names: Vec<&str> = report
        .partial_matches
        .iter()
        .map(|p| p.profile_name.as_str())
        .collect();
    assert_eq!(names, vec!["warm.pp3", "bw.pp3"]);

    let text = &merged.text;
    assert!(text.contains("[Exposure]\nCompensation=1\nSaturation=5\n"));
    assert!(text.contains("[White Balance]\nTemperature=6000\n"));
    assert!(text.contains("[Black & White]\nEnabled=true\n"));
    assert!(text.contains("[Directional Pyramid Denoising]\nEnabled=true\n"));
    // グループで無効のセクションは取り込まない
    assert!(!text.contains("[Vibrance]"));
}

/// キーファイルから実行: フィールドが取れなければ既定プロファイルを書き込む
#[test]
fn test_run_keyfile_falls_back_to_default_profile() {
    let fx = Fixture::new("DebugFiles=1\n", "[profileA.pp3]\nCamera Model Name=X100\n");
    let config = fx.config();
    let keyfile = fx.keyfile();

    let report = run_keyfile(&config, &keyfile).unwrap();
    assert!(report.full_match.is_none());
    assert_eq!(report.output, Some(fx.base().join("out.pp3")));

    let out = fs::read_to_string(fx.base().join("out.pp3")).unwrap();
    assert_eq!(out, DEFAULT_PROFILE);

    // デバッグ用ファイル
    let trace = fs::read_to_string(config.debug_trace_path()).unwrap();
    assert!(trace.contains("Default.pp3"));
    assert_eq!(fs::read_to_string(config.last_profile_path()).unwrap(), DEFAULT_PROFILE);
    assert!(config.fields_dump_path().exists());
}

/// 出力は既存ファイルを置き換える
#[test]
fn test_run_keyfile_overwrites_output() {
    let fx = Fixture::new("", "");
    let config = fx.config();
    let keyfile = fx.keyfile();
    fs::write(fx.base().join("out.pp3"), "old").unwrap();

    run_keyfile(&config, &keyfile).unwrap();
    assert_eq!(fs::read_to_string(fx.base().join("out.pp3")).unwrap(), DEFAULT_PROFILE);
}

/// フィールドが取れない画像ではViewExifKeysでも一覧を出さない
#[test]
fn test_run_keyfile_skips_empty_field_listing() {
    let fx = Fixture::new(
        "ViewExifKeys=1\nTextViewer=/nonexistent/bin/viewer-12345\n",
        "",
    );
    let config = fx.config();
    assert!(config.view_exif_keys);
    let keyfile = fx.keyfile();

    run_keyfile(&config, &keyfile).unwrap();
    assert!(fx.base().join("out.pp3").exists());
    assert!(!fx.base().join(FIELD_LISTING_FILE_NAME).exists());
}

/// 不正なキーファイルでは何も書き込まない
#[test]
fn test_run_keyfile_invalid_keyfile() {
    let fx = Fixture::new("", "");
    let config = fx.config();
    fx.write("key.txt", "[RT General]\nImageFileName=/a.RAF\n");

    let err = run_keyfile(&config, &fx.base().join("key.txt")).unwrap_err();
    assert!(matches!(err, SelectorError::InvalidKeyFile(_)));
    assert!(!fx.base().join("out.pp3").exists());
}

/// ベースプロファイルが読めない場合は失敗し、出力は作られない
#[test]
fn test_run_keyfile_missing_default_profile() {
    let fx = Fixture::new("", "");
    let config = fx.config();
    let keyfile = fx.keyfile();
    fs::remove_file(fx.profiles().join("Default.pp3")).unwrap();

    let err = run_keyfile(&config, &keyfile).unwrap_err();
    assert!(matches!(err, SelectorError::ProfileRead { .. }));
    assert!(!fx.base().join("out.pp3").exists());
}

/// ドライランはファイルを書かない
#[test]
fn test_explain_writes_nothing() {
    let fx = Fixture::new("", "[profileA.pp3]\nCamera Model Name=X100\n");
    let config = fx.config();
    let image = fx.base().join("photo.RAF");
    fs::write(&image, "not an image").unwrap();

    let report = explain(&config, &image, None);
    assert!(report.full_match.is_none());
    assert!(report.base_profile.is_none());
    assert!(report.output.is_none());
    assert!(!fx.base().join("out.pp3").exists());
}
