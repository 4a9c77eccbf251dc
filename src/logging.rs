//! ログ設定
//!
//! - `RTProfileSelector.log`（実行ごとに作り直す、ANSIなし）
//! - `--verbose` 指定時は標準エラーにも出力
//!
//! レベルは `RUST_LOG` で上書きできる。

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// ログを初期化（1プロセスで1回）
///
/// ログファイルを作れない場合は標準エラーのみ（`--verbose` 時）で続行する。
pub fn init(log_path: &Path, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    let (log_file, file_error) = match File::create(log_path) {
        Ok(f) => (Some(f), None),
        Err(e) => (None, Some(e)),
    };

    let file_layer = log_file.map(|f| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(f))
    });
    let stderr_layer =
        verbose.then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();

    if result.is_err() {
        return;
    }
    if let Some(e) = file_error {
        tracing::warn!("ログファイルを作成できません: {}: {}", log_path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(true), "debug");
        assert_eq!(default_level(false), "info");
    }
}
