use anyhow::Context;
use clap::{CommandFactory, Parser};
use rt_profile_selector::{cli, config, extractor, logging, selector};
use cli::{Cli, Commands};
use config::SelectorConfig;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    let base_dir = cli
        .base_dir
        .clone()
        .unwrap_or_else(SelectorConfig::default_base_dir);

    let Some(command) = cli.into_command() else {
        // 引数なし: ヘルプを表示して失敗扱い
        let _ = Cli::command().print_help();
        return ExitCode::FAILURE;
    };

    logging::init(&base_dir.join(config::LOG_FILE_NAME), verbose);

    match run(command, &base_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("エラー: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, base_dir: &std::path::Path) -> anyhow::Result<()> {
    let config = SelectorConfig::load(base_dir)
        .with_context(|| format!("設定を読み込めません: {}", base_dir.display()))?;

    match command {
        Commands::Select { keyfile } => {
            let report = selector::run_keyfile(&config, &keyfile)
                .with_context(|| format!("プロファイル生成に失敗: {}", keyfile.display()))?;
            if let Some(output) = &report.output {
                tracing::debug!("出力: {}", output.display());
            }
        }

        Commands::Fields { image } => {
            let fields = extractor::extract_fields(&image, &config);
            print!("{}", extractor::format_fields(&fields));
        }

        Commands::Explain { image, default_profile, json } => {
            let report = selector::explain(&config, &image, default_profile.as_deref());

            if json {
                println!("{}", report.to_json()?);
                return Ok(());
            }

            println!("画像: {}", report.image.display());
            match &report.full_match {
                Some(m) => println!("完全ルール: [{}] ({}キー)", m.profile_name, m.key_count),
                None => println!("完全ルール: 一致なし"),
            }
            match &report.base_profile {
                Some(p) => println!("ベースプロファイル: {}", p.display()),
                None => println!("ベースプロファイル: (既定プロファイル未指定)"),
            }

            println!("\n部分ルール（適用順）:");
            for partial in &report.partial_matches {
                println!("  - {} {:?}", partial.profile_name, partial.targets);
            }

            println!("\n上書きセット:");
            for summary in &report.overrides {
                println!("  [{}]", summary.section);
                for entry in &summary.entries {
                    println!("    {}={}  ; {}", entry.key, entry.value, entry.source);
                }
            }
        }
    }

    Ok(())
}
