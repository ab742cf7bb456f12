use crate::utils;
use colored::Colorize;
use deployflow::LoadedConfig;
use deployflow_core::{ComposeManifest, Credentials};

pub fn handle(loaded: &LoadedConfig) -> anyhow::Result<()> {
    println!("{}", "設定を検証中...".blue());
    utils::print_config(loaded);

    let config = &loaded.config;
    let mut problems = Vec::new();

    println!();
    println!("{}", "ビルドコンテキスト:".bold());
    for service in config.services.iter() {
        let context = config.context_dir(service);
        if context.is_dir() {
            println!("  {} {}", "✓".green(), context.display());
        } else {
            println!("  {} {} (見つかりません)", "✗".red().bold(), context.display());
            problems.push(format!("ビルドコンテキストがありません: {}", context.display()));
        }
    }

    println!();
    println!("{}", "マニフェスト:".bold());
    let manifest_path = config.manifest_path();
    match ComposeManifest::load(&manifest_path).and_then(|m| m.plan(&config.images())) {
        Ok(report) => {
            for change in &report.changes {
                println!(
                    "  {} {} → {} ({:?})",
                    "✓".green(),
                    change.service.as_str().cyan(),
                    change.image,
                    change.outcome
                );
            }
        }
        Err(e) => {
            println!("  {} {}", "✗".red().bold(), e);
            problems.push(e.user_message());
        }
    }

    println!();
    match Credentials::from_env() {
        Ok(Some(creds)) => println!("認証情報: {} ({})", "✓".green(), creds.username),
        Ok(None) => println!(
            "認証情報: {}",
            "未設定（run / build --push には --skip-login が必要です）".yellow()
        ),
        Err(e) => problems.push(e.user_message()),
    }

    if problems.is_empty() {
        println!();
        println!("{}", "✓ 設定は正常です！".green().bold());
        Ok(())
    } else {
        eprintln!();
        for problem in &problems {
            eprintln!("{}", problem.red());
        }
        anyhow::bail!("{} 件の問題が見つかりました", problems.len())
    }
}
