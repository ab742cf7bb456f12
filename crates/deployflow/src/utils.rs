use colored::Colorize;
use deployflow::LoadedConfig;
use deployflow_build::RegistryAuth;

/// 読み込んだ設定を表示
pub fn print_config(loaded: &LoadedConfig) {
    let config = &loaded.config;

    match &loaded.source_file {
        Some(path) => println!("設定ファイル: {}", path.display().to_string().cyan()),
        None => println!("設定ファイル: {}", "(なし: 既定値と引数のみ)".dimmed()),
    }
    println!("パイプライン: {}", config.name.cyan());
    println!(
        "レジストリ: {} ({})",
        config.namespace.cyan(),
        RegistryAuth::for_namespace(&config.namespace).registry()
    );
    println!("タグ: {}", config.tag.cyan());
    match &config.source {
        Some(source) => println!(
            "ソース: {} ({})",
            source.repository.cyan(),
            source.branch.cyan()
        ),
        None => println!("ソース: {}", "(取得しない)".dimmed()),
    }
    println!("作業ディレクトリ: {}", config.workdir().display());
    println!("マニフェスト: {}", config.manifest_path().display());
    println!("並列数: {}", config.concurrency);

    println!();
    println!(
        "{}",
        format!("対象サービス ({} 個):", config.services.len()).bold()
    );
    for service in config.services.iter() {
        println!(
            "  • {} ({})",
            service.as_str().cyan(),
            config.image_for(service)
        );
    }
}
