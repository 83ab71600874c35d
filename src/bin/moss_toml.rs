use anyhow::Context;
use clap::Parser;
use moss_networks::config::toml_config::TomlConfig;
use moss_networks::core::engine::configured_partners;
use moss_networks::core::ConfigProvider;
use moss_networks::utils::{logger, validation::Validate};
use moss_networks::{prepare_target, MossClient, MossPipeline, ReportEngine};

#[derive(Parser)]
#[command(name = "moss-toml")]
#[command(about = "moss-networks driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "moss.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the report location from config
    #[arg(long)]
    report_url: Option<String>,

    /// Show what would be submitted without contacting the server
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file '{}'", args.config))?;

    if config.json_logging() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose || config.verbose());
    }
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(url) = args.report_url.clone() {
        tracing::info!("🔧 Report location overridden to: {}", url);
        config.moss.report_url = Some(url);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        anyhow::bail!(e.user_friendly_message());
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be submitted");
        perform_dry_run(&config)?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let client = MossClient::with_timeout(config.server(), config.port(), config.request_timeout())?;
    let target = prepare_target(&config, &client)
        .await
        .context("Submission failed")?;
    let partners = configured_partners(&config).context("Failed to load partners")?;
    let renderer = config.renderer();
    let pipeline = MossPipeline::new(client, renderer, config, target, partners);

    let output_path = ReportEngine::new_with_monitoring(pipeline, monitor_enabled)
        .run()
        .await
        .context("Report processing failed")?;

    println!("✅ Report consolidated successfully!");
    println!("📁 Output saved to: {}", output_path.display());
    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Server: {}:{}", config.server(), config.port());
    println!("  Language: {}", config.language());
    match config.report_url() {
        Some(url) => println!("  Report: {} (existing)", url),
        None => println!(
            "  Files: {} base, {} current, {} historical",
            config.base_files().len(),
            config.current_files().len(),
            config.historical_files().len()
        ),
    }
    println!("  Output: {}", config.output_path());
    println!(
        "  Filter: {} (threshold {}, track current: {})",
        config.filter_enabled(),
        config.threshold(),
        config.track_current_students()
    );
    println!("  Archive: {} (zip: {})", config.archive(), config.zip_report());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
    println!();
}

fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");

    let sections = [
        ("Base", config.base_files()),
        ("Current", config.current_files()),
        ("Historical", config.historical_files()),
    ];
    for (label, files) in &sections {
        println!();
        println!("📄 {} files:", label);
        for file in files {
            let status = if file.path.is_file() { "✅" } else { "❌ missing" };
            let name = if file.name.is_empty() { "(derived)" } else { file.name.as_str() };
            println!("  {} {} -> {}", status, file.path.display(), name);
        }
    }

    if config.partners_file().is_some() {
        let partners = configured_partners(config)?;
        println!();
        println!("🤝 Partner pairs: {}", partners.len());
    }

    println!();
    println!("✅ Dry run analysis complete.");
    Ok(())
}
