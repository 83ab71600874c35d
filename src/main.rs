use clap::Parser;
use moss_networks::core::engine::configured_partners;
use moss_networks::core::ConfigProvider;
use moss_networks::utils::error::{ErrorSeverity, MossError};
use moss_networks::utils::{logger, validation::Validate};
use moss_networks::{prepare_target, CliConfig, MossClient, MossPipeline, ReportEngine};
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting moss-networks CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match run(config).await {
        Ok(output_path) => {
            tracing::info!("✅ Report consolidated successfully!");
            println!("✅ Report consolidated successfully!");
            println!("📁 Output saved to: {}", output_path.display());
        }
        Err(e) => {
            tracing::error!(
                "❌ Report processing failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}

async fn run(config: CliConfig) -> Result<PathBuf, MossError> {
    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let client = MossClient::with_timeout(config.server(), config.port(), config.request_timeout())?;
    let target = prepare_target(&config, &client).await?;
    tracing::info!("🔗 Report available at {}", target.report_url);

    let partners = configured_partners(&config)?;
    let renderer = config.renderer();
    let pipeline = MossPipeline::new(client, renderer, config, target, partners);

    ReportEngine::new_with_monitoring(pipeline, monitor_enabled)
        .run()
        .await
}
