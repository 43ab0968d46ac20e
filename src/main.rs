use clap::Parser;
use ifrc_export::utils::{logger, validation::Validate};
use ifrc_export::{CliArgs, EtlEngine, ExportPipeline, LocalStorage, TokioSleeper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    // 載入並驗證配置
    let config = match args.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration error: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    tracing::debug!("Run config: {:?}", config);

    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = ExportPipeline::new(storage, TokioSleeper, config)?;
    let engine = EtlEngine::new(pipeline);

    // 匯出階段的錯誤只記錄，不讓程序崩潰
    match engine.run().await {
        Ok(report) => {
            tracing::info!(
                "✅ Process completed: {} records, {} files written",
                report.records,
                report.files.len()
            );
        }
        Err(e) => {
            tracing::error!("❌ Error processing data: {:?}", e);
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            tracing::info!("Process completed with errors; files already written were kept");
        }
    }

    Ok(())
}
