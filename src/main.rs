use clap::Parser;
use pdf_extractor_client::core::{export, ApiStatus};
use pdf_extractor_client::utils::error::{ClientError, ErrorSeverity};
use pdf_extractor_client::utils::{logger, validation::Validate};
use pdf_extractor_client::{
    CliConfig, ClientConfig, ExtractionClient, ExtractionEngine, LocalStorage, RunSummary,
};

fn exit_code(error: &ClientError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report_failure(context: &str, error: &ClientError) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        error,
        error.category(),
        error.severity()
    );
    eprintln!("❌ {}", error.user_friendly_message());
    eprintln!("💡 {}", error.recovery_suggestion());
    std::process::exit(exit_code(error).max(1));
}

fn print_summary(summary: &RunSummary, config: &ClientConfig) {
    let table = export::table_view(&summary.result, summary.document_type);
    println!("{}", table.render());
    println!();

    for line in export::file_summaries(&summary.result) {
        println!("{}", line);
    }
    for warning in summary.warnings() {
        println!("⚠️ {}", warning);
    }

    println!(
        "📊 {} succeeded, {} failed ({})",
        summary.successful(),
        summary.failed(),
        summary.document_type.description()
    );
    println!("📁 CSV:  {}/{}", config.output_path, summary.csv_file);
    println!("📁 JSON: {}/{}", config.output_path, summary.json_file);

    if let Some(archive) = &summary.archive {
        println!(
            "📦 ZIP:  {}/{} ({} bytes, {} file(s))",
            config.output_path,
            archive.filename,
            archive.size,
            archive.entries.len()
        );
        for entry in &archive.entries {
            println!("    {}", entry);
        }
    }
    if let Some(excel) = &summary.excel_file {
        println!("📁 Excel: {}/{}", config.output_path, excel);
    }
    for error in &summary.download_errors {
        eprintln!("❌ {}", error);
    }
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting pdf-extractor-client");
    tracing::debug!("CLI arguments: {:?}", cli);

    let config = match ClientConfig::load(&cli.overrides(), cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => report_failure("Configuration could not be loaded", &e),
    };
    if let Err(e) = config.validate() {
        report_failure("Configuration validation failed", &e);
    }
    tracing::debug!("Resolved configuration: {:?}", config);

    if cli.dry_run {
        println!("✅ Configuration is valid");
        println!("   API:           {}", config.base_url);
        println!("   Document type: {}", config.document_type);
        println!("   Rename:        {}", config.rename.enabled);
        println!("   Output:        {}", config.output_path);
        return;
    }

    if cli.check_health {
        let status = ExtractionClient::from_config(&config).health().await;
        match status {
            ApiStatus::Online => println!("✅ API online: {}", config.base_url),
            _ => {
                eprintln!("❌ API offline: {}", config.base_url);
                std::process::exit(2);
            }
        }
        return;
    }

    let input = LocalStorage::new(".");
    let output = LocalStorage::new(config.output_path.clone());
    let mut engine = ExtractionEngine::new(input, output, config.clone(), config.run_options())
        .with_retry_policy(config.retry_policy());

    match engine.run(&cli.files).await {
        Ok(summary) => {
            print_summary(&summary, &config);
            if !summary.download_errors.is_empty() {
                std::process::exit(2);
            }
        }
        Err(e) => report_failure("Extraction failed", &e),
    }
}
