use clap::Parser;
use regional_signal::adapters::csv_loader;
use regional_signal::utils::error::ErrorSeverity;
use regional_signal::utils::{logger, validation::Validate};
use regional_signal::{
    AggregatorSettings, CliConfig, InMemoryFacilityStore, Query, SignalEngine, SignalError,
    TomlConfig,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入設定檔，命令列參數優先
    let mut config = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(1);
            }
        },
        None => TomlConfig::default(),
    };
    cli.apply_to(&mut config);

    if config.json_logs() {
        logger::init_json_logger(config.verbose());
    } else {
        logger::init_cli_logger(config.verbose());
    }

    tracing::info!("Starting regional-signal");
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = cli.validate().and_then(|_| config.validate()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match run(&cli, &config).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Query failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}

async fn run(cli: &CliConfig, config: &TomlConfig) -> Result<String, SignalError> {
    let cases_path = config
        .cases_path()
        .ok_or_else(|| SignalError::MissingConfigError {
            field: "data.cases_path (--cases)".to_string(),
        })?;
    let cases = Arc::new(csv_loader::load_case_store(cases_path)?);

    let facilities = match config.facilities_path() {
        Some(path) => Arc::new(csv_loader::load_facility_store(path)?),
        None if cli.needs_facilities() => {
            return Err(SignalError::MissingConfigError {
                field: "data.facilities_path (--facilities)".to_string(),
            });
        }
        None => Arc::new(InMemoryFacilityStore::new()),
    };

    let settings = AggregatorSettings::from_provider(config);
    tracing::debug!("Aggregator settings: {:?}", settings);
    let engine = SignalEngine::new(cases, facilities, settings);

    let json = match &cli.query {
        Query::Trend { date, filter } => {
            serde_json::to_string_pretty(&engine.trend(date, filter.as_deref()).await?)
        }
        Query::Capacity { date } => serde_json::to_string_pretty(&engine.capacity(date).await?),
        Query::Areas { date, area } => {
            serde_json::to_string_pretty(&engine.areas(date, area.as_deref()).await?)
        }
        Query::Nation { date } => serde_json::to_string_pretty(&engine.nationwide(date).await?),
        Query::Select {
            date,
            count,
            under,
            desc,
        } => serde_json::to_string_pretty(
            &engine
                .select(date, *count, Query::side(*under), Query::order(*desc))
                .await?,
        ),
        Query::FirstDay {
            region,
            count,
            from,
            to,
        } => serde_json::to_string_pretty(
            &engine
                .first_day_over(region, *count, from.as_deref(), to.as_deref())
                .await?,
        ),
        Query::History { region, from, to } => {
            serde_json::to_string_pretty(&engine.history(region, from, to).await?)
        }
    }?;

    Ok(json)
}
