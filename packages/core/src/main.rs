use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;

use plan_fee_benchmark::{
    api::{self, benchmarks::BenchmarkApiState},
    benchmark::{BenchmarkEngine, BenchmarkSource},
    cli::{Cli, Command, IngestArgs},
    config::{Config, SourceKind},
    db,
    error::AppError,
    fixture::FixtureSource,
    ingest::{self, Form5500Row, ScheduleARow},
    logging::init_logging,
    metrics::AppMetrics,
    repository::BenchmarkRepository,
    store::InMemoryBenchmarkStore,
};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::from_env()
        .and_then(|config| config.apply_cli(&cli))
        .map_err(AppError::Config)?;

    match &cli.command {
        Some(Command::Ingest(args)) => run_ingest(&config, args).await,
        None => serve(config).await,
    }
}

async fn run_ingest(config: &Config, args: &IngestArgs) -> Result<(), AppError> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is required for ingest".to_string()))?;

    let filings: Vec<Form5500Row> =
        ingest::load_rows(&args.form5500).map_err(|err| AppError::Unknown(err.to_string()))?;
    let schedules: Vec<ScheduleARow> =
        ingest::load_rows(&args.schedule_a).map_err(|err| AppError::Unknown(err.to_string()))?;

    let (records, summary) = ingest::join_filings(filings, schedules, args.plan_year);
    tracing::info!(
        "Joined {} of {} filings; dropped {} ({} without fee, {} negative fee, {} without plan year, {} duplicate)",
        summary.joined,
        summary.filings,
        summary.dropped(),
        summary.missing_fee,
        summary.negative_fee,
        summary.missing_year,
        summary.duplicate
    );

    let pool = db::create_pool(database_url).await?;
    let repository = BenchmarkRepository::new(pool);
    let written = repository.insert_records(&records).await?;
    let total = repository.count_records().await?;

    tracing::info!("Wrote {} records; {} stored in total", written, total);
    Ok(())
}

async fn serve(config: Config) -> Result<(), AppError> {
    tracing::info!("Service starting with config: {:?}", config);

    let source: Arc<dyn BenchmarkSource + Send + Sync> = match config.source {
        SourceKind::Sqlite => {
            let url = config.database_url.as_deref().unwrap_or_default();
            Arc::new(BenchmarkRepository::new(db::create_pool(url).await?))
        }
        SourceKind::Memory => {
            let path = config
                .data_path
                .as_ref()
                .ok_or_else(|| AppError::Config("BENCHMARK_DATA_PATH is required".to_string()))?;
            let store = InMemoryBenchmarkStore::from_json_file(path)
                .map_err(|err| AppError::Config(err.to_string()))?;
            Arc::new(store)
        }
        SourceKind::Fixture => Arc::new(FixtureSource::new()),
    };

    let engine = BenchmarkEngine::new(source);
    if let Err(err) = engine.health_check().await {
        tracing::warn!("Record source {} is not healthy yet: {}", engine.source_name(), err);
    }

    let metrics = Arc::new(
        AppMetrics::new().map_err(|err| AppError::Unknown(format!("metrics: {}", err)))?,
    );
    let cors = api::cors_layer(config.cors_allow_origin.as_deref()).map_err(AppError::Config)?;
    let app = api::build_router(BenchmarkApiState::new(engine, metrics), cors);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind {}: {}", config.bind_addr, err)))?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|err| AppError::Unknown(format!("server failed: {}", err)))
}
