//! CLI entry point for the traffic analytics tool.
//!
//! Provides subcommands for recording samples, bulk ingestion, aggregate
//! queries, forecasting, reports, and an LLM-backed pattern explanation.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use traffic_analytics::analyzers::window::DEFAULT_WINDOW;
use traffic_analytics::config::Settings;
use traffic_analytics::explain::{OpenAiExplainer, analyze_patterns};
use traffic_analytics::ingest::parse_timestamp;
use traffic_analytics::paging::{PageRequest, SortDirection, SortField};
use traffic_analytics::store::CsvStore;
use traffic_analytics::{TrafficAnalytics, model::format_timestamp};

#[derive(Parser)]
#[command(name = "traffic_analytics")]
#[command(about = "Aggregate, rank and forecast vehicle-count samples", long_about = None)]
struct Cli {
    /// CSV file holding the recorded samples (overrides TRAFFIC_DATA_FILE)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a single sample
    Add {
        /// ISO-8601 local date-time, e.g. 2023-01-01T12:30
        #[arg(value_parser = timestamp_arg)]
        timestamp: NaiveDateTime,

        /// Number of cars seen
        #[arg(allow_negative_numbers = true)]
        car_count: i64,
    },
    /// Ingest a file of "<timestamp> <count>" lines as one atomic batch
    Ingest {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Load sample data, only if the store is empty
    Seed {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Total number of cars seen
    Total,
    /// Car totals per day
    Daily,
    /// Car totals per hour of day
    Hourly,
    /// Summary statistics, including the peak hour
    Stats,
    /// Busiest samples
    Top {
        #[arg(short, default_value_t = 3)]
        k: usize,
    },
    /// Least busy run of consecutive samples
    Least {
        #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
        window: usize,
    },
    /// Forecast traffic for a time window from the previous 30 days
    Predict {
        #[arg(value_parser = timestamp_arg)]
        start: NaiveDateTime,
        #[arg(value_parser = timestamp_arg)]
        end: NaiveDateTime,
    },
    /// Full traffic report
    Report {
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// List stored samples page by page
    List {
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        size: usize,
        #[arg(long, value_enum, default_value_t = SortField::Timestamp)]
        sort: SortField,
        #[arg(long, value_enum, default_value_t = SortDirection::Desc)]
        direction: SortDirection,
    },
    /// Ask a language model to describe the traffic between two dates
    Explain {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

fn timestamp_arg(s: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(s).ok_or_else(|| format!("invalid ISO-8601 date-time: {s}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let settings = Settings::from_env();

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = settings
        .log_file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = settings
        .log_file_path
        .file_name()
        .unwrap_or(OsStr::new("traffic_analytics.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(tracing::Level::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::from_env("RUST_LOG_JSON").add_directive(tracing::Level::DEBUG.into()),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let data_file = cli.data.unwrap_or_else(|| settings.data_file.clone());
    let store = CsvStore::open(&data_file)
        .with_context(|| format!("failed to open data file {}", data_file.display()))?;
    let engine = TrafficAnalytics::new(store);

    match cli.command {
        Commands::Add {
            timestamp,
            car_count,
        } => {
            let record = engine.add_record(Some(timestamp), car_count)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Ingest { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            if text.trim().is_empty() {
                anyhow::bail!("File cannot be empty: {}", file.display());
            }
            let n = engine.ingest_bulk(&text)?;
            println!("File processed successfully: {n} records");
        }
        Commands::Seed { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let n = engine.seed_if_empty(&text)?;
            if n == 0 {
                warn!("Store already has data, sample file not loaded");
            }
            println!("Loaded {n} traffic data records");
        }
        Commands::Total => {
            println!("{}", engine.total_count()?);
        }
        Commands::Daily => {
            for (date, count) in engine.daily_totals()? {
                println!("{date} {count}");
            }
        }
        Commands::Hourly => {
            for (hour, count) in engine.hourly_distribution()? {
                println!("{hour:02}:00 {count}");
            }
        }
        Commands::Stats => {
            let stats = engine.statistics()?;
            if let Some(label) = stats.peak_hour_label() {
                info!(peak = %label, "Peak hour");
            }
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Top { k } => {
            for r in engine.top_k(k)? {
                println!("{} {}", format_timestamp(&r.timestamp), r.car_count);
            }
        }
        Commands::Least { window } => {
            for r in engine.min_sum_window(window)? {
                println!("{} {}", format_timestamp(&r.timestamp), r.car_count);
            }
        }
        Commands::Predict { start, end } => {
            let forecast = engine.predict(start, end)?;
            println!("{}", serde_json::to_string_pretty(&forecast)?);
        }
        Commands::Report { format } => match format {
            ReportFormat::Text => print!("{}", engine.text_report()?),
            ReportFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&engine.structured_report()?)?
                );
            }
        },
        Commands::List {
            page,
            size,
            sort,
            direction,
        } => {
            let page = engine.list_records(PageRequest {
                page,
                size,
                sort,
                direction,
            })?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Commands::Explain {
            start_date,
            end_date,
        } => {
            let api_key = settings
                .openai_api_key
                .clone()
                .context("OPENAI_API_KEY must be set")?;
            let explainer = OpenAiExplainer::new(
                &settings.openai_base_url,
                api_key,
                settings.openai_model.clone(),
                settings.openai_timeout,
            )?;
            let text = analyze_patterns(engine.store(), &explainer, start_date, end_date).await?;
            println!("{text}");
        }
    }

    Ok(())
}
