//! Football Value-Bet Bot
//!
//! Daily batch that ingests results, scores upcoming fixtures and
//! alerts on value opportunities.

use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rust_decimal_macros::dec;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use valuebet_bot::{
    client::{FixtureProvider, FootballApiClient},
    config::Config,
    model::{ClassMapping, PredictionService},
    notify::Notifier,
    pipeline::Pipeline,
    settlement::{self, PerformanceStats},
    storage::{Database, HistoryStore, SignalLedger},
    strategy::ValueDetector,
    types::Outcome,
};

#[derive(Parser)]
#[command(name = "valuebet-bot")]
#[command(about = "Value-bet detection and alerting for football fixtures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daily batch
    Run {
        /// Dry run mode (no ledger writes, no alerts)
        #[arg(long)]
        dry_run: bool,
    },
    /// Show ledger performance statistics
    Stats,
    /// Reconcile pending signals against finished fixtures
    Settle {
        /// Results date (YYYY-MM-DD), defaults to yesterday
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run { dry_run } => run_batch(config, dry_run).await,
        Commands::Stats => show_stats(config).await,
        Commands::Settle { date } => settle_only(config, date).await,
    }
}

fn yesterday() -> NaiveDate {
    Utc::now().date_naive() - Duration::days(1)
}

async fn run_batch(config: Config, dry_run: bool) -> anyhow::Result<()> {
    tracing::info!("Starting value-bet batch");

    if dry_run {
        tracing::warn!("Running in DRY RUN mode - nothing will be recorded or alerted");
    }

    // Validate the class mapping before anything can be scored
    let mapping = ClassMapping::new(config.model.class_order.clone())?;

    let provider = FootballApiClient::new(&config.provider)?;
    let model = PredictionService::new(&config.model)?;
    if let Err(e) = model.health().await {
        tracing::warn!("Prediction service health probe failed: {}", e);
    }

    let db = Database::connect(&config.database.path).await?;
    let history = HistoryStore::load(db.pool().clone()).await?;
    let ledger = SignalLedger::load(db.pool().clone()).await?;

    let notifier = match &config.telegram {
        Some(telegram) => Notifier::new(telegram),
        None => {
            tracing::warn!("Telegram not configured, alerts disabled");
            Notifier::disabled()
        }
    };
    notifier
        .startup(config.provider.leagues.len(), dry_run)
        .await?;

    let detector = ValueDetector::new(&config.detector, mapping);
    let mut pipeline = Pipeline::new(
        Box::new(provider),
        Box::new(model),
        detector,
        notifier,
        history,
        ledger,
        config,
        dry_run,
    );

    let report = pipeline.run(yesterday()).await?;

    println!(
        "Batch done: {} fixtures ingested, {} signals, {} settled ({} W / {} L)",
        report.fixtures_ingested,
        report.signals_recorded,
        report.settlement.settled(),
        report.settlement.wins,
        report.settlement.losses,
    );

    Ok(())
}

async fn show_stats(config: Config) -> anyhow::Result<()> {
    let db = Database::connect(&config.database.path).await?;
    let ledger = SignalLedger::load(db.pool().clone()).await?;
    let stats = PerformanceStats::from_entries(ledger.entries(), config.detector.stake);

    let pending = ledger.len() - stats.settled;

    println!("\n📊 Ledger Performance\n");
    println!("Signals recorded: {}", ledger.len());
    println!("Pending:          {}", pending);
    println!("Settled:          {}", stats.settled);
    println!("Wins / Losses:    {} / {}", stats.wins, stats.losses);
    println!("Win rate:         {:.1}%", stats.win_rate * dec!(100));
    println!(
        "Profit:           {:+.2} (stake {} per bet, ROI {:+.1}%)",
        stats.profit,
        stats.stake,
        stats.roi * dec!(100)
    );

    Ok(())
}

async fn settle_only(config: Config, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let date = date.unwrap_or_else(yesterday);
    let provider = FootballApiClient::new(&config.provider)?;

    let db = Database::connect(&config.database.path).await?;
    let mut ledger = SignalLedger::load(db.pool().clone()).await?;

    let mut results = std::collections::HashMap::<String, Outcome>::new();
    for &league in &config.provider.leagues {
        match provider.finished_fixtures(league, date).await {
            Ok(fixtures) => {
                for fixture in fixtures {
                    results.insert(fixture.fixture_id.to_string(), fixture.result());
                }
            }
            Err(e) => tracing::warn!(league, error = %e, "skipping league results"),
        }
    }

    let summary = settlement::settle(&mut ledger, &results).await?;
    println!(
        "Settled {} signals for {}: {} W / {} L",
        summary.settled(),
        date,
        summary.wins,
        summary.losses,
    );

    Ok(())
}
