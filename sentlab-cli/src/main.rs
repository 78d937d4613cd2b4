//! SentLab CLI — run and validate sentiment-gated backtests.
//!
//! Commands:
//! - `run` — load a price file (plus optional headline file), run, save artifacts
//! - `validate` — check config and input files without running
//!
//! Logging goes to stderr and is filtered by `RUST_LOG` (default `info`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sentlab_core::data::BarFeed;
use sentlab_core::engine::EndOfRunPolicy;
use sentlab_runner::{
    attach_sentiment, daily_mean_sentiment, load_price_csv, load_sentiment_csv, run_from_files,
    save_artifacts, BacktestResult, RunConfig,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "sentlab",
    about = "SentLab CLI — sentiment-gated backtesting engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest and write its artifacts.
    Run {
        /// Daily price CSV (Date,Open,High,Low,Close,Adj Close,Volume[,sentiment]).
        #[arg(long)]
        prices: PathBuf,

        /// Scored-headline CSV (date,score); averaged per day and joined onto prices.
        #[arg(long)]
        sentiment: Option<PathBuf>,

        /// Path to a TOML run config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Close any open position at the last bar's close.
        #[arg(long, default_value_t = false)]
        liquidate: bool,
    },
    /// Validate config and input files without running.
    Validate {
        #[arg(long)]
        prices: PathBuf,

        #[arg(long)]
        sentiment: Option<PathBuf>,

        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            prices,
            sentiment,
            config,
            output_dir,
            liquidate,
        } => run_cmd(&prices, sentiment.as_deref(), config.as_deref(), &output_dir, liquidate),
        Commands::Validate {
            prices,
            sentiment,
            config,
        } => validate_cmd(&prices, sentiment.as_deref(), config.as_deref()),
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}

fn run_cmd(
    prices: &Path,
    sentiment: Option<&Path>,
    config_path: Option<&Path>,
    output_dir: &Path,
    liquidate: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if liquidate {
        config.end_of_run = EndOfRunPolicy::Liquidate;
    }

    let result = run_from_files(&config, prices, sentiment)?;
    print_summary(&result);

    let paths = save_artifacts(&result, output_dir)?;
    println!("Artifacts saved to: {}", paths.run_dir.display());
    Ok(())
}

fn validate_cmd(prices: &Path, sentiment: Option<&Path>, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    config.validate()?;

    let mut bars = load_price_csv(prices)?;
    if let Some(path) = sentiment {
        let observations = load_sentiment_csv(path)?;
        bars = attach_sentiment(bars, &daily_mean_sentiment(&observations));
    }
    let feed = BarFeed::from_raw(bars)?;
    let count = feed.total_len();
    let mut dates = feed.map(|bar| bar.date);
    let first = dates.next();
    let last = dates.last().or(first);

    info!(bars = count, "input is valid");
    match (first, last) {
        (Some(first), Some(last)) => println!("OK: {count} bars from {first} to {last}"),
        _ => println!("OK: {count} bars"),
    }
    println!("Run ID: {}", config.run_id()?);
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let s = &result.summary;
    let outcome = &result.outcome;

    println!("Starting Portfolio Value: {:.2}", s.starting_value);
    println!("Final Portfolio Value: {:.2}", s.final_value);
    println!();
    println!("Run ID:         {}", result.run_id);
    println!("Strategy:       {}", outcome.strategy_name);
    if let Some(symbol) = &result.config.symbol {
        println!("Symbol:         {symbol}");
    }
    println!("Bars:           {}", outcome.bar_count);
    if let (Some(first), Some(last)) = (outcome.first_date(), outcome.last_date()) {
        println!("Period:         {first} to {last}");
    }
    println!("Total return:   {:.2}%", s.total_return * 100.0);
    println!("Max drawdown:   {:.2}%", s.max_drawdown * 100.0);
    println!("Sharpe:         {:.2}", s.sharpe);
    println!("Trades:         {}", s.trade_count);
    println!("Win rate:       {:.1}%", s.win_rate * 100.0);
    println!("Commission:     {:.2}", s.total_commission);

    if let Some(order) = &outcome.pending_order_at_end {
        println!(
            "Note: {} order {} for {} shares was still pending at the end of the data",
            order.side, order.id, order.size
        );
    }
    if outcome.open_position_at_end {
        println!(
            "Note: position of {} shares left open, marked to the last close",
            outcome.final_position.size
        );
    }
}
