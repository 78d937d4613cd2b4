//! SentLab Runner — run configuration, data loading, orchestration, export.
//!
//! This crate builds on `sentlab-core` to provide:
//! - TOML run configuration with validation and a content-hash run ID
//! - CSV loaders for price and scored-headline files, and the daily join
//! - Single-backtest runner with a performance summary
//! - Artifact export (equity, events, trades, summary)

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{ConfigError, InvalidConfigError, RunConfig, RunId};
pub use data_loader::{
    attach_sentiment, daily_mean_sentiment, load_price_csv, load_sentiment_csv, LoadError,
    SentimentObservation,
};
pub use export::{load_summary, save_artifacts, ArtifactPaths, RunSummaryFile};
pub use metrics::PerformanceSummary;
pub use runner::{run_backtest, run_from_files, BacktestResult, RunError};
