//! Backtest runner — wires together config, feed, engine, and metrics.
//!
//! Two entry points:
//! - `run_backtest()`: takes already-loaded `RawBar`s. No I/O.
//! - `run_from_files()`: loads the price file (and optional headline file)
//!   first. Used by the CLI.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use sentlab_core::data::{BarFeed, MalformedInputError};
use sentlab_core::domain::RawBar;
use sentlab_core::engine::{Engine, EngineError, RunOutcome};
use sentlab_core::strategy::SentimentStrategy;

use crate::config::{InvalidConfigError, RunConfig, RunId};
use crate::data_loader::{
    attach_sentiment, daily_mean_sentiment, load_price_csv, load_sentiment_csv, LoadError,
};
use crate::metrics::PerformanceSummary;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] InvalidConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("malformed input: {0}")]
    Malformed(#[from] MalformedInputError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("failed to hash config: {0}")]
    RunId(#[from] serde_json::Error),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: RunConfig,
    pub summary: PerformanceSummary,
    pub outcome: RunOutcome,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run a backtest on pre-loaded bars.
///
/// The configuration is validated and the whole bar sequence checked before
/// the first bar is processed.
pub fn run_backtest(config: &RunConfig, raw_bars: Vec<RawBar>) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let feed = BarFeed::from_raw(raw_bars)?;

    info!(
        run_id = %run_id,
        bars = feed.total_len(),
        trade_size = config.trade_size,
        threshold = config.sentiment_buy_threshold,
        exit_bars = config.exit_bars,
        "starting backtest"
    );
    info!("Starting Portfolio Value: {:.2}", config.initial_cash);

    let strategy = SentimentStrategy::new(config.sentiment_params());
    let outcome = Engine::new(feed, config.initial_cash, config.commission, &strategy)
        .with_end_of_run(config.end_of_run)
        .run()?;

    info!("Final Portfolio Value: {:.2}", outcome.final_equity);

    let summary = PerformanceSummary::compute(
        outcome.initial_cash,
        &outcome.equity_values(),
        &outcome.trades,
        &outcome.events,
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        summary,
        outcome,
    })
}

/// Load a price file, optionally join a headline file onto it, and run.
pub fn run_from_files(
    config: &RunConfig,
    prices: &Path,
    sentiment: Option<&Path>,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let mut bars = load_price_csv(prices)?;
    if let Some(path) = sentiment {
        let observations = load_sentiment_csv(path)?;
        bars = attach_sentiment(bars, &daily_mean_sentiment(&observations));
    }
    run_backtest(config, bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sentlab_core::engine::{CommissionModel, EndOfRunPolicy};

    fn bars(sentiment: &[f64]) -> Vec<RawBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        sentiment
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let px = 100.0 + i as f64;
                RawBar::ohlc(start + chrono::Duration::days(i as i64), px, px, px, px)
                    .with_sentiment(*s)
            })
            .collect()
    }

    #[test]
    fn scenario_b_summary() {
        let config = RunConfig {
            trade_size: 100,
            ..RunConfig::default()
        };
        let result = run_backtest(&config, bars(&[0.1, 0.7, 0.2, 0.2, 0.2])).unwrap();
        assert_eq!(result.summary.starting_value, 100_000.0);
        assert_eq!(result.summary.final_value, 100_200.0);
        assert!((result.summary.total_return - 0.002).abs() < 1e-12);
        assert_eq!(result.summary.trade_count, 0);
        assert!(result.outcome.open_position_at_end);
        assert_eq!(result.run_id, config.run_id().unwrap());
    }

    #[test]
    fn open_position_entry_fee_is_counted() {
        let config = RunConfig {
            trade_size: 100,
            commission: CommissionModel::per_trade(5.0),
            ..RunConfig::default()
        };
        let result = run_backtest(&config, bars(&[0.1, 0.7, 0.2, 0.2, 0.2])).unwrap();
        assert!(result.outcome.open_position_at_end);
        assert_eq!(result.outcome.final_cash, 89_795.0);
        assert_eq!(result.summary.trade_count, 0);
        assert_eq!(result.summary.total_commission, 5.0);
    }

    #[test]
    fn liquidate_policy_from_config() {
        let config = RunConfig {
            trade_size: 100,
            end_of_run: EndOfRunPolicy::Liquidate,
            ..RunConfig::default()
        };
        let result = run_backtest(&config, bars(&[0.1, 0.7, 0.2, 0.2, 0.2])).unwrap();
        assert_eq!(result.summary.trade_count, 1);
        assert_eq!(result.summary.win_rate, 1.0);
        assert!(!result.outcome.open_position_at_end);
    }

    #[test]
    fn invalid_config_fails_before_data_checks() {
        let config = RunConfig {
            initial_cash: -1.0,
            ..RunConfig::default()
        };
        // Empty input would also fail, but config is checked first.
        let err = run_backtest(&config, Vec::new()).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }

    #[test]
    fn negative_open_fails_before_the_run() {
        let mut raw = bars(&[0.9, 0.0, 0.0]);
        raw[1].open = Some(-5.0);
        raw[1].low = Some(-5.0);
        let err = run_backtest(&RunConfig::default(), raw).unwrap_err();
        assert!(matches!(
            err,
            RunError::Malformed(MalformedInputError::NonPositivePrice { index: 1, field: "open", .. })
        ));
    }

    #[test]
    fn malformed_bars_fail_before_the_run() {
        let mut raw = bars(&[0.0, 0.0, 0.0]);
        raw[1].close = None;
        let err = run_backtest(&RunConfig::default(), raw).unwrap_err();
        assert!(matches!(
            err,
            RunError::Malformed(MalformedInputError::MissingField { index: 1, field: "close", .. })
        ));
    }
}
