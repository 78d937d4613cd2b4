//! Serializable run configuration.
//!
//! Loaded from TOML; every field has a default so a partial file (or no file
//! at all) is a valid configuration. Validation is explicit and runs before
//! any data is touched.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sentlab_core::engine::{CommissionModel, EndOfRunPolicy};
use sentlab_core::strategy::SentimentParams;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// A configuration value outside its allowed range.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidConfigError {
    #[error("initial_cash must be a positive number, got {0}")]
    NonPositiveInitialCash(f64),

    #[error("trade_size must be a positive integer")]
    ZeroTradeSize,

    #[error("commission must be finite and non-negative, got {0}")]
    NegativeCommission(f64),

    #[error("percentage commission rate must be below 1, got {0}")]
    CommissionRateTooHigh(f64),

    #[error("exit_bars must be at least 1")]
    ZeroExitBars,

    #[error("sentiment_buy_threshold must be finite, got {0}")]
    NonFiniteThreshold(f64),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] InvalidConfigError),
}

/// Parameters for one backtest run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    #[serde(default = "default_initial_cash")]
    pub initial_cash: f64,

    /// Shares bought on entry and sold on exit.
    #[serde(default = "default_trade_size")]
    pub trade_size: u64,

    #[serde(default = "default_buy_threshold")]
    pub sentiment_buy_threshold: f64,

    #[serde(default = "default_exit_bars")]
    pub exit_bars: usize,

    #[serde(default)]
    pub commission: CommissionModel,

    #[serde(default)]
    pub end_of_run: EndOfRunPolicy,

    /// Label only; the engine trades a single unnamed instrument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

fn default_initial_cash() -> f64 {
    100_000.0
}

fn default_trade_size() -> u64 {
    1000
}

fn default_buy_threshold() -> f64 {
    0.6
}

fn default_exit_bars() -> usize {
    3
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            initial_cash: default_initial_cash(),
            trade_size: default_trade_size(),
            sentiment_buy_threshold: default_buy_threshold(),
            exit_bars: default_exit_bars(),
            commission: CommissionModel::default(),
            end_of_run: EndOfRunPolicy::default(),
            symbol: None,
        }
    }
}

impl RunConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), InvalidConfigError> {
        if !(self.initial_cash.is_finite() && self.initial_cash > 0.0) {
            return Err(InvalidConfigError::NonPositiveInitialCash(self.initial_cash));
        }
        if self.trade_size == 0 {
            return Err(InvalidConfigError::ZeroTradeSize);
        }
        if !self.commission.is_valid() {
            return Err(InvalidConfigError::NegativeCommission(
                self.commission.parameter(),
            ));
        }
        if let CommissionModel::Percentage { rate } = self.commission {
            if rate >= 1.0 {
                return Err(InvalidConfigError::CommissionRateTooHigh(rate));
            }
        }
        if self.exit_bars == 0 {
            return Err(InvalidConfigError::ZeroExitBars);
        }
        if !self.sentiment_buy_threshold.is_finite() {
            return Err(InvalidConfigError::NonFiniteThreshold(
                self.sentiment_buy_threshold,
            ));
        }
        Ok(())
    }

    pub fn sentiment_params(&self) -> SentimentParams {
        SentimentParams {
            buy_threshold: self.sentiment_buy_threshold,
            exit_bars: self.exit_bars,
            trade_size: self.trade_size,
        }
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share a RunId, and therefore an
    /// artifact directory.
    pub fn run_id(&self) -> Result<RunId, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        let hash = blake3::hash(json.as_bytes());
        Ok(hash.to_hex().to_string())
    }
}
