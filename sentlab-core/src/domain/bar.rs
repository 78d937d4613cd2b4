//! Bar — one trading day of OHLCV data plus the day's sentiment score.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A validated bar as consumed by the engine.
///
/// Produced only by `BarFeed`, which guarantees finite prices, non-negative
/// volume, a sentiment score in [-1, 1], and strictly increasing dates
/// across the sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Aggregated news sentiment for the date; 0.0 when there was no news.
    pub sentiment: f64,
}

impl Bar {
    /// Bar with no sentiment observation and zero volume. Mostly useful in tests.
    pub fn ohlc(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume: 0.0,
            sentiment: 0.0,
        }
    }

    pub fn with_sentiment(mut self, sentiment: f64) -> Self {
        self.sentiment = sentiment;
        self
    }

    /// Basic OHLC sanity check: high >= low and both bracket open/close.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

/// Unvalidated input record handed over by the data-acquisition side.
///
/// Price fields are optional so that a missing cell can be reported as a
/// `MalformedInputError` instead of silently becoming zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    pub sentiment: Option<f64>,
}

impl RawBar {
    pub fn ohlc(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(0.0),
            sentiment: None,
        }
    }

    pub fn with_sentiment(mut self, sentiment: f64) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }
}
