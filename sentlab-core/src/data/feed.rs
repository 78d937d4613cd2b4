//! BarFeed — the validated, forward-only bar sequence the engine consumes.
//!
//! Validation happens once, at construction, so a malformed input fails the
//! run before the first bar is processed. After that the feed is a plain
//! iterator: each bar is yielded exactly once and the feed cannot be rewound.

use crate::domain::{Bar, RawBar};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors from validating the input bar sequence.
#[derive(Debug, Error, PartialEq)]
pub enum MalformedInputError {
    #[error("bar feed is empty")]
    Empty,

    #[error("bar {index} ({date}): missing required field '{field}'")]
    MissingField {
        index: usize,
        date: NaiveDate,
        field: &'static str,
    },

    #[error("row {row}: field '{field}' is not numeric: '{value}'")]
    NonNumeric {
        row: usize,
        field: String,
        value: String,
    },

    #[error("row {row}: unparseable date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("bar {index} ({date}): field '{field}' is not finite")]
    NonFinite {
        index: usize,
        date: NaiveDate,
        field: &'static str,
    },

    #[error("bar {index} ({date}): {field} price {value} is not positive")]
    NonPositivePrice {
        index: usize,
        date: NaiveDate,
        field: &'static str,
        value: f64,
    },

    #[error("bar {index} ({date}): high/low do not bracket open and close")]
    InconsistentRange { index: usize, date: NaiveDate },

    #[error("bar {index}: date {date} does not follow {previous}")]
    NonIncreasingDate {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("bar {index} ({date}): negative volume {volume}")]
    NegativeVolume {
        index: usize,
        date: NaiveDate,
        volume: f64,
    },

    #[error("bar {index} ({date}): sentiment {value} outside [-1, 1]")]
    SentimentOutOfRange {
        index: usize,
        date: NaiveDate,
        value: f64,
    },
}

/// Finite, ordered, non-restartable sequence of validated bars.
#[derive(Debug)]
pub struct BarFeed {
    bars: std::vec::IntoIter<Bar>,
    len: usize,
}

impl BarFeed {
    /// Validate raw upstream records and build a feed.
    ///
    /// Missing sentiment defaults to 0.0; missing volume defaults to 0.
    /// Missing, non-finite or non-positive prices, a high/low range that does
    /// not contain open and close, negative volume, out-of-range sentiment and
    /// non-increasing dates are rejected.
    pub fn from_raw(raw: Vec<RawBar>) -> Result<Self, MalformedInputError> {
        let bars = raw
            .into_iter()
            .enumerate()
            .map(|(index, raw)| validate_raw(index, raw))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_bars(bars)
    }

    /// Build a feed from already-typed bars, still enforcing the sequence invariants.
    pub fn from_bars(bars: Vec<Bar>) -> Result<Self, MalformedInputError> {
        if bars.is_empty() {
            return Err(MalformedInputError::Empty);
        }
        for (index, bar) in bars.iter().enumerate() {
            check_values(index, bar)?;
            if index > 0 {
                let previous = bars[index - 1].date;
                if bar.date <= previous {
                    return Err(MalformedInputError::NonIncreasingDate {
                        index,
                        previous,
                        date: bar.date,
                    });
                }
            }
        }
        let len = bars.len();
        Ok(Self {
            bars: bars.into_iter(),
            len,
        })
    }

    /// Total number of bars the feed was built with.
    pub fn total_len(&self) -> usize {
        self.len
    }

    /// Bars not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bars.len()
    }
}

impl Iterator for BarFeed {
    type Item = Bar;

    fn next(&mut self) -> Option<Bar> {
        self.bars.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bars.size_hint()
    }
}

impl ExactSizeIterator for BarFeed {}

fn validate_raw(index: usize, raw: RawBar) -> Result<Bar, MalformedInputError> {
    let date = raw.date;
    let require = |value: Option<f64>, field: &'static str| {
        value.ok_or(MalformedInputError::MissingField { index, date, field })
    };

    Ok(Bar {
        date,
        open: require(raw.open, "open")?,
        high: require(raw.high, "high")?,
        low: require(raw.low, "low")?,
        close: require(raw.close, "close")?,
        volume: raw.volume.unwrap_or(0.0),
        sentiment: raw.sentiment.unwrap_or(0.0),
    })
}

fn check_values(index: usize, bar: &Bar) -> Result<(), MalformedInputError> {
    let date = bar.date;
    for (field, value) in [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
        ("volume", bar.volume),
        ("sentiment", bar.sentiment),
    ] {
        if !value.is_finite() {
            return Err(MalformedInputError::NonFinite { index, date, field });
        }
    }
    for (field, value) in [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
    ] {
        if value <= 0.0 {
            return Err(MalformedInputError::NonPositivePrice {
                index,
                date,
                field,
                value,
            });
        }
    }
    if !bar.is_sane() {
        return Err(MalformedInputError::InconsistentRange { index, date });
    }
    if bar.volume < 0.0 {
        return Err(MalformedInputError::NegativeVolume {
            index,
            date,
            volume: bar.volume,
        });
    }
    if !(-1.0..=1.0).contains(&bar.sentiment) {
        return Err(MalformedInputError::SentimentOutOfRange {
            index,
            date,
            value: bar.sentiment,
        });
    }
    Ok(())
}
