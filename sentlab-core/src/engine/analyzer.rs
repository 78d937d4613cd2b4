//! Equity analyzer — one mark-to-market sample per processed bar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Portfolio value at a bar's close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquitySample {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Equity sample plus the simple return from the previous sample.
///
/// `ret` is `None` on the first row and whenever the previous equity is not
/// positive, so the series never carries NaN or infinities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnSample {
    pub date: NaiveDate,
    pub equity: f64,
    pub ret: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    samples: Vec<EquitySample>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bars: usize) -> Self {
        Self {
            samples: Vec::with_capacity(bars),
        }
    }

    /// Append the equity observed at `date`'s close.
    pub fn sample(&mut self, date: NaiveDate, equity: f64) {
        debug_assert!(
            self.samples.last().map_or(true, |last| last.date < date),
            "equity samples must be strictly increasing in date"
        );
        self.samples.push(EquitySample { date, equity });
    }

    /// Overwrite the most recent sample's equity (end-of-run liquidation).
    pub fn restate_last(&mut self, equity: f64) {
        if let Some(last) = self.samples.last_mut() {
            last.equity = equity;
        }
    }

    pub fn samples(&self) -> &[EquitySample] {
        &self.samples
    }

    pub fn returns(&self) -> Vec<ReturnSample> {
        let mut prev: Option<f64> = None;
        self.samples
            .iter()
            .map(|s| {
                let ret = prev.filter(|p| *p > 0.0).map(|p| s.equity / p - 1.0);
                prev = Some(s.equity);
                ReturnSample {
                    date: s.date,
                    equity: s.equity,
                    ret,
                }
            })
            .collect()
    }
}
