//! Commission model — the only execution friction the broker charges.
//!
//! Commission is charged on every fill, buy and sell alike, and is deducted
//! from cash at fill time.

use serde::{Deserialize, Serialize};

/// Per-fill fee schedule.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionModel {
    /// No commission.
    #[default]
    None,

    /// Proportional: `rate × price × size` (0.001 = 0.1% of traded value).
    Percentage { rate: f64 },

    /// Flat fee per fill, independent of size.
    PerTrade { amount: f64 },
}

impl CommissionModel {
    pub fn percentage(rate: f64) -> Self {
        CommissionModel::Percentage { rate }
    }

    pub fn per_trade(amount: f64) -> Self {
        CommissionModel::PerTrade { amount }
    }

    /// Commission for a fill of `size` units at `price`.
    pub fn compute(&self, price: f64, size: u64) -> f64 {
        match *self {
            CommissionModel::None => 0.0,
            CommissionModel::Percentage { rate } => rate * price * size as f64,
            CommissionModel::PerTrade { amount } => amount,
        }
    }

    /// The configured rate or amount; 0.0 for `None`.
    pub fn parameter(&self) -> f64 {
        match *self {
            CommissionModel::None => 0.0,
            CommissionModel::Percentage { rate } => rate,
            CommissionModel::PerTrade { amount } => amount,
        }
    }

    /// Whether the parameter is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        let p = self.parameter();
        p.is_finite() && p >= 0.0
    }
}
