//! Account — cash plus the single open position.

use super::fill::Fill;
use super::order::OrderSide;
use super::position::Position;
use serde::{Deserialize, Serialize};

/// Cash and position for one run.
///
/// Only the broker (and event replay) may apply fills; everything else sees
/// the account through `&Account` or an `AccountSnapshot`. The identity
/// `equity == cash + position.size × mark` holds by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    cash: f64,
    position: Position,
}

impl Account {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            position: Position::default(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Cash plus the position marked at `mark_price`.
    pub fn equity(&self, mark_price: f64) -> f64 {
        self.cash + self.position.market_value(mark_price)
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            cash: self.cash,
            position_size: self.position.size,
            average_entry_price: self.position.average_entry_price,
        }
    }

    /// Apply a fill to cash and position.
    ///
    /// Callers validate affordability and position size beforehand; a sell
    /// larger than the position is clamped to the held size.
    pub(crate) fn apply_fill(&mut self, fill: &Fill) {
        self.cash += fill.cash_delta();

        match fill.side {
            OrderSide::Buy => {
                let held = self.position.size as f64;
                let added = fill.size as f64;
                let total_cost = self.position.average_entry_price * held + fill.price * added;
                self.position.size += fill.size;
                self.position.average_entry_price = total_cost / self.position.size as f64;
            }
            OrderSide::Sell => {
                self.position.size = self.position.size.saturating_sub(fill.size);
                if self.position.size == 0 {
                    self.position.average_entry_price = 0.0;
                }
            }
        }
    }
}

/// Read-only copy of the account handed to strategies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub cash: f64,
    pub position_size: u64,
    pub average_entry_price: f64,
}

impl AccountSnapshot {
    pub fn is_flat(&self) -> bool {
        self.position_size == 0
    }
}
