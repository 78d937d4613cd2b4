//! Trade — a completed round trip: buy fill → sell fill.

use super::fill::Fill;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A closed round-trip trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Entry ──
    pub opened_at_bar: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub closed_at_bar: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    // ── Size ──
    pub size: u64,

    // ── PnL ──
    pub gross_pnl: f64,
    /// Entry plus exit commission.
    pub commission: f64,
    pub net_pnl: f64,
}

impl Trade {
    /// Build a trade from the opening buy fill and the aggregated exit.
    ///
    /// `exit_price` is the size-weighted average of all sell fills that
    /// reduced the position to zero; `exit_commission` is their total fee.
    pub fn from_round_trip(
        entry: &Fill,
        exit: &Fill,
        exit_price: f64,
        exit_commission: f64,
    ) -> Self {
        let size = entry.size;
        let gross_pnl = (exit_price - entry.price) * size as f64;
        let commission = entry.commission + exit_commission;
        Self {
            opened_at_bar: entry.bar_index,
            entry_date: entry.date,
            entry_price: entry.price,
            closed_at_bar: exit.bar_index,
            exit_date: exit.date,
            exit_price,
            size,
            gross_pnl,
            commission,
            net_pnl: gross_pnl - commission,
        }
    }

    /// Net return as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.size == 0 {
            return 0.0;
        }
        self.net_pnl / (self.entry_price * self.size as f64)
    }

    pub fn bars_held(&self) -> usize {
        self.closed_at_bar - self.opened_at_bar
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderId, OrderSide};

    fn leg(side: OrderSide, bar: usize, price: f64, commission: f64) -> Fill {
        Fill {
            order_id: OrderId(bar as u64),
            bar_index: bar,
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap() + chrono::Duration::days(bar as i64),
            side,
            size: 50,
            price,
            commission,
        }
    }

    fn sample_trade() -> Trade {
        let entry = leg(OrderSide::Buy, 4, 100.0, 5.0);
        let exit = leg(OrderSide::Sell, 8, 110.0, 5.0);
        Trade::from_round_trip(&entry, &exit, exit.price, exit.commission)
    }

    #[test]
    fn pnl_accounts_for_both_commissions() {
        let trade = sample_trade();
        assert_eq!(trade.gross_pnl, 500.0);
        assert_eq!(trade.commission, 10.0);
        assert_eq!(trade.net_pnl, 490.0);
    }

    #[test]
    fn return_pct_calculation() {
        let trade = sample_trade();
        let expected = 490.0 / (100.0 * 50.0);
        assert!((trade.return_pct() - expected).abs() < 1e-10);
    }

    #[test]
    fn duration_and_winner() {
        let trade = sample_trade();
        assert_eq!(trade.bars_held(), 4);
        assert!(trade.is_winner());
    }
}
