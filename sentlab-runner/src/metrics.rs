//! Performance summary — pure functions over the equity curve and trade list.

use serde::{Deserialize, Serialize};
use sentlab_core::domain::{BrokerEvent, Trade};

/// Headline numbers for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub starting_value: f64,
    pub final_value: f64,
    /// (final - starting) / starting.
    pub total_return: f64,
    /// Most negative peak-to-trough move, as a fraction (≤ 0).
    pub max_drawdown: f64,
    pub sharpe: f64,
    pub trade_count: usize,
    pub win_rate: f64,
    /// Fees paid on every fill, including legs of a position still open.
    pub total_commission: f64,
}

impl PerformanceSummary {
    /// `equity_curve` is the per-bar equity; `starting_value` is the cash the
    /// run began with (the curve's first point is already marked to a close).
    pub fn compute(
        starting_value: f64,
        equity_curve: &[f64],
        trades: &[Trade],
        events: &[BrokerEvent],
    ) -> Self {
        let final_value = equity_curve.last().copied().unwrap_or(starting_value);
        let mut curve = Vec::with_capacity(equity_curve.len() + 1);
        curve.push(starting_value);
        curve.extend_from_slice(equity_curve);

        Self {
            starting_value,
            final_value,
            total_return: total_return(&curve),
            max_drawdown: max_drawdown(&curve),
            sharpe: sharpe_ratio(equity_curve),
            trade_count: trades.len(),
            win_rate: win_rate(trades),
            total_commission: total_commission(events),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    let (Some(&initial), Some(&final_eq)) = (equity_curve.first(), equity_curve.last()) else {
        return 0.0;
    };
    if equity_curve.len() < 2 || initial <= 0.0 {
        return 0.0;
    }
    (final_eq - initial) / initial
}

/// Maximum drawdown as a negative fraction (0.0 when equity never falls).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Annualized Sharpe ratio of bar-over-bar returns, zero risk-free rate,
/// 252 bars per year. Returns 0.0 with fewer than two returns or flat equity.
pub fn sharpe_ratio(equity_curve: &[f64]) -> f64 {
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = var.sqrt();
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * 252.0_f64.sqrt()
}

/// Sum of the commission charged on every `OrderFilled` event.
pub fn total_commission(events: &[BrokerEvent]) -> f64 {
    events.iter().fold(0.0, |acc, event| match event {
        BrokerEvent::OrderFilled { commission, .. } => acc + commission,
        _ => acc,
    })
}

/// Win rate: fraction of trades with positive net PnL.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sentlab_core::domain::{Order, OrderId, OrderKind, OrderSide, OrderStatus};

    fn filled(id: u64, side: OrderSide, commission: f64) -> BrokerEvent {
        BrokerEvent::OrderFilled {
            order: Order {
                id: OrderId(id),
                side,
                kind: OrderKind::MarketOnOpen,
                size: 10,
                status: OrderStatus::Completed,
                submitted_at_bar: 0,
                resolved_at_bar: Some(1),
            },
            date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            price: 100.0,
            commission,
        }
    }

    fn trade(net_pnl: f64, commission: f64) -> Trade {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        Trade {
            opened_at_bar: 0,
            entry_date: date,
            entry_price: 100.0,
            closed_at_bar: 3,
            exit_date: date,
            exit_price: 100.0,
            size: 10,
            gross_pnl: net_pnl + commission,
            commission,
            net_pnl,
        }
    }

    // ── Total return ──

    #[test]
    fn total_return_positive() {
        let eq = vec![100_000.0, 100_500.0, 101_000.0, 110_000.0];
        assert!((total_return(&eq) - 0.1).abs() < 1e-10);
    }

    #[test]
    fn total_return_negative() {
        let eq = vec![100_000.0, 95_000.0, 90_000.0];
        assert!((total_return(&eq) - (-0.1)).abs() < 1e-10);
    }

    #[test]
    fn total_return_degenerate() {
        assert_eq!(total_return(&[100_000.0]), 0.0);
        assert_eq!(total_return(&[]), 0.0);
    }

    // ── Max drawdown ──

    #[test]
    fn max_drawdown_peak_to_trough() {
        let eq = vec![100.0, 120.0, 90.0, 130.0, 117.0];
        assert!((max_drawdown(&eq) - (-0.25)).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_monotonic_rise() {
        assert_eq!(max_drawdown(&[100.0, 101.0, 102.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    // ── Sharpe ──

    #[test]
    fn sharpe_flat_equity_is_zero() {
        assert_eq!(sharpe_ratio(&[100.0; 10]), 0.0);
    }

    #[test]
    fn sharpe_sign_follows_drift() {
        let up: Vec<f64> = (0..50).map(|i| 100.0 + i as f64 + (i % 3) as f64).collect();
        assert!(sharpe_ratio(&up) > 0.0);
    }

    // ── Trades ──

    #[test]
    fn win_rate_counts_net_winners() {
        let trades = vec![trade(10.0, 1.0), trade(-5.0, 1.0), trade(0.0, 1.0), trade(3.0, 1.0)];
        assert_eq!(win_rate(&trades), 0.5);
        assert_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn summary_uses_starting_cash() {
        // First bar already lost money relative to the cash we started with.
        let eq = vec![99_000.0, 101_000.0];
        let events = vec![filled(1, OrderSide::Buy, 1.25), filled(2, OrderSide::Sell, 1.25)];
        let summary =
            PerformanceSummary::compute(100_000.0, &eq, &[trade(1_000.0, 2.5)], &events);
        assert_eq!(summary.starting_value, 100_000.0);
        assert_eq!(summary.final_value, 101_000.0);
        assert!((summary.total_return - 0.01).abs() < 1e-12);
        assert!((summary.max_drawdown - (-0.01)).abs() < 1e-12);
        assert_eq!(summary.trade_count, 1);
        assert_eq!(summary.total_commission, 2.5);
    }

    #[test]
    fn commission_includes_open_position_entry_fee() {
        // Bought and still holding: no closed trade, but the entry fee was paid.
        let events = vec![filled(1, OrderSide::Buy, 5.0)];
        let summary = PerformanceSummary::compute(100_000.0, &[99_995.0], &[], &events);
        assert_eq!(summary.trade_count, 0);
        assert_eq!(summary.total_commission, 5.0);
        assert_eq!(total_commission(&[]), 0.0);
    }
}
