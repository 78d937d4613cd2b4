//! Sentiment-gated entry with a fixed holding period.

use serde::{Deserialize, Serialize};

use super::{DecisionContext, Strategy};
use crate::domain::OrderIntent;

/// Tunables for [`SentimentStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentParams {
    /// Buy when the bar's sentiment is strictly above this.
    pub buy_threshold: f64,
    /// Sell once this many bars have elapsed since the entry fill.
    pub exit_bars: usize,
    /// Fixed order size for both legs.
    pub trade_size: u64,
}

impl Default for SentimentParams {
    fn default() -> Self {
        Self {
            buy_threshold: 0.6,
            exit_bars: 3,
            trade_size: 1000,
        }
    }
}

/// Buys when sentiment clears the threshold, sells after `exit_bars`.
#[derive(Debug, Clone, Default)]
pub struct SentimentStrategy {
    params: SentimentParams,
}

impl SentimentStrategy {
    pub fn new(params: SentimentParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SentimentParams {
        &self.params
    }
}

impl Strategy for SentimentStrategy {
    fn name(&self) -> &str {
        "sentiment"
    }

    fn decide(&self, ctx: &DecisionContext<'_>) -> Option<OrderIntent> {
        if ctx.has_pending_order {
            return None;
        }

        if ctx.account.is_flat() {
            return (ctx.bar.sentiment > self.params.buy_threshold)
                .then(|| OrderIntent::buy(self.params.trade_size));
        }

        match ctx.bars_since_entry {
            Some(held) if held >= self.params.exit_bars => {
                Some(OrderIntent::sell(self.params.trade_size))
            }
            _ => None,
        }
    }
}
