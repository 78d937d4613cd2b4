//! Per-run strategy bookkeeping derived from broker events.
//!
//! Strategies are stateless; the engine feeds every event through
//! [`StrategyBookkeeping::observe`] and hands the derived values to the
//! strategy in its `DecisionContext`.

use crate::domain::{BrokerEvent, OrderSide};

#[derive(Debug, Clone, Default)]
pub struct StrategyBookkeeping {
    has_pending_order: bool,
    /// Bar index of the fill that opened the current position.
    entry_fill_bar: Option<usize>,
}

impl StrategyBookkeeping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &BrokerEvent) {
        match event {
            BrokerEvent::OrderSubmitted { .. } => self.has_pending_order = true,
            BrokerEvent::OrderFilled { order, .. } => {
                self.has_pending_order = false;
                if order.side == OrderSide::Buy {
                    self.entry_fill_bar = order.resolved_at_bar;
                }
            }
            BrokerEvent::OrderRejected { .. } | BrokerEvent::OrderCanceled { .. } => {
                self.has_pending_order = false;
            }
            BrokerEvent::TradeClosed { .. } => self.entry_fill_bar = None,
        }
    }

    pub fn has_pending_order(&self) -> bool {
        self.has_pending_order
    }

    pub fn entry_fill_bar(&self) -> Option<usize> {
        self.entry_fill_bar
    }

    /// Bars elapsed since the entry fill, or `None` when flat.
    pub fn bars_since_entry(&self, bar_index: usize) -> Option<usize> {
        self.entry_fill_bar
            .map(|entry| bar_index.saturating_sub(entry))
    }
}
