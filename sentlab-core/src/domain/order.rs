//! Order types and the order lifecycle state machine.

use super::ids::OrderId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// When the order is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Decided at bar T, filled at bar T+1's open. Every strategy order is MOO.
    MarketOnOpen,
    /// Filled at the current bar's close. Only used for end-of-run liquidation.
    MarketOnClose,
}

/// Order lifecycle states.
///
/// ```text
/// Submitted ──► Accepted ──► Completed
///     │             │
///     └─► Rejected  └─► Canceled
/// ```
///
/// `Completed`, `Rejected` and `Canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Submitted,
    Accepted,
    Completed,
    Rejected,
    Canceled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Rejected | OrderStatus::Canceled
        )
    }

    /// Whether `self → next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Submitted, Accepted) | (Submitted, Rejected) | (Accepted, Completed) | (Accepted, Canceled)
        )
    }
}

/// A single order owned by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: OrderSide,
    pub kind: OrderKind,
    pub size: u64,
    pub status: OrderStatus,
    pub submitted_at_bar: usize,
    /// Bar index at which the order reached a terminal status.
    pub resolved_at_bar: Option<usize>,
}

impl Order {
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn is_buy(&self) -> bool {
        self.side == OrderSide::Buy
    }
}

/// What a strategy asks the broker to do. Always a market-on-open order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub side: OrderSide,
    pub size: u64,
}

impl OrderIntent {
    pub fn buy(size: u64) -> Self {
        Self {
            side: OrderSide::Buy,
            size,
        }
    }

    pub fn sell(size: u64) -> Self {
        Self {
            side: OrderSide::Sell,
            size,
        }
    }
}

/// Audit trail entry for an order state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAuditEntry {
    pub order_id: OrderId,
    pub bar_index: usize,
    pub from_status: OrderStatus,
    pub to_status: OrderStatus,
}
