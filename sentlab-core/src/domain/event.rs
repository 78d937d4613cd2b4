//! Broker events — the run's audit log.
//!
//! The broker returns these values instead of invoking callbacks; the engine
//! consumes them synchronously, feeds them to strategy bookkeeping, and keeps
//! them in order for replay and export.

use super::order::Order;
use super::trade::Trade;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the broker refused to fill an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RejectReason {
    /// Cash cannot cover the fill: a buy's cost plus entry and reserved exit
    /// commission, or a sell whose fee exceeds its proceeds plus cash on hand.
    InsufficientCash { required: f64, available: f64 },
    /// Sell size exceeds the held position.
    InsufficientPosition { requested: u64, held: u64 },
    /// Buy arrived while a position is still open (no pyramiding).
    PositionAlreadyOpen { held: u64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InsufficientCash {
                required,
                available,
            } => write!(f, "insufficient cash: need {required:.2}, have {available:.2}"),
            RejectReason::InsufficientPosition { requested, held } => {
                write!(f, "insufficient position: sell {requested}, hold {held}")
            }
            RejectReason::PositionAlreadyOpen { held } => {
                write!(f, "position already open ({held} held)")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BrokerEvent {
    OrderSubmitted {
        order: Order,
    },
    OrderFilled {
        order: Order,
        date: NaiveDate,
        price: f64,
        commission: f64,
    },
    OrderRejected {
        order: Order,
        reason: RejectReason,
    },
    OrderCanceled {
        order: Order,
    },
    TradeClosed {
        trade: Trade,
    },
}

impl BrokerEvent {
    /// The order this event refers to, if any.
    pub fn order(&self) -> Option<&Order> {
        match self {
            BrokerEvent::OrderSubmitted { order }
            | BrokerEvent::OrderFilled { order, .. }
            | BrokerEvent::OrderRejected { order, .. }
            | BrokerEvent::OrderCanceled { order } => Some(order),
            BrokerEvent::TradeClosed { .. } => None,
        }
    }

    pub fn is_fill(&self) -> bool {
        matches!(self, BrokerEvent::OrderFilled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderId, OrderKind, OrderSide, OrderStatus};

    fn order() -> Order {
        Order {
            id: OrderId(3),
            side: OrderSide::Buy,
            kind: OrderKind::MarketOnOpen,
            size: 1000,
            status: OrderStatus::Rejected,
            submitted_at_bar: 1,
            resolved_at_bar: Some(2),
        }
    }

    #[test]
    fn serializes_with_event_tag() {
        let event = BrokerEvent::OrderRejected {
            order: order(),
            reason: RejectReason::InsufficientCash {
                required: 102_000.0,
                available: 100_000.0,
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "order_rejected");
        assert_eq!(json["reason"]["type"], "insufficient_cash");
        assert_eq!(json["order"]["status"], "rejected");
    }

    #[test]
    fn reject_reason_display() {
        let reason = RejectReason::InsufficientCash {
            required: 102_000.0,
            available: 100_000.0,
        };
        assert_eq!(
            reason.to_string(),
            "insufficient cash: need 102000.00, have 100000.00"
        );
    }

    #[test]
    fn order_accessor() {
        let event = BrokerEvent::OrderSubmitted { order: order() };
        assert_eq!(event.order().map(|o| o.id), Some(OrderId(3)));
        assert!(!event.is_fill());
    }
}
