//! Simulated broker — order lifecycle, fills, and account bookkeeping.
//!
//! The broker is the only component that mutates the `Account`. It manages:
//! - Order storage and the single pending-order slot
//! - State transitions (Submitted → Accepted → Completed / Rejected / Canceled)
//! - Fill pricing: market-on-open orders fill at the open of the bar after
//!   the one they were submitted on, never the same bar
//! - Affordability and position checks at resolution time
//! - Round-trip tracking so a closing sell produces a `Trade`
//! - Audit trail for every state transition
//!
//! Every operation returns `BrokerEvent`s instead of notifying a callback.

use crate::domain::ids::IdGen;
use crate::domain::{
    Account, Bar, BrokerEvent, Fill, Order, OrderAuditEntry, OrderId, OrderIntent, OrderKind,
    OrderSide, OrderStatus, RejectReason, Trade,
};
use chrono::NaiveDate;
use thiserror::Error;

use super::commission::CommissionModel;

/// Errors from broker operations. These are contract violations by the
/// caller, not market outcomes (those become `OrderRejected` events).
#[derive(Debug, Error, PartialEq)]
pub enum BrokerError {
    #[error("order {0} is still pending; only one open order is allowed")]
    OrderPending(OrderId),

    #[error("order size must be positive")]
    ZeroSize,

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("order {0} is not active (status: {1:?})")]
    OrderNotActive(OrderId, OrderStatus),

    #[error("invalid transition for order {order_id}: {from:?} → {to:?}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },
}

/// Entry fill plus the exit legs accumulated against it.
#[derive(Debug, Clone)]
struct OpenTrade {
    entry: Fill,
    exit_value: f64,
    exit_size: u64,
    exit_commission: f64,
}

#[derive(Debug, Clone)]
pub struct Broker {
    account: Account,
    commission: CommissionModel,
    /// Every order ever submitted, in submission order.
    orders: Vec<Order>,
    /// Index into `orders` of the one non-terminal order, if any.
    pending: Option<usize>,
    open_trade: Option<OpenTrade>,
    audit_trail: Vec<OrderAuditEntry>,
    id_gen: IdGen,
}

impl Broker {
    pub fn new(initial_cash: f64, commission: CommissionModel) -> Self {
        Self {
            account: Account::new(initial_cash),
            commission,
            orders: Vec::new(),
            pending: None,
            open_trade: None,
            audit_trail: Vec::new(),
            id_gen: IdGen::default(),
        }
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// The single non-terminal order, if one exists.
    pub fn pending_order(&self) -> Option<&Order> {
        self.pending.map(|idx| &self.orders[idx])
    }

    pub fn audit_trail(&self) -> &[OrderAuditEntry] {
        &self.audit_trail
    }

    // ── Order entry ────────────────────────────────────────────────────

    /// Accept a strategy intent as a market-on-open order submitted at `bar_index`.
    ///
    /// Cash is not reserved; affordability is checked when the order resolves.
    pub fn submit(
        &mut self,
        intent: OrderIntent,
        bar_index: usize,
    ) -> Result<BrokerEvent, BrokerError> {
        if intent.size == 0 {
            return Err(BrokerError::ZeroSize);
        }
        if let Some(pending) = self.pending_order() {
            return Err(BrokerError::OrderPending(pending.id));
        }
        Ok(self.place(intent.side, OrderKind::MarketOnOpen, intent.size, bar_index))
    }

    /// Cancel a non-terminal order. A `Submitted` order is accepted first so
    /// the audit trail always reads `Accepted → Canceled`.
    pub fn cancel(
        &mut self,
        order_id: OrderId,
        bar_index: usize,
    ) -> Result<BrokerEvent, BrokerError> {
        let idx = self
            .orders
            .iter()
            .position(|o| o.id == order_id)
            .ok_or(BrokerError::OrderNotFound(order_id))?;

        let status = self.orders[idx].status;
        if status.is_terminal() {
            return Err(BrokerError::OrderNotActive(order_id, status));
        }
        if status == OrderStatus::Submitted {
            self.transition(idx, OrderStatus::Accepted, bar_index)?;
        }
        self.transition(idx, OrderStatus::Canceled, bar_index)?;
        if self.pending == Some(idx) {
            self.pending = None;
        }

        Ok(BrokerEvent::OrderCanceled {
            order: self.orders[idx].clone(),
        })
    }

    // ── Resolution ─────────────────────────────────────────────────────

    /// Resolve the pending market-on-open order against `bar`'s open.
    ///
    /// Orders submitted on `bar_index` itself (or later) are left alone, so
    /// a decision can never fill on the bar that produced it.
    pub fn resolve_pending(
        &mut self,
        bar_index: usize,
        bar: &Bar,
    ) -> Result<Vec<BrokerEvent>, BrokerError> {
        let Some(idx) = self.pending else {
            return Ok(Vec::new());
        };
        let order = &self.orders[idx];
        if order.kind != OrderKind::MarketOnOpen || order.submitted_at_bar >= bar_index {
            return Ok(Vec::new());
        }
        self.execute(idx, bar_index, bar.date, bar.open)
    }

    /// Flatten the account at `bar`'s close: cancel any pending order, then
    /// sell the whole position with a market-on-close order.
    pub fn close_position_at(
        &mut self,
        bar_index: usize,
        bar: &Bar,
    ) -> Result<Vec<BrokerEvent>, BrokerError> {
        let mut events = Vec::new();
        if let Some(id) = self.pending_order().map(|o| o.id) {
            events.push(self.cancel(id, bar_index)?);
        }

        let held = self.account.position().size;
        if held == 0 {
            return Ok(events);
        }

        events.push(self.place(OrderSide::Sell, OrderKind::MarketOnClose, held, bar_index));
        let idx = self.orders.len() - 1;
        events.extend(self.execute(idx, bar_index, bar.date, bar.close)?);
        Ok(events)
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn place(&mut self, side: OrderSide, kind: OrderKind, size: u64, bar_index: usize) -> BrokerEvent {
        let order = Order {
            id: self.id_gen.next_order_id(),
            side,
            kind,
            size,
            status: OrderStatus::Submitted,
            submitted_at_bar: bar_index,
            resolved_at_bar: None,
        };
        self.orders.push(order.clone());
        self.pending = Some(self.orders.len() - 1);
        BrokerEvent::OrderSubmitted { order }
    }

    /// Fill or reject order `idx` at `price`.
    fn execute(
        &mut self,
        idx: usize,
        bar_index: usize,
        date: NaiveDate,
        price: f64,
    ) -> Result<Vec<BrokerEvent>, BrokerError> {
        let (side, size) = {
            let order = &self.orders[idx];
            (order.side, order.size)
        };
        let commission = self.commission.compute(price, size);

        if let Some(reason) = self.check_fill(side, size, price, commission) {
            self.transition(idx, OrderStatus::Rejected, bar_index)?;
            self.pending = None;
            return Ok(vec![BrokerEvent::OrderRejected {
                order: self.orders[idx].clone(),
                reason,
            }]);
        }

        self.transition(idx, OrderStatus::Accepted, bar_index)?;
        self.transition(idx, OrderStatus::Completed, bar_index)?;
        self.pending = None;

        let order = self.orders[idx].clone();
        let fill = Fill {
            order_id: order.id,
            bar_index,
            date,
            side,
            size,
            price,
            commission,
        };
        self.account.apply_fill(&fill);

        let mut events = vec![BrokerEvent::OrderFilled {
            order,
            date,
            price,
            commission,
        }];
        if let Some(trade) = self.track_round_trip(fill) {
            events.push(BrokerEvent::TradeClosed { trade });
        }
        Ok(events)
    }

    fn check_fill(
        &self,
        side: OrderSide,
        size: u64,
        price: f64,
        commission: f64,
    ) -> Option<RejectReason> {
        let position = self.account.position();
        match side {
            OrderSide::Buy => {
                if !position.is_flat() {
                    return Some(RejectReason::PositionAlreadyOpen {
                        held: position.size,
                    });
                }
                // The exit leg's fee is reserved up front, estimated at the
                // entry price, so closing the position never overdraws cash.
                let exit_commission = self.commission.compute(price, size);
                let required = price * size as f64 + commission + exit_commission;
                let available = self.account.cash();
                (available < required).then_some(RejectReason::InsufficientCash {
                    required,
                    available,
                })
            }
            OrderSide::Sell => {
                if position.size < size {
                    return Some(RejectReason::InsufficientPosition {
                        requested: size,
                        held: position.size,
                    });
                }
                let proceeds = price * size as f64 - commission;
                let available = self.account.cash();
                (available + proceeds < 0.0).then_some(RejectReason::InsufficientCash {
                    required: -proceeds,
                    available,
                })
            }
        }
    }

    /// Record a fill against the open round trip; returns the trade once the
    /// position is flat again.
    fn track_round_trip(&mut self, fill: Fill) -> Option<Trade> {
        match fill.side {
            OrderSide::Buy => {
                self.open_trade = Some(OpenTrade {
                    entry: fill,
                    exit_value: 0.0,
                    exit_size: 0,
                    exit_commission: 0.0,
                });
                None
            }
            OrderSide::Sell => {
                {
                    let open = self.open_trade.as_mut()?;
                    open.exit_value += fill.gross_amount();
                    open.exit_size += fill.size;
                    open.exit_commission += fill.commission;
                }
                if !self.account.position().is_flat() {
                    return None;
                }
                let open = self.open_trade.take()?;
                let exit_price = open.exit_value / open.exit_size as f64;
                Some(Trade::from_round_trip(
                    &open.entry,
                    &fill,
                    exit_price,
                    open.exit_commission,
                ))
            }
        }
    }

    fn transition(
        &mut self,
        idx: usize,
        to: OrderStatus,
        bar_index: usize,
    ) -> Result<(), BrokerError> {
        let order = &mut self.orders[idx];
        let from = order.status;
        if !from.can_transition_to(to) {
            return Err(BrokerError::InvalidTransition {
                order_id: order.id,
                from,
                to,
            });
        }
        order.status = to;
        if to.is_terminal() {
            order.resolved_at_bar = Some(bar_index);
        }
        let order_id = order.id;

        self.audit_trail.push(OrderAuditEntry {
            order_id,
            bar_index,
            from_status: from,
            to_status: to,
        });
        Ok(())
    }
}
