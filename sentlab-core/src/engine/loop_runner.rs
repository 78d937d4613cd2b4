//! Bar-by-bar event loop — the heart of the backtesting engine.
//!
//! Per bar, in this order:
//! 1. Resolve the order left pending by the previous bar at this bar's open
//! 2. Feed the resulting events to the strategy bookkeeping
//! 3. Ask the strategy for a decision on this bar
//! 4. Submit the intent, if any, stamped with this bar's index
//! 5. Sample equity at this bar's close
//!
//! Resolution always precedes the decision, so a strategy never sees an
//! order it placed on the same bar filled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data::BarFeed;
use crate::domain::{Bar, BrokerEvent, Order, OrderAuditEntry, Position, Trade};
use crate::strategy::{DecisionContext, Strategy};

use super::analyzer::{Analyzer, EquitySample, ReturnSample};
use super::bookkeeping::StrategyBookkeeping;
use super::broker::{Broker, BrokerError};
use super::commission::CommissionModel;

/// What to do with an open position when the feed runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndOfRunPolicy {
    /// Leave it open, marked to the last close.
    #[default]
    Hold,
    /// Cancel any pending order and sell at the last close.
    Liquidate,
}

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub strategy_name: String,
    pub equity_curve: Vec<EquitySample>,
    pub returns: Vec<ReturnSample>,
    pub events: Vec<BrokerEvent>,
    pub trades: Vec<Trade>,
    pub audit_trail: Vec<OrderAuditEntry>,
    pub initial_cash: f64,
    pub final_cash: f64,
    pub final_position: Position,
    pub final_equity: f64,
    pub last_close: Option<f64>,
    pub bar_count: usize,
    /// Order submitted on the final bar (or otherwise never resolved).
    pub pending_order_at_end: Option<Order>,
    pub open_position_at_end: bool,
}

impl RunOutcome {
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.equity_curve.first().map(|s| s.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.equity_curve.last().map(|s| s.date)
    }

    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|s| s.equity).collect()
    }
}

/// One backtest run. Owns the feed and the broker; borrows the strategy.
pub struct Engine<'s> {
    feed: BarFeed,
    broker: Broker,
    strategy: &'s dyn Strategy,
    analyzer: Analyzer,
    bookkeeping: StrategyBookkeeping,
    policy: EndOfRunPolicy,
    events: Vec<BrokerEvent>,
    next_index: usize,
    last_bar: Option<Bar>,
    initial_cash: f64,
}

impl<'s> Engine<'s> {
    pub fn new(
        feed: BarFeed,
        initial_cash: f64,
        commission: CommissionModel,
        strategy: &'s dyn Strategy,
    ) -> Self {
        let analyzer = Analyzer::with_capacity(feed.total_len());
        Self {
            feed,
            broker: Broker::new(initial_cash, commission),
            strategy,
            analyzer,
            bookkeeping: StrategyBookkeeping::new(),
            policy: EndOfRunPolicy::default(),
            events: Vec::new(),
            next_index: 0,
            last_bar: None,
            initial_cash,
        }
    }

    pub fn with_end_of_run(mut self, policy: EndOfRunPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn events(&self) -> &[BrokerEvent] {
        &self.events
    }

    pub fn bars_processed(&self) -> usize {
        self.next_index
    }

    /// Process the next bar. Returns its index, or `None` once the feed is
    /// exhausted.
    pub fn step(&mut self) -> Result<Option<usize>, EngineError> {
        let Some(bar) = self.feed.next() else {
            return Ok(None);
        };
        let i = self.next_index;

        let resolved = self.broker.resolve_pending(i, &bar)?;
        self.record(resolved);

        debug!(bar = i, date = %bar.date, "Close, {:.2}", bar.close);

        let ctx = DecisionContext {
            bar: &bar,
            bar_index: i,
            account: self.broker.account().snapshot(),
            bars_since_entry: self.bookkeeping.bars_since_entry(i),
            has_pending_order: self.bookkeeping.has_pending_order(),
        };
        if let Some(intent) = self.strategy.decide(&ctx) {
            match self.broker.submit(intent, i) {
                Ok(submitted) => {
                    info!(bar = i, date = %bar.date, size = intent.size, "{} CREATE, {:.2}", intent.side, bar.close);
                    self.record(vec![submitted]);
                }
                // A strategy that ignores the pending flag or asks for zero
                // shares loses that intent; the run goes on.
                Err(err @ (BrokerError::OrderPending(_) | BrokerError::ZeroSize)) => {
                    warn!(bar = i, side = %intent.side, size = intent.size, "intent dropped: {err}");
                }
                Err(err) => return Err(err.into()),
            }
        }

        self.analyzer
            .sample(bar.date, self.broker.account().equity(bar.close));
        self.last_bar = Some(bar);
        self.next_index += 1;
        Ok(Some(i))
    }

    /// Process every remaining bar, then finish.
    pub fn run(mut self) -> Result<RunOutcome, EngineError> {
        while self.step()?.is_some() {}
        self.finish()
    }

    /// Apply the end-of-run policy and collect the outcome. May be called
    /// early to abort between bars.
    pub fn finish(mut self) -> Result<RunOutcome, EngineError> {
        if let (EndOfRunPolicy::Liquidate, Some(bar)) = (self.policy, self.last_bar.clone()) {
            let last_index = self.next_index - 1;
            let events = self.broker.close_position_at(last_index, &bar)?;
            self.record(events);
            self.analyzer
                .restate_last(self.broker.account().equity(bar.close));
        }

        let pending_order_at_end = self.broker.pending_order().cloned();
        if let Some(order) = &pending_order_at_end {
            warn!(
                order = %order.id,
                side = %order.side,
                size = order.size,
                submitted_at_bar = order.submitted_at_bar,
                "order still pending at end of run; no later bar to fill it"
            );
        }

        let final_position = *self.broker.account().position();
        let open_position_at_end = !final_position.is_flat();
        let last_close = self.last_bar.as_ref().map(|b| b.close);
        if open_position_at_end {
            warn!(
                size = final_position.size,
                average_entry_price = final_position.average_entry_price,
                unrealized_pnl = final_position.unrealized_pnl(last_close.unwrap_or(0.0)),
                "position left open at end of run; marked to last close"
            );
        }

        let final_cash = self.broker.account().cash();
        let final_equity = self.broker.account().equity(last_close.unwrap_or(0.0));

        let trades = self
            .events
            .iter()
            .filter_map(|e| match e {
                BrokerEvent::TradeClosed { trade } => Some(trade.clone()),
                _ => None,
            })
            .collect();

        Ok(RunOutcome {
            strategy_name: self.strategy.name().to_string(),
            equity_curve: self.analyzer.samples().to_vec(),
            returns: self.analyzer.returns(),
            trades,
            audit_trail: self.broker.audit_trail().to_vec(),
            initial_cash: self.initial_cash,
            final_cash,
            final_position,
            final_equity,
            last_close,
            bar_count: self.next_index,
            pending_order_at_end,
            open_position_at_end,
            events: self.events,
        })
    }

    fn record(&mut self, events: Vec<BrokerEvent>) {
        for event in events {
            self.bookkeeping.observe(&event);
            log_event(&event);
            self.events.push(event);
        }
    }
}

fn log_event(event: &BrokerEvent) {
    match event {
        BrokerEvent::OrderSubmitted { order } => {
            debug!(order = %order.id, side = %order.side, size = order.size, "order submitted");
        }
        BrokerEvent::OrderFilled {
            order,
            date,
            price,
            commission,
        } => {
            info!(
                order = %order.id,
                %date,
                "{} EXECUTED, Price: {:.2}, Cost: {:.2}, Comm {:.2}",
                order.side,
                price,
                price * order.size as f64,
                commission
            );
        }
        BrokerEvent::OrderRejected { order, reason } => {
            warn!(order = %order.id, side = %order.side, size = order.size, "Order Rejected: {reason}");
        }
        BrokerEvent::OrderCanceled { order } => {
            warn!(order = %order.id, side = %order.side, "Order Canceled");
        }
        BrokerEvent::TradeClosed { trade } => {
            info!(
                exit_date = %trade.exit_date,
                "OPERATION PROFIT, GROSS {:.2}, NET {:.2}",
                trade.gross_pnl,
                trade.net_pnl
            );
        }
    }
}
