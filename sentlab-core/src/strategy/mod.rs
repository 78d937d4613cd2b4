//! Decision rules — a strategy looks at one bar and the account, and emits
//! at most one order intent.
//!
//! Strategies never see the broker or future bars. Everything they may use
//! is in [`DecisionContext`], which the engine rebuilds for every bar.

pub mod sentiment;

pub use sentiment::{SentimentParams, SentimentStrategy};

use crate::domain::{AccountSnapshot, Bar, OrderIntent};

/// Inputs for a single decision at `bar_index`.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub bar: &'a Bar,
    pub bar_index: usize,
    pub account: AccountSnapshot,
    /// Bars elapsed since the opening buy filled; `None` when flat.
    pub bars_since_entry: Option<usize>,
    pub has_pending_order: bool,
}

/// Trait for decision rules.
///
/// # Architecture invariant
/// `decide` must be a pure function of the context. Any state the rule needs
/// across bars (entry bar, pending flag) is tracked by the engine and passed
/// in, so replaying the same bars always yields the same decisions.
pub trait Strategy: Send + Sync {
    /// Human-readable name (e.g., "sentiment").
    fn name(&self) -> &str;

    fn decide(&self, ctx: &DecisionContext<'_>) -> Option<OrderIntent>;
}
