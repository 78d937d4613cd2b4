//! SentLab Core — domain types, bar feed, broker, strategy, event loop.
//!
//! This crate contains the backtesting engine and nothing that touches the
//! filesystem:
//! - Domain types (bars, orders, fills, positions, trades, broker events)
//! - Validated, single-pass bar feed
//! - Simulated broker with the order lifecycle state machine
//! - Sentiment-gated decision rule behind a one-method trait
//! - Bar-by-bar event loop, equity analyzer and event replay

pub mod data;
pub mod domain;
pub mod engine;
pub mod strategy;
