//! Backtesting engine — broker, event loop and supporting infrastructure.
//!
//! The engine consumes a validated `BarFeed` and a `Strategy`, runs the
//! bar loop, and returns a `RunOutcome` holding the equity curve and the
//! full broker event log.

pub mod analyzer;
pub mod bookkeeping;
pub mod broker;
pub mod commission;
pub mod loop_runner;
pub mod replay;

pub use analyzer::{Analyzer, EquitySample, ReturnSample};
pub use bookkeeping::StrategyBookkeeping;
pub use broker::{Broker, BrokerError};
pub use commission::CommissionModel;
pub use loop_runner::{EndOfRunPolicy, Engine, EngineError, RunOutcome};
pub use replay::replay;
