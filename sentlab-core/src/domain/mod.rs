//! Domain types for SentLab

pub mod account;
pub mod bar;
pub mod event;
pub mod fill;
pub mod ids;
pub mod order;
pub mod position;
pub mod trade;

pub use account::{Account, AccountSnapshot};
pub use bar::{Bar, RawBar};
pub use event::{BrokerEvent, RejectReason};
pub use fill::Fill;
pub use ids::{IdGen, OrderId};
pub use order::{Order, OrderAuditEntry, OrderIntent, OrderKind, OrderSide, OrderStatus};
pub use position::Position;
pub use trade::Trade;
