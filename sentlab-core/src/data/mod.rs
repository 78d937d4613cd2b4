//! Input side of the engine: validation of the upstream bar sequence.

pub mod feed;

pub use feed::{BarFeed, MalformedInputError};
