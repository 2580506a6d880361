//! # Automata Core Types
//!
//! The foundational value objects shared by every other crate in the workspace:
//! orders, positions, instrument trading rules and market-data snapshots.
//!
//! All types here are plain immutable values. "Changing" one always means building
//! a new value, either through a `with_*` helper or by constructing a fresh record.

pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{CandleInterval, Currency, OrderSide, OrderStatus};
pub use error::CoreError;
pub use structs::{
    Candle, InstrumentInfo, MoneyAmount, Order, OrderDraft, Orderbook, Position, StakeState,
};
