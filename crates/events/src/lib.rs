//! # Automata Events
//!
//! This crate defines the typed events that drive the trading state reducer.
//!
//! As a Layer 0 crate, it depends only on `core-types`. Decoding exchange wire
//! messages into these events is the caller's job; this crate only fixes the
//! vocabulary and a JSON-lines representation used for replays.

// Declare the modules that make up this crate.
pub mod error;
pub mod messages;

// Re-export the core types to provide a clean public API.
pub use error::EventsError;
pub use messages::TradingEvent;
