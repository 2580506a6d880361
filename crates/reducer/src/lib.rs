//! # Automata Reducer Crate
//!
//! This crate holds the bookkeeping core: the immutable [`TradingState`]
//! snapshot and the transitions that turn one snapshot plus one event into the
//! next.
//!
//! ## Architectural Principles
//!
//! - **Pure Transitions:** Every `with_*` method takes `&self` and returns a new
//!   snapshot. Nothing performs I/O and nothing mutates its input, so any
//!   number of readers can keep an older snapshot while a single writer moves on.
//! - **Escrow Accounting:** Placing an order reserves cash (Buy) or units (Sell);
//!   execution consumes the reservation and cancellation returns it. All
//!   arithmetic is exact `Decimal` and multiplies lots through by the lot size.
//! - **Observed Behavior by Default:** The halt release and cancel filter follow
//!   what the exchange client has always done. The alternatives live in
//!   separately named `*_corrected` methods, chosen through `ReducerSettings`.
//! - **No Lifecycle Enforcement in the Core:** [`Reducer`] applies events
//!   unconditionally. [`StrictReducer`] layers status-transition checks on top.
//!
//! ## Public API
//!
//! - `TradingState`: The snapshot and its transitions.
//! - `StateReducer`: The trait the session drives.
//! - `Reducer` / `StrictReducer`: The unconditional and the validating reducer.
//! - `StateError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod market;
pub mod orders;
pub mod reducer;
pub mod state;
pub mod strict;

// Re-export the key components to provide a clean, public-facing API.
pub use error::StateError;
pub use market::total_holdings;
pub use reducer::{Reducer, StateReducer};
pub use state::{TradingState, Underflow};
pub use strict::StrictReducer;

use configuration::ReducerSettings;
use std::sync::Arc;

/// Builds the reducer described by `settings`, wrapped in the lifecycle
/// validation layer when `settings.strict` is set.
pub fn build_reducer(settings: ReducerSettings) -> Arc<dyn StateReducer> {
    let reducer = Reducer::new(settings);
    if reducer.settings().strict {
        Arc::new(StrictReducer::new(reducer))
    } else {
        Arc::new(reducer)
    }
}
