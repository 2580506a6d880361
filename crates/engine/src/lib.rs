//! # Automata Engine
//!
//! The engine owns the live [`TradingState`] and is its single writer. Events
//! arrive over an `mpsc` channel, each one is folded through the configured
//! reducer, and every resulting snapshot is published on a `watch` channel so
//! any number of readers can look at the latest state without blocking.

pub mod error;
pub mod replay;

pub use error::SessionError;
pub use replay::feed_events;

use events::TradingEvent;
use reducer::{StateReducer, TradingState};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace};

/// Counts of what a [`TradingSession::run`] loop did before its channel closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub applied: usize,
    pub rejected: usize,
}

/// The single writer of the trading snapshot.
pub struct TradingSession {
    reducer: Arc<dyn StateReducer>,
    state_tx: watch::Sender<Arc<TradingState>>,
}

impl TradingSession {
    pub fn new(reducer: Arc<dyn StateReducer>, initial: TradingState) -> Self {
        let (state_tx, _) = watch::channel(Arc::new(initial));
        Self { reducer, state_tx }
    }

    /// Returns a receiver that always sees the most recently published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<TradingState>> {
        self.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> Arc<TradingState> {
        self.state_tx.borrow().clone()
    }

    /// Applies one event and publishes the result.
    ///
    /// On a reducer error nothing is published and the previous snapshot stays
    /// current.
    pub fn apply(&mut self, event: &TradingEvent) -> Result<Arc<TradingState>, SessionError> {
        let current = self.snapshot();
        let next = Arc::new(self.reducer.apply(&current, event)?);
        // `send_replace` publishes even when nobody is subscribed yet.
        self.state_tx.send_replace(Arc::clone(&next));
        Ok(next)
    }

    /// The main event loop. Consumes events in arrival order until every sender
    /// is dropped.
    pub async fn run(&mut self, mut rx: mpsc::Receiver<TradingEvent>) -> SessionReport {
        let mut report = SessionReport::default();
        info!("Trading session started. Waiting for events...");

        while let Some(event) = rx.recv().await {
            match self.apply(&event) {
                Ok(_) => {
                    report.applied += 1;
                    if event.is_market_data() {
                        trace!(event = event.kind(), "Market data applied");
                    } else {
                        debug!(event = event.kind(), order = ?event.order_id(), "Event applied");
                    }
                }
                Err(e) => {
                    report.rejected += 1;
                    error!(event = event.kind(), order = ?event.order_id(), error = %e, "Failed to apply event");
                }
            }
        }

        info!(
            applied = report.applied,
            rejected = report.rejected,
            "Event channel closed. Trading session stopped."
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use configuration::{ReducerSettings, UnderflowPolicy};
    use core_types::{Currency, InstrumentInfo, Order, OrderSide, OrderStatus, Position};
    use reducer::{Reducer, build_reducer};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn funded() -> TradingState {
        TradingState::with_holdings(
            Currency::RUB,
            HashMap::from([(Currency::RUB, Position::new(dec!(1000), None))]),
            HashMap::new(),
        )
    }

    fn info() -> TradingEvent {
        TradingEvent::NewInstrumentInfo(InstrumentInfo {
            can_trade: true,
            min_price_increment: dec!(0.01),
            lot: 10,
            accrued_interest: None,
            limit_up: None,
            limit_down: None,
            figi: "ABC".to_string(),
        })
    }

    fn placed(id: &str, lots: u32) -> TradingEvent {
        TradingEvent::PlacedOrder(Order {
            id: id.to_string(),
            side: OrderSide::Buy,
            status: OrderStatus::New,
            reject_reason: None,
            requested_lots: lots,
            executed_lots: 0,
            commission: None,
            price: dec!(5.00),
            figi: "ABC".to_string(),
        })
    }

    #[tokio::test]
    async fn run_publishes_snapshots_in_order() {
        let mut session = TradingSession::new(Arc::new(Reducer::default()), funded());
        let mut rx_state = session.subscribe();
        let (tx, rx) = mpsc::channel(8);

        tx.send(info()).await.unwrap();
        tx.send(placed("o1", 2)).await.unwrap();
        drop(tx);

        let report = session.run(rx).await;
        assert_eq!(report, SessionReport { applied: 2, rejected: 0 });

        assert!(rx_state.has_changed().unwrap());
        let latest = rx_state.borrow_and_update().clone();
        assert_eq!(
            latest.currency_position(Currency::RUB),
            Position::new(dec!(900), Some(dec!(100)))
        );
        assert_eq!(*latest, *session.snapshot());
    }

    #[tokio::test]
    async fn rejected_events_leave_the_snapshot_alone() {
        let mut session = TradingSession::new(Arc::new(Reducer::default()), funded());
        let before = session.snapshot();
        let (tx, rx) = mpsc::channel(8);

        // No instrument info yet, so the placement cannot be priced.
        tx.send(placed("o1", 2)).await.unwrap();
        tx.send(info()).await.unwrap();
        drop(tx);

        let report = session.run(rx).await;
        assert_eq!(report, SessionReport { applied: 1, rejected: 1 });
        assert!(session.snapshot().orders().is_empty());
        assert_eq!(
            session.snapshot().currency_positions(),
            before.currency_positions()
        );
    }

    #[test]
    fn apply_returns_reducer_errors() {
        let reducer = build_reducer(ReducerSettings {
            underflow: UnderflowPolicy::Reject,
            ..ReducerSettings::default()
        });
        let mut session = TradingSession::new(reducer, funded());
        session.apply(&info()).unwrap();

        let result = session.apply(&placed("o1", 30));
        assert!(matches!(result, Err(SessionError::State(_))));
        assert!(session.snapshot().orders().is_empty());
    }

    #[test]
    fn old_snapshots_survive_later_events() {
        let mut session = TradingSession::new(Arc::new(Reducer::default()), funded());
        let held = session.snapshot();
        session.apply(&info()).unwrap();
        session.apply(&placed("o1", 1)).unwrap();

        assert!(held.instrument_info().is_none());
        assert_eq!(held.currency_position(Currency::RUB), Position::new(dec!(1000), None));
        assert_eq!(session.snapshot().orders().len(), 1);
    }

    #[tokio::test]
    async fn overflowing_order_is_counted_as_rejected() {
        let mut session = TradingSession::new(Arc::new(Reducer::default()), funded());
        let (tx, rx) = mpsc::channel(8);

        let TradingEvent::PlacedOrder(mut huge) = placed("huge", 1_000_000_000) else {
            unreachable!()
        };
        huge.price = dec!(100000000000000000000);
        tx.send(info()).await.unwrap();
        tx.send(TradingEvent::PlacedOrder(huge)).await.unwrap();
        tx.send(placed("o1", 1)).await.unwrap();
        drop(tx);

        let report = session.run(rx).await;
        assert_eq!(report, SessionReport { applied: 2, rejected: 1 });
        assert_eq!(session.snapshot().orders().len(), 1);
        assert_eq!(session.snapshot().orders()[0].id, "o1");
    }
}
