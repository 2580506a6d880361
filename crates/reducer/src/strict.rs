use crate::error::StateError;
use crate::reducer::{Reducer, StateReducer};
use crate::state::TradingState;
use core_types::OrderStatus;
use events::TradingEvent;
use tracing::error;

/// A validation layer that refuses events the order lifecycle does not allow,
/// then delegates to the wrapped reducer.
///
/// The core reducer applies whatever the exchange reports. Wrap it in this type
/// when a strategy would rather stop on an out-of-order stream than keep
/// bookkeeping it cannot trust.
#[derive(Debug, Clone, Default)]
pub struct StrictReducer<R = Reducer> {
    inner: R,
}

impl<R: StateReducer> StrictReducer<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Checks the event against the current status of the order it targets.
    pub fn validate(&self, state: &TradingState, event: &TradingEvent) -> Result<(), StateError> {
        match event {
            TradingEvent::PlacedOrder(order) => {
                if state.find_order(&order.id).is_some() {
                    return Err(StateError::DuplicateOrder(order.id.clone()));
                }
                Ok(())
            }
            TradingEvent::ChangedOrder { id, status, .. } => {
                let current = current_status(state, id)?;
                if !current.can_transition_to(*status) {
                    return Err(StateError::IllegalTransition {
                        id: id.clone(),
                        status: current,
                        action: format!("a change to {}", status),
                    });
                }
                Ok(())
            }
            TradingEvent::ExecutedOrder { id } => {
                let current = current_status(state, id)?;
                // A fill may be reported again; any other final status may not.
                if current.is_terminal() && current != OrderStatus::Fill {
                    return Err(StateError::IllegalTransition {
                        id: id.clone(),
                        status: current,
                        action: "an execution".to_string(),
                    });
                }
                Ok(())
            }
            TradingEvent::CancelledOrder { id } => {
                let current = current_status(state, id)?;
                if current.is_terminal() && current != OrderStatus::Cancelled {
                    return Err(StateError::IllegalTransition {
                        id: id.clone(),
                        status: current,
                        action: "a cancellation".to_string(),
                    });
                }
                Ok(())
            }
            TradingEvent::NewCandle(_)
            | TradingEvent::NewOrderbook(_)
            | TradingEvent::NewInstrumentInfo(_) => Ok(()),
        }
    }
}

fn current_status(state: &TradingState, id: &str) -> Result<OrderStatus, StateError> {
    state
        .find_order(id)
        .map(|order| order.status)
        .ok_or_else(|| StateError::UnknownOrder(id.to_string()))
}

impl<R: StateReducer> StateReducer for StrictReducer<R> {
    fn apply(&self, state: &TradingState, event: &TradingEvent) -> Result<TradingState, StateError> {
        if let Err(e) = self.validate(state, event) {
            error!(event = event.kind(), error = %e, "Event refused by lifecycle validation");
            return Err(e);
        }
        self.inner.apply(state, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Currency, InstrumentInfo, Order, OrderSide, Position};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn state_with_order(status: OrderStatus) -> TradingState {
        let info = InstrumentInfo {
            can_trade: true,
            min_price_increment: dec!(0.01),
            lot: 1,
            accrued_interest: None,
            limit_up: None,
            limit_down: None,
            figi: "ABC".to_string(),
        };
        let order = Order {
            id: "o1".to_string(),
            side: OrderSide::Buy,
            status: OrderStatus::New,
            reject_reason: None,
            requested_lots: 1,
            executed_lots: 0,
            commission: None,
            price: dec!(10),
            figi: "ABC".to_string(),
        };
        TradingState::with_holdings(
            Currency::RUB,
            HashMap::from([(Currency::RUB, Position::new(dec!(100), None))]),
            HashMap::new(),
        )
        .with_new_instrument_info(info)
        .unwrap()
        .with_placed_order(order)
        .unwrap()
        .with_changed_order("o1", status, 0)
    }

    fn changed(status: OrderStatus) -> TradingEvent {
        TradingEvent::ChangedOrder {
            id: "o1".to_string(),
            status,
            executed_lots: 1,
        }
    }

    #[test]
    fn legal_change_is_delegated() {
        let reducer = StrictReducer::<Reducer>::default();
        let state = state_with_order(OrderStatus::New);
        let next = reducer.apply(&state, &changed(OrderStatus::Fill)).unwrap();
        assert_eq!(next.orders()[0].status, OrderStatus::Fill);
    }

    #[test]
    fn change_out_of_terminal_status_is_refused() {
        let reducer = StrictReducer::<Reducer>::default();
        let state = state_with_order(OrderStatus::Cancelled);
        assert_eq!(
            reducer.apply(&state, &changed(OrderStatus::PartiallyFill)),
            Err(StateError::IllegalTransition {
                id: "o1".to_string(),
                status: OrderStatus::Cancelled,
                action: "a change to PartiallyFill".to_string(),
            })
        );
    }

    #[test]
    fn execution_of_cancelled_order_is_refused() {
        let reducer = StrictReducer::<Reducer>::default();
        let state = state_with_order(OrderStatus::Cancelled);
        let result = reducer.apply(&state, &TradingEvent::ExecutedOrder { id: "o1".to_string() });
        assert!(matches!(result, Err(StateError::IllegalTransition { .. })));
    }

    #[test]
    fn cancellation_of_filled_order_is_refused() {
        let reducer = StrictReducer::<Reducer>::default();
        let state = state_with_order(OrderStatus::Fill);
        let result = reducer.apply(&state, &TradingEvent::CancelledOrder { id: "o1".to_string() });
        assert!(matches!(result, Err(StateError::IllegalTransition { .. })));
    }

    #[test]
    fn unknown_and_duplicate_orders_are_refused() {
        let reducer = StrictReducer::<Reducer>::default();
        let state = state_with_order(OrderStatus::New);

        assert_eq!(
            reducer.apply(&state, &TradingEvent::ExecutedOrder { id: "nope".to_string() }),
            Err(StateError::UnknownOrder("nope".to_string()))
        );

        let duplicate = state.orders()[0].clone();
        assert_eq!(
            reducer.apply(&state, &TradingEvent::PlacedOrder(duplicate)),
            Err(StateError::DuplicateOrder("o1".to_string()))
        );
    }

    #[test]
    fn market_data_passes_through() {
        let reducer = StrictReducer::<Reducer>::default();
        let state = state_with_order(OrderStatus::Fill);
        let book = core_types::Orderbook {
            depth: 0,
            bids: vec![],
            asks: vec![],
            figi: "ABC".to_string(),
        };
        let next = reducer.apply(&state, &TradingEvent::NewOrderbook(book)).unwrap();
        assert!(next.orderbook().is_some());
    }

    #[test]
    fn filled_order_may_still_execute_but_rejected_may_not_cancel() {
        let reducer = StrictReducer::<Reducer>::default();
        let executed = TradingEvent::ExecutedOrder { id: "o1".to_string() };
        assert!(reducer.apply(&state_with_order(OrderStatus::Fill), &executed).is_ok());

        let cancelled = TradingEvent::CancelledOrder { id: "o1".to_string() };
        let result = reducer.apply(&state_with_order(OrderStatus::Rejected), &cancelled);
        assert!(matches!(
            result,
            Err(StateError::IllegalTransition { status: OrderStatus::Rejected, .. })
        ));
    }
}
