use crate::error::StateError;
use crate::state::TradingState;
use configuration::{CancelFilter, ReducerSettings, UnderflowPolicy};
use events::TradingEvent;
use tracing::warn;

/// The seam between the event source and the state model.
///
/// Implementations must be pure: the input snapshot is never modified and the
/// same snapshot and event always produce the same result. The `Send + Sync`
/// bounds let a session hold the reducer behind an `Arc` across tasks.
pub trait StateReducer: Send + Sync {
    fn apply(&self, state: &TradingState, event: &TradingEvent) -> Result<TradingState, StateError>;
}

/// The unconditional reducer: every event is applied to whatever order
/// currently matches its id, without checking lifecycle legality.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reducer {
    settings: ReducerSettings,
}

impl Reducer {
    pub fn new(settings: ReducerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ReducerSettings {
        &self.settings
    }

    /// Dispatches the event to its transition without the underflow check.
    pub fn transition(
        &self,
        state: &TradingState,
        event: &TradingEvent,
    ) -> Result<TradingState, StateError> {
        match event {
            TradingEvent::NewCandle(candle) => Ok(state.with_new_candle(candle.clone())),
            TradingEvent::NewOrderbook(orderbook) => Ok(state.with_new_orderbook(orderbook.clone())),
            TradingEvent::NewInstrumentInfo(info) => {
                state.replace_instrument_info(info.clone(), self.settings.release_mode)
            }
            TradingEvent::ExecutedOrder { id } => state.with_executed_order(id),
            TradingEvent::CancelledOrder { id } => match self.settings.cancel_filter {
                CancelFilter::AsObserved => state.with_cancelled_order(id),
                CancelFilter::Corrected => state.with_cancelled_order_corrected(id),
            },
            TradingEvent::ChangedOrder {
                id,
                status,
                executed_lots,
            } => Ok(state.with_changed_order(id, *status, *executed_lots)),
            TradingEvent::PlacedOrder(order) => state.with_placed_order(order.clone()),
        }
    }
}

impl StateReducer for Reducer {
    fn apply(&self, state: &TradingState, event: &TradingEvent) -> Result<TradingState, StateError> {
        let next = self.transition(state, event)?;

        if self.settings.underflow == UnderflowPolicy::Ignore {
            return Ok(next);
        }

        // Negative balances mean the event stream and the exchange disagree.
        // Settlement semantics stay the same; the policy only decides how loudly
        // to say so.
        for underflow in next.underflows_since(state) {
            match self.settings.underflow {
                UnderflowPolicy::Reject => {
                    return Err(StateError::NegativePosition {
                        asset: underflow.asset,
                        event: event.kind(),
                        balance: underflow.position.balance,
                        blocked: underflow.position.blocked,
                    });
                }
                _ => warn!(
                    asset = %underflow.asset,
                    balance = %underflow.position.balance,
                    blocked = %underflow.position.blocked,
                    event = event.kind(),
                    "Position went negative"
                ),
            }
        }

        Ok(next)
    }
}
