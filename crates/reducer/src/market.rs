use crate::error::StateError;
use crate::state::TradingState;
use configuration::InstrumentReleaseMode;
use core_types::{Candle, InstrumentInfo, Order, OrderSide, Orderbook, Position};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

impl TradingState {
    /// Replaces the latest candle. Nothing else changes.
    pub fn with_new_candle(&self, candle: Candle) -> TradingState {
        TradingState {
            candle: Some(Arc::new(candle)),
            ..self.clone()
        }
    }

    /// Replaces the order book snapshot. Nothing else changes.
    pub fn with_new_orderbook(&self, orderbook: Orderbook) -> TradingState {
        TradingState {
            orderbook: Some(Arc::new(orderbook)),
            ..self.clone()
        }
    }

    /// Replaces the instrument trading rules.
    ///
    /// When the instrument stops being tradable, every resting order is dropped
    /// and reservations are released back into the existing settlement-currency
    /// and instrument entries, using the new lot size:
    ///
    /// - currency: the sum of `price × executed lots × lot` over Buy orders;
    /// - instrument: the sum of `executed lots × lot`, also over Buy orders.
    ///
    /// These amounts are kept exactly as the exchange client has always computed
    /// them. [`TradingState::with_new_instrument_info_corrected`] releases the
    /// unfilled reservation of each side instead.
    ///
    /// Fails only if the released amounts do not fit a `Decimal`.
    pub fn with_new_instrument_info(&self, info: InstrumentInfo) -> Result<TradingState, StateError> {
        self.replace_instrument_info(info, InstrumentReleaseMode::AsObserved)
    }

    /// Like [`TradingState::with_new_instrument_info`], but a halt releases what
    /// resting orders actually still reserve: `price × remaining lots × lot` of
    /// cash for Buy orders and `remaining lots × lot` units for Sell orders.
    pub fn with_new_instrument_info_corrected(
        &self,
        info: InstrumentInfo,
    ) -> Result<TradingState, StateError> {
        self.replace_instrument_info(info, InstrumentReleaseMode::Corrected)
    }

    pub(crate) fn replace_instrument_info(
        &self,
        info: InstrumentInfo,
        mode: InstrumentReleaseMode,
    ) -> Result<TradingState, StateError> {
        let halted = !info.can_trade && self.can_trade();
        let previous_figi = self.instrument_info.as_ref().map(|previous| previous.figi.clone());

        let Some(previous_figi) = previous_figi.filter(|_| halted) else {
            debug!(figi = %info.figi, can_trade = info.can_trade, "Instrument info updated");
            return Ok(TradingState {
                instrument_info: Some(Arc::new(info)),
                ..self.clone()
            });
        };

        let lot = Decimal::from(info.lot);
        let overflow = || StateError::ArithmeticOverflow {
            event: "NewInstrumentInfo",
        };
        let (cash, units) = match mode {
            InstrumentReleaseMode::AsObserved => observed_release(&self.orders, lot),
            InstrumentReleaseMode::Corrected => corrected_release(&self.orders, lot),
        }
        .ok_or_else(overflow)?;

        info!(
            figi = %info.figi,
            dropped_orders = self.orders.len(),
            released_cash = %cash,
            released_units = %units,
            ?mode,
            "Instrument stopped trading; resting orders purged"
        );

        // Only entries that already exist are touched; a halt never creates one.
        let currency_positions = self
            .currency_positions
            .iter()
            .map(|(&currency, position)| -> Result<_, StateError> {
                let position = if currency == self.settlement_currency {
                    position.release(cash).ok_or_else(overflow)?
                } else {
                    *position
                };
                Ok((currency, position))
            })
            .collect::<Result<HashMap<_, _>, StateError>>()?;

        let instrument_positions = self
            .instrument_positions
            .iter()
            .map(|(figi, position)| -> Result<_, StateError> {
                let position = if *figi == previous_figi {
                    position.release(units).ok_or_else(overflow)?
                } else {
                    *position
                };
                Ok((figi.clone(), position))
            })
            .collect::<Result<HashMap<_, _>, StateError>>()?;

        Ok(TradingState {
            instrument_info: Some(Arc::new(info)),
            orders: Arc::new(Vec::new()),
            currency_positions: Arc::new(currency_positions),
            instrument_positions: Arc::new(instrument_positions),
            ..self.clone()
        })
    }
}

/// Both sums are over Buy orders and use executed lots.
fn observed_release(orders: &[Order], lot: Decimal) -> Option<(Decimal, Decimal)> {
    orders
        .iter()
        .filter(|order| order.side == OrderSide::Buy)
        .try_fold((Decimal::ZERO, Decimal::ZERO), |(cash, units), order| {
            let filled = Decimal::from(order.executed_lots).checked_mul(lot)?;
            let amount = order.price.checked_mul(filled)?;
            Some((cash.checked_add(amount)?, units.checked_add(filled)?))
        })
}

/// Cash from the unfilled part of Buy orders, units from the unfilled part of Sell orders.
fn corrected_release(orders: &[Order], lot: Decimal) -> Option<(Decimal, Decimal)> {
    orders
        .iter()
        .try_fold((Decimal::ZERO, Decimal::ZERO), |(cash, units), order| {
            let remaining = Decimal::from(order.remaining_lots()).checked_mul(lot)?;
            match order.side {
                OrderSide::Buy => Some((cash.checked_add(order.price.checked_mul(remaining)?)?, units)),
                OrderSide::Sell => Some((cash, units.checked_add(remaining)?)),
            }
        })
}

/// Sum of `position.total()` over a map, handy for conservation checks.
/// Saturates at the `Decimal` bounds.
pub fn total_holdings<K>(positions: &HashMap<K, Position>) -> Decimal {
    positions
        .values()
        .map(Position::total)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}
