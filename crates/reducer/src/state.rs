use crate::error::StateError;
use core_types::{Candle, Currency, InstrumentInfo, Order, Orderbook, Position};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

/// One immutable snapshot of everything a strategy knows about its instrument
/// and account.
///
/// Every transition returns a new snapshot. Parts that a transition does not
/// touch are shared with the previous snapshot through `Arc`, so cloning is
/// cheap and an older snapshot stays valid for as long as a reader holds it.
/// There is no way to get a mutable reference into a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingState {
    pub(crate) orderbook: Option<Arc<Orderbook>>,
    pub(crate) candle: Option<Arc<Candle>>,
    pub(crate) instrument_info: Option<Arc<InstrumentInfo>>,
    pub(crate) orders: Arc<Vec<Order>>,
    pub(crate) currency_positions: Arc<HashMap<Currency, Position>>,
    pub(crate) instrument_positions: Arc<HashMap<String, Position>>,
    pub(crate) settlement_currency: Currency,
}

/// A position that a transition left below zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Underflow {
    pub asset: String,
    pub position: Position,
}

impl TradingState {
    /// A session-start snapshot: no market data, no orders, no holdings.
    pub fn new(settlement_currency: Currency) -> Self {
        Self::with_holdings(settlement_currency, HashMap::new(), HashMap::new())
    }

    /// A session-start snapshot seeded with existing cash and instrument holdings.
    pub fn with_holdings(
        settlement_currency: Currency,
        currency_positions: HashMap<Currency, Position>,
        instrument_positions: HashMap<String, Position>,
    ) -> Self {
        Self {
            orderbook: None,
            candle: None,
            instrument_info: None,
            orders: Arc::new(Vec::new()),
            currency_positions: Arc::new(currency_positions),
            instrument_positions: Arc::new(instrument_positions),
            settlement_currency,
        }
    }

    pub fn orderbook(&self) -> Option<&Orderbook> {
        self.orderbook.as_deref()
    }

    pub fn candle(&self) -> Option<&Candle> {
        self.candle.as_deref()
    }

    pub fn instrument_info(&self) -> Option<&InstrumentInfo> {
        self.instrument_info.as_deref()
    }

    /// Open orders in the order they were placed.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn currency_positions(&self) -> &HashMap<Currency, Position> {
        &self.currency_positions
    }

    pub fn instrument_positions(&self) -> &HashMap<String, Position> {
        &self.instrument_positions
    }

    pub fn settlement_currency(&self) -> Currency {
        self.settlement_currency
    }

    /// The cash position for `currency`, or an empty one if none is recorded.
    pub fn currency_position(&self, currency: Currency) -> Position {
        self.currency_positions
            .get(&currency)
            .copied()
            .unwrap_or(Position::EMPTY)
    }

    /// The holding for `figi`, or an empty one if none is recorded.
    pub fn instrument_position(&self, figi: &str) -> Position {
        self.instrument_positions
            .get(figi)
            .copied()
            .unwrap_or(Position::EMPTY)
    }

    /// The order the reducer would act on for `id`: the last one with that id.
    pub fn find_order(&self, id: &str) -> Option<&Order> {
        self.orders.iter().rev().find(|order| order.id == id)
    }

    /// Cash available for new orders in the settlement currency.
    pub fn available_cash(&self) -> Decimal {
        self.currency_position(self.settlement_currency).balance
    }

    /// Whether the tracked instrument currently accepts orders.
    pub fn can_trade(&self) -> bool {
        self.instrument_info
            .as_ref()
            .is_some_and(|info| info.can_trade)
    }

    /// The lot multiplier, required by every transition that converts lots into units.
    pub(crate) fn lot(&self, event: &'static str) -> Result<Decimal, StateError> {
        self.instrument_info
            .as_ref()
            .map(|info| Decimal::from(info.lot))
            .ok_or(StateError::InstrumentInfoMissing(event))
    }

    /// `(lots × lot, price × lots × lot)`: the units and cash an order moves.
    pub(crate) fn escrow(
        price: Decimal,
        lots: u32,
        lot: Decimal,
        event: &'static str,
    ) -> Result<(Decimal, Decimal), StateError> {
        let units = Decimal::from(lots)
            .checked_mul(lot)
            .ok_or(StateError::ArithmeticOverflow { event })?;
        let amount = price
            .checked_mul(units)
            .ok_or(StateError::ArithmeticOverflow { event })?;
        Ok((units, amount))
    }

    /// A fresh currency map with the settlement-currency entry replaced.
    pub(crate) fn currency_positions_with(&self, position: Position) -> HashMap<Currency, Position> {
        let mut positions = (*self.currency_positions).clone();
        positions.insert(self.settlement_currency, position);
        positions
    }

    /// A fresh instrument map with the entry for `figi` replaced.
    pub(crate) fn instrument_positions_with(
        &self,
        figi: &str,
        position: Position,
    ) -> HashMap<String, Position> {
        let mut positions = (*self.instrument_positions).clone();
        positions.insert(figi.to_string(), position);
        positions
    }

    /// Positions that are negative now but were not identical in `previous`.
    ///
    /// Unchanged entries are skipped so that one bad event is reported once,
    /// not again on every later transition.
    pub fn underflows_since(&self, previous: &TradingState) -> Vec<Underflow> {
        let currencies = self
            .currency_positions
            .iter()
            .filter(|&(currency, position)| {
                position.is_negative() && previous.currency_positions.get(currency) != Some(position)
            })
            .map(|(currency, position)| Underflow {
                asset: currency.to_string(),
                position: *position,
            });

        let instruments = self
            .instrument_positions
            .iter()
            .filter(|&(figi, position)| {
                position.is_negative()
                    && previous.instrument_positions.get(figi.as_str()) != Some(position)
            })
            .map(|(figi, position)| Underflow {
                asset: figi.clone(),
                position: *position,
            });

        let mut underflows: Vec<Underflow> = currencies.chain(instruments).collect();
        underflows.sort_by(|a, b| a.asset.cmp(&b.asset));
        underflows
    }
}
