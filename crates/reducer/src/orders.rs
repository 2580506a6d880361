use crate::error::StateError;
use crate::state::TradingState;
use configuration::CancelFilter;
use core_types::{Order, OrderSide, OrderStatus};
use std::sync::Arc;
use tracing::debug;

impl TradingState {
    /// Settles the order with the given id and removes every order carrying it.
    ///
    /// If several orders share the id, the last one is settled. With
    /// `amount = price × executed lots × lot`:
    ///
    /// - Buy: `amount` leaves the settlement-currency reserve (the cash is spent)
    ///   and `executed lots × lot` units arrive in the instrument balance.
    /// - Sell: `amount` arrives in the settlement-currency balance and
    ///   `executed lots × lot` units leave the instrument reserve.
    pub fn with_executed_order(&self, id: &str) -> Result<TradingState, StateError> {
        let lot = self.lot("ExecutedOrder")?;
        let remaining: Vec<Order> = self
            .orders
            .iter()
            .filter(|order| order.id != id)
            .cloned()
            .collect();

        let Some(executed) = self.find_order(id) else {
            debug!(order_id = id, "Executed order is not among open orders");
            return Ok(TradingState {
                orders: Arc::new(remaining),
                ..self.clone()
            });
        };

        let (units, amount) =
            Self::escrow(executed.price, executed.executed_lots, lot, "ExecutedOrder")?;
        let cash = self.currency_position(self.settlement_currency);
        let holding = self.instrument_position(&executed.figi);

        let settled = match executed.side {
            OrderSide::Buy => cash
                .blocked
                .checked_sub(amount)
                .zip(holding.balance.checked_add(units))
                .map(|(blocked, balance)| (cash.with_blocked(blocked), holding.with_balance(balance))),
            OrderSide::Sell => cash
                .balance
                .checked_add(amount)
                .zip(holding.blocked.checked_sub(units))
                .map(|(balance, blocked)| (cash.with_balance(balance), holding.with_blocked(blocked))),
        };
        let (cash, holding) = settled.ok_or(StateError::ArithmeticOverflow {
            event: "ExecutedOrder",
        })?;

        debug!(
            order_id = id,
            side = ?executed.side,
            %amount,
            %units,
            "Order executed"
        );

        Ok(TradingState {
            orders: Arc::new(remaining),
            currency_positions: Arc::new(self.currency_positions_with(cash)),
            instrument_positions: Arc::new(self.instrument_positions_with(&executed.figi, holding)),
            ..self.clone()
        })
    }

    /// Releases the reservation of a cancelled order.
    ///
    /// - Buy: `price × requested lots × lot` goes from the settlement-currency
    ///   reserve back to its balance.
    /// - Sell: `requested lots × lot` units go from the instrument reserve back
    ///   to its balance.
    ///
    /// The order list keeps *only* the orders with this id, matching what the
    /// exchange client has always done. Use
    /// [`TradingState::with_cancelled_order_corrected`] to drop them instead.
    pub fn with_cancelled_order(&self, id: &str) -> Result<TradingState, StateError> {
        self.cancel(id, CancelFilter::AsObserved)
    }

    /// Like [`TradingState::with_cancelled_order`], but removes the cancelled
    /// order from the order list.
    pub fn with_cancelled_order_corrected(&self, id: &str) -> Result<TradingState, StateError> {
        self.cancel(id, CancelFilter::Corrected)
    }

    pub(crate) fn cancel(&self, id: &str, filter: CancelFilter) -> Result<TradingState, StateError> {
        let lot = self.lot("CancelledOrder")?;
        let keep_matching = filter == CancelFilter::AsObserved;
        let orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|order| (order.id == id) == keep_matching)
            .cloned()
            .collect();

        let Some(cancelled) = self.find_order(id) else {
            debug!(order_id = id, "Cancelled order is not among open orders");
            return Ok(TradingState {
                orders: Arc::new(orders),
                ..self.clone()
            });
        };

        let (units, amount) =
            Self::escrow(cancelled.price, cancelled.requested_lots, lot, "CancelledOrder")?;
        let cash = self.currency_position(self.settlement_currency);
        let holding = self.instrument_position(&cancelled.figi);

        let released = match cancelled.side {
            OrderSide::Buy => cash.release(amount).map(|cash| (cash, holding)),
            OrderSide::Sell => holding.release(units).map(|holding| (cash, holding)),
        };
        let (cash, holding) = released.ok_or(StateError::ArithmeticOverflow {
            event: "CancelledOrder",
        })?;

        debug!(order_id = id, side = ?cancelled.side, ?filter, "Order cancelled");

        Ok(TradingState {
            orders: Arc::new(orders),
            currency_positions: Arc::new(self.currency_positions_with(cash)),
            instrument_positions: Arc::new(self.instrument_positions_with(&cancelled.figi, holding)),
            ..self.clone()
        })
    }

    /// Records exchange-reported progress on every order with the given id.
    /// Positions are not touched and unknown ids are ignored.
    pub fn with_changed_order(
        &self,
        id: &str,
        status: OrderStatus,
        executed_lots: u32,
    ) -> TradingState {
        let orders: Vec<Order> = self
            .orders
            .iter()
            .map(|order| {
                if order.id == id {
                    order.with_progress(status, executed_lots)
                } else {
                    order.clone()
                }
            })
            .collect();

        debug!(order_id = id, %status, executed_lots, "Order changed");

        TradingState {
            orders: Arc::new(orders),
            ..self.clone()
        }
    }

    /// Appends a newly placed order and reserves what it needs.
    ///
    /// - Buy: `price × requested lots × lot` moves from the settlement-currency
    ///   balance into its reserve.
    /// - Sell: `requested lots × lot` units move from the instrument balance into
    ///   its reserve.
    pub fn with_placed_order(&self, order: Order) -> Result<TradingState, StateError> {
        let lot = self.lot("PlacedOrder")?;
        let (units, amount) = Self::escrow(order.price, order.requested_lots, lot, "PlacedOrder")?;
        let cash = self.currency_position(self.settlement_currency);
        let holding = self.instrument_position(&order.figi);

        let reserved = match order.side {
            OrderSide::Buy => cash.reserve(amount).map(|cash| (cash, holding)),
            OrderSide::Sell => holding.reserve(units).map(|holding| (cash, holding)),
        };
        let (cash, holding) = reserved.ok_or(StateError::ArithmeticOverflow {
            event: "PlacedOrder",
        })?;

        debug!(order_id = %order.id, side = ?order.side, %amount, %units, "Order placed");

        let currency_positions = self.currency_positions_with(cash);
        let instrument_positions = self.instrument_positions_with(&order.figi, holding);
        let mut orders = (*self.orders).clone();
        orders.push(order);

        Ok(TradingState {
            orders: Arc::new(orders),
            currency_positions: Arc::new(currency_positions),
            instrument_positions: Arc::new(instrument_positions),
            ..self.clone()
        })
    }
}
