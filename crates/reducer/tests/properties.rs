use core_types::{
    Currency, InstrumentInfo, Order, OrderSide, OrderStatus, Orderbook, Position, StakeState,
};
use events::TradingEvent;
use proptest::prelude::*;
use reducer::{Reducer, StateReducer, TradingState};
use rust_decimal::Decimal;
use std::collections::HashMap;

const FIGI: &str = "BBG000B9XRY4";

fn info(lot: u32) -> InstrumentInfo {
    InstrumentInfo {
        can_trade: true,
        min_price_increment: Decimal::new(1, 2),
        lot,
        accrued_interest: None,
        limit_up: None,
        limit_down: None,
        figi: FIGI.to_string(),
    }
}

fn order(side: OrderSide, requested_lots: u32, executed_lots: u32, price: Decimal) -> Order {
    Order {
        id: "p1".to_string(),
        side,
        status: OrderStatus::New,
        reject_reason: None,
        requested_lots,
        executed_lots,
        commission: None,
        price,
        figi: FIGI.to_string(),
    }
}

fn start(cash: Decimal, units: Decimal, lot: u32) -> TradingState {
    TradingState::with_holdings(
        Currency::RUB,
        HashMap::from([(Currency::RUB, Position::new(cash, None))]),
        HashMap::from([(FIGI.to_string(), Position::new(units, None))]),
    )
    .with_new_instrument_info(info(lot))
    .unwrap()
}

fn price() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn side() -> impl Strategy<Value = OrderSide> {
    prop_oneof![Just(OrderSide::Buy), Just(OrderSide::Sell)]
}

proptest! {
    #[test]
    fn place_then_cancel_restores_positions(
        cash in amount(),
        units in amount(),
        lot in 1u32..100,
        lots in 0u32..1_000,
        price in price(),
        side in side(),
    ) {
        let reducer = Reducer::default();
        let state = start(cash, units, lot);
        let placed = reducer
            .apply(&state, &TradingEvent::PlacedOrder(order(side, lots, 0, price)))
            .unwrap();
        let cancelled = reducer
            .apply(&placed, &TradingEvent::CancelledOrder { id: "p1".to_string() })
            .unwrap();

        prop_assert_eq!(
            cancelled.currency_position(Currency::RUB),
            state.currency_position(Currency::RUB)
        );
        prop_assert_eq!(cancelled.instrument_position(FIGI), state.instrument_position(FIGI));
    }

    #[test]
    fn buy_placement_moves_notional_into_reserve(
        cash in amount(),
        lot in 1u32..100,
        lots in 0u32..1_000,
        price in price(),
    ) {
        let state = start(cash, Decimal::ZERO, lot);
        let next = state
            .with_placed_order(order(OrderSide::Buy, lots, 0, price))
            .unwrap();

        let notional = price * Decimal::from(lots) * Decimal::from(lot);
        let before = state.currency_position(Currency::RUB);
        let after = next.currency_position(Currency::RUB);
        prop_assert_eq!(after.balance, before.balance - notional);
        prop_assert_eq!(after.blocked, before.blocked + notional);
        prop_assert_eq!(after.total(), before.total());
        prop_assert_eq!(next.instrument_position(FIGI), state.instrument_position(FIGI));
    }

    #[test]
    fn sell_placement_moves_units_into_reserve(
        units in amount(),
        lot in 1u32..100,
        lots in 0u32..1_000,
        price in price(),
    ) {
        let state = start(Decimal::ZERO, units, lot);
        let next = state
            .with_placed_order(order(OrderSide::Sell, lots, 0, price))
            .unwrap();

        let moved = Decimal::from(lots) * Decimal::from(lot);
        let before = state.instrument_position(FIGI);
        let after = next.instrument_position(FIGI);
        prop_assert_eq!(after.balance, before.balance - moved);
        prop_assert_eq!(after.blocked, before.blocked + moved);
        prop_assert_eq!(after.total(), before.total());
        prop_assert_eq!(
            next.currency_position(Currency::RUB),
            state.currency_position(Currency::RUB)
        );
    }

    #[test]
    fn buy_execution_spends_reserve_and_credits_units(
        cash in amount(),
        units in amount(),
        lot in 1u32..100,
        requested in 1u32..1_000,
        fill in 0u32..1_000,
        price in price(),
    ) {
        let executed = fill.min(requested);
        let placed = start(cash, units, lot)
            .with_placed_order(order(OrderSide::Buy, requested, 0, price))
            .unwrap()
            .with_changed_order("p1", OrderStatus::PartiallyFill, executed);
        let next = placed.with_executed_order("p1").unwrap();

        let cash_before = placed.currency_position(Currency::RUB);
        let cash_after = next.currency_position(Currency::RUB);
        prop_assert_eq!(cash_after.balance, cash_before.balance);

        let holding_before = placed.instrument_position(FIGI);
        let holding_after = next.instrument_position(FIGI);
        prop_assert_eq!(holding_after.blocked, holding_before.blocked);
        prop_assert_eq!(
            holding_after.balance,
            holding_before.balance + Decimal::from(executed) * Decimal::from(lot)
        );
        prop_assert!(next.orders().is_empty());
    }

    #[test]
    fn market_data_never_touches_the_account(
        cash in amount(),
        units in amount(),
        lots in 1u32..100,
        price in price(),
        side in side(),
        bid_count in 0u32..10_000,
    ) {
        let reducer = Reducer::default();
        let state = start(cash, units, 10)
            .with_placed_order(order(side, lots, 0, price))
            .unwrap();
        let book = Orderbook {
            depth: 1,
            bids: vec![StakeState { price, count: bid_count }],
            asks: vec![],
            figi: FIGI.to_string(),
        };

        let next = reducer.apply(&state, &TradingEvent::NewOrderbook(book)).unwrap();
        prop_assert_eq!(next.orders(), state.orders());
        prop_assert_eq!(next.currency_positions(), state.currency_positions());
        prop_assert_eq!(next.instrument_positions(), state.instrument_positions());
        prop_assert_eq!(next.settlement_currency(), state.settlement_currency());
    }
}
