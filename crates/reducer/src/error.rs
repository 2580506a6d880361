use core_types::OrderStatus;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Instrument info must be received before handling {0}")]
    InstrumentInfoMissing(&'static str),

    #[error("Position for {asset} went negative after {event}: balance {balance}, blocked {blocked}")]
    NegativePosition {
        asset: String,
        event: &'static str,
        balance: Decimal,
        blocked: Decimal,
    },

    #[error("Cannot apply {action} to order {id} in status {status}")]
    IllegalTransition {
        id: String,
        status: OrderStatus,
        action: String,
    },

    #[error("Amounts for {event} do not fit the decimal range")]
    ArithmeticOverflow { event: &'static str },

    #[error("Order {0} is not known")]
    UnknownOrder(String),

    #[error("Order {0} is already open")]
    DuplicateOrder(String),
}
