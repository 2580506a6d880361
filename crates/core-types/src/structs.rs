use crate::enums::{CandleInterval, Currency, OrderSide, OrderStatus};
use crate::error::CoreError;
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Holdings of one asset: what is freely available and what is reserved
/// against pending orders.
///
/// Nothing here forbids negative values. Inconsistent event streams can drive
/// either field below zero and the type will carry that faithfully.
///
/// Amounts are `rust_decimal::Decimal`: a 96-bit mantissa with up to 28
/// fractional digits, so magnitudes stop near 7.9e28. Moves between balance and
/// reserve are checked and return `None` past that bound. A product needing more
/// than 28 significant digits is rounded to fit, e.g.
/// `0.1234567890123456789012345 × 123456789 × 1000` loses its last four digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub balance: Decimal,
    #[serde(default, deserialize_with = "blocked_or_zero")]
    pub blocked: Decimal,
}

impl Position {
    pub const EMPTY: Position = Position {
        balance: Decimal::ZERO,
        blocked: Decimal::ZERO,
    };

    /// Creates a position. An unset `blocked` amount means nothing is reserved.
    pub fn new(balance: Decimal, blocked: Option<Decimal>) -> Self {
        Self {
            balance,
            blocked: blocked.unwrap_or(Decimal::ZERO),
        }
    }

    pub fn with_balance(&self, balance: Decimal) -> Self {
        Self { balance, ..*self }
    }

    pub fn with_blocked(&self, blocked: Decimal) -> Self {
        Self { blocked, ..*self }
    }

    /// Moves `amount` from the free balance into the reserve.
    /// Returns `None` if either side overflows.
    pub fn reserve(&self, amount: Decimal) -> Option<Self> {
        Some(Self {
            balance: self.balance.checked_sub(amount)?,
            blocked: self.blocked.checked_add(amount)?,
        })
    }

    /// Moves `amount` from the reserve back into the free balance.
    /// Returns `None` if either side overflows.
    pub fn release(&self, amount: Decimal) -> Option<Self> {
        Some(Self {
            balance: self.balance.checked_add(amount)?,
            blocked: self.blocked.checked_sub(amount)?,
        })
    }

    /// Balance and blocked combined, saturating at the `Decimal` bounds.
    pub fn total(&self) -> Decimal {
        self.balance.saturating_add(self.blocked)
    }

    pub fn is_negative(&self) -> bool {
        self.balance < Decimal::ZERO || self.blocked < Decimal::ZERO
    }
}

fn blocked_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Decimal>::deserialize(deserializer)?.unwrap_or(Decimal::ZERO))
}

/// An amount of money in a specific currency. Only used to report commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAmount {
    pub currency: Currency,
    pub value: Decimal,
}

/// A resting or in-flight order for a single instrument.
///
/// Quantities are expressed in lots; multiply by [`InstrumentInfo::lot`] to get
/// base instrument units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderDraft")]
pub struct Order {
    pub id: String,
    pub side: OrderSide,
    pub status: OrderStatus,
    pub reject_reason: Option<String>,
    pub requested_lots: u32,
    pub executed_lots: u32,
    pub commission: Option<MoneyAmount>,
    pub price: Decimal,
    pub figi: String,
}

impl Order {
    /// Returns a copy of this order carrying a new status and executed lot count.
    pub fn with_progress(&self, status: OrderStatus, executed_lots: u32) -> Self {
        Self {
            status,
            executed_lots,
            ..self.clone()
        }
    }

    /// Lots requested but not yet executed. Saturates at zero when the
    /// exchange reports more executed lots than were requested.
    pub fn remaining_lots(&self) -> u32 {
        self.requested_lots.saturating_sub(self.executed_lots)
    }
}

/// An order as delivered by a decoding layer, before required fields are checked.
///
/// Converting it into an [`Order`] fails if `id`, `side`, `status`, `price`
/// or `figi` is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderDraft {
    pub id: Option<String>,
    pub side: Option<OrderSide>,
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub reject_reason: Option<String>,
    #[serde(default)]
    pub requested_lots: u32,
    #[serde(default)]
    pub executed_lots: u32,
    #[serde(default)]
    pub commission: Option<MoneyAmount>,
    pub price: Option<Decimal>,
    pub figi: Option<String>,
}

impl TryFrom<OrderDraft> for Order {
    type Error = CoreError;

    fn try_from(draft: OrderDraft) -> Result<Self, Self::Error> {
        Ok(Order {
            id: draft.id.ok_or(CoreError::MissingField("id"))?,
            side: draft.side.ok_or(CoreError::MissingField("side"))?,
            status: draft.status.ok_or(CoreError::MissingField("status"))?,
            reject_reason: draft.reject_reason,
            requested_lots: draft.requested_lots,
            executed_lots: draft.executed_lots,
            commission: draft.commission,
            price: draft.price.ok_or(CoreError::MissingField("price"))?,
            figi: draft.figi.ok_or(CoreError::MissingField("figi"))?,
        })
    }
}

/// Trading rules for an instrument as published by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentInfo {
    pub can_trade: bool,
    pub min_price_increment: Decimal,
    /// Number of base units in one lot.
    pub lot: u32,
    #[serde(default)]
    pub accrued_interest: Option<Decimal>,
    #[serde(default)]
    pub limit_up: Option<Decimal>,
    #[serde(default)]
    pub limit_down: Option<Decimal>,
    pub figi: String,
}

/// A single OHLC price bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub open: Decimal,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub trading_value: Decimal,
    pub date_time: DateTime<FixedOffset>,
    pub interval: CandleInterval,
    pub figi: String,
}

/// One price level of the order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeState {
    pub price: Decimal,
    pub count: u32,
}

/// Order book depth snapshot. Always replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orderbook {
    pub depth: u32,
    pub bids: Vec<StakeState>,
    pub asks: Vec<StakeState>,
    pub figi: String,
}

impl Orderbook {
    pub fn best_bid(&self) -> Option<&StakeState> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&StakeState> {
        self.asks.first()
    }
}
