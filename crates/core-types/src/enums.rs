use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Cash currencies an account can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    RUB,
    USD,
    EUR,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Currency::RUB => "RUB",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
        };
        f.write_str(code)
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RUB" => Ok(Currency::RUB),
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            _ => Err(CoreError::InvalidInput(
                "currency".to_string(),
                s.to_string(),
            )),
        }
    }
}

/// Exchange-reported lifecycle status of an order.
///
/// `PendingNew`, `PendingCancel` and `PendingReplace` are in-flight states: the
/// request has been sent but the exchange has not confirmed it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    PartiallyFill,
    Fill,
    Cancelled,
    Replaced,
    PendingCancel,
    Rejected,
    PendingReplace,
    PendingNew,
}

impl OrderStatus {
    /// Returns true once the exchange will report nothing further for the order.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Fill | OrderStatus::Cancelled | OrderStatus::Rejected | OrderStatus::Replaced
        )
    }

    /// Returns true while a request against the order awaits exchange confirmation.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            OrderStatus::PendingNew | OrderStatus::PendingCancel | OrderStatus::PendingReplace
        )
    }

    /// Checks whether moving from `self` to `target` is a legal lifecycle step.
    ///
    /// Re-reporting the same non-terminal status is allowed, since partial fills
    /// arrive as repeated `PartiallyFill` updates with growing executed lots.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        match self {
            OrderStatus::PendingNew => matches!(
                target,
                OrderStatus::PendingNew
                    | OrderStatus::New
                    | OrderStatus::PartiallyFill
                    | OrderStatus::Fill
                    | OrderStatus::Cancelled
                    | OrderStatus::Rejected
            ),
            OrderStatus::New => matches!(
                target,
                OrderStatus::New
                    | OrderStatus::PartiallyFill
                    | OrderStatus::Fill
                    | OrderStatus::Cancelled
                    | OrderStatus::Rejected
                    | OrderStatus::PendingCancel
                    | OrderStatus::PendingReplace
            ),
            OrderStatus::PartiallyFill => matches!(
                target,
                OrderStatus::PartiallyFill
                    | OrderStatus::Fill
                    | OrderStatus::Cancelled
                    | OrderStatus::PendingCancel
                    | OrderStatus::PendingReplace
            ),
            OrderStatus::PendingCancel => matches!(
                target,
                OrderStatus::PendingCancel
                    | OrderStatus::Cancelled
                    | OrderStatus::PartiallyFill
                    | OrderStatus::Fill
            ),
            OrderStatus::PendingReplace => matches!(
                target,
                OrderStatus::PendingReplace
                    | OrderStatus::Replaced
                    | OrderStatus::PartiallyFill
                    | OrderStatus::Fill
                    | OrderStatus::Cancelled
                    | OrderStatus::Rejected
            ),
            // Terminal states cannot transition
            OrderStatus::Fill
            | OrderStatus::Cancelled
            | OrderStatus::Rejected
            | OrderStatus::Replaced => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Aggregation interval of a price candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleInterval {
    #[serde(rename = "1min")]
    OneMin,
    #[serde(rename = "2min")]
    TwoMin,
    #[serde(rename = "3min")]
    ThreeMin,
    #[serde(rename = "5min")]
    FiveMin,
    #[serde(rename = "10min")]
    TenMin,
    #[serde(rename = "15min")]
    QuarterHour,
    #[serde(rename = "30min")]
    HalfHour,
    #[serde(rename = "hour")]
    Hour,
    #[serde(rename = "day")]
    Day,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "month")]
    Month,
}

impl CandleInterval {
    pub const ALL: [CandleInterval; 11] = [
        CandleInterval::OneMin,
        CandleInterval::TwoMin,
        CandleInterval::ThreeMin,
        CandleInterval::FiveMin,
        CandleInterval::TenMin,
        CandleInterval::QuarterHour,
        CandleInterval::HalfHour,
        CandleInterval::Hour,
        CandleInterval::Day,
        CandleInterval::Week,
        CandleInterval::Month,
    ];

    /// The exchange's wire name for the interval.
    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::OneMin => "1min",
            CandleInterval::TwoMin => "2min",
            CandleInterval::ThreeMin => "3min",
            CandleInterval::FiveMin => "5min",
            CandleInterval::TenMin => "10min",
            CandleInterval::QuarterHour => "15min",
            CandleInterval::HalfHour => "30min",
            CandleInterval::Hour => "hour",
            CandleInterval::Day => "day",
            CandleInterval::Week => "week",
            CandleInterval::Month => "month",
        }
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandleInterval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CandleInterval::ALL
            .into_iter()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| CoreError::InvalidInput("candle interval".to_string(), s.to_string()))
    }
}
