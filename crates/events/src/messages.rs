use crate::error::EventsError;
use core_types::{Candle, InstrumentInfo, Order, OrderStatus, Orderbook};
use serde::{Deserialize, Serialize};

/// Every event the reducer understands, one variant per state transition.
///
/// The `#[serde(tag = "type", content = "payload")]` attribute keeps the JSON
/// form flat and self-describing. A cancellation looks like:
/// `{
///   "type": "CancelledOrder",
///   "payload": { "id": "o2" }
/// }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum TradingEvent {
    /// A fresh price bar for the tracked instrument.
    NewCandle(Candle),
    /// A fresh depth snapshot for the tracked instrument.
    NewOrderbook(Orderbook),
    /// Updated trading rules, possibly flipping tradability.
    NewInstrumentInfo(InstrumentInfo),
    /// The exchange settled the order.
    ExecutedOrder { id: String },
    /// The exchange cancelled the order.
    CancelledOrder { id: String },
    /// The exchange reported progress on the order.
    ChangedOrder {
        id: String,
        status: OrderStatus,
        executed_lots: u32,
    },
    /// A new order was accepted for placement.
    PlacedOrder(Order),
}

impl TradingEvent {
    /// A short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TradingEvent::NewCandle(_) => "NewCandle",
            TradingEvent::NewOrderbook(_) => "NewOrderbook",
            TradingEvent::NewInstrumentInfo(_) => "NewInstrumentInfo",
            TradingEvent::ExecutedOrder { .. } => "ExecutedOrder",
            TradingEvent::CancelledOrder { .. } => "CancelledOrder",
            TradingEvent::ChangedOrder { .. } => "ChangedOrder",
            TradingEvent::PlacedOrder(_) => "PlacedOrder",
        }
    }

    /// The id of the order the event refers to, if it is an order event.
    pub fn order_id(&self) -> Option<&str> {
        match self {
            TradingEvent::ExecutedOrder { id }
            | TradingEvent::CancelledOrder { id }
            | TradingEvent::ChangedOrder { id, .. } => Some(id.as_str()),
            TradingEvent::PlacedOrder(order) => Some(order.id.as_str()),
            _ => None,
        }
    }

    /// Returns true for events that only carry market data.
    pub fn is_market_data(&self) -> bool {
        matches!(
            self,
            TradingEvent::NewCandle(_) | TradingEvent::NewOrderbook(_)
        )
    }

    /// Decodes a single line of a JSON-lines event log.
    pub fn from_json_line(line: &str) -> Result<Self, EventsError> {
        Ok(serde_json::from_str(line.trim())?)
    }

    /// Encodes the event as a single JSON line, without the trailing newline.
    pub fn to_json_line(&self) -> Result<String, EventsError> {
        serde_json::to_string(self).map_err(|e| EventsError::Serialization(e.to_string()))
    }
}
