use crate::error::SessionError;
use events::TradingEvent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Reads JSON-lines events from `reader` and forwards them to a session channel.
///
/// Blank lines and lines starting with `#` are skipped. The first line that
/// fails to decode stops the feed, reported with its 1-based line number.
/// Returns the number of events sent.
pub async fn feed_events<R>(reader: R, tx: mpsc::Sender<TradingEvent>) -> Result<usize, SessionError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0;
    let mut sent = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let event = TradingEvent::from_json_line(trimmed)
            .map_err(|source| SessionError::Decode { line: line_no, source })?;
        debug!(line = line_no, event = event.kind(), "Decoded event");

        tx.send(event).await.map_err(|_| SessionError::ChannelClosed)?;
        sent += 1;
    }

    info!(events = sent, lines = line_no, "Event feed exhausted");
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"
# instrument first, then a cancellation
{"type":"NewInstrumentInfo","payload":{"can_trade":true,"min_price_increment":"0.01","lot":10,"figi":"ABC"}}

{"type":"CancelledOrder","payload":{"id":"o1"}}
"#;

    #[tokio::test]
    async fn skips_comments_and_blank_lines() {
        let (tx, mut rx) = mpsc::channel(8);
        let sent = feed_events(FEED.as_bytes(), tx).await.unwrap();
        assert_eq!(sent, 2);

        assert_eq!(rx.recv().await.map(|e| e.kind()), Some("NewInstrumentInfo"));
        assert_eq!(rx.recv().await.map(|e| e.kind()), Some("CancelledOrder"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn reports_the_failing_line() {
        let input = "{\"type\":\"CancelledOrder\",\"payload\":{\"id\":\"o1\"}}\nnot json\n";
        let (tx, _rx) = mpsc::channel(8);
        let result = feed_events(input.as_bytes(), tx).await;
        assert!(matches!(result, Err(SessionError::Decode { line: 2, .. })));
    }

    #[tokio::test]
    async fn demo_feed_settles_through_a_session() {
        use crate::{SessionReport, TradingSession};
        use core_types::{Currency, Position};
        use reducer::{Reducer, TradingState};
        use rust_decimal_macros::dec;
        use std::collections::HashMap;
        use std::sync::Arc;

        let demo = include_str!("../../../demos/events.jsonl");
        let initial = TradingState::with_holdings(
            Currency::RUB,
            HashMap::from([(Currency::RUB, Position::new(dec!(10000), None))]),
            HashMap::new(),
        );
        let mut session = TradingSession::new(Arc::new(Reducer::default()), initial);
        let (tx, rx) = mpsc::channel(4);

        let feeder = tokio::spawn(feed_events(demo.as_bytes(), tx));
        let report = session.run(rx).await;
        assert_eq!(feeder.await.unwrap().unwrap(), 7);
        assert_eq!(report, SessionReport { applied: 7, rejected: 0 });

        let state = session.snapshot();
        assert_eq!(state.currency_position(Currency::RUB), Position::new(dec!(8000), None));
        assert_eq!(state.instrument_position("BBG000B9XRY4"), Position::new(dec!(20), None));
        // The cancellation keeps the matching order in the list.
        assert_eq!(state.orders().len(), 1);
        assert_eq!(state.orders()[0].id, "o2");
        assert!(state.candle().is_some());
    }

    #[tokio::test]
    async fn closed_channel_stops_the_feed() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let result = feed_events(FEED.as_bytes(), tx).await;
        assert!(matches!(result, Err(SessionError::ChannelClosed)));
    }
}
