//! Wire frame codec for the Kalshi trade stream.
//!
//! Outbound commands and inbound frames share the envelope
//! `{ "type"/"cmd": ..., "msg"/"params": ... }`. Inbound payload fields are
//! all optional: the venue occasionally sends partial frames and those must
//! degrade to no-ops upstream, not decode errors.

use crate::error::WsResult;
use kalshi_core::{BookSide, Price, QuotePatch};
use serde::{Deserialize, Serialize};

/// Channel carrying quote updates.
pub const CHANNEL_TICKER: &str = "ticker_v2";
/// Channel carrying order book deltas.
pub const CHANNEL_ORDERBOOK_DELTA: &str = "orderbook_delta";
/// Channel carrying executed trades.
pub const CHANNEL_TRADE: &str = "trade";

/// Keepalive frame sent as a bare string, outside the JSON envelope.
pub const HEARTBEAT_FRAME: &str = "heartbeat";

/// Outbound subscription command.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeCommand {
    pub id: u64,
    pub cmd: &'static str,
    pub params: SubscribeParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscribeParams {
    pub channels: Vec<String>,
    pub market_tickers: Vec<String>,
}

impl SubscribeCommand {
    pub fn new(id: u64, channel: &str, market_tickers: Vec<String>) -> Self {
        Self {
            id,
            cmd: "subscribe",
            params: SubscribeParams {
                channels: vec![channel.to_string()],
                market_tickers,
            },
        }
    }
}

/// Quote update from `ticker_v2`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TickerPayload {
    #[serde(rename = "market_ticker", alias = "ticker")]
    pub ticker: Option<String>,
    pub yes_bid: Option<i64>,
    pub yes_ask: Option<i64>,
    pub no_bid: Option<i64>,
    pub no_ask: Option<i64>,
    #[serde(alias = "last_price")]
    pub price: Option<i64>,
    pub volume: Option<i64>,
    pub ts: Option<i64>,
}

impl TickerPayload {
    /// Convert to a sparse snapshot patch.
    pub fn to_patch(&self) -> QuotePatch {
        QuotePatch {
            yes_bid: self.yes_bid.map(Price::new),
            yes_ask: self.yes_ask.map(Price::new),
            no_bid: self.no_bid.map(Price::new),
            no_ask: self.no_ask.map(Price::new),
            last_price: self.price.map(Price::new),
            volume: self.volume,
            ts: self.ts,
        }
    }
}

/// Depth delta from `orderbook_delta`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderbookDeltaPayload {
    pub market_ticker: Option<String>,
    pub side: Option<BookSide>,
    pub price: Option<i64>,
    pub delta: Option<i64>,
}

/// Executed trade from `trade`.
#[derive(Debug, Clone, Deserialize)]
pub struct TradePayload {
    pub market_ticker: Option<String>,
    pub yes_price: Option<i64>,
    pub no_price: Option<i64>,
    pub count: Option<i64>,
    pub taker_side: Option<String>,
    pub ts: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default)]
    msg: serde_json::Value,
}

/// Decoded inbound frame.
#[derive(Debug, Clone)]
pub enum StreamMessage {
    Ticker(TickerPayload),
    OrderbookDelta(OrderbookDeltaPayload),
    Trade(TradePayload),
    /// Subscription acknowledgement.
    Subscribed,
    /// Frame types this client does not consume.
    Unhandled { msg_type: String },
}

impl StreamMessage {
    /// Decode a text frame. Heartbeats are handled before this point.
    pub fn decode(text: &str) -> WsResult<Self> {
        let frame: RawFrame = serde_json::from_str(text)?;
        Ok(match frame.msg_type.as_str() {
            CHANNEL_TICKER => Self::Ticker(serde_json::from_value(frame.msg)?),
            CHANNEL_ORDERBOOK_DELTA => Self::OrderbookDelta(serde_json::from_value(frame.msg)?),
            CHANNEL_TRADE => Self::Trade(serde_json::from_value(frame.msg)?),
            "subscribed" => Self::Subscribed,
            _ => Self::Unhandled {
                msg_type: frame.msg_type,
            },
        })
    }

    /// The channel this frame belongs to, for observer routing.
    pub fn channel(&self) -> Option<&'static str> {
        match self {
            Self::Ticker(_) => Some(CHANNEL_TICKER),
            Self::OrderbookDelta(_) => Some(CHANNEL_ORDERBOOK_DELTA),
            Self::Trade(_) => Some(CHANNEL_TRADE),
            Self::Subscribed | Self::Unhandled { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_command_shape() {
        let cmd = SubscribeCommand::new(3, CHANNEL_TICKER, vec!["MKT-A".into(), "MKT-B".into()]);
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["cmd"], "subscribe");
        assert_eq!(json["params"]["channels"][0], "ticker_v2");
        assert_eq!(json["params"]["market_tickers"][1], "MKT-B");
    }

    #[test]
    fn test_decode_ticker_frame() {
        let text = r#"{"type":"ticker_v2","msg":{"market_ticker":"MKT-A","yes_bid":52,"no_bid":47,"ts":1724630400}}"#;
        match StreamMessage::decode(text).unwrap() {
            StreamMessage::Ticker(p) => {
                assert_eq!(p.ticker.as_deref(), Some("MKT-A"));
                assert_eq!(p.yes_bid, Some(52));
                assert_eq!(p.yes_ask, None);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_decode_ticker_frame_without_ticker() {
        // Sparse frames decode fine; dropping them is the store's call.
        let text = r#"{"type":"ticker_v2","msg":{"yes_bid":52}}"#;
        match StreamMessage::decode(text).unwrap() {
            StreamMessage::Ticker(p) => assert!(p.ticker.is_none()),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_decode_orderbook_delta_frame() {
        let text =
            r#"{"type":"orderbook_delta","msg":{"market_ticker":"MKT-A","side":"no","price":45,"delta":-3}}"#;
        match StreamMessage::decode(text).unwrap() {
            StreamMessage::OrderbookDelta(d) => {
                assert_eq!(d.side, Some(BookSide::No));
                assert_eq!(d.delta, Some(-3));
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_decode_unknown_type() {
        let text = r#"{"type":"fill","msg":{}}"#;
        match StreamMessage::decode(text).unwrap() {
            StreamMessage::Unhandled { msg_type } => assert_eq!(msg_type, "fill"),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_decode_subscribed_ack() {
        let text = r#"{"type":"subscribed","msg":{"channel":"ticker_v2"}}"#;
        assert!(matches!(
            StreamMessage::decode(text).unwrap(),
            StreamMessage::Subscribed
        ));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(StreamMessage::decode("not json").is_err());
    }

    #[test]
    fn test_ticker_to_patch() {
        let payload = TickerPayload {
            ticker: Some("MKT-A".into()),
            yes_bid: Some(52),
            price: Some(53),
            ..Default::default()
        };
        let patch = payload.to_patch();
        assert_eq!(patch.yes_bid, Some(Price::new(52)));
        assert_eq!(patch.last_price, Some(Price::new(53)));
        assert_eq!(patch.no_bid, None);
    }
}
