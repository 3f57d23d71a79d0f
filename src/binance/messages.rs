//! Binance market stream message types

use serde::Deserialize;

/// Combined-stream envelope: `{"stream": "suiusdt@trade", "data": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct StreamEnvelope {
    pub stream: String,
    pub data: serde_json::Value,
}

/// Payload of `@trade` and `@aggTrade` streams
#[derive(Debug, Clone, Deserialize)]
pub struct TradeMessage {
    /// Price
    #[serde(rename = "p")]
    pub price: String,
    /// Quantity
    #[serde(rename = "q")]
    pub quantity: String,
    /// Buyer is the maker (i.e. the taker sold)
    #[serde(rename = "m")]
    pub buyer_is_maker: bool,
    /// Trade time in milliseconds
    #[serde(rename = "T", default)]
    pub trade_time: Option<i64>,
}

/// `[price, quantity]` pair as sent on the wire
pub type WireLevel = [String; 2];

/// Payload of partial (`bids`/`asks`) and diff (`b`/`a`) depth streams
#[derive(Debug, Clone, Deserialize)]
pub struct DepthMessage {
    #[serde(alias = "b", default)]
    pub bids: Vec<WireLevel>,
    #[serde(alias = "a", default)]
    pub asks: Vec<WireLevel>,
}

/// Which kind of payload a stream carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Trade,
    Depth,
    Other,
}

impl StreamKind {
    /// Classify by stream name (`suiusdt@aggTrade`) or event type (`aggTrade`)
    pub fn classify(name: &str) -> Self {
        // `{symbol}@{channel}[@{speed}]`; bare names are event types
        let channel = name.split('@').nth(1).unwrap_or(name);
        match channel {
            "trade" | "aggTrade" => StreamKind::Trade,
            c if c.starts_with("depth") => StreamKind::Depth,
            _ => StreamKind::Other,
        }
    }
}

/// Build the combined stream URL for one symbol
pub fn combined_stream_url(base_url: &str, symbol: &str, streams: &[String]) -> String {
    let symbol = symbol.to_lowercase();
    let streams = streams
        .iter()
        .map(|s| format!("{}@{}", symbol, s))
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/stream?streams={}", base_url.trim_end_matches('/'), streams)
}
