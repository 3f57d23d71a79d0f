//! WebSocket reader for Binance combined market streams

use chrono::{DateTime, TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, instrument, warn};

use super::messages::*;
use crate::common::errors::{Result, ScalperError};
use crate::common::types::{ConnectionStatus, DepthSnapshot, MarketEvent, TradeEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How a connected session ended
enum SessionEnd {
    /// Remote closed or errored; worth reconnecting
    Dropped,
    /// Nobody is listening any more
    ReceiverGone,
}

/// WebSocket client for one combined-stream URL
pub struct BinanceWebSocket {
    url: String,
    reconnect_delay: Duration,
    /// 0 = unlimited
    max_reconnect_attempts: u32,
    is_connected: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl BinanceWebSocket {
    pub fn new(url: String) -> Self {
        Self {
            url,
            reconnect_delay: Duration::from_secs(5),
            max_reconnect_attempts: 0,
            is_connected: Arc::new(AtomicBool::new(false)),
            reader: None,
        }
    }

    pub fn with_reconnect(mut self, delay: Duration, max_attempts: u32) -> Self {
        self.reconnect_delay = delay;
        self.max_reconnect_attempts = max_attempts;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    /// Connect and spawn the reader task.
    ///
    /// The first connection failure is returned to the caller; later drops
    /// are retried in the background.
    #[instrument(skip(self, event_sender), fields(url = %self.url))]
    pub async fn connect(&mut self, event_sender: mpsc::Sender<MarketEvent>) -> Result<()> {
        info!("Connecting to Binance WebSocket");

        let (ws_stream, _response) = connect_async(&self.url)
            .await
            .map_err(|e| ScalperError::WebSocketConnection(e.to_string()))?;

        info!("WebSocket connection established");
        self.is_connected.store(true, Ordering::SeqCst);
        let _ = event_sender
            .send(MarketEvent::ConnectionStatus(ConnectionStatus::Connected))
            .await;

        let url = self.url.clone();
        let is_connected = self.is_connected.clone();
        let delay = self.reconnect_delay;
        let max_attempts = self.max_reconnect_attempts;

        self.reader = Some(tokio::spawn(async move {
            let mut end = Self::read_session(ws_stream, &event_sender, &is_connected).await;
            let mut attempt: u32 = 0;

            while let SessionEnd::Dropped = end {
                attempt += 1;
                if max_attempts > 0 && attempt > max_attempts {
                    error!(max_attempts, "giving up reconnecting");
                    let _ = event_sender
                        .send(MarketEvent::ConnectionStatus(ConnectionStatus::Error(
                            "reconnect attempts exhausted".to_string(),
                        )))
                        .await;
                    break;
                }

                if event_sender
                    .send(MarketEvent::ConnectionStatus(ConnectionStatus::Reconnecting {
                        attempt,
                    }))
                    .await
                    .is_err()
                {
                    break;
                }
                tokio::time::sleep(delay).await;

                match connect_async(&url).await {
                    Ok((ws_stream, _)) => {
                        info!(attempt, "WebSocket reconnected");
                        attempt = 0;
                        is_connected.store(true, Ordering::SeqCst);
                        let _ = event_sender
                            .send(MarketEvent::ConnectionStatus(ConnectionStatus::Connected))
                            .await;
                        end = Self::read_session(ws_stream, &event_sender, &is_connected).await;
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "reconnect failed");
                    }
                }
            }

            is_connected.store(false, Ordering::SeqCst);
            debug!("reader task finished");
        }));

        Ok(())
    }

    /// Stop the reader task
    pub fn disconnect(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.is_connected.store(false, Ordering::SeqCst);
    }

    /// Forward messages from one connection until it drops
    async fn read_session(
        ws_stream: WsStream,
        event_sender: &mpsc::Sender<MarketEvent>,
        is_connected: &AtomicBool,
    ) -> SessionEnd {
        let (mut write, mut read) = ws_stream.split();

        let status = loop {
            match read.next().await {
                Some(Ok(Message::Text(text))) => match parse_message(&text, Utc::now()) {
                    Ok(event) => {
                        if event_sender.send(event).await.is_err() {
                            return SessionEnd::ReceiverGone;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse message: {} - {}", e, text);
                    }
                },
                Some(Ok(Message::Ping(data))) => {
                    debug!("Received Ping, sending Pong");
                    if let Err(e) = write.send(Message::Pong(data)).await {
                        warn!(error = %e, "failed to answer ping");
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("WebSocket closed: {:?}", frame);
                    break ConnectionStatus::Disconnected(frame.map(|f| f.reason.to_string()));
                }
                Some(Err(e)) => {
                    error!("WebSocket error: {}", e);
                    break ConnectionStatus::Error(e.to_string());
                }
                None => {
                    info!("WebSocket stream ended");
                    break ConnectionStatus::Disconnected(None);
                }
                Some(Ok(_)) => {}
            }
        };

        is_connected.store(false, Ordering::SeqCst);
        if event_sender
            .send(MarketEvent::ConnectionStatus(status))
            .await
            .is_err()
        {
            return SessionEnd::ReceiverGone;
        }
        SessionEnd::Dropped
    }
}

impl Drop for BinanceWebSocket {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Parse one text frame into a market event.
///
/// Accepts combined-stream envelopes and bare payloads. Trade time comes
/// from the `T` field when present, otherwise `received_at`; depth is
/// stamped with `received_at`.
pub(crate) fn parse_message(text: &str, received_at: DateTime<Utc>) -> Result<MarketEvent> {
    let value: Value = serde_json::from_str(text)?;

    let (name, data) = if value.get("stream").is_some() && value.get("data").is_some() {
        let envelope: StreamEnvelope = serde_json::from_value(value)?;
        (envelope.stream, envelope.data)
    } else {
        let name = match value.get("e").and_then(Value::as_str) {
            Some(event_type) => event_type.to_string(),
            None if value.get("bids").is_some() && value.get("asks").is_some() => {
                "depth".to_string()
            }
            None => String::new(),
        };
        (name, value)
    };

    match StreamKind::classify(&name) {
        StreamKind::Trade => {
            let message: TradeMessage = serde_json::from_value(data)?;
            convert_trade(message, received_at).map(MarketEvent::Trade)
        }
        StreamKind::Depth => {
            let message: DepthMessage = serde_json::from_value(data)?;
            Ok(match convert_depth(&message, received_at)? {
                Some(depth) => MarketEvent::Depth(depth),
                None => MarketEvent::Raw {
                    message: text.to_string(),
                },
            })
        }
        StreamKind::Other => Ok(MarketEvent::Raw {
            message: text.to_string(),
        }),
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal> {
    raw.parse()
        .map_err(|e| ScalperError::InvalidResponse(format!("Invalid {} {:?}: {}", field, raw, e)))
}

fn convert_trade(message: TradeMessage, received_at: DateTime<Utc>) -> Result<TradeEvent> {
    let timestamp = message
        .trade_time
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or(received_at);

    Ok(TradeEvent::new(
        parse_decimal("price", &message.price)?,
        parse_decimal("quantity", &message.quantity)?,
        !message.buyer_is_maker,
        timestamp,
    ))
}

/// Top of book, or `None` when either side is empty
fn convert_depth(message: &DepthMessage, received_at: DateTime<Utc>) -> Result<Option<DepthSnapshot>> {
    let (Some(bid), Some(ask)) = (message.bids.first(), message.asks.first()) else {
        return Ok(None);
    };
    Ok(Some(DepthSnapshot::new(
        parse_decimal("bid", &bid[0])?,
        parse_decimal("ask", &ask[0])?,
        received_at,
    )))
}
