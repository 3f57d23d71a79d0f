//! Binance market-data feed

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use super::messages::combined_stream_url;
use super::websocket::BinanceWebSocket;
use crate::common::errors::Result;
use crate::common::traits::MarketFeed;
use crate::common::types::MarketEvent;
use crate::config::types::{AppSettings, FeedConfig};

/// Trade and depth feed for one symbol over the combined stream endpoint
pub struct BinanceFeed {
    url: String,
    reconnect_delay: Duration,
    max_reconnect_attempts: u32,
    /// WebSocket client (created on start)
    ws_client: Option<BinanceWebSocket>,
}

impl BinanceFeed {
    pub fn new(config: &FeedConfig, settings: &AppSettings) -> Self {
        Self {
            url: combined_stream_url(&config.websocket_url, &config.symbol, &config.streams),
            reconnect_delay: Duration::from_millis(settings.reconnect_delay_ms),
            max_reconnect_attempts: settings.max_reconnect_attempts,
            ws_client: None,
        }
    }

    /// Combined stream URL this feed subscribes to
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MarketFeed for BinanceFeed {
    #[instrument(skip(self, sender))]
    async fn start(&mut self, sender: mpsc::Sender<MarketEvent>) -> Result<()> {
        let mut ws_client = BinanceWebSocket::new(self.url.clone())
            .with_reconnect(self.reconnect_delay, self.max_reconnect_attempts);
        ws_client.connect(sender).await?;
        self.ws_client = Some(ws_client);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut ws_client) = self.ws_client.take() {
            ws_client.disconnect();
        }
        info!("Disconnected from Binance");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.ws_client
            .as_ref()
            .map(|ws| ws.is_connected())
            .unwrap_or(false)
    }

    fn venue_name(&self) -> &'static str {
        "Binance"
    }
}
