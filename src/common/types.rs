//! Unified types shared by the feed, the strategy core and the execution layer

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::{Result, ScalperError};

/// Aggressor side of a trade print
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Side from a taker-buy flag
    pub fn from_taker_buy(is_buy: bool) -> Self {
        if is_buy {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Buy)
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// A single trade print
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Execution price
    pub price: Decimal,
    /// Trade size
    pub quantity: Decimal,
    /// Side of the taker (Buy adds to net volume, Sell subtracts)
    pub side: Side,
    /// Exchange trade time, or receive time when the venue omits it
    pub timestamp: DateTime<Utc>,
}

impl TradeEvent {
    pub fn new(price: Decimal, quantity: Decimal, is_buy: bool, timestamp: DateTime<Utc>) -> Self {
        Self {
            price,
            quantity,
            side: Side::from_taker_buy(is_buy),
            timestamp,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.side.is_buy()
    }

    /// Reject prints that must never reach the volume window or position state
    pub fn validate(&self) -> Result<()> {
        if self.price <= Decimal::ZERO {
            return Err(ScalperError::InvalidInput(format!(
                "non-positive trade price {}",
                self.price
            )));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(ScalperError::InvalidInput(format!(
                "non-positive trade quantity {}",
                self.quantity
            )));
        }
        Ok(())
    }
}

/// Top-of-book snapshot. Zero on either side means unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    pub best_bid: Decimal,
    pub best_ask: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl DepthSnapshot {
    pub fn new(best_bid: Decimal, best_ask: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            best_bid,
            best_ask,
            timestamp,
        }
    }
}

/// Connection status for a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Successfully connected
    Connected,
    /// Disconnected (with optional reason)
    Disconnected(Option<String>),
    /// Attempting to reconnect
    Reconnecting { attempt: u32 },
    /// Connection error
    Error(String),
}

/// Unified market event delivered to the decision loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarketEvent {
    /// Trade print
    Trade(TradeEvent),
    /// Best bid/ask snapshot
    Depth(DepthSnapshot),
    /// Connection status change
    ConnectionStatus(ConnectionStatus),
    /// Raw/unknown message (for debugging)
    Raw { message: String },
}

impl MarketEvent {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            MarketEvent::Trade(_) => "trade",
            MarketEvent::Depth(_) => "depth",
            MarketEvent::ConnectionStatus(_) => "connection_status",
            MarketEvent::Raw { .. } => "raw",
        }
    }
}
