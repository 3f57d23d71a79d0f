//! Collaborator traits at the edges of the strategy core

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use super::errors::Result;
use super::types::MarketEvent;

/// Trait for market data feeds
///
/// A feed parses venue messages into [`MarketEvent`]s and forwards them to a
/// single consumer. It must not deliver trade or depth events while
/// disconnected, and a malformed message must never stop it.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Start receiving messages and sending them to the provided channel
    ///
    /// This spawns an internal task that owns the connection (including
    /// reconnects) and forwards every parsed event.
    async fn start(&mut self, sender: mpsc::Sender<MarketEvent>) -> Result<()>;

    /// Stop the feed task and drop the connection
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if the feed is currently connected
    fn is_connected(&self) -> bool;

    /// Get the name of the venue
    fn venue_name(&self) -> &'static str;
}

/// Order execution capability set used by the decision loop
///
/// Commands are fire-and-forget from the engine's point of view: the
/// dispatcher logs failures, and position state is never rolled back.
/// `heartbeat` is advisory liveness only.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutionAdapter: Send {
    /// Stage the quantity used by the next open command
    async fn prepare_next_entry_qty(&mut self, qty: Decimal) -> Result<()>;

    /// Open a long position with the staged quantity
    async fn fast_click_long(&mut self) -> Result<()>;

    /// Open a short position with the staged quantity
    async fn fast_click_short(&mut self) -> Result<()>;

    /// Close whatever is open
    async fn fast_click_settle(&mut self) -> Result<()>;

    /// Whether the execution surface is responsive
    async fn heartbeat(&mut self) -> bool {
        true
    }

    /// Name used in logs
    fn name(&self) -> &'static str;
}

/// Boxed adapter for dynamic dispatch
pub type BoxedExecutionAdapter = Box<dyn ExecutionAdapter>;
