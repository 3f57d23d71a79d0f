use crate::common::errors::Result;
use crate::common::types::MarketEvent;
use crate::strategy::types::Transition;

/// Core strategy trait
///
/// Strategies receive market events on a single decision thread and report
/// the position change each event caused. They own their internal state
/// (windows, gates, position) and talk to execution only through commands.
///
/// # Implementation Notes
///
/// - `on_market_event` is the hot path: no blocking I/O, no awaiting
/// - A malformed event returns an error and must leave state untouched
/// - Callers must not invoke it concurrently
pub trait Strategy: Send {
    /// Unique identifier for this strategy
    fn name(&self) -> &str;

    /// Called when new market data arrives
    ///
    /// # Returns
    /// * `Ok(None)` - No position change
    /// * `Ok(Some(transition))` - An entry or exit was issued
    /// * `Err(_)` - The event was rejected
    fn on_market_event(&mut self, event: &MarketEvent) -> Result<Option<Transition>>;

    /// Called when the system is shutting down
    ///
    /// Use for cleanup and final reporting. Default implementation does nothing.
    fn on_shutdown(&mut self) {}
}

/// Boxed strategy for dynamic dispatch
pub type BoxedStrategy = Box<dyn Strategy>;
