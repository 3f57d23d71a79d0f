//! Channel type definitions for inter-task communication

use tokio::sync::mpsc;

use super::types::MarketEvent;
use crate::execution::ExecutionCommand;

/// Default channel buffer size
pub const DEFAULT_CHANNEL_SIZE: usize = 1000;

/// Create a new market event channel with a custom buffer size
pub fn create_event_channel_with_size(
    size: usize,
) -> (mpsc::Sender<MarketEvent>, mpsc::Receiver<MarketEvent>) {
    mpsc::channel(size)
}

/// Create the engine → dispatcher command channel
///
/// Unbounded so that issuing a command never blocks the decision loop.
pub fn create_command_channel() -> (
    mpsc::UnboundedSender<ExecutionCommand>,
    mpsc::UnboundedReceiver<ExecutionCommand>,
) {
    mpsc::unbounded_channel()
}
