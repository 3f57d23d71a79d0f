//! Dispatcher task that owns the execution adapter

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use super::ExecutionCommand;
use crate::common::errors::Result;
use crate::common::traits::ExecutionAdapter;

/// Upper bound on a single heartbeat check
pub const MAX_HEARTBEAT_BUDGET: Duration = Duration::from_secs(2);

/// Time a heartbeat may take before it counts as failed
pub fn heartbeat_budget(interval: Duration) -> Duration {
    (interval / 2).min(MAX_HEARTBEAT_BUDGET)
}

/// Run one command against the adapter
pub async fn execute<A>(adapter: &mut A, command: &ExecutionCommand) -> Result<()>
where
    A: ExecutionAdapter + ?Sized,
{
    match command {
        ExecutionCommand::PrepareEntryQty(qty) => adapter.prepare_next_entry_qty(*qty).await,
        ExecutionCommand::OpenLong => adapter.fast_click_long().await,
        ExecutionCommand::OpenShort => adapter.fast_click_short().await,
        ExecutionCommand::Settle => adapter.fast_click_settle().await,
    }
}

/// Replay engine commands in order until the command channel closes.
///
/// Adapter failures are logged and never fed back to the engine. Pending
/// commands always run before a heartbeat tick. Between commands the
/// adapter's heartbeat is polled every `heartbeat_interval` and cut off after
/// [`heartbeat_budget`]; losing or regaining liveness is logged once per change.
#[instrument(skip_all, fields(adapter = adapter.name()))]
pub async fn run_dispatcher<A>(
    adapter: &mut A,
    mut commands: mpsc::UnboundedReceiver<ExecutionCommand>,
    heartbeat_interval: Duration,
) where
    A: ExecutionAdapter + ?Sized,
{
    let mut heartbeat = interval_at(Instant::now() + heartbeat_interval, heartbeat_interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let budget = heartbeat_budget(heartbeat_interval);
    let mut alive = true;

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => {
                let Some(command) = command else {
                    info!("command channel closed, dispatcher stopping");
                    break;
                };
                debug!(command = %command, "dispatching");
                if let Err(e) = execute(adapter, &command).await {
                    error!(command = %command, error = %e, "execution command failed");
                }
            }
            _ = heartbeat.tick() => {
                let ok = match timeout(budget, adapter.heartbeat()).await {
                    Ok(ok) => ok,
                    Err(_) => {
                        debug!(budget_ms = budget.as_millis() as u64, "heartbeat timed out");
                        false
                    }
                };
                if ok != alive {
                    if ok {
                        info!("execution heartbeat restored");
                    } else {
                        warn!("execution heartbeat lost");
                    }
                    alive = ok;
                }
            }
        }
    }
}
