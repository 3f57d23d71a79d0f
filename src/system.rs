//! Process orchestration: feed → decision loop → dispatcher → adapter

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::binance::BinanceFeed;
use crate::common::channels::{create_command_channel, create_event_channel_with_size};
use crate::common::errors::Result;
use crate::common::traits::MarketFeed;
use crate::common::types::MarketEvent;
use crate::config::types::AppConfig;
use crate::execution::{build_adapter, run_dispatcher};
use crate::strategy::{BoxedStrategy, Strategy, StrategyEngine, Transition};

/// How long shutdown waits for queued commands to reach the adapter
const DISPATCHER_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Counters from one run of the decision loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub events: u64,
    pub transitions: u64,
    pub rejected: u64,
}

/// Owns the configuration and wires every component together
pub struct TradingSystem {
    config: AppConfig,
}

impl TradingSystem {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run against the Binance feed until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        let mut feed = BinanceFeed::new(&self.config.feed, &self.config.settings);
        info!(url = %feed.url(), "market data feed configured");

        self.run_with_feed(&mut feed, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run against any feed until `shutdown` resolves or the feed goes away
    pub async fn run_with_feed<F, S>(&self, feed: &mut F, shutdown: S) -> Result<()>
    where
        F: MarketFeed + ?Sized,
        S: Future<Output = ()>,
    {
        self.log_banner();

        let mut adapter = build_adapter(&self.config.execution, &self.config.settings).await?;
        let (command_tx, command_rx) = create_command_channel();
        let heartbeat = Duration::from_secs(self.config.settings.heartbeat_interval_seconds.max(1));
        let dispatcher = tokio::spawn(async move {
            run_dispatcher(adapter.as_mut(), command_rx, heartbeat).await;
        });

        let mut strategy: BoxedStrategy =
            Box::new(StrategyEngine::new(self.config.strategy.clone(), command_tx));
        info!(strategy = strategy.name(), "strategy ready");

        let (event_tx, mut event_rx) = create_event_channel_with_size(self.config.settings.channel_size);
        feed.start(event_tx).await?;
        info!(venue = feed.venue_name(), "feed started");

        let summary = drive_strategy(strategy.as_mut(), &mut event_rx, shutdown).await;
        info!(
            events = summary.events,
            transitions = summary.transitions,
            rejected = summary.rejected,
            "decision loop stopped"
        );

        strategy.on_shutdown();
        feed.disconnect().await?;

        // Dropping the engine closes the command channel; let queued commands drain.
        drop(strategy);
        match tokio::time::timeout(DISPATCHER_DRAIN_TIMEOUT, dispatcher).await {
            Ok(Ok(())) => debug!("dispatcher drained"),
            Ok(Err(e)) => warn!(error = %e, "dispatcher task failed"),
            Err(_) => warn!("dispatcher did not drain in time"),
        }

        Ok(())
    }

    fn log_banner(&self) {
        let strategy = &self.config.strategy;
        info!(
            symbol = %self.config.feed.symbol,
            entry = %strategy.entry_threshold,
            exit = %strategy.exit_threshold,
            spread_tight = %strategy.spread_tight,
            "netflow scalper starting"
        );
        info!(
            take_profit = %strategy.take_profit_pct,
            stop_loss = %strategy.stop_loss_pct,
            max_hold_secs = strategy.max_hold_secs,
            "exit rules"
        );
        info!(
            volume_window_secs = strategy.volume_window_secs,
            activity_window_secs = strategy.activity_window_secs,
            cooldown_secs = strategy.cooldown_secs,
            burst_window_secs = strategy.burst_window_secs,
            check_gate_before_activity = strategy.check_gate_before_activity,
            "gates"
        );
        info!(
            qty = %strategy.order_qty,
            mode = %self.config.execution.mode,
            "execution"
        );
    }
}

/// Feed events to `strategy` one at a time until `shutdown` resolves or the
/// event channel closes.
///
/// Single consumer: this is the only place the strategy is called from.
pub async fn drive_strategy<S, F>(
    strategy: &mut S,
    events: &mut mpsc::Receiver<MarketEvent>,
    shutdown: F,
) -> LoopSummary
where
    S: Strategy + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut summary = LoopSummary::default();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Received shutdown signal, cleaning up...");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    warn!("market event channel closed");
                    break;
                };
                summary.events += 1;

                match strategy.on_market_event(&event) {
                    Ok(Some(transition)) => {
                        summary.transitions += 1;
                        log_transition(&transition);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        summary.rejected += 1;
                        warn!(kind = event.kind(), error = %e, "market event rejected");
                    }
                }
            }
        }
    }

    summary
}

fn log_transition(transition: &Transition) {
    match transition {
        Transition::Entered { side, price, .. } => {
            debug!(side = %side, price = %price, "transition: entered")
        }
        Transition::Exited { side, reason, .. } => {
            debug!(side = %side, reason = %reason, "transition: exited")
        }
    }
}
