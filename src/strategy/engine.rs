//! Net-volume scalping state machine

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use super::gate_timers::GateTimers;
use super::net_volume::SlidingNetVolume;
use super::spread_gate::SpreadGate;
use super::traits::Strategy;
use super::types::{ExitReason, PositionSide, PositionState, SessionStats, Transition};
use crate::common::errors::Result;
use crate::common::types::{DepthSnapshot, MarketEvent, TradeEvent};
use crate::config::types::StrategyConfig;
use crate::execution::ExecutionCommand;

/// Realized return of a position closed at `price`; positive is profit
pub fn pnl_ratio(side: PositionSide, entry_price: Decimal, price: Decimal) -> Decimal {
    let change = price / entry_price - Decimal::ONE;
    match side {
        PositionSide::Long => change,
        PositionSide::Short => -change,
    }
}

pub fn take_profit_hit(
    side: PositionSide,
    entry_price: Decimal,
    price: Decimal,
    take_profit_pct: Decimal,
) -> bool {
    let gain = match side {
        PositionSide::Long => price / entry_price - Decimal::ONE,
        PositionSide::Short => entry_price / price - Decimal::ONE,
    };
    gain >= take_profit_pct
}

pub fn stop_loss_hit(
    side: PositionSide,
    entry_price: Decimal,
    price: Decimal,
    stop_loss_pct: Decimal,
) -> bool {
    let adverse = match side {
        PositionSide::Long => entry_price / price - Decimal::ONE,
        PositionSide::Short => price / entry_price - Decimal::ONE,
    };
    adverse >= stop_loss_pct
}

/// Decides entries and exits for a single instrument from trade and depth
/// events.
///
/// Not internally synchronized: callers must serialize `on_trade` and
/// `on_depth`. Timers are evaluated lazily, so cooldown and max-hold expiry
/// are only noticed when the next trade arrives. Commands go out on an
/// unbounded channel and position state is updated without waiting for a
/// fill.
pub struct StrategyEngine {
    config: StrategyConfig,
    net_volume: SlidingNetVolume,
    spread_gate: SpreadGate,
    timers: GateTimers,
    position: PositionState,
    commands: mpsc::UnboundedSender<ExecutionCommand>,
    stats: SessionStats,
}

impl StrategyEngine {
    pub fn new(config: StrategyConfig, commands: mpsc::UnboundedSender<ExecutionCommand>) -> Self {
        Self {
            net_volume: SlidingNetVolume::new(config.volume_window()),
            spread_gate: SpreadGate::new(config.spread_tight),
            timers: GateTimers::new(config.activity_window(), config.cooldown()),
            position: PositionState::Flat,
            commands,
            stats: SessionStats::default(),
            config,
        }
    }

    /// Handle one trade print. Returns the position change it caused, if any.
    ///
    /// A malformed print is rejected before it touches any state.
    pub fn on_trade(&mut self, trade: &TradeEvent) -> Result<Option<Transition>> {
        if let Err(e) = trade.validate() {
            self.stats.rejected_trades += 1;
            return Err(e);
        }

        let now = trade.timestamp;
        self.net_volume.add(now, trade.quantity, trade.side);

        let gate_before_activity = self
            .config
            .check_gate_before_activity
            .then(|| self.timers.can_enter(now));
        self.timers.record_activity(now);

        let net = self.net_volume.sum(now);

        let transition = match self.position {
            PositionState::Flat => {
                let timers_open = gate_before_activity.unwrap_or_else(|| self.timers.can_enter(now));
                self.evaluate_entry(trade.price, net, timers_open, now)
            }
            PositionState::Long {
                entry_price,
                entry_time,
            } => self
                .exit_reason(PositionSide::Long, entry_price, entry_time, trade.price, net, now)
                .map(|reason| {
                    self.exit(PositionSide::Long, entry_price, entry_time, trade.price, reason, now)
                }),
            PositionState::Short {
                entry_price,
                entry_time,
            } => self
                .exit_reason(PositionSide::Short, entry_price, entry_time, trade.price, net, now)
                .map(|reason| {
                    self.exit(PositionSide::Short, entry_price, entry_time, trade.price, reason, now)
                }),
        };

        Ok(transition)
    }

    /// Overwrite the spread gate's top of book. Never changes position state.
    pub fn on_depth(&mut self, depth: &DepthSnapshot) {
        trace!(bid = %depth.best_bid, ask = %depth.best_ask, "depth update");
        self.spread_gate.update_depth(depth.best_bid, depth.best_ask);
    }

    fn evaluate_entry(
        &mut self,
        price: Decimal,
        net: Decimal,
        timers_open: bool,
        now: DateTime<Utc>,
    ) -> Option<Transition> {
        let threshold = self.config.entry_threshold;
        let side = if net >= threshold {
            PositionSide::Long
        } else if net <= -threshold {
            PositionSide::Short
        } else {
            return None;
        };

        if !self.spread_gate.is_tight() {
            debug!(net_volume = %net, spread = ?self.spread_gate.spread(), "entry signal blocked by spread gate");
            return None;
        }
        if !timers_open {
            debug!(
                net_volume = %net,
                cooldown_until = ?self.timers.cooldown_until(),
                "entry signal blocked by gate timers"
            );
            return None;
        }

        Some(self.enter(side, price, net, now))
    }

    /// First matching exit condition in precedence order
    fn exit_reason(
        &self,
        side: PositionSide,
        entry_price: Decimal,
        entry_time: DateTime<Utc>,
        price: Decimal,
        net: Decimal,
        now: DateTime<Utc>,
    ) -> Option<ExitReason> {
        let exit_threshold = self.config.exit_threshold;
        let reversal = match side {
            PositionSide::Long => net <= -exit_threshold,
            PositionSide::Short => net >= exit_threshold,
        };

        if reversal {
            Some(ExitReason::Reversal)
        } else if take_profit_hit(side, entry_price, price, self.config.take_profit_pct) {
            Some(ExitReason::TakeProfit)
        } else if stop_loss_hit(side, entry_price, price, self.config.stop_loss_pct) {
            Some(ExitReason::StopLoss)
        } else if now - entry_time >= self.config.max_hold() {
            Some(ExitReason::MaxHold)
        } else {
            None
        }
    }

    fn enter(
        &mut self,
        side: PositionSide,
        price: Decimal,
        net: Decimal,
        now: DateTime<Utc>,
    ) -> Transition {
        info!(
            side = %side,
            entry = %price,
            net_volume = %net,
            qty = %self.config.order_qty,
            "[ENTER]"
        );

        self.dispatch(ExecutionCommand::PrepareEntryQty(self.config.order_qty));
        self.dispatch(match side {
            PositionSide::Long => ExecutionCommand::OpenLong,
            PositionSide::Short => ExecutionCommand::OpenShort,
        });

        self.position = PositionState::open(side, price, now);
        self.timers.arm_cooldown(now);
        self.stats.entries += 1;

        Transition::Entered {
            side,
            price,
            net_volume: net,
            at: now,
        }
    }

    fn exit(
        &mut self,
        side: PositionSide,
        entry_price: Decimal,
        entry_time: DateTime<Utc>,
        price: Decimal,
        reason: ExitReason,
        now: DateTime<Utc>,
    ) -> Transition {
        let pnl = pnl_ratio(side, entry_price, price);
        let hold = now - entry_time;
        info!(
            side = %side,
            reason = %reason,
            entry = %entry_price,
            exit = %price,
            pnl_pct = %(pnl * Decimal::ONE_HUNDRED).round_dp(3),
            hold_ms = hold.num_milliseconds(),
            "[EXIT]"
        );

        self.dispatch(ExecutionCommand::Settle);

        self.position = PositionState::Flat;
        self.stats.record_exit(pnl);

        Transition::Exited {
            side,
            entry_price,
            exit_price: price,
            pnl_ratio: pnl,
            hold,
            reason,
            at: now,
        }
    }

    fn dispatch(&self, command: ExecutionCommand) {
        if let Err(e) = self.commands.send(command) {
            error!(command = ?e.0, "execution dispatcher is gone, command dropped");
        }
    }

    pub fn position(&self) -> PositionState {
        self.position
    }

    pub fn spread_gate(&self) -> &SpreadGate {
        &self.spread_gate
    }

    pub fn timers(&self) -> &GateTimers {
        &self.timers
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Net volume over the window ending at `now`
    pub fn net_volume(&mut self, now: DateTime<Utc>) -> Decimal {
        self.net_volume.sum(now)
    }

    /// How long the open position has been held as of `now`
    pub fn holding_for(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.position.entry_time().map(|t| now - t)
    }
}

impl Strategy for StrategyEngine {
    fn name(&self) -> &str {
        "netflow_scalper"
    }

    fn on_market_event(&mut self, event: &MarketEvent) -> Result<Option<Transition>> {
        match event {
            MarketEvent::Trade(trade) => self.on_trade(trade),
            MarketEvent::Depth(depth) => {
                self.on_depth(depth);
                Ok(None)
            }
            MarketEvent::ConnectionStatus(status) => {
                info!(?status, "feed connection status changed");
                Ok(None)
            }
            MarketEvent::Raw { message } => {
                trace!(message = %message, "ignoring raw feed message");
                Ok(None)
            }
        }
    }

    fn on_shutdown(&mut self) {
        let stats = &self.stats;
        info!(
            entries = stats.entries,
            round_trips = stats.round_trips,
            wins = stats.wins,
            losses = stats.losses,
            cumulative_pnl_pct = %(stats.cumulative_pnl_ratio * Decimal::ONE_HUNDRED).round_dp(3),
            rejected_trades = stats.rejected_trades,
            "session summary"
        );
        if let Some(side) = self.position.side() {
            warn!(
                side = %side,
                entry = ?self.position.entry_price(),
                "shutting down with an open position"
            );
        }
    }
}
