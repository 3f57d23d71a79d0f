//! Strategy module for trade decision making
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    HOT PATH (sync)                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TradeEvent                        DepthSnapshot            │
//! │       │                                  │                  │
//! │       ▼                                  ▼                  │
//! │  SlidingNetVolume.add              SpreadGate.update_depth  │
//! │  GateTimers.record_activity                                 │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  StrategyEngine: Flat → entry gates │ Long/Short → exits    │
//! │       │                                                     │
//! │       ▼ (unbounded channel, fire-and-forget)                │
//! └───────┼─────────────────────────────────────────────────────┘
//!         ▼
//!   ExecutionCommand → dispatcher task → ExecutionAdapter
//! ```
//!
//! # Components
//!
//! - [`SlidingNetVolume`]: signed trade volume over a trailing window
//! - [`SpreadGate`]: best bid/ask spread admission filter
//! - [`GateTimers`]: cooldown after entry and activity recency
//! - [`StrategyEngine`]: the Flat/Long/Short state machine
//!
//! All timing uses event timestamps, never the wall clock.

mod engine;
mod gate_timers;
mod net_volume;
mod spread_gate;
mod traits;
mod types;

pub use engine::{pnl_ratio, stop_loss_hit, take_profit_hit, StrategyEngine};
pub use gate_timers::GateTimers;
pub use net_volume::SlidingNetVolume;
pub use spread_gate::SpreadGate;
pub use traits::{BoxedStrategy, Strategy};
pub use types::{ExitReason, PositionSide, PositionState, SessionStats, Transition};
