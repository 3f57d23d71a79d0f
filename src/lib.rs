//! Netflow Scalper Library
//!
//! A single-instrument scalper that enters on short-window net trade volume
//! behind a spread gate and cooldown timers, and exits on reversal,
//! take-profit, stop-loss or max hold.

pub mod binance;
pub mod common;
pub mod config;
pub mod execution;
pub mod strategy;
pub mod system;

// Re-export commonly used types
pub use common::errors::{Result, ScalperError};
pub use common::traits::{BoxedExecutionAdapter, ExecutionAdapter, MarketFeed};
pub use common::types::{ConnectionStatus, DepthSnapshot, MarketEvent, Side, TradeEvent};
pub use config::types::AppConfig;
pub use binance::BinanceFeed;
pub use execution::{DryRunAdapter, ExecutionCommand, RestAdapter, WebDriverAdapter};
pub use system::TradingSystem;

// Strategy types
pub use strategy::{
    BoxedStrategy, ExitReason, GateTimers, PositionSide, PositionState, SessionStats,
    SlidingNetVolume, SpreadGate, Strategy, StrategyEngine, Transition,
};
