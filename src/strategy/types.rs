use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of an open position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

/// The single position the engine can hold.
///
/// Entry price and time exist only in the open variants, so a flat engine
/// can never carry a stale entry price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Long {
        entry_price: Decimal,
        entry_time: DateTime<Utc>,
    },
    Short {
        entry_price: Decimal,
        entry_time: DateTime<Utc>,
    },
}

impl PositionState {
    pub fn open(side: PositionSide, entry_price: Decimal, entry_time: DateTime<Utc>) -> Self {
        match side {
            PositionSide::Long => PositionState::Long {
                entry_price,
                entry_time,
            },
            PositionSide::Short => PositionState::Short {
                entry_price,
                entry_time,
            },
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    pub fn side(&self) -> Option<PositionSide> {
        match self {
            PositionState::Flat => None,
            PositionState::Long { .. } => Some(PositionSide::Long),
            PositionState::Short { .. } => Some(PositionSide::Short),
        }
    }

    pub fn entry_price(&self) -> Option<Decimal> {
        match self {
            PositionState::Flat => None,
            PositionState::Long { entry_price, .. } | PositionState::Short { entry_price, .. } => {
                Some(*entry_price)
            }
        }
    }

    pub fn entry_time(&self) -> Option<DateTime<Utc>> {
        match self {
            PositionState::Flat => None,
            PositionState::Long { entry_time, .. } | PositionState::Short { entry_time, .. } => {
                Some(*entry_time)
            }
        }
    }
}

/// Why a position was closed, in reporting precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Net volume swung against the position past the exit threshold
    Reversal,
    TakeProfit,
    StopLoss,
    MaxHold,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Reversal => write!(f, "reversal"),
            ExitReason::TakeProfit => write!(f, "take_profit"),
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::MaxHold => write!(f, "max_hold"),
        }
    }
}

/// A position change made while handling one trade
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Entered {
        side: PositionSide,
        price: Decimal,
        net_volume: Decimal,
        at: DateTime<Utc>,
    },
    Exited {
        side: PositionSide,
        entry_price: Decimal,
        exit_price: Decimal,
        /// Realized return, positive when the position made money
        pnl_ratio: Decimal,
        hold: Duration,
        reason: ExitReason,
        at: DateTime<Utc>,
    },
}

impl Transition {
    pub fn is_entry(&self) -> bool {
        matches!(self, Transition::Entered { .. })
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, Transition::Exited { .. })
    }
}

/// Round-trip statistics for the session; observability only
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub entries: u64,
    pub round_trips: u64,
    pub wins: u64,
    pub losses: u64,
    /// Sum of realized PnL ratios
    pub cumulative_pnl_ratio: Decimal,
    pub best_pnl_ratio: Option<Decimal>,
    pub worst_pnl_ratio: Option<Decimal>,
    pub rejected_trades: u64,
}

impl SessionStats {
    pub fn record_exit(&mut self, pnl_ratio: Decimal) {
        self.round_trips += 1;
        if pnl_ratio > Decimal::ZERO {
            self.wins += 1;
        } else if pnl_ratio < Decimal::ZERO {
            self.losses += 1;
        }
        self.cumulative_pnl_ratio += pnl_ratio;
        self.best_pnl_ratio = Some(self.best_pnl_ratio.map_or(pnl_ratio, |b| b.max(pnl_ratio)));
        self.worst_pnl_ratio = Some(self.worst_pnl_ratio.map_or(pnl_ratio, |w| w.min(pnl_ratio)));
    }

    /// Share of closed round trips that made money
    pub fn win_rate(&self) -> Option<Decimal> {
        if self.round_trips == 0 {
            return None;
        }
        Some(Decimal::from(self.wins) / Decimal::from(self.round_trips))
    }
}
