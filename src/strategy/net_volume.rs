//! Time-windowed net trade volume

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;

use crate::common::types::Side;

/// A signed volume sample inside the window
#[derive(Debug, Clone, Copy, PartialEq)]
struct SignedSample {
    ts: DateTime<Utc>,
    signed_qty: Decimal,
}

/// Sum of signed trade quantity (buys positive, sells negative) over the last
/// `window` of event time.
///
/// Samples are appended in arrival order and evicted from the front once they
/// are older than `now - window`. A sample stamped exactly at the cutoff still
/// counts. Timestamps are expected to be non-decreasing; a sample that arrives
/// out of order is still ignored by [`sum`](Self::sum) once it falls outside
/// the window, even if it is not at the front yet.
#[derive(Debug, Clone)]
pub struct SlidingNetVolume {
    window: Duration,
    samples: VecDeque<SignedSample>,
}

impl SlidingNetVolume {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    /// Record a sample at `ts` and evict stale ones.
    ///
    /// A non-positive quantity is never admitted; the call is a no-op and
    /// returns `false`.
    pub fn add(&mut self, ts: DateTime<Utc>, quantity: Decimal, side: Side) -> bool {
        if quantity <= Decimal::ZERO {
            return false;
        }
        let signed_qty = match side {
            Side::Buy => quantity,
            Side::Sell => -quantity,
        };
        self.samples.push_back(SignedSample { ts, signed_qty });
        self.evict(ts);
        true
    }

    /// Net signed volume inside the window ending at `now`
    pub fn sum(&mut self, now: DateTime<Utc>) -> Decimal {
        self.evict(now);
        let cutoff = now - self.window;
        self.samples
            .iter()
            .filter(|s| s.ts >= cutoff)
            .map(|s| s.signed_qty)
            .sum()
    }

    fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while let Some(front) = self.samples.front() {
            if front.ts < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of samples currently retained
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
