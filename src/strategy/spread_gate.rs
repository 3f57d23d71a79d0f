//! Best bid/ask spread gate for entries

use rust_decimal::Decimal;

/// Admission filter on the best bid/ask spread.
///
/// Depth is overwritten unconditionally; there is no staleness check.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadGate {
    tight_threshold: Decimal,
    last_bid: Decimal,
    last_ask: Decimal,
}

impl SpreadGate {
    pub fn new(tight_threshold: Decimal) -> Self {
        Self {
            tight_threshold,
            last_bid: Decimal::ZERO,
            last_ask: Decimal::ZERO,
        }
    }

    pub fn update_depth(&mut self, bid: Decimal, ask: Decimal) {
        self.last_bid = bid;
        self.last_ask = ask;
    }

    /// True iff both sides are known (> 0) and `ask - bid <= threshold`
    pub fn is_tight(&self) -> bool {
        match self.spread() {
            Some(spread) => spread <= self.tight_threshold,
            None => false,
        }
    }

    /// Current spread, if both sides are known
    pub fn spread(&self) -> Option<Decimal> {
        if self.last_bid <= Decimal::ZERO || self.last_ask <= Decimal::ZERO {
            return None;
        }
        Some(self.last_ask - self.last_bid)
    }

    pub fn best_bid(&self) -> Decimal {
        self.last_bid
    }

    pub fn best_ask(&self) -> Decimal {
        self.last_ask
    }
}
