//! Entry throttling: cooldown after an entry and trade-activity recency

use chrono::{DateTime, Duration, Utc};

/// Cooldown and activity timestamps that throttle entries.
///
/// On the trade path [`record_activity`](Self::record_activity) normally runs
/// right before [`can_enter`](Self::can_enter), which makes the recency
/// condition always true there. It only bites when entry is checked before
/// the current trade is recorded, or from another path.
#[derive(Debug, Clone, PartialEq)]
pub struct GateTimers {
    activity_window: Duration,
    cooldown: Duration,
    cooldown_until: Option<DateTime<Utc>>,
    last_activity: Option<DateTime<Utc>>,
    last_entry: Option<DateTime<Utc>>,
}

impl GateTimers {
    pub fn new(activity_window: Duration, cooldown: Duration) -> Self {
        Self {
            activity_window,
            cooldown,
            cooldown_until: None,
            last_activity: None,
            last_entry: None,
        }
    }

    pub fn record_activity(&mut self, now: DateTime<Utc>) {
        self.last_activity = Some(now);
    }

    /// Cooldown has expired and the last activity is within the window.
    /// False until some activity has been recorded.
    pub fn can_enter(&self, now: DateTime<Utc>) -> bool {
        let cooled_down = self.cooldown_until.map_or(true, |until| now >= until);
        let active = self
            .last_activity
            .map_or(false, |ts| now - ts <= self.activity_window);
        cooled_down && active
    }

    /// Start the cooldown for an entry made at `now`
    pub fn arm_cooldown(&mut self, now: DateTime<Utc>) {
        self.cooldown_until = Some(now + self.cooldown);
        self.last_entry = Some(now);
    }

    pub fn cooldown_until(&self) -> Option<DateTime<Utc>> {
        self.cooldown_until
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_activity
    }

    pub fn last_entry(&self) -> Option<DateTime<Utc>> {
        self.last_entry
    }
}
