//! Cooldown between fired notifications.

use std::time::{Duration, Instant};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone)]
pub struct NotificationGate {
    cooldown: Duration,
    last_fired: Option<Instant>,
}

impl NotificationGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: None,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Whether a notification at `now` is outside the cooldown window.
    ///
    /// Does not update state; call [`record`](Self::record) once the
    /// notification is actually acted on.
    pub fn allow(&self, now: Instant) -> bool {
        match self.last_fired {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.cooldown,
        }
    }

    pub fn record(&mut self, now: Instant) {
        self.last_fired = Some(now);
    }

    /// `allow` and `record` as one step.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        if self.allow(now) {
            self.record(now);
            true
        } else {
            false
        }
    }
}

impl Default for NotificationGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}
