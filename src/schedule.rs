//! Send pacing with jitter.
//!
//! Independent senders sharing a channel spread their transmissions by deriving
//! the next interval from the current clock: `interval = now % window + base`.
//! With the defaults every node sends every 2 to 4 seconds at a phase that
//! depends on when it last sent.

use serde::{Deserialize, Serialize};

/// Jitter window and base interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub window_ms: u64,
    pub base_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            window_ms: 2_000,
            base_ms: 2_000,
        }
    }
}

/// Decides when the next send is due against a caller-supplied millisecond clock
#[derive(Debug, Clone)]
pub struct SendScheduler {
    config: ScheduleConfig,
    last_send_ms: Option<u64>,
    interval_ms: u64,
}

impl SendScheduler {
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            config,
            last_send_ms: None,
            interval_ms: 0,
        }
    }

    /// Returns `true` (and starts a new interval) when a send is due at `now_ms`.
    ///
    /// The first call is always due. A clock that moved backwards, for example a
    /// wrapped 32-bit tick counter, also counts as due.
    pub fn due(&mut self, now_ms: u64) -> bool {
        let due = match self.last_send_ms {
            None => true,
            Some(last) if now_ms < last => true,
            Some(last) => now_ms - last > self.interval_ms,
        };

        if due {
            self.last_send_ms = Some(now_ms);
            let jitter = now_ms.checked_rem(self.config.window_ms).unwrap_or(0);
            self.interval_ms = jitter + self.config.base_ms;
        }
        due
    }

    /// Interval until the next send, as chosen by the last due call
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

impl Default for SendScheduler {
    fn default() -> Self {
        Self::new(ScheduleConfig::default())
    }
}
