//! Wall-clock access for slugs and timestamps.
//!
//! The orchestrator never calls `Utc::now()` directly; it asks a `Clock`,
//! so tests can pin time and get reproducible slugs.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub at: DateTime<Utc>,
}

impl FixedClock {
    /// Frozen at the given Unix timestamp (seconds). Out-of-range values
    /// fall back to the epoch.
    pub fn at_unix(secs: i64) -> Self {
        Self {
            at: DateTime::from_timestamp(secs, 0).unwrap_or_default(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}
