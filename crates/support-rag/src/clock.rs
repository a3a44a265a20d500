//! Wall-clock capability. Injected so business-hours logic and generated
//! document ids are deterministic under test.

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

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Pin to the given UTC hour on 2024-01-15. Panics on an hour outside 0..24.
    #[cfg(test)]
    pub fn at_hour(hour: u32) -> Self {
        use chrono::TimeZone;
        Self(Utc.with_ymd_and_hms(2024, 1, 15, hour, 30, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
