//! Time source collaborator
//!
//! Shift windows are evaluated against the caller's local hour and cache
//! validity against elapsed wall time, so both read time through this trait.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc};
use parking_lot::Mutex;

/// Supplies the current local time
pub trait Clock: Send + Sync {
    /// Current time in the caller's local offset
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current time in UTC
    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// Wall clock in the host's local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Local::now();
        now.with_timezone(now.offset())
    }
}

/// Manually driven clock for deterministic tests and replays
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    /// Clock frozen at `start`
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Clock frozen at `hour:00` local time on 2024-01-01 (UTC offset)
    pub fn at_hour(hour: u32) -> Self {
        let naive = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|date| date.and_hms_opt(hour % 24, 0, 0))
            .unwrap_or_default();
        Self::new(Utc.from_utc_datetime(&naive).with_timezone(&Utc.fix()))
    }

    /// Move the clock to an absolute time
    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock() = now;
    }

    /// Move the clock forward
    pub fn advance(&self, by: std::time::Duration) {
        let delta = Duration::milliseconds(by.as_millis() as i64);
        let mut now = self.now.lock();
        *now = *now + delta;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at_hour(0)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock()
    }
}
