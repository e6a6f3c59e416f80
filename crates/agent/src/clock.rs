use chrono::{DateTime, FixedOffset};
use chowbot_core::heuristics;

/// Source of "now" for meal-period inference.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in Asia/Taipei.
#[derive(Clone, Copy, Debug, Default)]
pub struct TaipeiClock;

impl Clock for TaipeiClock {
    fn now(&self) -> DateTime<FixedOffset> {
        heuristics::taipei_now()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
