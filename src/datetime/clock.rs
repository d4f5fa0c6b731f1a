//! Reference clock used to resolve relative dates
//!
//! Every `DateParser` owns a clock. The parser reads it once per public
//! call, so all relative computations in that call share one "now".

use chrono::{Local, NaiveDateTime};

/// Source of the current local wall-clock time
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the system's local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a single instant (for tests and reproducible runs)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        FixedClock(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
