//! Per-day sequence numbers for property codes.

use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Issues 1, 2, 3, … for each calendar day independently.
#[derive(Debug, Default)]
pub struct CodeSequence {
    counters: Mutex<HashMap<NaiveDate, u32>>,
}

impl CodeSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next number for `date`.
    pub fn next(&self, date: NaiveDate) -> u32 {
        let mut counters = self.counters.lock();
        let counter = counters.entry(date).or_insert(0);
        *counter = counter.saturating_add(1);
        let issued = *counter;
        drop(counters);
        issued
    }
}
