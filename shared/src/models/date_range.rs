//! Stay date ranges
//!
//! A stay occupies the nights from `start` up to, but not including, `end`.
//! Two stays conflict only when they share a night, so a guest may check in
//! on the day the previous guest checks out.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DateRangeError {
    #[error("end date {end} is not after start date {start}")]
    EndNotAfterStart { start: NaiveDate, end: NaiveDate },
}

/// Half-open `[start, end)` range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting empty and inverted ones
    ///
    /// A range holds at least one night. `start == end` would be a zero-night
    /// stay and is refused here, so no stored reservation or restriction is
    /// ever empty.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if end <= start {
            return Err(DateRangeError::EndNotAfterStart { start, end });
        }
        Ok(Self { start, end })
    }

    /// True when both ranges share at least one night
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// True when the night starting on `day` belongs to this range
    pub fn contains_night(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Every night of the range, in order
    pub fn nights_iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d < end)
    }

    /// Range covering exactly one night
    pub fn single_night(day: NaiveDate) -> Option<Self> {
        let end = day.checked_add_days(Days::new(1))?;
        Some(Self { start: day, end })
    }
}
