//! Recurring calendar-date send windows.
//!
//! A send window gates whether a step may be dispatched "today", ignoring
//! year and time-of-day. Windows may wrap the new-year boundary
//! (e.g. 11-01 .. 02-28 covers November through late February of any year).

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A month/day pair without a year, in `"MM-DD"` wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthDay {
    month: u32,
    day: u32,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MonthDayError {
    #[error("month-day must be formatted as MM-DD")]
    Malformed,
    #[error("month {0} out of range")]
    MonthOutOfRange(u32),
    #[error("day {0} out of range")]
    DayOutOfRange(u32),
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Result<Self, MonthDayError> {
        if !(1..=12).contains(&month) {
            return Err(MonthDayError::MonthOutOfRange(month));
        }
        // Day 29 in February is permitted; on non-leap years it simply never
        // equals "today".
        if !(1..=31).contains(&day) {
            return Err(MonthDayError::DayOutOfRange(day));
        }
        Ok(Self { month, day })
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn day(self) -> u32 {
        self.day
    }

    /// Comparable ordinal: `month * 100 + day` (15 June = 615).
    pub fn code(self) -> u32 {
        self.month * 100 + self.day
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }
}

impl FromStr for MonthDay {
    type Err = MonthDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month, day) = s.split_once('-').ok_or(MonthDayError::Malformed)?;
        let month: u32 = month.parse().map_err(|_| MonthDayError::Malformed)?;
        let day: u32 = day.parse().map_err(|_| MonthDayError::Malformed)?;
        Self::new(month, day)
    }
}

impl TryFrom<String> for MonthDay {
    type Error = MonthDayError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MonthDay> for String {
    fn from(md: MonthDay) -> Self {
        md.to_string()
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// A recurring, inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendWindow {
    pub start: MonthDay,
    pub end: MonthDay,
}

impl SendWindow {
    pub fn new(start: MonthDay, end: MonthDay) -> Self {
        Self { start, end }
    }

    /// Whether `date` falls inside the window, ignoring its year.
    ///
    /// When `start <= end` the window lies within a single year; when
    /// `start > end` it wraps the new-year boundary and membership is
    /// `today >= start || today <= end`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        let today = MonthDay::from_date(date).code();
        let start = self.start.code();
        let end = self.end.code();
        if start <= end {
            start <= today && today <= end
        } else {
            today >= start || today <= end
        }
    }
}
