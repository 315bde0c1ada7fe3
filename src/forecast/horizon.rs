use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::error::ForecastError;

/// Shortest forecast horizon, in months
pub const MIN_HORIZON: i32 = 1;

/// Longest forecast horizon, in months
pub const MAX_HORIZON: i32 = 12;

/// What a series does with a horizon outside `MIN_HORIZON..=MAX_HORIZON`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizonPolicy {
    /// The whole request is rejected
    Mandatory,
    /// Only this variable degrades to unavailable
    Optional,
}

/// Calendar month a forecast is requested for (day fixed to the 1st)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TargetMonth {
    date: NaiveDate,
}

impl TargetMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|date| Self { date })
    }

    /// Parse a `YYYY-MM` string
    pub fn parse(raw: &str) -> Result<Self, ForecastError> {
        let trimmed = raw.trim();
        NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
            .map(|date| Self { date })
            .map_err(|_| ForecastError::InvalidDate(raw.to_string()))
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.date
    }
}

impl FromStr for TargetMonth {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl Serialize for TargetMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Whole months from a series anchor to the target month.
///
/// Only year and month take part; the anchor's day is ignored.
pub fn horizon(target: TargetMonth, anchor: NaiveDate) -> i32 {
    (target.year() - anchor.year()) * 12 + (target.month() as i32 - anchor.month() as i32)
}

/// Number of forecast steps for a horizon, or `None` when it is out of bounds
pub fn forecast_steps(horizon: i32) -> Option<usize> {
    (MIN_HORIZON..=MAX_HORIZON)
        .contains(&horizon)
        .then_some(horizon as usize)
}
