//! `HH:MM` delay specs for job creation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

use super::errors::SchedError;

/// A relative delay, `hours:minutes`, both non-negative integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelaySpec {
    pub hours: u32,
    pub minutes: u32,
}

impl DelaySpec {
    pub fn total_minutes(&self) -> i64 {
        i64::from(self.hours) * 60 + i64::from(self.minutes)
    }

    /// `now + hours*60 + minutes` minutes; `InvalidInput` if that leaves the
    /// representable date range.
    pub fn scheduled_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, SchedError> {
        now.checked_add_signed(Duration::minutes(self.total_minutes()))
            .ok_or_else(|| SchedError::InvalidInput(format!("schedule {self} is out of range")))
    }
}

impl FromStr for DelaySpec {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SchedError::InvalidInput(format!("schedule must be HH:MM, got {s:?}"));

        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let part = |p: &str| -> Result<u32, SchedError> {
            // u32::from_str accepts a leading '+', which is not allowed here.
            if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            p.parse::<u32>().map_err(|_| invalid())
        };

        Ok(Self {
            hours: part(h)?,
            minutes: part(m)?,
        })
    }
}

impl fmt::Display for DelaySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours, self.minutes)
    }
}
