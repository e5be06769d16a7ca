//! Acquisition date windows relative to the fire date.

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SeverityError};

/// Half-open calendar window `[start, end)`.
///
/// Matches catalog date filtering: a scene acquired on `start` is included,
/// one acquired on `end` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Create a window, rejecting empty or inverted ranges.
    ///
    /// # Errors
    /// Returns [`SeverityError::InvalidConfig`] when `start >= end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start >= end {
            return Err(SeverityError::InvalidConfig(format!(
                "date window start {start} is not before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Window spanning `start_offset..end_offset` days around `anchor`.
    ///
    /// # Errors
    /// Returns [`SeverityError::InvalidConfig`] when the offsets overflow the
    /// calendar or produce an empty window.
    pub fn around(anchor: NaiveDate, start_offset: i64, end_offset: i64) -> Result<Self> {
        let start = shift(anchor, start_offset)?;
        let end = shift(anchor, end_offset)?;
        Self::new(start, end)
    }

    /// Whether `date` falls inside the window.
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Number of whole days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

fn shift(anchor: NaiveDate, days: i64) -> Result<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| anchor.checked_add_signed(delta))
        .ok_or_else(|| {
            SeverityError::InvalidConfig(format!("{days} days from {anchor} is out of range"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_pre_fire_window_offsets() {
        let w = DateWindow::around(date(2024, 5, 10), -40, -20).unwrap();
        assert_eq!(w.start, date(2024, 3, 31));
        assert_eq!(w.end, date(2024, 4, 20));
        assert_eq!(w.days(), 20);
    }

    #[test]
    fn test_post_fire_window_offsets() {
        let w = DateWindow::around(date(2024, 5, 10), 0, 61).unwrap();
        assert_eq!(w.start, date(2024, 5, 10));
        assert_eq!(w.end, date(2024, 7, 10));
    }

    #[test]
    fn test_window_is_half_open() {
        let w = DateWindow::new(date(2024, 1, 1), date(2024, 1, 3)).unwrap();
        assert!(w.contains(date(2024, 1, 1)));
        assert!(w.contains(date(2024, 1, 2)));
        assert!(!w.contains(date(2024, 1, 3)));
        assert!(!w.contains(date(2023, 12, 31)));
    }

    #[test]
    fn test_inverted_window_rejected() {
        assert!(DateWindow::new(date(2024, 1, 3), date(2024, 1, 3)).is_err());
        assert!(DateWindow::around(date(2024, 1, 3), 5, 1).is_err());
    }
}
