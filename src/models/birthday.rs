use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BirthdayError {
    #[error("Month must be in 1..=12, got {0}")]
    InvalidMonth(u32),

    #[error("Day {day} is not valid for month {month}")]
    InvalidDay { day: u32, month: u32 },
}

/// A recurring birthday. The year is optional: many contact sources only know the day
/// and month.
///
/// Construct through [`Birthday::new`]; the recurrence functions assume the day is valid
/// for the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Birthday {
    day: u32,
    month: u32,
    year: Option<i32>,
}

impl Birthday {
    /// A year of `Some(0)` is treated as unknown.
    ///
    /// Feb 29 is accepted when the year is unknown or a leap year.
    pub fn new(day: u32, month: u32, year: Option<i32>) -> Result<Self, BirthdayError> {
        if !(1..=12).contains(&month) {
            return Err(BirthdayError::InvalidMonth(month));
        }

        let year = year.filter(|y| *y != 0);
        // 2000 is a leap year, so Feb 29 passes for year-less birthdays.
        let check_year = year.unwrap_or(2000);
        if day == 0 || day > days_in_month(check_year, month) {
            return Err(BirthdayError::InvalidDay { day, month });
        }

        Ok(Self { day, month, year })
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn is_leap_day(&self) -> bool {
        self.month == 2 && self.day == 29
    }

    /// The birthday's calendar date in `year`. A Feb 29 birthday lands on Feb 28 in
    /// non-leap years.
    pub fn in_year(&self, year: i32) -> NaiveDate {
        let day = self.day.min(days_in_month(year, self.month));
        // Only out-of-range years can fail here.
        NaiveDate::from_ymd_opt(year, self.month, day).unwrap_or(NaiveDate::MAX)
    }
}

pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

impl From<NaiveDate> for Birthday {
    fn from(value: NaiveDate) -> Self {
        Self {
            day: value.day(),
            month: value.month(),
            year: Some(value.year()),
        }
    }
}
