//! Calendar arithmetic for recurring birthdays.
//!
//! Every function takes `today` explicitly and does no I/O. A Feb 29 birthday occurs on
//! Feb 28 in non-leap years.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use crate::models::Birthday;

/// Days after an occurrence during which it still counts as "recently passed".
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// The occurrence on or after `today`.
pub fn next_occurrence(birthday: &Birthday, today: NaiveDate) -> NaiveDate {
    let this_year = birthday.in_year(today.year());
    if this_year < today {
        birthday.in_year(today.year() + 1)
    } else {
        this_year
    }
}

/// Zero when the birthday is today.
pub fn days_until(birthday: &Birthday, today: NaiveDate) -> i64 {
    (next_occurrence(birthday, today) - today).num_days()
}

/// The occurrence on or before `today`.
pub fn previous_occurrence(birthday: &Birthday, today: NaiveDate) -> NaiveDate {
    let this_year = birthday.in_year(today.year());
    if this_year <= today {
        this_year
    } else {
        birthday.in_year(today.year() - 1)
    }
}

/// Days since the most recent occurrence when that is within the last
/// [`RECENT_WINDOW_DAYS`] days, otherwise 0. A birthday falling today also yields 0; use
/// [`days_until`] to detect that case.
pub fn days_since(birthday: &Birthday, today: NaiveDate) -> i64 {
    let elapsed = (today - previous_occurrence(birthday, today)).num_days();
    if (1..=RECENT_WINDOW_DAYS).contains(&elapsed) {
        elapsed
    } else {
        0
    }
}

/// Decides whether a stored birth year is real enough to show (and to compute ages from).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearDisplayPolicy {
    pub max_age: i32,
    /// Placeholder years some contact sources write when the year is unknown.
    pub excluded_years: BTreeSet<i32>,
}

impl YearDisplayPolicy {
    pub const DEFAULT_MAX_AGE: i32 = 120;
    pub const DEFAULT_EXCLUDED_YEARS: [i32; 4] = [1, 1604, 1900, 1904];

    pub fn new(max_age: i32, excluded_years: impl IntoIterator<Item = i32>) -> Self {
        Self {
            max_age,
            excluded_years: excluded_years.into_iter().collect(),
        }
    }

    pub fn should_display_year(&self, year: i32, today: NaiveDate) -> bool {
        if year <= 0 || self.excluded_years.contains(&year) {
            return false;
        }
        year >= today.year() - self.max_age
    }

    /// The age reached on `on_date`, if the birth year is displayable.
    pub fn age_reached(&self, birthday: &Birthday, on_date: NaiveDate) -> Option<i32> {
        birthday
            .year()
            .filter(|year| self.should_display_year(*year, on_date))
            .map(|year| on_date.year() - year)
    }
}

impl Default for YearDisplayPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_AGE, Self::DEFAULT_EXCLUDED_YEARS)
    }
}
