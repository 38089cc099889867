//! Birthday lists for display: what is coming up and what just passed.

use chrono::NaiveDate;

use crate::{
    models::{Person, PersonId},
    recurrence::{YearDisplayPolicy, days_since, days_until, next_occurrence, previous_occurrence},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingBirthday {
    pub person_id: PersonId,
    pub date: NaiveDate,
    pub days_until: i64,
    /// Age reached on `date`, when the birth year is displayable.
    pub age: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentBirthday {
    pub person_id: PersonId,
    pub date: NaiveDate,
    pub days_since: i64,
    pub age: Option<i32>,
}

/// Birthdays within the next `within_days` days, today included, soonest first.
pub fn upcoming<'a>(
    persons: impl IntoIterator<Item = &'a Person>,
    today: NaiveDate,
    within_days: i64,
    policy: &YearDisplayPolicy,
) -> Vec<UpcomingBirthday> {
    let mut entries: Vec<_> = persons
        .into_iter()
        .filter_map(|person| {
            let days_until = days_until(&person.birthday, today);
            if days_until > within_days {
                return None;
            }
            let date = next_occurrence(&person.birthday, today);
            Some(UpcomingBirthday {
                person_id: person.id,
                date,
                days_until,
                age: policy.age_reached(&person.birthday, date),
            })
        })
        .collect();

    entries.sort_by_key(|entry| (entry.days_until, entry.person_id));
    entries
}

/// Birthdays that passed within the recent window, most recent first.
pub fn recently_passed<'a>(
    persons: impl IntoIterator<Item = &'a Person>,
    today: NaiveDate,
    policy: &YearDisplayPolicy,
) -> Vec<RecentBirthday> {
    let mut entries: Vec<_> = persons
        .into_iter()
        .filter_map(|person| {
            let days_since = days_since(&person.birthday, today);
            if days_since == 0 {
                return None;
            }
            let date = previous_occurrence(&person.birthday, today);
            Some(RecentBirthday {
                person_id: person.id,
                date,
                days_since,
                age: policy.age_reached(&person.birthday, date),
            })
        })
        .collect();

    entries.sort_by_key(|entry| (entry.days_since, entry.person_id));
    entries
}
