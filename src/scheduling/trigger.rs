use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::{
    models::{Birthday, MethodKind, ReminderSlot},
    recurrence::next_occurrence,
    timezone::ResolvedZone,
};

/// The instant a scheduling pass runs at, with the matching calendar date in the
/// account's zone.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleClock {
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
    pub zone: ResolvedZone,
}

impl ScheduleClock {
    pub fn new(now: DateTime<Utc>, zone: ResolvedZone) -> Self {
        Self {
            now,
            today: zone.today(now),
            zone,
        }
    }

    pub fn for_timezone(now: DateTime<Utc>, timezone_id: &str) -> Self {
        Self::new(now, ResolvedZone::resolve(timezone_id))
    }
}

/// Date a slot fires on for the upcoming occurrence.
pub fn trigger_date(birthday: &Birthday, slot: &ReminderSlot, today: NaiveDate) -> Option<NaiveDate> {
    next_occurrence(birthday, today).checked_sub_days(Days::new(slot.days_before.get().into()))
}

/// When `method` of `slot` should fire for the upcoming occurrence.
///
/// `None` for a disabled method, and for a trigger that is not strictly after `clock.now`.
/// A trigger that already passed is not moved to next year here: once `today` moves past
/// the occurrence, the next occurrence (and its trigger) is next year's anyway.
pub fn resolve_trigger(
    birthday: &Birthday,
    slot: &ReminderSlot,
    method: MethodKind,
    clock: &ScheduleClock,
) -> Option<DateTime<Utc>> {
    let config = slot.method(method);
    if !config.enabled() {
        return None;
    }

    let target = trigger_date(birthday, slot, clock.today)?;
    let fire_at = clock.zone.to_utc(target.and_time(config.time().time()));

    if fire_at <= clock.now {
        log::debug!(
            "Trigger already passed for this occurrence. [method = {method}, fire_at = {fire_at}, now = {}]",
            clock.now
        );
        return None;
    }

    Some(fire_at)
}
