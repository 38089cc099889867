use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

/// A timezone identifier resolved against the tz database. Unknown identifiers fall back to
/// the device's local zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedZone {
    Named(Tz),
    DeviceLocal,
}

impl ResolvedZone {
    pub fn resolve(timezone_id: &str) -> Self {
        match timezone_id.parse::<Tz>() {
            Ok(tz) => ResolvedZone::Named(tz),
            Err(error) => {
                log::warn!(
                    "Unknown timezone, falling back to device local time. [timezone = {timezone_id}, error = {error}]"
                );
                ResolvedZone::DeviceLocal
            }
        }
    }

    /// The absolute instant of a wall-clock time in this zone.
    ///
    /// Ambiguous times (clocks going back) take the earlier instant. Times inside a gap
    /// (clocks going forward) are pushed forward by the usual one hour.
    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match self {
            ResolvedZone::Named(tz) => localize(tz, local),
            ResolvedZone::DeviceLocal => localize(&Local, local),
        }
    }

    /// The calendar date at `now` in this zone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        match self {
            ResolvedZone::Named(tz) => now.with_timezone(tz).date_naive(),
            ResolvedZone::DeviceLocal => now.with_timezone(&Local).date_naive(),
        }
    }
}

fn localize<Z: TimeZone>(zone: &Z, local: NaiveDateTime) -> DateTime<Utc> {
    let resolved = match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => zone
            .from_local_datetime(&(local + TimeDelta::hours(1)))
            .earliest(),
    };

    resolved
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}
