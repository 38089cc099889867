use serde::{Deserialize, Serialize};

use crate::display_name::TextDirection;

use super::{
    slot::{DaysBefore, MethodKind, ReminderSlot, TimeOfDay},
    slots::ReminderSlots,
};

/// Installation-wide settings. The slot templates seed newly created persons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub slot_templates: ReminderSlots,
    /// IANA identifier, e.g. `Europe/Berlin`.
    pub timezone: String,
    pub text_direction: TextDirection,
}

impl Account {
    pub fn with_timezone(timezone: impl Into<String>) -> Self {
        Self {
            timezone: timezone.into(),
            ..Default::default()
        }
    }
}

impl Default for Account {
    fn default() -> Self {
        let same_day_notification = ReminderSlot::new(DaysBefore::SAME_DAY)
            .with_method(MethodKind::Notification, TimeOfDay::default());

        Self {
            slot_templates: ReminderSlots::from_slots([same_day_notification]),
            timezone: "UTC".to_string(),
            text_direction: TextDirection::default(),
        }
    }
}
