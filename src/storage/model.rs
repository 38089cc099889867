use crate::models::{Birthday, PersonId, ReminderSlots};

pub struct NewPerson {
    pub first_name: String,
    pub last_name: String,
    pub birthday: Birthday,
    /// `None` takes the account's slot templates.
    pub slots: Option<ReminderSlots>,
    pub remind_until_approved: bool,
}

impl NewPerson {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, birthday: Birthday) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            birthday,
            slots: None,
            remind_until_approved: false,
        }
    }
}

#[derive(Default)]
pub struct UpdatePerson {
    pub id: PersonId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<Birthday>,
    pub slots: Option<ReminderSlots>,
    pub remind_until_approved: Option<bool>,
}
