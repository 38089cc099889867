use serde::{Deserialize, Serialize};

use super::{birthday::Birthday, slots::ReminderSlots};

pub type PersonId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub birthday: Birthday,
    pub slots: ReminderSlots,
    /// Consumed by the delivery sink: a fired reminder keeps re-surfacing until acknowledged.
    pub remind_until_approved: bool,
}
