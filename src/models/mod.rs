pub mod account;
pub mod birthday;
pub mod person;
pub mod slot;
pub mod slots;

pub use account::Account;
pub use birthday::{Birthday, BirthdayError};
pub use person::{Person, PersonId};
pub use slot::{
    DaysBefore, ExternalMethodConfig, LocalMethodConfig, MethodConfig, MethodKind,
    NotificationPriority, ReminderSlot, SlotError, TimeOfDay,
};
pub use slots::{ReminderSlots, SlotPosition};
