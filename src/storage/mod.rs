mod birthday_storage;
mod model;

pub use birthday_storage::{BirthdayStorage, InMemoryBirthdayStorage};
pub use model::{NewPerson, UpdatePerson};
