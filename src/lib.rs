pub mod agenda;
pub mod appsettings;
pub mod dispatch;
pub mod display_name;
pub mod models;
pub mod recurrence;
pub mod scheduling;
pub mod service;
pub mod storage;
pub mod timezone;
