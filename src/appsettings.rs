use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::{
    models::{Account, Birthday, BirthdayError},
    recurrence::YearDisplayPolicy,
    scheduling::NagPolicy,
    storage::NewPerson,
};

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulerSettings {
    pub refresh_interval_secs: u64,
    pub max_age: i32,
    pub excluded_years: Vec<i32>,
    pub nag_interval_secs: u64,
    pub nag_attempts: u8,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 900,
            max_age: YearDisplayPolicy::DEFAULT_MAX_AGE,
            excluded_years: YearDisplayPolicy::DEFAULT_EXCLUDED_YEARS.to_vec(),
            nag_interval_secs: 300,
            nag_attempts: 12,
        }
    }
}

impl SchedulerSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn year_policy(&self) -> YearDisplayPolicy {
        YearDisplayPolicy::new(self.max_age, self.excluded_years.iter().copied())
    }

    pub fn nag_policy(&self) -> NagPolicy {
        NagPolicy {
            interval: Duration::from_secs(self.nag_interval_secs),
            attempts: self.nag_attempts,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AccountSettings {
    pub timezone: String,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
        }
    }
}

impl AccountSettings {
    pub fn account(&self) -> Account {
        Account::with_timezone(self.timezone.clone())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SeedPerson {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub day: u32,
    pub month: u32,
    pub year: Option<i32>,
    #[serde(default)]
    pub remind_until_approved: bool,
}

impl SeedPerson {
    pub fn to_new_person(&self) -> Result<NewPerson, BirthdayError> {
        let birthday = Birthday::new(self.day, self.month, self.year)?;
        let mut person = NewPerson::new(
            self.first_name.clone(),
            self.last_name.clone(),
            birthday,
        );
        person.remind_until_approved = self.remind_until_approved;
        Ok(person)
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct AppSettings {
    pub scheduler: SchedulerSettings,
    pub account: AccountSettings,
    pub people: Vec<SeedPerson>,
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}
