use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_DAYS_BEFORE: u8 = 30;
const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("Days before must be in 0..={MAX_DAYS_BEFORE}, got {0}")]
    DaysBeforeOutOfRange(u8),

    #[error("Time of day must be in 0..=1439 minutes, got {0}")]
    TimeOutOfRange(u32),
}

/// How many days ahead of the occurrence a slot fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DaysBefore(u8);

impl DaysBefore {
    pub const SAME_DAY: DaysBefore = DaysBefore(0);

    pub fn new(days: u8) -> Result<Self, SlotError> {
        if days > MAX_DAYS_BEFORE {
            return Err(SlotError::DaysBeforeOutOfRange(days));
        }
        Ok(Self(days))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Local wall-clock time a method fires at, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn from_minutes(minutes: u16) -> Result<Self, SlotError> {
        if minutes >= MINUTES_PER_DAY {
            return Err(SlotError::TimeOutOfRange(minutes.into()));
        }
        Ok(Self(minutes))
    }

    pub fn new(hour: u32, minute: u32) -> Result<Self, SlotError> {
        let minutes = hour.saturating_mul(60).saturating_add(minute);
        if hour >= 24 || minute >= 60 {
            return Err(SlotError::TimeOutOfRange(minutes));
        }
        Self::from_minutes(minutes as u16)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn time(self) -> NaiveTime {
        let minutes = u32::from(self.0);
        NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl Default for TimeOfDay {
    fn default() -> Self {
        Self(9 * 60)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MethodKind {
    Notification,
    Alarm,
    Email,
    Sms,
    WhatsApp,
    Signal,
}

impl MethodKind {
    /// Declared order: local methods first, then external ones.
    pub const ALL: [MethodKind; 6] = [
        MethodKind::Notification,
        MethodKind::Alarm,
        MethodKind::Email,
        MethodKind::Sms,
        MethodKind::WhatsApp,
        MethodKind::Signal,
    ];

    pub fn is_local(self) -> bool {
        matches!(self, MethodKind::Notification | MethodKind::Alarm)
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MethodKind::Notification => "Notification",
            MethodKind::Alarm => "Alarm",
            MethodKind::Email => "Email",
            MethodKind::Sms => "SMS",
            MethodKind::WhatsApp => "WhatsApp",
            MethodKind::Signal => "Signal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationPriority {
    Low,
    #[default]
    Default,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalMethodConfig {
    pub enabled: bool,
    pub time: TimeOfDay,
    pub play_sound: bool,
    pub vibrate: bool,
    pub wake_screen: bool,
    pub override_silent_mode: bool,
    pub priority: NotificationPriority,
}

impl Default for LocalMethodConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            time: TimeOfDay::default(),
            play_sound: true,
            vibrate: true,
            wake_screen: false,
            override_silent_mode: false,
            priority: NotificationPriority::Default,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalMethodConfig {
    pub enabled: bool,
    pub time: TimeOfDay,
    pub include_age: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalMethods {
    pub notification: LocalMethodConfig,
    pub alarm: LocalMethodConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalMethods {
    pub email: ExternalMethodConfig,
    pub sms: ExternalMethodConfig,
    pub whatsapp: ExternalMethodConfig,
    pub signal: ExternalMethodConfig,
}

/// Borrowed view over one method of a slot, local or external.
#[derive(Debug, Clone, Copy)]
pub enum MethodConfig<'a> {
    Local(&'a LocalMethodConfig),
    External(&'a ExternalMethodConfig),
}

impl MethodConfig<'_> {
    pub fn enabled(&self) -> bool {
        match self {
            MethodConfig::Local(config) => config.enabled,
            MethodConfig::External(config) => config.enabled,
        }
    }

    pub fn time(&self) -> TimeOfDay {
        match self {
            MethodConfig::Local(config) => config.time,
            MethodConfig::External(config) => config.time,
        }
    }

    pub fn include_age(&self) -> bool {
        match self {
            MethodConfig::Local(_) => false,
            MethodConfig::External(config) => config.include_age,
        }
    }
}

/// One reminder configuration: an offset plus exactly one config per method kind.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderSlot {
    pub days_before: DaysBefore,
    pub local: LocalMethods,
    pub external: ExternalMethods,
}

impl Default for DaysBefore {
    fn default() -> Self {
        Self::SAME_DAY
    }
}

impl ReminderSlot {
    /// A slot with every method disabled.
    pub fn new(days_before: DaysBefore) -> Self {
        Self {
            days_before,
            ..Default::default()
        }
    }

    /// Enables `kind` at `time`, leaving its other settings untouched.
    pub fn with_method(mut self, kind: MethodKind, time: TimeOfDay) -> Self {
        self.set_method(kind, true, time);
        self
    }

    pub fn set_method(&mut self, kind: MethodKind, enabled: bool, time: TimeOfDay) {
        match kind {
            MethodKind::Notification | MethodKind::Alarm => {
                let config = self.local_mut(kind);
                config.enabled = enabled;
                config.time = time;
            }
            _ => {
                let config = self.external_mut(kind);
                config.enabled = enabled;
                config.time = time;
            }
        }
    }

    pub fn method(&self, kind: MethodKind) -> MethodConfig<'_> {
        match kind {
            MethodKind::Notification => MethodConfig::Local(&self.local.notification),
            MethodKind::Alarm => MethodConfig::Local(&self.local.alarm),
            MethodKind::Email => MethodConfig::External(&self.external.email),
            MethodKind::Sms => MethodConfig::External(&self.external.sms),
            MethodKind::WhatsApp => MethodConfig::External(&self.external.whatsapp),
            MethodKind::Signal => MethodConfig::External(&self.external.signal),
        }
    }

    /// All six methods in declared order.
    pub fn methods(&self) -> impl Iterator<Item = (MethodKind, MethodConfig<'_>)> {
        MethodKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.method(kind)))
    }

    pub fn has_enabled_method(&self) -> bool {
        self.methods().any(|(_, config)| config.enabled())
    }

    fn local_mut(&mut self, kind: MethodKind) -> &mut LocalMethodConfig {
        match kind {
            MethodKind::Alarm => &mut self.local.alarm,
            _ => &mut self.local.notification,
        }
    }

    fn external_mut(&mut self, kind: MethodKind) -> &mut ExternalMethodConfig {
        match kind {
            MethodKind::Sms => &mut self.external.sms,
            MethodKind::WhatsApp => &mut self.external.whatsapp,
            MethodKind::Signal => &mut self.external.signal,
            _ => &mut self.external.email,
        }
    }
}
