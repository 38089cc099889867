use std::hash::{DefaultHasher, Hash, Hasher};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{LocalMethodConfig, MethodKind, Person, PersonId, ReminderSlot, SlotPosition};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeliveryPayload {
    pub title: String,
    pub body: String,
}

/// One concrete reminder for one method of one person.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeliveryRequest {
    pub person_id: PersonId,
    pub method: MethodKind,
    pub slot: SlotPosition,
    pub fire_at: DateTime<Utc>,
    pub payload: DeliveryPayload,
    /// Sound, vibration and priority options. `None` for external methods.
    pub local_options: Option<LocalMethodConfig>,
    pub remind_until_approved: bool,
}

/// Fingerprint of everything that shaped a delivery. Equal tokens mean a reschedule would
/// change nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationToken(u64);

impl GenerationToken {
    pub fn compute(
        person: &Person,
        slot: &ReminderSlot,
        timezone_id: &str,
        request: &DeliveryRequest,
    ) -> Self {
        let mut hasher = DefaultHasher::new();
        person.birthday.hash(&mut hasher);
        slot.hash(&mut hasher);
        timezone_id.hash(&mut hasher);
        request.hash(&mut hasher);
        Self(hasher.finish())
    }
}

/// A request paired with the token of the inputs it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDelivery {
    pub request: DeliveryRequest,
    pub generation: GenerationToken,
}

/// Where scheduled deliveries end up: the platform's notification scheduler, or a
/// messaging backend for external methods.
#[async_trait]
pub trait DeliverySink: Send + Sync + 'static {
    /// An error means the delivery was not scheduled (e.g. notification permission revoked).
    async fn schedule(&self, request: &DeliveryRequest) -> anyhow::Result<()>;

    /// No-op when nothing is scheduled for the pair.
    async fn cancel(&self, person_id: PersonId, method: MethodKind);

    async fn cancel_all(&self);

    /// Stops a fired delivery from re-surfacing. Sinks without nagging ignore it.
    async fn acknowledge(&self, _person_id: PersonId, _method: MethodKind) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ReminderMessageType {
    Fired,
    Nag,
    Acknowledged,
    Timeout,
    Cancelled,
}

#[async_trait]
pub trait ReminderDeliveryChannel: Send + Sync + 'static {
    async fn send_reminder_notification(
        &self,
        request: &DeliveryRequest,
        message: ReminderMessageType,
    );
}

/// Writes every message to the log. Stands in for a real transport.
pub struct LoggingDeliveryChannel;

#[async_trait]
impl ReminderDeliveryChannel for LoggingDeliveryChannel {
    async fn send_reminder_notification(
        &self,
        request: &DeliveryRequest,
        message: ReminderMessageType,
    ) {
        let priority = request
            .local_options
            .as_ref()
            .map(|options| format!("{:?}", options.priority))
            .unwrap_or_else(|| "-".to_string());

        log::info!(
            "{}: {} - {} [person_id = {}, method = {}, priority = {}]",
            get_message_prefix(message),
            request.payload.title,
            request.payload.body,
            request.person_id,
            request.method,
            priority
        );
    }
}

fn get_message_prefix(message: ReminderMessageType) -> &'static str {
    match message {
        ReminderMessageType::Fired => "🎂",
        ReminderMessageType::Nag => "🎂 (again)",
        ReminderMessageType::Acknowledged => "☑️",
        ReminderMessageType::Timeout => "No reaction, stopping",
        ReminderMessageType::Cancelled => "❌ Cancelled",
    }
}
