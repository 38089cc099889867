pub mod delivery;
pub mod manager;
pub mod timer_sink;
pub mod trigger;

pub use delivery::{
    DeliveryPayload, DeliveryRequest, DeliverySink, GenerationToken, LoggingDeliveryChannel,
    PlannedDelivery, ReminderDeliveryChannel, ReminderMessageType,
};
pub use manager::{DeliveryKey, LifecycleAction, LifecycleManager, ScheduledDelivery};
pub use timer_sink::{NagPolicy, TimerDeliverySink};
pub use trigger::{ScheduleClock, resolve_trigger, trigger_date};
