use std::sync::Mutex;

use chrono::TimeDelta;
use proptest::prelude::*;
use test_strategy::proptest;

use crate::models::{Birthday, DaysBefore, Person, ReminderSlot, ReminderSlots, SlotPosition};
use crate::scheduling::{
    delivery::{DeliveryPayload, GenerationToken, PlannedDelivery},
    manager::{LifecycleAction, LifecycleManager},
};

use super::*;

type ReceivedMessages = Arc<Mutex<Vec<ReminderMessageType>>>;

#[derive(Clone)]
struct TestDeliveryChannel {
    received_messages: ReceivedMessages,
}

#[async_trait]
impl ReminderDeliveryChannel for TestDeliveryChannel {
    async fn send_reminder_notification(
        &self,
        _request: &DeliveryRequest,
        message: ReminderMessageType,
    ) {
        self.received_messages.lock().unwrap().push(message);
    }
}

const TEST_NAG_POLICY: NagPolicy = NagPolicy {
    interval: Duration::from_secs(60),
    attempts: 3,
};

struct TestContext {
    received_messages: ReceivedMessages,
    sink: Arc<TimerDeliverySink>,
}

impl TestContext {
    fn new() -> Self {
        let received_messages = Arc::new(Mutex::new(Vec::new()));
        let delivery_channel = TestDeliveryChannel {
            received_messages: received_messages.clone(),
        };
        let sink = Arc::new(TimerDeliverySink::new(
            Arc::new(delivery_channel),
            TEST_NAG_POLICY,
        ));

        Self {
            received_messages,
            sink,
        }
    }

    fn messages(&self) -> Vec<ReminderMessageType> {
        self.received_messages.lock().unwrap().clone()
    }
}

fn request_in(delay: TimeDelta, remind_until_approved: bool) -> DeliveryRequest {
    DeliveryRequest {
        person_id: 1,
        method: MethodKind::Notification,
        slot: SlotPosition::First,
        fire_at: Utc::now() + delay,
        payload: DeliveryPayload {
            title: "Ada Lovelace".to_string(),
            body: "Birthday today".to_string(),
        },
        local_options: None,
        remind_until_approved,
    }
}

fn planned(request: DeliveryRequest) -> PlannedDelivery {
    let slot = ReminderSlot::new(DaysBefore::new(0).unwrap());
    let person = Person {
        id: request.person_id,
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        birthday: Birthday::new(10, 12, Some(1815)).unwrap(),
        slots: ReminderSlots::from_slots([slot.clone()]),
        remind_until_approved: request.remind_until_approved,
    };
    let generation = GenerationToken::compute(&person, &slot, "UTC", &request);
    PlannedDelivery {
        request,
        generation,
    }
}

async fn wait(duration: TimeDelta) {
    tokio::time::sleep(duration.to_std().unwrap() + Duration::from_secs(1)).await;
}

fn tokio_ct(
    future: impl std::future::Future<Output = Result<(), TestCaseError>>,
) -> Result<(), TestCaseError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
        .block_on(future)
}

#[tokio::test(start_paused = true)]
async fn fires_once_when_due() {
    let ctx = TestContext::new();
    ctx.sink
        .schedule(&request_in(TimeDelta::hours(1), false))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(3590)).await;
    assert!(ctx.messages().is_empty());
    assert!(ctx.sink.is_scheduled(1, MethodKind::Notification).await);

    wait(TimeDelta::seconds(10)).await;
    assert_eq!(ctx.messages(), vec![ReminderMessageType::Fired]);
    assert!(!ctx.sink.is_scheduled(1, MethodKind::Notification).await);
}

#[tokio::test(start_paused = true)]
async fn rejects_delivery_in_the_past() {
    let ctx = TestContext::new();

    let result = ctx
        .sink
        .schedule(&request_in(TimeDelta::minutes(-1), false))
        .await;

    assert!(result.is_err());
    assert!(!ctx.sink.is_scheduled(1, MethodKind::Notification).await);
}

#[tokio::test(start_paused = true)]
async fn cancel_before_firing_stops_delivery() {
    let ctx = TestContext::new();
    ctx.sink
        .schedule(&request_in(TimeDelta::hours(1), false))
        .await
        .unwrap();

    ctx.sink.cancel(1, MethodKind::Notification).await;
    wait(TimeDelta::hours(2)).await;

    assert_eq!(ctx.messages(), vec![ReminderMessageType::Cancelled]);
}

#[tokio::test(start_paused = true)]
async fn cancel_of_unknown_pair_is_a_no_op() {
    let ctx = TestContext::new();

    ctx.sink.cancel(42, MethodKind::Email).await;

    assert!(ctx.messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn schedule_replaces_existing_task() {
    let ctx = TestContext::new();
    ctx.sink
        .schedule(&request_in(TimeDelta::hours(1), false))
        .await
        .unwrap();
    ctx.sink
        .schedule(&request_in(TimeDelta::hours(2), false))
        .await
        .unwrap();

    wait(TimeDelta::hours(1)).await;
    assert!(ctx.messages().is_empty());

    wait(TimeDelta::hours(1)).await;
    assert_eq!(ctx.messages(), vec![ReminderMessageType::Fired]);
}

#[tokio::test(start_paused = true)]
async fn unacknowledged_delivery_nags_until_timeout() {
    let ctx = TestContext::new();
    ctx.sink
        .schedule(&request_in(TimeDelta::minutes(5), true))
        .await
        .unwrap();

    wait(TimeDelta::minutes(5)).await;
    let nagging = TimeDelta::from_std(TEST_NAG_POLICY.interval).unwrap()
        * (i32::from(TEST_NAG_POLICY.attempts) + 1);
    wait(nagging * 2).await;

    let msgs = ctx.messages();
    let nag_count = msgs
        .iter()
        .filter(|m| matches!(m, ReminderMessageType::Nag))
        .count();

    assert_eq!(msgs[0], ReminderMessageType::Fired);
    assert_eq!(nag_count, usize::from(TEST_NAG_POLICY.attempts));
    assert_eq!(msgs.last(), Some(&ReminderMessageType::Timeout));
}

#[tokio::test(start_paused = true)]
async fn acknowledge_stops_nagging() {
    let ctx = TestContext::new();
    ctx.sink
        .schedule(&request_in(TimeDelta::minutes(5), true))
        .await
        .unwrap();

    wait(TimeDelta::minutes(5)).await;
    ctx.sink
        .acknowledge(1, MethodKind::Notification)
        .await
        .unwrap();
    wait(TimeDelta::hours(1)).await;

    assert_eq!(
        ctx.messages(),
        vec![ReminderMessageType::Fired, ReminderMessageType::Acknowledged]
    );
}

#[tokio::test(start_paused = true)]
async fn nagging_delivery_survives_reschedule() {
    let ctx = TestContext::new();
    ctx.sink
        .schedule(&request_in(TimeDelta::minutes(5), true))
        .await
        .unwrap();
    wait(TimeDelta::minutes(5)).await;

    ctx.sink
        .schedule(&request_in(TimeDelta::days(5), true))
        .await
        .unwrap();
    wait(TimeDelta::minutes(1)).await;

    assert_eq!(
        ctx.messages(),
        vec![ReminderMessageType::Fired, ReminderMessageType::Nag]
    );
    assert!(ctx.sink.is_nagging(1, MethodKind::Notification).await);
    assert!(ctx.sink.is_scheduled(1, MethodKind::Notification).await);

    ctx.sink
        .acknowledge(1, MethodKind::Notification)
        .await
        .unwrap();
    wait(TimeDelta::seconds(1)).await;

    assert_eq!(ctx.messages().last(), Some(&ReminderMessageType::Acknowledged));
    assert!(!ctx.sink.is_nagging(1, MethodKind::Notification).await);
    assert!(ctx.sink.is_scheduled(1, MethodKind::Notification).await);

    ctx.sink.cancel(1, MethodKind::Notification).await;
    wait(TimeDelta::seconds(1)).await;

    assert_eq!(
        ctx.messages(),
        vec![
            ReminderMessageType::Fired,
            ReminderMessageType::Nag,
            ReminderMessageType::Acknowledged,
            ReminderMessageType::Cancelled,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn second_reschedule_stops_oldest_nag() {
    let ctx = TestContext::new();
    ctx.sink
        .schedule(&request_in(TimeDelta::minutes(5), true))
        .await
        .unwrap();
    wait(TimeDelta::minutes(5)).await;

    // The replacement fires too, then gets replaced itself.
    ctx.sink
        .schedule(&request_in(TimeDelta::seconds(10), true))
        .await
        .unwrap();
    wait(TimeDelta::seconds(10)).await;
    ctx.sink
        .schedule(&request_in(TimeDelta::days(5), false))
        .await
        .unwrap();
    wait(TimeDelta::seconds(1)).await;

    assert_eq!(
        ctx.messages(),
        vec![
            ReminderMessageType::Fired,
            ReminderMessageType::Fired,
            ReminderMessageType::Cancelled,
        ]
    );
    assert!(ctx.sink.is_nagging(1, MethodKind::Notification).await);
}

#[tokio::test(start_paused = true)]
async fn deleting_person_stops_released_nag() {
    let ctx = TestContext::new();
    let mut manager = LifecycleManager::new(ctx.sink.clone());
    let delivery = planned(request_in(TimeDelta::seconds(10), true));
    let fire_at = delivery.request.fire_at;

    manager.ensure_scheduled(1, &[delivery], Utc::now()).await;
    wait(TimeDelta::seconds(10)).await;
    assert!(ctx.sink.is_nagging(1, MethodKind::Notification).await);

    let actions = manager
        .ensure_scheduled(1, &[], fire_at + TimeDelta::seconds(1))
        .await;
    assert_eq!(
        actions,
        vec![(MethodKind::Notification, LifecycleAction::Released)]
    );

    assert_eq!(manager.cancel_person(1).await, 1);
    wait(TimeDelta::minutes(5)).await;

    assert!(!ctx.sink.is_nagging(1, MethodKind::Notification).await);
    assert_eq!(
        ctx.messages(),
        vec![ReminderMessageType::Fired, ReminderMessageType::Cancelled]
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_after_firing_is_silent() {
    let ctx = TestContext::new();
    ctx.sink
        .schedule(&request_in(TimeDelta::minutes(5), false))
        .await
        .unwrap();

    wait(TimeDelta::minutes(5)).await;
    ctx.sink.cancel(1, MethodKind::Notification).await;

    assert_eq!(ctx.messages(), vec![ReminderMessageType::Fired]);
}

#[tokio::test(start_paused = true)]
async fn cancel_all_stops_every_task() {
    let ctx = TestContext::new();
    let mut email = request_in(TimeDelta::hours(1), false);
    email.method = MethodKind::Email;
    ctx.sink
        .schedule(&request_in(TimeDelta::hours(1), false))
        .await
        .unwrap();
    ctx.sink.schedule(&email).await.unwrap();

    ctx.sink.cancel_all().await;
    wait(TimeDelta::hours(2)).await;

    assert_eq!(
        ctx.messages(),
        vec![ReminderMessageType::Cancelled, ReminderMessageType::Cancelled]
    );
}

#[proptest(async = tokio_ct)]
async fn fires_after_any_delay_proptest(#[strategy(2i64..86_400)] delay_secs: i64) {
    let ctx = TestContext::new();
    let delay = TimeDelta::seconds(delay_secs);
    ctx.sink.schedule(&request_in(delay, false)).await.unwrap();

    tokio::time::sleep(Duration::from_secs((delay_secs - 1) as u64)).await;
    prop_assert!(ctx.messages().is_empty());

    wait(TimeDelta::seconds(1)).await;
    prop_assert_eq!(ctx.messages(), vec![ReminderMessageType::Fired]);
}
