use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::{
    sync::{RwLock, mpsc, watch},
    task::{self, JoinHandle},
};

use crate::models::{MethodKind, PersonId};

use super::{
    delivery::{DeliveryRequest, DeliverySink, ReminderDeliveryChannel, ReminderMessageType},
    manager::DeliveryKey,
};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// How a delivery that asks to be acknowledged keeps reminding after it fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NagPolicy {
    pub interval: Duration,
    pub attempts: u8,
}

impl Default for NagPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            attempts: 12,
        }
    }
}

#[derive(Debug)]
enum DeliveryEvent {
    Trigger,
    Acknowledge,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeliveryState {
    Pending,
    Nagging { attempts_left: u8 },
    Done,
}

struct ScheduledDeliveryHandle {
    task: JoinHandle<()>,
    tx: mpsc::Sender<DeliveryEvent>,
    fired: Arc<AtomicBool>,
}

impl ScheduledDeliveryHandle {
    fn is_nagging(&self) -> bool {
        self.fired.load(Ordering::SeqCst) && !self.task.is_finished()
    }
}

#[derive(Default)]
struct DeliveryTasks {
    pending: HashMap<DeliveryKey, ScheduledDeliveryHandle>,
    /// Fired tasks a newer schedule took the place of. They keep nagging until acknowledged,
    /// cancelled or timed out.
    superseded: HashMap<DeliveryKey, ScheduledDeliveryHandle>,
}

impl DeliveryTasks {
    fn remove(&mut self, key: &DeliveryKey) -> Vec<ScheduledDeliveryHandle> {
        [self.pending.remove(key), self.superseded.remove(key)]
            .into_iter()
            .flatten()
            .collect()
    }

    fn handles(&self, key: &DeliveryKey) -> impl Iterator<Item = &ScheduledDeliveryHandle> {
        [self.pending.get(key), self.superseded.get(key)]
            .into_iter()
            .flatten()
    }
}

struct CleanupTask(watch::Sender<()>);

type DeliveryTaskStore = RwLock<DeliveryTasks>;

/// In-process sink: one tokio task per (person, method) that sleeps until the delivery is
/// due and then hands it to a [`ReminderDeliveryChannel`].
pub struct TimerDeliverySink {
    tasks: Arc<DeliveryTaskStore>,
    delivery_channel: Arc<dyn ReminderDeliveryChannel>,
    nag_policy: NagPolicy,
    cleanup_task: CleanupTask,
}

impl TimerDeliverySink {
    pub fn new(delivery_channel: Arc<dyn ReminderDeliveryChannel>, nag_policy: NagPolicy) -> Self {
        let tasks = Arc::new(RwLock::new(DeliveryTasks::default()));
        let cleanup_task = Self::spawn_cleanup_task(Arc::clone(&tasks));

        Self {
            tasks,
            delivery_channel,
            nag_policy,
            cleanup_task,
        }
    }

    /// Whether the pair has a task for its latest schedule that has not finished yet.
    pub async fn is_scheduled(&self, person_id: PersonId, method: MethodKind) -> bool {
        self.tasks
            .read()
            .await
            .pending
            .get(&(person_id, method))
            .is_some_and(|handle| !handle.task.is_finished())
    }

    /// Whether a fired delivery of the pair is still re-surfacing.
    pub async fn is_nagging(&self, person_id: PersonId, method: MethodKind) -> bool {
        self.tasks
            .read()
            .await
            .handles(&(person_id, method))
            .any(ScheduledDeliveryHandle::is_nagging)
    }

    fn create_delivery_task(
        &self,
        request: DeliveryRequest,
        delay: Duration,
    ) -> ScheduledDeliveryHandle {
        let (tx, rx) = mpsc::channel(10);
        let fired = Arc::new(AtomicBool::new(false));

        let tx_clone = tx.clone();
        let task_fired = fired.clone();
        let delivery_channel = self.delivery_channel.clone();
        let nag_policy = self.nag_policy;
        let task = task::spawn(async move {
            send_after_delay(DeliveryEvent::Trigger, tx_clone.clone(), delay);
            run_delivery(
                request,
                delivery_channel.as_ref(),
                nag_policy,
                &task_fired,
                rx,
                tx_clone,
            )
            .await;
        });

        ScheduledDeliveryHandle { task, tx, fired }
    }

    fn spawn_cleanup_task(tasks: Arc<DeliveryTaskStore>) -> CleanupTask {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(());
        task::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(CLEANUP_INTERVAL) => {
                        Self::clean_finished_tasks(&tasks).await;
                    }
                    _ = shutdown_rx.changed() => {
                        log::debug!("Delivery cleanup task shutting down");
                        break;
                    }
                };
            }
        });

        CleanupTask(shutdown_tx)
    }

    async fn clean_finished_tasks(tasks: &DeliveryTaskStore) {
        let mut tasks = tasks.write().await;
        let before = tasks.pending.len() + tasks.superseded.len();
        tasks.pending.retain(|_, handle| !handle.task.is_finished());
        tasks.superseded.retain(|_, handle| !handle.task.is_finished());
        let after = tasks.pending.len() + tasks.superseded.len();

        if before != after {
            log::info!("Cleaned up {} finished delivery tasks", before - after);
        }
    }
}

impl Drop for TimerDeliverySink {
    fn drop(&mut self) {
        let _ = self.cleanup_task.0.send(());
    }
}

#[async_trait]
impl DeliverySink for TimerDeliverySink {
    async fn schedule(&self, request: &DeliveryRequest) -> anyhow::Result<()> {
        let now = Utc::now();
        if request.fire_at <= now {
            anyhow::bail!("Delivery time {} is not in the future", request.fire_at);
        }
        let delay = (request.fire_at - now).to_std()?;

        let key = (request.person_id, request.method);
        let handle = self.create_delivery_task(request.clone(), delay);

        let stale = {
            let mut tasks = self.tasks.write().await;
            match tasks.pending.insert(key, handle) {
                Some(previous) if previous.is_nagging() => {
                    log::info!(
                        "Fired delivery keeps nagging next to its replacement. [person_id = {}, method = {}]",
                        request.person_id,
                        request.method
                    );
                    tasks.superseded.insert(key, previous)
                }
                Some(previous) => {
                    previous.task.abort();
                    log::debug!(
                        "Replaced delivery task. [person_id = {}, method = {}]",
                        request.person_id,
                        request.method
                    );
                    None
                }
                None => None,
            }
        };

        // An older nag superseded twice is stopped rather than dropped silently.
        if let Some(stale) = stale {
            let _ = stale.tx.send(DeliveryEvent::Stop).await;
        }

        log::info!(
            "Delivery task started. [person_id = {}, method = {}, delay = {:?}]",
            request.person_id,
            request.method,
            delay
        );
        Ok(())
    }

    async fn cancel(&self, person_id: PersonId, method: MethodKind) {
        let handles = self.tasks.write().await.remove(&(person_id, method));

        for handle in handles {
            if handle.tx.send(DeliveryEvent::Stop).await.is_err() {
                log::debug!(
                    "Delivery task already finished. [person_id = {person_id}, method = {method}]"
                );
            }
        }
    }

    async fn cancel_all(&self) {
        let handles: Vec<_> = {
            let mut tasks = self.tasks.write().await;
            let pending = std::mem::take(&mut tasks.pending);
            let superseded = std::mem::take(&mut tasks.superseded);
            pending.into_values().chain(superseded.into_values()).collect()
        };

        for handle in handles {
            let _ = handle.tx.send(DeliveryEvent::Stop).await;
        }
    }

    /// Acknowledges every fired delivery of the pair. A delivery that has not fired yet is
    /// left alone.
    async fn acknowledge(&self, person_id: PersonId, method: MethodKind) -> anyhow::Result<()> {
        let tasks = self.tasks.read().await;
        for handle in tasks.handles(&(person_id, method)) {
            if handle.is_nagging() {
                handle.tx.send(DeliveryEvent::Acknowledge).await?;
            }
        }
        Ok(())
    }
}

async fn run_delivery(
    request: DeliveryRequest,
    delivery: &dyn ReminderDeliveryChannel,
    nag_policy: NagPolicy,
    fired: &AtomicBool,
    mut rx: mpsc::Receiver<DeliveryEvent>,
    tx: mpsc::Sender<DeliveryEvent>,
) {
    let mut state = DeliveryState::Pending;
    while let Some(event) = rx.recv().await {
        state = handle_event(&request, state, &event, delivery, nag_policy, &tx).await;
        if matches!(state, DeliveryState::Nagging { .. }) {
            fired.store(true, Ordering::SeqCst);
        }
        if state == DeliveryState::Done {
            break;
        }
    }
}

async fn handle_event(
    request: &DeliveryRequest,
    current_state: DeliveryState,
    event: &DeliveryEvent,
    delivery: &dyn ReminderDeliveryChannel,
    nag_policy: NagPolicy,
    tx: &mpsc::Sender<DeliveryEvent>,
) -> DeliveryState {
    match (current_state, event) {
        (DeliveryState::Pending, DeliveryEvent::Trigger) => {
            delivery
                .send_reminder_notification(request, ReminderMessageType::Fired)
                .await;

            if !request.remind_until_approved || nag_policy.attempts == 0 {
                return DeliveryState::Done;
            }

            log::info!(
                "[NAGGING] Sleeping for {:?}. [person_id = {}, method = {}]",
                nag_policy.interval,
                request.person_id,
                request.method
            );
            send_after_delay(DeliveryEvent::Trigger, tx.clone(), nag_policy.interval);

            DeliveryState::Nagging {
                attempts_left: nag_policy.attempts,
            }
        }
        (DeliveryState::Nagging { attempts_left: 0 }, DeliveryEvent::Trigger) => {
            delivery
                .send_reminder_notification(request, ReminderMessageType::Timeout)
                .await;
            DeliveryState::Done
        }
        (DeliveryState::Nagging { attempts_left }, DeliveryEvent::Trigger) => {
            delivery
                .send_reminder_notification(request, ReminderMessageType::Nag)
                .await;

            send_after_delay(DeliveryEvent::Trigger, tx.clone(), nag_policy.interval);

            DeliveryState::Nagging {
                attempts_left: attempts_left - 1,
            }
        }
        (DeliveryState::Nagging { .. }, DeliveryEvent::Acknowledge) => {
            delivery
                .send_reminder_notification(request, ReminderMessageType::Acknowledged)
                .await;
            DeliveryState::Done
        }
        (_, DeliveryEvent::Stop) => {
            delivery
                .send_reminder_notification(request, ReminderMessageType::Cancelled)
                .await;
            DeliveryState::Done
        }
        (state, event) => {
            log::warn!(
                "Received unexpected state and event combination for delivery. [state = {:?}, event = {:?}, person_id = {}, method = {}]",
                state,
                event,
                request.person_id,
                request.method
            );
            state
        }
    }
}

fn send_after_delay(event: DeliveryEvent, tx: mpsc::Sender<DeliveryEvent>, delay: Duration) {
    task::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(event).await;
    });
}

#[cfg(test)]
mod tests;
