use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::{DateTime, Utc};

use crate::models::{MethodKind, PersonId};

use super::delivery::{DeliverySink, GenerationToken, PlannedDelivery};

pub type DeliveryKey = (PersonId, MethodKind);

/// A delivery the sink accepted and that has not been cancelled or released since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledDelivery {
    pub person_id: PersonId,
    pub method: MethodKind,
    pub fire_at: DateTime<Utc>,
    pub generation: GenerationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Scheduled,
    Rescheduled,
    Unchanged,
    Cancelled,
    /// The delivery already fired; it is no longer tracked as outstanding and the sink is
    /// left to finish it.
    Released,
    /// The sink refused the delivery; the pair stays unscheduled until the next pass.
    Rejected,
}

/// Keeps at most one outstanding delivery per (person, method) pair in step with what the
/// dispatcher says should be scheduled.
///
/// Calls for the same person must not overlap; the service serialises them.
pub struct LifecycleManager {
    sink: Arc<dyn DeliverySink>,
    scheduled: HashMap<DeliveryKey, ScheduledDelivery>,
    /// Pairs whose fired delivery may still be live in the sink (nagging).
    released: HashSet<DeliveryKey>,
}

impl LifecycleManager {
    pub fn new(sink: Arc<dyn DeliverySink>) -> Self {
        Self {
            sink,
            scheduled: HashMap::new(),
            released: HashSet::new(),
        }
    }

    /// Reconciles the person's outstanding deliveries with `planned`.
    ///
    /// When several planned deliveries share a method, the earliest one wins and the first
    /// listed wins a tie. Running this again with the same plan makes no sink calls.
    pub async fn ensure_scheduled(
        &mut self,
        person_id: PersonId,
        planned: &[PlannedDelivery],
        now: DateTime<Utc>,
    ) -> Vec<(MethodKind, LifecycleAction)> {
        let mut actions = Vec::new();

        for method in MethodKind::ALL {
            let desired = planned
                .iter()
                .filter(|p| p.request.person_id == person_id && p.request.method == method)
                .min_by_key(|p| p.request.fire_at);

            if let Some(action) = self.reconcile_pair((person_id, method), desired, now).await {
                actions.push((method, action));
            }
        }

        actions
    }

    async fn reconcile_pair(
        &mut self,
        key: DeliveryKey,
        desired: Option<&PlannedDelivery>,
        now: DateTime<Utc>,
    ) -> Option<LifecycleAction> {
        let (person_id, method) = key;

        let current = self
            .scheduled
            .get(&key)
            .map(|delivery| (delivery.fire_at, delivery.generation));

        match (current, desired) {
            (None, None) => None,
            (Some((fire_at, _)), None) => {
                let fired = fire_at <= now;
                self.scheduled.remove(&key);
                if fired {
                    self.released.insert(key);
                    log::debug!(
                        "Releasing fired delivery. [person_id = {person_id}, method = {method}]"
                    );
                    Some(LifecycleAction::Released)
                } else {
                    self.sink.cancel(person_id, method).await;
                    log::info!(
                        "Cancelled delivery. [person_id = {person_id}, method = {method}]"
                    );
                    Some(LifecycleAction::Cancelled)
                }
            }
            (None, Some(planned)) => Some(self.create(key, planned, LifecycleAction::Scheduled).await),
            (Some((_, generation)), Some(planned)) if generation == planned.generation => {
                log::debug!(
                    "Delivery is up to date. [person_id = {person_id}, method = {method}]"
                );
                Some(LifecycleAction::Unchanged)
            }
            (Some((fire_at, _)), Some(planned)) => {
                let pending = fire_at > now;
                self.scheduled.remove(&key);
                if pending {
                    self.sink.cancel(person_id, method).await;
                } else {
                    self.released.insert(key);
                }
                Some(self.create(key, planned, LifecycleAction::Rescheduled).await)
            }
        }
    }

    async fn create(
        &mut self,
        key: DeliveryKey,
        planned: &PlannedDelivery,
        on_success: LifecycleAction,
    ) -> LifecycleAction {
        let (person_id, method) = key;
        let request = &planned.request;

        match self.sink.schedule(request).await {
            Ok(()) => {
                log::info!(
                    "{on_success:?} delivery. [person_id = {person_id}, method = {method}, fire_at = {}]",
                    request.fire_at
                );
                self.scheduled.insert(
                    key,
                    ScheduledDelivery {
                        person_id,
                        method,
                        fire_at: request.fire_at,
                        generation: planned.generation,
                    },
                );
                on_success
            }
            Err(error) => {
                log::warn!(
                    "Delivery sink rejected delivery. [person_id = {person_id}, method = {method}, error = {error}]"
                );
                LifecycleAction::Rejected
            }
        }
    }

    /// Cancels every delivery of the person, including released ones that may still be
    /// nagging. Returns how many pairs were cancelled.
    pub async fn cancel_person(&mut self, person_id: PersonId) -> usize {
        let mut cancelled = 0;
        for method in MethodKind::ALL {
            let key = (person_id, method);
            let tracked = self.scheduled.remove(&key).is_some();
            let released = self.released.remove(&key);
            if tracked || released {
                self.sink.cancel(person_id, method).await;
                cancelled += 1;
            }
        }

        if cancelled > 0 {
            log::info!("Cancelled {cancelled} deliveries for person. [person_id = {person_id}]");
        }
        cancelled
    }

    pub async fn cancel_all(&mut self) {
        self.sink.cancel_all().await;
        self.scheduled.clear();
        self.released.clear();
    }

    /// Stops a fired delivery of the pair from re-surfacing.
    pub async fn acknowledge(&self, person_id: PersonId, method: MethodKind) -> anyhow::Result<()> {
        self.sink.acknowledge(person_id, method).await
    }

    /// Whether the pair fired and was released without being cancelled.
    pub fn is_released(&self, person_id: PersonId, method: MethodKind) -> bool {
        self.released.contains(&(person_id, method))
    }

    pub fn get(&self, person_id: PersonId, method: MethodKind) -> Option<&ScheduledDelivery> {
        self.scheduled.get(&(person_id, method))
    }

    pub fn scheduled_for(&self, person_id: PersonId) -> impl Iterator<Item = &ScheduledDelivery> {
        MethodKind::ALL
            .into_iter()
            .filter_map(move |method| self.get(person_id, method))
    }

    pub fn outstanding_count(&self) -> usize {
        self.scheduled.len()
    }
}
