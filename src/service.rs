use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    dispatch::{DispatchContext, plan_person},
    display_name::DisplayNameFormatter,
    models::{Account, MethodKind, Person, PersonId},
    recurrence::YearDisplayPolicy,
    scheduling::{
        delivery::DeliverySink,
        manager::{LifecycleAction, LifecycleManager, ScheduledDelivery},
        trigger::ScheduleClock,
    },
    storage::{BirthdayStorage, NewPerson, UpdatePerson},
};

/// Ties persistence to the lifecycle manager. Every change to a person or to the account is
/// followed by an "ensure scheduled" pass for whoever it affects.
pub struct ReminderService {
    storage: Arc<dyn BirthdayStorage>,
    manager: Mutex<LifecycleManager>,
    formatter: Arc<dyn DisplayNameFormatter>,
    year_policy: YearDisplayPolicy,
}

impl ReminderService {
    pub fn new(
        storage: Arc<dyn BirthdayStorage>,
        sink: Arc<dyn DeliverySink>,
        formatter: Arc<dyn DisplayNameFormatter>,
        year_policy: YearDisplayPolicy,
    ) -> Self {
        Self {
            storage,
            manager: Mutex::new(LifecycleManager::new(sink)),
            formatter,
            year_policy,
        }
    }

    pub async fn add_person(&self, person: NewPerson, now: DateTime<Utc>) -> anyhow::Result<Person> {
        let person = self.storage.insert_person(person).await?;
        log::info!("Added person. [person_id = {}]", person.id);

        let account = self.storage.get_account().await;
        let mut manager = self.manager.lock().await;
        self.ensure_person(&mut manager, &person, &account, now).await;

        Ok(person)
    }

    pub async fn update_person(
        &self,
        update: UpdatePerson,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Person> {
        let person = self.storage.update_person(update).await?;

        let account = self.storage.get_account().await;
        let mut manager = self.manager.lock().await;
        self.ensure_person(&mut manager, &person, &account, now).await;

        Ok(person)
    }

    /// Cancels the person's deliveries, then removes the record.
    pub async fn delete_person(&self, id: PersonId) -> anyhow::Result<Person> {
        let mut manager = self.manager.lock().await;
        manager.cancel_person(id).await;

        let person = self.storage.delete_person(id).await?;
        log::info!("Deleted person. [person_id = {id}]");
        Ok(person)
    }

    pub async fn update_account(&self, account: Account, now: DateTime<Utc>) -> anyhow::Result<()> {
        let previous = self.storage.get_account().await;
        self.storage.save_account(account.clone()).await?;

        if previous.timezone != account.timezone {
            log::info!(
                "Account timezone changed. [from = {}, to = {}]",
                previous.timezone,
                account.timezone
            );
        }

        self.refresh_with(&account, now).await;
        Ok(())
    }

    /// Runs the pass for every stored person. Returns how many pairs changed.
    pub async fn refresh(&self, now: DateTime<Utc>) -> usize {
        let account = self.storage.get_account().await;
        self.refresh_with(&account, now).await
    }

    /// Stops a fired delivery of the person from re-surfacing.
    pub async fn acknowledge(&self, id: PersonId, method: MethodKind) -> anyhow::Result<()> {
        self.manager.lock().await.acknowledge(id, method).await?;
        log::info!("Acknowledged delivery. [person_id = {id}, method = {method}]");
        Ok(())
    }

    pub async fn scheduled_for(&self, id: PersonId) -> Vec<ScheduledDelivery> {
        self.manager.lock().await.scheduled_for(id).cloned().collect()
    }

    /// Cancels every outstanding delivery.
    pub async fn shutdown(&self) {
        self.manager.lock().await.cancel_all().await;
    }

    async fn refresh_with(&self, account: &Account, now: DateTime<Utc>) -> usize {
        let persons = self.storage.get_all_persons().await;
        let mut manager = self.manager.lock().await;

        let mut changed = 0;
        for person in &persons {
            changed += self
                .ensure_person(&mut manager, person, account, now)
                .await
                .iter()
                .filter(|(_, action)| *action != LifecycleAction::Unchanged)
                .count();
        }

        if changed > 0 {
            log::info!(
                "Refresh finished. [persons = {}, changed = {changed}]",
                persons.len()
            );
        } else {
            log::debug!("Refresh finished, nothing changed. [persons = {}]", persons.len());
        }
        changed
    }

    async fn ensure_person(
        &self,
        manager: &mut LifecycleManager,
        person: &Person,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Vec<(MethodKind, LifecycleAction)> {
        let clock = ScheduleClock::for_timezone(now, &account.timezone);
        let ctx = DispatchContext::for_account(account, clock, self.formatter.as_ref(), &self.year_policy);
        let planned = plan_person(person, &ctx);

        manager.ensure_scheduled(person.id, &planned, now).await
    }
}
