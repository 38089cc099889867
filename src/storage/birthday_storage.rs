use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{Account, Person, PersonId};

use super::model::{NewPerson, UpdatePerson};

#[async_trait]
pub trait BirthdayStorage: Send + Sync {
    async fn insert_person(&self, person: NewPerson) -> anyhow::Result<Person>;
    async fn update_person(&self, person: UpdatePerson) -> anyhow::Result<Person>;
    async fn get_person(&self, id: PersonId) -> Option<Person>;
    async fn get_all_persons(&self) -> Vec<Person>;
    async fn delete_person(&self, id: PersonId) -> anyhow::Result<Person>;
    async fn get_account(&self) -> Account;
    async fn save_account(&self, account: Account) -> anyhow::Result<()>;
}

struct InMemoryStore {
    next_id: PersonId,
    persons: BTreeMap<PersonId, Person>,
    account: Account,
}

pub struct InMemoryBirthdayStorage {
    store: RwLock<InMemoryStore>,
}

impl InMemoryBirthdayStorage {
    pub fn new(account: Account) -> Self {
        InMemoryBirthdayStorage {
            store: RwLock::new(InMemoryStore {
                next_id: 1,
                persons: BTreeMap::new(),
                account,
            }),
        }
    }
}

impl Default for InMemoryBirthdayStorage {
    fn default() -> Self {
        Self::new(Account::default())
    }
}

#[async_trait]
impl BirthdayStorage for InMemoryBirthdayStorage {
    async fn insert_person(&self, person: NewPerson) -> anyhow::Result<Person> {
        let mut store = self.store.write().await;
        let id = store.next_id;
        let slots = person
            .slots
            .unwrap_or_else(|| store.account.slot_templates.clone());

        let person = Person {
            id,
            first_name: person.first_name,
            last_name: person.last_name,
            birthday: person.birthday,
            slots,
            remind_until_approved: person.remind_until_approved,
        };

        store.persons.insert(id, person.clone());
        store.next_id += 1;

        log::debug!("Inserted person. [person_id = {id}]");
        Ok(person)
    }

    async fn update_person(&self, update: UpdatePerson) -> anyhow::Result<Person> {
        let mut store = self.store.write().await;
        let Some(person) = store.persons.get_mut(&update.id) else {
            anyhow::bail!("Person {} does not exist", update.id);
        };

        if let Some(first_name) = update.first_name {
            person.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            person.last_name = last_name;
        }
        if let Some(birthday) = update.birthday {
            person.birthday = birthday;
        }
        if let Some(slots) = update.slots {
            person.slots = slots;
        }
        if let Some(remind_until_approved) = update.remind_until_approved {
            person.remind_until_approved = remind_until_approved;
        }

        Ok(person.clone())
    }

    async fn get_person(&self, id: PersonId) -> Option<Person> {
        let store = self.store.read().await;
        store.persons.get(&id).cloned()
    }

    async fn get_all_persons(&self) -> Vec<Person> {
        let store = self.store.read().await;
        store.persons.values().cloned().collect()
    }

    async fn delete_person(&self, id: PersonId) -> anyhow::Result<Person> {
        let mut store = self.store.write().await;
        match store.persons.remove(&id) {
            Some(person) => Ok(person),
            None => anyhow::bail!("Person {id} does not exist"),
        }
    }

    async fn get_account(&self) -> Account {
        self.store.read().await.account.clone()
    }

    async fn save_account(&self, account: Account) -> anyhow::Result<()> {
        self.store.write().await.account = account;
        Ok(())
    }
}
