use super::{Error, Id, NewUser, User, UserStore};
use crate::zones::ZoneTable;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

/// Map-backed store for development and tests. Ids are assigned from a
/// counter starting at 1; lookups return snapshots.
pub struct InMemoryUserStore {
    users: DashMap<i64, User>,
    next_id: AtomicI64,
    zones: Arc<ZoneTable>,
}

impl InMemoryUserStore {
    pub fn new(zones: Arc<ZoneTable>) -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
            zones,
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_all(&self) -> Result<Vec<User>, Error> {
        let mut users: Vec<User> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by_key(|user| user.id.0);
        Ok(users)
    }

    async fn get_by_id(&self, id: Id) -> Result<User, Error> {
        self.users
            .get(&id.0)
            .map(|entry| entry.value().clone())
            .ok_or(Error::NotFound(id))
    }

    async fn get_by_local_time(&self, hour: u32) -> Result<Vec<User>, Error> {
        let zones = self.zones.at_hour(hour, Utc::now());
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|entry| zones.contains_key(entry.value().location.as_str()))
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by_key(|user| user.id.0);
        Ok(users)
    }

    async fn create(&self, user: NewUser) -> Result<User, Error> {
        let id = Id(self.next_id.fetch_add(1, Ordering::SeqCst));
        let user = user.into_user(id);
        self.users.insert(id.0, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, Error> {
        if !self.users.contains_key(&user.id.0) {
            return Err(Error::NotFound(user.id));
        }
        self.users.insert(user.id.0, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Id) -> Result<User, Error> {
        self.users
            .remove(&id.0)
            .map(|(_, user)| user)
            .ok_or(Error::NotFound(id))
    }
}
