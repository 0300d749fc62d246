use super::queue::{Queue, QueueEmpty, QueueItem};
use super::Message;
use crate::notifier::Notifier;
use crate::user::{self, UserStore};
use crate::zones::ZoneTable;
use chrono::{Datelike, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Local hour at which users receive their greeting.
pub const DEFAULT_BIRTHDAY_HOUR: u32 = 9;

/// A send may fail this many times and stay in rotation; one more failure
/// demotes the item to the failed list.
const MAX_SEND_RETRIES: u32 = 3;

/// Population found nothing to do. An empty run, not a failure.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no users at local hour {0}")]
pub struct NoUsers(pub u32);

pub struct Dispatcher {
    store: Arc<dyn UserStore>,
    zones: Arc<ZoneTable>,
    notifier: Arc<dyn Notifier>,
    hour: u32,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn UserStore>,
        zones: Arc<ZoneTable>,
        notifier: Arc<dyn Notifier>,
        hour: u32,
    ) -> Self {
        Self {
            store,
            zones,
            notifier,
            hour,
        }
    }

    /// Enqueues a greeting for every user whose zone is at the birthday hour
    /// right now, in store order. Mutates nothing but the queue.
    pub async fn populate(&self, queue: &mut Queue) -> Result<(), NoUsers> {
        let users = match self.store.get_by_local_time(self.hour).await {
            Ok(users) => users,
            Err(e) => {
                log::warn!("local time lookup failed: {}", e);
                return Err(NoUsers(self.hour));
            }
        };
        if users.is_empty() {
            return Err(NoUsers(self.hour));
        }

        for user in &users {
            queue.push_on_going(QueueItem::new(Message::birthday(user)));
        }
        Ok(())
    }

    /// Works the queue down to empty. Items demoted in a previous drain of
    /// the same queue get one more full cycle first.
    pub async fn drain(&self, queue: &mut Queue) -> Result<(), user::Error> {
        while let Ok(item) = queue.shift_failed() {
            queue.push_on_going(item);
        }

        let mut attempt = 1usize;
        loop {
            let mut item = match queue.shift_on_going() {
                Ok(item) => item,
                Err(QueueEmpty) => return Ok(()),
            };

            // A user edited or deleted since population must not be greeted.
            if !self.is_eligible(item.message.user_id).await? {
                continue;
            }

            log::info!("send #{}: emailing {}", attempt, item.message.to);
            attempt += 1;

            match self
                .notifier
                .send(&item.message.subject, &item.message.body, &item.message.to)
                .await
            {
                Ok(()) => log::info!("email to {} delivered", item.message.to),
                Err(e) => {
                    log::warn!(
                        "sending to {} failed ({}), will retry later in this run",
                        item.message.to,
                        e
                    );
                    item.increment_retries();
                    if item.retries() > MAX_SEND_RETRIES {
                        item.reset_retries();
                        queue.push_failed(item);
                    } else {
                        queue.push_on_going(item);
                    }
                }
            }
        }
    }

    /// True iff the user's zone is at the birthday hour right now and their
    /// birthdate's month and day match that zone's current local date. A
    /// missing user is simply not eligible; storage failures propagate.
    pub async fn is_eligible(&self, user_id: user::Id) -> Result<bool, user::Error> {
        let user = match self.store.get_by_id(user_id).await {
            Ok(user) => user,
            Err(user::Error::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };

        let zones = self.zones.at_hour(self.hour, Utc::now());
        Ok(zones
            .get(user.location.as_str())
            .map(|local| (local.month(), local.day()) == (user.birthdate.month(), user.birthdate.day()))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier;
    use crate::user::{Error, Id, InMemoryUserStore, NewUser, User};
    use async_trait::async_trait;
    use chrono::{Duration, Timelike};
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, _subject: &str, _body: &str, to: &str) -> Result<(), notifier::Error> {
            self.sent.lock().unwrap().push(to.to_owned());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FailingNotifier {
        attempts: AtomicU32,
    }

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _subject: &str, _body: &str, _to: &str) -> Result<(), notifier::Error> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(notifier::Error::Status(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }

    /// Fails every send to one address, delivers the rest. Records the order
    /// of attempts.
    struct FlakyNotifier {
        rejects: String,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn send(&self, _subject: &str, _body: &str, to: &str) -> Result<(), notifier::Error> {
            self.calls.lock().unwrap().push(to.to_owned());
            if to == self.rejects {
                Err(notifier::Error::Status(StatusCode::INTERNAL_SERVER_ERROR))
            } else {
                Ok(())
            }
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl UserStore for BrokenStore {
        async fn get_all(&self) -> Result<Vec<User>, Error> {
            Err(Error::Database(sqlx::Error::PoolClosed))
        }
        async fn get_by_id(&self, _id: Id) -> Result<User, Error> {
            Err(Error::Database(sqlx::Error::PoolClosed))
        }
        async fn get_by_local_time(&self, _hour: u32) -> Result<Vec<User>, Error> {
            Err(Error::Database(sqlx::Error::PoolClosed))
        }
        async fn create(&self, _user: NewUser) -> Result<User, Error> {
            Err(Error::Database(sqlx::Error::PoolClosed))
        }
        async fn update(&self, _user: User) -> Result<User, Error> {
            Err(Error::Database(sqlx::Error::PoolClosed))
        }
        async fn delete(&self, _id: Id) -> Result<User, Error> {
            Err(Error::Database(sqlx::Error::PoolClosed))
        }
    }

    fn store() -> Arc<InMemoryUserStore> {
        Arc::new(InMemoryUserStore::new(Arc::new(ZoneTable::new())))
    }

    fn dispatcher(
        store: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        hour: u32,
    ) -> Dispatcher {
        Dispatcher::new(store, Arc::new(ZoneTable::new()), notifier, hour)
    }

    /// A user in `Etc/UTC` with today's birthdate, together with the hour
    /// they are currently at.
    async fn seed_birthday_user(store: &InMemoryUserStore, first: &str, last: &str) -> (User, u32) {
        let now = Utc::now();
        let user = store
            .create(NewUser {
                first_name: first.to_owned(),
                last_name: last.to_owned(),
                birthdate: now.date_naive(),
                location: "Etc/UTC".to_owned(),
            })
            .await
            .unwrap();
        (user, now.hour())
    }

    #[tokio::test]
    async fn populate_reports_no_users_and_leaves_the_queue_untouched() {
        let store = store();
        let dispatcher = dispatcher(store, Arc::new(RecordingNotifier::default()), 9);
        let mut queue = Queue::new();

        assert_eq!(dispatcher.populate(&mut queue).await, Err(NoUsers(9)));
        assert_eq!(queue.on_going_len(), 0);
        assert_eq!(queue.failed_len(), 0);
    }

    #[tokio::test]
    async fn populate_treats_a_failing_lookup_as_an_empty_run() {
        let dispatcher = dispatcher(
            Arc::new(BrokenStore),
            Arc::new(RecordingNotifier::default()),
            9,
        );
        let mut queue = Queue::new();

        assert_eq!(dispatcher.populate(&mut queue).await, Err(NoUsers(9)));
        assert_eq!(queue.on_going_len(), 0);
    }

    #[tokio::test]
    async fn populate_then_drain_greets_the_birthday_user() {
        let store = store();
        let (_, hour) = seed_birthday_user(&store, "John", "Doe").await;
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = dispatcher(store, notifier.clone(), hour);

        let mut queue = Queue::new();
        dispatcher.populate(&mut queue).await.unwrap();
        assert_eq!(queue.on_going_len(), 1);

        let item = queue.shift_on_going().unwrap();
        assert_eq!(item.retries(), 0);
        assert_eq!(item.message.to, "john.doe@mail.test");
        assert_eq!(item.message.subject, "Happy birthday, John!");
        queue.push_on_going(item);

        dispatcher.drain(&mut queue).await.unwrap();
        assert_eq!(*notifier.sent.lock().unwrap(), vec!["john.doe@mail.test"]);
        assert_eq!(queue.on_going_len(), 0);
        assert_eq!(queue.failed_len(), 0);
    }

    #[tokio::test]
    async fn a_failing_send_is_retried_then_demoted_with_retries_reset() {
        let store = store();
        let (_, hour) = seed_birthday_user(&store, "John", "Doe").await;
        let notifier = Arc::new(FailingNotifier::default());
        let dispatcher = dispatcher(store, notifier.clone(), hour);

        let mut queue = Queue::new();
        dispatcher.populate(&mut queue).await.unwrap();
        dispatcher.drain(&mut queue).await.unwrap();

        // Three requeues plus the demoting fourth attempt.
        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 4);
        assert_eq!(queue.on_going_len(), 0);
        assert_eq!(queue.failed_len(), 1);

        let item = queue.shift_failed().unwrap();
        assert_eq!(item.retries(), 0);
        queue.push_failed(item);

        // The next drain requeues the demoted item for one more full cycle.
        dispatcher.drain(&mut queue).await.unwrap();
        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 8);
        assert_eq!(queue.failed_len(), 1);
    }

    #[tokio::test]
    async fn a_failed_send_waits_behind_the_other_pending_items() {
        let store = store();
        let (_, hour) = seed_birthday_user(&store, "John", "Doe").await;
        seed_birthday_user(&store, "Jane", "Roe").await;
        let notifier = Arc::new(FlakyNotifier {
            rejects: "john.doe@mail.test".to_owned(),
            calls: Mutex::new(Vec::new()),
        });
        let dispatcher = dispatcher(store, notifier.clone(), hour);

        let mut queue = Queue::new();
        dispatcher.populate(&mut queue).await.unwrap();
        dispatcher.drain(&mut queue).await.unwrap();

        // Jane's pending send goes out before John's first retry; John is
        // then alone in the queue and fails his way to demotion.
        assert_eq!(
            *notifier.calls.lock().unwrap(),
            vec![
                "john.doe@mail.test",
                "jane.roe@mail.test",
                "john.doe@mail.test",
                "john.doe@mail.test",
                "john.doe@mail.test",
            ]
        );
        assert_eq!(queue.on_going_len(), 0);
        assert_eq!(queue.failed_len(), 1);
    }

    #[tokio::test]
    async fn users_changed_or_deleted_after_population_are_skipped() {
        let store = store();
        let (deleted, hour) = seed_birthday_user(&store, "John", "Doe").await;
        let (edited, _) = seed_birthday_user(&store, "Jane", "Roe").await;
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = dispatcher(store.clone(), notifier.clone(), hour);

        let mut queue = Queue::new();
        dispatcher.populate(&mut queue).await.unwrap();
        assert_eq!(queue.on_going_len(), 2);

        store.delete(deleted.id).await.unwrap();
        let mut edited = edited;
        edited.birthdate += Duration::days(1);
        store.update(edited).await.unwrap();

        dispatcher.drain(&mut queue).await.unwrap();
        assert!(notifier.sent.lock().unwrap().is_empty());
        assert_eq!(queue.on_going_len(), 0);
        assert_eq!(queue.failed_len(), 0);
    }

    #[tokio::test]
    async fn a_storage_failure_during_drain_aborts_the_run() {
        let dispatcher = dispatcher(
            Arc::new(BrokenStore),
            Arc::new(RecordingNotifier::default()),
            9,
        );

        let user = User {
            id: Id(1),
            first_name: "John".to_owned(),
            last_name: "Doe".to_owned(),
            birthdate: Utc::now().date_naive(),
            location: "Etc/UTC".to_owned(),
        };
        let mut queue = Queue::new();
        queue.push_on_going(QueueItem::new(Message::birthday(&user)));

        let result = dispatcher.drain(&mut queue).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[tokio::test]
    async fn eligibility_requires_matching_hour_and_month_day() {
        let store = store();
        let (user, hour) = seed_birthday_user(&store, "John", "Doe").await;

        let at_hour = dispatcher(
            store.clone(),
            Arc::new(RecordingNotifier::default()),
            hour,
        );
        assert!(at_hour.is_eligible(user.id).await.unwrap());
        assert!(!at_hour.is_eligible(Id(999)).await.unwrap());

        let off_hour = dispatcher(
            store.clone(),
            Arc::new(RecordingNotifier::default()),
            (hour + 12) % 24,
        );
        assert!(!off_hour.is_eligible(user.id).await.unwrap());

        let mut moved = user.clone();
        moved.birthdate += Duration::days(7);
        store.update(moved).await.unwrap();
        assert!(!at_hour.is_eligible(user.id).await.unwrap());
    }
}
