//! The birthday email pipeline: message derivation, the per-run retry
//! queue, the two dispatch passes, and the hourly worker driving them.

use crate::worker;
use async_trait::async_trait;
use chrono::{Timelike, Utc};
use std::time::Duration;

mod dispatch;
mod entities;
mod queue;

pub use dispatch::{Dispatcher, NoUsers, DEFAULT_BIRTHDAY_HOUR};
pub use entities::Message;
pub use queue::{Queue, QueueEmpty, QueueItem};

/// Spawns the recurring job that runs the pipeline once per hour.
pub fn start_worker(dispatcher: Dispatcher) -> worker::Handle {
    worker::start(BirthdayEmailer { dispatcher })
}

struct BirthdayEmailer {
    dispatcher: Dispatcher,
}

#[async_trait]
impl worker::Worker for BirthdayEmailer {
    async fn run(&mut self) {
        let mut queue = Queue::new();
        log::info!("starting scheduled birthday email run");

        if let Err(e) = self.dispatcher.populate(&mut queue).await {
            log::info!("{}, nothing to do this hour", e);
            return;
        }
        log::info!(
            "queue populated: {} on going, {} failed",
            queue.on_going_len(),
            queue.failed_len()
        );

        match self.dispatcher.drain(&mut queue).await {
            Ok(()) => log::info!(
                "birthday email run finished, {} permanently failed",
                queue.failed_len()
            ),
            Err(e) => log::error!("birthday email run aborted: {}", e),
        }
    }

    fn name() -> &'static str {
        "birthday-emailer"
    }

    /// Wakes at the top of the next hour, like a `0 * * * *` cron entry.
    fn delay(&self) -> Duration {
        let now = Utc::now();
        let elapsed = u64::from(now.minute()) * 60 + u64::from(now.second());
        Duration::from_secs(3600 - elapsed.min(3599))
    }
}
