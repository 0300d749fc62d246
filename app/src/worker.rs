use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::{sync::Notify, task::JoinHandle};

use crate::swallow_panic;

/// A named unit of recurring background work. One tick runs to completion
/// before the next is scheduled, so a worker is never re-entered.
#[async_trait]
pub trait Worker: Send {
    async fn run(&mut self);
    fn name() -> &'static str;
    /// Time to wait between the end of one tick and the start of the next.
    fn delay(&self) -> Duration;
}

/// Controls a started worker. Stop requests are honored between ticks; a
/// tick that is already running always finishes first.
pub struct Handle {
    name: &'static str,
    stopped: Arc<AtomicBool>,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

impl Handle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

pub fn start<W: Worker + 'static>(mut worker: W) -> Handle {
    let stopped = Arc::new(AtomicBool::new(false));
    let wake = Arc::new(Notify::new());
    let task = {
        let stopped = stopped.clone();
        let wake = wake.clone();
        tokio::spawn(async move {
            loop {
                swallow_panic(worker.run()).await;
                if stopped.load(Ordering::SeqCst) {
                    break;
                }
                tokio::select! {
                    _ = tokio::time::sleep(worker.delay()) => {}
                    _ = wake.notified() => {}
                }
                if stopped.load(Ordering::SeqCst) {
                    break;
                }
            }
            log::info!("worker {} stopped", W::name());
        })
    };
    Handle {
        name: W::name(),
        stopped,
        wake,
        task,
    }
}
