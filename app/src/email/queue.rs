use super::Message;
use std::collections::VecDeque;
use thiserror::Error;

/// Loop-termination signal, not a failure: the list has no items right now.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("email queue is empty")]
pub struct QueueEmpty;

/// A greeting plus its send-retry counter. Lives for one dispatch run, owned
/// by the queue that holds it (or by the pipeline while mid-send).
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub message: Message,
    retries: u32,
}

impl QueueItem {
    pub fn new(message: Message) -> Self {
        Self { message, retries: 0 }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn increment_retries(&mut self) {
        self.retries += 1;
    }

    pub fn reset_retries(&mut self) {
        self.retries = 0;
    }
}

/// Two FIFO work lists: `on_going` holds sends still to attempt, `failed`
/// holds items demoted after exhausting their retries. An item is in at most
/// one list at a time.
#[derive(Debug, Default)]
pub struct Queue {
    on_going: VecDeque<QueueItem>,
    failed: VecDeque<QueueItem>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_on_going(&mut self, item: QueueItem) {
        self.on_going.push_back(item);
    }

    pub fn push_failed(&mut self, item: QueueItem) {
        self.failed.push_back(item);
    }

    pub fn shift_on_going(&mut self) -> Result<QueueItem, QueueEmpty> {
        self.on_going.pop_front().ok_or(QueueEmpty)
    }

    pub fn shift_failed(&mut self) -> Result<QueueItem, QueueEmpty> {
        self.failed.pop_front().ok_or(QueueEmpty)
    }

    pub fn on_going_len(&self) -> usize {
        self.on_going.len()
    }

    pub fn failed_len(&self) -> usize {
        self.failed.len()
    }
}
