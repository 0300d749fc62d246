use futures::FutureExt;
use std::{future::Future, panic::AssertUnwindSafe};

pub mod database;
pub mod email;
pub mod notifier;
pub mod user;
pub mod worker;
pub mod zones;

async fn swallow_panic(f: impl Future<Output = ()>) {
    let _ = AssertUnwindSafe(f).catch_unwind().await;
}
