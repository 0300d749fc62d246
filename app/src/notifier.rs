//! Outbound email delivery through the notification service's HTTP API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const SEND_TIMEOUT: Duration = Duration::from_secs(60);

/// Transport-level retries, underneath the queue's own retry policy.
const SEND_RETRIES: u32 = 3;
const RETRY_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum Error {
    #[error("email service request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("email service responded with status {0}")]
    Status(StatusCode),
}

impl Error {
    /// Timeouts, refused connections and error statuses are worth another
    /// attempt; anything else (e.g. a malformed request body) is not.
    fn is_retryable(&self) -> bool {
        match self {
            Error::Request(e) => e.is_timeout() || e.is_connect(),
            Error::Status(_) => true,
        }
    }
}

/// Linear backoff: 15s after the first failure, 30s after the second, ...
fn retry_delay(retry: u32) -> Duration {
    RETRY_INTERVAL * retry
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str, to: &str) -> Result<(), Error>;
}

pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpNotifier {
    pub fn new(service_url: Url) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap();
        let endpoint = format!("{}/send-email", service_url.as_str().trim_end_matches('/'))
            .parse()
            .unwrap();
        Self { client, endpoint }
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    email: &'a str,
    title: &'a str,
    message: &'a str,
}

impl HttpNotifier {
    async fn try_send(&self, subject: &str, body: &str, to: &str) -> Result<(), Error> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&SendRequest {
                email: to,
                title: subject,
                message: body,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Status(response.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, subject: &str, body: &str, to: &str) -> Result<(), Error> {
        let mut retry = 0;
        loop {
            match self.try_send(subject, body, to).await {
                Ok(()) => return Ok(()),
                Err(e) if retry < SEND_RETRIES && e.is_retryable() => {
                    retry += 1;
                    log::warn!(
                        "email service attempt {} for {} failed ({}), retrying in {:?}",
                        retry,
                        to,
                        e,
                        retry_delay(retry)
                    );
                    tokio::time::sleep(retry_delay(retry)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
