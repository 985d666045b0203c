//! Outbound alert delivery.

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::TelegramCredentials;
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::Alert;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Delivery failed; the alert is dropped for this cycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("notifier transport error: {0}")]
    Transport(String),
    #[error("notifier rejected message with status {status}")]
    Rejected { status: u16 },
    #[error("notifier did not answer within {timeout_ms}ms")]
    Timeout { timeout_ms: u128 },
    #[error("failed to encode message: {0}")]
    Encode(String),
}

pub type DeliverFuture<'a> = Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>;

/// Alert sink contract.
pub trait Notifier: Send + Sync {
    fn deliver<'a>(&'a self, alert: &'a Alert) -> DeliverFuture<'a>;
}

/// Writes alerts to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver<'a>(&'a self, alert: &'a Alert) -> DeliverFuture<'a> {
        Box::pin(async move {
            info!(
                instrument = %alert.instrument,
                kind = %alert.signal.kind(),
                direction = %alert.signal.direction(),
                entry = alert.levels.entry,
                stop_loss = alert.levels.stop_loss,
                take_profit = alert.levels.take_profit,
                "alert (dry run)"
            );
            Ok(())
        })
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
}

/// Telegram bot `sendMessage` delivery.
#[derive(Clone)]
pub struct TelegramNotifier {
    http_client: Arc<dyn HttpClient>,
    credentials: TelegramCredentials,
    base_url: String,
}

impl Debug for TelegramNotifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    pub fn new(credentials: TelegramCredentials) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), credentials)
    }

    pub fn with_http_client(
        http_client: Arc<dyn HttpClient>,
        credentials: TelegramCredentials,
    ) -> Self {
        Self {
            http_client,
            credentials,
            base_url: String::from(TELEGRAM_API),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    async fn send(&self, alert: &Alert) -> Result<(), DeliveryError> {
        let body = serde_json::to_string(&SendMessage {
            chat_id: &self.credentials.chat_id,
            text: alert.render_text(),
        })
        .map_err(|e| DeliveryError::Encode(e.to_string()))?;

        let url = format!(
            "{}/bot{}/sendMessage",
            self.base_url, self.credentials.token
        );
        // Transport errors come from `without_url`, so the token stays out of them.
        let response = self
            .http_client
            .execute(HttpRequest::post_json(url, body))
            .await
            .map_err(|e| DeliveryError::Transport(e.message().to_owned()))?;

        if !response.is_success() {
            return Err(DeliveryError::Rejected {
                status: response.status,
            });
        }

        info!(instrument = %alert.instrument, kind = %alert.signal.kind(), "alert delivered");
        Ok(())
    }
}

impl Notifier for TelegramNotifier {
    fn deliver<'a>(&'a self, alert: &'a Alert) -> DeliverFuture<'a> {
        Box::pin(self.send(alert))
    }
}
