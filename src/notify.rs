use log::{info, warn};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

use crate::error::NotificationError;
use crate::metrics::NOTIFICATION_FAILURES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ReservationCreated,
    CateringInquiry,
    FeedbackReceived,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationOutcome {
    pub success: bool,
    pub error: Option<String>,
}

/// Outbound staff notifications. Delivery never decides whether a booking
/// succeeded.
pub enum Notifier {
    // POSTs `{kind, payload}` as JSON to a chat or mail relay
    Webhook { client: reqwest::Client, url: String },
    Log,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        match webhook_url {
            Some(url) if !url.trim().is_empty() => Notifier::Webhook {
                client: reqwest::Client::new(),
                url,
            },
            _ => Notifier::Log,
        }
    }

    pub async fn send(&self, kind: NotificationKind, payload: Value) -> NotificationOutcome {
        match self.deliver(kind, &payload).await {
            Ok(()) => NotificationOutcome {
                success: true,
                error: None,
            },
            Err(e) => {
                NOTIFICATION_FAILURES.inc();
                warn!("Notification {:?} failed: {}", kind, e);
                NotificationOutcome {
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn deliver(&self, kind: NotificationKind, payload: &Value) -> Result<(), NotificationError> {
        match self {
            Notifier::Log => {
                info!("[Notify] {:?}: {}", kind, payload);
                Ok(())
            }
            Notifier::Webhook { client, url } => {
                let res = client
                    .post(url)
                    .timeout(Duration::from_secs(5))
                    .json(&json!({ "kind": kind, "payload": payload }))
                    .send()
                    .await?;
                if !res.status().is_success() {
                    return Err(NotificationError::Status(res.status().as_u16()));
                }
                Ok(())
            }
        }
    }
}

/// Fire and forget from a request handler.
pub fn dispatch(notifier: &Arc<Notifier>, kind: NotificationKind, payload: Value) {
    let notifier = Arc::clone(notifier);
    tokio::spawn(async move {
        notifier.send(kind, payload).await;
    });
}
