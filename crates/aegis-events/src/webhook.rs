//! Fire-and-forget webhook delivery with HMAC-SHA256 signing.

use crate::emitter::{EventListener, ListenerResult, WorkflowEvent};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// A webhook subscription as declared in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    /// Subscribed event types; `"*"` subscribes to everything.
    #[serde(default)]
    pub events: Vec<String>,
    /// Signing secret; empty means deliveries are unsigned.
    #[serde(default)]
    pub secret: String,
}

impl WebhookConfig {
    fn subscribes_to(&self, event_type: &str) -> bool {
        self.events.iter().any(|e| e == event_type || e == "*")
    }
}

/// Wire payload. Serialized exactly once per event; the signature is
/// computed over the same bytes that go on the wire.
#[derive(Serialize)]
struct DeliveryPayload<'a> {
    event_type: &'a str,
    timestamp: String,
    workflow_name: &'a str,
    data: &'a Map<String, Value>,
}

/// Delivers events to subscribed webhook URLs on background tasks.
///
/// `on_event` returns without awaiting delivery. Completed delivery
/// tasks are reaped on the next `on_event` call; failures are logged and
/// never retried.
pub struct WebhookListener {
    webhooks: Vec<WebhookConfig>,
    client: Client,
    pending: Mutex<JoinSet<()>>,
}

impl WebhookListener {
    pub fn new(webhooks: Vec<WebhookConfig>) -> Self {
        let client = Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            webhooks,
            client,
            pending: Mutex::new(JoinSet::new()),
        }
    }

    /// Lowercase hex HMAC-SHA256 of `body` keyed by `secret`.
    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    async fn deliver(client: Client, url: String, event_type: String, body: Vec<u8>, signature: Option<String>) {
        let mut request = client
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(signature) = signature {
            request = request.header("X-Aegis-Signature", signature);
        }

        match request.body(body).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!(
                    url = %url,
                    event_type = %event_type,
                    status = response.status().as_u16(),
                    "Webhook delivery rejected"
                );
            }
            Ok(_) => {}
            Err(err) => {
                warn!(url = %url, event_type = %event_type, error = %err, "Webhook delivery failed");
            }
        }
    }
}

#[async_trait]
impl EventListener for WebhookListener {
    async fn on_event(&self, event: &WorkflowEvent) -> ListenerResult {
        let subscribed: Vec<&WebhookConfig> = self
            .webhooks
            .iter()
            .filter(|wh| wh.subscribes_to(&event.event_type))
            .collect();
        if subscribed.is_empty() {
            return Ok(());
        }

        let payload = DeliveryPayload {
            event_type: &event.event_type,
            timestamp: event.timestamp.to_rfc3339(),
            workflow_name: &event.workflow_name,
            data: &event.data,
        };
        let body = serde_json::to_vec(&payload)?;

        let mut pending = self.pending.lock();
        while pending.try_join_next().is_some() {}

        for wh in subscribed {
            let signature = (!wh.secret.is_empty()).then(|| Self::sign(&wh.secret, &body));
            pending.spawn(Self::deliver(
                self.client.clone(),
                wh.url.clone(),
                event.event_type.clone(),
                body.clone(),
                signature,
            ));
        }

        Ok(())
    }
}
