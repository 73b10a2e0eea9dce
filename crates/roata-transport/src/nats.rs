//! NATS transport implementation.
//!
//! Topics map onto NATS subjects by swapping `/` for `.`, `+` for `*` and
//! `#` for `>`. Each subscription gets a forwarding task that feeds a single
//! queue, which [`NatsTransport::recv`] drains.

use async_nats::{Client, ConnectOptions};
use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::traits::{validate_pattern, InboundMessage, Transport, TransportError};

/// Capacity of the queue between subscriptions and the ingestion worker.
const QUEUE_CAPACITY: usize = 4096;

/// NATS connection settings.
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// Server URL, e.g. `nats://127.0.0.1:4222`.
    pub url: String,
    /// Client name shown by the server.
    pub client_name: String,
    /// Optional user name.
    pub username: Option<String>,
    /// Optional password.
    pub password: Option<String>,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://127.0.0.1:4222".to_string(),
            client_name: "roata".to_string(),
            username: None,
            password: None,
        }
    }
}

/// NATS transport.
pub struct NatsTransport {
    client: Client,
    sender: mpsc::Sender<InboundMessage>,
    receiver: mpsc::Receiver<InboundMessage>,
    subscriptions: Vec<(String, JoinHandle<()>)>,
}

impl NatsTransport {
    /// Connect to a NATS server.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(config: &NatsConfig) -> Result<Self, TransportError> {
        let mut options = ConnectOptions::new().name(&config.client_name);
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            options = options.user_and_password(user.clone(), pass.clone());
        }

        let client = options
            .connect(config.url.as_str())
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

        info!(url = %config.url, "Connected to NATS");

        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        Ok(Self {
            client,
            sender,
            receiver,
            subscriptions: Vec::new(),
        })
    }
}

#[async_trait]
impl Transport for NatsTransport {
    async fn subscribe(&mut self, pattern: &str) -> Result<(), TransportError> {
        validate_pattern(pattern)?;
        if self.subscriptions.iter().any(|(p, _)| p == pattern) {
            return Ok(());
        }

        let subject = to_subject(pattern);
        let mut subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| TransportError::SubscribeFailed {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            while let Some(message) = subscriber.next().await {
                let topic = from_subject(&message.subject);
                if sender.send(InboundMessage::new(topic, message.payload)).await.is_err() {
                    break; // Receiver dropped
                }
            }
        });

        debug!(pattern = %pattern, subject = %subject, "Subscribed");
        self.subscriptions.push((pattern.to_string(), handle));
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        if self.subscriptions.is_empty() {
            warn!("Receiving without any subscription");
        }
        Ok(self.receiver.recv().await)
    }

    fn name(&self) -> &'static str {
        "nats"
    }
}

impl Drop for NatsTransport {
    fn drop(&mut self) {
        for (_, handle) in self.subscriptions.drain(..) {
            handle.abort();
        }
    }
}

/// Convert a `/`-separated topic pattern to a NATS subject.
#[must_use]
pub fn to_subject(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| match segment {
            "+" => "*",
            "#" => ">",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Convert a NATS subject back to a `/`-separated topic.
#[must_use]
pub fn from_subject(subject: &str) -> String {
    subject.replace('.', "/")
}
