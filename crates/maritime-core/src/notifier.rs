use std::sync::Mutex;

use async_trait::async_trait;
use aws_sdk_sns::Client;
use tracing::info;

use crate::error::NotificationError;

pub const SUBJECT: &str = "Maritime Vessel Update";
pub const NO_DATA_MESSAGE: &str = "No maritime data available.";
pub const SEPARATOR: &str = "\n---\n";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotificationError>;
}

/// Joins per-vessel lines into the broadcast body.
///
/// `has_data` is false when every vessel failed; the placeholder is sent
/// instead of a list of failures.
pub fn compose_message(lines: &[String], has_data: bool) -> String {
    if lines.is_empty() || !has_data {
        NO_DATA_MESSAGE.to_string()
    } else {
        lines.join(SEPARATOR)
    }
}

pub struct SnsNotifier {
    client: Client,
    topic_arn: String,
}

impl SnsNotifier {
    pub fn new(client: Client, topic_arn: impl Into<String>) -> Self {
        Self {
            client,
            topic_arn: topic_arn.into(),
        }
    }

    pub async fn from_region(region: &str, topic_arn: impl Into<String>) -> Self {
        let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_sns::config::Region::new(region.to_string()))
            .load()
            .await;
        Self::new(Client::new(&shared_config), topic_arn)
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotificationError> {
        let output = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|err| NotificationError::Publish {
                topic: self.topic_arn.clone(),
                message: err.to_string(),
            })?;

        info!(
            topic = %self.topic_arn,
            message_id = output.message_id().unwrap_or_default(),
            "published notification"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub subject: String,
    pub message: String,
}

/// Notifier that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    published: Mutex<Vec<PublishedMessage>>,
    fail_with: Option<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every publish fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail_with: Some(reason.into()),
        }
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotificationError> {
        if let Some(reason) = &self.fail_with {
            return Err(NotificationError::Publish {
                topic: "recording".to_string(),
                message: reason.clone(),
            });
        }
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(PublishedMessage {
                subject: subject.to_string(),
                message: message.to_string(),
            });
        Ok(())
    }
}
