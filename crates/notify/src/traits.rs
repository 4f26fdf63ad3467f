//! Notifier trait definition and shared error types.

use std::collections::HashMap;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Attachment error: {0}")]
    Attachment(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A file attached to a notification.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    /// MIME type, e.g. `application/pdf`.
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn pdf(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "application/pdf".to_string(),
            data,
        }
    }
}

/// A rendered notification ready for delivery.
#[derive(Debug, Clone)]
pub struct Notification {
    /// The rendered subject/title.
    pub subject: String,
    /// The rendered body content.
    pub body: String,
    /// Recipient addresses (`"Name <addr>"` or bare `addr`).
    pub recipients: Vec<String>,
    pub attachments: Vec<Attachment>,
    /// Additional metadata (e.g., timetable id).
    pub metadata: HashMap<String, String>,
}

impl Notification {
    /// Metadata as `key=value` pairs sorted by key, for log fields.
    pub fn metadata_summary(&self) -> String {
        let mut pairs: Vec<_> = self.metadata.iter().collect();
        pairs.sort();
        pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Trait for notification channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification through this channel.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "email").
    fn channel_name(&self) -> &str;
}
