//! SMTP email notifier via `lettre` with TLS support.
//!
//! Delivers notifications as emails through an SMTP server, with any
//! attachments sent as a `multipart/mixed` message.
//! Supports STARTTLS and implicit TLS connections.

use crate::traits::{Notification, Notifier, NotifyError};
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// Sends notifications as emails via SMTP.
#[derive(Debug)]
pub struct EmailNotifier {
    /// Async SMTP transport for sending emails.
    transport: AsyncSmtpTransport<Tokio1Executor>,
    /// Sender mailbox.
    from: Mailbox,
}

impl EmailNotifier {
    /// Build an `EmailNotifier` from SMTP configuration.
    ///
    /// - `smtp_host`: SMTP server hostname.
    /// - `smtp_port`: Optional port (defaults to 587).
    /// - `tls`: `None` or `Some(true)` enables STARTTLS;
    ///   port 465 always uses implicit TLS regardless of this flag.
    /// - `from`: Sender address (e.g. `"Scolarité <scolarite@example.com>"`).
    /// - `credentials`: `(username, password)`; unauthenticated when `None`.
    ///
    /// Recipients come from each [`Notification`].
    pub fn from_config(
        smtp_host: &str,
        smtp_port: Option<u16>,
        tls: Option<bool>,
        from: &str,
        credentials: Option<(String, String)>,
    ) -> Result<Self, NotifyError> {
        let from_mailbox: Mailbox = from
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        let port = smtp_port.unwrap_or(587);
        let use_tls = tls.unwrap_or(true);

        let mut builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else if use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host).port(port)
        };

        if let Some((username, password)) = credentials {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from: from_mailbox,
        })
    }

    /// Assemble the MIME message for a notification without sending it.
    pub fn build_message(&self, notification: &Notification) -> Result<Message, NotifyError> {
        let recipients: Vec<Mailbox> = notification
            .recipients
            .iter()
            .map(|addr| {
                addr.parse()
                    .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if recipients.is_empty() {
            return Err(NotifyError::Config(
                "at least one recipient is required".to_string(),
            ));
        }

        let mut message_builder = Message::builder()
            .from(self.from.clone())
            .subject(&notification.subject);

        for recipient in recipients {
            message_builder = message_builder.to(recipient);
        }

        let result = if notification.attachments.is_empty() {
            message_builder
                .header(ContentType::TEXT_PLAIN)
                .body(notification.body.clone())
        } else {
            let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(notification.body.clone()));
            for attachment in &notification.attachments {
                let content_type = ContentType::parse(&attachment.content_type)
                    .map_err(|e| NotifyError::Attachment(e.to_string()))?;
                parts = parts.singlepart(
                    Attachment::new(attachment.filename.clone())
                        .body(attachment.data.clone(), content_type),
                );
            }
            message_builder.multipart(parts)
        };

        result.map_err(|e| NotifyError::Smtp(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    /// Send a notification email to its recipients.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = self.build_message(notification)?;
        let context = notification.metadata_summary();

        self.transport.send(email).await.map_err(|e| {
            tracing::warn!(channel = "email", context = %context, error = %e, "SMTP delivery failed");
            NotifyError::Smtp(e.to_string())
        })?;

        tracing::info!(
            channel = "email",
            context = %context,
            subject = %notification.subject,
            recipients = notification.recipients.len(),
            attachments = notification.attachments.len(),
            "notification delivered"
        );

        Ok(())
    }

    /// Returns `"email"`.
    fn channel_name(&self) -> &str {
        "email"
    }
}
