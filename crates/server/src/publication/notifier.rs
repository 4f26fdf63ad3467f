//! Emails a published timetable to the promotion delegate.
//!
//! Notification never fails a publication: every problem is logged with the
//! timetable id and reported as a [`NotifyOutcome`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use timetable_notify::templating::{
    DelegateContext, PromotionContext, TemplateContext, TimetableContext, WeekContext,
};
use timetable_notify::{Attachment, Notification, Notifier, TemplateRenderer};

use super::pdf::{render_timetable_pdf, DATE_FORMAT};
use super::types::{PublicationContext, StudentRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoDelegate,
    NoEmail,
    MailerDisabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum NotifyOutcome {
    Delivered { recipient: String },
    Skipped(SkipReason),
    Failed(String),
}

pub struct PublicationNotifier {
    notifier: Option<Arc<dyn Notifier>>,
    renderer: TemplateRenderer,
}

impl PublicationNotifier {
    pub fn new(notifier: Option<Arc<dyn Notifier>>, renderer: TemplateRenderer) -> Self {
        Self { notifier, renderer }
    }

    /// Notifier that skips every delivery.
    pub fn disabled() -> Self {
        Self::new(None, TemplateRenderer::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    pub async fn notify(&self, ctx: &PublicationContext) -> NotifyOutcome {
        let timetable_id = ctx.timetable.id;

        let Some(delegate) = &ctx.delegate else {
            warn!(%timetable_id, promotion = %ctx.promotion.name, "no delegate for promotion, skipping notification");
            return NotifyOutcome::Skipped(SkipReason::NoDelegate);
        };
        let Some(email) = delegate.contact_email() else {
            warn!(%timetable_id, delegate_id = %delegate.id, "delegate has no email, skipping notification");
            return NotifyOutcome::Skipped(SkipReason::NoEmail);
        };
        let Some(notifier) = &self.notifier else {
            warn!(%timetable_id, "mailer not configured, skipping notification");
            return NotifyOutcome::Skipped(SkipReason::MailerDisabled);
        };

        let notification = match self.build(ctx, delegate, email) {
            Ok(n) => n,
            Err(message) => {
                error!(%timetable_id, error = %message, "failed to prepare publication email");
                return NotifyOutcome::Failed(message);
            }
        };

        match notifier.send(&notification).await {
            Ok(()) => {
                info!(%timetable_id, recipient = email, channel = notifier.channel_name(), "publication email sent");
                NotifyOutcome::Delivered {
                    recipient: email.to_string(),
                }
            }
            Err(e) => {
                error!(%timetable_id, error = %e, "failed to send publication email");
                NotifyOutcome::Failed(e.to_string())
            }
        }
    }

    fn build(
        &self,
        ctx: &PublicationContext,
        delegate: &StudentRow,
        email: &str,
    ) -> Result<Notification, String> {
        let template_ctx = template_context(ctx, delegate);
        let (subject, body) = self
            .renderer
            .render_publication(&template_ctx)
            .map_err(|e| e.to_string())?;
        let pdf = render_timetable_pdf(ctx).map_err(|e| format!("PDF rendering failed: {e}"))?;

        let mut metadata = HashMap::new();
        metadata.insert("timetable_id".to_string(), ctx.timetable.id.to_string());

        Ok(Notification {
            subject,
            body,
            recipients: vec![email.to_string()],
            attachments: vec![Attachment::pdf(pdf_filename(ctx), pdf)],
            metadata,
        })
    }
}

fn template_context(ctx: &PublicationContext, delegate: &StudentRow) -> TemplateContext {
    TemplateContext {
        promotion: PromotionContext {
            name: ctx.promotion.name.clone(),
        },
        delegate: DelegateContext {
            first_name: delegate.first_name.clone(),
            last_name: delegate.last_name.clone(),
        },
        week: ctx.week.as_ref().map(|w| WeekContext {
            number: w.sequence_number,
            start_date: w.start_date.format(DATE_FORMAT).to_string(),
            end_date: w.end_date.format(DATE_FORMAT).to_string(),
        }),
        timetable: TimetableContext {
            id: ctx.timetable.id.to_string(),
            title: ctx.timetable.title.clone(),
        },
        session_count: ctx.sessions.len(),
        now: chrono::Utc::now().to_rfc3339(),
    }
}

/// `timetable-<promotion>[-week-<n>].pdf`, promotion name slugged.
fn pdf_filename(ctx: &PublicationContext) -> String {
    let mut slug = String::new();
    for c in ctx.promotion.name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "promotion" } else { slug };

    match &ctx.week {
        Some(week) => format!("timetable-{slug}-week-{}.pdf", week.sequence_number),
        None => format!("timetable-{slug}.pdf"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publication::types::{PromotionRow, SessionLine, TimetableRow};
    use crate::weeks::AcademicWeek;
    use chrono::{NaiveDate, NaiveTime};
    use std::sync::Mutex;
    use timetable_notify::NotifyError;
    use uuid::Uuid;

    #[derive(Default)]
    struct MockNotifier {
        sent: Mutex<Vec<Notification>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Smtp("connection refused".to_string()));
            }
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }

        fn channel_name(&self) -> &str {
            "mock"
        }
    }

    fn context() -> PublicationContext {
        let promotion_id = Uuid::new_v4();
        PublicationContext {
            timetable: TimetableRow {
                id: Uuid::new_v4(),
                promotion_id,
                week_id: None,
                title: None,
                status: "published".to_string(),
                published_at: None,
            },
            promotion: PromotionRow {
                id: promotion_id,
                name: "L3 Génie Civil".to_string(),
                delegate_id: None,
            },
            delegate: Some(StudentRow {
                id: Uuid::new_v4(),
                first_name: "Nora".to_string(),
                last_name: "Benali".to_string(),
                email: Some(" nora@example.com ".to_string()),
            }),
            week: Some(AcademicWeek {
                id: Uuid::new_v4(),
                sequence_number: 3,
                start_date: NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 9, 21).unwrap(),
                year: 2025,
                is_current: true,
            }),
            sessions: vec![SessionLine {
                session_date: NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
                start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                course_name: "Structures".to_string(),
                course_code: None,
                teacher_name: None,
                classroom_name: None,
            }],
        }
    }

    fn publisher(mock: &Arc<MockNotifier>) -> PublicationNotifier {
        PublicationNotifier::new(Some(mock.clone() as Arc<dyn Notifier>), TemplateRenderer::new())
    }

    #[tokio::test]
    async fn delivers_pdf_to_delegate() {
        let mock = Arc::new(MockNotifier::default());
        let ctx = context();

        let outcome = publisher(&mock).notify(&ctx).await;
        assert_eq!(
            outcome,
            NotifyOutcome::Delivered {
                recipient: "nora@example.com".to_string()
            }
        );

        let sent = mock.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let mail = &sent[0];
        assert_eq!(mail.recipients, vec!["nora@example.com".to_string()]);
        assert_eq!(
            mail.subject,
            "Timetable L3 Génie Civil: week 3 (15/09/2025 to 21/09/2025)"
        );
        assert!(mail.body.starts_with("Hello Nora,"));
        assert_eq!(mail.attachments.len(), 1);
        assert_eq!(mail.attachments[0].filename, "timetable-l3-g-nie-civil-week-3.pdf");
        assert_eq!(mail.attachments[0].content_type, "application/pdf");
        assert!(mail.attachments[0].data.starts_with(b"%PDF"));
        assert_eq!(
            mail.metadata.get("timetable_id"),
            Some(&ctx.timetable.id.to_string())
        );
    }

    #[tokio::test]
    async fn subject_without_week_uses_fallback() {
        let mock = Arc::new(MockNotifier::default());
        let mut ctx = context();
        ctx.week = None;

        publisher(&mock).notify(&ctx).await;
        let sent = mock.sent.lock().unwrap();
        assert_eq!(sent[0].subject, "Timetable L3 Génie Civil");
        assert_eq!(sent[0].attachments[0].filename, "timetable-l3-g-nie-civil.pdf");
    }

    #[tokio::test]
    async fn missing_delegate_is_skipped() {
        let mock = Arc::new(MockNotifier::default());
        let mut ctx = context();
        ctx.delegate = None;

        let outcome = publisher(&mock).notify(&ctx).await;
        assert_eq!(outcome, NotifyOutcome::Skipped(SkipReason::NoDelegate));
        assert!(mock.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_email_is_skipped() {
        let mock = Arc::new(MockNotifier::default());
        let mut ctx = context();
        if let Some(delegate) = ctx.delegate.as_mut() {
            delegate.email = Some("   ".to_string());
        }

        let outcome = publisher(&mock).notify(&ctx).await;
        assert_eq!(outcome, NotifyOutcome::Skipped(SkipReason::NoEmail));
    }

    #[tokio::test]
    async fn disabled_mailer_is_skipped() {
        let outcome = PublicationNotifier::disabled().notify(&context()).await;
        assert_eq!(outcome, NotifyOutcome::Skipped(SkipReason::MailerDisabled));
    }

    #[tokio::test]
    async fn transport_errors_are_swallowed() {
        let mock = Arc::new(MockNotifier {
            fail: true,
            ..Default::default()
        });

        let outcome = publisher(&mock).notify(&context()).await;
        match outcome {
            NotifyOutcome::Failed(message) => assert!(message.contains("connection refused")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn template_errors_are_swallowed() {
        let mock = Arc::new(MockNotifier::default());
        // Parses, but calling an undefined function fails at render time.
        let renderer = TemplateRenderer::with_overrides(Some("{{ missing_fn() }}"), None).unwrap();
        let publisher = PublicationNotifier::new(Some(mock.clone() as Arc<dyn Notifier>), renderer);

        let outcome = publisher.notify(&context()).await;
        assert!(matches!(outcome, NotifyOutcome::Failed(_)));
        assert!(mock.sent.lock().unwrap().is_empty());
    }
}
