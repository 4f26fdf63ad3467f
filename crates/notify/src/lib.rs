//! Notification delivery for published timetables.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable delivery channels
//! - SMTP email notifier with file attachments
//! - Minijinja template rendering for publication subjects and bodies

pub mod email;
pub mod templating;
pub mod traits;

pub use email::EmailNotifier;
pub use templating::TemplateRenderer;
pub use traits::{Attachment, Notification, Notifier, NotifyError};
