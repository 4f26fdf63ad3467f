//! Application builders from `Config`.

use std::sync::Arc;

use tracing::{info, warn};

use timetable_core::Config;
use timetable_notify::{EmailNotifier, Notifier, TemplateRenderer};

use crate::publication::PublicationNotifier;

/// Load configuration from `.env` and environment variables.
pub fn load_config() -> Config {
    timetable_core::config::load_dotenv();
    Config::from_env()
}

/// Build the SMTP notifier. Returns None if SMTP is not configured.
pub fn build_notifier(config: &Config) -> Option<Arc<dyn Notifier>> {
    let smtp = &config.smtp;
    let Some((host, from)) = smtp.endpoint() else {
        info!("SMTP_HOST or MAIL_FROM not set, publication emails disabled");
        return None;
    };

    let credentials = match (&smtp.username, &smtp.password) {
        (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
        _ => None,
    };

    match EmailNotifier::from_config(host, Some(smtp.port), Some(smtp.tls), from, credentials) {
        Ok(notifier) => {
            info!(host, port = smtp.port, tls = smtp.tls, "SMTP notifier ready");
            Some(Arc::new(notifier))
        }
        Err(e) => {
            warn!(error = %e, "invalid SMTP configuration, publication emails disabled");
            None
        }
    }
}

/// Build the template renderer, falling back to the built-in templates
/// when a configured override does not parse.
pub fn build_renderer(config: &Config) -> TemplateRenderer {
    let mail = &config.mail;
    match TemplateRenderer::with_overrides(
        mail.subject_template.as_deref(),
        mail.body_template.as_deref(),
    ) {
        Ok(renderer) => renderer,
        Err(e) => {
            warn!(error = %e, "invalid mail template override, using built-in templates");
            TemplateRenderer::new()
        }
    }
}

pub fn build_publisher(config: &Config) -> PublicationNotifier {
    PublicationNotifier::new(build_notifier(config), build_renderer(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_smtp(host: Option<&str>, from: Option<&str>) -> Config {
        let mut config = Config::for_profile("ttapp_test");
        config.smtp.host = host.map(str::to_string);
        config.smtp.from = from.map(str::to_string);
        config
    }

    #[test]
    fn notifier_needs_host_and_sender() {
        assert!(build_notifier(&config_with_smtp(Some("smtp.example.com"), None)).is_none());
        assert!(build_notifier(&config_with_smtp(None, Some("scolarite@example.com"))).is_none());
    }

    #[tokio::test]
    async fn notifier_is_built_from_smtp_settings() {
        let config = config_with_smtp(Some("smtp.example.com"), Some("Scolarité <scolarite@example.com>"));
        let notifier = build_notifier(&config).expect("smtp configured");
        assert_eq!(notifier.channel_name(), "email");
    }

    #[test]
    fn invalid_sender_disables_notifier() {
        assert!(build_notifier(&config_with_smtp(Some("smtp.example.com"), Some("not an address"))).is_none());
    }
}
