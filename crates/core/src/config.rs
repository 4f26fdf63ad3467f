use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    pub smtp: SmtpConfig,
    pub mail: MailConfig,
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `TIMETABLE_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("TIMETABLE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            postgres: PostgresConfig::from_env_profiled(p),
            smtp: SmtpConfig::from_env_profiled(p),
            mail: MailConfig::from_env_profiled(p),
            scheduler: SchedulerConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  postgres:    host={}, db={}, configured={}",
            self.postgres.host,
            self.postgres.database,
            self.postgres.is_configured()
        );
        tracing::info!(
            "  smtp:        host={}, port={}, from={}",
            self.smtp.host.as_deref().unwrap_or("(none)"),
            self.smtp.port,
            self.smtp.from.as_deref().unwrap_or("(none)")
        );
        tracing::info!(
            "  scheduler:   enabled={}, cron={}",
            self.scheduler.enabled,
            self.scheduler.week_cron
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 8080),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── PostgreSQL ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Full URL override; takes precedence over the individual fields.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: String,
    pub max_connections: u32,
}

impl PostgresConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_opt(p, "DATABASE_URL"),
            host: profiled_env_or(p, "PG_HOST", "localhost"),
            port: profiled_env_u16(p, "PG_PORT", 5432),
            database: profiled_env_or(p, "PG_DATABASE", "timetable"),
            username: profiled_env_opt(p, "PG_USERNAME"),
            password: profiled_env_opt(p, "PG_PASSWORD"),
            ssl_mode: profiled_env_or(p, "PG_SSL_MODE", "prefer"),
            max_connections: profiled_env_u32(p, "PG_MAX_CONNECTIONS", 10),
        }
    }

    pub fn connection_string(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let user = self.username.as_deref().unwrap_or("postgres");
        let pass = self.password.as_deref().unwrap_or("");
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            user, pass, self.host, self.port, self.database, self.ssl_mode
        )
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() || self.username.is_some()
    }
}

// ── SMTP ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub tls: bool,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Sender mailbox, e.g. `"Scolarité <scolarite@example.com>"`.
    pub from: Option<String>,
}

impl SmtpConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_opt(p, "SMTP_HOST"),
            port: profiled_env_u16(p, "SMTP_PORT", 587),
            tls: profiled_env_bool(p, "SMTP_TLS", true),
            username: profiled_env_opt(p, "SMTP_USERNAME"),
            password: profiled_env_opt(p, "SMTP_PASSWORD"),
            from: profiled_env_opt(p, "MAIL_FROM"),
        }
    }

    /// Relay host and sender mailbox, when both are set.
    pub fn endpoint(&self) -> Option<(&str, &str)> {
        Some((self.host.as_deref()?, self.from.as_deref()?))
    }
}

// ── Mail templates ────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailConfig {
    /// Minijinja override for the publication subject.
    pub subject_template: Option<String>,
    /// Minijinja override for the publication body.
    pub body_template: Option<String>,
}

impl MailConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            subject_template: profiled_env_opt(p, "MAIL_SUBJECT_TEMPLATE"),
            body_template: profiled_env_opt(p, "MAIL_BODY_TEMPLATE"),
        }
    }
}

// ── Scheduler ─────────────────────────────────────────────────

pub const DEFAULT_WEEK_CRON: &str = "0 0 * * Mon";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Cron expression for the current-week refresh (5 or 6 fields, local time).
    pub week_cron: String,
}

impl SchedulerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            enabled: profiled_env_bool(p, "SCHEDULER_ENABLED", true),
            week_cron: profiled_env_or(p, "WEEK_SCHEDULE_CRON", DEFAULT_WEEK_CRON),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sets a variable for the lifetime of the guard, then puts back
    /// whatever the environment held before.
    struct EnvVarGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let previous = std::env::var(key).ok();
            std::env::set_var(key, value);
            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match &self.previous {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }

    #[test]
    fn profiled_key_wins_over_plain_key() {
        let _db = EnvVarGuard::set("TTCFG_TEST_PG_DATABASE", "school_prod");
        let _port = EnvVarGuard::set("TTCFG_TEST_PG_PORT", "6543");

        let config = Config::for_profile("ttcfg_test");
        assert_eq!(config.profile, "TTCFG_TEST");
        assert_eq!(config.postgres.database, "school_prod");
        assert_eq!(config.postgres.port, 6543);
    }

    #[test]
    fn plain_key_is_the_fallback() {
        let _plain = EnvVarGuard::set("TTCFG_PLAIN_KEY", "from-plain");
        assert_eq!(
            profiled_env_opt("TTCFG_FALLBACK", "TTCFG_PLAIN_KEY").as_deref(),
            Some("from-plain")
        );

        let _profiled = EnvVarGuard::set("TTCFG_FALLBACK_TTCFG_PLAIN_KEY", "from-profile");
        assert_eq!(
            profiled_env_opt("TTCFG_FALLBACK", "TTCFG_PLAIN_KEY").as_deref(),
            Some("from-profile")
        );
    }

    #[test]
    fn env_guard_restores_previous_value() {
        std::env::set_var("TTCFG_GUARDED_KEY", "developer-value");
        {
            let _guard = EnvVarGuard::set("TTCFG_GUARDED_KEY", "test-value");
            assert_eq!(std::env::var("TTCFG_GUARDED_KEY").unwrap(), "test-value");
        }
        assert_eq!(std::env::var("TTCFG_GUARDED_KEY").unwrap(), "developer-value");
        std::env::remove_var("TTCFG_GUARDED_KEY");
    }

    #[test]
    fn connection_string_prefers_url_override() {
        let mut pg = PostgresConfig {
            url: None,
            host: "db".into(),
            port: 5433,
            database: "timetable".into(),
            username: Some("app".into()),
            password: Some("secret".into()),
            ssl_mode: "require".into(),
            max_connections: 5,
        };
        assert_eq!(
            pg.connection_string(),
            "postgres://app:secret@db:5433/timetable?sslmode=require"
        );
        assert!(pg.is_configured());

        pg.url = Some("postgres://other/db".into());
        assert_eq!(pg.connection_string(), "postgres://other/db");
    }

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        std::env::set_var("TTBOOL_SCHEDULER_ENABLED", "off");
        let sched = SchedulerConfig::from_env_profiled("TTBOOL");
        assert!(!sched.enabled);
        std::env::set_var("TTBOOL_SCHEDULER_ENABLED", "Yes");
        let sched = SchedulerConfig::from_env_profiled("TTBOOL");
        assert!(sched.enabled);
        std::env::remove_var("TTBOOL_SCHEDULER_ENABLED");
    }

    #[test]
    fn smtp_needs_host_and_sender() {
        let mut smtp = SmtpConfig {
            host: Some("smtp.example.com".into()),
            port: 587,
            tls: true,
            username: None,
            password: None,
            from: None,
        };
        assert_eq!(smtp.endpoint(), None);

        smtp.from = Some("scolarite@example.com".into());
        assert_eq!(
            smtp.endpoint(),
            Some(("smtp.example.com", "scolarite@example.com"))
        );
    }
}
