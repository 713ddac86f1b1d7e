use serde::Deserialize;

pub use lexflow_core::config::Config;

/// Which transactional mail provider the service sends through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailerProvider {
    Sendgrid,
    Postmark,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutomationConfig {
    pub database_url: String,
    #[serde(default = "default_port")]
    pub automation_port: u16,
    pub mailer_provider: MailerProvider,
    pub mailer_api_key: String,
    pub mailer_from: String,
    /// Override the provider API origin; used by tests, left unset in prod.
    pub mailer_base_url: Option<String>,
    #[serde(default = "default_dispatch_batch_size")]
    pub dispatch_batch_size: u64,
    /// Minutes after which a `processing` webhook row is assumed crashed and
    /// may be reclaimed.
    #[serde(default = "default_webhook_stale_after_minutes")]
    pub webhook_stale_after_minutes: i64,
}

impl Config for AutomationConfig {}

fn default_port() -> u16 {
    3115
}

fn default_dispatch_batch_size() -> u64 {
    50
}

fn default_webhook_stale_after_minutes() -> i64 {
    15
}
