use std::path::PathBuf;

use chrono_tz::Tz;

use crate::weights::LearningParams;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub profile_path: PathBuf,
    /// Operating timezone; slot times and calendar days are evaluated here.
    pub timezone: Tz,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub apify_token: Option<String>,
    pub instagram_handle: Option<String>,
    pub tiktok_handle: Option<String>,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_whatsapp_number: Option<String>,
    pub recipient_number: Option<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub http_user_agent: String,
    pub http_max_retries: u32,
    pub http_retry_backoff_base_secs: u64,
    pub scan_max_posts: u32,
    pub slot_tolerance_secs: u64,
    pub slot_timeout_secs: u64,
    pub learning: LearningParams,
    /// Engagement assumed for a pattern with weight 1.0 when no posts are stored yet.
    pub baseline_engagement: f64,
    pub trend_max_age_days: i64,
}

impl AppConfig {
    /// Names of credentials that must be set before the agent can talk to
    /// its collaborators. Empty when everything is configured.
    #[must_use]
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let checks: [(&'static str, &Option<String>); 6] = [
            ("ANTHROPIC_API_KEY", &self.anthropic_api_key),
            ("APIFY_TOKEN", &self.apify_token),
            ("TWILIO_ACCOUNT_SID", &self.twilio_account_sid),
            ("TWILIO_AUTH_TOKEN", &self.twilio_auth_token),
            ("TWILIO_WHATSAPP_NUMBER", &self.twilio_whatsapp_number),
            ("MY_WHATSAPP_NUMBER", &self.recipient_number),
        ];
        for (name, value) in checks {
            if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
                missing.push(name);
            }
        }
        if self.instagram_handle.is_none() && self.tiktok_handle.is_none() {
            missing.push("INSTAGRAM_HANDLE or TIKTOK_HANDLE");
        }
        missing
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("profile_path", &self.profile_path)
            .field("timezone", &self.timezone)
            .field("database_url", &self.database_url)
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("anthropic_model", &self.anthropic_model)
            .field("apify_token", &redact(&self.apify_token))
            .field("instagram_handle", &self.instagram_handle)
            .field("tiktok_handle", &self.tiktok_handle)
            .field("twilio_account_sid", &redact(&self.twilio_account_sid))
            .field("twilio_auth_token", &redact(&self.twilio_auth_token))
            .field("twilio_whatsapp_number", &self.twilio_whatsapp_number)
            .field("recipient_number", &redact(&self.recipient_number))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("http_user_agent", &self.http_user_agent)
            .field("http_max_retries", &self.http_max_retries)
            .field(
                "http_retry_backoff_base_secs",
                &self.http_retry_backoff_base_secs,
            )
            .field("scan_max_posts", &self.scan_max_posts)
            .field("slot_tolerance_secs", &self.slot_tolerance_secs)
            .field("slot_timeout_secs", &self.slot_timeout_secs)
            .field("learning", &self.learning)
            .field("baseline_engagement", &self.baseline_engagement)
            .field("trend_max_age_days", &self.trend_max_age_days)
            .finish()
    }
}
