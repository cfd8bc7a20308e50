use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;

use crate::app_config::{AppConfig, Environment};
use crate::weights::LearningParams;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Credentials are optional here; callers decide whether to insist on them via
/// [`AppConfig::missing_credentials`].
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_num = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<i64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = or_default("DATABASE_URL", "sqlite://data/agent.db");
    let env = parse_environment(&or_default("PULSE_ENV", "development"));
    let log_level = or_default("PULSE_LOG_LEVEL", "info");
    let profile_path = PathBuf::from(or_default("PULSE_PROFILE_PATH", "./config/profile.yaml"));

    let timezone_raw = or_default("PULSE_TIMEZONE", "Asia/Jerusalem");
    let timezone = Tz::from_str(&timezone_raw).map_err(|e| ConfigError::InvalidEnvVar {
        var: "PULSE_TIMEZONE".to_string(),
        reason: e.to_string(),
    })?;

    let learning = LearningParams {
        learning_rate: parse_num("PULSE_LEARNING_RATE", "0.001")?,
        min_weight: parse_num("PULSE_WEIGHT_MIN", "0.1")?,
        max_weight: parse_num("PULSE_WEIGHT_MAX", "5.0")?,
    };
    if learning.min_weight > learning.max_weight {
        return Err(ConfigError::InvalidEnvVar {
            var: "PULSE_WEIGHT_MIN".to_string(),
            reason: format!(
                "minimum weight {} exceeds maximum weight {}",
                learning.min_weight, learning.max_weight
            ),
        });
    }

    let slot_tolerance_secs = parse_u64("PULSE_SLOT_TOLERANCE_SECS", "60")?;
    let slot_timeout_secs = parse_u64("PULSE_SLOT_TIMEOUT_SECS", "600")?;
    if slot_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PULSE_SLOT_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        profile_path,
        timezone,
        anthropic_api_key: optional("ANTHROPIC_API_KEY"),
        anthropic_model: or_default("PULSE_ANTHROPIC_MODEL", "claude-sonnet-4-20250514"),
        apify_token: optional("APIFY_TOKEN"),
        instagram_handle: optional("INSTAGRAM_HANDLE"),
        tiktok_handle: optional("TIKTOK_HANDLE"),
        twilio_account_sid: optional("TWILIO_ACCOUNT_SID"),
        twilio_auth_token: optional("TWILIO_AUTH_TOKEN"),
        twilio_whatsapp_number: optional("TWILIO_WHATSAPP_NUMBER"),
        recipient_number: optional("MY_WHATSAPP_NUMBER"),
        db_max_connections: parse_u32("PULSE_DB_MAX_CONNECTIONS", "5")?,
        db_acquire_timeout_secs: parse_u64("PULSE_DB_ACQUIRE_TIMEOUT_SECS", "10")?,
        http_timeout_secs: parse_u64("PULSE_HTTP_TIMEOUT_SECS", "120")?,
        http_user_agent: or_default("PULSE_HTTP_USER_AGENT", "pulse/0.1 (content-agent)"),
        http_max_retries: parse_u32("PULSE_HTTP_MAX_RETRIES", "3")?,
        http_retry_backoff_base_secs: parse_u64("PULSE_HTTP_RETRY_BACKOFF_BASE_SECS", "2")?,
        scan_max_posts: parse_u32("PULSE_SCAN_MAX_POSTS", "10")?,
        slot_tolerance_secs,
        slot_timeout_secs,
        learning,
        baseline_engagement: parse_num("PULSE_BASELINE_ENGAGEMENT", "100")?,
        trend_max_age_days: parse_i64("PULSE_TREND_MAX_AGE_DAYS", "7")?,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
