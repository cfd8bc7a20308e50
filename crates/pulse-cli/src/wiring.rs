//! Builds the production collaborators from configuration.

use std::sync::Arc;

use anyhow::Context;
use pulse_agent::{Agent, AgentSettings, Collaborators};
use pulse_analysis::AnthropicClient;
use pulse_core::{AgentProfile, AppConfig};
use pulse_messaging::TwilioClient;
use pulse_scraper::ApifyClient;
use pulse_trends::RssTrendSource;
use sqlx::SqlitePool;

fn credential(value: Option<&String>) -> &str {
    value.map_or("", String::as_str)
}

pub(crate) fn messaging_client(config: &AppConfig) -> anyhow::Result<TwilioClient> {
    let (Some(sid), Some(token), Some(from)) = (
        config.twilio_account_sid.as_deref(),
        config.twilio_auth_token.as_deref(),
        config.twilio_whatsapp_number.as_deref(),
    ) else {
        anyhow::bail!("Twilio credentials are not configured");
    };
    TwilioClient::new(
        sid,
        token,
        from,
        config.http_timeout_secs,
        &config.http_user_agent,
    )
    .context("failed to build Twilio client")
}

pub(crate) fn build_agent(
    pool: SqlitePool,
    config: &AppConfig,
    profile: AgentProfile,
) -> anyhow::Result<Arc<Agent>> {
    let scraper = ApifyClient::new(
        credential(config.apify_token.as_ref()),
        config.http_timeout_secs,
        &config.http_user_agent,
        config.http_max_retries,
        config.http_retry_backoff_base_secs,
    )
    .context("failed to build Apify client")?;
    let trends = RssTrendSource::new(config.http_timeout_secs, &config.http_user_agent)
        .context("failed to build feed client")?;
    let analysis = AnthropicClient::new(
        credential(config.anthropic_api_key.as_ref()),
        &config.anthropic_model,
        config.http_timeout_secs,
        &config.http_user_agent,
        config.http_max_retries,
        config.http_retry_backoff_base_secs,
    )
    .context("failed to build Anthropic client")?;
    let messaging = TwilioClient::new(
        credential(config.twilio_account_sid.as_ref()),
        credential(config.twilio_auth_token.as_ref()),
        credential(config.twilio_whatsapp_number.as_ref()),
        config.http_timeout_secs,
        &config.http_user_agent,
    )
    .context("failed to build Twilio client")?;

    let clients = Collaborators {
        scraper: Arc::new(scraper),
        trends: Arc::new(trends),
        analysis: Arc::new(analysis),
        messaging: Arc::new(messaging),
    };
    Ok(Arc::new(Agent::new(
        pool,
        clients,
        profile,
        AgentSettings::from_app_config(config),
    )))
}
