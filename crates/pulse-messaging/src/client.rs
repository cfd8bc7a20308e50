use std::time::Duration;

use async_trait::async_trait;
use pulse_core::DeliveryStatus;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::MessagingError;
use crate::number::normalize_e164;

const DEFAULT_BASE_URL: &str = "https://api.twilio.com/";

/// Longest body the WhatsApp channel accepts in one message.
pub const MAX_BODY_CHARS: usize = 1600;

/// Twilio error codes that mean the recipient address itself is unusable.
const INVALID_RECIPIENT_CODES: &[i64] = &[21211, 21614, 63003];

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub status: DeliveryStatus,
    pub provider_id: Option<String>,
}

/// Delivers chat messages to a single recipient.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    async fn send(&self, recipient: &str, body: &str) -> Result<Delivery, MessagingError>;

    /// Current delivery status of a previously sent message.
    async fn delivery_status(&self, provider_id: &str) -> Result<DeliveryStatus, MessagingError>;
}

/// Twilio WhatsApp sender.
pub struct TwilioClient {
    client: Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    base_url: Url,
}

#[derive(Deserialize)]
struct MessageResource {
    sid: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct TwilioErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

impl TwilioClient {
    /// # Errors
    ///
    /// Returns [`MessagingError::InvalidRecipient`] if `from_number` is not a
    /// valid E.164 number, or [`MessagingError::Http`] if the client cannot
    /// be built.
    pub fn new(
        account_sid: &str,
        auth_token: &str,
        from_number: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, MessagingError> {
        Self::with_base_url(
            account_sid,
            auth_token,
            from_number,
            timeout_secs,
            user_agent,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// As [`TwilioClient::new`], plus [`MessagingError::InvalidBaseUrl`].
    pub fn with_base_url(
        account_sid: &str,
        auth_token: &str,
        from_number: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, MessagingError> {
        let from_number = normalize_e164(from_number)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| MessagingError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            account_sid: account_sid.to_owned(),
            auth_token: auth_token.to_owned(),
            from_number,
            base_url,
        })
    }

    fn resource_url(&self, suffix: &str) -> Result<Url, MessagingError> {
        let path = format!("2010-04-01/Accounts/{}/{suffix}", self.account_sid);
        self.base_url
            .join(&path)
            .map_err(|e| MessagingError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Decode a message resource, or turn an error body into a typed error.
    async fn read_resource(
        response: reqwest::Response,
        recipient: Option<&str>,
    ) -> Result<MessageResource, MessagingError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let parsed: Option<TwilioErrorBody> = serde_json::from_str(&body).ok();
            let code = parsed.as_ref().and_then(|p| p.code);
            let message = parsed
                .and_then(|p| p.message)
                .unwrap_or_else(|| body.chars().take(300).collect());
            if let (Some(number), Some(code)) = (recipient, code) {
                if INVALID_RECIPIENT_CODES.contains(&code) {
                    return Err(MessagingError::InvalidRecipient {
                        number: number.to_owned(),
                        reason: message,
                    });
                }
            }
            return Err(MessagingError::SendFailed {
                status: status.as_u16(),
                code,
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| MessagingError::Deserialize {
            context: "Twilio message resource".to_owned(),
            source: e,
        })
    }
}

/// Unknown provider statuses are treated as still queued.
fn parse_status(raw: Option<&str>) -> DeliveryStatus {
    raw.and_then(|s| s.parse().ok())
        .unwrap_or(DeliveryStatus::Queued)
}

#[async_trait]
impl MessagingClient for TwilioClient {
    async fn send(&self, recipient: &str, body: &str) -> Result<Delivery, MessagingError> {
        let to = normalize_e164(recipient)?;
        let url = self.resource_url("Messages.json")?;
        let body: String = body.chars().take(MAX_BODY_CHARS).collect();

        let from = format!("whatsapp:{}", self.from_number);
        let to_address = format!("whatsapp:{to}");
        let response = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("From", from.as_str()),
                ("To", to_address.as_str()),
                ("Body", body.as_str()),
            ])
            .send()
            .await?;

        let resource = Self::read_resource(response, Some(recipient)).await?;
        let delivery = Delivery {
            status: parse_status(resource.status.as_deref()),
            provider_id: resource.sid,
        };
        if delivery.status.is_failure() {
            return Err(MessagingError::SendFailed {
                status: 200,
                code: None,
                message: format!("provider reported {}", delivery.status),
            });
        }

        tracing::info!(
            provider_id = delivery.provider_id.as_deref().unwrap_or("-"),
            status = %delivery.status,
            chars = body.chars().count(),
            "whatsapp message accepted"
        );
        Ok(delivery)
    }

    async fn delivery_status(&self, provider_id: &str) -> Result<DeliveryStatus, MessagingError> {
        let url = self.resource_url(&format!("Messages/{provider_id}.json"))?;
        let response = self
            .client
            .get(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await?;
        let resource = Self::read_resource(response, None).await?;
        Ok(parse_status(resource.status.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_is_queued() {
        assert_eq!(parse_status(Some("mystery")), DeliveryStatus::Queued);
        assert_eq!(parse_status(None), DeliveryStatus::Queued);
        assert_eq!(parse_status(Some("delivered")), DeliveryStatus::Delivered);
    }

    #[test]
    fn invalid_sender_is_rejected_at_construction() {
        let result = TwilioClient::with_base_url("AC1", "tok", "12345", 5, "ua", "http://localhost");
        assert!(matches!(result, Err(MessagingError::InvalidRecipient { .. })));
    }

    #[test]
    fn resource_url_includes_account() {
        let client =
            TwilioClient::with_base_url("AC123", "tok", "+14155238886", 5, "ua", "http://localhost:1")
                .unwrap();
        assert_eq!(
            client.resource_url("Messages.json").unwrap().as_str(),
            "http://localhost:1/2010-04-01/Accounts/AC123/Messages.json"
        );
    }
}
