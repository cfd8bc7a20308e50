use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Which of the four daily reminders a message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageCategory {
    Morning,
    Midday,
    Afternoon,
    Evening,
}

impl MessageCategory {
    pub const ALL: [MessageCategory; 4] = [
        MessageCategory::Morning,
        MessageCategory::Midday,
        MessageCategory::Afternoon,
        MessageCategory::Evening,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MessageCategory::Morning => "morning",
            MessageCategory::Midday => "midday",
            MessageCategory::Afternoon => "afternoon",
            MessageCategory::Evening => "evening",
        }
    }

    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            MessageCategory::Morning => "☀️",
            MessageCategory::Midday => "🔥",
            MessageCategory::Afternoon => "📱",
            MessageCategory::Evening => "🌙",
        }
    }
}

impl std::fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "message category",
                value: s.to_string(),
            })
    }
}

/// What a stored message was: one of the daily reminders or a standalone notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Daily(MessageCategory),
    NoPostReminder,
    WeeklyReport,
}

impl MessageKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Daily(category) => category.as_str(),
            MessageKind::NoPostReminder => "no_post_reminder",
            MessageKind::WeeklyReport => "weekly_report",
        }
    }
}

impl From<MessageCategory> for MessageKind {
    fn from(category: MessageCategory) -> Self {
        MessageKind::Daily(category)
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_post_reminder" => Ok(MessageKind::NoPostReminder),
            "weekly_report" => Ok(MessageKind::WeeklyReport),
            other => other.parse::<MessageCategory>().map(MessageKind::Daily),
        }
    }
}

/// Delivery state reported by the messaging provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Queued,
    Sent,
    Delivered,
    Read,
    Failed,
    Undelivered,
}

impl DeliveryStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Queued => "queued",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Read => "read",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Undelivered => "undelivered",
        }
    }

    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, DeliveryStatus::Failed | DeliveryStatus::Undelivered)
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = CoreError;

    /// Accepts the provider's status vocabulary. `accepted`, `scheduled` and
    /// `sending` are folded into `queued`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "queued" | "accepted" | "scheduled" | "sending" => Ok(DeliveryStatus::Queued),
            "sent" => Ok(DeliveryStatus::Sent),
            "delivered" => Ok(DeliveryStatus::Delivered),
            "read" => Ok(DeliveryStatus::Read),
            "failed" => Ok(DeliveryStatus::Failed),
            "undelivered" => Ok(DeliveryStatus::Undelivered),
            _ => Err(CoreError::UnknownVariant {
                kind: "delivery status",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: i64,
    pub slot_name: String,
    pub slot_day: NaiveDate,
    pub sent_at: DateTime<Utc>,
    pub category: MessageKind,
    pub body: String,
    pub delivery_status: DeliveryStatus,
    pub provider_id: Option<String>,
}
