use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Lifecycle of a generated idea. Moves forward only:
/// `proposed -> sent -> used | skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaStatus {
    Proposed,
    Sent,
    Used,
    Skipped,
}

impl IdeaStatus {
    pub const ALL: [IdeaStatus; 4] = [
        IdeaStatus::Proposed,
        IdeaStatus::Sent,
        IdeaStatus::Used,
        IdeaStatus::Skipped,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IdeaStatus::Proposed => "proposed",
            IdeaStatus::Sent => "sent",
            IdeaStatus::Used => "used",
            IdeaStatus::Skipped => "skipped",
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: IdeaStatus) -> bool {
        matches!(
            (self, next),
            (IdeaStatus::Proposed, IdeaStatus::Sent)
                | (IdeaStatus::Sent, IdeaStatus::Used | IdeaStatus::Skipped)
        )
    }

    /// Validate a move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidStatusTransition`] for anything other than a
    /// single forward step.
    pub fn transition(self, next: IdeaStatus) -> Result<IdeaStatus, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStatusTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdeaStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdeaStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "idea status",
                value: s.to_string(),
            })
    }
}

/// An idea ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIdea {
    pub title: String,
    pub hook: Option<String>,
    pub description: String,
    pub pattern: String,
    pub predicted_engagement: Option<f64>,
    pub trend_id: Option<i64>,
}

impl NewIdea {
    /// Title, hook and description joined; the text the specificity check and
    /// usage detection look at.
    #[must_use]
    pub fn text(&self) -> String {
        let mut parts = vec![self.title.as_str()];
        if let Some(hook) = self.hook.as_deref() {
            parts.push(hook);
        }
        parts.push(self.description.as_str());
        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub hook: Option<String>,
    pub description: String,
    pub pattern: String,
    pub predicted_engagement: Option<f64>,
    pub observed_engagement: Option<f64>,
    pub status: IdeaStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub evaluated_at: Option<DateTime<Utc>>,
    pub trend_id: Option<i64>,
}

impl Idea {
    #[must_use]
    pub fn text(&self) -> String {
        NewIdea {
            title: self.title.clone(),
            hook: self.hook.clone(),
            description: self.description.clone(),
            pattern: self.pattern.clone(),
            predicted_engagement: self.predicted_engagement,
            trend_id: self.trend_id,
        }
        .text()
    }
}
