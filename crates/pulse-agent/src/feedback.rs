//! Usage detection and weight updates.
//!
//! Both steps are pure; the caller commits the result in one store call.

use chrono::{DateTime, Duration, Utc};
use pulse_core::{Idea, IdeaStatus, LearningParams, ProfilePost, WeightSet};
use pulse_db::IdeaResolution;

use crate::terms::terms;

/// How long after sending a post can still count as using the idea.
pub const USAGE_WINDOW_HOURS: i64 = 48;
/// Share of the idea's keywords a caption must contain.
pub const MIN_KEYWORD_OVERLAP: f64 = 0.3;
/// Sent ideas without a matching post become skipped after this long.
pub const SKIP_AFTER_DAYS: i64 = 7;

/// Fraction of `idea_text` keywords that also appear in `caption`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn keyword_overlap(idea_text: &str, caption: &str) -> f64 {
    let idea_terms = terms(idea_text);
    if idea_terms.is_empty() {
        return 0.0;
    }
    let caption_terms = terms(caption);
    let shared = idea_terms.intersection(&caption_terms).count();
    shared as f64 / idea_terms.len() as f64
}

/// Resolve `sent` ideas against the posts published since they were sent.
///
/// An idea becomes `used` when a post published within
/// [`USAGE_WINDOW_HOURS`] of sending shares at least
/// [`MIN_KEYWORD_OVERLAP`] of its keywords; the best-overlapping post
/// supplies the observed engagement. Ideas sent more than
/// [`SKIP_AFTER_DAYS`] before `now` without a match become `skipped`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn detect_outcomes(
    ideas: &[Idea],
    posts: &[ProfilePost],
    now: DateTime<Utc>,
) -> Vec<IdeaResolution> {
    ideas
        .iter()
        .filter(|idea| idea.status == IdeaStatus::Sent)
        .filter_map(|idea| {
            let sent_at = idea.sent_at.unwrap_or(idea.created_at);
            let window_end = sent_at + Duration::hours(USAGE_WINDOW_HOURS);
            let text = idea.text();

            let best = posts
                .iter()
                .filter(|p| p.posted_at.is_some_and(|at| at >= sent_at && at <= window_end))
                .map(|p| (keyword_overlap(&text, &p.caption), p))
                .filter(|(overlap, _)| *overlap >= MIN_KEYWORD_OVERLAP)
                .max_by(|a, b| a.0.total_cmp(&b.0));

            if let Some((overlap, post)) = best {
                tracing::debug!(idea_id = idea.id, post_id = %post.post_id, overlap, "idea used");
                return Some(IdeaResolution {
                    idea_id: idea.id,
                    status: IdeaStatus::Used,
                    observed_engagement: Some(post.engagement() as f64),
                });
            }
            (now - sent_at > Duration::days(SKIP_AFTER_DAYS)).then_some(IdeaResolution {
                idea_id: idea.id,
                status: IdeaStatus::Skipped,
                observed_engagement: None,
            })
        })
        .collect()
}

/// New weights and the ideas that produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightPlan {
    /// Only patterns whose weight was touched, in pattern order.
    pub weights: Vec<(String, f64)>,
    pub evaluated_ids: Vec<i64>,
}

/// Apply the clamped update rule for every resolved, unevaluated idea with
/// both engagement figures, in `ideas` order.
#[must_use]
pub fn compute_updates(current: &WeightSet, params: &LearningParams, ideas: &[Idea]) -> WeightPlan {
    let mut weights = current.clone();
    let mut touched = std::collections::BTreeSet::new();
    let mut evaluated_ids = Vec::new();

    for idea in ideas {
        if !matches!(idea.status, IdeaStatus::Used | IdeaStatus::Skipped)
            || idea.evaluated_at.is_some()
        {
            continue;
        }
        let (Some(predicted), Some(observed)) = (idea.predicted_engagement, idea.observed_engagement)
        else {
            continue;
        };
        let before = weights.get(&idea.pattern);
        let after = weights.apply_outcome(params, &idea.pattern, predicted, observed);
        tracing::debug!(
            idea_id = idea.id,
            pattern = %idea.pattern,
            predicted,
            observed,
            before,
            after,
            "weight updated"
        );
        touched.insert(idea.pattern.clone());
        evaluated_ids.push(idea.id);
    }

    WeightPlan {
        weights: touched
            .into_iter()
            .map(|p| {
                let w = weights.get(&p);
                (p, w)
            })
            .collect(),
        evaluated_ids,
    }
}

/// Apply `resolutions` to copies of the matching ideas so they can be
/// evaluated in the same pass.
#[must_use]
pub fn resolved_copies(ideas: &[Idea], resolutions: &[IdeaResolution], at: DateTime<Utc>) -> Vec<Idea> {
    resolutions
        .iter()
        .filter_map(|r| {
            let mut idea = ideas.iter().find(|i| i.id == r.idea_id)?.clone();
            idea.status = r.status;
            idea.observed_engagement = r.observed_engagement.or(idea.observed_engagement);
            idea.evaluated_at = None;
            if idea.sent_at.is_none() {
                idea.sent_at = Some(at);
            }
            Some(idea)
        })
        .collect()
}

#[cfg(test)]
#[path = "feedback_test.rs"]
mod tests;
