//! Turns model output into one idea and one message.
//!
//! Candidates that fail the specificity check are dropped. The rest are
//! scored by pattern weight plus a bonus for touching a current trend. When
//! nothing passes, the model is asked exactly once more; after that a fixed
//! fallback idea is used. Composition never fails.

pub mod parse;
pub mod templates;

use pulse_analysis::AnalysisClient;
use pulse_core::{CreatorProfile, MessageCategory, NewIdea, PostingWindow, TrendItem, WeightSet};

use crate::prompts;
use crate::specificity::{Specificity, SpecificityPolicy};
use crate::terms::terms;

pub use parse::{parse_candidates, Candidate};
pub use templates::{default_idea, fill_placeholders, render, truncate_body, RenderContext};

/// Added to the score of a candidate that mentions a current trend.
pub const TREND_BONUS: f64 = 0.5;
/// Ideas requested from the model per call.
const IDEAS_PER_REQUEST: usize = 5;
const FALLBACK_PATTERN: &str = "general";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdeaOrigin {
    Generated,
    Regenerated,
    Default,
}

impl IdeaOrigin {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IdeaOrigin::Generated => "generated",
            IdeaOrigin::Regenerated => "regenerated",
            IdeaOrigin::Default => "default",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredIdea {
    pub idea: NewIdea,
    pub score: f64,
}

/// Ideas that passed, best first.
#[derive(Debug, Clone)]
pub struct IdeaBatch {
    pub ideas: Vec<ScoredIdea>,
    pub origin: IdeaOrigin,
    /// Candidates rejected as too vague across all attempts.
    pub rejected: usize,
}

#[derive(Debug, Clone)]
pub struct Composition {
    pub idea: NewIdea,
    pub body: String,
    pub origin: IdeaOrigin,
    pub rejected: usize,
}

/// Inputs gathered from the store for one composition.
#[derive(Debug, Clone, Copy)]
pub struct ComposeInput<'a> {
    pub category: MessageCategory,
    pub analysis: Option<&'a str>,
    /// Current trends, most relevant first.
    pub trends: &'a [TrendItem],
    pub weights: &'a WeightSet,
    /// Expected engagement of a pattern with weight 1.0.
    pub baseline_engagement: f64,
}

pub struct Composer {
    creator: CreatorProfile,
    window: PostingWindow,
    policy: SpecificityPolicy,
}

impl Composer {
    #[must_use]
    pub fn new(creator: CreatorProfile, window: PostingWindow) -> Self {
        let names = std::iter::once(creator.name.clone()).chain(creator.partner_name.clone());
        let policy = SpecificityPolicy::with_names(names);
        Self {
            creator,
            window,
            policy,
        }
    }

    #[must_use]
    pub fn creator(&self) -> &CreatorProfile {
        &self.creator
    }

    fn fill(&self, text: &str) -> String {
        fill_placeholders(text, &self.creator.name, self.creator.partner_name.as_deref())
    }

    fn default_pattern(&self) -> &str {
        self.creator
            .patterns
            .first()
            .map_or(FALLBACK_PATTERN, String::as_str)
    }

    /// Check and score `candidates`.
    ///
    /// Returns the passing ideas by descending score, ties in candidate
    /// order, and the text of every rejected candidate.
    #[must_use]
    pub fn rank(
        &self,
        candidates: Vec<Candidate>,
        input: &ComposeInput<'_>,
    ) -> (Vec<ScoredIdea>, Vec<String>) {
        let mut passed = Vec::new();
        let mut rejected = Vec::new();

        for candidate in candidates {
            let text = self.fill(&candidate.text());
            if let Specificity::Vague(reason) = self.policy.check(&text) {
                tracing::debug!(%reason, candidate = %text, "candidate rejected");
                rejected.push(text);
                continue;
            }

            let pattern = candidate
                .pattern
                .clone()
                .unwrap_or_else(|| self.default_pattern().to_owned());
            let weight = input.weights.get(&pattern);
            let candidate_terms = terms(&text);
            let trend = input.trends.iter().find(|t| {
                t.headline_terms()
                    .iter()
                    .any(|term| candidate_terms.contains(term))
            });
            let score = weight + if trend.is_some() { TREND_BONUS } else { 0.0 };

            passed.push(ScoredIdea {
                idea: NewIdea {
                    title: self.fill(&candidate.title),
                    hook: candidate.hook.as_deref().map(|h| self.fill(h)),
                    description: self.fill(&candidate.description),
                    predicted_engagement: Some(input.baseline_engagement * weight),
                    trend_id: trend.map(|t| t.id),
                    pattern,
                },
                score,
            });
        }

        passed.sort_by(|a, b| b.score.total_cmp(&a.score));
        (passed, rejected)
    }

    /// Up to `limit` ideas for `input.category`, never empty.
    pub async fn ideas(
        &self,
        analysis: &dyn AnalysisClient,
        input: &ComposeInput<'_>,
        limit: usize,
    ) -> IdeaBatch {
        let request = prompts::idea_generation(
            &self.creator,
            input.analysis,
            input.trends,
            input.category,
            IDEAS_PER_REQUEST,
        );
        let first = match analysis.complete(&request).await {
            Ok(text) => Some(parse_candidates(&text)),
            Err(e) => {
                tracing::warn!(error = %e, category = %input.category, "idea generation failed");
                None
            }
        };

        let mut rejected_total = 0;
        if let Some(candidates) = first {
            let (passed, rejected) = self.rank(candidates, input);
            rejected_total += rejected.len();
            if !passed.is_empty() {
                return batch(passed, IdeaOrigin::Generated, rejected_total, limit);
            }

            tracing::info!(
                category = %input.category,
                rejected = rejected.len(),
                "no specific idea, asking once more"
            );
            let request = prompts::idea_regeneration(
                &self.creator,
                input.analysis,
                input.trends,
                input.category,
                IDEAS_PER_REQUEST,
                &rejected,
            );
            match analysis.complete(&request).await {
                Ok(text) => {
                    let (passed, rejected) = self.rank(parse_candidates(&text), input);
                    rejected_total += rejected.len();
                    if !passed.is_empty() {
                        return batch(passed, IdeaOrigin::Regenerated, rejected_total, limit);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, category = %input.category, "idea regeneration failed");
                }
            }
        }

        let mut fallback = default_idea(input.category, self.default_pattern());
        fallback.description = self.fill(&fallback.description);
        let weight = input.weights.get(&fallback.pattern);
        fallback.predicted_engagement = Some(input.baseline_engagement * weight);
        tracing::info!(category = %input.category, "using default idea");
        batch(
            vec![ScoredIdea {
                idea: fallback,
                score: weight,
            }],
            IdeaOrigin::Default,
            rejected_total,
            limit,
        )
    }

    /// One idea and its rendered message for `input.category`.
    pub async fn compose(
        &self,
        analysis: &dyn AnalysisClient,
        input: &ComposeInput<'_>,
    ) -> Composition {
        let IdeaBatch {
            ideas,
            origin,
            rejected,
        } = self.ideas(analysis, input, 1).await;
        let idea = ideas
            .into_iter()
            .next()
            .map_or_else(|| default_idea(input.category, self.default_pattern()), |s| s.idea);
        let body = self.render(input.category, &idea, input.trends);
        Composition {
            idea,
            body,
            origin,
            rejected,
        }
    }

    /// Render `idea` with the trend it was matched to listed first.
    #[must_use]
    pub fn render(&self, category: MessageCategory, idea: &NewIdea, trends: &[TrendItem]) -> String {
        let mut ordered: Vec<TrendItem> = Vec::with_capacity(trends.len());
        if let Some(matched) = idea.trend_id.and_then(|id| trends.iter().find(|t| t.id == id)) {
            ordered.push(matched.clone());
        }
        ordered.extend(
            trends
                .iter()
                .filter(|t| Some(t.id) != idea.trend_id)
                .cloned(),
        );
        render(
            category,
            &RenderContext {
                creator_name: &self.creator.name,
                partner_name: self.creator.partner_name.as_deref(),
                idea,
                trends: &ordered,
                window: self.window,
            },
        )
    }
}

fn batch(mut ideas: Vec<ScoredIdea>, origin: IdeaOrigin, rejected: usize, limit: usize) -> IdeaBatch {
    ideas.truncate(limit.max(1));
    IdeaBatch {
        ideas,
        origin,
        rejected,
    }
}

#[cfg(test)]
#[path = "compose_test.rs"]
mod tests;
