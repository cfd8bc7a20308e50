//! Prompt builders for the hosted model.

use std::fmt::Write as _;

use pulse_analysis::AnalysisRequest;
use pulse_core::{CreatorProfile, MessageCategory, ProfilePost, TrendItem};

const ANALYSIS_MAX_TOKENS: u32 = 1500;
const IDEAS_MAX_TOKENS: u32 = 1024;
/// Posts summarised in an analysis prompt.
const MAX_POSTS_IN_PROMPT: usize = 30;
const MAX_CAPTION_CHARS: usize = 150;
const MAX_TRENDS_IN_PROMPT: usize = 5;

fn system_prompt(profile: &CreatorProfile) -> String {
    let partner = profile
        .partner_name
        .as_deref()
        .map(|p| format!(" They often create content with their partner {p}."))
        .unwrap_or_default();
    format!(
        "You are a social media strategist helping {name}, a content creator.{partner} \
         Be direct and practical. Write in the language with code \"{language}\".",
        name = profile.name,
        language = profile.language,
    )
}

/// Ask for an analysis of what works on the creator's recent posts.
#[must_use]
pub fn profile_analysis(profile: &CreatorProfile, posts: &[ProfilePost]) -> AnalysisRequest {
    let mut prompt = String::from(
        "Analyse these recent posts. Identify which content patterns get the most \
         engagement, which hooks work, and what to do more of.\n\nPosts (newest first):\n",
    );
    for post in posts.iter().take(MAX_POSTS_IN_PROMPT) {
        let date = post
            .posted_at
            .map_or_else(|| "undated".to_owned(), |d| d.format("%Y-%m-%d").to_string());
        let caption: String = post
            .caption
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(MAX_CAPTION_CHARS)
            .collect();
        let _ = writeln!(
            prompt,
            "- [{platform} {date}] views={views} likes={likes} comments={comments} shares={shares} :: {caption}",
            platform = post.platform,
            views = post.views,
            likes = post.likes,
            comments = post.comments,
            shares = post.shares,
        );
    }
    let _ = write!(
        prompt,
        "\nKnown content patterns: {}.\nKeep the analysis under 300 words.",
        profile.patterns.join(", ")
    );
    AnalysisRequest::new(system_prompt(profile), prompt, ANALYSIS_MAX_TOKENS)
}

/// Ask for `count` content ideas suited to a `category` message.
#[must_use]
pub fn idea_generation(
    profile: &CreatorProfile,
    analysis: Option<&str>,
    trends: &[TrendItem],
    category: MessageCategory,
    count: usize,
) -> AnalysisRequest {
    let prompt = idea_prompt(profile, analysis, trends, category, count, &[]);
    AnalysisRequest::new(system_prompt(profile), prompt, IDEAS_MAX_TOKENS)
}

/// Like [`idea_generation`], quoting the ideas that were too vague.
#[must_use]
pub fn idea_regeneration(
    profile: &CreatorProfile,
    analysis: Option<&str>,
    trends: &[TrendItem],
    category: MessageCategory,
    count: usize,
    rejected: &[String],
) -> AnalysisRequest {
    let prompt = idea_prompt(profile, analysis, trends, category, count, rejected);
    AnalysisRequest::new(system_prompt(profile), prompt, IDEAS_MAX_TOKENS)
}

fn idea_prompt(
    profile: &CreatorProfile,
    analysis: Option<&str>,
    trends: &[TrendItem],
    category: MessageCategory,
    count: usize,
    rejected: &[String],
) -> String {
    let mut prompt = format!(
        "Suggest {count} content ideas for the {category} reminder.\n\
         Each idea must start from a concrete action (film, record, ask, show...) and \
         name something specific: a person, an object, a number with a unit, a time, or \
         an exact line to say.\n\
         Allowed patterns: {patterns}.\n",
        patterns = profile.patterns.join(", "),
    );

    match analysis.map(str::trim).filter(|a| !a.is_empty()) {
        Some(analysis) => {
            let _ = write!(prompt, "\nWhat works on this profile:\n{analysis}\n");
        }
        None => prompt.push_str("\nNo profile analysis is available yet.\n"),
    }

    if !trends.is_empty() {
        prompt.push_str("\nCurrent trends:\n");
        for trend in trends.iter().take(MAX_TRENDS_IN_PROMPT) {
            let _ = writeln!(prompt, "- {}", trend.headline);
        }
    }

    if !rejected.is_empty() {
        prompt.push_str("\nThese ideas were too vague. Do not repeat them:\n");
        for text in rejected {
            let _ = writeln!(prompt, "- {text}");
        }
    }

    prompt.push_str(
        "\nAnswer with only a JSON array of objects with the keys \
         \"title\", \"hook\", \"description\" and \"pattern\".",
    );
    prompt
}
