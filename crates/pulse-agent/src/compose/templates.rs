//! Message bodies per category and the fallback ideas.

use pulse_core::{MessageCategory, NewIdea, PostingWindow, TrendItem};
use pulse_messaging::MAX_BODY_CHARS;

/// Trends mentioned in one message.
pub const MAX_TRENDS_PER_MESSAGE: usize = 2;

const ELLIPSIS: char = '…';

/// Everything a template can draw on.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub creator_name: &'a str,
    pub partner_name: Option<&'a str>,
    pub idea: &'a NewIdea,
    pub trends: &'a [TrendItem],
    pub window: PostingWindow,
}

/// Render the message for `category`, at most [`MAX_BODY_CHARS`] characters.
#[must_use]
pub fn render(category: MessageCategory, ctx: &RenderContext<'_>) -> String {
    let emoji = category.emoji();
    let name = ctx.creator_name;
    let idea = idea_block(ctx);
    let trends = trend_lines(ctx.trends);
    let window = ctx.window;

    let body = match category {
        MessageCategory::Morning => {
            let mut body = format!("{emoji} Good morning {name}!\n\nToday's idea: {idea}");
            if let Some(trends) = trends {
                body.push_str(&format!("\n\n📈 Trending now:\n{trends}"));
            }
            body.push_str(&format!("\n\n⏰ Best time to post: {window}"));
            body
        }
        MessageCategory::Midday => {
            let trends = trends.unwrap_or_else(|| "Nothing big is trending right now.".to_owned());
            format!("{emoji} Quick midday check, {name}\n\n{trends}\n\n💡 {idea}")
        }
        MessageCategory::Afternoon => format!(
            "{emoji} Story time, {name}!\n\nA quick one for today: {idea}\n\n⏰ Post between {window}"
        ),
        MessageCategory::Evening => format!(
            "{emoji} Evening, {name}\n\nFor tomorrow: {idea}\n\nTomorrow's best window is {window}. Rest up!"
        ),
    };

    truncate_body(&fill_placeholders(&body, ctx.creator_name, ctx.partner_name), MAX_BODY_CHARS)
}

fn idea_block(ctx: &RenderContext<'_>) -> String {
    let idea = ctx.idea;
    let mut block = idea.title.trim().to_owned();
    if let Some(hook) = idea.hook.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
        block.push_str(&format!("\n🎣 Hook: {hook}"));
    }
    let description = idea.description.trim();
    if !description.is_empty() && description != idea.title.trim() {
        block.push('\n');
        block.push_str(description);
    }
    block
}

fn trend_lines(trends: &[TrendItem]) -> Option<String> {
    let lines: Vec<String> = trends
        .iter()
        .take(MAX_TRENDS_PER_MESSAGE)
        .map(|t| format!("• {}", t.headline.trim()))
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

/// Replace `{name}` and `{partner}` with the configured names.
#[must_use]
pub fn fill_placeholders(text: &str, creator_name: &str, partner_name: Option<&str>) -> String {
    text.replace("{name}", creator_name)
        .replace("{partner}", partner_name.unwrap_or("your partner"))
}

/// Cut `body` to at most `max_chars` characters, ending with an ellipsis
/// when anything was removed.
#[must_use]
pub fn truncate_body(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_owned();
    }
    let mut cut: String = body.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push(ELLIPSIS);
    cut
}

/// The fallback idea for `category`. Its text always passes the
/// specificity check once placeholders are filled.
#[must_use]
pub fn default_idea(category: MessageCategory, pattern: &str) -> NewIdea {
    let (title, hook, description) = match category {
        MessageCategory::Morning => (
            "Surprise reaction",
            "Wait for the last line",
            "Film {partner} reacting to a 30-second preview of your newest song",
        ),
        MessageCategory::Midday => (
            "Three takes",
            "Which one is best?",
            "Record 3 takes of the chorus and let viewers vote in the comments",
        ),
        MessageCategory::Afternoon => (
            "Behind the scenes",
            "This is how it really looks",
            "Share a 15-second clip of your practice session before it ends",
        ),
        MessageCategory::Evening => (
            "Tomorrow's duet",
            "Guess who's joining me",
            "Plan a 60-second duet with {partner} for tomorrow's posting window",
        ),
    };
    NewIdea {
        title: title.to_owned(),
        hook: Some(hook.to_owned()),
        description: description.to_owned(),
        pattern: pattern.to_owned(),
        predicted_engagement: None,
        trend_id: None,
    }
}
