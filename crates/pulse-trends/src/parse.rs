//! Feed document parsing.
//!
//! RSS 2.0, Atom and JSON Feed are all handled by `feed-rs`; this module only
//! flattens the parsed feed into [`FeedEntry`] values.

use crate::error::TrendError;
use crate::types::FeedEntry;

/// Entries read from a single feed; the rest are ignored.
pub const MAX_ENTRIES_PER_FEED: usize = 30;

/// Parse a feed document fetched from `url`.
///
/// Entries without a title are skipped. At most [`MAX_ENTRIES_PER_FEED`]
/// entries are returned, in document order.
///
/// # Errors
///
/// Returns [`TrendError::Parse`] if the body is not a recognisable feed.
pub fn parse_feed(url: &str, body: &[u8]) -> Result<Vec<FeedEntry>, TrendError> {
    let feed = feed_rs::parser::parse(body).map_err(|e| TrendError::Parse {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;

    let source = feed
        .title
        .map(|t| clean_text(&t.content))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| url.to_owned());

    let entries = feed
        .entries
        .into_iter()
        .take(MAX_ENTRIES_PER_FEED)
        .filter_map(|entry| {
            let headline = entry
                .title
                .map(|t| clean_text(&t.content))
                .filter(|t| !t.is_empty())?;
            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .map(|s| clean_text(&s))
                .unwrap_or_default();
            let link = entry.links.into_iter().next().map(|l| l.href);
            Some(FeedEntry {
                headline,
                summary,
                link,
                source: source.clone(),
                published_at: entry.published.or(entry.updated),
            })
        })
        .collect();

    Ok(entries)
}

/// Strip markup, decode the common entities and collapse whitespace.
fn clean_text(raw: &str) -> String {
    let stripped = strip_html(raw)
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result.trim().to_string()
}
