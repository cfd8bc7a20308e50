//! Keyword relevance scoring for feed entries.
//!
//! Matching is case-insensitive substring search over headline and summary.
//! Exclusions win over any positive match.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use pulse_core::{NewTrendItem, TrendConfig};

use crate::types::FeedEntry;

const HIGH_MATCH_POINTS: f64 = 60.0;
const MEDIUM_MATCH_POINTS: f64 = 30.0;
const MAX_SCORE: f64 = 100.0;
/// Score given to every entry when no keywords are configured.
const BASELINE_SCORE: f64 = 10.0;

/// Filter and score `entries`, returning at most `config.max_items` items
/// ordered by descending score.
///
/// Entries published more than `config.max_entry_age_days` before `now` are
/// dropped; undated entries are kept. With keyword lists configured, entries
/// matching none of them are dropped. Repeated headlines keep the first copy.
#[must_use]
pub fn score_entries(
    entries: Vec<FeedEntry>,
    config: &TrendConfig,
    now: DateTime<Utc>,
) -> Vec<NewTrendItem> {
    let high = lowercase_all(&config.high_priority_keywords);
    let medium = lowercase_all(&config.medium_priority_keywords);
    let exclude = lowercase_all(&config.exclude_keywords);
    let has_keywords = !high.is_empty() || !medium.is_empty();
    let oldest = now - Duration::days(config.max_entry_age_days.max(0));

    let mut seen = HashSet::new();
    let mut items: Vec<NewTrendItem> = entries
        .into_iter()
        .filter(|e| e.published_at.is_none_or(|at| at >= oldest))
        .filter(|e| seen.insert(e.headline.to_lowercase()))
        .filter_map(|entry| {
            let text = format!("{} {}", entry.headline, entry.summary).to_lowercase();
            if exclude.iter().any(|k| text.contains(k.as_str())) {
                return None;
            }

            let score = if has_keywords {
                let raw = count_matches(&text, &high) * HIGH_MATCH_POINTS
                    + count_matches(&text, &medium) * MEDIUM_MATCH_POINTS;
                if raw <= 0.0 {
                    return None;
                }
                raw.min(MAX_SCORE)
            } else {
                BASELINE_SCORE
            };

            Some(NewTrendItem {
                headline: entry.headline,
                summary: entry.summary,
                link: entry.link,
                source: entry.source,
                published_at: entry.published_at,
                relevance_score: score,
            })
        })
        .collect();

    items.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    items.truncate(config.max_items);
    items
}

fn lowercase_all(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn count_matches(text: &str, keywords: &[String]) -> f64 {
    keywords.iter().filter(|k| text.contains(k.as_str())).count() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap()
    }

    fn entry(headline: &str, days_old: Option<i64>) -> FeedEntry {
        FeedEntry {
            headline: headline.to_owned(),
            summary: String::new(),
            link: None,
            source: "test".to_owned(),
            published_at: days_old.map(|d| now() - Duration::days(d)),
        }
    }

    fn config(high: &[&str], medium: &[&str], exclude: &[&str]) -> TrendConfig {
        let owned = |v: &[&str]| v.iter().map(|s| (*s).to_owned()).collect();
        TrendConfig {
            high_priority_keywords: owned(high),
            medium_priority_keywords: owned(medium),
            exclude_keywords: owned(exclude),
            ..TrendConfig::default()
        }
    }

    #[test]
    fn high_and_medium_matches_add_up_and_cap() {
        let cfg = config(&["reels", "couple"], &["music"], &[]);
        let items = score_entries(
            vec![
                entry("Music charts shift", Some(0)),
                entry("Couple Reels with music explode", Some(0)),
                entry("Reels get longer", Some(0)),
            ],
            &cfg,
            now(),
        );
        let scores: Vec<f64> = items.iter().map(|i| i.relevance_score).collect();
        assert_eq!(scores, vec![100.0, 60.0, 30.0]);
        assert_eq!(items[0].headline, "Couple Reels with music explode");
    }

    #[test]
    fn unmatched_entries_are_dropped_when_keywords_exist() {
        let cfg = config(&["duet"], &[], &[]);
        let items = score_entries(vec![entry("Stock markets rally", Some(0))], &cfg, now());
        assert!(items.is_empty());
    }

    #[test]
    fn baseline_score_without_keywords() {
        let items = score_entries(
            vec![entry("Anything at all", None)],
            &TrendConfig::default(),
            now(),
        );
        assert_eq!(items.len(), 1);
        assert!((items[0].relevance_score - BASELINE_SCORE).abs() < f64::EPSILON);
    }

    #[test]
    fn exclusions_win_over_matches() {
        let cfg = config(&["couple"], &[], &["Politics"]);
        let items = score_entries(
            vec![entry("Couple politics debate goes viral", Some(0))],
            &cfg,
            now(),
        );
        assert!(items.is_empty());
    }

    #[test]
    fn stale_entries_are_dropped_but_undated_kept() {
        let cfg = config(&["reels"], &[], &[]);
        let items = score_entries(
            vec![
                entry("Old reels news", Some(4)),
                entry("Fresh reels news", Some(2)),
                entry("Undated reels news", None),
            ],
            &cfg,
            now(),
        );
        let headlines: Vec<&str> = items.iter().map(|i| i.headline.as_str()).collect();
        assert_eq!(headlines, vec!["Fresh reels news", "Undated reels news"]);
    }

    #[test]
    fn duplicate_headlines_and_limit() {
        let mut cfg = config(&[], &[], &[]);
        cfg.max_items = 2;
        let items = score_entries(
            vec![
                entry("Same story", None),
                entry("same STORY", None),
                entry("Second story", None),
                entry("Third story", None),
            ],
            &cfg,
            now(),
        );
        let headlines: Vec<&str> = items.iter().map(|i| i.headline.as_str()).collect();
        assert_eq!(headlines, vec!["Same story", "Second story"]);
    }
}
