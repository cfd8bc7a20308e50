//! Reads candidate ideas out of free-form model output.

use serde::Deserialize;

/// One idea as proposed by the model, before checking and scoring.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Candidate {
    pub title: String,
    pub hook: Option<String>,
    pub description: String,
    pub pattern: Option<String>,
}

impl Candidate {
    /// Title, hook and description joined with spaces.
    #[must_use]
    pub fn text(&self) -> String {
        [Some(self.title.as_str()), self.hook.as_deref(), Some(self.description.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Deserialize)]
struct RawCandidate {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    hook: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
}

/// Shortest line accepted as an idea in line mode.
const MIN_LINE_CHARS: usize = 12;

/// Parse candidates from `text`.
///
/// The first JSON array of objects found in the text wins. Without one,
/// every non-empty line that is not a heading becomes a candidate, with
/// list markers removed.
#[must_use]
pub fn parse_candidates(text: &str) -> Vec<Candidate> {
    if let Some(candidates) = parse_json_array(text) {
        if !candidates.is_empty() {
            return candidates;
        }
    }
    parse_lines(text)
}

fn parse_json_array(text: &str) -> Option<Vec<Candidate>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    let raw: Vec<RawCandidate> = serde_json::from_str(&text[start..=end]).ok()?;
    Some(
        raw.into_iter()
            .filter_map(|r| {
                let title = clean(r.title).unwrap_or_default();
                let description = clean(r.description).unwrap_or_default();
                if title.is_empty() && description.is_empty() {
                    return None;
                }
                Some(Candidate {
                    title,
                    hook: clean(r.hook),
                    description,
                    pattern: clean(r.pattern).map(|p| normalize_pattern(&p)),
                })
            })
            .collect(),
    )
}

fn parse_lines(text: &str) -> Vec<Candidate> {
    text.lines()
        .map(strip_list_marker)
        .filter(|line| line.chars().count() >= MIN_LINE_CHARS && !line.ends_with(':'))
        .map(|line| Candidate {
            title: line.to_owned(),
            ..Candidate::default()
        })
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let line = line.trim_start_matches(['-', '*', '•', '–']).trim_start();
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return stripped.trim();
        }
    }
    line.trim_matches('*').trim()
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// `"Couple Content"` → `"couple_content"`.
#[must_use]
pub fn normalize_pattern(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_array_inside_prose_is_parsed() {
        let text = r#"Here are today's ideas:
[
  {"title": "Blind taste test", "hook": "Guess the snack", "description": "Blindfold Maya and film 5 snacks", "pattern": "Couple Content"},
  {"title": "  ", "description": ""},
  {"title": "Acoustic cover", "description": "Record a 60-second cover"}
]
Good luck!"#;
        let candidates = parse_candidates(text);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].pattern.as_deref(), Some("couple_content"));
        assert_eq!(candidates[0].hook.as_deref(), Some("Guess the snack"));
        assert_eq!(candidates[1].pattern, None);
        assert_eq!(
            candidates[0].text(),
            "Blind taste test Guess the snack Blindfold Maya and film 5 snacks"
        );
    }

    #[test]
    fn lines_are_used_without_json() {
        let text = "Ideas for today:\n\n1. Film her reacting to the surprise you prepared\n- Sing the chorus at 20:30 live\n* ok\n";
        let candidates = parse_candidates(text);
        let titles: Vec<&str> = candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Film her reacting to the surprise you prepared",
                "Sing the chorus at 20:30 live"
            ]
        );
    }

    #[test]
    fn broken_json_falls_back_to_lines() {
        let text = "[{\"t\":\nRecord three versions of the hook";
        let candidates = parse_candidates(text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Record three versions of the hook");
    }

    #[test]
    fn empty_text_has_no_candidates() {
        assert!(parse_candidates("").is_empty());
        assert!(parse_candidates("[]").is_empty());
    }

    #[test]
    fn pattern_names_are_normalized() {
        assert_eq!(normalize_pattern(" Story-Times "), "story_times");
        assert_eq!(normalize_pattern("music_content"), "music_content");
    }
}
