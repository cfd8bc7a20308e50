use std::collections::BTreeSet;

/// Common words that carry no topic.
const STOPWORDS: &[&str] = &[
    "about", "after", "again", "also", "because", "been", "before", "being", "could", "every",
    "from", "have", "here", "into", "just", "like", "more", "most", "only", "over", "really",
    "should", "some", "than", "that", "their", "them", "then", "there", "these", "they", "this",
    "those", "today", "very", "what", "when", "where", "which", "while", "will", "with", "would",
    "your",
];

/// Lowercased words longer than three characters, without stopwords.
pub(crate) fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 3)
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_words_and_stopwords_are_dropped() {
        let found: Vec<String> = terms("Film THIS duet with Maya, then sing!").into_iter().collect();
        assert_eq!(found, vec!["duet", "film", "maya", "sing"]);
    }
}
