//! Rejects generic encouragement in favour of ideas someone could act on.
//!
//! A text is specific when it contains an action verb from a fixed lexicon
//! and at least one concrete detail: a determiner or possessive phrase whose
//! head is not a generic noun, a number with a unit, a clock time, a quoted
//! phrase, a `{name}` placeholder, or one of the configured names.

use std::sync::LazyLock;

use regex::Regex;

static MEASURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d+(?:[.,]\d+)?\s*-?\s*(?:seconds?|secs?|s|minutes?|mins?|hours?|hrs?|days?|weeks?|times|x|takes?|songs?|steps?|people|words?|questions?|outfits?|dishes|shots?|clips?|photos?|versions?|percent)\b|\d+\s*%",
    )
    .expect("valid measure regex")
});
static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:[01]?\d|2[0-3]):[0-5]\d\b|\b\d{1,2}\s?(?:am|pm)\b")
        .expect("valid clock regex")
});
static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""[^"\n]{2,}"|“[^”\n]{2,}”|«[^»\n]{2,}»|(?:^|\s)'[^'\n]{2,}'"#)
        .expect("valid quote regex")
});
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[A-Za-z_]+\}").expect("valid placeholder regex"));

/// Base forms; inflections are recognised by suffix stripping.
const ACTION_VERBS: &[&str] = &[
    "answer", "ask", "blindfold", "build", "call", "capture", "challenge", "compare", "cook",
    "count", "cover", "dance", "dress", "duet", "edit", "film", "give", "guess", "hide", "hum",
    "interview", "list", "make", "open", "perform", "pick", "plan", "play", "post", "prank",
    "prepare", "rank", "rate", "react", "read", "record", "recreate", "remix", "reply", "reveal",
    "share", "shoot", "show", "sing", "start", "stitch", "surprise", "swap", "switch", "tag",
    "take", "teach", "tell", "test", "text", "try", "visit", "write",
];

/// Past forms the suffix rules cannot reach.
const IRREGULAR_VERBS: &[&str] = &[
    "built", "gave", "hid", "hidden", "made", "read", "sang", "shot", "showed", "shown", "sung",
    "taken", "taught", "told", "took", "tried", "wrote", "written",
];

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "these", "those", "your", "her", "his", "their", "our", "my", "its",
];

/// Nouns too vague to anchor an idea on their own.
const GENERIC_NOUNS: &[&str] = &[
    "account", "audience", "best", "bit", "clip", "content", "day", "everyone", "fans", "feed",
    "followers", "idea", "ideas", "lot", "moment", "now", "page", "photo", "post", "posts", "reel",
    "reels", "something", "story", "stories", "stuff", "thing", "things", "time", "today",
    "tomorrow", "tonight", "update", "video", "videos", "week",
];

/// Abstract or evaluative heads that read like nouns but name nothing to film.
const ABSTRACT_HEADS: &[&str] = &[
    "best", "creativity", "energy", "feels", "fun", "game", "glow", "heart", "inspiration", "joy",
    "life", "light", "love", "magic", "mood", "most", "one", "ones", "passion", "potential", "self",
    "side", "spirit", "vibe", "vibes", "way", "ways", "world",
];

/// Quantifiers and adverbs, never the head of a phrase.
const FILLERS: &[&str] = &[
    "again", "all", "already", "also", "always", "any", "even", "ever", "every", "here", "just",
    "many", "more", "most", "much", "never", "new", "now", "only", "really", "so", "some", "still",
    "there", "today", "together", "tomorrow", "tonight", "too", "very",
];

/// Words that end a determiner phrase.
const PHRASE_BREAKS: &[&str] = &[
    "about", "after", "and", "are", "as", "at", "be", "before", "but", "by", "for", "from", "he",
    "i", "if", "in", "into", "is", "it", "of", "on", "or", "over", "she", "so", "than", "then",
    "they", "to", "was", "we", "when", "while", "with", "you",
];

/// Longest run of words read after a determiner.
const MAX_PHRASE_WORDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VagueReason {
    Empty,
    NoActionVerb,
    NoConcreteDetail,
}

impl std::fmt::Display for VagueReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            VagueReason::Empty => "empty text",
            VagueReason::NoActionVerb => "no action verb",
            VagueReason::NoConcreteDetail => "no concrete detail",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specificity {
    Specific,
    Vague(VagueReason),
}

impl Specificity {
    #[must_use]
    pub fn is_specific(self) -> bool {
        self == Specificity::Specific
    }
}

/// Specificity check, optionally aware of people's names.
#[derive(Debug, Clone, Default)]
pub struct SpecificityPolicy {
    names: Vec<String>,
}

impl SpecificityPolicy {
    /// Mentions of any of `names` count as a concrete detail.
    #[must_use]
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn check(&self, text: &str) -> Specificity {
        let words = words(text);
        if words.is_empty() {
            return Specificity::Vague(VagueReason::Empty);
        }
        if !words.iter().any(|w| is_action_verb(w)) {
            return Specificity::Vague(VagueReason::NoActionVerb);
        }
        if self.has_concrete_detail(text, &words) {
            Specificity::Specific
        } else {
            Specificity::Vague(VagueReason::NoConcreteDetail)
        }
    }

    fn has_concrete_detail(&self, text: &str, words: &[String]) -> bool {
        MEASURE_RE.is_match(text)
            || CLOCK_RE.is_match(text)
            || QUOTED_RE.is_match(text)
            || PLACEHOLDER_RE.is_match(text)
            || words.iter().any(|w| self.names.contains(w))
            || has_specific_noun_phrase(words)
    }
}

/// [`SpecificityPolicy::check`] without any known names.
#[must_use]
pub fn check_specificity(text: &str) -> Specificity {
    SpecificityPolicy::default().check(text)
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn is_action_verb(word: &str) -> bool {
    if ACTION_VERBS.contains(&word) || IRREGULAR_VERBS.contains(&word) {
        return true;
    }
    let known = |stem: &str| ACTION_VERBS.contains(&stem);
    let undouble = |stem: &str| {
        let mut tail = stem.chars().rev();
        match (tail.next(), tail.next()) {
            (Some(last), Some(prev)) if last == prev => {
                known(&stem[..stem.len() - last.len_utf8()])
            }
            _ => false,
        }
    };

    if let Some(stem) = word.strip_suffix("ing") {
        return known(stem) || known(&format!("{stem}e")) || undouble(stem);
    }
    if let Some(stem) = word.strip_suffix("ed") {
        return known(stem) || known(&format!("{stem}e")) || undouble(stem);
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if known(&format!("{stem}y")) {
            return true;
        }
    }
    if let Some(stem) = word.strip_suffix("es") {
        if known(stem) {
            return true;
        }
    }
    word.strip_suffix('s').is_some_and(known)
}

/// A determiner followed by a phrase whose last word is a concrete noun.
fn has_specific_noun_phrase(words: &[String]) -> bool {
    words.iter().enumerate().any(|(i, word)| {
        if !DETERMINERS.contains(&word.as_str()) {
            return false;
        }
        let head = words[i + 1..]
            .iter()
            .take(MAX_PHRASE_WORDS)
            .map(String::as_str)
            .take_while(|w| !PHRASE_BREAKS.contains(w) && !DETERMINERS.contains(w))
            .filter(|w| !FILLERS.contains(w))
            .last();
        head.is_some_and(is_concrete_head)
    })
}

fn is_concrete_head(word: &str) -> bool {
    word.chars().count() >= 3
        && !GENERIC_NOUNS.contains(&word)
        && !ABSTRACT_HEADS.contains(&word)
}
