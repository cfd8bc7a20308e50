use std::collections::HashSet;
use std::path::Path;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::schedule::{default_timetable, parse_time_of_day, ScheduleSlot, SlotAction};
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorProfile {
    pub name: String,
    #[serde(default)]
    pub partner_name: Option<String>,
    /// Content patterns the creator works in; each has its own learned weight.
    pub patterns: Vec<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendConfig {
    #[serde(default)]
    pub feeds: Vec<String>,
    #[serde(default)]
    pub high_priority_keywords: Vec<String>,
    #[serde(default)]
    pub medium_priority_keywords: Vec<String>,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_max_entry_age_days")]
    pub max_entry_age_days: i64,
}

fn default_max_items() -> usize {
    20
}

fn default_max_entry_age_days() -> i64 {
    3
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            high_priority_keywords: Vec::new(),
            medium_priority_keywords: Vec::new(),
            exclude_keywords: Vec::new(),
            max_items: default_max_items(),
            max_entry_age_days: default_max_entry_age_days(),
        }
    }
}

/// The local time range in which posting performs best.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for PostingWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl std::fmt::Display for PostingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Validated agent profile.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub creator: CreatorProfile,
    pub timetable: Vec<ScheduleSlot>,
    pub trends: TrendConfig,
    pub posting: PostingWindow,
}

#[derive(Debug, Deserialize)]
struct SlotConfig {
    name: String,
    time: String,
    action: SlotAction,
    #[serde(default)]
    weekday: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostingConfig {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    creator: CreatorProfile,
    #[serde(default)]
    timetable: Vec<SlotConfig>,
    #[serde(default)]
    trends: TrendConfig,
    #[serde(default)]
    posting: Option<PostingConfig>,
}

/// Load and validate the agent profile from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_profile(path: &Path) -> Result<AgentProfile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProfileFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_profile(&content)
}

/// Parse and validate profile YAML.
///
/// An empty or absent `timetable` falls back to the built-in daily schedule.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_profile(yaml: &str) -> Result<AgentProfile, ConfigError> {
    let file: ProfileFile = serde_yaml::from_str(yaml).map_err(ConfigError::ProfileFileParse)?;

    if file.creator.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "creator name must be non-empty".to_string(),
        ));
    }

    let patterns: Vec<String> = file
        .creator
        .patterns
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if patterns.is_empty() {
        return Err(ConfigError::Validation(
            "creator must list at least one content pattern".to_string(),
        ));
    }

    let timetable = if file.timetable.is_empty() {
        default_timetable()
    } else {
        build_timetable(&file.timetable)?
    };

    let posting = match file.posting {
        Some(p) => {
            let window = PostingWindow {
                start: parse_window_time(&p.start)?,
                end: parse_window_time(&p.end)?,
            };
            if window.start >= window.end {
                return Err(ConfigError::Validation(format!(
                    "posting window start {} must be before end {}",
                    p.start, p.end
                )));
            }
            window
        }
        None => PostingWindow::default(),
    };

    if file.trends.max_entry_age_days < 0 {
        return Err(ConfigError::Validation(
            "trends.max_entry_age_days must not be negative".to_string(),
        ));
    }

    Ok(AgentProfile {
        creator: CreatorProfile {
            patterns,
            ..file.creator
        },
        timetable,
        trends: file.trends,
        posting,
    })
}

fn build_timetable(slots: &[SlotConfig]) -> Result<Vec<ScheduleSlot>, ConfigError> {
    let mut seen = HashSet::new();
    let mut timetable = Vec::with_capacity(slots.len());

    for slot in slots {
        let name = slot.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "slot name must be non-empty".to_string(),
            ));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate slot name: '{name}'"
            )));
        }
        let time = parse_time_of_day(&slot.time).map_err(|e| {
            ConfigError::Validation(format!("slot '{name}': {e}"))
        })?;
        let mut entry = ScheduleSlot::new(name, time, slot.action);
        if let Some(raw) = slot.weekday.as_deref() {
            let weekday = raw.trim().parse::<Weekday>().map_err(|_| {
                ConfigError::Validation(format!("slot '{name}': unknown weekday '{raw}'"))
            })?;
            entry = entry.on(weekday);
        }
        timetable.push(entry);
    }

    Ok(timetable)
}

fn parse_window_time(raw: &str) -> Result<NaiveTime, ConfigError> {
    parse_time_of_day(raw).map_err(|e| ConfigError::Validation(format!("posting window: {e}")))
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
