use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::messages::MessageCategory;
use crate::CoreError;

/// What a slot does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotAction {
    ProfileScan,
    TrendCheck,
    MorningMessage,
    MiddayMessage,
    AfternoonMessage,
    EveningMessage,
    Feedback,
    NoPostReminder,
    WeeklyReport,
}

impl SlotAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SlotAction::ProfileScan => "profile_scan",
            SlotAction::TrendCheck => "trend_check",
            SlotAction::MorningMessage => "morning_message",
            SlotAction::MiddayMessage => "midday_message",
            SlotAction::AfternoonMessage => "afternoon_message",
            SlotAction::EveningMessage => "evening_message",
            SlotAction::Feedback => "feedback",
            SlotAction::NoPostReminder => "no_post_reminder",
            SlotAction::WeeklyReport => "weekly_report",
        }
    }

    /// The reminder category for messaging actions, `None` otherwise.
    #[must_use]
    pub fn message_category(self) -> Option<MessageCategory> {
        match self {
            SlotAction::MorningMessage => Some(MessageCategory::Morning),
            SlotAction::MiddayMessage => Some(MessageCategory::Midday),
            SlotAction::AfternoonMessage => Some(MessageCategory::Afternoon),
            SlotAction::EveningMessage => Some(MessageCategory::Evening),
            SlotAction::ProfileScan
            | SlotAction::TrendCheck
            | SlotAction::Feedback
            | SlotAction::NoPostReminder
            | SlotAction::WeeklyReport => None,
        }
    }
}

impl std::fmt::Display for SlotAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            SlotAction::ProfileScan,
            SlotAction::TrendCheck,
            SlotAction::MorningMessage,
            SlotAction::MiddayMessage,
            SlotAction::AfternoonMessage,
            SlotAction::EveningMessage,
            SlotAction::Feedback,
            SlotAction::NoPostReminder,
            SlotAction::WeeklyReport,
        ]
        .into_iter()
        .find(|a| a.as_str() == s)
        .ok_or_else(|| CoreError::UnknownVariant {
            kind: "slot action",
            value: s.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSlot {
    pub name: String,
    pub time: NaiveTime,
    pub action: SlotAction,
    /// Restricts the slot to one day of the week; `None` runs daily.
    pub weekday: Option<Weekday>,
}

impl ScheduleSlot {
    #[must_use]
    pub fn new(name: impl Into<String>, time: NaiveTime, action: SlotAction) -> Self {
        Self {
            name: name.into(),
            time,
            action,
            weekday: None,
        }
    }

    /// Run only on `weekday`.
    #[must_use]
    pub fn on(mut self, weekday: Weekday) -> Self {
        self.weekday = Some(weekday);
        self
    }

    #[must_use]
    pub fn runs_on(&self, day: NaiveDate) -> bool {
        self.weekday.is_none_or(|w| day.weekday() == w)
    }
}

/// Parse an `HH:MM` time of day.
///
/// # Errors
///
/// Returns [`CoreError::InvalidTimeOfDay`] when `s` is not a valid 24-hour time.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| CoreError::InvalidTimeOfDay(s.to_string()))
}

/// The built-in timetable used when the profile file defines none.
#[must_use]
pub fn default_timetable() -> Vec<ScheduleSlot> {
    let at = |h: u32, m: u32| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);
    vec![
        ScheduleSlot::new("full-scan", at(6, 0), SlotAction::ProfileScan),
        ScheduleSlot::new("morning-trends", at(8, 30), SlotAction::TrendCheck),
        ScheduleSlot::new("morning", at(9, 0), SlotAction::MorningMessage),
        ScheduleSlot::new("midday-trends", at(12, 30), SlotAction::TrendCheck),
        ScheduleSlot::new("midday", at(13, 0), SlotAction::MiddayMessage),
        ScheduleSlot::new("afternoon", at(17, 0), SlotAction::AfternoonMessage),
        ScheduleSlot::new("evening", at(21, 0), SlotAction::EveningMessage),
        ScheduleSlot::new("feedback", at(3, 0), SlotAction::Feedback),
        ScheduleSlot::new("no-post-check", at(11, 0), SlotAction::NoPostReminder),
        ScheduleSlot::new("weekly-report", at(18, 0), SlotAction::WeeklyReport).on(Weekday::Fri),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Pending,
    Fired,
    Missed,
}

impl SlotStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SlotStatus::Pending => "pending",
            SlotStatus::Fired => "fired",
            SlotStatus::Missed => "missed",
        }
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEntry {
    pub slot: ScheduleSlot,
    pub status: SlotStatus,
    pub last_fired: Option<DateTime<Utc>>,
    /// Failed attempts today.
    pub attempts: u32,
}

/// Result of moving the table to a new calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rollover {
    pub previous_day: NaiveDate,
    /// Slots scheduled on `previous_day` that never fired, in definition order.
    pub missed: Vec<ScheduleSlot>,
}

/// Per-day slot state for one calendar day in the operating timezone.
///
/// Each slot is `Pending` until it fires. Slots still pending when the day
/// rolls over are reported as missed, then every slot starts over as `Pending`.
#[derive(Debug, Clone)]
pub struct DayTable {
    day: NaiveDate,
    entries: Vec<SlotEntry>,
    tolerance: Duration,
}

impl DayTable {
    #[must_use]
    pub fn new(slots: Vec<ScheduleSlot>, day: NaiveDate, tolerance: Duration) -> Self {
        let entries = slots
            .into_iter()
            .map(|slot| SlotEntry {
                slot,
                status: SlotStatus::Pending,
                last_fired: None,
                attempts: 0,
            })
            .collect();
        Self {
            day,
            entries,
            tolerance,
        }
    }

    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.day
    }

    #[must_use]
    pub fn entries(&self) -> &[SlotEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, index: usize) -> Option<&SlotEntry> {
        self.entries.get(index)
    }

    /// Move to `day` if it is later than the current day.
    ///
    /// Returns `None` when `day` is not later; the table is left untouched.
    pub fn roll_over(&mut self, day: NaiveDate) -> Option<Rollover> {
        if day <= self.day {
            return None;
        }

        let previous_day = self.day;
        let missed = self
            .entries
            .iter_mut()
            .filter(|e| e.status == SlotStatus::Pending && e.slot.runs_on(previous_day))
            .map(|e| {
                e.status = SlotStatus::Missed;
                e.slot.clone()
            })
            .collect();

        self.day = day;
        for entry in &mut self.entries {
            entry.status = SlotStatus::Pending;
            entry.last_fired = None;
            entry.attempts = 0;
        }

        Some(Rollover {
            previous_day,
            missed,
        })
    }

    /// Indices of pending slots whose time is within the tolerance of
    /// `local_time`, in definition order. The window does not wrap midnight.
    /// Slots restricted to another weekday are never due.
    #[must_use]
    pub fn due(&self, local_time: NaiveTime) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.status == SlotStatus::Pending && e.slot.runs_on(self.day))
            .filter(|(_, e)| {
                let offset = local_time.signed_duration_since(e.slot.time);
                offset <= self.tolerance && offset >= -self.tolerance
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Mark the slot at `index` fired. Returns `false` if it was not pending.
    pub fn mark_fired(&mut self, index: usize, at: DateTime<Utc>) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) if entry.status == SlotStatus::Pending => {
                entry.status = SlotStatus::Fired;
                entry.last_fired = Some(at);
                true
            }
            _ => false,
        }
    }

    /// Count a failed attempt; the slot stays pending. Returns the attempt count.
    pub fn record_failure(&mut self, index: usize) -> u32 {
        self.entries.get_mut(index).map_or(0, |entry| {
            entry.attempts += 1;
            entry.attempts
        })
    }

    /// Mark a slot fired by name, used when restoring persisted runs.
    pub fn mark_fired_by_name(&mut self, name: &str, at: DateTime<Utc>) -> bool {
        match self.entries.iter().position(|e| e.slot.name == name) {
            Some(index) => self.mark_fired(index, at),
            None => false,
        }
    }

    #[must_use]
    pub fn status_of(&self, name: &str) -> Option<SlotStatus> {
        self.entries
            .iter()
            .find(|e| e.slot.name == name)
            .map(|e| e.status)
    }
}

#[cfg(test)]
#[path = "schedule_test.rs"]
mod tests;
