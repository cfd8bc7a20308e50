//! The nudge sent when the creator has gone quiet.

use chrono::{DateTime, Duration, Utc};
use pulse_core::PostingWindow;
use pulse_db::DispatchRecord;

/// Days without a post before a reminder goes out.
pub const REMINDER_AFTER_DAYS: i64 = 4;
/// Minimum gap between two reminders.
pub const REMINDER_COOLDOWN_HOURS: i64 = 12;

/// What a no-post check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoPostCheck {
    Sent {
        days_since: i64,
        record: DispatchRecord,
    },
    /// No stored post carries a publish time.
    NoPosts,
    Recent {
        days_since: i64,
    },
    /// A reminder already went out within the cooldown.
    Cooldown,
}

impl std::fmt::Display for NoPostCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoPostCheck::Sent { days_since, record } => write!(
                f,
                "reminder {} sent, {days_since} days since last post",
                record.message_id
            ),
            NoPostCheck::NoPosts => f.write_str("no posts stored"),
            NoPostCheck::Recent { days_since } => {
                write!(f, "last post {days_since} days ago")
            }
            NoPostCheck::Cooldown => f.write_str("reminder sent recently"),
        }
    }
}

/// Whole days between the last post and `now`.
#[must_use]
pub fn days_since(last_post: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last_post).num_days()
}

/// `true` while a reminder sent at `last_sent` still blocks a new one.
#[must_use]
pub fn in_cooldown(last_sent: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - last_sent < Duration::hours(REMINDER_COOLDOWN_HOURS)
}

/// The reminder body; the tone sharpens the longer the silence lasts.
#[must_use]
pub fn reminder_body(days_since: i64, creator_name: &str, window: PostingWindow) -> String {
    if days_since <= REMINDER_AFTER_DAYS {
        format!(
            "⏰ Friendly reminder, {creator_name}!\n\n\
             It's been {days_since} days since your last post 📱\n\
             Your audience is waiting for you 🙌\n\n\
             Tonight's best window: {window}"
        )
    } else if days_since <= 7 {
        format!(
            "⚠️ A week without content!\n\n\
             {days_since} days since your last post, {creator_name}.\n\
             The algorithm rewards consistency. Let's get you back in the game 💪\n\n\
             Post one short clip between {window} today."
        )
    } else {
        format!(
            "🚨 Time to come back, {creator_name}!\n\n\
             {days_since} days since your last post.\n\
             It happens. Your audience misses you ❤️\n\n\
             Start small: record one 15-second clip and post it between {window}."
        )
    }
}
