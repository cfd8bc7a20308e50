//! The `status` report.

use chrono::{NaiveDate, NaiveTime, Utc};
use pulse_core::{AgentProfile, AppConfig, IdeaStatus, ScheduleSlot, SlotAction, DEFAULT_WEIGHT};
use pulse_db::SlotRunRow;
use pulse_messaging::MessagingClient;
use sqlx::SqlitePool;

const RECENT_IDEAS: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlotLine {
    pub time: NaiveTime,
    pub name: String,
    pub action: SlotAction,
    /// `fired`, `missed`, `pending`, or `off` on days the slot does not run.
    pub status: String,
    pub detail: Option<String>,
}

/// Join the timetable with the runs recorded on `day`, ordered by time of day.
pub(crate) fn slot_lines(
    timetable: &[ScheduleSlot],
    runs: &[SlotRunRow],
    day: NaiveDate,
) -> Vec<SlotLine> {
    let mut lines: Vec<SlotLine> = timetable
        .iter()
        .map(|slot| {
            let run = runs.iter().find(|r| r.slot_name == slot.name);
            let idle = if slot.runs_on(day) { "pending" } else { "off" };
            SlotLine {
                time: slot.time,
                name: slot.name.clone(),
                action: slot.action,
                status: run.map_or_else(|| idle.to_string(), |r| r.status.clone()),
                detail: run.and_then(|r| r.detail.clone()),
            }
        })
        .collect();
    lines.sort_by_key(|l| l.time);
    lines
}

/// Weights for the profile's patterns plus any others already learned.
pub(crate) fn weight_lines(profile: &AgentProfile, stored: &pulse_core::WeightSet) -> Vec<(String, f64)> {
    let mut lines: Vec<(String, f64)> = profile
        .creator
        .patterns
        .iter()
        .map(|p| (p.clone(), stored.get(p)))
        .collect();
    for (pattern, weight) in stored.iter() {
        if !lines.iter().any(|(p, _)| p == pattern) {
            lines.push((pattern.to_string(), weight));
        }
    }
    lines
}

pub(crate) async fn run(
    pool: &SqlitePool,
    config: &AppConfig,
    profile: &AgentProfile,
    messaging: Option<&dyn MessagingClient>,
) -> anyhow::Result<()> {
    let tz = config.timezone;
    let today = Utc::now().with_timezone(&tz).date_naive();

    pulse_db::health_check(pool).await?;
    println!("Store: {}", config.database_url);

    println!("\nSlots for {today} ({tz})");
    let runs = pulse_db::list_slot_runs_for_day(pool, today).await?;
    for line in slot_lines(&profile.timetable, &runs, today) {
        println!(
            "  {}  {:<16} {:<18} {:<8} {}",
            line.time.format("%H:%M"),
            line.name,
            line.action.as_str(),
            line.status,
            line.detail.unwrap_or_default()
        );
    }

    println!("\nIdeas");
    let counts = pulse_db::count_ideas_by_status(pool).await?;
    for status in IdeaStatus::ALL {
        let count = counts
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n);
        println!("  {:<9} {count}", status.as_str());
    }
    for idea in pulse_db::list_recent_ideas(pool, RECENT_IDEAS).await? {
        println!(
            "  #{:<4} {:<8} {:<20} {}",
            idea.id,
            idea.status.as_str(),
            idea.pattern,
            idea.title
        );
    }

    println!("\nLast message");
    match pulse_db::latest_message(pool).await? {
        Some(message) => {
            let mut delivery = message.delivery_status;
            if let (Some(client), Some(id)) = (messaging, message.provider_id.as_deref()) {
                match client.delivery_status(id).await {
                    Ok(current) => delivery = current,
                    Err(e) => tracing::warn!(error = %e, "could not refresh delivery status"),
                }
            }
            println!(
                "  {} {} ({}, {delivery})",
                message.sent_at.with_timezone(&tz).format("%Y-%m-%d %H:%M"),
                message.slot_name,
                message.category
            );
            if let Some(first) = message.body.lines().find(|l| !l.trim().is_empty()) {
                println!("  {first}");
            }
        }
        None => println!("  none yet"),
    }

    println!("\nTrends stored: {}", pulse_db::count_trends(pool).await?);

    println!("\nPattern weights (default {DEFAULT_WEIGHT:.2})");
    let weights = pulse_db::load_weights(pool).await?;
    for (pattern, weight) in weight_lines(profile, &weights) {
        println!("  {pattern:<24} {weight:.3}");
    }
    Ok(())
}
