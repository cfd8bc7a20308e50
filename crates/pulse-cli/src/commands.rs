//! One-shot commands run from the terminal.

use anyhow::Context;
use chrono::Utc;
use chrono_tz::Tz;
use pulse_agent::Agent;
use pulse_core::MessageCategory;
use pulse_db::SlotMark;

const LISTED_TRENDS: i64 = 10;

/// Ad-hoc runs get a unique slot name so they never collide with the
/// timetable's runs for the same day.
fn manual_mark(label: &str, tz: Tz) -> SlotMark {
    let local = Utc::now().with_timezone(&tz);
    SlotMark::new(
        format!("manual-{label}-{}", local.format("%H%M%S")),
        local.date_naive(),
    )
}

pub(crate) async fn test(agent: &Agent) -> anyhow::Result<()> {
    let delivery = agent
        .send_test_message(Utc::now())
        .await
        .context("test message failed")?;
    println!(
        "test message accepted: status={} id={}",
        delivery.status,
        delivery.provider_id.as_deref().unwrap_or("-")
    );
    Ok(())
}

pub(crate) async fn generate(agent: &Agent, count: usize) -> anyhow::Result<()> {
    let ideas = agent
        .generate_ideas(MessageCategory::Morning, count, Utc::now())
        .await?;
    for (i, (id, idea)) in ideas.iter().enumerate() {
        println!("{}. [{}] {} (#{id})", i + 1, idea.pattern, idea.title);
        if let Some(hook) = &idea.hook {
            println!("   hook: {hook}");
        }
        if !idea.description.is_empty() && idea.description != idea.title {
            println!("   {}", idea.description);
        }
        if let Some(predicted) = idea.predicted_engagement {
            println!("   predicted engagement: {predicted:.0}");
        }
    }
    Ok(())
}

pub(crate) async fn trends(agent: &Agent) -> anyhow::Result<()> {
    let now = Utc::now();
    let summary = agent.check_trends(None, now).await?;
    println!(
        "{} new trends stored, {} old trends pruned",
        summary.inserted, summary.pruned
    );
    for trend in agent.current_trends(now, LISTED_TRENDS).await? {
        println!("{:>5.0}  {}  ({})", trend.relevance_score, trend.headline, trend.source);
    }
    Ok(())
}

/// Scan, trends and feedback are best effort; the message is sent regardless.
pub(crate) async fn morning(agent: &Agent, tz: Tz) -> anyhow::Result<()> {
    let now = Utc::now();
    match agent.profile_scan(None, now).await {
        Ok(s) => println!("scan: {} new, {} updated posts", s.inserted, s.updated),
        Err(e) => println!("scan: failed ({e})"),
    }
    match agent.check_trends(None, now).await {
        Ok(s) => println!("trends: {} new, {} pruned", s.inserted, s.pruned),
        Err(e) => println!("trends: failed ({e})"),
    }
    match agent.run_feedback(None, now).await {
        Ok(s) => println!("feedback: {} resolved, {} evaluated", s.resolved, s.evaluated),
        Err(e) => println!("feedback: failed ({e})"),
    }

    let mark = manual_mark(MessageCategory::Morning.as_str(), tz);
    let record = agent
        .send_message(MessageCategory::Morning, &mark, Utc::now())
        .await
        .context("morning message failed")?;
    println!("message: sent (#{})", record.message_id);
    Ok(())
}

pub(crate) async fn feedback(agent: &Agent) -> anyhow::Result<()> {
    let summary = agent.run_feedback(None, Utc::now()).await?;
    println!(
        "{} ideas resolved, {} evaluated, {} weights updated",
        summary.resolved, summary.evaluated, summary.weights_written
    );
    Ok(())
}

pub(crate) async fn report(agent: &Agent, tz: Tz) -> anyhow::Result<()> {
    let mark = manual_mark("weekly-report", tz);
    let (stats, record) = agent
        .weekly_report(&mark, Utc::now())
        .await
        .context("weekly report failed")?;
    println!(
        "report: sent (#{}), {} posts and {} views this week",
        record.message_id, stats.posts, stats.views
    );
    Ok(())
}
