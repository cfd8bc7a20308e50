//! End-to-end slot runs against an in-memory store with fake collaborators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use pulse_agent::{
    Agent, AgentSettings, Collaborators, Dispatcher, DispatcherConfig, NoPostCheck, SlotError,
    SlotHandler,
};
use pulse_analysis::{AnalysisClient, AnalysisError, AnalysisRequest};
use pulse_core::{
    default_timetable, parse_profile, AgentProfile, DeliveryStatus, IdeaStatus, LearningParams,
    MessageCategory, MessageKind, NewTrendItem, Platform, ProfilePost,
};
use pulse_db::{DbError, SlotMark};
use pulse_messaging::{Delivery, MessagingClient, MessagingError};
use pulse_scraper::{ScraperClient, ScraperError};
use pulse_trends::{FeedEntry, TrendError, TrendSource};
use sqlx::SqlitePool;

const IDEA_JSON: &str = r#"Here you go:
[{"title": "Blindfold Maya and film her tasting street snacks",
  "description": "Guess each snack on camera",
  "pattern": "couple_content"}]"#;

struct FakeScraper {
    posts: Mutex<Vec<ProfilePost>>,
    tiktok_down: bool,
}

#[async_trait]
impl ScraperClient for FakeScraper {
    async fn fetch_recent_posts(
        &self,
        platform: Platform,
        _handle: &str,
        _limit: u32,
    ) -> Result<Vec<ProfilePost>, ScraperError> {
        if platform == Platform::Tiktok && self.tiktok_down {
            return Err(ScraperError::Unavailable { status: 503 });
        }
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.platform == platform)
            .cloned()
            .collect())
    }
}

struct FakeTrends;

#[async_trait]
impl TrendSource for FakeTrends {
    async fn fetch_headlines(&self, _feeds: &[String]) -> Result<Vec<FeedEntry>, TrendError> {
        Ok(vec![
            FeedEntry {
                headline: "Viral couple challenge takes over feeds".to_string(),
                summary: String::new(),
                link: None,
                source: "feed".to_string(),
                published_at: None,
            },
            FeedEntry {
                headline: "Parliament debates the budget".to_string(),
                summary: String::new(),
                link: None,
                source: "feed".to_string(),
                published_at: None,
            },
        ])
    }
}

struct FakeAnalysis {
    down: AtomicBool,
}

#[async_trait]
impl AnalysisClient for FakeAnalysis {
    async fn complete(&self, _request: &AnalysisRequest) -> Result<String, AnalysisError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(AnalysisError::Unavailable { status: 529 });
        }
        Ok(IDEA_JSON.to_string())
    }
}

#[derive(Default)]
struct FakeMessaging {
    sent: Mutex<Vec<String>>,
    fail: AtomicBool,
}

#[async_trait]
impl MessagingClient for FakeMessaging {
    async fn send(&self, _recipient: &str, body: &str) -> Result<Delivery, MessagingError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MessagingError::SendFailed {
                status: 500,
                code: None,
                message: "provider down".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(body.to_string());
        Ok(Delivery {
            status: DeliveryStatus::Queued,
            provider_id: Some(format!("SM{}", sent.len())),
        })
    }

    async fn delivery_status(&self, _provider_id: &str) -> Result<DeliveryStatus, MessagingError> {
        Ok(DeliveryStatus::Delivered)
    }
}

struct Harness {
    pool: SqlitePool,
    agent: Arc<Agent>,
    scraper: Arc<FakeScraper>,
    analysis: Arc<FakeAnalysis>,
    messaging: Arc<FakeMessaging>,
}

fn profile() -> AgentProfile {
    parse_profile(
        r#"
creator:
  name: "Noam"
  partner_name: "Maya"
  patterns: [couple_content, music_content]
trends:
  feeds: ["https://feeds.example.com/rss"]
  high_priority_keywords: [couple, viral]
  exclude_keywords: [politics]
"#,
    )
    .unwrap()
}

fn settings() -> AgentSettings {
    AgentSettings {
        recipient: "+972501234567".to_string(),
        instagram_handle: Some("noam.creates".to_string()),
        tiktok_handle: Some("noam".to_string()),
        scan_max_posts: 10,
        learning: LearningParams::default(),
        baseline_engagement: 100.0,
        trend_max_age_days: 3,
        timezone: chrono_tz::Asia::Jerusalem,
    }
}

async fn harness() -> Harness {
    let pool = pulse_db::connect_in_memory().await.unwrap();
    let scraper = Arc::new(FakeScraper {
        posts: Mutex::new(Vec::new()),
        tiktok_down: true,
    });
    let analysis = Arc::new(FakeAnalysis {
        down: AtomicBool::new(false),
    });
    let messaging = Arc::new(FakeMessaging::default());
    let clients = Collaborators {
        scraper: scraper.clone(),
        trends: Arc::new(FakeTrends),
        analysis: analysis.clone(),
        messaging: messaging.clone(),
    };
    let agent = Arc::new(Agent::new(pool.clone(), clients, profile(), settings()));
    Harness {
        pool,
        agent,
        scraper,
        analysis,
        messaging,
    }
}

fn post(id: &str, caption: &str, posted_at: DateTime<Utc>, likes: i64) -> ProfilePost {
    ProfilePost {
        platform: Platform::Instagram,
        post_id: id.to_string(),
        url: None,
        caption: caption.to_string(),
        posted_at: Some(posted_at),
        views: 0,
        likes,
        comments: 0,
        shares: 0,
    }
}

/// UTC instant of a Jerusalem wall-clock time in January (UTC+2).
fn local(day: u32, h: u32, m: u32) -> DateTime<Utc> {
    chrono_tz::Asia::Jerusalem
        .with_ymd_and_hms(2026, 1, day, h, m, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
}

fn dispatcher(agent: &Arc<Agent>, now: DateTime<Utc>) -> Dispatcher {
    let handler: Arc<dyn SlotHandler> = agent.clone();
    Dispatcher::new(
        default_timetable(),
        handler,
        DispatcherConfig {
            timezone: chrono_tz::Asia::Jerusalem,
            tolerance: Duration::seconds(60),
            slot_timeout: StdDuration::from_secs(10),
        },
        now,
    )
}

#[tokio::test]
async fn a_day_of_ticks_sends_each_message_once() {
    let h = harness().await;
    h.scraper
        .posts
        .lock()
        .unwrap()
        .push(post("C1", "Our first duet", local(11, 19, 0), 250));

    let start = local(12, 0, 0);
    let mut first = dispatcher(&h.agent, start);
    for step in 0..(24 * 60 * 2) {
        let now = start + Duration::seconds(step * 30);
        // A restart at noon with a fresh dispatcher must not resend.
        if now == local(12, 12, 0) {
            first = dispatcher(&h.agent, now);
            assert_eq!(first.restore().await.unwrap(), 5);
        }
        first.tick(now).await;
    }

    assert_eq!(h.messaging.sent.lock().unwrap().len(), 4);
    let messages = pulse_db::list_messages_for_day(&h.pool, jan(12)).await.unwrap();
    let categories: Vec<MessageKind> = messages.iter().map(|m| m.category).collect();
    assert_eq!(
        categories,
        vec![
            MessageCategory::Morning.into(),
            MessageCategory::Midday.into(),
            MessageCategory::Afternoon.into(),
            MessageCategory::Evening.into(),
        ]
    );
    assert!(messages[0].body.contains("Blindfold Maya"));
    assert!(messages[0].body.contains("Viral couple challenge"));

    // The post from the day before keeps the no-post check quiet; the weekly
    // report only runs on Fridays.
    let runs = pulse_db::list_slot_runs_for_day(&h.pool, jan(12)).await.unwrap();
    let scheduled = default_timetable()
        .iter()
        .filter(|s| s.runs_on(jan(12)))
        .count();
    assert_eq!(runs.len(), scheduled);
    assert!(runs.iter().all(|r| r.status == "fired"));
    assert!(runs.iter().all(|r| r.slot_name != "weekly-report"));
    assert_eq!(pulse_db::count_trends(&h.pool).await.unwrap(), 1);
}

#[tokio::test]
async fn slot_without_a_tick_is_missed_and_nothing_is_sent() {
    let h = harness().await;
    let mut dispatcher = dispatcher(&h.agent, local(12, 0, 0));

    dispatcher.tick(local(12, 9, 0)).await;
    dispatcher.tick(local(13, 0, 0)).await;

    let runs = pulse_db::list_slot_runs_for_day(&h.pool, jan(12)).await.unwrap();
    let evening = runs.iter().find(|r| r.slot_name == "evening").unwrap();
    assert_eq!(evening.status, "missed");
    let morning = runs.iter().find(|r| r.slot_name == "morning").unwrap();
    assert_eq!(morning.status, "fired");

    let messages = pulse_db::list_messages_for_day(&h.pool, jan(12)).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(h.messaging.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn second_send_for_the_same_slot_is_refused() {
    let h = harness().await;
    let mark = SlotMark::new("morning", jan(12));

    h.agent
        .send_message(MessageCategory::Morning, &mark, local(12, 9, 0))
        .await
        .unwrap();
    let again = h
        .agent
        .send_message(MessageCategory::Morning, &mark, local(12, 9, 1))
        .await;

    assert!(matches!(
        again,
        Err(SlotError::Db(DbError::AlreadyFired { .. }))
    ));
    assert_eq!(h.messaging.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_send_records_nothing() {
    let h = harness().await;
    h.messaging.fail.store(true, Ordering::SeqCst);
    let mark = SlotMark::new("morning", jan(12));

    let result = h
        .agent
        .send_message(MessageCategory::Morning, &mark, local(12, 9, 0))
        .await;

    assert!(matches!(result, Err(SlotError::Messaging(_))));
    assert!(pulse_db::find_slot_run(&h.pool, &mark).await.unwrap().is_none());
    assert!(pulse_db::latest_message(&h.pool).await.unwrap().is_none());
}

#[tokio::test]
async fn analysis_outage_still_sends_the_default_idea() {
    let h = harness().await;
    h.analysis.down.store(true, Ordering::SeqCst);
    let mark = SlotMark::new("evening", jan(12));

    let record = h
        .agent
        .send_message(MessageCategory::Evening, &mark, local(12, 21, 0))
        .await
        .unwrap();

    assert!(record.idea_id.is_some());
    let sent = h.messaging.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].contains("{partner}"));
}

#[tokio::test]
async fn scan_survives_one_platform_failing() {
    let h = harness().await;
    h.scraper
        .posts
        .lock()
        .unwrap()
        .push(post("C1", "Our first duet", local(11, 19, 0), 250));

    let summary = h.agent.profile_scan(None, local(12, 6, 0)).await.unwrap();

    assert_eq!(summary.inserted, 1);
    assert!(summary.analysis_id.is_some());
}

#[tokio::test]
async fn used_idea_moves_its_pattern_weight() {
    let h = harness().await;
    let sent_at = local(12, 9, 0);
    h.agent
        .send_message(
            MessageCategory::Morning,
            &SlotMark::new("morning", jan(12)),
            sent_at,
        )
        .await
        .unwrap();

    h.scraper.posts.lock().unwrap().push(post(
        "C9",
        "Blindfold Maya tasting street snacks challenge",
        local(12, 19, 0),
        300,
    ));
    h.agent.profile_scan(None, local(13, 2, 0)).await.unwrap();

    let summary = h.agent.run_feedback(None, local(13, 3, 0)).await.unwrap();
    assert_eq!(summary.resolved, 1);
    assert_eq!(summary.evaluated, 1);

    let used = pulse_db::list_ideas_by_status(&h.pool, IdeaStatus::Used, 10)
        .await
        .unwrap();
    assert_eq!(used.len(), 1);
    assert_eq!(used[0].observed_engagement, Some(300.0));

    // 1.0 + 0.001 * (300 - 100 * 1.0)
    let weights = pulse_db::load_weights(&h.pool).await.unwrap();
    assert!((weights.get("couple_content") - 1.2).abs() < 1e-9);

    let again = h.agent.run_feedback(None, local(14, 3, 0)).await.unwrap();
    assert_eq!(again.resolved, 0);
    assert_eq!(again.evaluated, 0);
}

async fn store_posts(pool: &SqlitePool, posts: &[ProfilePost], at: DateTime<Utc>) {
    pulse_db::save_scan(pool, posts, None, at, None).await.unwrap();
}

#[tokio::test]
async fn quiet_creator_gets_one_reminder_per_cooldown() {
    let h = harness().await;
    let quiet_since = post("C1", "Our first duet", local(7, 19, 0), 250);
    store_posts(&h.pool, &[quiet_since], local(8, 6, 0)).await;

    let first = h
        .agent
        .no_post_reminder(&SlotMark::new("no-post-check", jan(12)), local(12, 11, 0))
        .await
        .unwrap();
    assert!(matches!(first, NoPostCheck::Sent { days_since: 4, .. }));

    // A second check the same evening falls inside the 12 hour cooldown.
    let cooldown_mark = SlotMark::new("late-no-post-check", jan(12));
    let second = h
        .agent
        .no_post_reminder(&cooldown_mark, local(12, 20, 0))
        .await
        .unwrap();
    assert_eq!(second, NoPostCheck::Cooldown);
    let run = pulse_db::find_slot_run(&h.pool, &cooldown_mark)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(run.status, "fired");
    assert_eq!(run.detail.as_deref(), Some("reminder sent recently"));

    let next_day = h
        .agent
        .no_post_reminder(&SlotMark::new("no-post-check", jan(13)), local(13, 11, 0))
        .await
        .unwrap();
    assert!(matches!(next_day, NoPostCheck::Sent { days_since: 5, .. }));

    let sent = h.messaging.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].starts_with("⏰ Friendly reminder, Noam!"));
    assert!(sent[1].starts_with("⚠️"));
    drop(sent);

    let latest = pulse_db::latest_message_of_kind(&h.pool, MessageKind::NoPostReminder)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.slot_day, jan(13));
}

#[tokio::test]
async fn recent_post_means_no_reminder() {
    let h = harness().await;
    let recent = post("C1", "Our first duet", local(10, 19, 0), 250);
    store_posts(&h.pool, &[recent], local(11, 6, 0)).await;
    let mark = SlotMark::new("no-post-check", jan(12));

    let check = h.agent.no_post_reminder(&mark, local(12, 11, 0)).await.unwrap();

    assert_eq!(check, NoPostCheck::Recent { days_since: 1 });
    assert!(h.messaging.sent.lock().unwrap().is_empty());
    assert!(pulse_db::find_slot_run(&h.pool, &mark).await.unwrap().is_some());
    let again = h.agent.no_post_reminder(&mark, local(12, 11, 1)).await;
    assert!(matches!(again, Err(SlotError::Db(DbError::AlreadyFired { .. }))));
}

#[tokio::test]
async fn weekly_report_goes_out_on_friday_evening() {
    let h = harness().await;
    let mut this_week = post("C2", "Duet on the balcony", local(14, 19, 0), 120);
    this_week.views = 4000;
    let mut last_week = post("C1", "Our first duet", local(7, 19, 0), 80);
    last_week.views = 2000;
    store_posts(&h.pool, &[this_week, last_week], local(15, 6, 0)).await;

    // 2026-01-16 is a Friday; the weekly slot runs at 18:00.
    let mut dispatcher = dispatcher(&h.agent, local(16, 17, 30));
    let report = dispatcher.tick(local(16, 18, 0)).await;
    assert!(report.fired.contains(&"weekly-report".to_string()));

    let message = pulse_db::latest_message_of_kind(&h.pool, MessageKind::WeeklyReport)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.slot_name, "weekly-report");
    assert!(message.body.starts_with("📊 Weekly report for Noam"));
    assert!(message.body.contains("Posts: 1 (last week 1)"));
    assert!(message.body.contains("Views: 4000 (+100%)"));
    assert!(message.body.contains("Duet on the balcony"));
    assert_eq!(h.messaging.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn stale_trends_are_left_out_of_messages_and_listings() {
    let h = harness().await;
    let item = |headline: &str, score: f64| NewTrendItem {
        headline: headline.to_string(),
        summary: String::new(),
        link: None,
        source: "feed".to_string(),
        published_at: None,
        relevance_score: score,
    };
    let now = local(12, 9, 0);
    let long_ago = now - Duration::days(5);
    let stale = [item("Stale dance craze", 99.0)];
    pulse_db::save_trends(&h.pool, &stale, now - Duration::days(4), long_ago, None)
        .await
        .unwrap();
    let fresh = [item("Couples duet challenge", 40.0)];
    pulse_db::save_trends(&h.pool, &fresh, now, long_ago, None)
        .await
        .unwrap();

    let listed = h.agent.current_trends(now, 10).await.unwrap();
    let headlines: Vec<&str> = listed.iter().map(|t| t.headline.as_str()).collect();
    assert_eq!(headlines, vec!["Couples duet challenge"]);

    h.agent
        .send_message(MessageCategory::Morning, &SlotMark::new("morning", jan(12)), now)
        .await
        .unwrap();
    let sent = h.messaging.sent.lock().unwrap();
    assert!(sent[0].contains("Couples duet challenge"));
    assert!(!sent[0].contains("Stale dance craze"));
}
