//! Slot actions: each gathers network data first, then commits its store
//! writes in a single call at the end.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use pulse_analysis::AnalysisClient;
use pulse_core::{
    mean_engagement, AgentProfile, AppConfig, IdeaStatus, LearningParams, MessageCategory,
    MessageKind, NewIdea, Platform, ProfilePost, ScheduleSlot, SlotAction, TrendItem, WeightSet,
};
use pulse_db::{
    DbError, DispatchRecord, FeedbackSummary, NewDispatch, ScanSummary, SlotMark,
    TrendSaveSummary,
};
use pulse_messaging::{Delivery, MessagingClient};
use pulse_scraper::ScraperClient;
use pulse_trends::{score_entries, TrendSource};
use sqlx::SqlitePool;

use crate::compose::{ComposeInput, Composer, IdeaBatch};
use crate::dispatcher::SlotHandler;
use crate::error::SlotError;
use crate::feedback::{compute_updates, detect_outcomes, resolved_copies};
use crate::prompts;
use crate::reminder::{self, NoPostCheck, REMINDER_AFTER_DAYS};
use crate::report::{render_weekly_report, WeeklyStats, REPORT_DAYS};

/// Recent posts averaged for the engagement baseline.
const BASELINE_POSTS: i64 = 20;
/// Trends offered to the composer.
const COMPOSE_TRENDS: i64 = 5;
/// Upper bound on `sent` ideas examined per feedback pass.
const FEEDBACK_BATCH: i64 = 500;

/// The external services an [`Agent`] talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub scraper: Arc<dyn ScraperClient>,
    pub trends: Arc<dyn TrendSource>,
    pub analysis: Arc<dyn AnalysisClient>,
    pub messaging: Arc<dyn MessagingClient>,
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub recipient: String,
    pub instagram_handle: Option<String>,
    pub tiktok_handle: Option<String>,
    pub scan_max_posts: u32,
    pub learning: LearningParams,
    pub baseline_engagement: f64,
    pub trend_max_age_days: i64,
    pub timezone: Tz,
}

impl AgentSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            recipient: config.recipient_number.clone().unwrap_or_default(),
            instagram_handle: config.instagram_handle.clone(),
            tiktok_handle: config.tiktok_handle.clone(),
            scan_max_posts: config.scan_max_posts,
            learning: config.learning,
            baseline_engagement: config.baseline_engagement,
            trend_max_age_days: config.trend_max_age_days,
            timezone: config.timezone,
        }
    }

    fn handles(&self) -> Vec<(Platform, &str)> {
        [
            (Platform::Instagram, self.instagram_handle.as_deref()),
            (Platform::Tiktok, self.tiktok_handle.as_deref()),
        ]
        .into_iter()
        .filter_map(|(platform, handle)| {
            handle
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(|h| (platform, h))
        })
        .collect()
    }
}

/// Store data a composition draws on.
struct Gathered {
    analysis: Option<String>,
    trends: Vec<TrendItem>,
    weights: WeightSet,
    baseline: f64,
}

/// Runs the slot actions against the store and the collaborators.
pub struct Agent {
    pool: SqlitePool,
    clients: Collaborators,
    profile: AgentProfile,
    settings: AgentSettings,
    composer: Composer,
}

impl Agent {
    #[must_use]
    pub fn new(
        pool: SqlitePool,
        clients: Collaborators,
        profile: AgentProfile,
        settings: AgentSettings,
    ) -> Self {
        let composer = Composer::new(profile.creator.clone(), profile.posting);
        Self {
            pool,
            clients,
            profile,
            settings,
            composer,
        }
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[must_use]
    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Scrape every configured profile, analyse the posts and store both.
    ///
    /// A platform that fails is skipped as long as another one succeeds.
    /// A failed analysis stores the posts without analysis text.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::NotConfigured`] without any handle, the first
    /// scraper error when every platform fails, or a store error.
    pub async fn profile_scan(
        &self,
        mark: Option<&SlotMark>,
        now: DateTime<Utc>,
    ) -> Result<ScanSummary, SlotError> {
        let handles = self.settings.handles();
        if handles.is_empty() {
            return Err(SlotError::NotConfigured("INSTAGRAM_HANDLE or TIKTOK_HANDLE"));
        }

        let mut posts: Vec<ProfilePost> = Vec::new();
        let mut first_error = None;
        let mut succeeded = 0usize;
        for (platform, handle) in &handles {
            match self
                .clients
                .scraper
                .fetch_recent_posts(*platform, handle, self.settings.scan_max_posts)
                .await
            {
                Ok(mut fetched) => {
                    succeeded += 1;
                    posts.append(&mut fetched);
                }
                Err(e) => {
                    tracing::warn!(platform = %platform, handle, error = %e, "profile scrape failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        if succeeded == 0 {
            if let Some(e) = first_error {
                return Err(e.into());
            }
        }

        posts.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        let analysis = if posts.is_empty() {
            None
        } else {
            let request = prompts::profile_analysis(&self.profile.creator, &posts);
            match self.clients.analysis.complete(&request).await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!(error = %e, "profile analysis failed, storing posts only");
                    None
                }
            }
        };

        let summary =
            pulse_db::save_scan(&self.pool, &posts, analysis.as_deref(), now, mark).await?;
        tracing::info!(
            inserted = summary.inserted,
            updated = summary.updated,
            analysed = summary.analysis_id.is_some(),
            "profile scan stored"
        );
        Ok(summary)
    }

    /// Fetch the configured feeds, score the entries and store the best.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::Trends`] when every feed fails, or a store error.
    pub async fn check_trends(
        &self,
        mark: Option<&SlotMark>,
        now: DateTime<Utc>,
    ) -> Result<TrendSaveSummary, SlotError> {
        let config = &self.profile.trends;
        let entries = self.clients.trends.fetch_headlines(&config.feeds).await?;
        let fetched = entries.len();
        let items = score_entries(entries, config, now);
        let prune_before = now - Duration::days(self.settings.trend_max_age_days);

        let summary = pulse_db::save_trends(&self.pool, &items, now, prune_before, mark).await?;
        tracing::info!(
            fetched,
            relevant = items.len(),
            inserted = summary.inserted,
            refreshed = summary.refreshed,
            pruned = summary.pruned,
            "trends stored"
        );
        Ok(summary)
    }

    /// The best stored trends still inside the trend window; the same set
    /// messages are composed from.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn current_trends(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<TrendItem>, SlotError> {
        let since = now - Duration::days(self.settings.trend_max_age_days);
        Ok(pulse_db::list_top_trends(&self.pool, since, limit).await?)
    }

    async fn gather(&self, now: DateTime<Utc>) -> Result<Gathered, SlotError> {
        let analysis = pulse_db::latest_analysis(&self.pool).await?.map(|a| a.body);
        let trends = self.current_trends(now, COMPOSE_TRENDS).await?;
        let weights = pulse_db::load_weights(&self.pool).await?;
        let recent = pulse_db::list_recent_posts(&self.pool, BASELINE_POSTS).await?;
        let baseline = mean_engagement(&recent).unwrap_or(self.settings.baseline_engagement);
        Ok(Gathered {
            analysis,
            trends,
            weights,
            baseline,
        })
    }

    fn compose_input<'a>(gathered: &'a Gathered, category: MessageCategory) -> ComposeInput<'a> {
        ComposeInput {
            category,
            analysis: gathered.analysis.as_deref(),
            trends: &gathered.trends,
            weights: &gathered.weights,
            baseline_engagement: gathered.baseline,
        }
    }

    /// Compose, send and record the `category` message for `mark`.
    ///
    /// Nothing is sent when `mark` already has a run. The slot run, the
    /// idea and the message are recorded together after the provider
    /// accepts the message.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::Db`] with [`DbError::AlreadyFired`] when the slot
    /// already ran, [`SlotError::NotConfigured`] without a recipient,
    /// [`SlotError::Messaging`] when sending fails, or a store error.
    pub async fn send_message(
        &self,
        category: MessageCategory,
        mark: &SlotMark,
        now: DateTime<Utc>,
    ) -> Result<DispatchRecord, SlotError> {
        self.ensure_not_fired(mark).await?;
        self.ensure_recipient()?;

        let gathered = self.gather(now).await?;
        let composition = self
            .composer
            .compose(
                self.clients.analysis.as_ref(),
                &Self::compose_input(&gathered, category),
            )
            .await;

        let delivery = self
            .clients
            .messaging
            .send(&self.settings.recipient, &composition.body)
            .await?;

        let dispatch = NewDispatch {
            mark: mark.clone(),
            category: category.into(),
            body: composition.body,
            delivery_status: delivery.status,
            provider_id: delivery.provider_id,
            sent_at: now,
        };
        let record = pulse_db::record_dispatch(&self.pool, &dispatch, Some(&composition.idea))
            .await
            .inspect_err(|e| {
                tracing::error!(
                    slot = %mark.slot_name,
                    error = %e,
                    "message was sent but could not be recorded"
                );
            })?;

        tracing::info!(
            slot = %mark.slot_name,
            category = %category,
            origin = composition.origin.as_str(),
            rejected = composition.rejected,
            idea_id = record.idea_id,
            "message dispatched"
        );
        Ok(record)
    }

    async fn ensure_not_fired(&self, mark: &SlotMark) -> Result<(), SlotError> {
        if pulse_db::find_slot_run(&self.pool, mark).await?.is_some() {
            return Err(DbError::AlreadyFired {
                slot_name: mark.slot_name.clone(),
                slot_day: mark.slot_day,
            }
            .into());
        }
        Ok(())
    }

    fn ensure_recipient(&self) -> Result<(), SlotError> {
        if self.settings.recipient.trim().is_empty() {
            return Err(SlotError::NotConfigured("MY_WHATSAPP_NUMBER"));
        }
        Ok(())
    }

    /// Send and record a message that carries no idea.
    async fn dispatch_plain(
        &self,
        kind: MessageKind,
        body: String,
        mark: &SlotMark,
        now: DateTime<Utc>,
    ) -> Result<DispatchRecord, SlotError> {
        let delivery = self
            .clients
            .messaging
            .send(&self.settings.recipient, &body)
            .await?;
        let dispatch = NewDispatch {
            mark: mark.clone(),
            category: kind,
            body,
            delivery_status: delivery.status,
            provider_id: delivery.provider_id,
            sent_at: now,
        };
        let record = pulse_db::record_dispatch(&self.pool, &dispatch, None)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    slot = %mark.slot_name,
                    error = %e,
                    "message was sent but could not be recorded"
                );
            })?;
        tracing::info!(slot = %mark.slot_name, kind = %kind, "message dispatched");
        Ok(record)
    }

    /// Remind the creator to post when the newest stored post is at least
    /// [`REMINDER_AFTER_DAYS`] days old.
    ///
    /// At most one reminder goes out per cooldown. The slot run is recorded
    /// whether or not a reminder is sent.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::Db`] with [`DbError::AlreadyFired`] when the slot
    /// already ran, [`SlotError::NotConfigured`] without a recipient when a
    /// reminder is due, [`SlotError::Messaging`] when sending fails, or a
    /// store error.
    pub async fn no_post_reminder(
        &self,
        mark: &SlotMark,
        now: DateTime<Utc>,
    ) -> Result<NoPostCheck, SlotError> {
        self.ensure_not_fired(mark).await?;

        let latest = pulse_db::list_recent_posts(&self.pool, 1)
            .await?
            .into_iter()
            .next()
            .and_then(|p| p.posted_at);
        let check = match latest {
            None => NoPostCheck::NoPosts,
            Some(posted_at) => {
                let days_since = reminder::days_since(posted_at, now);
                if days_since < REMINDER_AFTER_DAYS {
                    NoPostCheck::Recent { days_since }
                } else if pulse_db::latest_message_of_kind(&self.pool, MessageKind::NoPostReminder)
                    .await?
                    .is_some_and(|m| reminder::in_cooldown(m.sent_at, now))
                {
                    NoPostCheck::Cooldown
                } else {
                    self.ensure_recipient()?;
                    let body = reminder::reminder_body(
                        days_since,
                        &self.profile.creator.name,
                        self.profile.posting,
                    );
                    let record = self
                        .dispatch_plain(MessageKind::NoPostReminder, body, mark, now)
                        .await?;
                    return Ok(NoPostCheck::Sent { days_since, record });
                }
            }
        };

        let detail = check.to_string();
        pulse_db::record_slot_fired(&self.pool, mark, now, Some(&detail)).await?;
        tracing::info!(slot = %mark.slot_name, outcome = %detail, "no-post check done");
        Ok(check)
    }

    /// Summarise the last week of posts against the week before and send it.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::Db`] with [`DbError::AlreadyFired`] when the slot
    /// already ran, [`SlotError::NotConfigured`] without a recipient,
    /// [`SlotError::Messaging`] when sending fails, or a store error.
    pub async fn weekly_report(
        &self,
        mark: &SlotMark,
        now: DateTime<Utc>,
    ) -> Result<(WeeklyStats, DispatchRecord), SlotError> {
        self.ensure_not_fired(mark).await?;
        self.ensure_recipient()?;

        let since = now - Duration::days(2 * REPORT_DAYS);
        let posts = pulse_db::list_posts_since(&self.pool, since).await?;
        let stats = WeeklyStats::from_posts(&posts, now, self.settings.timezone);
        let body = render_weekly_report(&stats, &self.profile.creator.name);
        let record = self
            .dispatch_plain(MessageKind::WeeklyReport, body, mark, now)
            .await?;
        tracing::info!(posts = stats.posts, views = stats.views, "weekly report sent");
        Ok((stats, record))
    }

    /// Generate and store up to `count` proposed ideas without sending.
    ///
    /// # Errors
    ///
    /// Returns a store error if reading context or writing ideas fails.
    pub async fn generate_ideas(
        &self,
        category: MessageCategory,
        count: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<(i64, NewIdea)>, SlotError> {
        let gathered = self.gather(now).await?;
        let IdeaBatch {
            ideas,
            origin,
            rejected,
        } = self
            .composer
            .ideas(
                self.clients.analysis.as_ref(),
                &Self::compose_input(&gathered, category),
                count,
            )
            .await;

        let ideas: Vec<NewIdea> = ideas.into_iter().map(|s| s.idea).collect();
        let ids = pulse_db::insert_ideas(&self.pool, &ideas, now).await?;
        tracing::info!(
            stored = ids.len(),
            origin = origin.as_str(),
            rejected,
            "ideas generated"
        );
        Ok(ids.into_iter().zip(ideas).collect())
    }

    /// Resolve sent ideas against new posts and update pattern weights.
    ///
    /// # Errors
    ///
    /// Returns a store error; nothing is written in that case.
    pub async fn run_feedback(
        &self,
        mark: Option<&SlotMark>,
        now: DateTime<Utc>,
    ) -> Result<FeedbackSummary, SlotError> {
        let sent =
            pulse_db::list_ideas_by_status(&self.pool, IdeaStatus::Sent, FEEDBACK_BATCH).await?;
        let posts = match sent.iter().filter_map(|i| i.sent_at).min() {
            Some(since) => pulse_db::list_posts_since(&self.pool, since).await?,
            None => Vec::new(),
        };

        let resolutions = detect_outcomes(&sent, &posts, now);
        let mut evaluable = pulse_db::list_evaluable_ideas(&self.pool).await?;
        evaluable.extend(resolved_copies(&sent, &resolutions, now));

        let weights = pulse_db::load_weights(&self.pool).await?;
        let plan = compute_updates(&weights, &self.settings.learning, &evaluable);

        let summary = pulse_db::apply_feedback(
            &self.pool,
            &resolutions,
            &plan.weights,
            &plan.evaluated_ids,
            now,
            mark,
        )
        .await?;
        tracing::info!(
            resolved = summary.resolved,
            evaluated = summary.evaluated,
            weights = summary.weights_written,
            "feedback applied"
        );
        Ok(summary)
    }

    /// Send a fixed message to check the messaging setup. Nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::NotConfigured`] without a recipient or
    /// [`SlotError::Messaging`] if the send fails.
    pub async fn send_test_message(&self, now: DateTime<Utc>) -> Result<Delivery, SlotError> {
        self.ensure_recipient()?;
        let body = format!(
            "✅ Test message for {} sent at {}",
            self.profile.creator.name,
            now.format("%Y-%m-%d %H:%M UTC")
        );
        let delivery = self
            .clients
            .messaging
            .send(&self.settings.recipient, &body)
            .await?;
        Ok(delivery)
    }
}

#[async_trait]
impl SlotHandler for Agent {
    async fn run_slot(
        &self,
        slot: &ScheduleSlot,
        mark: &SlotMark,
        now: DateTime<Utc>,
    ) -> Result<String, SlotError> {
        match slot.action {
            SlotAction::ProfileScan => {
                let s = self.profile_scan(Some(mark), now).await?;
                Ok(format!("{} new, {} updated posts", s.inserted, s.updated))
            }
            SlotAction::TrendCheck => {
                let s = self.check_trends(Some(mark), now).await?;
                Ok(format!("{} new trends, {} pruned", s.inserted, s.pruned))
            }
            SlotAction::Feedback => {
                let s = self.run_feedback(Some(mark), now).await?;
                Ok(format!("{} resolved, {} evaluated", s.resolved, s.evaluated))
            }
            SlotAction::MorningMessage
            | SlotAction::MiddayMessage
            | SlotAction::AfternoonMessage
            | SlotAction::EveningMessage => {
                let category = slot
                    .action
                    .message_category()
                    .unwrap_or(MessageCategory::Morning);
                let record = self.send_message(category, mark, now).await?;
                Ok(format!("message {} sent", record.message_id))
            }
            SlotAction::NoPostReminder => Ok(self.no_post_reminder(mark, now).await?.to_string()),
            SlotAction::WeeklyReport => {
                let (stats, record) = self.weekly_report(mark, now).await?;
                Ok(format!(
                    "report {} sent, {} posts this week",
                    record.message_id, stats.posts
                ))
            }
        }
    }

    async fn record_missed(&self, mark: &SlotMark, at: DateTime<Utc>) -> Result<bool, SlotError> {
        Ok(pulse_db::record_slot_missed(&self.pool, mark, at).await?)
    }

    async fn fired_slots(&self, day: NaiveDate) -> Result<Vec<(String, DateTime<Utc>)>, SlotError> {
        let runs = pulse_db::list_slot_runs_for_day(&self.pool, day).await?;
        Ok(runs
            .into_iter()
            .filter(|r| r.status == "fired")
            .map(|r| (r.slot_name, r.recorded_at))
            .collect())
    }
}
