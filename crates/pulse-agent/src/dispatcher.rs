//! Fires timetable slots at most once per calendar day.
//!
//! [`Dispatcher::tick`] is driven by an external clock, normally once a
//! minute. Each tick moves the day table forward when the local date
//! changes, persists the slots left unfired as missed, then runs every due
//! slot in definition order. A failed slot stays pending and is retried on
//! later ticks while it is still within the tolerance window.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use pulse_core::{AppConfig, DayTable, ScheduleSlot};
use pulse_db::SlotMark;

use crate::error::{ErrorKind, SlotError};

/// Runs slot actions and reads back persisted slot runs.
#[async_trait]
pub trait SlotHandler: Send + Sync {
    /// Perform `slot`'s action and record `mark` as fired with its writes.
    /// Returns a short human-readable detail.
    async fn run_slot(
        &self,
        slot: &ScheduleSlot,
        mark: &SlotMark,
        now: DateTime<Utc>,
    ) -> Result<String, SlotError>;

    /// Persist `mark` as missed. Returns `false` if it already had a run.
    async fn record_missed(&self, mark: &SlotMark, at: DateTime<Utc>) -> Result<bool, SlotError>;

    /// Names and times of the slots recorded as fired on `day`.
    async fn fired_slots(&self, day: NaiveDate)
        -> Result<Vec<(String, DateTime<Utc>)>, SlotError>;
}

#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    pub timezone: Tz,
    /// How far either side of a slot's time it may fire.
    pub tolerance: Duration,
    /// Upper bound on one slot action.
    pub slot_timeout: StdDuration,
}

impl DispatcherConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timezone: config.timezone,
            tolerance: Duration::seconds(i64::try_from(config.slot_tolerance_secs).unwrap_or(60)),
            slot_timeout: StdDuration::from_secs(config.slot_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotFailure {
    pub slot: String,
    pub kind: ErrorKind,
    pub message: String,
    /// Failed attempts today, this one included.
    pub attempts: u32,
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Slots of the previous day recorded as missed by a rollover.
    pub missed: Vec<String>,
    pub fired: Vec<String>,
    pub failed: Vec<SlotFailure>,
}

impl TickReport {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.missed.is_empty() && self.fired.is_empty() && self.failed.is_empty()
    }
}

pub struct Dispatcher {
    table: DayTable,
    handler: Arc<dyn SlotHandler>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// A dispatcher whose table starts on the local date of `now`.
    #[must_use]
    pub fn new(
        slots: Vec<ScheduleSlot>,
        handler: Arc<dyn SlotHandler>,
        config: DispatcherConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let day = now.with_timezone(&config.timezone).date_naive();
        Self {
            table: DayTable::new(slots, day, config.tolerance),
            handler,
            config,
        }
    }

    #[must_use]
    pub fn table(&self) -> &DayTable {
        &self.table
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.config.timezone
    }

    /// Mark the slots already fired today in the store, so a restart does
    /// not fire them again. Returns how many were restored.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError`] if the slot runs cannot be read.
    pub async fn restore(&mut self) -> Result<usize, SlotError> {
        let fired = self.handler.fired_slots(self.table.day()).await?;
        let restored = fired
            .iter()
            .filter(|(name, at)| self.table.mark_fired_by_name(name, *at))
            .count();
        if restored > 0 {
            tracing::info!(day = %self.table.day(), restored, "restored fired slots");
        }
        Ok(restored)
    }

    /// Advance to `now`: roll the day over if needed, then run due slots.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let local = now.with_timezone(&self.config.timezone);
        let mut report = TickReport::default();

        if let Some(rollover) = self.table.roll_over(local.date_naive()) {
            for slot in rollover.missed {
                let mark = SlotMark::new(&slot.name, rollover.previous_day);
                match self.handler.record_missed(&mark, now).await {
                    Ok(_) => {
                        tracing::warn!(slot = %slot.name, day = %rollover.previous_day, "slot missed");
                    }
                    Err(e) => {
                        tracing::error!(slot = %slot.name, error = %e, "could not record missed slot");
                    }
                }
                report.missed.push(slot.name);
            }
        }

        for index in self.table.due(local.time()) {
            let Some(slot) = self.table.entry(index).map(|e| e.slot.clone()) else {
                continue;
            };
            let mark = SlotMark::new(&slot.name, self.table.day());

            match self.run_with_timeout(&slot, &mark, now).await {
                Ok(detail) => {
                    self.table.mark_fired(index, now);
                    tracing::info!(slot = %slot.name, action = %slot.action, %detail, "slot fired");
                    report.fired.push(slot.name);
                }
                Err(e) if e.is_already_fired() => {
                    self.table.mark_fired(index, now);
                    tracing::info!(slot = %slot.name, "slot already fired today");
                    report.fired.push(slot.name);
                }
                Err(e) => {
                    let attempts = self.table.record_failure(index);
                    tracing::error!(
                        slot = %slot.name,
                        kind = %e.kind(),
                        attempts,
                        error = %e,
                        "slot attempt failed"
                    );
                    report.failed.push(SlotFailure {
                        slot: slot.name,
                        kind: e.kind(),
                        message: e.to_string(),
                        attempts,
                    });
                }
            }
        }

        report
    }

    async fn run_with_timeout(
        &self,
        slot: &ScheduleSlot,
        mark: &SlotMark,
        now: DateTime<Utc>,
    ) -> Result<String, SlotError> {
        let limit = self.config.slot_timeout;
        tokio::time::timeout(limit, self.handler.run_slot(slot, mark, now))
            .await
            .unwrap_or(Err(SlotError::Timeout {
                secs: limit.as_secs(),
            }))
    }
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod tests;
