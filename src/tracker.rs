use anyhow::{ensure, Result};
use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::achievements::{self, newly_unlocked};
use crate::impact::EnvironmentalImpact;
use crate::migration::claim_local_data;
use crate::models::{Achievement, BottleType, DailyProgress, UserGoalProfile};
use crate::progress::{apply_log, roll_over, LogOutcome};
use crate::remote::RemoteStore;
use crate::stats::PeriodStats;
use crate::storage::{
    daily_snapshot_key, load_json, load_or_default, save_json, LocalStore, ACHIEVEMENTS_KEY,
    DAILY_PROGRESS_KEY,
};

/// Applies intake events to the stored day record.
///
/// Every write goes to the local store first and is then mirrored to the
/// remote store when a user is signed in. Write failures are logged and
/// swallowed: the returned state always reflects the attempted update.
pub struct ProgressTracker<L, R> {
    local: L,
    remote: R,
    user_id: Option<String>,
}

impl<L: LocalStore, R: RemoteStore> ProgressTracker<L, R> {
    pub fn new(local: L, remote: R) -> Self {
        Self {
            local,
            remote,
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn set_user(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    /// Signs `user_id` in, first deleting any records another account left
    /// on this device.
    pub fn switch_user(&mut self, user_id: &str) -> Result<()> {
        if claim_local_data(&self.local, user_id)? {
            info!("local records from a previous account were cleared");
        }
        self.user_id = Some(user_id.to_string());
        Ok(())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// The stored record as-is, or the zero state.
    pub fn stored(&self) -> DailyProgress {
        load_or_default(&self.local, DAILY_PROGRESS_KEY)
    }

    pub fn achievements(&self) -> Vec<Achievement> {
        load_json(&self.local, ACHIEVEMENTS_KEY).unwrap_or_else(achievements::default_achievements)
    }

    pub fn impact(&self) -> EnvironmentalImpact {
        EnvironmentalImpact::from_bottles(self.stored().bottles_saved)
    }

    async fn persist(&self, progress: &DailyProgress) {
        if let Err(e) = save_json(&self.local, DAILY_PROGRESS_KEY, progress) {
            warn!("failed to save progress locally: {:#}", e);
        }

        if let Some(ref uid) = self.user_id {
            if let Err(e) = self.remote.upsert_progress(uid, progress).await {
                warn!("failed to sync progress: {:#}", e);
            }
        }
    }

    /// Keeps a copy of a finished day under its dated key.
    fn snapshot(&self, finished: &DailyProgress) {
        let Some(date) = finished.date else {
            return;
        };
        if let Err(e) = save_json(&self.local, &daily_snapshot_key(date), finished) {
            warn!("failed to snapshot {}: {:#}", date, e);
        }
    }

    /// Brings the stored record up to `today`: drops a lapsed streak and
    /// starts a fresh day. Call on app start and when it returns to the foreground.
    #[instrument(skip(self))]
    pub async fn refresh_day(&self, today: NaiveDate) -> DailyProgress {
        let stored = self.stored();
        let rolled = roll_over(&stored, today);

        if rolled.streak_reset {
            info!(previous = stored.streak_days, "streak broken");
        }
        if rolled.day_changed {
            self.snapshot(&stored);
        }
        if rolled.needs_persist() {
            self.persist(&rolled.progress).await;
        }

        rolled.progress
    }

    /// Records a drink of `amount` ml.
    #[instrument(skip(self, goal))]
    pub async fn log_intake(
        &self,
        amount: u32,
        bottle: BottleType,
        goal: &UserGoalProfile,
        today: NaiveDate,
    ) -> Result<LogOutcome> {
        ensure!(amount > 0, "intake amount must be positive");

        let stored = self.stored();
        if !stored.is_for(today) {
            self.snapshot(&stored);
        }

        let outcome = apply_log(&stored, amount, bottle, goal.daily_goal, today);
        self.persist(&outcome.progress).await;

        if outcome.celebrate {
            info!(
                streak_days = outcome.progress.streak_days,
                "daily goal reached"
            );
        }
        debug!(intake = outcome.progress.current_intake, "intake logged");

        self.sync_achievements(&outcome.progress).await;
        Ok(outcome)
    }

    /// Re-evaluates achievements against `progress` and stores the result.
    pub async fn sync_achievements(&self, progress: &DailyProgress) -> Vec<Achievement> {
        let before = self.achievements();
        let after = achievements::evaluate(progress, &before);

        if after == before {
            return after;
        }
        for kind in newly_unlocked(&before, &after) {
            info!(achievement = kind.as_str(), "achievement unlocked");
        }

        if let Err(e) = save_json(&self.local, ACHIEVEMENTS_KEY, &after) {
            warn!("failed to save achievements: {:#}", e);
        }
        if let Some(ref uid) = self.user_id {
            if let Err(e) = self.remote.upsert_achievements(uid, &after).await {
                warn!("failed to sync achievements: {:#}", e);
            }
        }
        after
    }

    /// Adopts the remote record for `today` when this device has none, e.g.
    /// after signing in on a new device.
    #[instrument(skip(self))]
    pub async fn restore_from_remote(&self, today: NaiveDate) -> Result<Option<DailyProgress>> {
        let Some(ref uid) = self.user_id else {
            return Ok(None);
        };
        if self.stored().is_for(today) {
            return Ok(None);
        }

        let Some(remote) = self.remote.get_progress(uid, today).await? else {
            return Ok(None);
        };
        save_json(&self.local, DAILY_PROGRESS_KEY, &remote)?;
        info!(intake = remote.current_intake, "restored progress from backend");
        Ok(Some(remote))
    }

    /// Per-day records for `start..=end`: from the backend when signed in,
    /// otherwise from local snapshots plus the current record.
    pub async fn history(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyProgress>> {
        if let Some(ref uid) = self.user_id {
            return self.remote.list_progress(uid, start, end).await;
        }

        let current = self.stored();
        let mut records = Vec::new();
        for day in start.iter_days().take_while(|d| *d <= end) {
            if current.is_for(day) {
                records.push(current.clone());
            } else if let Some(snapshot) =
                load_json::<DailyProgress>(&self.local, &daily_snapshot_key(day))
            {
                records.push(snapshot);
            }
        }
        Ok(records)
    }

    pub async fn period_stats(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        goal: &UserGoalProfile,
    ) -> Result<PeriodStats> {
        let records = self.history(start, end).await?;
        Ok(PeriodStats::from_records(&records, goal.daily_goal))
    }
}
