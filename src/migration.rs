//! One-time copy of data recorded before sign-in into the backend.
//!
//! Each section is migrated independently; a failure in one is reported and
//! the others still run. Nothing is rolled back.

use anyhow::{anyhow, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::achievements::default_achievements;
use crate::models::{Achievement, DailyProgress, StoredPreferences, UserProfile};
use crate::remote::RemoteStore;
use crate::storage::{
    daily_snapshot_key, load_json, save_json, LocalStore, ACHIEVEMENTS_KEY, DAILY_PROGRESS_KEY,
    LOCAL_OWNER_KEY, USER_PREFERENCES_KEY,
};

pub const MIGRATION_MARKER_KEY: &str = "migration";

/// Prior days whose snapshots are copied along with today's record.
pub const HISTORY_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MigrationMarker {
    user_id: String,
    completed_on: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    pub daily_progress: bool,
    pub achievements: bool,
    pub user_preferences: bool,
    /// This device already migrated for the user.
    pub completed: bool,
}

impl MigrationStatus {
    pub fn needed(&self) -> bool {
        !self.completed && (self.daily_progress || self.achievements || self.user_preferences)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub errors: Vec<String>,
}

impl MigrationReport {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

fn present(local: &dyn LocalStore, key: &str) -> bool {
    match local.get(key) {
        Ok(value) => value.is_some(),
        Err(e) => {
            warn!("failed to check {}: {:#}", key, e);
            false
        }
    }
}

/// Binds the device's records to `user_id`.
///
/// Records left behind by a different account are deleted so they are neither
/// uploaded to nor added onto this user's data. Records with no owner yet
/// (kept before anyone signed in) are adopted. Returns whether anything was
/// cleared.
pub fn claim_local_data(local: &dyn LocalStore, user_id: &str) -> Result<bool> {
    let owner = load_json::<String>(local, LOCAL_OWNER_KEY);
    if owner.as_deref() == Some(user_id) {
        return Ok(false);
    }

    let cleared = owner.is_some();
    if let Some(previous) = owner {
        let snapshot_prefix = format!("{}_", DAILY_PROGRESS_KEY);
        for key in local.keys()? {
            let owned = key == DAILY_PROGRESS_KEY
                || key == ACHIEVEMENTS_KEY
                || key == USER_PREFERENCES_KEY
                || key == MIGRATION_MARKER_KEY
                || key.starts_with(&snapshot_prefix);
            if owned {
                local.remove(&key)?;
            }
        }
        info!(previous = %previous, "cleared local records of another account");
    }

    save_json(local, LOCAL_OWNER_KEY, &user_id)?;
    Ok(cleared)
}

pub fn check_migration_needed(local: &dyn LocalStore, user_id: &str) -> MigrationStatus {
    let completed = load_json::<MigrationMarker>(local, MIGRATION_MARKER_KEY)
        .map(|m| m.user_id == user_id)
        .unwrap_or(false);

    MigrationStatus {
        daily_progress: present(local, DAILY_PROGRESS_KEY),
        achievements: present(local, ACHIEVEMENTS_KEY),
        user_preferences: present(local, USER_PREFERENCES_KEY),
        completed,
    }
}

/// Copies today's record and the last week of snapshots.
///
/// The live `dailyProgress` record stays on the device; copied snapshots are
/// removed. Snapshots that fail to upload keep their key and fail the section.
pub async fn migrate_daily_progress(
    local: &dyn LocalStore,
    remote: &dyn RemoteStore,
    user_id: &str,
    today: NaiveDate,
) -> Result<()> {
    if let Some(progress) = load_json::<DailyProgress>(local, DAILY_PROGRESS_KEY) {
        if progress.is_for(today) {
            remote.upsert_progress(user_id, &progress).await?;
        }
    }

    let mut failed = Vec::new();
    for offset in 1..=HISTORY_DAYS {
        let Some(day) = today.checked_sub_days(Days::new(offset)) else {
            break;
        };
        let key = daily_snapshot_key(day);
        let Some(snapshot) = load_json::<DailyProgress>(local, &key) else {
            continue;
        };

        match remote.upsert_progress(user_id, &snapshot).await {
            Ok(()) => {
                if let Err(e) = local.remove(&key) {
                    warn!("failed to remove {}: {:#}", key, e);
                }
            }
            Err(e) => {
                warn!("failed to migrate progress for {}: {:#}", day, e);
                failed.push(day.to_string());
            }
        }
    }

    if !failed.is_empty() {
        return Err(anyhow!("snapshots not uploaded: {}", failed.join(", ")));
    }
    Ok(())
}

/// Uploads stored achievements, or the locked catalogue when there are none.
pub async fn migrate_achievements(
    local: &dyn LocalStore,
    remote: &dyn RemoteStore,
    user_id: &str,
) -> Result<()> {
    let achievements: Vec<Achievement> =
        load_json(local, ACHIEVEMENTS_KEY).unwrap_or_else(default_achievements);
    remote.upsert_achievements(user_id, &achievements).await
}

/// Folds stored preferences into the profile, then drops the local copy.
pub async fn migrate_user_preferences(
    local: &dyn LocalStore,
    remote: &dyn RemoteStore,
    user_id: &str,
) -> Result<()> {
    let Some(prefs) = load_json::<StoredPreferences>(local, USER_PREFERENCES_KEY) else {
        return Ok(());
    };

    let existing = remote.get_profile(user_id).await?;
    let had_row = existing.is_some();
    let profile = merge_preferences(user_id, prefs, existing);
    if had_row {
        remote.update_profile(&profile).await?;
    } else {
        remote.create_profile(&profile).await?;
    }

    local.remove(USER_PREFERENCES_KEY)
}

/// Stored values win; gaps fall back to the existing profile, then to defaults.
pub fn merge_preferences(
    user_id: &str,
    prefs: StoredPreferences,
    existing: Option<UserProfile>,
) -> UserProfile {
    let defaults = UserProfile::with_defaults(user_id, None);
    let existing = existing.unwrap_or(UserProfile {
        user_id: user_id.to_string(),
        username: None,
        weight: None,
        activity_level: None,
        daily_goal: None,
        reminder_mode: None,
        manual_reminders: Vec::new(),
        eco_choice: None,
    });

    UserProfile {
        user_id: user_id.to_string(),
        username: prefs.username.or(existing.username),
        weight: prefs.weight.or(existing.weight).or(Some(0.0)),
        activity_level: prefs
            .activity_level
            .or(existing.activity_level)
            .or(defaults.activity_level),
        daily_goal: prefs
            .daily_goal
            .or(existing.daily_goal)
            .or(defaults.daily_goal),
        reminder_mode: prefs
            .reminder_mode
            .or(existing.reminder_mode)
            .or(defaults.reminder_mode),
        manual_reminders: if prefs.manual_reminders.is_empty() {
            existing.manual_reminders
        } else {
            prefs.manual_reminders
        },
        eco_choice: prefs
            .eco_choice
            .or(existing.eco_choice)
            .or(defaults.eco_choice),
    }
}

/// Runs every section and records the marker when all of them succeed.
#[instrument(skip(local, remote))]
pub async fn perform_migration(
    local: &dyn LocalStore,
    remote: &dyn RemoteStore,
    user_id: &str,
    today: NaiveDate,
) -> MigrationReport {
    let mut report = MigrationReport::default();

    if let Err(e) = migrate_daily_progress(local, remote, user_id, today).await {
        report.errors.push(format!("Daily Progress: {:#}", e));
    }
    if let Err(e) = migrate_achievements(local, remote, user_id).await {
        report.errors.push(format!("Achievements: {:#}", e));
    }
    if let Err(e) = migrate_user_preferences(local, remote, user_id).await {
        report.errors.push(format!("User Preferences: {:#}", e));
    }

    if report.success() {
        let marker = MigrationMarker {
            user_id: user_id.to_string(),
            completed_on: today,
        };
        if let Err(e) = save_json(local, MIGRATION_MARKER_KEY, &marker) {
            report.errors.push(format!(
                "Marker: {:#}",
                e.context("unable to record migration")
            ));
        } else {
            info!("data migration completed");
        }
    } else {
        warn!(errors = ?report.errors, "data migration incomplete");
    }

    report
}

/// Migrates only when there is something left to copy for this user.
///
/// Records belonging to another account are cleared first and never uploaded.
pub async fn migrate_if_needed(
    local: &dyn LocalStore,
    remote: &dyn RemoteStore,
    user_id: &str,
    today: NaiveDate,
) -> Option<MigrationReport> {
    if let Err(e) = claim_local_data(local, user_id) {
        warn!("could not claim local records: {:#}", e);
        return Some(MigrationReport {
            errors: vec![format!("Local Data: {:#}", e)],
        });
    }
    if !check_migration_needed(local, user_id).needed() {
        return None;
    }
    Some(perform_migration(local, remote, user_id, today).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, EcoChoice, ReminderMode};
    use crate::storage::MemoryStore;

    #[test]
    fn preferences_fill_gaps_with_defaults() {
        let prefs = StoredPreferences {
            username: Some("river".into()),
            daily_goal: Some(3200),
            ..Default::default()
        };
        let profile = merge_preferences("u1", prefs, None);

        assert_eq!(profile.user_id, "u1");
        assert_eq!(profile.username.as_deref(), Some("river"));
        assert_eq!(profile.daily_goal, Some(3200));
        assert_eq!(profile.weight, Some(0.0));
        assert_eq!(profile.activity_level, Some(ActivityLevel::Sedentary));
        assert_eq!(profile.reminder_mode, Some(ReminderMode::Smart));
        assert_eq!(profile.eco_choice, Some(EcoChoice::Skip));
    }

    #[test]
    fn existing_profile_beats_defaults() {
        let existing = UserProfile {
            user_id: "u1".into(),
            username: Some("lake".into()),
            weight: Some(71.0),
            activity_level: Some(ActivityLevel::Athlete),
            daily_goal: Some(2800),
            reminder_mode: Some(ReminderMode::Manual),
            manual_reminders: vec!["09:00".into()],
            eco_choice: Some(EcoChoice::Trees),
        };
        let prefs = StoredPreferences {
            activity_level: Some(ActivityLevel::Active),
            ..Default::default()
        };
        let profile = merge_preferences("u1", prefs, Some(existing));

        assert_eq!(profile.username.as_deref(), Some("lake"));
        assert_eq!(profile.activity_level, Some(ActivityLevel::Active));
        assert_eq!(profile.daily_goal, Some(2800));
        assert_eq!(profile.manual_reminders, vec!["09:00".to_string()]);
    }

    #[test]
    fn status_reflects_marker_owner() {
        let local = MemoryStore::new();
        assert!(!check_migration_needed(&local, "u1").needed());

        local.set(DAILY_PROGRESS_KEY, "{}").unwrap();
        assert!(check_migration_needed(&local, "u1").needed());

        let marker = MigrationMarker {
            user_id: "u1".into(),
            completed_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        save_json(&local, MIGRATION_MARKER_KEY, &marker).unwrap();
        assert!(!check_migration_needed(&local, "u1").needed());
        assert!(check_migration_needed(&local, "u2").needed());
    }
}
