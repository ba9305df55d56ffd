use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Achievement, DailyProgress, UserProfile};

/// Backend tables the tracker mirrors to.
///
/// Writes are upserts: progress is keyed by (user, date) and achievements by
/// (user, achievement type). The last write wins.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn upsert_progress(&self, user_id: &str, progress: &DailyProgress) -> Result<()>;

    async fn get_progress(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyProgress>>;

    /// Records with `start <= date <= end`, oldest first.
    async fn list_progress(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyProgress>>;

    async fn upsert_achievements(&self, user_id: &str, achievements: &[Achievement]) -> Result<()>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Inserts the profile row, replacing one the user already has.
    async fn create_profile(&self, profile: &UserProfile) -> Result<()>;

    /// Updates the existing row. Fails when the user has no profile yet.
    async fn update_profile(&self, profile: &UserProfile) -> Result<()>;
}
