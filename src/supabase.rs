use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::auth::SupabaseAuth;
use crate::models::{Achievement, AchievementKind, DailyProgress, UserProfile};
use crate::remote::RemoteStore;

const DAILY_PROGRESS_TABLE: &str = "daily_progress";
const ACHIEVEMENTS_TABLE: &str = "achievements";
const USER_PROFILES_TABLE: &str = "user_profiles";

/// Thin client for the backend's REST interface (`/rest/v1`).
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    auth: SupabaseAuth,
}

/// Row of the `daily_progress` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRow {
    pub user_id: String,
    pub date: NaiveDate,
    pub current_intake: u32,
    pub goal_reached: bool,
    pub streak_days: u32,
    #[serde(default)]
    pub last_goal_reached: Option<NaiveDate>,
    #[serde(default)]
    pub bottles_saved: u32,
}

impl ProgressRow {
    /// `None` when the record has no owning day yet.
    pub fn from_progress(user_id: &str, progress: &DailyProgress) -> Option<Self> {
        let date = progress.date?;
        Some(Self {
            user_id: user_id.to_string(),
            date,
            current_intake: progress.current_intake,
            goal_reached: progress.last_goal_reached == Some(date),
            streak_days: progress.streak_days,
            last_goal_reached: progress.last_goal_reached,
            bottles_saved: progress.bottles_saved,
        })
    }

    pub fn into_progress(self) -> DailyProgress {
        // Rows written before the column existed only carry the flag
        let last_goal_reached = self
            .last_goal_reached
            .or(self.goal_reached.then_some(self.date));
        DailyProgress {
            date: Some(self.date),
            current_intake: self.current_intake,
            streak_days: self.streak_days,
            last_goal_reached,
            bottles_saved: self.bottles_saved,
            ..Default::default()
        }
    }
}

/// Row of the `achievements` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementRow {
    pub user_id: String,
    pub achievement_type: AchievementKind,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub unlocked: bool,
    pub progress: u32,
    pub max_progress: u32,
}

impl AchievementRow {
    pub fn from_achievement(user_id: &str, a: &Achievement) -> Self {
        Self {
            user_id: user_id.to_string(),
            achievement_type: a.id,
            title: a.title.clone(),
            description: a.description.clone(),
            icon: a.icon.clone(),
            unlocked: a.unlocked,
            progress: a.progress,
            max_progress: a.max_progress,
        }
    }
}

async fn request_error(resp: Response, what: &str) -> anyhow::Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    anyhow!("{} failed: {} - {}", what, status, body)
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

impl SupabaseClient {
    pub fn new(base_url: &str, auth: SupabaseAuth) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn auth(&self) -> &SupabaseAuth {
        &self.auth
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.auth.get_access_token().await?;
        Ok(req.header("apikey", self.auth.anon_key()).bearer_auth(token))
    }

    /// `GET /rest/v1/{table}` with PostgREST filter pairs such as `("date", "gte.2024-01-01")`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let req = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*")])
            .query(filters);

        let resp = self.authorized(req).await?.send().await?;
        if !resp.status().is_success() {
            return Err(request_error(resp, &format!("SELECT {}", table)).await);
        }

        Ok(resp.json().await?)
    }

    /// Insert rows, merging into existing ones that collide on `on_conflict`.
    pub async fn upsert<T: Serialize>(
        &self,
        table: &str,
        rows: &[T],
        on_conflict: &str,
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let req = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);

        let resp = self.authorized(req).await?.send().await?;
        if !resp.status().is_success() {
            return Err(request_error(resp, &format!("UPSERT {}", table)).await);
        }

        Ok(())
    }

    /// `PATCH` the rows matching `filters` with the given fields and return
    /// how many rows changed.
    pub async fn update<T: Serialize>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        fields: &T,
    ) -> Result<usize> {
        let req = self
            .client
            .patch(self.table_url(table))
            .query(filters)
            .header("Prefer", "return=representation")
            .json(fields);

        let resp = self.authorized(req).await?.send().await?;
        if !resp.status().is_success() {
            return Err(request_error(resp, &format!("UPDATE {}", table)).await);
        }

        let rows: Vec<serde_json::Value> = resp.json().await?;
        Ok(rows.len())
    }
}

#[async_trait]
impl RemoteStore for SupabaseClient {
    #[instrument(skip(self, progress))]
    async fn upsert_progress(&self, user_id: &str, progress: &DailyProgress) -> Result<()> {
        let row = ProgressRow::from_progress(user_id, progress)
            .ok_or_else(|| anyhow!("progress record has no date"))?;
        self.upsert(DAILY_PROGRESS_TABLE, &[row], "user_id,date")
            .await?;
        debug!("progress upserted");
        Ok(())
    }

    async fn get_progress(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyProgress>> {
        let rows: Vec<ProgressRow> = self
            .select(
                DAILY_PROGRESS_TABLE,
                &[("user_id", eq(user_id)), ("date", eq(date))],
            )
            .await?;
        Ok(rows.into_iter().next().map(ProgressRow::into_progress))
    }

    async fn list_progress(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyProgress>> {
        let rows: Vec<ProgressRow> = self
            .select(
                DAILY_PROGRESS_TABLE,
                &[
                    ("user_id", eq(user_id)),
                    ("date", format!("gte.{}", start)),
                    ("date", format!("lte.{}", end)),
                    ("order", "date.asc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(ProgressRow::into_progress).collect())
    }

    #[instrument(skip(self, achievements), fields(count = achievements.len()))]
    async fn upsert_achievements(&self, user_id: &str, achievements: &[Achievement]) -> Result<()> {
        let rows: Vec<AchievementRow> = achievements
            .iter()
            .map(|a| AchievementRow::from_achievement(user_id, a))
            .collect();
        self.upsert(ACHIEVEMENTS_TABLE, &rows, "user_id,achievement_type")
            .await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let rows: Vec<UserProfile> = self
            .select(USER_PROFILES_TABLE, &[("user_id", eq(user_id))])
            .await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self, profile), fields(user_id = %profile.user_id))]
    async fn create_profile(&self, profile: &UserProfile) -> Result<()> {
        self.upsert(USER_PROFILES_TABLE, std::slice::from_ref(profile), "user_id")
            .await?;
        debug!("profile created");
        Ok(())
    }

    async fn update_profile(&self, profile: &UserProfile) -> Result<()> {
        let updated = self
            .update(
                USER_PROFILES_TABLE,
                &[("user_id", eq(&profile.user_id))],
                profile,
            )
            .await?;
        if updated == 0 {
            return Err(anyhow!("no profile row for user {}", profile.user_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn progress_row_marks_goal_for_its_own_day() {
        let progress = DailyProgress {
            date: Some(date("2024-01-02")),
            current_intake: 2500,
            streak_days: 3,
            last_goal_reached: Some(date("2024-01-02")),
            bottles_saved: 5,
            ..Default::default()
        };
        let row = ProgressRow::from_progress("u1", &progress).unwrap();
        assert!(row.goal_reached);
        assert_eq!(row.into_progress(), progress);
    }

    #[test]
    fn undated_progress_has_no_row() {
        assert!(ProgressRow::from_progress("u1", &DailyProgress::default()).is_none());
    }

    #[test]
    fn legacy_row_without_goal_column() {
        let row: ProgressRow = serde_json::from_value(serde_json::json!({
            "user_id": "u1",
            "date": "2024-01-03",
            "current_intake": 2700,
            "goal_reached": true,
            "streak_days": 2,
        }))
        .unwrap();
        let progress = row.into_progress();
        assert_eq!(progress.last_goal_reached, Some(date("2024-01-03")));
        assert_eq!(progress.bottles_saved, 0);
    }
}
