#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sipwise::models::{Achievement, DailyProgress, UserProfile};
use sipwise::RemoteStore;

/// Backend stand-in keyed the same way as the real tables.
#[derive(Default)]
pub struct MemoryRemote {
    pub progress: Mutex<HashMap<(String, NaiveDate), DailyProgress>>,
    pub achievements: Mutex<HashMap<String, Vec<Achievement>>>,
    pub profiles: Mutex<HashMap<String, UserProfile>>,
    pub offline: AtomicBool,
    /// Days whose progress upload is rejected.
    pub rejected_days: Mutex<HashSet<NaiveDate>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn reject_progress_for(&self, day: NaiveDate) {
        self.rejected_days.lock().unwrap().insert(day);
    }

    pub fn insert_profile(&self, profile: UserProfile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.user_id.clone(), profile);
    }

    fn check(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(anyhow!("backend unreachable"));
        }
        Ok(())
    }

    pub fn progress_for(&self, user_id: &str, date: NaiveDate) -> Option<DailyProgress> {
        self.progress
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), date))
            .cloned()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn upsert_progress(&self, user_id: &str, progress: &DailyProgress) -> Result<()> {
        self.check()?;
        let date = progress.date.ok_or_else(|| anyhow!("progress record has no date"))?;
        if self.rejected_days.lock().unwrap().contains(&date) {
            return Err(anyhow!("UPSERT daily_progress failed: 400 Bad Request"));
        }
        self.progress
            .lock()
            .unwrap()
            .insert((user_id.to_string(), date), progress.clone());
        Ok(())
    }

    async fn get_progress(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyProgress>> {
        self.check()?;
        Ok(self.progress_for(user_id, date))
    }

    async fn list_progress(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyProgress>> {
        self.check()?;
        let mut rows: Vec<DailyProgress> = self
            .progress
            .lock()
            .unwrap()
            .iter()
            .filter(|((uid, date), _)| uid == user_id && *date >= start && *date <= end)
            .map(|(_, p)| p.clone())
            .collect();
        rows.sort_by_key(|p| p.date);
        Ok(rows)
    }

    async fn upsert_achievements(&self, user_id: &str, achievements: &[Achievement]) -> Result<()> {
        self.check()?;
        self.achievements
            .lock()
            .unwrap()
            .insert(user_id.to_string(), achievements.to_vec());
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        self.check()?;
        Ok(self.profiles.lock().unwrap().get(user_id).cloned())
    }

    async fn create_profile(&self, profile: &UserProfile) -> Result<()> {
        self.check()?;
        self.insert_profile(profile.clone());
        Ok(())
    }

    /// Like a PATCH, only rows that already exist change.
    async fn update_profile(&self, profile: &UserProfile) -> Result<()> {
        self.check()?;
        let mut profiles = self.profiles.lock().unwrap();
        match profiles.get_mut(&profile.user_id) {
            Some(row) => {
                *row = profile.clone();
                Ok(())
            }
            None => Err(anyhow!("no profile row for user {}", profile.user_id)),
        }
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}
