use anyhow::Result;
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::auth::SupabaseAuth;
use crate::config::Config;
use crate::impact::EnvironmentalImpact;
use crate::migration::{migrate_if_needed, MigrationReport};
use crate::models::*;
use crate::progress::LogOutcome;
use crate::recommendation::recommend_next_sip;
use crate::remote::RemoteStore;
use crate::stats::{month_containing, week_ending, PeriodStats};
use crate::storage::FileStore;
use crate::supabase::SupabaseClient;
use crate::tracker::ProgressTracker;
use crate::weather::WeatherClient;

/// A signed-in session: local file storage, backend sync and weather.
///
/// Dates are taken from the device's local clock.
pub struct HydrationClient {
    tracker: ProgressTracker<FileStore, SupabaseClient>,
    weather: WeatherClient,
    goal: UserGoalProfile,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl HydrationClient {
    fn from_auth(config: &Config, auth: SupabaseAuth) -> Result<Self> {
        let user_id = auth.user_id().to_string();
        let local = FileStore::open(&config.data_dir)?;
        let remote = SupabaseClient::new(&config.supabase_url, auth);
        let mut tracker = ProgressTracker::new(local, remote);
        tracker.switch_user(&user_id)?;
        Ok(Self {
            tracker,
            weather: WeatherClient::new(&config.weather_base_url),
            goal: UserGoalProfile::default(),
        })
    }

    /// Sign in with email and password.
    pub async fn login(config: &Config, email: &str, password: &str) -> Result<Self> {
        let auth = SupabaseAuth::sign_in_with_password(
            &config.supabase_url,
            &config.supabase_anon_key,
            email,
            password,
        )
        .await?;
        Self::from_auth(config, auth)
    }

    pub async fn sign_up(
        config: &Config,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<Self> {
        let auth = SupabaseAuth::sign_up(
            &config.supabase_url,
            &config.supabase_anon_key,
            email,
            password,
            username,
        )
        .await?;
        let mut client = Self::from_auth(config, auth)?;
        if let Err(e) = client.ensure_profile(Some(username.to_string())).await {
            warn!("profile not created at sign-up: {:#}", e);
        }
        Ok(client)
    }

    pub fn user_id(&self) -> &str {
        self.tracker.remote().auth().user_id()
    }

    pub fn tracker(&self) -> &ProgressTracker<FileStore, SupabaseClient> {
        &self.tracker
    }

    pub fn goal(&self) -> &UserGoalProfile {
        &self.goal
    }

    pub fn set_goal(&mut self, goal: UserGoalProfile) {
        self.goal = goal;
    }

    /// Fetch the profile and adopt its goal settings.
    pub async fn get_profile(&mut self) -> Result<Option<UserProfile>> {
        let profile = self.tracker.remote().get_profile(self.user_id()).await?;
        if let Some(ref p) = profile {
            self.goal = p.goal_profile();
        }
        Ok(profile)
    }

    /// Fetch the profile, creating one with the default goal settings when
    /// the account has none yet.
    pub async fn ensure_profile(&mut self, username: Option<String>) -> Result<UserProfile> {
        if let Some(profile) = self.get_profile().await? {
            return Ok(profile);
        }

        let profile = UserProfile::with_defaults(self.user_id(), username);
        self.tracker.remote().create_profile(&profile).await?;
        self.goal = profile.goal_profile();
        info!("default profile created");
        Ok(profile)
    }

    pub async fn update_profile(&mut self, profile: &UserProfile) -> Result<()> {
        self.tracker.remote().update_profile(profile).await?;
        self.goal = profile.goal_profile();
        Ok(())
    }

    /// Everything the home screen needs on load: profile, one-time
    /// migration, progress from another device, then the day rollover.
    pub async fn start_session(&mut self) -> Result<(DailyProgress, Option<MigrationReport>)> {
        let today = today();

        if let Err(e) = self.ensure_profile(None).await {
            warn!("profile unavailable, using cached goal: {:#}", e);
        }

        let report = migrate_if_needed(
            self.tracker.local(),
            self.tracker.remote(),
            self.user_id(),
            today,
        )
        .await;

        if let Err(e) = self.tracker.restore_from_remote(today).await {
            warn!("could not check backend for today's progress: {:#}", e);
        }

        let progress = self.tracker.refresh_day(today).await;
        info!(
            intake = progress.current_intake,
            streak_days = progress.streak_days,
            "session started"
        );
        Ok((progress, report))
    }

    pub async fn refresh_day(&self) -> DailyProgress {
        self.tracker.refresh_day(today()).await
    }

    /// Log a drink for today.
    pub async fn log_intake(&self, amount: u32, bottle: BottleType) -> Result<LogOutcome> {
        self.tracker
            .log_intake(amount, bottle, &self.goal, today())
            .await
    }

    /// Current weather at the location, if one is given and the lookup succeeds.
    pub async fn weather(&self, location: Option<(f64, f64)>) -> Option<WeatherSample> {
        let (lat, lon) = location?;
        self.weather.current(lat, lon).await
    }

    /// The next sip suggestion, or `None` once today's goal is met.
    pub async fn next_sip(&self, location: Option<(f64, f64)>) -> Option<SipRecommendation> {
        let weather = self.weather(location).await;
        let intake = self.tracker.stored().intake_on(today());
        recommend_next_sip(weather.as_ref(), &self.goal, intake)
    }

    pub fn impact(&self) -> EnvironmentalImpact {
        self.tracker.impact()
    }

    pub fn achievements(&self) -> Vec<Achievement> {
        self.tracker.achievements()
    }

    pub async fn weekly_stats(&self) -> Result<PeriodStats> {
        let (start, end) = week_ending(today());
        self.tracker.period_stats(start, end, &self.goal).await
    }

    pub async fn monthly_stats(&self) -> Result<PeriodStats> {
        let (start, end) = month_containing(today());
        self.tracker.period_stats(start, end, &self.goal).await
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.tracker.remote().auth().sign_out().await
    }
}
