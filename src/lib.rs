//! Hydration tracking core.
//!
//! Pure calculations (sip recommendations, daily progress and streaks,
//! environmental impact, achievements) plus the storage and backend
//! plumbing that keeps a user's day record in sync.

pub mod achievements;
pub mod auth;
pub mod client;
pub mod config;
pub mod impact;
pub mod migration;
pub mod models;
pub mod progress;
pub mod recommendation;
pub mod remote;
pub mod stats;
pub mod storage;
pub mod supabase;
pub mod tracker;
pub mod weather;

pub use client::HydrationClient;
pub use config::Config;
pub use models::{
    Achievement, AchievementKind, ActivityLevel, BottleType, DailyProgress, SipRecommendation,
    Urgency, UserGoalProfile, UserProfile, WeatherCondition, WeatherSample,
};
pub use progress::{apply_log, roll_over, LogOutcome, RolloverOutcome};
pub use recommendation::{calculate_next_sip, recommend_next_sip, temperature_multiplier};
pub use remote::RemoteStore;
pub use storage::{FileStore, LocalStore, MemoryStore};
pub use tracker::ProgressTracker;
