use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const PROGRESS_RECORD_VERSION: u32 = 1;

fn default_version() -> u32 {
    PROGRESS_RECORD_VERSION
}

/// One user's accumulated intake for one calendar day.
///
/// Stored locally as camelCase JSON. `lastGoalReached` is written as an empty
/// string when unset so older records keep parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    #[serde(default = "default_version")]
    pub version: u32,
    /// The owning day. `None` only for the implicit zero state.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Milliliters logged on `date`
    #[serde(default)]
    pub current_intake: u32,
    #[serde(default)]
    pub streak_days: u32,
    #[serde(default, with = "empty_date")]
    pub last_goal_reached: Option<NaiveDate>,
    /// Reusable-bottle servings logged, cumulative
    #[serde(default)]
    pub bottles_saved: u32,
}

impl Default for DailyProgress {
    fn default() -> Self {
        Self {
            version: PROGRESS_RECORD_VERSION,
            date: None,
            current_intake: 0,
            streak_days: 0,
            last_goal_reached: None,
            bottles_saved: 0,
        }
    }
}

impl DailyProgress {
    pub fn is_for(&self, day: NaiveDate) -> bool {
        self.date == Some(day)
    }

    /// Intake that counts toward `day`; a record owned by another day counts as zero.
    pub fn intake_on(&self, day: NaiveDate) -> u32 {
        if self.is_for(day) {
            self.current_intake
        } else {
            0
        }
    }
}

/// Serializes `Option<NaiveDate>` as `"YYYY-MM-DD"` or `""`.
mod empty_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    Active,
    Athlete,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Active => "active",
            ActivityLevel::Athlete => "athlete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BottleType {
    Reusable,
    Plastic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMode {
    Smart,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EcoChoice {
    Bottles,
    Trees,
    Skip,
}

/// Goal settings the calculations read. Both fields may be unset before onboarding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGoalProfile {
    /// Target milliliters per day
    pub daily_goal: Option<u32>,
    pub activity_level: Option<ActivityLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Rain,
    Snow,
    Thunderstorm,
}

/// A current-conditions reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSample {
    /// Degrees Celsius
    pub temperature: f64,
    pub condition: WeatherCondition,
    pub is_day: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SipRecommendation {
    /// Milliliters for the next sip
    pub amount: u32,
    pub message: String,
    pub urgency: Urgency,
}

/// Row of the `user_profiles` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub username: Option<String>,
    /// Body weight in kg
    pub weight: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub daily_goal: Option<u32>,
    pub reminder_mode: Option<ReminderMode>,
    #[serde(default)]
    pub manual_reminders: Vec<String>,
    pub eco_choice: Option<EcoChoice>,
}

/// Daily goal given to new profiles, in ml.
pub const DEFAULT_DAILY_GOAL: u32 = 2500;

impl UserProfile {
    /// A fresh row with the onboarding defaults.
    pub fn with_defaults(user_id: &str, username: Option<String>) -> Self {
        Self {
            user_id: user_id.to_string(),
            username,
            weight: None,
            activity_level: Some(ActivityLevel::Sedentary),
            daily_goal: Some(DEFAULT_DAILY_GOAL),
            reminder_mode: Some(ReminderMode::Smart),
            manual_reminders: Vec::new(),
            eco_choice: Some(EcoChoice::Skip),
        }
    }

    pub fn goal_profile(&self) -> UserGoalProfile {
        UserGoalProfile {
            daily_goal: self.daily_goal,
            activity_level: self.activity_level,
        }
    }
}

/// Pre-account preferences blob kept under the `userPreferences` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPreferences {
    pub username: Option<String>,
    pub weight: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub daily_goal: Option<u32>,
    pub reminder_mode: Option<ReminderMode>,
    #[serde(default)]
    pub manual_reminders: Vec<String>,
    pub eco_choice: Option<EcoChoice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    FirstGoal,
    #[serde(rename = "streak_3")]
    Streak3,
    #[serde(rename = "streak_7")]
    Streak7,
    #[serde(rename = "streak_30")]
    Streak30,
    #[serde(rename = "bottles_10")]
    Bottles10,
    #[serde(rename = "bottles_100")]
    Bottles100,
}

impl AchievementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementKind::FirstGoal => "first_goal",
            AchievementKind::Streak3 => "streak_3",
            AchievementKind::Streak7 => "streak_7",
            AchievementKind::Streak30 => "streak_30",
            AchievementKind::Bottles10 => "bottles_10",
            AchievementKind::Bottles100 => "bottles_100",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: AchievementKind,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub unlocked: bool,
    pub progress: u32,
    pub max_progress: u32,
}
