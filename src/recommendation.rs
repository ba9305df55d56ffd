//! Sip-size recommendations.
//!
//! Everything here is a pure function of its inputs: weather, the user's goal
//! settings, and today's intake. No storage or network access.

use crate::models::{ActivityLevel, SipRecommendation, Urgency, UserGoalProfile, WeatherSample};

/// Base serving in ml before any multiplier is applied.
pub const BASE_SIP_ML: u32 = 250;

const DEFAULT_MESSAGE: &str = "Take a standard sip to stay hydrated";

/// Temperature band used to scale the base sip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBand {
    /// <= 10°C
    Cold,
    /// 10-25°C
    Normal,
    /// 25-30°C
    Warm,
    /// > 30°C
    Hot,
}

impl TemperatureBand {
    pub fn from_celsius(temperature: f64) -> Self {
        if temperature <= 10.0 {
            TemperatureBand::Cold
        } else if temperature <= 25.0 {
            TemperatureBand::Normal
        } else if temperature <= 30.0 {
            TemperatureBand::Warm
        } else {
            TemperatureBand::Hot
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            TemperatureBand::Cold => 0.8,
            TemperatureBand::Normal => 1.0,
            TemperatureBand::Warm => 1.2,
            TemperatureBand::Hot => 1.5,
        }
    }
}

/// Multiplier for a temperature reading. A missing reading counts as normal.
pub fn temperature_multiplier(temperature: Option<f64>) -> f64 {
    temperature
        .map(|t| TemperatureBand::from_celsius(t).multiplier())
        .unwrap_or(1.0)
}

impl ActivityLevel {
    pub fn sip_multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.0,
            ActivityLevel::Active => 1.2,
            ActivityLevel::Athlete => 1.5,
        }
    }

    /// Milliliters of water per kg of body weight per day.
    pub fn ml_per_kg(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 30.0,
            ActivityLevel::Active => 35.0,
            ActivityLevel::Athlete => 40.0,
        }
    }
}

/// Suggested daily goal in ml for a body weight in kg.
pub fn daily_goal_for_weight(weight_kg: f64, activity: ActivityLevel) -> u32 {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return 0;
    }
    (weight_kg * activity.ml_per_kg()).round() as u32
}

pub fn progress_percentage(current_intake: u32, daily_goal: u32) -> f64 {
    if daily_goal == 0 {
        return 100.0;
    }
    100.0 * f64::from(current_intake) / f64::from(daily_goal)
}

fn default_recommendation() -> SipRecommendation {
    SipRecommendation {
        amount: BASE_SIP_ML,
        message: DEFAULT_MESSAGE.to_string(),
        urgency: Urgency::Medium,
    }
}

/// Computes the next sip regardless of how far along the user is.
///
/// Falls back to a standard 250 ml sip when the goal or activity level is
/// unset. See [`recommend_next_sip`] for the variant that goes quiet once the
/// goal is met.
pub fn calculate_next_sip(
    weather: Option<&WeatherSample>,
    profile: &UserGoalProfile,
    current_intake: u32,
) -> SipRecommendation {
    let (Some(daily_goal), Some(activity)) = (profile.daily_goal, profile.activity_level) else {
        return default_recommendation();
    };
    if daily_goal == 0 {
        return default_recommendation();
    }

    let temperature = weather.map(|w| w.temperature);
    let amount = (f64::from(BASE_SIP_ML)
        * temperature_multiplier(temperature)
        * activity.sip_multiplier())
    .round() as u32;

    let progress = progress_percentage(current_intake, daily_goal);

    let (urgency, message) = match temperature {
        Some(t) if progress < 30.0 => (
            Urgency::High,
            if t > 30.0 {
                "High temperature! Take a larger sip to stay hydrated"
            } else {
                "You're behind on your daily goal. Time to catch up!"
            },
        ),
        Some(t) if progress < 60.0 => (
            Urgency::Medium,
            if t > 25.0 {
                "Warm weather - keep up your hydration!"
            } else {
                "Stay on track with your hydration goal"
            },
        ),
        Some(t) => (
            Urgency::Low,
            if t > 30.0 {
                "Hot weather - maintain your hydration"
            } else {
                "Great progress! Keep it up!"
            },
        ),
        None if progress < 50.0 => (Urgency::Medium, "Stay on track with your hydration goal"),
        None => (Urgency::Medium, "Keep up the good work!"),
    };

    SipRecommendation {
        amount,
        message: message.to_string(),
        urgency,
    }
}

/// Like [`calculate_next_sip`] but returns `None` once today's goal is met.
pub fn recommend_next_sip(
    weather: Option<&WeatherSample>,
    profile: &UserGoalProfile,
    current_intake: u32,
) -> Option<SipRecommendation> {
    if let Some(goal) = profile.daily_goal {
        if goal > 0 && progress_percentage(current_intake, goal) >= 100.0 {
            return None;
        }
    }
    Some(calculate_next_sip(weather, profile, current_intake))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherCondition;

    fn weather(temperature: f64) -> WeatherSample {
        WeatherSample {
            temperature,
            condition: WeatherCondition::Clear,
            is_day: true,
        }
    }

    fn profile(goal: u32, activity: ActivityLevel) -> UserGoalProfile {
        UserGoalProfile {
            daily_goal: Some(goal),
            activity_level: Some(activity),
        }
    }

    #[test]
    fn test_temperature_band_boundaries() {
        assert_eq!(temperature_multiplier(Some(-5.0)), 0.8);
        assert_eq!(temperature_multiplier(Some(10.0)), 0.8);
        assert_eq!(temperature_multiplier(Some(10.5)), 1.0);
        assert_eq!(temperature_multiplier(Some(25.0)), 1.0);
        assert_eq!(temperature_multiplier(Some(25.1)), 1.2);
        assert_eq!(temperature_multiplier(Some(30.0)), 1.2);
        assert_eq!(temperature_multiplier(Some(30.1)), 1.5);
        assert_eq!(temperature_multiplier(Some(45.0)), 1.5);
        assert_eq!(temperature_multiplier(None), 1.0);
    }

    #[test]
    fn test_lookups_are_stable() {
        for t in [-10.0, 10.0, 18.0, 27.0, 33.0] {
            assert_eq!(temperature_multiplier(Some(t)), temperature_multiplier(Some(t)));
        }
        for level in [
            ActivityLevel::Sedentary,
            ActivityLevel::Active,
            ActivityLevel::Athlete,
        ] {
            assert_eq!(level.sip_multiplier(), level.sip_multiplier());
        }
    }

    #[test]
    fn test_default_when_profile_incomplete() {
        let cases = [
            UserGoalProfile::default(),
            UserGoalProfile {
                daily_goal: Some(2500),
                activity_level: None,
            },
            UserGoalProfile {
                daily_goal: None,
                activity_level: Some(ActivityLevel::Athlete),
            },
        ];
        for p in cases {
            for w in [None, Some(weather(35.0)), Some(weather(0.0))] {
                let rec = calculate_next_sip(w.as_ref(), &p, 100);
                assert_eq!(rec.amount, 250);
                assert_eq!(rec.urgency, Urgency::Medium);
                assert_eq!(rec.message, "Take a standard sip to stay hydrated");
            }
        }
    }

    #[test]
    fn test_amount_positive_for_all_levels() {
        for level in [
            ActivityLevel::Sedentary,
            ActivityLevel::Active,
            ActivityLevel::Athlete,
        ] {
            for w in [None, Some(weather(-20.0)), Some(weather(40.0))] {
                let rec = calculate_next_sip(w.as_ref(), &profile(2000, level), 0);
                assert!(rec.amount > 0);
            }
        }
    }

    #[test]
    fn test_hot_and_behind() {
        let rec = calculate_next_sip(
            Some(&weather(32.0)),
            &profile(2000, ActivityLevel::Active),
            200,
        );
        assert_eq!(rec.amount, 450);
        assert_eq!(rec.urgency, Urgency::High);
        assert_eq!(
            rec.message,
            "High temperature! Take a larger sip to stay hydrated"
        );
    }

    #[test]
    fn test_mild_and_behind() {
        let rec = calculate_next_sip(
            Some(&weather(20.0)),
            &profile(2000, ActivityLevel::Sedentary),
            0,
        );
        assert_eq!(rec.amount, 250);
        assert_eq!(rec.urgency, Urgency::High);
        assert_eq!(
            rec.message,
            "You're behind on your daily goal. Time to catch up!"
        );
    }

    #[test]
    fn test_midway_messages() {
        let p = profile(2000, ActivityLevel::Sedentary);
        let warm = calculate_next_sip(Some(&weather(28.0)), &p, 1000);
        assert_eq!(warm.urgency, Urgency::Medium);
        assert_eq!(warm.message, "Warm weather - keep up your hydration!");
        assert_eq!(warm.amount, 300);

        let mild = calculate_next_sip(Some(&weather(25.0)), &p, 600);
        assert_eq!(mild.urgency, Urgency::Medium);
        assert_eq!(mild.message, "Stay on track with your hydration goal");
    }

    #[test]
    fn test_nearly_done_messages() {
        let p = profile(2000, ActivityLevel::Sedentary);
        let hot = calculate_next_sip(Some(&weather(31.0)), &p, 1200);
        assert_eq!(hot.urgency, Urgency::Low);
        assert_eq!(hot.message, "Hot weather - maintain your hydration");

        let mild = calculate_next_sip(Some(&weather(30.0)), &p, 1900);
        assert_eq!(mild.urgency, Urgency::Low);
        assert_eq!(mild.message, "Great progress! Keep it up!");
    }

    #[test]
    fn test_no_weather_uses_progress_split() {
        let rec = calculate_next_sip(None, &profile(3000, ActivityLevel::Athlete), 500);
        assert_eq!(rec.amount, 375);
        assert_eq!(rec.urgency, Urgency::Medium);
        assert_eq!(rec.message, "Stay on track with your hydration goal");

        let later = calculate_next_sip(None, &profile(3000, ActivityLevel::Athlete), 1500);
        assert_eq!(later.urgency, Urgency::Medium);
        assert_eq!(later.message, "Keep up the good work!");
    }

    #[test]
    fn test_suppressed_once_goal_met() {
        let p = profile(2000, ActivityLevel::Active);
        assert!(recommend_next_sip(None, &p, 1999).is_some());
        assert!(recommend_next_sip(None, &p, 2000).is_none());
        assert!(recommend_next_sip(Some(&weather(35.0)), &p, 2600).is_none());
        assert!(recommend_next_sip(None, &UserGoalProfile::default(), 9000).is_some());
    }

    #[test]
    fn test_daily_goal_for_weight() {
        assert_eq!(daily_goal_for_weight(70.0, ActivityLevel::Sedentary), 2100);
        assert_eq!(daily_goal_for_weight(70.0, ActivityLevel::Active), 2450);
        assert_eq!(daily_goal_for_weight(62.5, ActivityLevel::Athlete), 2500);
        assert_eq!(daily_goal_for_weight(-1.0, ActivityLevel::Athlete), 0);
    }
}
