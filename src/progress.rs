//! Daily intake bookkeeping.
//!
//! A [`DailyProgress`] record moves through two transitions: a logged drink
//! ([`apply_log`]) and the start of a new day ([`roll_over`]). Both are pure;
//! persisting the result is the tracker's job.

use chrono::NaiveDate;

use crate::impact::bottles_for_serving;
use crate::models::{BottleType, DailyProgress};

/// Result of logging a drink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOutcome {
    pub progress: DailyProgress,
    pub goal_reached: bool,
    /// Set exactly when this log is the one that first reaches today's goal.
    pub celebrate: bool,
}

/// Result of evaluating a record against the current day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverOutcome {
    pub progress: DailyProgress,
    /// The stored record belonged to an earlier day.
    pub day_changed: bool,
    pub streak_reset: bool,
}

impl RolloverOutcome {
    /// Whether the stored record differs from `progress` and should be rewritten.
    pub fn needs_persist(&self) -> bool {
        self.day_changed || self.streak_reset
    }
}

fn yesterday(today: NaiveDate) -> Option<NaiveDate> {
    today.pred_opt()
}

/// True when the goal was last met before yesterday, i.e. at least one full
/// day went by without reaching it.
pub fn streak_lapsed(last_goal_reached: Option<NaiveDate>, today: NaiveDate) -> bool {
    match (last_goal_reached, yesterday(today)) {
        (Some(last), Some(y)) => last < y,
        _ => false,
    }
}

pub fn apply_log(
    prior: &DailyProgress,
    amount: u32,
    bottle: BottleType,
    daily_goal: Option<u32>,
    today: NaiveDate,
) -> LogOutcome {
    let new_intake = prior.intake_on(today).saturating_add(amount);

    // A zero goal counts as unset
    let goal_reached = matches!(daily_goal, Some(goal) if goal > 0 && new_intake >= goal);
    let first_time = goal_reached && prior.last_goal_reached != Some(today);

    let mut streak_days = prior.streak_days;
    if first_time {
        if prior.last_goal_reached.is_some() && prior.last_goal_reached == yesterday(today) {
            streak_days = streak_days.saturating_add(1);
        } else {
            streak_days = 1;
        }
    }

    let bottles_saved = match bottle {
        BottleType::Reusable => prior.bottles_saved.saturating_add(bottles_for_serving(amount)),
        BottleType::Plastic => prior.bottles_saved,
    };

    let progress = DailyProgress {
        version: prior.version,
        date: Some(today),
        current_intake: new_intake,
        streak_days,
        last_goal_reached: if goal_reached {
            Some(today)
        } else {
            prior.last_goal_reached
        },
        bottles_saved,
    };

    LogOutcome {
        progress,
        goal_reached,
        celebrate: first_time,
    }
}

pub fn roll_over(prior: &DailyProgress, today: NaiveDate) -> RolloverOutcome {
    let mut progress = prior.clone();

    let streak_reset = progress.streak_days > 0 && streak_lapsed(prior.last_goal_reached, today);
    if streak_reset {
        progress.streak_days = 0;
    }

    let day_changed = !prior.is_for(today);
    if day_changed {
        progress.date = Some(today);
        progress.current_intake = 0;
    }

    RolloverOutcome {
        progress,
        day_changed,
        streak_reset,
    }
}
