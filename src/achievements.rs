use crate::models::{Achievement, AchievementKind, DailyProgress};

pub const ALL_ACHIEVEMENTS: [AchievementKind; 6] = [
    AchievementKind::FirstGoal,
    AchievementKind::Streak3,
    AchievementKind::Streak7,
    AchievementKind::Streak30,
    AchievementKind::Bottles10,
    AchievementKind::Bottles100,
];

impl AchievementKind {
    /// (title, description, icon, max progress)
    fn details(&self) -> (&'static str, &'static str, &'static str, u32) {
        match self {
            AchievementKind::FirstGoal => (
                "First Goal",
                "Reach your daily goal for the first time",
                "trophy",
                1,
            ),
            AchievementKind::Streak3 => ("3-Day Streak", "Reach your goal 3 days in a row", "fire", 3),
            AchievementKind::Streak7 => ("Week Warrior", "Reach your goal 7 days in a row", "fire", 7),
            AchievementKind::Streak30 => (
                "Hydration Master",
                "Reach your goal 30 days in a row",
                "crown",
                30,
            ),
            AchievementKind::Bottles10 => ("Eco Warrior", "Save 10 plastic bottles", "recycle", 10),
            AchievementKind::Bottles100 => ("Ocean Protector", "Save 100 plastic bottles", "fish", 100),
        }
    }

    pub fn max_progress(&self) -> u32 {
        self.details().3
    }

    /// The locked, zero-progress entry.
    pub fn initial(&self) -> Achievement {
        let (title, description, icon, max_progress) = self.details();
        Achievement {
            id: *self,
            title: title.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            unlocked: false,
            progress: 0,
            max_progress,
        }
    }

    fn metric(&self, progress: &DailyProgress) -> u32 {
        match self {
            AchievementKind::FirstGoal => u32::from(progress.last_goal_reached.is_some()),
            AchievementKind::Streak3 | AchievementKind::Streak7 | AchievementKind::Streak30 => {
                progress.streak_days
            }
            AchievementKind::Bottles10 | AchievementKind::Bottles100 => progress.bottles_saved,
        }
    }
}

pub fn default_achievements() -> Vec<Achievement> {
    ALL_ACHIEVEMENTS.iter().map(|k| k.initial()).collect()
}

/// Recomputes every achievement from the current record.
///
/// `previous` carries earlier results; an achievement that was unlocked stays
/// unlocked even after the streak behind it breaks.
pub fn evaluate(progress: &DailyProgress, previous: &[Achievement]) -> Vec<Achievement> {
    ALL_ACHIEVEMENTS
        .iter()
        .map(|kind| {
            let mut achievement = kind.initial();
            let current = kind.metric(progress).min(achievement.max_progress);
            let earlier = previous.iter().find(|a| a.id == *kind);

            let was_unlocked = earlier.map(|a| a.unlocked).unwrap_or(false);
            achievement.unlocked = was_unlocked || current >= achievement.max_progress;
            achievement.progress = if was_unlocked {
                achievement.max_progress
            } else {
                current
            };
            achievement
        })
        .collect()
}

/// Kinds unlocked in `after` but not in `before`.
pub fn newly_unlocked(before: &[Achievement], after: &[Achievement]) -> Vec<AchievementKind> {
    after
        .iter()
        .filter(|a| a.unlocked)
        .filter(|a| !before.iter().any(|b| b.id == a.id && b.unlocked))
        .map(|a| a.id)
        .collect()
}
