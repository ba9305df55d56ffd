use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::models::DailyProgress;

/// Aggregates over a range of days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeriodStats {
    pub total_intake: u64,
    /// Mean over days that have a record, in ml
    pub average_intake: f64,
    pub goal_reached_days: u32,
    pub best_day: u32,
    pub days_recorded: u32,
}

impl PeriodStats {
    /// Summarizes per-day records. Records without a date are ignored.
    pub fn from_records(records: &[DailyProgress], daily_goal: Option<u32>) -> Self {
        let mut stats = PeriodStats::default();

        for record in records.iter().filter(|r| r.date.is_some()) {
            stats.days_recorded += 1;
            stats.total_intake += u64::from(record.current_intake);
            stats.best_day = stats.best_day.max(record.current_intake);

            let reached = match daily_goal.filter(|g| *g > 0) {
                Some(goal) => record.current_intake >= goal,
                None => record.last_goal_reached.is_some() && record.last_goal_reached == record.date,
            };
            if reached {
                stats.goal_reached_days += 1;
            }
        }

        if stats.days_recorded > 0 {
            stats.average_intake = stats.total_intake as f64 / f64::from(stats.days_recorded);
        }
        stats
    }

    /// Total intake as a fraction of the goal over `days`, capped at 1.
    pub fn goal_fraction(&self, daily_goal: u32, days: u32) -> f64 {
        let target = u64::from(daily_goal) * u64::from(days);
        if target == 0 {
            return 0.0;
        }
        (self.total_intake as f64 / target as f64).min(1.0)
    }
}

/// The seven days ending on `today`, inclusive.
pub fn week_ending(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today.checked_sub_days(Days::new(6)).unwrap_or(today);
    (start, today)
}

/// First and last day of the calendar month containing `day`.
pub fn month_containing(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = day.with_day(1).unwrap_or(day);
    let end = start
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(day);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(day: &str, intake: u32) -> DailyProgress {
        DailyProgress {
            date: Some(date(day)),
            current_intake: intake,
            ..Default::default()
        }
    }

    #[test]
    fn test_week_summary() {
        let records = vec![
            record("2024-02-01", 2000),
            record("2024-02-02", 2600),
            record("2024-02-03", 1400),
            record("2024-02-04", 3100),
        ];
        let stats = PeriodStats::from_records(&records, Some(2500));

        assert_eq!(stats.total_intake, 9100);
        assert_eq!(stats.days_recorded, 4);
        assert_eq!(stats.average_intake, 2275.0);
        assert_eq!(stats.goal_reached_days, 2);
        assert_eq!(stats.best_day, 3100);
        assert!((stats.goal_fraction(2500, 7) - 9100.0 / 17500.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_range() {
        let stats = PeriodStats::from_records(&[], Some(2500));
        assert_eq!(stats, PeriodStats::default());
        assert_eq!(stats.goal_fraction(0, 7), 0.0);
    }

    #[test]
    fn test_goal_days_without_goal_use_record_flag() {
        let mut hit = record("2024-02-01", 1800);
        hit.last_goal_reached = hit.date;
        let mut stale = record("2024-02-02", 900);
        stale.last_goal_reached = Some(date("2024-02-01"));

        let stats = PeriodStats::from_records(&[hit, stale], None);
        assert_eq!(stats.goal_reached_days, 1);
    }

    #[test]
    fn test_zero_goal_falls_back_to_record_flag() {
        let mut hit = record("2024-02-01", 1800);
        hit.last_goal_reached = hit.date;
        let miss = record("2024-02-02", 300);

        let stats = PeriodStats::from_records(&[hit, miss], Some(0));
        assert_eq!(stats.goal_reached_days, 1);
    }

    #[test]
    fn test_ranges() {
        assert_eq!(
            week_ending(date("2024-03-03")),
            (date("2024-02-26"), date("2024-03-03"))
        );
        assert_eq!(
            month_containing(date("2024-02-14")),
            (date("2024-02-01"), date("2024-02-29"))
        );
        assert_eq!(
            month_containing(date("2023-12-31")),
            (date("2023-12-01"), date("2023-12-31"))
        );
    }
}
