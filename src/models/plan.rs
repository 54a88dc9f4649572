use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::deficiency::Deficiency;
use super::enums::{ActivityType, Intensity, TimeOfDay};

/// One schedulable action on one day of a recovery plan.
///
/// `completed` is the only mutable field and is flipped exclusively through
/// the owning plan's update path (`tracking::PlanTracker::set_completed`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub id: Uuid,
    pub time_of_day: TimeOfDay,
    pub activity_type: ActivityType,
    pub description: String,
    /// Minutes as a string when numeric; "" means no duration.
    #[serde(default)]
    pub duration: String,
    /// None for activities where intensity does not apply (meals, rest).
    #[serde(default)]
    pub intensity: Option<Intensity>,
    /// Missing this activity materially impacts recovery outcome.
    #[serde(default)]
    pub is_critical: bool,
    #[serde(default)]
    pub completed: bool,
}

impl DailyActivity {
    pub fn new(
        time_of_day: TimeOfDay,
        activity_type: ActivityType,
        description: impl Into<String>,
        duration: impl Into<String>,
        intensity: Option<Intensity>,
        is_critical: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            time_of_day,
            activity_type,
            description: description.into(),
            duration: duration.into(),
            intensity,
            is_critical,
            completed: false,
        }
    }

    /// Copy with a fresh id. Used when a missed activity is redistributed:
    /// the copies are new schedule entries, not the same activity twice.
    /// (`Clone` keeps the id and is used to carry the original forward.)
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    /// Duration in minutes, when the duration string is non-empty and numeric.
    pub fn duration_minutes(&self) -> Option<i64> {
        if self.duration.is_empty() {
            return None;
        }
        self.duration.trim().parse().ok()
    }
}

/// A dated activity calendar addressing a set of deficiencies, owned by one
/// user.
///
/// Invariants:
/// - `start_date <= end_date` (both inclusive).
/// - Every calendar key lies within `[start_date, end_date]`. The rescheduler
///   is the only component that may grow `end_date`, and it must do so before
///   inserting on the new trailing date.
/// - A date with no entry has no activities; absence is never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryPlan {
    pub plan_id: String,
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub deficiencies: Vec<Deficiency>,
    pub daily_activities: BTreeMap<NaiveDate, Vec<DailyActivity>>,
}

impl RecoveryPlan {
    /// Activities scheduled on `date`. A date without an entry yields an
    /// empty slice.
    pub fn activities_on(&self, date: NaiveDate) -> &[DailyActivity] {
        self.daily_activities
            .get(&date)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Does `date` fall inside the plan window?
    pub fn in_window(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Number of days in the plan window (inclusive of both ends).
    pub fn window_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Find an activity by id on the given date.
    pub fn find_activity(&self, date: NaiveDate, activity_id: Uuid) -> Option<&DailyActivity> {
        self.activities_on(date).iter().find(|a| a.id == activity_id)
    }

    /// Debug check that every calendar key lies inside the window.
    pub fn calendar_in_window(&self) -> bool {
        self.daily_activities.keys().all(|d| self.in_window(*d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn walk() -> DailyActivity {
        DailyActivity::new(
            TimeOfDay::Morning,
            ActivityType::Exercise,
            "30 minute walk",
            "30",
            Some(Intensity::Low),
            true,
        )
    }

    fn sample_plan() -> RecoveryPlan {
        let start = date("2026-03-01");
        let mut daily_activities = BTreeMap::new();
        daily_activities.insert(start, vec![walk()]);
        // interior date with an explicitly empty entry
        daily_activities.insert(date("2026-03-02"), vec![]);
        RecoveryPlan {
            plan_id: "plan_u1_20260301080000_a1b2".into(),
            user_id: "u1".into(),
            start_date: start,
            end_date: date("2026-03-05"),
            deficiencies: vec![],
            daily_activities,
        }
    }

    #[test]
    fn duplicate_assigns_fresh_id() {
        let original = walk();
        let copy = original.duplicate();
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.description, original.description);
        assert_eq!(copy.is_critical, original.is_critical);
    }

    #[test]
    fn clone_keeps_id() {
        let original = walk();
        let clone = original.clone();
        assert_eq!(clone.id, original.id);
    }

    #[test]
    fn duration_minutes_parses_numeric() {
        let mut a = walk();
        assert_eq!(a.duration_minutes(), Some(30));
        a.duration = "".into();
        assert_eq!(a.duration_minutes(), None);
        a.duration = "about an hour".into();
        assert_eq!(a.duration_minutes(), None);
    }

    #[test]
    fn absent_date_has_no_activities() {
        let plan = sample_plan();
        assert!(plan.activities_on(date("2026-03-04")).is_empty());
        assert!(plan.activities_on(date("2026-03-02")).is_empty());
        assert_eq!(plan.activities_on(date("2026-03-01")).len(), 1);
    }

    #[test]
    fn window_checks() {
        let plan = sample_plan();
        assert!(plan.in_window(date("2026-03-01")));
        assert!(plan.in_window(date("2026-03-05")));
        assert!(!plan.in_window(date("2026-03-06")));
        assert_eq!(plan.window_days(), 5);
        assert!(plan.calendar_in_window());
    }

    #[test]
    fn find_activity_by_id() {
        let plan = sample_plan();
        let id = plan.activities_on(date("2026-03-01"))[0].id;
        assert!(plan.find_activity(date("2026-03-01"), id).is_some());
        assert!(plan.find_activity(date("2026-03-02"), id).is_none());
        assert!(plan.find_activity(date("2026-03-01"), Uuid::new_v4()).is_none());
    }

    #[test]
    fn plan_serde_round_trip_preserves_structure() {
        let plan = sample_plan();
        let json = serde_json::to_string(&plan).unwrap();
        // calendar keys serialize as ISO-8601 date strings
        assert!(json.contains("\"2026-03-01\""));
        assert!(json.contains("\"2026-03-02\":[]"));
        let back: RecoveryPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}
