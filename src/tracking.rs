//! Plan mutation paths: activity completion and miss adjustment.
//!
//! Every mutating call is a transaction scoped to one plan: the tracker
//! holds the connection lock across load, in-memory edit, and save, so
//! concurrent calls against the same plan cannot interleave partial edits.
//! Marking an activity *not done* is the sole trigger for replanning;
//! marking it done never reschedules anything.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::db::{self, DatabaseError, Db};
use crate::models::RecoveryPlan;
use crate::rescheduler::{self, AdjustOutcome};

/// Result of a completion update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// An activity matched and its flag was persisted.
    pub updated: bool,
    /// The rescheduler ran (always, and only, for `completed == false`).
    pub adjustment: Option<AdjustOutcome>,
}

/// Serialized access to stored plans.
pub struct PlanTracker {
    db: Db,
}

impl PlanTracker {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn save_plan(&self, plan: &RecoveryPlan) -> Result<(), DatabaseError> {
        let conn = self.db.lock().expect("db lock poisoned");
        db::save_plan(&conn, plan)
    }

    pub fn get_plan(&self, plan_id: &str) -> Result<Option<RecoveryPlan>, DatabaseError> {
        let conn = self.db.lock().expect("db lock poisoned");
        db::get_plan(&conn, plan_id)
    }

    pub fn plans_for_user(&self, user_id: &str) -> Result<Vec<RecoveryPlan>, DatabaseError> {
        let conn = self.db.lock().expect("db lock poisoned");
        db::plans_for_user(&conn, user_id)
    }

    /// Record an activity outcome.
    ///
    /// Flips `completed` and persists when the activity exists (no-op, not
    /// an error, otherwise). A `false` outcome then invokes the adaptive
    /// rescheduler exactly once, inside the same per-plan transaction.
    pub fn set_completed(
        &self,
        plan_id: &str,
        date: NaiveDate,
        activity_id: Uuid,
        completed: bool,
    ) -> Result<CompletionOutcome, DatabaseError> {
        let conn = self.db.lock().expect("db lock poisoned");

        let Some(mut plan) = db::get_plan(&conn, plan_id)? else {
            tracing::debug!(plan_id, "Completion update for unknown plan ignored");
            return Ok(CompletionOutcome {
                updated: false,
                adjustment: (!completed).then_some(AdjustOutcome::NotFound),
            });
        };

        let mut updated = false;
        if let Some(activity) = plan
            .daily_activities
            .get_mut(&date)
            .and_then(|list| list.iter_mut().find(|a| a.id == activity_id))
        {
            activity.completed = completed;
            updated = true;
        }
        if updated {
            db::save_plan(&conn, &plan)?;
        }

        let adjustment = if completed {
            None
        } else {
            let outcome = rescheduler::adjust(&mut plan, date, activity_id);
            if mutated(outcome) {
                db::save_plan(&conn, &plan)?;
            }
            Some(outcome)
        };

        Ok(CompletionOutcome { updated, adjustment })
    }

    /// Apply the miss-adjustment policy directly and persist the result.
    /// No-op when the plan or activity does not exist.
    pub fn record_miss(
        &self,
        plan_id: &str,
        missed_date: NaiveDate,
        missed_activity_id: Uuid,
    ) -> Result<AdjustOutcome, DatabaseError> {
        let conn = self.db.lock().expect("db lock poisoned");

        let Some(mut plan) = db::get_plan(&conn, plan_id)? else {
            return Ok(AdjustOutcome::NotFound);
        };

        let outcome = rescheduler::adjust(&mut plan, missed_date, missed_activity_id);
        if mutated(outcome) {
            db::save_plan(&conn, &plan)?;
        }
        Ok(outcome)
    }
}

/// Did this outcome change the plan? Only changed plans are re-persisted.
fn mutated(outcome: AdjustOutcome) -> bool {
    !matches!(outcome, AdjustOutcome::NotFound | AdjustOutcome::Unchanged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_memory_database, shared};
    use crate::models::{ActivityType, DailyActivity, Intensity, RecoveryPlan, TimeOfDay};
    use chrono::Duration;
    use std::collections::BTreeMap;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn seeded_tracker(critical: bool) -> (PlanTracker, Uuid) {
        let start = date("2026-03-01");
        let end = date("2026-03-10");
        let target = DailyActivity::new(
            TimeOfDay::Morning,
            ActivityType::Exercise,
            "Swim",
            "45",
            Some(Intensity::Medium),
            critical,
        );
        let target_id = target.id;

        let mut daily_activities = BTreeMap::new();
        let mut d = start;
        while d <= end {
            daily_activities.insert(
                d,
                vec![DailyActivity::new(
                    TimeOfDay::Evening,
                    ActivityType::Rest,
                    "Wind down",
                    "",
                    None,
                    false,
                )],
            );
            d += Duration::days(1);
        }
        daily_activities.get_mut(&start).unwrap().push(target);

        let plan = RecoveryPlan {
            plan_id: "plan_u1_test".into(),
            user_id: "u1".into(),
            start_date: start,
            end_date: end,
            deficiencies: vec![],
            daily_activities,
        };

        let tracker = PlanTracker::new(shared(open_memory_database().unwrap()));
        tracker.save_plan(&plan).unwrap();
        (tracker, target_id)
    }

    #[test]
    fn marking_done_persists_and_never_reschedules() {
        let (tracker, id) = seeded_tracker(true);
        let outcome = tracker
            .set_completed("plan_u1_test", date("2026-03-01"), id, true)
            .unwrap();
        assert!(outcome.updated);
        assert_eq!(outcome.adjustment, None);

        let plan = tracker.get_plan("plan_u1_test").unwrap().unwrap();
        assert!(plan.find_activity(date("2026-03-01"), id).unwrap().completed);
        assert_eq!(plan.end_date, date("2026-03-10"));
        assert_eq!(plan.activities_on(date("2026-03-02")).len(), 1, "no redistribution");
    }

    #[test]
    fn marking_not_done_reschedules_exactly_once() {
        let (tracker, id) = seeded_tracker(true);
        let outcome = tracker
            .set_completed("plan_u1_test", date("2026-03-01"), id, false)
            .unwrap();
        assert!(outcome.updated);
        assert_eq!(outcome.adjustment, Some(AdjustOutcome::Redistributed { copies: 3 }));

        let plan = tracker.get_plan("plan_u1_test").unwrap().unwrap();
        assert!(!plan.find_activity(date("2026-03-01"), id).unwrap().completed);
        for day in ["2026-03-02", "2026-03-03", "2026-03-04"] {
            assert_eq!(plan.activities_on(date(day)).len(), 2, "{day} gains one copy");
        }
        assert_eq!(plan.activities_on(date("2026-03-05")).len(), 1);
    }

    #[test]
    fn non_critical_miss_is_deferred_and_persisted() {
        let (tracker, id) = seeded_tracker(false);
        let outcome = tracker
            .set_completed("plan_u1_test", date("2026-03-01"), id, false)
            .unwrap();
        assert_eq!(outcome.adjustment, Some(AdjustOutcome::Deferred));

        let plan = tracker.get_plan("plan_u1_test").unwrap().unwrap();
        let next = plan.activities_on(date("2026-03-02"));
        assert_eq!(next.len(), 2);
        assert_eq!(next.last().unwrap().id, id);
    }

    #[test]
    fn unknown_activity_is_a_noop() {
        let (tracker, _) = seeded_tracker(true);
        let before = tracker.get_plan("plan_u1_test").unwrap().unwrap();

        let outcome = tracker
            .set_completed("plan_u1_test", date("2026-03-01"), Uuid::new_v4(), false)
            .unwrap();
        assert!(!outcome.updated);
        assert_eq!(outcome.adjustment, Some(AdjustOutcome::NotFound));
        assert_eq!(tracker.get_plan("plan_u1_test").unwrap().unwrap(), before);
    }

    #[test]
    fn unknown_plan_is_a_noop() {
        let (tracker, id) = seeded_tracker(true);
        let outcome = tracker
            .set_completed("plan_missing", date("2026-03-01"), id, false)
            .unwrap();
        assert!(!outcome.updated);
        assert_eq!(outcome.adjustment, Some(AdjustOutcome::NotFound));
    }

    #[test]
    fn record_miss_persists_the_adjustment() {
        let (tracker, id) = seeded_tracker(true);
        let outcome = tracker
            .record_miss("plan_u1_test", date("2026-03-01"), id)
            .unwrap();
        assert_eq!(outcome, AdjustOutcome::Redistributed { copies: 3 });
        let plan = tracker.get_plan("plan_u1_test").unwrap().unwrap();
        assert_eq!(plan.activities_on(date("2026-03-02")).len(), 2);
    }

    #[test]
    fn record_miss_on_unknown_plan_is_a_noop() {
        let (tracker, id) = seeded_tracker(true);
        assert_eq!(
            tracker.record_miss("plan_missing", date("2026-03-01"), id).unwrap(),
            AdjustOutcome::NotFound
        );
    }

    #[test]
    fn unchanged_outcome_is_not_re_persisted() {
        // non-critical miss on the last plan day mutates nothing
        let (tracker, _) = seeded_tracker(false);
        let plan = tracker.get_plan("plan_u1_test").unwrap().unwrap();
        let last_id = plan.activities_on(date("2026-03-10"))[0].id;

        let outcome = tracker
            .record_miss("plan_u1_test", date("2026-03-10"), last_id)
            .unwrap();
        assert_eq!(outcome, AdjustOutcome::Unchanged);
        assert_eq!(tracker.get_plan("plan_u1_test").unwrap().unwrap(), plan);
    }

    #[test]
    fn plans_for_user_round_trips() {
        let (tracker, _) = seeded_tracker(true);
        assert_eq!(tracker.plans_for_user("u1").unwrap().len(), 1);
        assert!(tracker.plans_for_user("u2").unwrap().is_empty());
    }
}
