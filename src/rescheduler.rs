//! Adaptive rescheduling: the miss-adjustment state machine.
//!
//! A reported miss moves an activity from PENDING into one of three
//! terminal placements, branching on criticality and on how much of the
//! plan window remains:
//!
//! - critical, more than 3 days left: redistribute copies (with a third of
//!   the duration each) onto the next 3 days, but only onto days that
//!   already have an activity list. Days without one are skipped and that
//!   copy is dropped; this is the reference policy, preserved as-is.
//! - critical, 3 days or fewer left: extend the window by one day and place
//!   the original activity alone on the new trailing date.
//! - non-critical: defer the original to the next day when it is still
//!   inside the window, otherwise change nothing.
//!
//! The missed activity always stays on its original date, uncompleted; the
//! engine never rewrites the past. Mutations here are in-memory only; the
//! caller owns the single persisted write per adjustment (`tracking`).

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::models::RecoveryPlan;

/// Days a redistributed critical miss is spread over.
const REDISTRIBUTION_SPAN: i64 = 3;

/// What an adjustment did to the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustOutcome {
    /// No activity with that id on that date; the plan is untouched.
    NotFound,
    /// Critical miss spread over upcoming days; `copies` were placed
    /// (possibly fewer than the span when target days were bare).
    Redistributed { copies: usize },
    /// Critical miss near the end: window grew one day, activity moved there.
    Extended,
    /// Non-critical miss pushed onto the next day.
    Deferred,
    /// Non-critical miss on the last day; nothing to do.
    Unchanged,
}

/// Apply the miss-adjustment policy for one missed activity.
pub fn adjust(
    plan: &mut RecoveryPlan,
    missed_date: NaiveDate,
    missed_activity_id: Uuid,
) -> AdjustOutcome {
    let Some(missed) = plan.find_activity(missed_date, missed_activity_id).cloned() else {
        return AdjustOutcome::NotFound;
    };

    let outcome = if missed.is_critical {
        adjust_critical(plan, missed_date, &missed)
    } else {
        adjust_non_critical(plan, missed_date, &missed)
    };

    tracing::debug!(
        plan_id = %plan.plan_id,
        %missed_date,
        activity_id = %missed_activity_id,
        ?outcome,
        "Adjusted schedule after miss"
    );
    debug_assert!(plan.calendar_in_window());
    outcome
}

fn adjust_critical(
    plan: &mut RecoveryPlan,
    missed_date: NaiveDate,
    missed: &crate::models::DailyActivity,
) -> AdjustOutcome {
    let remaining_days = (plan.end_date - missed_date).num_days();

    if remaining_days > REDISTRIBUTION_SPAN {
        // Spread over the next 3 days. Only days that already hold a list
        // receive a copy; bare days are skipped (reference quirk).
        let mut copies = 0;
        for offset in 1..=REDISTRIBUTION_SPAN {
            let target = missed_date + Duration::days(offset);
            if let Some(activities) = plan.daily_activities.get_mut(&target) {
                let mut copy = missed.duplicate();
                copy.duration = missed
                    .duration_minutes()
                    .map(|minutes| (minutes / 3).to_string())
                    .unwrap_or_default();
                activities.push(copy);
                copies += 1;
            }
        }
        AdjustOutcome::Redistributed { copies }
    } else {
        // Grow the window first, then place the original activity as the
        // sole entry of the new trailing date.
        plan.end_date += Duration::days(1);
        plan.daily_activities.insert(plan.end_date, vec![missed.clone()]);
        AdjustOutcome::Extended
    }
}

fn adjust_non_critical(
    plan: &mut RecoveryPlan,
    missed_date: NaiveDate,
    missed: &crate::models::DailyActivity,
) -> AdjustOutcome {
    let next_date = missed_date + Duration::days(1);
    if next_date > plan.end_date {
        return AdjustOutcome::Unchanged;
    }

    plan.daily_activities
        .entry(next_date)
        .or_default()
        .push(missed.clone());
    AdjustOutcome::Deferred
}
