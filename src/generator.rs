//! Recovery plan generation.
//!
//! Combines the deficiency list and a caller-chosen day count with
//! LLM-generated daily content. The LLM path is best-effort: its output is
//! decoded into an explicit schema with a fixed default per missing field,
//! and any absent/undecodable block switches to a deterministic fallback
//! calendar so a plan is never empty. The engine stays usable with zero
//! network dependencies.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;

use crate::llm::{extract_json_block, LlmClient};
use crate::models::{
    ActivityType, DailyActivity, Deficiency, Intensity, RecoveryPlan, TimeOfDay,
};

// ═══════════════════════════════════════════
// Wire schema (defaults per the content contract)
// ═══════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct CalendarResponse {
    #[serde(default)]
    daily_plans: Vec<RawDayPlan>,
}

#[derive(Debug, Deserialize)]
struct RawDayPlan {
    #[serde(default)]
    activities: Vec<RawActivity>,
}

#[derive(Debug, Deserialize)]
struct RawActivity {
    #[serde(default = "default_time")]
    time: String,
    #[serde(rename = "type", default = "default_type")]
    activity_type: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    duration: String,
    #[serde(default = "default_intensity")]
    intensity: String,
    #[serde(default)]
    is_critical: bool,
}

fn default_time() -> String {
    "morning".to_string()
}

fn default_type() -> String {
    "exercise".to_string()
}

fn default_intensity() -> String {
    "medium".to_string()
}

impl RawActivity {
    fn into_activity(self) -> DailyActivity {
        // unknown enum strings take the same defaults as absent fields
        let intensity = match self.intensity.as_str() {
            "" => None,
            s => Some(Intensity::from_str(s).unwrap_or(Intensity::Medium)),
        };
        DailyActivity::new(
            TimeOfDay::from_str(&self.time).unwrap_or(TimeOfDay::Morning),
            ActivityType::from_str(&self.activity_type).unwrap_or(ActivityType::Exercise),
            self.description,
            self.duration,
            intensity,
            self.is_critical,
        )
    }
}

// ═══════════════════════════════════════════
// Generator
// ═══════════════════════════════════════════

/// Builds recovery plans from deficiencies and a requested duration.
pub struct PlanGenerator<C: LlmClient> {
    client: C,
}

impl<C: LlmClient> PlanGenerator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Generate a plan of `days` days (`days >= 1`) starting at `now`.
    ///
    /// The window `[start_date, end_date]` is fixed here; only the
    /// rescheduler may grow it later. The plan id carries the generation
    /// timestamp plus a random suffix so concurrent generations for the
    /// same user cannot collide.
    pub fn generate(
        &self,
        deficiencies: &[Deficiency],
        days: u32,
        user_id: &str,
        now: NaiveDate,
    ) -> RecoveryPlan {
        let days = days.max(1);
        let plan_id = new_plan_id(user_id);
        let start_date = now;
        let end_date = now + Duration::days(i64::from(days) - 1);

        let prompt = build_calendar_prompt(deficiencies, days);
        let daily_activities = match self.client.generate(&prompt) {
            Ok(response) => match parse_calendar_response(&response, start_date, end_date) {
                Some(calendar) => calendar,
                None => {
                    tracing::warn!(plan_id, "Calendar response unusable, using fallback plan");
                    fallback_calendar(start_date, end_date)
                }
            },
            Err(e) => {
                tracing::warn!(plan_id, error = %e, "Calendar generation failed, using fallback plan");
                fallback_calendar(start_date, end_date)
            }
        };

        RecoveryPlan {
            plan_id,
            user_id: user_id.to_string(),
            start_date,
            end_date,
            deficiencies: deficiencies.to_vec(),
            daily_activities,
        }
    }
}

fn new_plan_id(user_id: &str) -> String {
    format!(
        "plan_{}_{}_{:04x}",
        user_id,
        Utc::now().format("%Y%m%d%H%M%S"),
        rand::random::<u16>()
    )
}

fn build_calendar_prompt(deficiencies: &[Deficiency], days: u32) -> String {
    let deficiency_list = deficiencies
        .iter()
        .map(|d| {
            format!(
                "- {}: Current {}, Normal range {}, Severity: {}",
                d.name,
                d.current_value,
                d.normal_range,
                d.severity.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Create a detailed recovery plan calendar for {days} days to address the following deficiencies:\n\
         {deficiency_list}\n\n\
         The plan should include:\n\
         1. Daily exercises tailored to the deficiencies\n\
         2. A diet plan with specific meals and supplements\n\
         3. Medication schedule if needed\n\
         4. Rest periods and sleep recommendations\n\n\
         For each day, provide morning, afternoon, and evening activities with\n\
         duration in minutes and intensity where applicable.\n\n\
         Format the output as JSON with the following structure:\n\
         {{\n\
             \"daily_plans\": [\n\
                 {{\n\
                     \"day\": 1,\n\
                     \"activities\": [\n\
                         {{\n\
                             \"time\": \"morning/afternoon/evening\",\n\
                             \"type\": \"exercise/diet/medication/rest\",\n\
                             \"description\": \"Detailed description\",\n\
                             \"duration\": \"Duration in minutes if applicable\",\n\
                             \"intensity\": \"low/medium/high if applicable\",\n\
                             \"is_critical\": true\n\
                         }}\n\
                     ]\n\
                 }}\n\
             ]\n\
         }}"
    )
}

/// Decode the day-indexed activity list, assigning consecutive dates from
/// `start_date` and discarding anything past `end_date`. Returns `None` only
/// when no JSON block is found or it fails to decode; a valid block with
/// fewer days than the window is a valid sparse calendar.
fn parse_calendar_response(
    response: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Option<BTreeMap<NaiveDate, Vec<DailyActivity>>> {
    let block = extract_json_block(response).ok()?;
    let parsed: CalendarResponse = serde_json::from_str(block).ok()?;

    let mut daily_activities = BTreeMap::new();
    let mut current_date = start_date;
    for day_plan in parsed.daily_plans {
        let activities = day_plan
            .activities
            .into_iter()
            .map(RawActivity::into_activity)
            .collect();
        daily_activities.insert(current_date, activities);
        current_date += Duration::days(1);
        if current_date > end_date {
            break;
        }
    }

    Some(daily_activities)
}

/// Deterministic offline plan: one fixed pair of critical morning
/// activities for every date in the window.
fn fallback_calendar(
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> BTreeMap<NaiveDate, Vec<DailyActivity>> {
    let mut daily_activities = BTreeMap::new();
    let mut current_date = start_date;
    while current_date <= end_date {
        daily_activities.insert(
            current_date,
            vec![
                DailyActivity::new(
                    TimeOfDay::Morning,
                    ActivityType::Exercise,
                    "30 minute walk",
                    "30",
                    Some(Intensity::Low),
                    true,
                ),
                DailyActivity::new(
                    TimeOfDay::Morning,
                    ActivityType::Diet,
                    "Balanced breakfast with proteins and vitamins",
                    "",
                    None,
                    true,
                ),
            ],
        );
        current_date += Duration::days(1);
    }
    daily_activities
}
