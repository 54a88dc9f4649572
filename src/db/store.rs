//! Key-value persistence over the JSON-blob tables.
//!
//! Entities are stored whole as serialized JSON, keyed by id, with a
//! `user_id` column as the by-owner secondary index. Saves are upserts:
//! the engine persists the full plan after every mutation.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::DatabaseError;
use crate::models::{MedicalReport, RecoveryPlan, User};

// ═══════════════════════════════════════════
// Users
// ═══════════════════════════════════════════

pub fn put_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR REPLACE INTO users (id, email, body) VALUES (?1, ?2, ?3)",
        params![user.id, user.email, serde_json::to_string(user)?],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &str) -> Result<Option<User>, DatabaseError> {
    let body: Option<String> = conn
        .query_row("SELECT body FROM users WHERE id = ?1", params![id], |row| {
            row.get(0)
        })
        .optional()?;
    body.map(|b| serde_json::from_str(&b).map_err(DatabaseError::from))
        .transpose()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM users WHERE email = ?1 LIMIT 1",
            params![email],
            |row| row.get(0),
        )
        .optional()?;
    body.map(|b| serde_json::from_str(&b).map_err(DatabaseError::from))
        .transpose()
}

// ═══════════════════════════════════════════
// Medical reports
// ═══════════════════════════════════════════

pub fn save_report(conn: &Connection, report: &MedicalReport) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR REPLACE INTO medical_reports (id, user_id, body) VALUES (?1, ?2, ?3)",
        params![
            report.report_id.to_string(),
            report.user_id,
            serde_json::to_string(report)?,
        ],
    )?;
    Ok(())
}

pub fn get_report(conn: &Connection, id: &Uuid) -> Result<Option<MedicalReport>, DatabaseError> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM medical_reports WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    body.map(|b| serde_json::from_str(&b).map_err(DatabaseError::from))
        .transpose()
}

pub fn reports_for_user(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<MedicalReport>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT body FROM medical_reports WHERE user_id = ?1 ORDER BY id")?;
    let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;

    let mut reports = Vec::new();
    for body in rows {
        reports.push(serde_json::from_str(&body?)?);
    }
    Ok(reports)
}

// ═══════════════════════════════════════════
// Recovery plans
// ═══════════════════════════════════════════

pub fn save_plan(conn: &Connection, plan: &RecoveryPlan) -> Result<(), DatabaseError> {
    debug_assert!(plan.calendar_in_window(), "calendar key outside plan window");
    conn.execute(
        "INSERT OR REPLACE INTO recovery_plans (id, user_id, body) VALUES (?1, ?2, ?3)",
        params![plan.plan_id, plan.user_id, serde_json::to_string(plan)?],
    )?;
    Ok(())
}

pub fn get_plan(conn: &Connection, plan_id: &str) -> Result<Option<RecoveryPlan>, DatabaseError> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM recovery_plans WHERE id = ?1",
            params![plan_id],
            |row| row.get(0),
        )
        .optional()?;
    body.map(|b| serde_json::from_str(&b).map_err(DatabaseError::from))
        .transpose()
}

pub fn plans_for_user(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<RecoveryPlan>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT body FROM recovery_plans WHERE user_id = ?1 ORDER BY id")?;
    let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;

    let mut plans = Vec::new();
    for body in rows {
        plans.push(serde_json::from_str(&body?)?);
    }
    Ok(plans)
}

// ═══════════════════════════════════════════
// Notification delivery log (append-only)
// ═══════════════════════════════════════════

/// One delivered reminder, as recorded after firing.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryLogEntry {
    pub plan_id: String,
    pub date: NaiveDate,
    pub activity_id: Uuid,
    pub fired_at: DateTime<Utc>,
}

pub fn append_delivery_log(
    conn: &Connection,
    plan_id: &str,
    date: NaiveDate,
    activity_id: &Uuid,
    fired_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO notification_log (plan_id, date, activity_id, fired_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            plan_id,
            date.to_string(),
            activity_id.to_string(),
            fired_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn delivery_log_for_plan(
    conn: &Connection,
    plan_id: &str,
) -> Result<Vec<DeliveryLogEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT plan_id, date, activity_id, fired_at
         FROM notification_log WHERE plan_id = ?1 ORDER BY seq",
    )?;
    let rows = stmt.query_map(params![plan_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (plan_id, date, activity_id, fired_at) = row?;
        entries.push(DeliveryLogEntry {
            plan_id,
            date: date.parse().map_err(|_| DatabaseError::InvalidEnum {
                field: "notification_log.date".into(),
                value: date.clone(),
            })?,
            activity_id: activity_id.parse().map_err(|_| DatabaseError::InvalidEnum {
                field: "notification_log.activity_id".into(),
                value: activity_id.clone(),
            })?,
            fired_at: DateTime::parse_from_rfc3339(&fired_at)
                .map_err(|_| DatabaseError::InvalidEnum {
                    field: "notification_log.fired_at".into(),
                    value: fired_at.clone(),
                })?
                .with_timezone(&Utc),
        });
    }
    Ok(entries)
}
