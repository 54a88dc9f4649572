use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::deficiency::Deficiency;

/// Snapshot of one analyzed medical report.
///
/// The raw document itself lives with the ingestion layer; the engine keeps
/// only the source reference and the deficiencies found at analysis time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalReport {
    pub report_id: Uuid,
    pub user_id: String,
    pub source_file: String,
    pub upload_date: DateTime<Utc>,
    #[serde(default)]
    pub deficiencies: Vec<Deficiency>,
}

impl MedicalReport {
    pub fn new(user_id: impl Into<String>, source_file: impl Into<String>) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            user_id: user_id.into(),
            source_file: source_file.into(),
            upload_date: Utc::now(),
            deficiencies: Vec::new(),
        }
    }
}
