use serde::{Deserialize, Serialize};

use super::enums::Severity;

/// One detected out-of-range health measurement.
///
/// Immutable once created; identity is by value, not by a generated id.
/// Plans and report snapshots own their own copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deficiency {
    pub name: String,
    pub current_value: String,
    pub normal_range: String,
    pub severity: Severity,
    /// Measurement at or just outside the edge of the reference range.
    pub is_border_value: bool,
}

impl Deficiency {
    pub fn new(
        name: impl Into<String>,
        current_value: impl Into<String>,
        normal_range: impl Into<String>,
        severity: Severity,
        is_border_value: bool,
    ) -> Self {
        Self {
            name: name.into(),
            current_value: current_value.into(),
            normal_range: normal_range.into(),
            severity,
            is_border_value,
        }
    }
}
