//! Recovery-duration estimation from detected deficiencies.
//!
//! Pure and deterministic: per-deficiency day ranges accumulate by severity,
//! with a correction when several deficiencies are present (overlapping
//! treatments shorten the floor, interacting treatments lengthen the
//! ceiling).

use serde::Serialize;

use crate::models::{Deficiency, Severity};

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Day range contributed by one low-severity deficiency.
const LOW_DAYS: (u32, u32) = (7, 14);

/// Day range contributed by one medium-severity deficiency.
const MEDIUM_DAYS: (u32, u32) = (14, 30);

/// Day range contributed by one high-severity deficiency.
const HIGH_DAYS: (u32, u32) = (30, 60);

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Estimated recovery-duration range in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecoveryEstimate {
    pub min_days: u32,
    pub max_days: u32,
}

// ═══════════════════════════════════════════════════════════
// Estimation
// ═══════════════════════════════════════════════════════════

/// Estimate the recovery-duration range for a set of deficiencies.
///
/// Sums per-severity ranges (low 7..14, medium 14..30, high 30..60), then for
/// more than one deficiency applies `min * 0.9` and `max * 1.1`, both floored.
/// An empty list yields `(0, 0)`. Order of the input never changes the result.
pub fn estimate_recovery(deficiencies: &[Deficiency]) -> RecoveryEstimate {
    let mut min_days: u32 = 0;
    let mut max_days: u32 = 0;

    for deficiency in deficiencies {
        let (min, max) = match deficiency.severity {
            Severity::Low => LOW_DAYS,
            Severity::Medium => MEDIUM_DAYS,
            Severity::High => HIGH_DAYS,
        };
        min_days += min;
        max_days += max;
    }

    if deficiencies.len() > 1 {
        // integer floor of *0.9 and *1.1
        min_days = min_days * 9 / 10;
        max_days = max_days * 11 / 10;
    }

    RecoveryEstimate { min_days, max_days }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn deficiency(severity: Severity) -> Deficiency {
        Deficiency::new("Vitamin D", "15 ng/mL", "30-100 ng/mL", severity, false)
    }

    #[test]
    fn no_deficiencies_is_zero() {
        let est = estimate_recovery(&[]);
        assert_eq!(est, RecoveryEstimate { min_days: 0, max_days: 0 });
    }

    #[test]
    fn single_low_is_uncorrected() {
        let est = estimate_recovery(&[deficiency(Severity::Low)]);
        assert_eq!(est.min_days, 7);
        assert_eq!(est.max_days, 14);
    }

    #[test]
    fn single_medium_is_uncorrected() {
        let est = estimate_recovery(&[deficiency(Severity::Medium)]);
        assert_eq!(est.min_days, 14);
        assert_eq!(est.max_days, 30);
    }

    #[test]
    fn single_high_is_uncorrected() {
        let est = estimate_recovery(&[deficiency(Severity::High)]);
        assert_eq!(est.min_days, 30);
        assert_eq!(est.max_days, 60);
    }

    #[test]
    fn two_lows_apply_correction() {
        // pre-adjustment (14, 28); floor(14*0.9)=12, floor(28*1.1)=30
        let est = estimate_recovery(&[deficiency(Severity::Low), deficiency(Severity::Low)]);
        assert_eq!(est.min_days, 12);
        assert_eq!(est.max_days, 30);
    }

    #[test]
    fn mixed_severities_apply_correction() {
        // low + high = (37, 74); floor(37*0.9)=33, floor(74*1.1)=81
        let est = estimate_recovery(&[deficiency(Severity::Low), deficiency(Severity::High)]);
        assert_eq!(est.min_days, 33);
        assert_eq!(est.max_days, 81);
    }

    #[test]
    fn estimate_is_order_invariant() {
        let a = deficiency(Severity::Low);
        let b = deficiency(Severity::Medium);
        let c = deficiency(Severity::High);
        let forward = estimate_recovery(&[a.clone(), b.clone(), c.clone()]);
        let backward = estimate_recovery(&[c, b, a]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn estimate_serializes() {
        let est = estimate_recovery(&[deficiency(Severity::Medium)]);
        let json = serde_json::to_string(&est).unwrap();
        assert!(json.contains("\"min_days\":14"));
        assert!(json.contains("\"max_days\":30"));
    }
}
