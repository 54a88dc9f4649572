use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Severity {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(TimeOfDay {
    Morning => "morning",
    Afternoon => "afternoon",
    Evening => "evening",
});

str_enum!(ActivityType {
    Exercise => "exercise",
    Diet => "diet",
    Medication => "medication",
    Rest => "rest",
});

str_enum!(Intensity {
    Low => "low",
    Medium => "medium",
    High => "high",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn severity_round_trip() {
        for (variant, s) in [
            (Severity::Low, "low"),
            (Severity::Medium, "medium"),
            (Severity::High, "high"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Severity::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn time_of_day_round_trip() {
        for (variant, s) in [
            (TimeOfDay::Morning, "morning"),
            (TimeOfDay::Afternoon, "afternoon"),
            (TimeOfDay::Evening, "evening"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(TimeOfDay::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn activity_type_round_trip() {
        for (variant, s) in [
            (ActivityType::Exercise, "exercise"),
            (ActivityType::Diet, "diet"),
            (ActivityType::Medication, "medication"),
            (ActivityType::Rest, "rest"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ActivityType::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn serde_uses_lowercase_strings() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");
        assert_eq!(
            serde_json::to_string(&TimeOfDay::Afternoon).unwrap(),
            "\"afternoon\""
        );
        assert_eq!(
            serde_json::from_str::<ActivityType>("\"rest\"").unwrap(),
            ActivityType::Rest
        );
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(Severity::from_str("critical").is_err());
        assert!(TimeOfDay::from_str("night").is_err());
        assert!(ActivityType::from_str("").is_err());
    }
}
