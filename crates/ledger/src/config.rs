//! Ledger configuration.

use crate::error::{LedgerError, Result};
use crate::rating::Rating;

/// Validation applied to grades on create and update.
///
/// Stored records are never re-validated when read, so tightening the
/// policy does not make existing ratings unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradePolicy {
    /// Grades must lie in `min..=max`.
    Range { min: i64, max: i64 },
    /// Any grade is accepted.
    Unbounded,
}

impl GradePolicy {
    pub const DEFAULT_MIN: i64 = 0;
    pub const DEFAULT_MAX: i64 = 10;

    /// Checks `grade` against the policy.
    pub fn check(&self, grade: i64) -> Result<()> {
        match *self {
            GradePolicy::Range { min, max } if grade < min || grade > max => {
                Err(LedgerError::InvalidGrade { grade, min, max })
            }
            _ => Ok(()),
        }
    }
}

impl Default for GradePolicy {
    fn default() -> Self {
        GradePolicy::Range {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}

/// Ledger configuration.
///
/// Reads from environment variables:
/// - `RATING_GRADE_MIN`: lowest accepted grade (default: `0`)
/// - `RATING_GRADE_MAX`: highest accepted grade (default: `10`)
///
/// A minimum above the maximum falls back to the default range.
/// - `RATING_GRADE_UNBOUNDED`: `true` disables grade validation
#[derive(Debug, Clone, Default)]
pub struct LedgerConfig {
    pub grade_policy: GradePolicy,
    /// Ratings written by `initialize` when their ids are absent.
    pub seed: Vec<Rating>,
}

impl LedgerConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let unbounded = lookup("RATING_GRADE_UNBOUNDED")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let grade_policy = if unbounded {
            GradePolicy::Unbounded
        } else {
            let min = lookup("RATING_GRADE_MIN")
                .and_then(|v| v.parse().ok())
                .unwrap_or(GradePolicy::DEFAULT_MIN);
            let max = lookup("RATING_GRADE_MAX")
                .and_then(|v| v.parse().ok())
                .unwrap_or(GradePolicy::DEFAULT_MAX);

            if min > max {
                tracing::warn!(min, max, "inverted grade range, using defaults");
                GradePolicy::default()
            } else {
                GradePolicy::Range { min, max }
            }
        };

        Self {
            grade_policy,
            seed: Vec::new(),
        }
    }

    pub fn with_grade_policy(mut self, grade_policy: GradePolicy) -> Self {
        self.grade_policy = grade_policy;
        self
    }

    pub fn with_seed(mut self, seed: Vec<Rating>) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = LedgerConfig::default();
        assert_eq!(
            config.grade_policy,
            GradePolicy::Range { min: 0, max: 10 }
        );
        assert!(config.seed.is_empty());
    }

    #[test]
    fn test_range_from_env() {
        let config = LedgerConfig::from_lookup(lookup_from(&[
            ("RATING_GRADE_MIN", "1"),
            ("RATING_GRADE_MAX", "5"),
        ]));
        assert_eq!(config.grade_policy, GradePolicy::Range { min: 1, max: 5 });
    }

    #[test]
    fn test_unparseable_bounds_fall_back() {
        let config = LedgerConfig::from_lookup(lookup_from(&[("RATING_GRADE_MAX", "ten")]));
        assert_eq!(
            config.grade_policy,
            GradePolicy::Range { min: 0, max: 10 }
        );
    }

    #[test]
    fn test_inverted_bounds_fall_back() {
        let config = LedgerConfig::from_lookup(lookup_from(&[
            ("RATING_GRADE_MIN", "5"),
            ("RATING_GRADE_MAX", "1"),
        ]));
        assert_eq!(config.grade_policy, GradePolicy::default());
        assert!(config.grade_policy.check(3).is_ok());

        // Only one bound set, and it lies beyond the other default.
        let config = LedgerConfig::from_lookup(lookup_from(&[("RATING_GRADE_MIN", "20")]));
        assert_eq!(config.grade_policy, GradePolicy::default());
    }

    #[test]
    fn test_single_point_range_is_kept() {
        let config = LedgerConfig::from_lookup(lookup_from(&[
            ("RATING_GRADE_MIN", "3"),
            ("RATING_GRADE_MAX", "3"),
        ]));
        assert_eq!(config.grade_policy, GradePolicy::Range { min: 3, max: 3 });
    }

    #[test]
    fn test_unbounded_from_env() {
        let config = LedgerConfig::from_lookup(lookup_from(&[("RATING_GRADE_UNBOUNDED", "TRUE")]));
        assert_eq!(config.grade_policy, GradePolicy::Unbounded);
    }

    #[test]
    fn test_policy_check() {
        let policy = GradePolicy::Range { min: 1, max: 5 };
        assert!(policy.check(1).is_ok());
        assert!(policy.check(5).is_ok());
        assert!(matches!(
            policy.check(0),
            Err(LedgerError::InvalidGrade {
                grade: 0,
                min: 1,
                max: 5
            })
        ));
        assert!(policy.check(6).is_err());
        assert!(GradePolicy::Unbounded.check(i64::MIN).is_ok());
    }
}
