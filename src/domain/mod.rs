//! Domain policies shared by the repositories and the configuration layer.
//!
//! Both types are plain data that deserialize straight out of `config.toml`
//! and are handed to a [`Session`](crate::db::Session) by the store.

pub mod error;

pub use error::{BehaviorError, UserError};

use serde::{Deserialize, Serialize};
use std::fmt;

/// What happens to behavior records when a user they reference is deleted.
///
/// Replaces the implicit "leave dangling rows" behavior with an explicit choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Refuse to delete a user while any record names them as student or recorder.
    #[default]
    Restrict,
    /// Delete the referencing records together with the user, in one transaction.
    Cascade,
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Restrict => write!(f, "restrict"),
            Self::Cascade => write!(f, "cascade"),
        }
    }
}

/// Optional validation applied to behavior records before they are written.
///
/// Everything is off by default: types are free-form tags and the sign of
/// `points` is a caller convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorRules {
    /// Reject behavior types not listed in `allowed_types`.
    pub enforce_types: bool,

    /// Accepted behavior types (compared case-insensitively).
    pub allowed_types: Vec<String>,

    /// Require points >= 0 for "positive" and points <= 0 for "negative".
    pub enforce_point_sign: bool,
}

impl Default for BehaviorRules {
    fn default() -> Self {
        Self {
            enforce_types: false,
            allowed_types: vec!["positive".to_string(), "negative".to_string()],
            enforce_point_sign: false,
        }
    }
}

impl BehaviorRules {
    /// Checks a behavior type / points pair against the enabled rules.
    ///
    /// Returns a human-readable reason on rejection.
    pub fn check(&self, behavior_type: &str, points: i32) -> Result<(), String> {
        if self.enforce_types
            && !self
                .allowed_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(behavior_type))
        {
            return Err(format!(
                "behavior type '{behavior_type}' is not one of: {}",
                self.allowed_types.join(", ")
            ));
        }

        if self.enforce_point_sign {
            if behavior_type.eq_ignore_ascii_case("positive") && points < 0 {
                return Err(format!("positive behavior cannot carry {points} points"));
            }
            if behavior_type.eq_ignore_ascii_case("negative") && points > 0 {
                return Err(format!("negative behavior cannot carry +{points} points"));
            }
        }

        Ok(())
    }
}
