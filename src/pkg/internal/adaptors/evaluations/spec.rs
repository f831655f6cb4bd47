use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::pkg::internal::rubric::CriterionVerdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "evaluation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStatus {
    Pending,
    Analyzing,
    Completed,
    Error,
}

impl EvaluationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationStatus::Pending => "pending",
            EvaluationStatus::Analyzing => "analyzing",
            EvaluationStatus::Completed => "completed",
            EvaluationStatus::Error => "error",
        }
    }

    /// Forward-only machine: pending → analyzing → {completed | error}.
    /// `completed` and `error` are terminal; the success path never skips
    /// `analyzing`.
    pub fn can_transition(self, next: EvaluationStatus) -> bool {
        use EvaluationStatus::*;
        matches!(
            (self, next),
            (Pending, Analyzing) | (Analyzing, Completed) | (Analyzing, Error) | (Pending, Error)
        )
    }
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EvaluationEntry {
    pub id: Uuid,
    pub owner_id: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub role_info: String,
    pub company_info: String,
    pub job_description: Option<String>,
    pub rubric_version: i32,
    pub status: EvaluationStatus,
    pub score: Option<i32>,
    pub feedback: Option<String>,
    pub criteria: Option<Json<BTreeMap<String, CriterionVerdict>>>,
    pub highlights: Option<String>,
    pub alerts: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::EvaluationStatus::*;

    #[test]
    fn the_success_path_is_legal() {
        assert!(Pending.can_transition(Analyzing));
        assert!(Analyzing.can_transition(Completed));
    }

    #[test]
    fn failures_reach_error_from_any_live_state() {
        assert!(Pending.can_transition(Error));
        assert!(Analyzing.can_transition(Error));
    }

    #[test]
    fn terminal_states_never_move() {
        for next in [Pending, Analyzing, Completed, Error] {
            assert!(!Completed.can_transition(next));
            assert!(!Error.can_transition(next));
        }
    }

    #[test]
    fn analyzing_is_never_skipped_on_the_success_path() {
        assert!(!Pending.can_transition(Completed));
        assert!(!Analyzing.can_transition(Pending));
    }
}
