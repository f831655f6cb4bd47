use std::collections::BTreeMap;

use sqlx::types::Json;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::pkg::internal::adaptors::evaluations::spec::EvaluationEntry;
use crate::pkg::internal::rubric::CriterionVerdict;
use crate::prelude::{Result, StandardError};

const RETURNING: &str = "id, owner_id, file_name, file_path, file_size, role_info, company_info, \
     job_description, rubric_version, status, score, feedback, criteria, highlights, alerts, \
     created_at, updated_at";

pub struct CreateEvaluationData {
    pub owner_id: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub role_info: String,
    pub company_info: String,
    pub job_description: Option<String>,
    pub rubric_version: i32,
}

/// The pipeline is the only caller of the status-moving mutations below;
/// every update guards on the current status in SQL so a terminal record
/// can never be written again, whatever races a crashed worker leaves
/// behind.
pub struct EvaluationMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> EvaluationMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        EvaluationMutator { pool }
    }

    pub async fn create(&mut self, data: CreateEvaluationData) -> Result<EvaluationEntry> {
        let row = sqlx::query_as::<_, EvaluationEntry>(&format!(
            r#"
            INSERT INTO evaluations
                (owner_id, file_name, file_path, file_size, role_info, company_info,
                 job_description, rubric_version, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
            RETURNING {}
            "#,
            RETURNING
        ))
        .bind(&data.owner_id)
        .bind(&data.file_name)
        .bind(&data.file_path)
        .bind(data.file_size)
        .bind(&data.role_info)
        .bind(&data.company_info)
        .bind(&data.job_description)
        .bind(data.rubric_version)
        .fetch_one(&mut *self.pool)
        .await?;

        Ok(row)
    }

    pub async fn mark_analyzing(&mut self, evaluation_id: Uuid) -> Result<EvaluationEntry> {
        let row = sqlx::query_as::<_, EvaluationEntry>(&format!(
            r#"
            UPDATE evaluations
            SET status = 'analyzing', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            RETURNING
        ))
        .bind(evaluation_id)
        .fetch_optional(&mut *self.pool)
        .await?;

        row.ok_or_else(|| {
            StandardError::new(&format!(
                "ERR-EVAL-020: evaluation {} is not pending, refusing to analyze",
                evaluation_id
            ))
        })
    }

    /// The full result and the `completed` status land in one update, so no
    /// reader ever observes a completed record with analysis fields missing.
    pub async fn complete(
        &mut self,
        evaluation_id: Uuid,
        score: i32,
        feedback: &str,
        criteria: &BTreeMap<String, CriterionVerdict>,
        highlights: &str,
        alerts: &str,
    ) -> Result<EvaluationEntry> {
        let row = sqlx::query_as::<_, EvaluationEntry>(&format!(
            r#"
            UPDATE evaluations
            SET status = 'completed', score = $2, feedback = $3, criteria = $4,
                highlights = $5, alerts = $6, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'analyzing'
            RETURNING {}
            "#,
            RETURNING
        ))
        .bind(evaluation_id)
        .bind(score)
        .bind(feedback)
        .bind(Json(criteria))
        .bind(highlights)
        .bind(alerts)
        .fetch_optional(&mut *self.pool)
        .await?;

        row.ok_or_else(|| {
            StandardError::new(&format!(
                "ERR-EVAL-021: evaluation {} is not analyzing, refusing to complete",
                evaluation_id
            ))
        })
    }

    /// Best-effort terminal transition. Returns None when the record already
    /// reached a terminal state; analysis fields are never written here.
    pub async fn mark_error(&mut self, evaluation_id: Uuid) -> Result<Option<EvaluationEntry>> {
        let row = sqlx::query_as::<_, EvaluationEntry>(&format!(
            r#"
            UPDATE evaluations
            SET status = 'error', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status IN ('pending', 'analyzing')
            RETURNING {}
            "#,
            RETURNING
        ))
        .bind(evaluation_id)
        .fetch_optional(&mut *self.pool)
        .await?;

        Ok(row)
    }
}
