use sqlx::PgConnection;
use uuid::Uuid;

use crate::pkg::internal::adaptors::evaluations::spec::EvaluationEntry;
use crate::prelude::Result;

const COLUMNS: &str = "id, owner_id, file_name, file_path, file_size, role_info, company_info, \
     job_description, rubric_version, status, score, feedback, criteria, highlights, alerts, \
     created_at, updated_at";

pub struct EvaluationSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> EvaluationSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        EvaluationSelector { pool }
    }

    pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<EvaluationEntry>> {
        let row = sqlx::query_as::<_, EvaluationEntry>(&format!(
            "SELECT {} FROM evaluations WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_evaluations_for_owner(
        &mut self,
        owner_id: &str,
    ) -> Result<Vec<EvaluationEntry>> {
        let rows = sqlx::query_as::<_, EvaluationEntry>(&format!(
            "SELECT {} FROM evaluations WHERE owner_id = $1 ORDER BY created_at DESC",
            COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }

    /// The admin dashboard view: everyone's evaluations, newest first.
    pub async fn get_all_evaluations(&mut self) -> Result<Vec<EvaluationEntry>> {
        let rows = sqlx::query_as::<_, EvaluationEntry>(&format!(
            "SELECT {} FROM evaluations ORDER BY created_at DESC",
            COLUMNS
        ))
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }
}
