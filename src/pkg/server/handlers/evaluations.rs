use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use axum::response::IntoResponse;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use uuid::Uuid;

use axum::{
    extract::{Multipart, Path as AxumPath, State},
    Extension, Json,
};
use standard_error::{StandardError, Status};

use crate::conf::settings;
use crate::pkg::internal::adaptors::evaluations::{
    mutators::{CreateEvaluationData, EvaluationMutator},
    selectors::EvaluationSelector,
    spec::{EvaluationEntry, EvaluationStatus},
};
use crate::pkg::internal::minio::{sanitize_filename, S3Ops};
use crate::pkg::internal::pipeline::{
    self,
    error::StageError,
    progress::{Checkpoint, Progress},
    PipelineContext,
};
use crate::pkg::internal::rubric;
use crate::pkg::server::state::GetTxn;
use crate::{
    pkg::{internal::auth::User, server::state::AppState},
    prelude::Result,
};

#[derive(Serialize)]
pub struct EvaluationDetail {
    #[serde(flatten)]
    pub evaluation: EvaluationEntry,
    pub band: Option<&'static str>,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    mut multipart: Multipart,
) -> Result<Json<EvaluationEntry>> {
    let mut role_info = String::new();
    let mut company_info = String::new();
    let mut job_description: Option<String> = None;
    let mut cv_file: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| StandardError::new(&format!("EVAL-001: {}", e)))?
    {
        let field_name = field.name().unwrap_or("");
        match field_name {
            "role_info" => {
                role_info = field
                    .text()
                    .await
                    .map_err(|e| StandardError::new(&format!("EVAL-002: {}", e)))?;
            }
            "company_info" => {
                company_info = field
                    .text()
                    .await
                    .map_err(|e| StandardError::new(&format!("EVAL-003: {}", e)))?;
            }
            "job_description" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| StandardError::new(&format!("EVAL-004: {}", e)))?;
                if !text.trim().is_empty() {
                    job_description = Some(text.trim().to_string());
                }
            }
            "cv" => {
                let file_name = field.file_name().unwrap_or("unknown").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| StandardError::new(&format!("EVAL-005: {}", e)))?;
                let file_extension = Path::new(&file_name)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or("")
                    .to_lowercase();
                if file_extension != "pdf" {
                    return Err(StandardError::new(
                        "EVAL-006: Invalid file type. Only PDF files are allowed",
                    )
                    .code(StatusCode::BAD_REQUEST));
                }
                if data.len() > 10 * 1024 * 1024 {
                    // 10MB limit
                    return Err(StandardError::new(
                        "EVAL-007: File too large. Maximum size is 10MB",
                    )
                    .code(StatusCode::BAD_REQUEST));
                }
                if !data.starts_with(b"%PDF") {
                    return Err(StandardError::new(
                        "EVAL-008: The uploaded file is not a valid PDF",
                    )
                    .code(StatusCode::BAD_REQUEST));
                }
                cv_file = Some((file_name, data));
            }
            _ => {
                let _ = field
                    .bytes()
                    .await
                    .map_err(|e| StandardError::new(&format!("EVAL-009: {}", e)))?;
            }
        }
    }

    // precondition checks, not pipeline failures
    if role_info.trim().is_empty() || company_info.trim().is_empty() {
        return Err(StandardError::new(
            "EVAL-010: Please fill in the role and company details first",
        )
        .code(StatusCode::BAD_REQUEST));
    }
    let (file_name, data) = cv_file.ok_or_else(|| {
        StandardError::new("EVAL-011: No CV file received").code(StatusCode::BAD_REQUEST)
    })?;

    let rubric = pipeline::active_rubric()?;

    // the storage key gets the one-way sanitizer; the original filename is
    // preserved on the record for display
    let file_path = format!(
        "{}/{}-{}",
        user.user_id,
        Utc::now().timestamp_millis(),
        sanitize_filename(&file_name)
    );
    let file_size = data.len() as i64;
    state
        .s3_client
        .upload_object(
            &settings.s3_bucket_name,
            &file_path,
            data.to_vec(),
            "application/pdf",
        )
        .await
        .map_err(|e| StageError::Upload(e.to_string()))?;

    let mut tx = state.db_pool.begin_txn().await?;
    let evaluation = EvaluationMutator::new(&mut tx)
        .create(CreateEvaluationData {
            owner_id: user.user_id.clone(),
            file_name,
            file_path: file_path.clone(),
            file_size,
            role_info: role_info.trim().to_string(),
            company_info: company_info.trim().to_string(),
            job_description: job_description.clone(),
            rubric_version: rubric.version as i32,
        })
        .await?;
    tx.commit().await?;

    let (progress, mut events) = Progress::new(evaluation.id);
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::info!(
                "evaluation {} reached {:?} ({}%)",
                event.evaluation_id,
                event.checkpoint,
                event.percent
            );
        }
    });
    progress.emit(Checkpoint::UploadComplete);
    progress.emit(Checkpoint::RecordCreated);

    let ctx = PipelineContext {
        evaluation_id: evaluation.id,
        owner_id: user.user_id.clone(),
        file_path,
        role_info: evaluation.role_info.clone(),
        company_info: evaluation.company_info.clone(),
        job_description,
        rubric,
    };
    tokio::spawn(pipeline::run(state.clone(), ctx, progress));

    Ok(Json(evaluation))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
) -> Result<Json<Vec<EvaluationEntry>>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let evaluations = EvaluationSelector::new(&mut tx)
        .get_evaluations_for_owner(&user.user_id)
        .await?;
    Ok(Json(evaluations))
}

pub async fn get_detail(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    AxumPath(evaluation_id): AxumPath<Uuid>,
) -> Result<Json<EvaluationDetail>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let evaluation = EvaluationSelector::new(&mut tx)
        .get_by_id(evaluation_id)
        .await?
        .ok_or_else(|| {
            StandardError::new("ERR-EVAL-404: Evaluation not found").code(StatusCode::NOT_FOUND)
        })?;
    if evaluation.owner_id != user.user_id && !user.is_admin {
        return Err(StandardError::new("ERR-EVAL-403").code(StatusCode::FORBIDDEN));
    }
    let band = match (evaluation.status, evaluation.score) {
        (EvaluationStatus::Completed, Some(score)) => Some(
            rubric::rubric(evaluation.rubric_version as u8)?
                .classify(score)
                .as_str(),
        ),
        _ => None,
    };
    Ok(Json(EvaluationDetail { evaluation, band }))
}

pub async fn retrieve_document(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    AxumPath(evaluation_id): AxumPath<Uuid>,
) -> Result<impl IntoResponse> {
    let mut tx = state.db_pool.begin_txn().await?;
    let evaluation = EvaluationSelector::new(&mut tx)
        .get_by_id(evaluation_id)
        .await?
        .ok_or_else(|| {
            StandardError::new("ERR-EVAL-404: Evaluation not found").code(StatusCode::NOT_FOUND)
        })?;
    if evaluation.owner_id != user.user_id && !user.is_admin {
        return Err(StandardError::new("ERR-EVAL-403").code(StatusCode::FORBIDDEN));
    }

    let (file_data, content_type) = state
        .s3_client
        .retrieve_object(&settings.s3_bucket_name, &evaluation.file_path)
        .await?;
    tracing::debug!(
        "retrieved {} of type: {}, size: {} bytes",
        &evaluation.file_path,
        &content_type,
        file_data.len()
    );
    Ok(([(CONTENT_TYPE, content_type.to_string())], file_data))
}

pub async fn list_all(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
) -> Result<Json<Vec<EvaluationEntry>>> {
    if !user.is_admin {
        return Err(StandardError::new("ERR-EVAL-403").code(StatusCode::FORBIDDEN));
    }
    let mut tx = state.db_pool.begin_txn().await?;
    let evaluations = EvaluationSelector::new(&mut tx).get_all_evaluations().await?;
    Ok(Json(evaluations))
}
