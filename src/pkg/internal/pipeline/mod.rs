use std::time::Duration;

use uuid::Uuid;

use crate::{
    conf::settings,
    pkg::{
        internal::{
            adaptors::evaluations::{mutators::EvaluationMutator, spec::EvaluationEntry},
            ai::{generate::ScoreOps, parse::parse_analysis},
            extract,
            minio::S3Ops,
            rubric::{self, feedback::split_feedback, prompt, score, Rubric},
        },
        server::state::{AppState, GetTxn},
    },
    prelude::Result,
};

pub mod error;
pub mod progress;

use error::StageError;
use progress::{Checkpoint, Progress};

/// Everything one pipeline run needs, created once per upload. The
/// evaluation id travels here so the error transition never has to recover
/// it from a side channel.
pub struct PipelineContext {
    pub evaluation_id: Uuid,
    pub owner_id: String,
    pub file_path: String,
    pub role_info: String,
    pub company_info: String,
    pub job_description: Option<String>,
    pub rubric: &'static Rubric,
}

/// Drives one evaluation from `analyzing` to a terminal state. This is the
/// only writer of `status`/`score`/`feedback`/`criteria`; handlers only
/// read. Any stage failure lands the record in `error` with no partial
/// analysis fields written.
pub async fn run(state: AppState, ctx: PipelineContext, progress: Progress) {
    let evaluation_id = ctx.evaluation_id;
    if let Err(err) = drive(&state, &ctx, &progress).await {
        tracing::error!(
            "evaluation {} failed at {} stage: {}",
            evaluation_id,
            err.stage(),
            err
        );
        if let StageError::AnalysisParse { raw, .. } = &err {
            tracing::error!("raw model output for {}: {}", evaluation_id, raw);
        }
        if let Err(db_err) = mark_error(&state, evaluation_id).await {
            tracing::error!(
                "could not move evaluation {} to error state: {}",
                evaluation_id,
                db_err
            );
        }
    }
}

async fn drive(
    state: &AppState,
    ctx: &PipelineContext,
    progress: &Progress,
) -> core::result::Result<EvaluationEntry, StageError> {
    mark_analyzing(state, ctx.evaluation_id)
        .await
        .map_err(|e| StageError::Persistence(e.to_string()))?;

    let cv_url = state
        .s3_client
        .presigned_get_url(
            &settings.s3_bucket_name,
            &ctx.file_path,
            Duration::from_secs(settings.signed_url_ttl_secs),
        )
        .await
        .map_err(|e| StageError::Extraction(e.to_string()))?;
    let cv_text = extract::extract_text(&state.http_client, &cv_url).await?;
    progress.emit(Checkpoint::TextExtracted);

    let prompt = prompt::build(
        ctx.rubric,
        &cv_text,
        &ctx.role_info,
        &ctx.company_info,
        ctx.job_description.as_deref(),
    );
    let completion = state.ai_client.score_cv(prompt::SYSTEM_PROMPT, &prompt).await?;
    let mut analysis = parse_analysis(&completion)?;
    score::reconcile_criteria(ctx.rubric, &mut analysis, settings.strict_criteria)?;
    let scored = score::aggregate(ctx.rubric, analysis)?;
    let (highlights, alerts) = split_feedback(&scored.feedback);
    tracing::debug!(
        "evaluation {} scored {}/{} ({})",
        ctx.evaluation_id,
        scored.score,
        ctx.rubric.max_score,
        ctx.rubric.classify(scored.score).as_str()
    );

    let entry = complete(state, ctx.evaluation_id, &scored, &highlights, &alerts)
        .await
        .map_err(|e| StageError::Persistence(e.to_string()))?;
    progress.emit(Checkpoint::AnalysisComplete);
    Ok(entry)
}

async fn mark_analyzing(state: &AppState, evaluation_id: Uuid) -> Result<EvaluationEntry> {
    let mut tx = state.db_pool.begin_txn().await?;
    let entry = EvaluationMutator::new(&mut tx)
        .mark_analyzing(evaluation_id)
        .await?;
    tx.commit().await?;
    Ok(entry)
}

async fn complete(
    state: &AppState,
    evaluation_id: Uuid,
    scored: &score::ScoredAnalysis,
    highlights: &str,
    alerts: &str,
) -> Result<EvaluationEntry> {
    let mut tx = state.db_pool.begin_txn().await?;
    let entry = EvaluationMutator::new(&mut tx)
        .complete(
            evaluation_id,
            scored.score,
            &scored.feedback,
            &scored.criteria,
            highlights,
            alerts,
        )
        .await?;
    tx.commit().await?;
    Ok(entry)
}

async fn mark_error(state: &AppState, evaluation_id: Uuid) -> Result<()> {
    let mut tx = state.db_pool.begin_txn().await?;
    if EvaluationMutator::new(&mut tx)
        .mark_error(evaluation_id)
        .await?
        .is_none()
    {
        tracing::warn!(
            "evaluation {} already reached a terminal state, leaving it untouched",
            evaluation_id
        );
    }
    tx.commit().await?;
    Ok(())
}

/// Picks the rubric the run will be pinned to. Stored on the record so
/// completed evaluations keep classifying with the scale they were scored
/// against, whatever the configured default moves to later.
pub fn active_rubric() -> Result<&'static Rubric> {
    rubric::rubric(settings.rubric_version)
}
