use ai::clients::openai::Client as AIClient;
use sqlx::{postgres::PgPoolOptions, PgPool, Pool, Postgres, Transaction};
use standard_error::{Interpolate, StandardError};
use std::sync::Arc;
use std::time::Duration;

use crate::{conf::settings, pkg::internal::minio, prelude::Result};

pub fn db_pool() -> Result<Pool<Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.database_pool_max_connections)
        .connect_lazy(&settings.database_url)?;
    Ok(pool)
}

#[async_trait::async_trait]
pub trait GetTxn {
    async fn begin_txn(&self) -> Result<Transaction<'static, Postgres>>;
}

#[async_trait::async_trait]
impl GetTxn for Arc<PgPool> {
    async fn begin_txn(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.begin().await?)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub db_pool: Arc<PgPool>,
    pub ai_client: Arc<AIClient>,
    pub s3_client: Arc<aws_sdk_s3::Client>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub async fn new() -> Result<AppState> {
        let ai = AIClient::from_url(&settings.ai_key, &settings.ai_endpoint)
            .map_err(|_| StandardError::new("AI-000"))?;
        let s3 = minio::client();
        minio::ensure_bucket(&s3, &settings.s3_bucket_name).await?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.extractor_timeout_secs))
            .build()
            .map_err(|e| StandardError::new("ERR-HTTP-000").interpolate_err(e.to_string()))?;
        Ok(AppState {
            db_pool: Arc::new(db_pool()?),
            ai_client: Arc::new(ai),
            s3_client: Arc::new(s3),
            http_client: http,
        })
    }
}
