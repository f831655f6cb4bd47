use std::sync::Arc;

use askama::Template;
use axum::{extract::State, response::Html, Extension};

use crate::{
    pkg::{
        internal::{
            adaptors::evaluations::selectors::EvaluationSelector,
            auth::User,
        },
        server::{
            state::{AppState, GetTxn},
            uispec::{Home, Verify},
        },
    },
    prelude::Result,
};

pub async fn home(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
) -> Result<Html<String>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let evaluations = EvaluationSelector::new(&mut tx)
        .get_evaluations_for_owner(&user.user_id)
        .await?;
    tracing::debug!("{} evaluations for {}", evaluations.len(), &user.name);

    let template = Home {
        username: &user.name,
        evaluations,
    };

    Ok(Html(template.render()?))
}

pub async fn otp() -> Result<Html<String>> {
    Ok(Html(Verify {}.render()?))
}
