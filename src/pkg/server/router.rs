use axum::middleware::from_fn_with_state;
use axum::routing::post;
use axum::{routing::get, Router};

use super::handlers;
use super::handlers::auth::{logout, signup, verify};
use super::handlers::probes::{healthz, livez};
use super::handlers::ui::{home, otp};
use super::middlewares::authn;
use super::state::AppState;
use crate::prelude::Result;

pub async fn build_routes() -> Result<Router> {
    let state = AppState::new().await?;
    let app = Router::new()
        .route("/", get(home))
        .route("/logout", post(logout))
        .route("/evaluations", post(handlers::evaluations::create))
        .route("/evaluations", get(handlers::evaluations::list))
        .route("/evaluations/:evaluation_id", get(handlers::evaluations::get_detail))
        .route(
            "/evaluations/:evaluation_id/document",
            get(handlers::evaluations::retrieve_document),
        )
        .route("/admin/evaluations", get(handlers::evaluations::list_all))
        .layer(from_fn_with_state(state.clone(), authn::authenticate))
        .route("/signup", post(signup))
        .route("/verify", post(verify))
        .route("/otp", get(otp))
        .route("/healthz", get(healthz))
        .route("/livez", get(livez))
        .with_state(state);

    Ok(app)
}
