use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{Html, IntoResponse},
    Extension, Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use validator::Validate;

use crate::{
    pkg::{
        internal::auth::{AuthToken, User},
        server::state::AppState,
    },
    prelude::Result,
};

#[derive(Deserialize)]
pub struct SignupInput {
    pub email: String,
    pub name: String,
}

#[derive(Deserialize, Validate)]
pub struct VerifyInput {
    #[validate(length(equal = 6))]
    pub code: String,
}

pub async fn signup(
    State(state): State<AppState>,
    Form(input): Form<SignupInput>,
) -> Result<impl IntoResponse> {
    let user = AuthToken::issue_user_token(&state, &input.email, &input.name).await?;
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        HeaderValue::from_str(&format!("_Host_email={}", &user.email))?,
    );
    headers.insert("HX-Redirect", HeaderValue::from_str("/otp")?);
    Ok(headers)
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
) -> Result<Html<String>> {
    sqlx::query("UPDATE tokens SET status = 'expired' WHERE user_id = $1 AND status = 'verified'")
        .bind(&user.user_id)
        .execute(&*state.db_pool)
        .await?;
    tracing::info!("User {} logged out successfully", &user.name);
    Ok(Html(
        r#"
        <div class="text-center py-12">
          <h2 class="text-2xl font-bold text-gray-900 mb-4">See you soon!</h2>
          <p class="text-gray-600 mb-6">You have been successfully logged out.</p>
          <a href="/" class="inline-flex items-center px-4 py-2 rounded-md text-white bg-teal-600 hover:bg-teal-700">
            Login Again
          </a>
        </div>
    "#
        .into(),
    ))
}

pub async fn verify(
    headers: HeaderMap,
    State(state): State<AppState>,
    Form(input): Form<VerifyInput>,
) -> Result<(HeaderMap, Html<String>)> {
    let pool = &*state.db_pool;
    let jar = CookieJar::from_headers(&headers);
    let mut headers = HeaderMap::new();
    if let Some(email) = jar.get("_Host_email").filter(|c| !c.value().is_empty()) {
        let user = match User::retrieve(&state, email.value()).await? {
            Some(user) => user,
            None => {
                return Ok((headers, Html(
                    r#"<div id='code-error' class='text-red-500 text-center text-sm mt-2'>Verification failed, please try again</div>"#.to_string()
                )));
            }
        };
        let token = sqlx::query_as::<_, AuthToken>(
            "SELECT token, user_id, code, expiry, status FROM tokens WHERE user_id = $1 AND status = 'pending'",
        )
        .bind(&user.user_id)
        .fetch_optional(pool)
        .await?;
        tracing::debug!("verifying token: {:?}", &token);
        if let Some(token) = token {
            if input.code != token.code {
                sqlx::query(
                    "UPDATE tokens SET status = 'rejected' WHERE user_id = $1 AND status = 'pending'",
                )
                .bind(&user.user_id)
                .execute(pool)
                .await?;
                Ok((headers, Html(
                    r#"<div id='code-error' class='text-red-500 text-center text-sm mt-2'>Invalid code, please try again.</div>"#.to_string()
                )))
            } else {
                sqlx::query(
                    "UPDATE tokens SET status = 'verified' WHERE user_id = $1 AND status = 'pending'",
                )
                .bind(&user.user_id)
                .execute(pool)
                .await?;
                headers.insert(
                    SET_COOKIE,
                    HeaderValue::from_str(&format!("_Host_token={}", &token.token))?,
                );
                Ok((
                    headers,
                    Html(
                        "<div class='text-green-600 text-center text-lg'>Verification successful!</div>"
                            .to_string(),
                    ),
                ))
            }
        } else {
            user.issue_token(&state).await?;
            Ok((
                headers,
                Html(
                    "<div class='text-green-600 text-center text-lg'>No active token found, sent new one!</div>"
                        .to_string(),
                ),
            ))
        }
    } else {
        Ok((headers, Html(
            r#"<div id='code-error' class='text-red-500 text-center text-sm mt-2'>Verification failed, please try again</div>"#.to_string()
        )))
    }
}
