use crate::{
    pkg::{
        internal::email::{authtoken::AuthnCodeTemplate, SendEmail},
        server::state::AppState,
    },
    prelude::Result,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::prelude::{FromRow, Type};
use standard_error::StandardError;
use uuid::Uuid;

#[derive(Debug, Type)]
#[sqlx(type_name = "token_status", rename_all = "lowercase")]
pub enum TokenStatus {
    Pending,
    Verified,
    Rejected,
    Expired,
}

#[derive(FromRow, Debug)]
pub struct AuthToken {
    pub token: Uuid,
    pub user_id: String,
    pub code: String,
    pub expiry: DateTime<Utc>,
    pub status: TokenStatus,
}

#[derive(FromRow, Debug)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
}

impl User {
    pub async fn create(state: &AppState, email: &str, name: &str) -> Result<Self> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
            SET name = $2
            RETURNING user_id, email, name, is_admin
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(Uuid::new_v4().to_string())
        .fetch_one(&*state.db_pool)
        .await?;
        Ok(user)
    }

    pub async fn retrieve(state: &AppState, email: &str) -> Result<Option<Self>> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT user_id, email, name, is_admin FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&*state.db_pool)
        .await?)
    }

    pub async fn issue_token(&self, state: &AppState) -> Result<()> {
        let pool = &*state.db_pool;
        let code = AuthToken::generate_code();
        tracing::debug!("issued code: {}", &code);
        sqlx::query(
            r#"
            INSERT INTO tokens (user_id, code, expiry, status)
            VALUES ($1, $2, NOW() + interval '1 hour', 'pending')
            "#,
        )
        .bind(&self.user_id)
        .bind(&code)
        .execute(pool)
        .await?;
        AuthnCodeTemplate {
            name: &self.name,
            code: &code,
        }
        .send(&self.email)?;
        Ok(())
    }
}

impl AuthToken {
    fn generate_code() -> String {
        let mut rng = rand::rng();
        (0..6)
            .map(|_| rng.random_range(0..10).to_string())
            .collect()
    }

    pub async fn issue_user_token(state: &AppState, email: &str, name: &str) -> Result<User> {
        let user = User::create(state, email, name).await?;
        user.issue_token(state).await?;
        Ok(user)
    }

    pub async fn check_token_validity(state: &AppState, token_str: &str) -> Result<User> {
        let pool = &*state.db_pool;
        let token_str = token_str
            .parse::<Uuid>()
            .map_err(|_| StandardError::new("ERR-AUTH-002"))?;

        tracing::debug!("verifying token: {}", token_str);
        let result = sqlx::query_as::<_, AuthToken>(
            r#"
            SELECT token, user_id, code, expiry, status
            FROM tokens
            WHERE token = $1
            AND status = 'verified'
            AND expiry > NOW()
            "#,
        )
        .bind(token_str)
        .fetch_optional(pool)
        .await;
        if let Ok(Some(token)) = result {
            let user = sqlx::query_as::<_, User>(
                "SELECT user_id, email, name, is_admin FROM users WHERE user_id = $1",
            )
            .bind(&token.user_id)
            .fetch_one(pool)
            .await?;
            Ok(user)
        } else {
            Err(StandardError::new("ERR-AUTH-001"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AuthToken;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..50 {
            let code = AuthToken::generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
