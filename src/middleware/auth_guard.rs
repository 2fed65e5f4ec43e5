//! Authentication guard middleware.
//!
//! Reads the `Authorization: Bearer <token>` header, validates the token
//! against `user_sessions` in the DB, and injects an `AuthUser` extension
//! into the request for downstream handlers. Farmer/agronomist sub-ids are
//! resolved here once so handlers never re-derive them.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::str::FromStr;

use crate::{
    auth::token_hash,
    errors::AppError,
    models::UserRole,
    state::AppState,
};

/// Authenticated caller extracted from a valid bearer token. Injected into
/// request extensions by `require_auth`; downstream handlers use
/// `Extension<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id:       String,
    pub email:         String,
    pub role:          UserRole,
    pub farmer_id:     Option<String>,
    pub agronomist_id: Option<String>,
}

/// Middleware: require a valid bearer token.
/// On success, inserts `AuthUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_owned())
        .ok_or(AppError::Unauthorized)?;

    #[derive(sqlx::FromRow)]
    struct SessionRow {
        id:            String,
        email:         String,
        role:          String,
        farmer_id:     Option<String>,
        agronomist_id: Option<String>,
    }

    let row = sqlx::query_as::<_, SessionRow>(
        "SELECT u.id, u.email, u.role, f.id AS farmer_id, a.id AS agronomist_id
         FROM user_sessions s
         JOIN users u ON u.id = s.user_id
         LEFT JOIN farmers f     ON f.user_id = u.id
         LEFT JOIN agronomists a ON a.user_id = u.id
         WHERE s.token_hash = ?
           AND s.expires_at > UTC_TIMESTAMP()
         LIMIT 1",
    )
    .bind(token_hash(&token))
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?
    .ok_or(AppError::Unauthorized)?;

    let role = UserRole::from_str(&row.role).unwrap_or(UserRole::Farmer);

    req.extensions_mut().insert(AuthUser {
        user_id:       row.id,
        email:         row.email,
        role,
        farmer_id:     row.farmer_id,
        agronomist_id: row.agronomist_id,
    });

    Ok(next.run(req).await)
}
