//! `/feedback-response` routes — staff replies to farmer feedback.
//!
//! One response per feedback. Posting a response moves the feedback out of
//! `pending`; the resulting status is derived from the feedback category.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::Db,
    errors::{AppError, AppResult},
    middleware::{auth_guard::AuthUser, role_guard::require_agronomist_or_admin},
    models::FeedbackCategory,
    response::ApiResponse,
    services::notify,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feedback-response", post(create_response))
        .route("/feedback-response", get(get_all_responses))
        .route("/feedback-response/{id}", get(get_response_by_id))
        .route("/feedback-response/{id}", delete(delete_response))
        .route_layer(middleware::from_fn(require_agronomist_or_admin))
}

// ── Types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CreateResponseRequest {
    feedback_id: String,
    message:     String,
}

#[derive(Serialize, sqlx::FromRow)]
struct ResponseView {
    id:          String,
    feedback_id: String,
    author_id:   String,
    message:     String,
    created_at:  NaiveDateTime,
}

// ── Admission rule ────────────────────────────────────────────

/// A feedback takes exactly one response. The check runs before the insert,
/// so a rejected attempt leaves the existing response untouched.
fn admit_response(already_answered: bool) -> AppResult<()> {
    if already_answered {
        return Err(AppError::Conflict("This feedback already has a response".into()));
    }
    Ok(())
}

// ── Handlers ──────────────────────────────────────────────────

/// POST /feedback-response — reply, transition the feedback status, and
/// notify the farmer who raised it.
async fn create_response(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    axum::Json(body): axum::Json<CreateResponseRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    let message = body.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("A message is required".into()));
    }

    #[derive(sqlx::FromRow)]
    struct FeedbackRow {
        farmer_id: String,
        category:  FeedbackCategory,
    }

    let feedback = sqlx::query_as::<_, FeedbackRow>(
        "SELECT farmer_id, category FROM feedbacks WHERE id = ?",
    )
    .bind(&body.feedback_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;

    let already_answered: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM feedback_responses WHERE feedback_id = ?)",
    )
    .bind(&body.feedback_id)
    .fetch_one(pool)
    .await?;
    admit_response(already_answered)?;

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO feedback_responses (id, feedback_id, author_id, message)
         VALUES (?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&body.feedback_id)
    .bind(&user.user_id)
    .bind(message)
    .execute(pool)
    .await?;

    sqlx::query("UPDATE feedbacks SET status = ? WHERE id = ?")
        .bind(feedback.category.resolution_status())
        .bind(&body.feedback_id)
        .execute(pool)
        .await?;

    notify_feedback_farmer(pool, &feedback.farmer_id, &body.feedback_id).await;

    let view = sqlx::query_as::<_, ResponseView>("SELECT * FROM feedback_responses WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await?;
    Ok(ApiResponse::created("Response submitted successfully", view))
}

async fn notify_feedback_farmer(pool: &Db, farmer_id: &str, feedback_id: &str) {
    let lookup: Result<Option<String>, sqlx::Error> =
        sqlx::query_scalar("SELECT user_id FROM farmers WHERE id = ?")
            .bind(farmer_id)
            .fetch_optional(pool)
            .await;

    match lookup {
        Ok(Some(user_id)) => {
            let result = notify::notify_users(
                pool,
                std::slice::from_ref(&user_id),
                "Feedback Response",
                "Your feedback has received a response.",
            )
            .await;
            if let Err(err) = result {
                tracing::warn!(feedback_id, error = %err, "Feedback-response fan-out failed");
            }
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(feedback_id, error = %err, "Feedback-response fan-out failed");
        }
    }
}

/// GET /feedback-response
async fn get_all_responses(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rows = sqlx::query_as::<_, ResponseView>(
        "SELECT * FROM feedback_responses ORDER BY created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(ApiResponse::success("Responses retrieved successfully", rows))
}

/// GET /feedback-response/{id}
async fn get_response_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let view = sqlx::query_as::<_, ResponseView>("SELECT * FROM feedback_responses WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Response retrieved successfully", view))
}

/// DELETE /feedback-response/{id}
async fn delete_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let affected = sqlx::query("DELETE FROM feedback_responses WHERE id = ?")
        .bind(&id)
        .execute(&state.pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success("Response deleted successfully", ()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_response_is_admitted() {
        assert!(admit_response(false).is_ok());
    }

    #[test]
    fn second_response_is_a_conflict() {
        let err = admit_response(true).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
