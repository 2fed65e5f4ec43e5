//! `/feedback` routes — farmer feedback on detections and advice.
//!
//! Feedback is always anchored to a detection. Feedback on advice resolves
//! the detection through the advice row; advice with no detection attached
//! cannot take feedback.

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
    middleware::{auth_guard::AuthUser, role_guard::require_farmer},
    models::{FeedbackCategory, FeedbackStatus, UserRole},
    response::ApiResponse,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feedback", get(get_all_feedback))
        .route("/feedback/{id}", get(get_feedback_by_id))
        .route("/feedback/{id}", delete(delete_feedback))
        .merge(
            Router::new()
                .route("/feedback/on-detection", post(create_feedback_on_detection))
                .route("/feedback/on-advice", post(create_feedback_on_advice))
                .route_layer(middleware::from_fn(require_farmer)),
        )
}

// ── Types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct FeedbackOnDetectionRequest {
    detection_id: String,
    comment:      String,
    category:     FeedbackCategory,
}

#[derive(Deserialize)]
struct FeedbackOnAdviceRequest {
    advice_id: String,
    comment:   String,
    category:  FeedbackCategory,
}

#[derive(Serialize, sqlx::FromRow)]
struct FeedbackView {
    id:           String,
    farmer_id:    String,
    detection_id: String,
    advice_id:    Option<String>,
    comment:      String,
    category:     FeedbackCategory,
    status:       FeedbackStatus,
    created_at:   NaiveDateTime,
}

// ── Helpers ───────────────────────────────────────────────────

fn farmer_id_of(user: &AuthUser) -> AppResult<&str> {
    user.farmer_id.as_deref().ok_or(AppError::Forbidden)
}

/// Resolve the anchoring detection from an advice lookup. A missing advice
/// is not-found; advice with no detection attached cannot take feedback.
fn detection_from_advice(lookup: Option<Option<String>>) -> AppResult<String> {
    lookup.ok_or(AppError::NotFound)?.ok_or_else(|| {
        AppError::BadRequest("This advice is not attached to a detection".into())
    })
}

async fn insert_feedback(
    pool: &Db,
    farmer_id: &str,
    detection_id: &str,
    advice_id: Option<&str>,
    comment: &str,
    category: FeedbackCategory,
) -> AppResult<FeedbackView> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO feedbacks (id, farmer_id, detection_id, advice_id, comment, category)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(farmer_id)
    .bind(detection_id)
    .bind(advice_id)
    .bind(comment)
    .bind(category)
    .execute(pool)
    .await?;

    let view = sqlx::query_as::<_, FeedbackView>("SELECT * FROM feedbacks WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await?;
    Ok(view)
}

// ── Handlers ──────────────────────────────────────────────────

/// POST /feedback/on-detection
async fn create_feedback_on_detection(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    axum::Json(body): axum::Json<FeedbackOnDetectionRequest>,
) -> AppResult<impl IntoResponse> {
    let farmer_id = farmer_id_of(&user)?.to_owned();
    let pool = &state.pool;

    let comment = body.comment.trim();
    if comment.is_empty() {
        return Err(AppError::BadRequest("A comment is required".into()));
    }

    let detection_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM detections WHERE id = ?)")
            .bind(&body.detection_id)
            .fetch_one(pool)
            .await?;
    if !detection_exists {
        return Err(AppError::NotFound);
    }

    let view =
        insert_feedback(pool, &farmer_id, &body.detection_id, None, comment, body.category)
            .await?;
    Ok(ApiResponse::created("Feedback submitted successfully", view))
}

/// POST /feedback/on-advice — the detection is resolved through the advice.
async fn create_feedback_on_advice(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    axum::Json(body): axum::Json<FeedbackOnAdviceRequest>,
) -> AppResult<impl IntoResponse> {
    let farmer_id = farmer_id_of(&user)?.to_owned();
    let pool = &state.pool;

    let comment = body.comment.trim();
    if comment.is_empty() {
        return Err(AppError::BadRequest("A comment is required".into()));
    }

    let lookup: Option<Option<String>> =
        sqlx::query_scalar("SELECT detection_id FROM advices WHERE id = ?")
            .bind(&body.advice_id)
            .fetch_optional(pool)
            .await?;
    let detection_id = detection_from_advice(lookup)?;

    let view = insert_feedback(
        pool,
        &farmer_id,
        &detection_id,
        Some(&body.advice_id),
        comment,
        body.category,
    )
    .await?;
    Ok(ApiResponse::created("Feedback submitted successfully", view))
}

/// GET /feedback — farmers see their own rows; staff roles see everything.
async fn get_all_feedback(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    let rows = match user.role {
        UserRole::Farmer => {
            let farmer_id = farmer_id_of(&user)?;
            sqlx::query_as::<_, FeedbackView>(
                "SELECT * FROM feedbacks WHERE farmer_id = ? ORDER BY created_at DESC",
            )
            .bind(farmer_id)
            .fetch_all(pool)
            .await?
        }
        _ => {
            sqlx::query_as::<_, FeedbackView>("SELECT * FROM feedbacks ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?
        }
    };

    Ok(ApiResponse::success("Feedback retrieved successfully", rows))
}

/// GET /feedback/{id}
async fn get_feedback_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let view = sqlx::query_as::<_, FeedbackView>("SELECT * FROM feedbacks WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Feedback retrieved successfully", view))
}

/// DELETE /feedback/{id} — the owning farmer, an agronomist or an admin.
async fn delete_feedback(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    let owner_farmer_id: String =
        sqlx::query_scalar("SELECT farmer_id FROM feedbacks WHERE id = ?")
            .bind(&id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::NotFound)?;

    let is_owner = user.farmer_id.as_deref() == Some(owner_farmer_id.as_str());
    let is_staff = matches!(user.role, UserRole::Agronomist | UserRole::Admin);
    if !is_owner && !is_staff {
        return Err(AppError::Forbidden);
    }

    sqlx::query("DELETE FROM feedbacks WHERE id = ?")
        .bind(&id)
        .execute(pool)
        .await?;

    Ok(ApiResponse::success("Feedback deleted successfully", ()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_advice_is_not_found() {
        let err = detection_from_advice(None).unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[test]
    fn advice_without_detection_is_a_validation_error() {
        let err = detection_from_advice(Some(None)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn advice_with_detection_resolves_it() {
        let id = detection_from_advice(Some(Some("det-1".into()))).unwrap();
        assert_eq!(id, "det-1");
    }
}
