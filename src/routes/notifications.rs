//! `/notifications` routes — per-user notification inbox.

use axum::{
    extract::{Extension, Path, State},
    response::IntoResponse,
    routing::{delete, get, patch},
    Router,
};

use crate::{
    errors::{AppError, AppResult},
    middleware::auth_guard::AuthUser,
    models::{Notification, UserRole},
    response::ApiResponse,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(get_my_notifications))
        .route("/notifications/{id}/read", patch(mark_read))
        .route("/notifications/mark-all-read", patch(mark_all_read))
        .route("/notifications/{id}/delete", delete(delete_notification))
        .route("/notifications/deleteAll", delete(delete_all))
        .route("/notifications/user/{user_id}", get(get_user_notifications))
}

fn is_admin(user: &AuthUser) -> bool {
    user.role == UserRole::Admin
}

/// GET /notifications — the caller's inbox, newest first.
async fn get_my_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let rows = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(&user.user_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(ApiResponse::success("Notifications retrieved successfully", rows))
}

/// GET /notifications/user/{user_id} — self or admin.
async fn get_user_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    if user.user_id != user_id && !is_admin(&user) {
        return Err(AppError::Forbidden);
    }
    let rows = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(&user_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(ApiResponse::success("Notifications retrieved successfully", rows))
}

/// PATCH /notifications/{id}/read — owner or admin.
async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    let owner_id: String = sqlx::query_scalar("SELECT user_id FROM notifications WHERE id = ?")
        .bind(&id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;
    if owner_id != user.user_id && !is_admin(&user) {
        return Err(AppError::Forbidden);
    }

    sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
        .bind(&id)
        .execute(pool)
        .await?;

    let row = sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await?;
    Ok(ApiResponse::success("Notification marked as read", row))
}

/// PATCH /notifications/mark-all-read — the caller's own inbox.
async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let affected = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
        .bind(&user.user_id)
        .execute(&state.pool)
        .await?
        .rows_affected();
    Ok(ApiResponse::success(
        "All notifications marked as read",
        serde_json::json!({ "updated": affected }),
    ))
}

/// DELETE /notifications/{id}/delete — owner or admin.
async fn delete_notification(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    let owner_id: String = sqlx::query_scalar("SELECT user_id FROM notifications WHERE id = ?")
        .bind(&id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;
    if owner_id != user.user_id && !is_admin(&user) {
        return Err(AppError::Forbidden);
    }

    sqlx::query("DELETE FROM notifications WHERE id = ?")
        .bind(&id)
        .execute(pool)
        .await?;
    Ok(ApiResponse::success("Notification deleted successfully", ()))
}

/// DELETE /notifications/deleteAll — the caller's own inbox.
async fn delete_all(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let affected = sqlx::query("DELETE FROM notifications WHERE user_id = ?")
        .bind(&user.user_id)
        .execute(&state.pool)
        .await?
        .rows_affected();
    Ok(ApiResponse::success(
        "All notifications deleted successfully",
        serde_json::json!({ "deleted": affected }),
    ))
}
