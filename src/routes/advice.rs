//! `/advice` routes — agronomist advice on detections and medicines.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::Db,
    errors::{AppError, AppResult},
    middleware::{
        auth_guard::AuthUser,
        role_guard::{require_agronomist, require_agronomist_or_admin},
    },
    response::ApiResponse,
    services::notify,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/advice", get(get_all_advice))
        .route("/advice/{id}", get(get_advice_by_id))
        .route("/advice/detection/{detection_id}", get(get_advice_for_detection))
        .merge(
            Router::new()
                .route("/advice/on-detection", post(create_advice_on_detection))
                .route("/advice/on-medicine", post(create_advice_on_medicine))
                .route("/advice/{id}", put(update_advice))
                .route_layer(middleware::from_fn(require_agronomist)),
        )
        .merge(
            Router::new()
                .route("/advice/{id}", delete(delete_advice))
                .route_layer(middleware::from_fn(require_agronomist_or_admin)),
        )
}

// ── Types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct AdviceOnDetectionRequest {
    detection_id: String,
    prescription: String,
    medicine_id:  Option<String>,
}

#[derive(Deserialize)]
struct AdviceOnMedicineRequest {
    medicine_id:  String,
    prescription: String,
}

#[derive(Deserialize)]
struct UpdateAdviceRequest {
    prescription: Option<String>,
    medicine_id:  Option<String>,
}

/// Advice row joined with its agronomist and medicine names.
#[derive(Serialize, sqlx::FromRow)]
struct AdviceView {
    id:              String,
    agronomist_id:   String,
    agronomist_name: String,
    detection_id:    Option<String>,
    medicine_id:     Option<String>,
    medicine_name:   Option<String>,
    prescription:    String,
    created_at:      NaiveDateTime,
    updated_at:      NaiveDateTime,
}

const ADVICE_SELECT: &str = "SELECT adv.id, adv.agronomist_id, ag.name AS agronomist_name,
        adv.detection_id, adv.medicine_id, m.name AS medicine_name,
        adv.prescription, adv.created_at, adv.updated_at
 FROM advices adv
 JOIN agronomists ag ON ag.id = adv.agronomist_id
 LEFT JOIN medicines m ON m.id = adv.medicine_id";

// ── Helpers ───────────────────────────────────────────────────

fn agronomist_id_of(user: &AuthUser) -> AppResult<&str> {
    user.agronomist_id.as_deref().ok_or(AppError::Forbidden)
}

async fn load_view(pool: &Db, id: &str) -> AppResult<AdviceView> {
    sqlx::query_as::<_, AdviceView>(&format!("{ADVICE_SELECT} WHERE adv.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)
}

/// Notify the farmer behind a detection that new advice is available.
async fn notify_detection_farmer(pool: &Db, detection_id: &str) {
    let lookup: Result<Option<String>, sqlx::Error> = sqlx::query_scalar(
        "SELECT f.user_id
         FROM detections det
         JOIN farmers f ON f.id = det.farmer_id
         WHERE det.id = ?",
    )
    .bind(detection_id)
    .fetch_optional(pool)
    .await;

    match lookup {
        Ok(Some(user_id)) => {
            let result = notify::notify_users(
                pool,
                std::slice::from_ref(&user_id),
                "New Advice Received",
                "An agronomist has posted advice for one of your detections.",
            )
            .await;
            if let Err(err) = result {
                tracing::warn!(detection_id, error = %err, "Advice fan-out failed");
            }
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(detection_id, error = %err, "Advice fan-out failed");
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────

/// POST /advice/on-detection — advise on a specific detection.
async fn create_advice_on_detection(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    axum::Json(body): axum::Json<AdviceOnDetectionRequest>,
) -> AppResult<impl IntoResponse> {
    let agronomist_id = agronomist_id_of(&user)?.to_owned();
    let pool = &state.pool;

    if body.prescription.trim().is_empty() {
        return Err(AppError::BadRequest("A prescription is required".into()));
    }

    let detection_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM detections WHERE id = ?)")
            .bind(&body.detection_id)
            .fetch_one(pool)
            .await?;
    if !detection_exists {
        return Err(AppError::NotFound);
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO advices (id, agronomist_id, detection_id, medicine_id, prescription)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&agronomist_id)
    .bind(&body.detection_id)
    .bind(&body.medicine_id)
    .bind(body.prescription.trim())
    .execute(pool)
    .await?;

    notify_detection_farmer(pool, &body.detection_id).await;

    let view = load_view(pool, &id).await?;
    Ok(ApiResponse::created("Advice created successfully", view))
}

/// POST /advice/on-medicine — general advice attached to a medicine.
async fn create_advice_on_medicine(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    axum::Json(body): axum::Json<AdviceOnMedicineRequest>,
) -> AppResult<impl IntoResponse> {
    let agronomist_id = agronomist_id_of(&user)?.to_owned();
    let pool = &state.pool;

    if body.prescription.trim().is_empty() {
        return Err(AppError::BadRequest("A prescription is required".into()));
    }

    let medicine_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM medicines WHERE id = ?)")
            .bind(&body.medicine_id)
            .fetch_one(pool)
            .await?;
    if !medicine_exists {
        return Err(AppError::NotFound);
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO advices (id, agronomist_id, medicine_id, prescription)
         VALUES (?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&agronomist_id)
    .bind(&body.medicine_id)
    .bind(body.prescription.trim())
    .execute(pool)
    .await?;

    let view = load_view(pool, &id).await?;
    Ok(ApiResponse::created("Advice created successfully", view))
}

/// GET /advice
async fn get_all_advice(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rows = sqlx::query_as::<_, AdviceView>(&format!(
        "{ADVICE_SELECT} ORDER BY adv.created_at DESC"
    ))
    .fetch_all(&state.pool)
    .await?;
    Ok(ApiResponse::success("Advice retrieved successfully", rows))
}

/// GET /advice/{id}
async fn get_advice_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let view = load_view(&state.pool, &id).await?;
    Ok(ApiResponse::success("Advice retrieved successfully", view))
}

/// GET /advice/detection/{detection_id} — all advice on one detection.
async fn get_advice_for_detection(
    State(state): State<AppState>,
    Path(detection_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let rows = sqlx::query_as::<_, AdviceView>(&format!(
        "{ADVICE_SELECT} WHERE adv.detection_id = ? ORDER BY adv.created_at DESC"
    ))
    .bind(&detection_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(ApiResponse::success("Advice retrieved successfully", rows))
}

/// PUT /advice/{id} — only the authoring agronomist may edit.
async fn update_advice(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    axum::Json(body): axum::Json<UpdateAdviceRequest>,
) -> AppResult<impl IntoResponse> {
    let agronomist_id = agronomist_id_of(&user)?.to_owned();
    let pool = &state.pool;

    let author_id: String = sqlx::query_scalar("SELECT agronomist_id FROM advices WHERE id = ?")
        .bind(&id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;
    if author_id != agronomist_id {
        return Err(AppError::Forbidden);
    }

    if let Some(ref prescription) = body.prescription {
        if prescription.trim().is_empty() {
            return Err(AppError::BadRequest("A prescription cannot be empty".into()));
        }
    }

    sqlx::query(
        "UPDATE advices SET
            prescription = COALESCE(?, prescription),
            medicine_id  = COALESCE(?, medicine_id)
         WHERE id = ?",
    )
    .bind(body.prescription.as_ref().map(|p| p.trim().to_owned()))
    .bind(&body.medicine_id)
    .bind(&id)
    .execute(pool)
    .await?;

    let view = load_view(pool, &id).await?;
    Ok(ApiResponse::success("Advice updated successfully", view))
}

/// DELETE /advice/{id}
async fn delete_advice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let affected = sqlx::query("DELETE FROM advices WHERE id = ?")
        .bind(&id)
        .execute(&state.pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success("Advice deleted successfully", ()))
}
