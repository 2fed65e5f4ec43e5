//! `/detect` routes — leaf-image detections.
//!
//! A detection is either produced by the classification oracle from an
//! uploaded image, or recorded manually with a known disease name. Both
//! paths find-or-create the disease row by name.

use axum::{
    extract::{Extension, Multipart, Path, State},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::{
    db::Db,
    errors::{AppError, AppResult},
    middleware::{auth_guard::AuthUser, role_guard::require_farmer},
    response::ApiResponse,
    services::classifier,
    state::AppState,
};

const DETECTION_DIR: &str = "uploads/detections";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/detect", get(get_all_detections))
        .route("/detect/my", get(get_my_detections))
        .route("/detect/{id}", get(get_detection_by_id))
        .route("/detect/{id}", delete(delete_detection))
        .merge(
            Router::new()
                .route("/detect", post(detect))
                .route("/detect/manual", post(detect_manual))
                .route_layer(middleware::from_fn(require_farmer)),
        )
}

// ── Types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ManualDetectionRequest {
    image_url:    Option<String>,
    disease_name: String,
    confidence:   f64,
    latitude:     Option<f64>,
    longitude:    Option<f64>,
}

/// Detection row joined with its disease name, the shape every read
/// endpoint returns.
#[derive(Serialize, sqlx::FromRow)]
struct DetectionView {
    id:           String,
    farmer_id:    String,
    disease_id:   String,
    disease_name: String,
    image:        Option<String>,
    confidence:   f64,
    latitude:     Option<f64>,
    longitude:    Option<f64>,
    detected_at:  NaiveDateTime,
}

const DETECTION_SELECT: &str = "SELECT det.id, det.farmer_id, det.disease_id,
        d.name AS disease_name, det.image, det.confidence,
        det.latitude, det.longitude, det.detected_at
 FROM detections det
 JOIN diseases d ON d.id = det.disease_id";

// ── Helpers ───────────────────────────────────────────────────

/// Look the disease up by name (case-insensitive); create a stub row if the
/// oracle reports a label we have no reference data for yet.
async fn find_or_create_disease(pool: &Db, name: &str) -> AppResult<String> {
    let existing: Option<String> =
        sqlx::query_scalar("SELECT id FROM diseases WHERE LOWER(name) = LOWER(?) LIMIT 1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO diseases (id, name, description) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind("Auto-generated from model")
        .execute(pool)
        .await?;
    Ok(id)
}

async fn insert_detection(
    pool: &Db,
    farmer_id: &str,
    disease_id: &str,
    image: Option<&str>,
    confidence: f64,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> AppResult<DetectionView> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO detections (id, farmer_id, disease_id, image, confidence, latitude, longitude)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(farmer_id)
    .bind(disease_id)
    .bind(image)
    .bind(confidence)
    .bind(latitude)
    .bind(longitude)
    .execute(pool)
    .await?;

    let view = sqlx::query_as::<_, DetectionView>(&format!("{DETECTION_SELECT} WHERE det.id = ?"))
        .bind(&id)
        .fetch_one(pool)
        .await?;
    Ok(view)
}

fn farmer_id_of(user: &AuthUser) -> AppResult<&str> {
    user.farmer_id.as_deref().ok_or(AppError::Forbidden)
}

/// The disease name on the manual path is required and passed through
/// trimmed but otherwise untouched; matching happens case-insensitively
/// against the stored reference rows.
fn manual_disease_name(raw: &str) -> AppResult<&str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("disease_name is required".into()));
    }
    Ok(name)
}

// ── Handlers ──────────────────────────────────────────────────

/// POST /detect — multipart leaf image, classified by the external oracle.
async fn detect(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let farmer_id = farmer_id_of(&user)?.to_owned();
    let pool = &state.pool;

    let mut image: Option<(String, Vec<u8>)> = None;
    let mut latitude: Option<f64> = None;
    let mut longitude: Option<f64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("image") => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_owned())
                    .unwrap_or_else(|| "leaf.jpg".into());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                image = Some((filename, bytes.to_vec()));
            }
            Some("latitude") => {
                let text = field.text().await.map_err(|e| AppError::BadRequest(e.to_string()))?;
                latitude = Some(text.parse().map_err(|_| {
                    AppError::BadRequest("latitude must be a number".into())
                })?);
            }
            Some("longitude") => {
                let text = field.text().await.map_err(|e| AppError::BadRequest(e.to_string()))?;
                longitude = Some(text.parse().map_err(|_| {
                    AppError::BadRequest("longitude must be a number".into())
                })?);
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        image.ok_or_else(|| AppError::BadRequest("An image file is required".into()))?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("The image file is empty".into()));
    }

    let prediction = classifier::classify_image(&state.config, &filename, bytes.clone()).await?;
    let disease_id = find_or_create_disease(pool, &prediction.disease_name).await?;

    fs::create_dir_all(DETECTION_DIR)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    let ext = std::path::Path::new(&filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg")
        .to_lowercase();
    let disk_path = format!("{DETECTION_DIR}/{}.{ext}", Uuid::new_v4());
    fs::write(&disk_path, &bytes)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    let view = insert_detection(
        pool,
        &farmer_id,
        &disease_id,
        Some(&format!("/{disk_path}")),
        prediction.confidence,
        latitude,
        longitude,
    )
    .await?;

    Ok(ApiResponse::created("Detection recorded successfully", view))
}

/// POST /detect/manual — record a detection without running the oracle.
async fn detect_manual(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    axum::Json(body): axum::Json<ManualDetectionRequest>,
) -> AppResult<impl IntoResponse> {
    let farmer_id = farmer_id_of(&user)?.to_owned();
    let pool = &state.pool;

    let disease_name = manual_disease_name(&body.disease_name)?;
    let disease_id = find_or_create_disease(pool, disease_name).await?;
    let view = insert_detection(
        pool,
        &farmer_id,
        &disease_id,
        body.image_url.as_deref(),
        body.confidence,
        body.latitude,
        body.longitude,
    )
    .await?;

    Ok(ApiResponse::created("Detection recorded successfully", view))
}

/// GET /detect — every detection, newest first.
async fn get_all_detections(
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let rows = sqlx::query_as::<_, DetectionView>(&format!(
        "{DETECTION_SELECT} ORDER BY det.detected_at DESC"
    ))
    .fetch_all(&state.pool)
    .await?;
    Ok(ApiResponse::success("Detections retrieved successfully", rows))
}

/// GET /detect/my — the calling farmer's detections.
async fn get_my_detections(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let farmer_id = farmer_id_of(&user)?;
    let rows = sqlx::query_as::<_, DetectionView>(&format!(
        "{DETECTION_SELECT} WHERE det.farmer_id = ? ORDER BY det.detected_at DESC"
    ))
    .bind(farmer_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(ApiResponse::success("Detections retrieved successfully", rows))
}

/// GET /detect/{id}
async fn get_detection_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let row = sqlx::query_as::<_, DetectionView>(&format!("{DETECTION_SELECT} WHERE det.id = ?"))
        .bind(&id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Detection retrieved successfully", row))
}

/// DELETE /detect/{id} — owner farmer, agronomist or admin.
async fn delete_detection(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    use crate::models::UserRole;
    let pool = &state.pool;

    let owner_farmer_id: String =
        sqlx::query_scalar("SELECT farmer_id FROM detections WHERE id = ?")
            .bind(&id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::NotFound)?;

    let is_owner = user.farmer_id.as_deref() == Some(owner_farmer_id.as_str());
    let is_staff = matches!(user.role, UserRole::Agronomist | UserRole::Admin);
    if !is_owner && !is_staff {
        return Err(AppError::Forbidden);
    }

    sqlx::query("DELETE FROM detections WHERE id = ?")
        .bind(&id)
        .execute(pool)
        .await?;

    Ok(ApiResponse::success("Detection deleted successfully", ()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_request_carries_name_and_confidence_through() {
        let body: ManualDetectionRequest = serde_json::from_str(
            r#"{"disease_name": "Tomato___Early_blight", "confidence": 0.87}"#,
        )
        .unwrap();
        assert_eq!(manual_disease_name(&body.disease_name).unwrap(), "Tomato___Early_blight");
        assert_eq!(body.confidence, 0.87);
        assert!(body.image_url.is_none());
        assert!(body.latitude.is_none());
    }

    #[test]
    fn manual_disease_name_is_trimmed() {
        assert_eq!(manual_disease_name("  Tomato___healthy ").unwrap(), "Tomato___healthy");
    }

    #[test]
    fn blank_disease_name_is_rejected() {
        assert!(matches!(manual_disease_name("   "), Err(AppError::BadRequest(_))));
        assert!(matches!(manual_disease_name(""), Err(AppError::BadRequest(_))));
    }
}
