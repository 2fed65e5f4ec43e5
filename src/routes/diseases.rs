//! `/diseases` routes — reference-data CRUD with change fan-out.
//!
//! Updates diff the watched fields against the stored row; when anything
//! watched changed, every farmer with a detection of that disease gets a
//! notification naming the changed fields. Fan-out is best effort and never
//! rolls back the write.

use axum::{
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::Db,
    errors::{AppError, AppResult},
    middleware::role_guard::require_agronomist_or_admin,
    models::Disease,
    response::ApiResponse,
    services::{notify, watch},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/diseases", get(get_all_diseases))
        .route("/diseases/{id}", get(get_disease_by_id))
        .merge(
            Router::new()
                .route("/diseases", post(create_disease))
                .route("/diseases/{id}", put(update_disease))
                .route("/diseases/{id}", delete(delete_disease))
                .route_layer(middleware::from_fn(require_agronomist_or_admin)),
        )
}

// ── Types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CreateDiseaseRequest {
    name:            String,
    scientific_name: Option<String>,
    description:     Option<String>,
    symptoms:        Option<String>,
    severity:        Option<String>,
    prevention:      Option<String>,
    treatment:       Option<String>,
    #[serde(default)]
    medicines:       Vec<String>,
}

#[derive(Deserialize)]
struct UpdateDiseaseRequest {
    name:            Option<String>,
    scientific_name: Option<String>,
    description:     Option<String>,
    symptoms:        Option<String>,
    severity:        Option<String>,
    prevention:      Option<String>,
    treatment:       Option<String>,
}

/// Disease plus its linked medicine names.
#[derive(Serialize)]
struct DiseaseView {
    #[serde(flatten)]
    disease:   Disease,
    medicines: Vec<MedicineRef>,
}

#[derive(Serialize, sqlx::FromRow)]
struct MedicineRef {
    id:   String,
    name: String,
}

// ── Helpers ───────────────────────────────────────────────────

async fn load_disease(pool: &Db, id: &str) -> AppResult<Disease> {
    sqlx::query_as::<_, Disease>("SELECT * FROM diseases WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)
}

async fn load_view(pool: &Db, id: &str) -> AppResult<DiseaseView> {
    let disease = load_disease(pool, id).await?;
    let medicines = sqlx::query_as::<_, MedicineRef>(
        "SELECT m.id, m.name
         FROM disease_medicines dm
         JOIN medicines m ON m.id = dm.medicine_id
         WHERE dm.disease_id = ?
         ORDER BY m.name",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    Ok(DiseaseView { disease, medicines })
}

async fn name_taken(pool: &Db, name: &str, exclude_id: Option<&str>) -> AppResult<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM diseases WHERE LOWER(name) = LOWER(?) AND id <> ?)",
    )
    .bind(name)
    .bind(exclude_id.unwrap_or(""))
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

// ── Handlers ──────────────────────────────────────────────────

/// POST /diseases
async fn create_disease(
    State(state): State<AppState>,
    axum::Json(body): axum::Json<CreateDiseaseRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Disease name is required".into()));
    }
    if name_taken(pool, name, None).await? {
        return Err(AppError::Conflict("A disease with this name already exists".into()));
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO diseases
            (id, name, scientific_name, description, symptoms, severity, prevention, treatment)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(name)
    .bind(&body.scientific_name)
    .bind(&body.description)
    .bind(&body.symptoms)
    .bind(&body.severity)
    .bind(&body.prevention)
    .bind(&body.treatment)
    .execute(pool)
    .await?;

    for medicine_id in &body.medicines {
        sqlx::query(
            "INSERT IGNORE INTO disease_medicines (disease_id, medicine_id) VALUES (?, ?)",
        )
        .bind(&id)
        .bind(medicine_id)
        .execute(pool)
        .await?;
    }

    let view = load_view(pool, &id).await?;
    Ok(ApiResponse::created("Disease created successfully", view))
}

/// GET /diseases
async fn get_all_diseases(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;
    let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM diseases ORDER BY name")
        .fetch_all(pool)
        .await?;

    let mut views = Vec::with_capacity(ids.len());
    for id in ids {
        views.push(load_view(pool, &id).await?);
    }
    Ok(ApiResponse::success("Diseases retrieved successfully", views))
}

/// GET /diseases/{id}
async fn get_disease_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let view = load_view(&state.pool, &id).await?;
    Ok(ApiResponse::success("Disease retrieved successfully", view))
}

/// PUT /diseases/{id} — update, then notify affected farmers when a watched
/// field changed.
async fn update_disease(
    State(state): State<AppState>,
    Path(id): Path<String>,
    axum::Json(body): axum::Json<UpdateDiseaseRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;
    let prior = load_disease(pool, &id).await?;

    if let Some(ref name) = body.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Disease name cannot be empty".into()));
        }
        if name_taken(pool, name, Some(&id)).await? {
            return Err(AppError::Conflict("A disease with this name already exists".into()));
        }
    }

    // Watched-field diff against the stored row, before the write.
    let update = watch::DiseaseUpdate {
        symptoms:        body.symptoms.as_deref(),
        treatment:       body.treatment.as_deref(),
        severity:        body.severity.as_deref(),
        description:     body.description.as_deref(),
        scientific_name: body.scientific_name.as_deref(),
    };
    let changed = watch::disease_changes(&prior, &update);

    sqlx::query(
        "UPDATE diseases SET
            name            = COALESCE(?, name),
            scientific_name = COALESCE(?, scientific_name),
            description     = COALESCE(?, description),
            symptoms        = COALESCE(?, symptoms),
            severity        = COALESCE(?, severity),
            prevention      = COALESCE(?, prevention),
            treatment       = COALESCE(?, treatment)
         WHERE id = ?",
    )
    .bind(body.name.as_ref().map(|n| n.trim().to_owned()))
    .bind(&body.scientific_name)
    .bind(&body.description)
    .bind(&body.symptoms)
    .bind(&body.severity)
    .bind(&body.prevention)
    .bind(&body.treatment)
    .bind(&id)
    .execute(pool)
    .await?;

    let view = load_view(pool, &id).await?;

    if !changed.is_empty() {
        let title = format!("Update on {}", view.disease.name);
        let message = format!(
            "The disease information for {} has been updated: {}",
            view.disease.name,
            changed.join(", "),
        );
        match notify::farmer_users_for_diseases(pool, std::slice::from_ref(&id)).await {
            Ok(recipients) => {
                if let Err(err) = notify::notify_users(pool, &recipients, &title, &message).await {
                    tracing::warn!(disease_id = %id, error = %err, "Disease update fan-out failed");
                }
            }
            Err(err) => {
                tracing::warn!(disease_id = %id, error = %err, "Disease update fan-out failed");
            }
        }
    }

    Ok(ApiResponse::success("Disease updated successfully", view))
}

/// DELETE /diseases/{id}
async fn delete_disease(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let affected = sqlx::query("DELETE FROM diseases WHERE id = ?")
        .bind(&id)
        .execute(&state.pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success("Disease deleted successfully", ()))
}
