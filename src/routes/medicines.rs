//! `/medecines` routes — medicine CRUD with change fan-out.
//!
//! The path segment keeps the original public API spelling. A new medicine
//! notifies farmers affected by its linked diseases; an update notifies them
//! when a watched field (description, usage instructions, disease links)
//! actually changed.

use axum::{
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    db::Db,
    errors::{AppError, AppResult},
    middleware::role_guard::require_agronomist_or_admin,
    models::Medicine,
    response::ApiResponse,
    services::{notify, watch},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/medecines", get(get_all_medicines))
        .route("/medecines/{id}", get(get_medicine_by_id))
        .route("/medecines/by-disease/{disease_id}", get(get_medicines_by_disease))
        .merge(
            Router::new()
                .route("/medecines", post(create_medicine))
                .route("/medecines/{id}", put(update_medicine))
                .route("/medecines/{id}", delete(delete_medicine))
                .route_layer(middleware::from_fn(require_agronomist_or_admin)),
        )
}

// ── Types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CreateMedicineRequest {
    name:        String,
    description: Option<String>,
    #[serde(default)]
    usage_instructions: Vec<String>,
    /// Disease ids to link.
    #[serde(default)]
    diseases: Vec<String>,
}

#[derive(Deserialize)]
struct UpdateMedicineRequest {
    name:               Option<String>,
    description:        Option<String>,
    usage_instructions: Option<Vec<String>>,
    /// Full replacement set of linked disease ids.
    diseases:           Option<Vec<String>>,
}

/// Medicine plus its linked disease names.
#[derive(Serialize)]
struct MedicineView {
    #[serde(flatten)]
    medicine: Medicine,
    diseases: Vec<DiseaseRef>,
}

#[derive(Serialize, sqlx::FromRow)]
struct DiseaseRef {
    id:   String,
    name: String,
}

// ── Helpers ───────────────────────────────────────────────────

/// Id of the medicine already holding this name, case-insensitively.
async fn medicine_id_by_name(pool: &Db, name: &str) -> AppResult<Option<String>> {
    let id = sqlx::query_scalar("SELECT id FROM medicines WHERE LOWER(name) = LOWER(?) LIMIT 1")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

/// A name collides when another row already holds it. On update the row being
/// renamed is excluded, so changing only the casing of a medicine's own name
/// goes through.
fn name_collides(existing_id: Option<&str>, own_id: Option<&str>) -> bool {
    match existing_id {
        Some(existing) => own_id != Some(existing),
        None => false,
    }
}

async fn load_medicine(pool: &Db, id: &str) -> AppResult<Medicine> {
    sqlx::query_as::<_, Medicine>("SELECT * FROM medicines WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)
}

async fn linked_diseases(pool: &Db, medicine_id: &str) -> AppResult<Vec<DiseaseRef>> {
    let refs = sqlx::query_as::<_, DiseaseRef>(
        "SELECT d.id, d.name
         FROM disease_medicines dm
         JOIN diseases d ON d.id = dm.disease_id
         WHERE dm.medicine_id = ?
         ORDER BY d.name",
    )
    .bind(medicine_id)
    .fetch_all(pool)
    .await?;
    Ok(refs)
}

async fn load_view(pool: &Db, id: &str) -> AppResult<MedicineView> {
    let medicine = load_medicine(pool, id).await?;
    let diseases = linked_diseases(pool, id).await?;
    Ok(MedicineView { medicine, diseases })
}

async fn replace_links(pool: &Db, medicine_id: &str, disease_ids: &[String]) -> AppResult<()> {
    sqlx::query("DELETE FROM disease_medicines WHERE medicine_id = ?")
        .bind(medicine_id)
        .execute(pool)
        .await?;
    for disease_id in disease_ids {
        sqlx::query(
            "INSERT IGNORE INTO disease_medicines (disease_id, medicine_id) VALUES (?, ?)",
        )
        .bind(disease_id)
        .bind(medicine_id)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Best-effort fan-out to farmers affected by any of the given diseases.
async fn notify_affected_farmers(pool: &Db, disease_ids: &[String], title: &str, message: &str) {
    match notify::farmer_users_for_diseases(pool, disease_ids).await {
        Ok(recipients) => {
            if let Err(err) = notify::notify_users(pool, &recipients, title, message).await {
                tracing::warn!(error = %err, "Medicine fan-out failed");
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "Medicine fan-out failed");
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────

/// POST /medecines — create and notify farmers of the linked diseases.
async fn create_medicine(
    State(state): State<AppState>,
    axum::Json(body): axum::Json<CreateMedicineRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Medicine name is required".into()));
    }
    let existing = medicine_id_by_name(pool, name).await?;
    if name_collides(existing.as_deref(), None) {
        return Err(AppError::Conflict("A medicine with this name already exists".into()));
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO medicines (id, name, description, usage_instructions) VALUES (?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(name)
    .bind(&body.description)
    .bind(Json(&body.usage_instructions))
    .execute(pool)
    .await?;

    replace_links(pool, &id, &body.diseases).await?;

    let view = load_view(pool, &id).await?;

    if !body.diseases.is_empty() {
        let message = format!(
            "A new medicine, {}, is now available for a disease affecting your crops.",
            view.medicine.name,
        );
        notify_affected_farmers(pool, &body.diseases, "New Medicine Added", &message).await;
    }

    Ok(ApiResponse::created("Medicine created successfully", view))
}

/// GET /medecines
async fn get_all_medicines(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;
    let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM medicines ORDER BY name")
        .fetch_all(pool)
        .await?;

    let mut views = Vec::with_capacity(ids.len());
    for id in ids {
        views.push(load_view(pool, &id).await?);
    }
    Ok(ApiResponse::success("Medicines retrieved successfully", views))
}

/// GET /medecines/{id}
async fn get_medicine_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let view = load_view(&state.pool, &id).await?;
    Ok(ApiResponse::success("Medicine retrieved successfully", view))
}

/// GET /medecines/by-disease/{disease_id}
async fn get_medicines_by_disease(
    State(state): State<AppState>,
    Path(disease_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM diseases WHERE id = ?)")
        .bind(&disease_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(AppError::NotFound);
    }

    let medicines = sqlx::query_as::<_, Medicine>(
        "SELECT m.*
         FROM disease_medicines dm
         JOIN medicines m ON m.id = dm.medicine_id
         WHERE dm.disease_id = ?
         ORDER BY m.name",
    )
    .bind(&disease_id)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success("Medicines retrieved successfully", medicines))
}

/// PUT /medecines/{id} — update, replace links if given, then notify when a
/// watched field changed.
async fn update_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    axum::Json(body): axum::Json<UpdateMedicineRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;
    let prior = load_medicine(pool, &id).await?;

    if let Some(ref name) = body.name {
        let existing = medicine_id_by_name(pool, name.trim()).await?;
        if name_collides(existing.as_deref(), Some(&id)) {
            return Err(AppError::Conflict("A medicine with this name already exists".into()));
        }
    }

    let prior_links: Vec<String> = linked_diseases(pool, &id)
        .await?
        .into_iter()
        .map(|d| d.id)
        .collect();

    let update = watch::MedicineUpdate {
        description:        body.description.as_deref(),
        usage_instructions: body.usage_instructions.as_deref(),
        diseases:           body.diseases.as_deref(),
    };
    let changed = watch::medicine_changes(
        prior.description.as_deref(),
        &prior.usage_instructions.0,
        &prior_links,
        &update,
    );

    sqlx::query(
        "UPDATE medicines SET
            name        = COALESCE(?, name),
            description = COALESCE(?, description),
            usage_instructions = COALESCE(?, usage_instructions)
         WHERE id = ?",
    )
    .bind(&body.name)
    .bind(&body.description)
    .bind(body.usage_instructions.as_ref().map(Json))
    .bind(&id)
    .execute(pool)
    .await?;

    if let Some(ref disease_ids) = body.diseases {
        replace_links(pool, &id, disease_ids).await?;
    }

    let view = load_view(pool, &id).await?;

    if !changed.is_empty() {
        // Notify across the union of old and new links so farmers tied to a
        // removed disease still hear about the change.
        let mut affected = prior_links.clone();
        affected.extend(view.diseases.iter().map(|d| d.id.clone()));

        let title = format!("Update on {}", view.medicine.name);
        let message = format!(
            "The medicine information for {} has been updated: {}",
            view.medicine.name,
            changed.join(", "),
        );
        notify_affected_farmers(pool, &affected, &title, &message).await;
    }

    Ok(ApiResponse::success("Medicine updated successfully", view))
}

/// DELETE /medecines/{id}
async fn delete_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let affected = sqlx::query("DELETE FROM medicines WHERE id = ?")
        .bind(&id)
        .execute(&state.pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success("Medicine deleted successfully", ()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taken_name_collides_on_create() {
        assert!(name_collides(Some("med-1"), None));
    }

    #[test]
    fn renaming_over_another_medicine_collides() {
        assert!(name_collides(Some("med-1"), Some("med-2")));
    }

    #[test]
    fn own_name_and_free_names_pass() {
        // Re-casing a medicine's own name is not a collision.
        assert!(!name_collides(Some("med-1"), Some("med-1")));
        assert!(!name_collides(None, None));
        assert!(!name_collides(None, Some("med-1")));
    }
}
