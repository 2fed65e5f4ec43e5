//! `/statistics` routes — role-scoped dashboard endpoints.
//!
//! The role guard runs before any aggregation query is issued.

use axum::{
    extract::{Extension, State},
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::{
    errors::{AppError, AppResult},
    middleware::{
        auth_guard::AuthUser,
        role_guard::{require_admin, require_agronomist, require_farmer},
    },
    response::ApiResponse,
    services::statistics,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/statistics/farmer",
            get(farmer_statistics).route_layer(middleware::from_fn(require_farmer)),
        )
        .route(
            "/statistics/agronomist",
            get(agronomist_statistics).route_layer(middleware::from_fn(require_agronomist)),
        )
        .route(
            "/statistics/admin",
            get(admin_statistics).route_layer(middleware::from_fn(require_admin)),
        )
}

/// GET /statistics/farmer
async fn farmer_statistics(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let farmer_id = user.farmer_id.as_deref().ok_or(AppError::Forbidden)?;
    let dashboard = statistics::farmer_dashboard(&state.pool, farmer_id, &user.user_id).await?;
    Ok(ApiResponse::success("Farmer statistics retrieved successfully", dashboard))
}

/// GET /statistics/agronomist
async fn agronomist_statistics(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let agronomist_id = user.agronomist_id.as_deref().ok_or(AppError::Forbidden)?;
    let dashboard =
        statistics::agronomist_dashboard(&state.pool, agronomist_id, &user.user_id).await?;
    Ok(ApiResponse::success(
        "Agronomist statistics retrieved successfully",
        dashboard,
    ))
}

/// GET /statistics/admin
async fn admin_statistics(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let dashboard = statistics::admin_dashboard(&state.pool).await?;
    Ok(ApiResponse::success("Admin statistics retrieved successfully", dashboard))
}
