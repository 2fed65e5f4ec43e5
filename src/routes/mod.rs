use axum::{middleware, Router};
use crate::{
    middleware::auth_guard::require_auth,
    state::AppState,
};

mod advice;
mod auth;
mod detections;
mod diseases;
mod feedback;
mod feedback_response;
mod medicines;
mod notifications;
mod statistics;

/// Build the full `/api` router.
///
/// Login and signup are left unprotected; every other route is wrapped in
/// the bearer-token [`require_auth`] middleware. Role restrictions are
/// applied per-route inside each resource router.
pub fn all_routes(state: AppState) -> Router<AppState> {
    let auth_mw = middleware::from_fn_with_state(state, require_auth);
    Router::new()
        .merge(auth::public_router())
        .merge(
            Router::new()
                .merge(auth::router())
                .merge(detections::router())
                .merge(diseases::router())
                .merge(medicines::router())
                .merge(advice::router())
                .merge(feedback::router())
                .merge(feedback_response::router())
                .merge(notifications::router())
                .merge(statistics::router())
                .route_layer(auth_mw),
        )
}
