//! Role-based authorization guards.
//!
//! Each guard reads the `AuthUser` extension injected by `require_auth` and
//! rejects with 403 before the wrapped handler (and its queries) ever runs.

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::middleware::auth_guard::AuthUser;
use crate::models::UserRole;

fn admin_allowed(role: UserRole) -> bool {
    role == UserRole::Admin
}

fn agronomist_allowed(role: UserRole) -> bool {
    role == UserRole::Agronomist
}

fn staff_allowed(role: UserRole) -> bool {
    matches!(role, UserRole::Agronomist | UserRole::Admin)
}

fn farmer_allowed(role: UserRole) -> bool {
    role == UserRole::Farmer
}

/// Middleware: require the `ADMIN` role.
pub async fn require_admin(
    Extension(user): Extension<AuthUser>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !admin_allowed(user.role) {
        return Err(AppError::Forbidden);
    }
    Ok(next.run(req).await)
}

/// Middleware: require the `AGRONOMIST` role.
pub async fn require_agronomist(
    Extension(user): Extension<AuthUser>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !agronomist_allowed(user.role) {
        return Err(AppError::Forbidden);
    }
    Ok(next.run(req).await)
}

/// Middleware: require the `AGRONOMIST` or `ADMIN` role.
pub async fn require_agronomist_or_admin(
    Extension(user): Extension<AuthUser>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !staff_allowed(user.role) {
        return Err(AppError::Forbidden);
    }
    Ok(next.run(req).await)
}

/// Middleware: require the `FARMER` role.
pub async fn require_farmer(
    Extension(user): Extension<AuthUser>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !farmer_allowed(user.role) {
        return Err(AppError::Forbidden);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_gate_rejects_every_other_role() {
        assert!(admin_allowed(UserRole::Admin));
        for role in [
            UserRole::Farmer,
            UserRole::Agronomist,
            UserRole::Developer,
            UserRole::Moderator,
        ] {
            assert!(!admin_allowed(role), "{role} must not pass the admin gate");
        }
    }

    #[test]
    fn staff_gate_admits_agronomist_and_admin_only() {
        assert!(staff_allowed(UserRole::Agronomist));
        assert!(staff_allowed(UserRole::Admin));
        assert!(!staff_allowed(UserRole::Farmer));
        assert!(!staff_allowed(UserRole::Support));
    }

    #[test]
    fn single_role_gates_match_exactly() {
        assert!(farmer_allowed(UserRole::Farmer));
        assert!(!farmer_allowed(UserRole::Admin));
        assert!(agronomist_allowed(UserRole::Agronomist));
        assert!(!agronomist_allowed(UserRole::Farmer));
    }
}
