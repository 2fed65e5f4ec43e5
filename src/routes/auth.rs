//! `/auth` routes — login, signup, profile, password flows and user admin.

use axum::{
    extract::{Extension, Multipart, Path, State},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tokio::fs;
use uuid::Uuid;
use validator::ValidateEmail;

use crate::{
    auth::{
        email::send_password_reset_otp, generate_otp, generate_token, hash_password,
        otp_is_valid, token_hash, verify_password,
    },
    db::Db,
    errors::{AppError, AppResult},
    middleware::{auth_guard::AuthUser, role_guard::require_admin},
    models::{RoleProfile, User, UserPublic, UserRole},
    response::ApiResponse,
    state::AppState,
};

const SESSION_DAYS: i64 = 30;

/// Directory where uploaded profile pictures land (blob-store stand-in).
const AVATAR_DIR: &str = "uploads/avatars";

// ── Request / response types ──────────────────────────────────

#[derive(Deserialize)]
struct SignupRequest {
    username: Option<String>,
    email:    String,
    password: String,
    role:     Option<String>,
    region_id: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email:    String,
    password: String,
}

#[derive(Deserialize)]
struct ChangePasswordRequest {
    current_password: String,
    new_password:     String,
}

#[derive(Deserialize)]
struct ForgetPasswordRequest {
    email: String,
}

#[derive(Deserialize)]
struct ResetPasswordRequest {
    email:        String,
    otp:          String,
    new_password: String,
}

#[derive(Deserialize)]
struct ChangeRoleRequest {
    role: String,
}

#[derive(Serialize)]
struct AuthPayload {
    access_token: String,
    user:         UserPublic,
}

// ── Routers ───────────────────────────────────────────────────

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/login",  post(login))
        .route("/auth/signup", post(signup))
}

pub fn router() -> Router<AppState> {
    use axum::middleware;
    // require_admin reads Extension<AuthUser> (injected by require_auth in
    // mod.rs); it does not need AppState, so plain from_fn is sufficient.
    let admin_guard = middleware::from_fn(require_admin);
    Router::new()
        .route("/auth/me",                   get(me))
        .route("/auth/getAllUsers",          get(get_all_users))
        .route("/auth/updateUserById/{id}",  patch(update_user_by_id))
        .route("/auth/change",               post(change_password))
        .route("/auth/forget",               post(forget_password))
        .route("/auth/reset",                post(reset_password))
        .merge(
            Router::new()
                .route("/auth/changeUserRole/{id}", patch(change_user_role))
                .route("/auth/deleteUserById/{id}", delete(delete_user_by_id))
                .route("/auth/user/{id}",           get(get_user_by_id))
                .route_layer(admin_guard),
        )
}

// ── Projection helpers ────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id:        String,
    region_id: Option<String>,
}

/// Load the public shape of a user: base fields plus the role-conditioned
/// sub-profile. The single projection every user-returning endpoint uses.
pub async fn load_user_public(pool: &Db, user_id: &str) -> AppResult<UserPublic> {
    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let profile = match user.role {
        UserRole::Farmer => {
            sqlx::query_as::<_, ProfileRow>("SELECT id, region_id FROM farmers WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(pool)
                .await?
                .map(|row| RoleProfile::Farmer { farmer_id: row.id, region_id: row.region_id })
                .unwrap_or(RoleProfile::None)
        }
        UserRole::Agronomist => {
            sqlx::query_as::<_, ProfileRow>(
                "SELECT id, region_id FROM agronomists WHERE user_id = ?",
            )
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .map(|row| RoleProfile::Agronomist { agronomist_id: row.id, region_id: row.region_id })
            .unwrap_or(RoleProfile::None)
        }
        _ => RoleProfile::None,
    };

    Ok(UserPublic {
        id:              user.id,
        username:        user.username,
        email:           user.email,
        role:            user.role,
        profile_picture: user.profile_picture,
        created_at:      user.created_at,
        updated_at:      user.updated_at,
        profile,
    })
}

/// Create a bearer session for a user and return the raw token.
async fn create_session(pool: &Db, user_id: &str) -> AppResult<String> {
    let token = generate_token();
    let expires_at = (Utc::now() + Duration::days(SESSION_DAYS)).naive_utc();

    sqlx::query(
        "INSERT INTO user_sessions (id, user_id, token_hash, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(token_hash(&token))
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(token)
}

// ── Handlers ──────────────────────────────────────────────────

/// POST /auth/signup — create a user plus the sub-profile matching its role.
async fn signup(
    State(state): State<AppState>,
    axum::Json(body): axum::Json<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    if !body.email.validate_email() {
        return Err(AppError::BadRequest("A valid email address is required".into()));
    }
    if body.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }

    let email_taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(&body.email)
            .fetch_one(pool)
            .await?;
    if email_taken {
        return Err(AppError::Conflict("Email is already in use".into()));
    }

    let role = match body.role.as_deref() {
        Some(raw) => UserRole::from_str(raw).map_err(AppError::BadRequest)?,
        None => UserRole::Farmer,
    };

    let hash = hash_password(&body.password)?;
    let user_id = Uuid::new_v4().to_string();

    let insert_result = sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, role, is_verified)
         VALUES (?, ?, ?, ?, ?, 1)",
    )
    .bind(&user_id)
    .bind(&body.username)
    .bind(&body.email)
    .bind(hash)
    .bind(role)
    .execute(pool)
    .await;

    // Guard against duplicate key (race condition / double-submit)
    if let Err(sqlx::Error::Database(ref db_err)) = insert_result {
        if db_err.code().as_deref() == Some("23000") {
            return Err(AppError::Conflict("Email is already in use".into()));
        }
    }
    insert_result?;

    // Exactly one sub-profile, matching the role.
    match role {
        UserRole::Farmer => {
            sqlx::query("INSERT INTO farmers (id, user_id, region_id) VALUES (?, ?, ?)")
                .bind(Uuid::new_v4().to_string())
                .bind(&user_id)
                .bind(&body.region_id)
                .execute(pool)
                .await?;
        }
        UserRole::Agronomist => {
            let name = body.username.clone().unwrap_or_else(|| "AGRONOMIST".into());
            sqlx::query("INSERT INTO agronomists (id, user_id, name, region_id) VALUES (?, ?, ?, ?)")
                .bind(Uuid::new_v4().to_string())
                .bind(&user_id)
                .bind(name)
                .bind(&body.region_id)
                .execute(pool)
                .await?;
        }
        _ => {}
    }

    let token = create_session(pool, &user_id).await?;
    let user = load_user_public(pool, &user_id).await?;

    Ok(ApiResponse::created(
        "User registered successfully",
        AuthPayload { access_token: token, user },
    ))
}

/// POST /auth/login — email + password, returns a bearer token.
async fn login(
    State(state): State<AppState>,
    axum::Json(body): axum::Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    #[derive(sqlx::FromRow)]
    struct LoginRow {
        id:            String,
        password_hash: String,
    }

    let row = sqlx::query_as::<_, LoginRow>(
        "SELECT id, password_hash FROM users WHERE email = ? LIMIT 1",
    )
    .bind(&body.email)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;

    verify_password(&body.password, &row.password_hash)?;

    sqlx::query("UPDATE users SET last_login = UTC_TIMESTAMP() WHERE id = ?")
        .bind(&row.id)
        .execute(pool)
        .await?;

    let token = create_session(pool, &row.id).await?;
    let user = load_user_public(pool, &row.id).await?;

    Ok(ApiResponse::success(
        "User logged in successfully",
        AuthPayload { access_token: token, user },
    ))
}

/// GET /auth/me — the caller's own profile.
async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let profile = load_user_public(&state.pool, &user.user_id).await?;
    Ok(ApiResponse::success("User profile retrieved successfully", profile))
}

/// GET /auth/getAllUsers — every user, projected.
async fn get_all_users(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;
    let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM users ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;

    let mut users = Vec::with_capacity(ids.len());
    for id in ids {
        users.push(load_user_public(pool, &id).await?);
    }

    Ok(ApiResponse::success("Users retrieved successfully", users))
}

/// GET /auth/user/{id} — admin-only lookup.
async fn get_user_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user = load_user_public(&state.pool, &id).await?;
    Ok(ApiResponse::success("User retrieved successfully", user))
}

/// PATCH /auth/updateUserById/{id} — multipart profile update. Callers may
/// update themselves; admins may update anyone.
async fn update_user_by_id(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    if caller.user_id != id && caller.role != UserRole::Admin {
        return Err(AppError::Forbidden);
    }
    let pool = &state.pool;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(&id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(AppError::NotFound);
    }

    let mut username: Option<String> = None;
    let mut email: Option<String> = None;
    let mut picture: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("username") => {
                username = Some(field.text().await.map_err(|e| AppError::BadRequest(e.to_string()))?);
            }
            Some("email") => {
                email = Some(field.text().await.map_err(|e| AppError::BadRequest(e.to_string()))?);
            }
            Some("profile_picture") => {
                let orig_name = field
                    .file_name()
                    .map(|s| s.to_owned())
                    .unwrap_or_else(|| "avatar".into());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                picture = Some((orig_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    if let Some(ref email) = email {
        if !email.validate_email() {
            return Err(AppError::BadRequest("A valid email address is required".into()));
        }
        sqlx::query("UPDATE users SET email = ? WHERE id = ?")
            .bind(email)
            .bind(&id)
            .execute(pool)
            .await?;
    }
    if let Some(ref username) = username {
        sqlx::query("UPDATE users SET username = ? WHERE id = ?")
            .bind(username)
            .bind(&id)
            .execute(pool)
            .await?;
    }
    if let Some((orig_name, bytes)) = picture {
        let ext = PathBuf::from(&orig_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin")
            .to_lowercase();
        if !matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "gif" | "webp") {
            return Err(AppError::BadRequest("Unsupported image type".into()));
        }

        fs::create_dir_all(AVATAR_DIR)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        let filename = format!("{}.{ext}", Uuid::new_v4());
        let disk_path = format!("{AVATAR_DIR}/{filename}");
        fs::write(&disk_path, &bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

        sqlx::query("UPDATE users SET profile_picture = ? WHERE id = ?")
            .bind(format!("/{disk_path}"))
            .bind(&id)
            .execute(pool)
            .await?;
    }

    let user = load_user_public(pool, &id).await?;
    Ok(ApiResponse::success("User updated successfully", user))
}

/// POST /auth/change — change the caller's own password.
async fn change_password(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    axum::Json(body): axum::Json<ChangePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    let stored_hash: String =
        sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
            .bind(&caller.user_id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::NotFound)?;

    verify_password(&body.current_password, &stored_hash)?;

    if body.new_password.is_empty() {
        return Err(AppError::BadRequest("New password is required".into()));
    }

    let hash = hash_password(&body.new_password)?;
    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(hash)
        .bind(&caller.user_id)
        .execute(pool)
        .await?;

    Ok(ApiResponse::success("Password changed successfully", ()))
}

/// POST /auth/forget — issue a one-time password and email it.
async fn forget_password(
    State(state): State<AppState>,
    axum::Json(body): axum::Json<ForgetPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    let user_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(&body.email)
            .fetch_one(pool)
            .await?;
    if !user_exists {
        return Err(AppError::NotFound);
    }

    let (otp, expires_at) = generate_otp();
    sqlx::query("UPDATE users SET otp = ?, otp_expires_at = ? WHERE email = ?")
        .bind(&otp)
        .bind(expires_at)
        .bind(&body.email)
        .execute(pool)
        .await?;

    send_password_reset_otp(&state.config, &body.email, &otp).await?;

    Ok(ApiResponse::success(
        "OTP sent successfully! Please check your email.",
        (),
    ))
}

/// POST /auth/reset — verify the OTP and set a new password.
async fn reset_password(
    State(state): State<AppState>,
    axum::Json(body): axum::Json<ResetPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;

    #[derive(sqlx::FromRow)]
    struct OtpRow {
        id:             String,
        otp:            Option<String>,
        otp_expires_at: Option<chrono::NaiveDateTime>,
    }

    let row = sqlx::query_as::<_, OtpRow>(
        "SELECT id, otp, otp_expires_at FROM users WHERE email = ? LIMIT 1",
    )
    .bind(&body.email)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;

    let now = Utc::now().naive_utc();
    if !otp_is_valid(row.otp.as_deref(), row.otp_expires_at, &body.otp, now) {
        return Err(AppError::BadRequest("Invalid or expired OTP".into()));
    }

    let hash = hash_password(&body.new_password)?;
    sqlx::query(
        "UPDATE users SET password_hash = ?, otp = NULL, otp_expires_at = NULL WHERE id = ?",
    )
    .bind(hash)
    .bind(&row.id)
    .execute(pool)
    .await?;

    Ok(ApiResponse::success("Password reset successfully", ()))
}

/// PATCH /auth/changeUserRole/{id} — admin-only role change. Creates the
/// missing sub-profile when switching to FARMER or AGRONOMIST.
async fn change_user_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    axum::Json(body): axum::Json<ChangeRoleRequest>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;
    let role = UserRole::from_str(&body.role).map_err(AppError::BadRequest)?;

    let username: Option<String> =
        sqlx::query_scalar("SELECT username FROM users WHERE id = ?")
            .bind(&id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::NotFound)?;

    sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role)
        .bind(&id)
        .execute(pool)
        .await?;

    match role {
        UserRole::Farmer => {
            let has_profile: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM farmers WHERE user_id = ?)")
                    .bind(&id)
                    .fetch_one(pool)
                    .await?;
            if !has_profile {
                sqlx::query("INSERT INTO farmers (id, user_id) VALUES (?, ?)")
                    .bind(Uuid::new_v4().to_string())
                    .bind(&id)
                    .execute(pool)
                    .await?;
            }
        }
        UserRole::Agronomist => {
            let has_profile: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM agronomists WHERE user_id = ?)")
                    .bind(&id)
                    .fetch_one(pool)
                    .await?;
            if !has_profile {
                sqlx::query("INSERT INTO agronomists (id, user_id, name) VALUES (?, ?, ?)")
                    .bind(Uuid::new_v4().to_string())
                    .bind(&id)
                    .bind(username.unwrap_or_else(|| "AGRONOMIST".into()))
                    .execute(pool)
                    .await?;
            }
        }
        _ => {}
    }

    let user = load_user_public(pool, &id).await?;
    Ok(ApiResponse::success(
        &format!("User role updated to {role}"),
        user,
    ))
}

/// DELETE /auth/deleteUserById/{id} — admin-only.
async fn delete_user_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let affected = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&id)
        .execute(&state.pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success("User deleted successfully", ()))
}
