#![allow(dead_code)]

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

// ── Users ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id:              String,
    pub username:        Option<String>,
    pub email:           String,
    pub password_hash:   String,
    pub role:            UserRole,
    pub profile_picture: Option<String>,
    pub otp:             Option<String>,
    pub otp_expires_at:  Option<NaiveDateTime>,
    pub is_verified:     bool,
    pub last_login:      Option<NaiveDateTime>,
    pub created_at:      NaiveDateTime,
    pub updated_at:      NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "VARCHAR", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Farmer,
    Agronomist,
    Admin,
    Developer,
    UiUx,
    Moderator,
    Support,
    Researcher,
    DataAnalyst,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Farmer      => "FARMER",
            UserRole::Agronomist  => "AGRONOMIST",
            UserRole::Admin       => "ADMIN",
            UserRole::Developer   => "DEVELOPER",
            UserRole::UiUx        => "UI_UX",
            UserRole::Moderator   => "MODERATOR",
            UserRole::Support     => "SUPPORT",
            UserRole::Researcher  => "RESEARCHER",
            UserRole::DataAnalyst => "DATA_ANALYST",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FARMER"       => Ok(UserRole::Farmer),
            "AGRONOMIST"   => Ok(UserRole::Agronomist),
            "ADMIN"        => Ok(UserRole::Admin),
            "DEVELOPER"    => Ok(UserRole::Developer),
            "UI_UX"        => Ok(UserRole::UiUx),
            "MODERATOR"    => Ok(UserRole::Moderator),
            "SUPPORT"      => Ok(UserRole::Support),
            "RESEARCHER"   => Ok(UserRole::Researcher),
            "DATA_ANALYST" => Ok(UserRole::DataAnalyst),
            other          => Err(format!("Unknown role: {other}")),
        }
    }
}

// ── User projection ──────────────────────────────────────────

/// Role-conditioned sub-profile attached to a user projection. Exactly one
/// variant matches the user's role; the tag makes the single-profile
/// invariant structural instead of two loose optional ids.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RoleProfile {
    Farmer { farmer_id: String, region_id: Option<String> },
    Agronomist { agronomist_id: String, region_id: Option<String> },
    None,
}

/// Public shape of a user, shared by every endpoint that returns one.
/// Never includes the credential hash or the OTP fields.
#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub id:              String,
    pub username:        Option<String>,
    pub email:           String,
    pub role:            UserRole,
    pub profile_picture: Option<String>,
    pub created_at:      NaiveDateTime,
    pub updated_at:      NaiveDateTime,
    pub profile:         RoleProfile,
}

// ── Sub-profiles ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Farmer {
    pub id:         String,
    pub user_id:    String,
    pub region_id:  Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Agronomist {
    pub id:         String,
    pub user_id:    String,
    pub name:       String,
    pub region_id:  Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Region {
    pub id:         String,
    pub name:       String,
    pub latitude:   Option<f64>,
    pub longitude:  Option<f64>,
    pub created_at: NaiveDateTime,
}

// ── Reference entities ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Disease {
    pub id:              String,
    pub name:            String,
    pub scientific_name: Option<String>,
    pub description:     Option<String>,
    pub symptoms:        Option<String>,
    pub severity:        Option<String>,
    pub prevention:      Option<String>,
    pub treatment:       Option<String>,
    pub created_at:      NaiveDateTime,
    pub updated_at:      NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Medicine {
    pub id:                 String,
    pub name:               String,
    pub description:        Option<String>,
    pub usage_instructions: Json<Vec<String>>,
    pub created_at:         NaiveDateTime,
    pub updated_at:         NaiveDateTime,
}

// ── Transactional entities ───────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Detection {
    pub id:          String,
    pub farmer_id:   String,
    pub disease_id:  String,
    pub image:       Option<String>,
    pub confidence:  f64,
    pub latitude:    Option<f64>,
    pub longitude:   Option<f64>,
    pub detected_at: NaiveDateTime,
    pub created_at:  NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Advice {
    pub id:            String,
    pub agronomist_id: String,
    pub detection_id:  Option<String>,
    pub medicine_id:   Option<String>,
    pub prescription:  String,
    pub created_at:    NaiveDateTime,
    pub updated_at:    NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackCategory {
    Accuracy,
    Usability,
    Feature,
    Bug,
    Other,
}

impl FeedbackCategory {
    /// Status a feedback transitions to once it receives a response.
    pub fn resolution_status(&self) -> FeedbackStatus {
        match self {
            FeedbackCategory::Accuracy | FeedbackCategory::Usability => FeedbackStatus::Addressed,
            FeedbackCategory::Feature | FeedbackCategory::Bug        => FeedbackStatus::Resolved,
            FeedbackCategory::Other                                  => FeedbackStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Pending,
    Addressed,
    Resolved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Feedback {
    pub id:           String,
    pub farmer_id:    String,
    pub detection_id: String,
    pub advice_id:    Option<String>,
    pub comment:      String,
    pub category:     FeedbackCategory,
    pub status:       FeedbackStatus,
    pub created_at:   NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedbackResponse {
    pub id:          String,
    pub feedback_id: String,
    pub author_id:   String,
    pub message:     String,
    pub created_at:  NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id:         String,
    pub user_id:    String,
    pub title:      String,
    pub message:    String,
    pub is_read:    bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DiseaseStat {
    pub id:          String,
    pub disease_id:  String,
    pub region_id:   String,
    pub occurrences: i32,
    pub period:      chrono::NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trips_through_str() {
        for role in [
            UserRole::Farmer,
            UserRole::Agronomist,
            UserRole::Admin,
            UserRole::UiUx,
            UserRole::DataAnalyst,
        ] {
            assert_eq!(UserRole::from_str(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(UserRole::from_str("admin").unwrap(), UserRole::Admin);
        assert_eq!(UserRole::from_str("data_analyst").unwrap(), UserRole::DataAnalyst);
        assert!(UserRole::from_str("SUPERUSER").is_err());
    }

    #[test]
    fn response_status_follows_category() {
        assert_eq!(FeedbackCategory::Accuracy.resolution_status(), FeedbackStatus::Addressed);
        assert_eq!(FeedbackCategory::Usability.resolution_status(), FeedbackStatus::Addressed);
        assert_eq!(FeedbackCategory::Feature.resolution_status(), FeedbackStatus::Resolved);
        assert_eq!(FeedbackCategory::Bug.resolution_status(), FeedbackStatus::Resolved);
        assert_eq!(FeedbackCategory::Other.resolution_status(), FeedbackStatus::Rejected);
    }
}
