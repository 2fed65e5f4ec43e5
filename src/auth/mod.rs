pub mod email;
pub mod seed;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, NaiveDateTime, Utc};
use rand::RngExt;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

// ── Password helpers ──────────────────────────────────────────

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt    = SaltString::generate(&mut OsRng);
    let argon2  = Argon2::default();
    let hash    = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing failed: {e}")))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<()> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid hash: {e}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::Unauthorized)
}

// ── Bearer token helpers ──────────────────────────────────────

/// Generate a 64-char hex token from two UUIDs (256 bits of entropy).
/// The raw token goes to the client; only its hash is stored.
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Hex SHA-256 of a bearer token — the form persisted in `user_sessions`.
pub fn token_hash(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ── One-time password (password reset) ────────────────────────

pub const OTP_VALID_MINUTES: i64 = 5;

/// Six-digit numeric OTP plus its expiry timestamp (UTC).
pub fn generate_otp() -> (String, NaiveDateTime) {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    let expires_at = (Utc::now() + Duration::minutes(OTP_VALID_MINUTES)).naive_utc();
    (code.to_string(), expires_at)
}

/// An OTP is valid iff it matches the stored code and has not expired.
pub fn otp_is_valid(
    stored: Option<&str>,
    stored_expiry: Option<NaiveDateTime>,
    supplied: &str,
    now: NaiveDateTime,
) -> bool {
    match (stored, stored_expiry) {
        (Some(code), Some(expiry)) => code == supplied && now <= expiry,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_otp_is_six_digits() {
        for _ in 0..20 {
            let (code, _) = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn otp_validity_checks_code_and_expiry() {
        let now = Utc::now().naive_utc();
        let later = now + Duration::minutes(1);
        let earlier = now - Duration::minutes(1);

        assert!(otp_is_valid(Some("123456"), Some(later), "123456", now));
        // wrong code
        assert!(!otp_is_valid(Some("123456"), Some(later), "654321", now));
        // expired
        assert!(!otp_is_valid(Some("123456"), Some(earlier), "123456", now));
        // never issued
        assert!(!otp_is_valid(None, None, "123456", now));
    }

    #[test]
    fn token_hash_is_hex_sha256() {
        let hash = token_hash("abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
