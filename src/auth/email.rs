//! Email sending helpers.
//!
//! If SMTP is not configured (empty `smtp_host`), the OTP is logged to stdout
//! instead — useful during development without a mail server.

use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::auth::OTP_VALID_MINUTES;
use crate::config::Config;
use crate::errors::{AppError, AppResult};

// ── Public helpers ────────────────────────────────────────────

pub async fn send_password_reset_otp(config: &Config, to: &str, otp: &str) -> AppResult<()> {
    if config.smtp_host.is_empty() {
        tracing::warn!(to, otp, "SMTP not configured — password reset OTP printed here");
        return Ok(());
    }

    let body = format!(
        "Hi,\n\nUse this code to reset your password: {otp}\n\nIt is valid for {OTP_VALID_MINUTES} minutes. If you did not request a reset, ignore this email.\n\nLeafGuard"
    );

    send(config, to, "Password reset code — LeafGuard", &body).await
}

// ── Internal ──────────────────────────────────────────────────

async fn send(config: &Config, to: &str, subject: &str, body: &str) -> AppResult<()> {
    let email = Message::builder()
        .from(
            config.smtp_from.parse()
                .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid SMTP_FROM address")))?,
        )
        .to(to.parse().map_err(|_| AppError::BadRequest("Invalid email address".into()))?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_owned())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build email: {e}")))?;

    let creds = Credentials::new(config.smtp_user.clone(), config.smtp_password.clone());

    let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("SMTP relay error: {e}")))?
        .port(config.smtp_port)
        .credentials(creds)
        .build();

    transport
        .send(email)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to send email: {e}")))?;

    Ok(())
}
