//! Client for the external disease-classification oracle.
//!
//! The oracle takes a leaf image (multipart field `image`) and returns a
//! label plus confidence. Its scores are accepted as-is; no retry and no
//! request deadline are applied.

use serde::Deserialize;

use crate::config::Config;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    #[serde(rename = "diseaseName")]
    pub disease_name: String,
    pub confidence:   f64,
}

fn http_client() -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {e}")))
}

/// Send an image to the classification oracle and return its prediction.
pub async fn classify_image(
    config: &Config,
    filename: &str,
    bytes: Vec<u8>,
) -> AppResult<Prediction> {
    let client = http_client()?;

    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(filename.to_owned())
        .mime_str("application/octet-stream")
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid multipart part: {e}")))?;
    let form = reqwest::multipart::Form::new().part("image", part);

    let response = client
        .post(&config.model_api_url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Classification request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Internal(anyhow::anyhow!(
            "Classification service returned {status}"
        )));
    }

    let prediction: Prediction = response
        .json()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid classification payload: {e}")))?;

    Ok(prediction)
}
