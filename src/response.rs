//! Uniform JSON response envelope.
//!
//! Every outcome leaving the API is shaped as
//! `{success: bool, message: String, data?: any, error?: String}`.
//! Success comes from the [`ApiResponse`] constructors below; failures come
//! from `AppError::into_response`, which reuses [`error_body`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A success response: envelope body plus status code.
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    body:   Option<Envelope>,
}

impl ApiResponse {
    fn with_status<T: Serialize>(status: StatusCode, message: &str, data: T) -> Self {
        // serde_json::to_value only fails on degenerate payloads (e.g. maps
        // with non-string keys); the envelope falls back to a data-less body.
        let data = match serde_json::to_value(data) {
            Ok(serde_json::Value::Null) => None,
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!(error = %err, "Failed to serialize response data");
                None
            }
        };
        Self {
            status,
            body: Some(Envelope {
                success: true,
                message: message.to_owned(),
                data,
                error: None,
            }),
        }
    }

    /// 200 OK.
    pub fn success<T: Serialize>(message: &str, data: T) -> Self {
        Self::with_status(StatusCode::OK, message, data)
    }

    /// 201 Created.
    pub fn created<T: Serialize>(message: &str, data: T) -> Self {
        Self::with_status(StatusCode::CREATED, message, data)
    }

    /// 202 Accepted.
    #[allow(dead_code)]
    pub fn accepted<T: Serialize>(message: &str, data: T) -> Self {
        Self::with_status(StatusCode::ACCEPTED, message, data)
    }

    /// 204 No Content — no body at all.
    pub fn no_content() -> Self {
        Self { status: StatusCode::NO_CONTENT, body: None }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

/// Failure envelope body shared with `AppError::into_response`.
pub fn error_body(message: &str, error: Option<String>) -> Envelope {
    Envelope {
        success: false,
        message: message.to_owned(),
        data: None,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let resp = ApiResponse::success("ok", serde_json::json!({"id": "abc"}));
        let body = resp.body.expect("success carries a body");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "ok");
        assert_eq!(json["data"]["id"], "abc");
        // error field omitted entirely, not null
        assert!(json.get("error").is_none());
    }

    #[test]
    fn null_data_is_omitted() {
        let resp = ApiResponse::success("ok", serde_json::Value::Null);
        let json = serde_json::to_value(&resp.body.unwrap()).unwrap();
        assert!(json.get("data").is_none());
    }

    #[test]
    fn error_envelope_stringifies_detail() {
        let body = error_body("Conflict", Some("duplicate name".into()));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "duplicate name");
    }

    #[test]
    fn error_envelope_omits_absent_detail() {
        let json = serde_json::to_value(&error_body("Forbidden", None)).unwrap();
        assert!(json.get("error").is_none());
        assert!(json.get("data").is_none());
    }

    #[test]
    fn no_content_has_no_body() {
        assert!(ApiResponse::no_content().body.is_none());
    }
}
