//! Alternative check-in methods: face embeddings and fingerprint templates.

pub mod face;
pub mod fingerprint;
pub mod image;
pub mod vision;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

#[derive(Debug, Display)]
pub enum BiometricError {
    #[display(fmt = "Invalid base64 image format")]
    InvalidImage,

    #[display(fmt = "No {} template is registered for this employee", _0)]
    NoStoredTemplate(&'static str),

    #[display(fmt = "Could not process the face: {}", _0)]
    NoFaceDetected(String),

    #[display(fmt = "The face could not be verified with enough confidence")]
    LowConfidence,

    #[display(fmt = "Vision API error: {}", _0)]
    Vision(String),

    #[display(fmt = "Face processing failed: {}", _0)]
    Embedding(String),

    #[display(fmt = "{} is not configured", _0)]
    NotConfigured(&'static str),
}

impl std::error::Error for BiometricError {}

impl ResponseError for BiometricError {
    fn status_code(&self) -> StatusCode {
        match self {
            BiometricError::InvalidImage
            | BiometricError::NoStoredTemplate(_)
            | BiometricError::NoFaceDetected(_)
            | BiometricError::LowConfidence
            | BiometricError::Vision(_) => StatusCode::BAD_REQUEST,
            BiometricError::Embedding(_) | BiometricError::NotConfigured(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_side_failures_are_bad_requests() {
        assert_eq!(BiometricError::InvalidImage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            BiometricError::NoStoredTemplate("face").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BiometricError::NotConfigured("Face embedding service").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            BiometricError::NoStoredTemplate("fingerprint").to_string(),
            "No fingerprint template is registered for this employee"
        );
    }
}
