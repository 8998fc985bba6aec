use crate::selfie_store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Form fields the upload endpoint requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Name,
    Image,
}

impl RequiredField {
    /// Message returned to the caller when the field is missing
    pub fn message(self) -> &'static str {
        match self {
            RequiredField::Name => "Name field is required",
            RequiredField::Image => "Image is required",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredField::Name => f.write_str("name"),
            RequiredField::Image => f.write_str("image"),
        }
    }
}

/// Errors surfaced by the upload endpoint
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Missing required field: {0}")]
    MissingField(RequiredField),

    #[error("Malformed multipart request: {0}")]
    Malformed(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("Failed to persist selfie: {0}")]
    Persistence(#[from] StoreError),
}

/// JSON body shared by every upload response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl UploadResponse {
    pub fn accepted(id: String) -> Self {
        Self {
            success: true,
            message: "Image uploaded successfully".to_string(),
            id: Some(id),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            id: None,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            UploadError::MissingField(field) => {
                metrics::counter!("upload.requests.rejected").increment(1);
                (StatusCode::BAD_REQUEST, field.message().to_string())
            }
            UploadError::Malformed(reason) => {
                metrics::counter!("upload.requests.rejected").increment(1);
                tracing::warn!(reason = %reason, "Rejected malformed upload");
                (StatusCode::BAD_REQUEST, reason.clone())
            }
            UploadError::PayloadTooLarge(reason) => {
                metrics::counter!("upload.requests.rejected").increment(1);
                (StatusCode::PAYLOAD_TOO_LARGE, reason.clone())
            }
            UploadError::Persistence(e) => {
                metrics::counter!("upload.requests.failed").increment(1);
                tracing::error!(error = %e, "Upload error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(UploadResponse::rejected(message))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, UploadError>;
