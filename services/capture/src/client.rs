use crate::error::CaptureError;
use crate::frame::Frame;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// File name attached to the uploaded image part
const UPLOAD_FILE_NAME: &str = "selfie.jpg";

/// One submission to the upload service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Trimmed name
    pub name: String,
    pub frame: Frame,
}

/// Body returned by the upload service
#[derive(Debug, Deserialize)]
struct UploadResponse {
    success: bool,
    message: String,
    #[serde(default)]
    id: Option<String>,
}

/// Submits captured selfies
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UploadClient: Send + Sync {
    /// Send one request, returning the id the service generated
    async fn upload(&self, request: UploadRequest) -> Result<String, CaptureError>;
}

/// Multipart HTTP client for `POST /api/upload`
#[derive(Debug, Clone)]
pub struct HttpUploadClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpUploadClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(request: UploadRequest) -> Result<Form, CaptureError> {
        let image = Part::bytes(request.frame.data.to_vec())
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(&request.frame.mime)?;

        Ok(Form::new().part("image", image).text("name", request.name))
    }
}

#[async_trait]
impl UploadClient for HttpUploadClient {
    #[instrument(skip(self, request), fields(endpoint = %self.endpoint, name = %request.name))]
    async fn upload(&self, request: UploadRequest) -> Result<String, CaptureError> {
        let response = self
            .http
            .post(&self.endpoint)
            .multipart(Self::form(request)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Rejections still carry a JSON message; fall back to the status line
            let reason = match response.json::<UploadResponse>().await {
                Ok(body) => body.message,
                Err(_) => status.to_string(),
            };
            warn!(status = %status, reason = %reason, "Upload rejected");
            return Err(CaptureError::Transport(reason));
        }

        let body: UploadResponse = response.json().await?;
        match (body.success, body.id) {
            (true, Some(id)) if !id.is_empty() => {
                info!(id = %id, "Upload acknowledged");
                Ok(id)
            }
            _ => Err(CaptureError::Transport(body.message)),
        }
    }
}
