use crate::config::ApiConfig;
use crate::error::{RequiredField, Result, UploadError, UploadResponse};
use crate::selfie_store::{NewSelfie, SelfieRepository};
use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SelfieRepository>,
    /// Reported by the health check
    pub service_name: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn SelfieRepository>, service_name: &str) -> Self {
        Self {
            store,
            service_name: Arc::from(service_name),
        }
    }
}

/// Fields collected from an upload form before validation
#[derive(Debug, Default)]
struct UploadForm {
    name: Option<String>,
    image: Option<Bytes>,
}

impl UploadForm {
    /// Drain every part of the form. Unknown fields, and `image` parts that
    /// are not file uploads, are skipped.
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let field_name = field.name().unwrap_or("").to_string();

            match field_name.as_str() {
                "name" => {
                    form.name = Some(field.text().await.map_err(multipart_error)?);
                }
                "image" => {
                    if field.file_name().is_none() {
                        continue;
                    }
                    if form.image.is_some() {
                        return Err(UploadError::Malformed(
                            "Only one image may be uploaded".to_string(),
                        ));
                    }
                    form.image = Some(field.bytes().await.map_err(multipart_error)?);
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// Apply the ordered checks: name first, then image.
    fn into_selfie(self) -> Result<NewSelfie> {
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or(UploadError::MissingField(RequiredField::Name))?;

        let image = self
            .image
            .filter(|image| !image.is_empty())
            .ok_or(UploadError::MissingField(RequiredField::Image))?;

        Ok(NewSelfie::new(&name, &image))
    }
}

fn multipart_error(e: MultipartError) -> UploadError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::PayloadTooLarge("Request body exceeds the upload size limit".to_string())
    } else {
        UploadError::Malformed(e.body_text())
    }
}

/// Create the API router
pub fn create_router(state: AppState, config: &ApiConfig) -> Router {
    let cors = if config.cors_enabled {
        let origins = if config.cors_origins.iter().any(|o| o == "*") {
            AllowOrigin::any()
        } else {
            let origins: Vec<HeaderValue> = config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            AllowOrigin::list(origins)
        };
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/api/upload", post(upload_selfie))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": &*state.service_name
    }))
}

/// Readiness check endpoint
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "database": "connected"
            })),
        ),
        Err(e) => {
            error!(error = %e, "Readiness ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "not_ready",
                    "database": "disconnected"
                })),
            )
        }
    }
}

/// Validate a selfie submission and store it
#[instrument(skip_all)]
async fn upload_selfie(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let multipart = multipart.map_err(|e| UploadError::Malformed(e.body_text()))?;
    let selfie = UploadForm::read(multipart).await?.into_selfie()?;

    let id = state.store.insert(selfie).await?;

    info!(id = %id, "Selfie stored");
    metrics::counter!("upload.requests.accepted").increment(1);

    Ok(Json(UploadResponse::accepted(id)))
}

/// Start the upload API server, draining connections once `shutdown` resolves
pub async fn start_api_server<F>(state: AppState, config: &ApiConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = create_router(state, config);
    let addr = format!("{}:{}", config.host, config.port);

    info!(address = %addr, "Starting upload API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server error")?;

    Ok(())
}
