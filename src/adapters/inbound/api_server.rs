//! Submission API Server
//!
//! HTTP API receiving casker submissions from the web form.
//! Replaces the browser-side submit handler with an explicit endpoint.

use crate::application::{SubmissionError, SubmissionService};
use crate::domain::entities::{IconFile, Submission, SubmissionReceipt};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub port_range: String,
    pub icon_policy: String,
}

/// Next port preview response.
#[derive(Debug, Serialize)]
pub struct NextPortResponse {
    pub port: u16,
}

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<SubmissionService>,
}

impl ApiState {
    pub fn new(service: Arc<SubmissionService>) -> Self {
        Self { service }
    }
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The request body is not a readable multipart form
    Multipart(String),
    /// The submission flow failed
    Submission(SubmissionError),
}

impl From<SubmissionError> for ApiError {
    fn from(e: SubmissionError) -> Self {
        Self::Submission(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Multipart(reason) => (
                StatusCode::BAD_REQUEST,
                format!("Malformed form data: {}.", reason),
            ),
            ApiError::Submission(e) => {
                let status = match e {
                    SubmissionError::Invalid(_) => StatusCode::BAD_REQUEST,
                    SubmissionError::Allocation(_) => StatusCode::CONFLICT,
                    SubmissionError::Fetch(_) | SubmissionError::Create { .. } => {
                        StatusCode::BAD_GATEWAY
                    }
                    SubmissionError::Provision { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.user_message())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// API Server for casker submissions.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
    max_upload_bytes: usize,
    cors_enabled: bool,
}

impl ApiServer {
    pub fn new(listen_addr: String, service: Arc<SubmissionService>) -> Self {
        Self {
            listen_addr,
            state: ApiState::new(service),
            max_upload_bytes: 10 * 1024 * 1024,
            cors_enabled: true,
        }
    }

    /// Limit the size of a submission body.
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Allow cross-origin form posts.
    pub fn with_cors(mut self, enabled: bool) -> Self {
        self.cors_enabled = enabled;
        self
    }

    /// Build the router with all routes and layers.
    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/health", get(health_handler))
            .route("/api/v1/ports/next", get(next_port_handler))
            .route("/api/v1/caskers", post(submit_handler))
            .layer(DefaultBodyLimit::max(self.max_upload_bytes))
            .layer(TraceLayer::new_for_http());

        let router = if self.cors_enabled {
            router.layer(CorsLayer::permissive())
        } else {
            router
        };

        router.with_state(self.state.clone())
    }

    /// Run the API server until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();

        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("submission API listening on {}", self.listen_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("submission API stopped");
        Ok(())
    }
}

// Handler functions

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        port_range: state.service.port_range().to_string(),
        icon_policy: state.service.icon_policy().to_string(),
    })
}

async fn next_port_handler(
    State(state): State<ApiState>,
) -> Result<Json<NextPortResponse>, ApiError> {
    let port = state.service.next_port().await?;
    Ok(Json(NextPortResponse { port }))
}

async fn submit_handler(
    State(state): State<ApiState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionReceipt>), ApiError> {
    let submission = read_submission(multipart).await?;
    let receipt = state.service.submit(submission).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Collect the form fields of a submission.
///
/// Unknown fields are ignored. Empty file parts (a file input left
/// blank) are dropped.
async fn read_submission(mut multipart: Multipart) -> Result<Submission, ApiError> {
    let mut name = String::new();
    let mut email = String::new();
    let mut icons = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Multipart(e.body_text()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "name" => {
                name = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Multipart(e.body_text()))?;
            }
            "email" => {
                email = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Multipart(e.body_text()))?;
            }
            "icon" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Multipart(e.body_text()))?;

                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                icons.push(IconFile::new(file_name, content_type, data));
            }
            other => {
                tracing::debug!("ignoring form field {:?}", other);
            }
        }
    }

    Ok(Submission::new(name, email, icons))
}
