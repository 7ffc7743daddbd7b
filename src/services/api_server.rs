// src/services/api_server.rs
//! API Server for credential issuance
//!
//! Exposes a single endpoint that accepts a credential artifact plus the
//! recipient metadata as `multipart/form-data`, runs the issuance and
//! answers with the blob ID, transaction digest and links to both.
//!
//! Endpoints:
//! - `POST /credentials/issue`
//!
//! Error bodies follow the shape `{statusCode, message, error}`. Messages
//! for server-side failures are generic; the detail only goes to the log.

use crate::error::IssuanceError;
use crate::models::credential::{Artifact, CredentialRequest, IssuanceResponse};
use crate::services::credential_issuer::CredentialIssuer;
use axum::{
    extract::{multipart::{MultipartError, MultipartRejection}, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use log::{error, info, warn};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Content type assumed when the file part does not declare one.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Error body returned for every failed request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    status_code: u16,
    message: String,
    error: String,
}

/// Failure of a request, already reduced to what the caller may see
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<IssuanceError> for ApiError {
    fn from(err: IssuanceError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        ApiError {
            status,
            message: err.public_message(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            status_code: self.status.as_u16(),
            message: self.message,
            error: self.status.canonical_reason().unwrap_or("Error").to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

/// Parts of the issuance form as received
#[derive(Debug, Default)]
struct IssueForm {
    file: Option<Artifact>,
    recipient_email: String,
    recipient_name: String,
    course_name: String,
    issue_date: String,
}

impl IssueForm {
    /// Reads every part of the multipart body. Unknown parts are skipped.
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = IssueForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let content_type = field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE).to_string();
                    let file_name = field.file_name().map(str::to_string);
                    let bytes: Bytes = field.bytes().await?;
                    let mut artifact = Artifact::new(bytes, content_type);
                    if let Some(file_name) = file_name {
                        artifact = artifact.with_file_name(file_name);
                    }
                    form.file = Some(artifact);
                }
                "recipientEmail" => form.recipient_email = field.text().await?,
                "recipientName" => form.recipient_name = field.text().await?,
                "courseName" => form.course_name = field.text().await?,
                "issueDate" => form.issue_date = field.text().await?,
                _ => {}
            }
        }
        Ok(form)
    }

    /// Checks the metadata first, then the file. Values are kept as
    /// received; surrounding whitespace only matters for the emptiness check.
    ///
    /// # Errors
    /// Returns [`IssuanceError::Validation`] naming the first offending part.
    fn validate(self) -> Result<(Artifact, CredentialRequest), IssuanceError> {
        if !is_valid_email(&self.recipient_email) {
            return Err(IssuanceError::Validation("Recipient must be a valid email address".into()));
        }
        for (field, value) in [
            ("recipientName", &self.recipient_name),
            ("courseName", &self.course_name),
            ("issueDate", &self.issue_date),
        ] {
            if value.trim().is_empty() {
                return Err(IssuanceError::Validation(format!("{} should not be empty", field)));
            }
        }

        let artifact = match self.file {
            Some(artifact) if !artifact.bytes.is_empty() => artifact,
            _ => return Err(IssuanceError::Validation("File is required".into())),
        };

        let request = CredentialRequest {
            recipient_email: self.recipient_email,
            recipient_name: self.recipient_name,
            course_name: self.course_name,
            issue_date: self.issue_date,
        };
        Ok((artifact, request))
    }
}

/// Structural email check: one `@`, a non-empty local part and a dotted domain.
fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

/// Main API server structure holding the issuance service
#[derive(Clone)]
pub struct ApiServer {
    /// Service running the upload and mint
    credential_issuer: Arc<CredentialIssuer>,

    /// Upper bound for a whole request body, in bytes
    max_upload_bytes: usize,
}

impl ApiServer {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `credential_issuer` - Service for credential issuance
    /// * `max_upload_bytes` - Largest accepted request body
    pub fn new(credential_issuer: CredentialIssuer, max_upload_bytes: usize) -> Self {
        ApiServer {
            credential_issuer: Arc::new(credential_issuer),
            max_upload_bytes,
        }
    }

    /// Builds the router with all routes and the body size limit
    pub fn router(&self) -> Router {
        Router::new()
            .route("/credentials/issue", post(Self::issue_credential_handler))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.max_upload_bytes))
            .with_state(Arc::new(self.clone()))
    }

    /// Starts the API server and serves requests until the process stops
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "0.0.0.0:3000")
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound or serving fails.
    pub async fn run(&self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("API server running at http://{}", listener.local_addr()?);
        info!("Available endpoints:");
        info!("- POST /credentials/issue");
        axum::serve(listener, self.router()).await
    }

    /// Issues a credential for the uploaded artifact
    ///
    /// # Endpoint
    /// POST /credentials/issue
    ///
    /// # Request Body
    /// `multipart/form-data` with a `file` part and the text parts
    /// `recipientEmail`, `recipientName`, `courseName`, `issueDate`
    ///
    /// # Responses
    /// - 201 Created: blob ID, transaction digest and links
    /// - 400 Bad Request: missing file, non-multipart body or invalid metadata
    /// - 413 Payload Too Large: body exceeds the configured limit
    /// - 500 Internal Server Error: upload or mint failed
    async fn issue_credential_handler(
        State(state): State<Arc<ApiServer>>,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<(StatusCode, Json<IssuanceResponse>), ApiError> {
        let multipart = multipart.map_err(|rejection| {
            warn!("Rejected issuance request without a multipart body: {}", rejection.body_text());
            ApiError {
                status: StatusCode::BAD_REQUEST,
                message: "File is required".to_string(),
            }
        })?;
        let form = IssueForm::read(multipart).await?;
        let (artifact, request) = form.validate().map_err(|e| {
            warn!("Rejected issuance request: {}", e);
            ApiError::from(e)
        })?;

        match state.credential_issuer.issue(artifact, &request).await {
            Ok(result) => Ok((StatusCode::CREATED, Json(IssuanceResponse::from(result)))),
            Err(e) => {
                error!("Credential issuance for {} failed: {}", request.recipient_email, e);
                Err(ApiError::from(e))
            }
        }
    }
}
