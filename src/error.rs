// src/error.rs
//! Error taxonomy for credential issuance.
//!
//! Every component converts its own failures into one of the coarse
//! [`IssuanceError`] kinds before they cross into the orchestrator. The
//! `Display` output carries diagnostic detail and is meant for logs only;
//! callers outside the process see [`IssuanceError::public_message`].

use thiserror::Error;

/// Coarse failure kinds surfaced by the issuance pipeline.
#[derive(Debug, Error)]
pub enum IssuanceError {
    /// Missing or invalid startup configuration, including undecodable key material.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed inbound request.
    #[error("validation error: {0}")]
    Validation(String),

    /// Storage endpoint unreachable, non-success status or unknown response shape.
    #[error("upload error: {0}")]
    Upload(String),

    /// Signing, submission or on-chain execution failure.
    #[error("transaction error: {0}")]
    Transaction(String),
}

impl IssuanceError {
    /// Message that is safe to hand back to an external caller.
    ///
    /// Only validation failures echo their detail, since that detail is
    /// derived from the caller's own input.
    pub fn public_message(&self) -> String {
        match self {
            IssuanceError::Configuration(_) => "Service is not configured correctly.".to_string(),
            IssuanceError::Validation(reason) => reason.clone(),
            IssuanceError::Upload(_) => "Failed to upload file to Walrus.".to_string(),
            IssuanceError::Transaction(_) => "Blockchain minting failed.".to_string(),
        }
    }

    /// Whether the failure was caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, IssuanceError::Validation(_))
    }
}

pub type Result<T, E = IssuanceError> = std::result::Result<T, E>;
