// src/models/credential.rs
//! Credential issuance data model.
//!
//! Defines the request a caller submits to issue one credential, the artifact
//! that backs it, and the normalized result returned once the artifact is
//! stored on Walrus and the mint is recorded on Sui.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Recipient metadata for a single credential.
///
/// All fields are opaque strings at this layer; format checks happen at the
/// HTTP boundary before a request reaches the issuer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequest {
    /// Example: "alice@example.com"
    pub recipient_email: String,

    /// Display name minted into the on-chain record
    pub recipient_name: String,

    /// Course or subject the credential certifies
    pub course_name: String,

    /// Issue date as provided by the caller, e.g. "2024-01-01"
    pub issue_date: String,
}

/// The binary document stored on Walrus (typically a PDF or image).
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Bytes,
    pub content_type: String,
    /// Client-supplied file name, used for logging only
    pub file_name: Option<String>,
}

impl Artifact {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Outcome of a successful issuance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceResult {
    /// Walrus blob ID of the stored artifact
    pub blob_id: String,

    /// Digest of the executed mint transaction
    pub tx_digest: String,

    /// Aggregator URL serving the artifact
    pub walrus_url: String,

    /// Block explorer URL for the transaction
    pub explorer_url: String,
}

/// Response envelope returned by the issuance endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IssuanceResponse {
    pub status: String,
    pub message: String,
    pub data: IssuanceResult,
}

impl From<IssuanceResult> for IssuanceResponse {
    fn from(data: IssuanceResult) -> Self {
        Self {
            status: "success".to_string(),
            message: "Credential Stored Successfully".to_string(),
            data,
        }
    }
}
