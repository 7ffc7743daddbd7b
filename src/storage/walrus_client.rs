// src/storage/walrus_client.rs
//! Walrus publisher client for content-addressed artifact storage.
//!
//! Uploads raw credential artifacts through the publisher HTTP API and
//! extracts the blob ID. Walrus deduplicates identical content, so an upload
//! either creates a new blob or reports that the content is already
//! certified under an existing ID. Both count as success.
//!
//! # Security Considerations
//! - Blobs on Walrus are public; the artifact must not contain secrets
//! - Publisher error bodies are logged but never forwarded to callers

use crate::error::{IssuanceError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

/// Number of storage epochs every artifact is paid for.
pub const STORAGE_EPOCHS: u32 = 5;

/// Whether an upload created a blob or hit an already stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobProvenance {
    NewlyCreated,
    AlreadyCertified,
}

/// Blob ID of a stored artifact and how it got there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub blob_id: String,
    pub provenance: BlobProvenance,
    /// Epoch at which storage expires, when the publisher reports it
    pub end_epoch: Option<u64>,
}

/// Content-addressed storage for credential artifacts.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `data` and returns its blob ID.
    ///
    /// # Errors
    /// Returns [`IssuanceError::Upload`] on transport failure, non-success
    /// status, or an unrecognized response body.
    async fn upload(&self, data: Bytes, content_type: &str) -> Result<UploadResult>;
}

/// Success bodies of `PUT /v1/blobs`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum PublisherResponse {
    NewlyCreated(NewlyCreated),
    AlreadyCertified(AlreadyCertified),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewlyCreated {
    blob_object: BlobObject,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlobObject {
    blob_id: String,
    storage: Option<BlobStorage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlobStorage {
    end_epoch: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlreadyCertified {
    blob_id: String,
    end_epoch: Option<u64>,
}

impl From<PublisherResponse> for UploadResult {
    fn from(response: PublisherResponse) -> Self {
        match response {
            PublisherResponse::NewlyCreated(created) => UploadResult {
                blob_id: created.blob_object.blob_id,
                provenance: BlobProvenance::NewlyCreated,
                end_epoch: created.blob_object.storage.and_then(|s| s.end_epoch),
            },
            PublisherResponse::AlreadyCertified(certified) => UploadResult {
                blob_id: certified.blob_id,
                provenance: BlobProvenance::AlreadyCertified,
                end_epoch: certified.end_epoch,
            },
        }
    }
}

/// HTTP client for a Walrus publisher.
#[derive(Clone)]
pub struct WalrusPublisher {
    /// Shared HTTP client (connection pooled)
    client: reqwest::Client,
    /// Publisher base URL without trailing slash
    publisher_url: String,
}

impl WalrusPublisher {
    /// Creates a publisher client.
    ///
    /// # Arguments
    /// * `client` - HTTP client to send uploads with
    /// * `publisher_url` - Base URL, e.g. `https://publisher.walrus-testnet.walrus.space`
    pub fn new(client: reqwest::Client, publisher_url: &str) -> Self {
        Self {
            client,
            publisher_url: publisher_url.trim_end_matches('/').to_string(),
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/v1/blobs?epochs={}", self.publisher_url, STORAGE_EPOCHS)
    }
}

#[async_trait]
impl BlobStore for WalrusPublisher {
    async fn upload(&self, data: Bytes, content_type: &str) -> Result<UploadResult> {
        let size = data.len();
        let response = self
            .client
            .put(self.upload_url())
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| {
                error!("Error uploading to Walrus: {}", e);
                IssuanceError::Upload(format!("publisher request failed: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Error reading Walrus response: {}", e);
            IssuanceError::Upload(format!("failed to read publisher response: {}", e))
        })?;

        if !status.is_success() {
            error!("Walrus publisher returned {}: {}", status, body);
            return Err(IssuanceError::Upload(format!("publisher returned status {}", status)));
        }

        let parsed: PublisherResponse = serde_json::from_str(&body).map_err(|_| {
            error!("Unexpected response structure from Walrus: {}", body);
            IssuanceError::Upload("unexpected response structure from Walrus".into())
        })?;

        let result = UploadResult::from(parsed);
        if result.blob_id.is_empty() {
            error!("Walrus response carried an empty blob ID: {}", body);
            return Err(IssuanceError::Upload("publisher returned an empty blob ID".into()));
        }

        debug!(
            "Uploaded {} bytes ({}) as blob {} ({:?})",
            size, content_type, result.blob_id, result.provenance
        );
        Ok(result)
    }
}
