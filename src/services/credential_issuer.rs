// src/services/credential_issuer.rs
//! Credential Issuer Service
//!
//! Issues one credential per call by coordinating two independent systems:
//! - Walrus: stores the credential artifact and returns its blob ID
//! - Sui: records a `mint_credential_v2` call binding that blob ID to the
//!   recipient metadata
//!
//! The steps run strictly in order and the first failure ends the issuance.
//! Nothing is retried or compensated: if minting fails after a successful
//! upload, the blob stays on Walrus without a ledger record pointing at it.

use crate::blockchain::sui_client::CredentialLedger;
use crate::blockchain::transaction::CredentialContract;
use crate::error::{IssuanceError, Result};
use crate::models::credential::{Artifact, CredentialRequest, IssuanceResult};
use crate::storage::walrus_client::BlobStore;
use crate::utils::config::{Settings, SuiNetwork};
use crate::wallet::key_management::SigningIdentity;
use log::{debug, error, info};
use std::fmt;
use std::sync::Arc;

/// Progress of a single issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceStage {
    Uploading,
    Uploaded,
    Minting,
    Minted,
}

impl fmt::Display for IssuanceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssuanceStage::Uploading => "UPLOADING",
            IssuanceStage::Uploaded => "UPLOADED",
            IssuanceStage::Minting => "MINTING",
            IssuanceStage::Minted => "MINTED",
        };
        f.write_str(name)
    }
}

/// URL patterns for the links returned to callers.
#[derive(Debug, Clone)]
pub struct LinkTemplates {
    /// Walrus aggregator base URL
    pub aggregator_url: String,
    /// Block explorer base URL
    pub explorer_url: String,
    pub network: SuiNetwork,
}

impl LinkTemplates {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            aggregator_url: settings.aggregator_url.clone(),
            explorer_url: settings.explorer_url.clone(),
            network: settings.sui_network,
        }
    }

    /// Aggregator URL serving the blob.
    pub fn walrus_url(&self, blob_id: &str) -> String {
        format!("{}/v1/blobs/{}", self.aggregator_url, blob_id)
    }

    /// Explorer page of the transaction.
    pub fn explorer_url(&self, tx_digest: &str) -> String {
        format!("{}/{}/tx/{}", self.explorer_url, self.network, tx_digest)
    }
}

/// Service that stores credential artifacts and mints their on-chain records.
///
/// Cheap to share: every field is immutable after construction, and one
/// instance serves all concurrent requests.
pub struct CredentialIssuer {
    /// Artifact storage (Walrus publisher in production)
    blob_store: Arc<dyn BlobStore>,

    /// Ledger the mint is submitted to (Sui fullnode in production)
    ledger: Arc<dyn CredentialLedger>,

    /// Admin identity that signs every mint
    identity: Arc<SigningIdentity>,

    /// Deployed package and the objects the mint needs
    contract: CredentialContract,

    links: LinkTemplates,
}

impl CredentialIssuer {
    /// Creates a new CredentialIssuer instance
    ///
    /// # Arguments
    /// * `blob_store` - Storage the artifact is uploaded to
    /// * `ledger` - Ledger the mint transaction is submitted to
    /// * `identity` - Admin signing identity, decoded once at startup
    /// * `contract` - Credential package and object IDs
    /// * `links` - URL patterns for the result links
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        ledger: Arc<dyn CredentialLedger>,
        identity: Arc<SigningIdentity>,
        contract: CredentialContract,
        links: LinkTemplates,
    ) -> Self {
        Self {
            blob_store,
            ledger,
            identity,
            contract,
            links,
        }
    }

    /// Stores `artifact` and mints a credential referencing it.
    ///
    /// # Arguments
    /// * `artifact` - The credential document
    /// * `request` - Recipient metadata recorded on-chain
    ///
    /// # Returns
    /// Blob ID, transaction digest and the links to both
    ///
    /// # Errors
    /// - [`IssuanceError::Upload`] if storing fails; no transaction is attempted
    /// - [`IssuanceError::Transaction`] if minting fails
    pub async fn issue(&self, artifact: Artifact, request: &CredentialRequest) -> Result<IssuanceResult> {
        info!("Processing credential issuance for {}...", request.recipient_email);
        self.enter(IssuanceStage::Uploading, request);
        if let Some(name) = &artifact.file_name {
            debug!("Artifact {} ({}, {} bytes)", name, artifact.content_type, artifact.bytes.len());
        }

        let upload = self.blob_store.upload(artifact.bytes, &artifact.content_type).await?;
        if upload.blob_id.is_empty() {
            return Err(IssuanceError::Upload("storage returned an empty blob ID".into()));
        }
        self.enter(IssuanceStage::Uploaded, request);
        info!("Storage Successful! Blob ID: {} ({:?})", upload.blob_id, upload.provenance);
        if let Some(end_epoch) = upload.end_epoch {
            debug!("Blob {} stored until epoch {}", upload.blob_id, end_epoch);
        }

        self.enter(IssuanceStage::Minting, request);
        info!("Initiating mintCredential transaction as {}", self.identity.address());
        let spec = self
            .contract
            .mint_credential(&upload.blob_id, request, self.identity.address());

        let tx_digest = match self.ledger.submit(&spec, &self.identity).await {
            Ok(digest) if !digest.is_empty() => digest,
            Ok(_) => {
                error!("Ledger returned an empty digest; blob {} is orphaned", upload.blob_id);
                return Err(IssuanceError::Transaction("ledger returned an empty digest".into()));
            }
            Err(err) => {
                error!(
                    "Mint failed for {}; blob {} is stored but not referenced on-chain: {}",
                    request.recipient_email, upload.blob_id, err
                );
                return Err(err);
            }
        };
        self.enter(IssuanceStage::Minted, request);
        info!("Mint Success! Digest: {}", tx_digest);

        Ok(IssuanceResult {
            walrus_url: self.links.walrus_url(&upload.blob_id),
            explorer_url: self.links.explorer_url(&tx_digest),
            blob_id: upload.blob_id,
            tx_digest,
        })
    }

    fn enter(&self, stage: IssuanceStage, request: &CredentialRequest) {
        debug!("Issuance for {} entered {}", request.recipient_email, stage);
    }
}
