// src/main.rs

//! # Credential Issuance Service - Main Entry Point
//!
//! Loads configuration, decodes the admin key and starts the API server.
//!
//! ## Architecture Overview
//! 1. **Storage Layer**: `WalrusPublisher` stores credential artifacts on Walrus
//! 2. **Blockchain Layer**: `SuiClient` submits signed `cert::mint_credential_v2` calls
//! 3. **Services Layer**: Issuance orchestration and the HTTP endpoint
//! 4. **Wallet Layer**: Admin signing identity decoded from a `suiprivkey` key
//!
//! ## Environment Variables Required
//! - `PUBLISHER_URL`: Walrus publisher base URL
//! - `SUI_PACKAGE_ID`: Package holding the `cert` module
//! - `SUI_ADMIN_CAP_ID`: Admin capability object
//! - `VERSION_OBJECT_ID`: Shared version object
//! - `ADMIN_PRIVATE_KEY`: Bech32 `suiprivkey1...` admin key
//!
//! Optional: `SUI_NETWORK`, `SUI_RPC_URL`, `AGGREGATOR_URL`, `EXPLORER_URL`,
//! `GAS_BUDGET`, `BIND_ADDRESS`, `MAX_UPLOAD_BYTES`.

use crate::blockchain::sui_client::SuiClient;
use crate::blockchain::transaction::CredentialContract;
use crate::services::api_server::ApiServer;
use crate::services::credential_issuer::{CredentialIssuer, LinkTemplates};
use crate::storage::walrus_client::WalrusPublisher;
use crate::utils::config::Settings;
use crate::wallet::key_management::SigningIdentity;
use anyhow::Context;
use dotenv::dotenv;
use log::{debug, info};
use std::sync::Arc;

// Module declarations (organized by functional domain)
mod blockchain;    // Sui transaction types and fullnode client
mod error;         // Error taxonomy
mod models;        // Data structures
mod services;      // Issuance orchestration and API
mod storage;       // Walrus storage layer
mod utils;         // Configuration and hashing
mod wallet;        // Admin key handling

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load environment configuration
/// 2. Decode the admin signing identity
/// 3. Initialize storage and ledger clients
/// 4. Start API server
///
/// # Errors
/// - If a required environment variable is missing or invalid
/// - If the admin key cannot be decoded
/// - If the listener cannot be bound
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env().context("failed to load configuration")?;
    debug!("Loaded {:?}", settings);

    // Decoded once; every request signs with this identity
    let identity = SigningIdentity::decode(settings.admin_private_key())
        .context("failed to decode ADMIN_PRIVATE_KEY")?;
    info!("Admin address: {}", identity.address());
    debug!("Admin public key: {}", hex::encode(identity.public_key()));
    info!("Sui network: {} ({})", settings.sui_network, settings.sui_rpc_url);

    // One connection pool shared by both clients
    let http = reqwest::Client::new();
    let walrus = WalrusPublisher::new(http.clone(), &settings.publisher_url);
    let sui = SuiClient::new(http, &settings.sui_rpc_url, settings.gas_budget);

    let credential_issuer = CredentialIssuer::new(
        Arc::new(walrus),
        Arc::new(sui),
        Arc::new(identity),
        CredentialContract::from_settings(&settings),
        LinkTemplates::from_settings(&settings),
    );

    let api_server = ApiServer::new(credential_issuer, settings.max_upload_bytes);
    api_server
        .run(settings.bind_address)
        .await
        .with_context(|| format!("API server on {} stopped", settings.bind_address))
}
