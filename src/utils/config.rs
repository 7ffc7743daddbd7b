// src/utils/config.rs
//! Startup configuration.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file by `dotenv`) through the `config` crate. Everything is validated once
//! into [`Settings`]; a missing or malformed value stops the service before it
//! accepts any traffic.
//!
//! ## Environment Variables
//! - `PUBLISHER_URL`: Walrus publisher base URL (required)
//! - `SUI_NETWORK`: `mainnet`, `testnet`, `devnet` or `localnet` (default: testnet)
//! - `SUI_PACKAGE_ID`: Package containing the `cert` module (required)
//! - `SUI_ADMIN_CAP_ID`: Admin capability object (required)
//! - `ADMIN_PRIVATE_KEY`: `suiprivkey1…` key of the admin account (required)
//! - `VERSION_OBJECT_ID`: Shared version object of the package (required)
//! - `SUI_RPC_URL`: (Optional) fullnode override
//! - `AGGREGATOR_URL`, `EXPLORER_URL`: (Optional) link bases for responses
//! - `GAS_BUDGET`: (Optional) gas budget in MIST
//! - `BIND_ADDRESS`, `MAX_UPLOAD_BYTES`: (Optional) HTTP listener settings

use crate::blockchain::types::ObjectId;
use crate::error::{IssuanceError, Result};
use config::{Config, Environment};
use serde::Deserialize;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

pub const DEFAULT_AGGREGATOR_URL: &str = "https://aggregator.walrus-testnet.walrus.space";
pub const DEFAULT_EXPLORER_URL: &str = "https://suiscan.xyz";
pub const DEFAULT_GAS_BUDGET: u64 = 50_000_000;
pub const DEFAULT_BIND_ADDRESS: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 3000));
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Sui network the service mints on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiNetwork {
    Mainnet,
    Testnet,
    Devnet,
    Localnet,
}

impl SuiNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuiNetwork::Mainnet => "mainnet",
            SuiNetwork::Testnet => "testnet",
            SuiNetwork::Devnet => "devnet",
            SuiNetwork::Localnet => "localnet",
        }
    }

    /// Public fullnode JSON-RPC endpoint for the network.
    pub fn fullnode_url(&self) -> &'static str {
        match self {
            SuiNetwork::Mainnet => "https://fullnode.mainnet.sui.io:443",
            SuiNetwork::Testnet => "https://fullnode.testnet.sui.io:443",
            SuiNetwork::Devnet => "https://fullnode.devnet.sui.io:443",
            SuiNetwork::Localnet => "http://127.0.0.1:9000",
        }
    }
}

impl FromStr for SuiNetwork {
    type Err = IssuanceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mainnet" => Ok(SuiNetwork::Mainnet),
            "testnet" => Ok(SuiNetwork::Testnet),
            "devnet" => Ok(SuiNetwork::Devnet),
            "localnet" => Ok(SuiNetwork::Localnet),
            other => Err(IssuanceError::Configuration(format!(
                "SUI_NETWORK not configured or invalid: {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for SuiNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated values as read from the environment.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    publisher_url: Option<String>,
    aggregator_url: Option<String>,
    explorer_url: Option<String>,
    sui_network: Option<String>,
    sui_rpc_url: Option<String>,
    sui_package_id: Option<String>,
    sui_admin_cap_id: Option<String>,
    admin_private_key: Option<String>,
    version_object_id: Option<String>,
    gas_budget: Option<String>,
    bind_address: Option<String>,
    max_upload_bytes: Option<String>,
}

/// Validated service configuration, built once at startup.
#[derive(Clone)]
pub struct Settings {
    pub publisher_url: String,
    pub aggregator_url: String,
    pub explorer_url: String,
    pub sui_network: SuiNetwork,
    pub sui_rpc_url: String,
    pub package_id: ObjectId,
    pub admin_cap_id: ObjectId,
    pub version_object_id: ObjectId,
    admin_private_key: String,
    pub gas_budget: u64,
    pub bind_address: SocketAddr,
    pub max_upload_bytes: usize,
}

impl Settings {
    /// Loads settings from the process environment.
    ///
    /// # Errors
    /// Returns [`IssuanceError::Configuration`] naming the first missing or
    /// invalid variable.
    pub fn from_env() -> Result<Self> {
        let source = Config::builder()
            .add_source(Environment::default())
            .build()
            .map_err(|e| IssuanceError::Configuration(format!("failed to read environment: {}", e)))?;
        Self::from_config(source)
    }

    /// Validates settings from an already assembled `config` source.
    pub fn from_config(source: Config) -> Result<Self> {
        let raw: RawSettings = source
            .try_deserialize()
            .map_err(|e| IssuanceError::Configuration(format!("failed to parse configuration: {}", e)))?;

        let sui_network = match non_empty(raw.sui_network) {
            Some(network) => network.parse()?,
            None => SuiNetwork::Testnet,
        };
        let sui_rpc_url = non_empty(raw.sui_rpc_url)
            .unwrap_or_else(|| sui_network.fullnode_url().to_string());

        Ok(Self {
            publisher_url: trim_slash(required(raw.publisher_url, "PUBLISHER_URL")?),
            aggregator_url: trim_slash(
                non_empty(raw.aggregator_url).unwrap_or_else(|| DEFAULT_AGGREGATOR_URL.to_string()),
            ),
            explorer_url: trim_slash(
                non_empty(raw.explorer_url).unwrap_or_else(|| DEFAULT_EXPLORER_URL.to_string()),
            ),
            sui_network,
            sui_rpc_url,
            package_id: object_id(raw.sui_package_id, "SUI_PACKAGE_ID")?,
            admin_cap_id: object_id(raw.sui_admin_cap_id, "SUI_ADMIN_CAP_ID")?,
            version_object_id: object_id(raw.version_object_id, "VERSION_OBJECT_ID")?,
            admin_private_key: required(raw.admin_private_key, "ADMIN_PRIVATE_KEY")?,
            gas_budget: parsed(raw.gas_budget, "GAS_BUDGET", DEFAULT_GAS_BUDGET)?,
            bind_address: parsed(raw.bind_address, "BIND_ADDRESS", DEFAULT_BIND_ADDRESS)?,
            max_upload_bytes: parsed(raw.max_upload_bytes, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }

    /// The encoded admin key. Decode it with `SigningIdentity::decode`.
    pub fn admin_private_key(&self) -> &str {
        &self.admin_private_key
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("publisher_url", &self.publisher_url)
            .field("aggregator_url", &self.aggregator_url)
            .field("explorer_url", &self.explorer_url)
            .field("sui_network", &self.sui_network)
            .field("sui_rpc_url", &self.sui_rpc_url)
            .field("package_id", &self.package_id)
            .field("admin_cap_id", &self.admin_cap_id)
            .field("version_object_id", &self.version_object_id)
            .field("admin_private_key", &"<redacted>")
            .field("gas_budget", &self.gas_budget)
            .field("bind_address", &self.bind_address)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    non_empty(value).ok_or_else(|| IssuanceError::Configuration(format!("{} not configured", name)))
}

fn object_id(value: Option<String>, name: &str) -> Result<ObjectId> {
    required(value, name)?
        .parse()
        .map_err(|e| IssuanceError::Configuration(format!("{} is not a valid object id: {}", name, e)))
}

fn parsed<T: FromStr>(value: Option<String>, name: &str, default: T) -> Result<T> {
    match non_empty(value) {
        Some(v) => v
            .parse()
            .map_err(|_| IssuanceError::Configuration(format!("{} has an invalid value: {:?}", name, v))),
        None => Ok(default),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::wallet::key_management::TEST_PRIVATE_KEY;

    pub(crate) const PACKAGE_ID: &str =
        "0x00000000000000000000000000000000000000000000000000000000000000a1";
    pub(crate) const ADMIN_CAP_ID: &str =
        "0x00000000000000000000000000000000000000000000000000000000000000c2";
    pub(crate) const VERSION_OBJECT_ID: &str =
        "0x00000000000000000000000000000000000000000000000000000000000000d3";

    fn builder() -> config::builder::ConfigBuilder<config::builder::DefaultState> {
        Config::builder()
            .set_override("publisher_url", "https://publisher.example/")
            .unwrap()
            .set_override("sui_package_id", PACKAGE_ID)
            .unwrap()
            .set_override("sui_admin_cap_id", ADMIN_CAP_ID)
            .unwrap()
            .set_override("admin_private_key", TEST_PRIVATE_KEY)
            .unwrap()
            .set_override("version_object_id", VERSION_OBJECT_ID)
            .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let settings = Settings::from_config(builder().build().unwrap()).unwrap();
        assert_eq!(settings.publisher_url, "https://publisher.example");
        assert_eq!(settings.sui_network, SuiNetwork::Testnet);
        assert_eq!(settings.sui_rpc_url, "https://fullnode.testnet.sui.io:443");
        assert_eq!(settings.aggregator_url, DEFAULT_AGGREGATOR_URL);
        assert_eq!(settings.explorer_url, DEFAULT_EXPLORER_URL);
        assert_eq!(settings.gas_budget, DEFAULT_GAS_BUDGET);
        assert_eq!(settings.bind_address.port(), 3000);
        assert_eq!(settings.admin_cap_id.to_string(), ADMIN_CAP_ID);
    }

    #[test]
    fn test_missing_required_value_is_fatal() {
        let source = Config::builder()
            .set_override("publisher_url", "https://publisher.example")
            .unwrap()
            .build()
            .unwrap();
        let err = Settings::from_config(source).unwrap_err();
        assert!(matches!(err, IssuanceError::Configuration(_)));
        assert!(err.to_string().contains("SUI_PACKAGE_ID"));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let source = builder().set_override("version_object_id", "  ").unwrap().build().unwrap();
        let err = Settings::from_config(source).unwrap_err();
        assert!(err.to_string().contains("VERSION_OBJECT_ID not configured"));
    }

    #[test]
    fn test_invalid_network_rejected() {
        let source = builder().set_override("sui_network", "moonnet").unwrap().build().unwrap();
        let err = Settings::from_config(source).unwrap_err();
        assert!(err.to_string().contains("SUI_NETWORK"));
    }

    #[test]
    fn test_network_and_overrides() {
        let source = builder()
            .set_override("sui_network", "localnet")
            .unwrap()
            .set_override("gas_budget", "1000")
            .unwrap()
            .set_override("explorer_url", "https://explorer.example/")
            .unwrap()
            .build()
            .unwrap();
        let settings = Settings::from_config(source).unwrap();
        assert_eq!(settings.sui_rpc_url, "http://127.0.0.1:9000");
        assert_eq!(settings.gas_budget, 1000);
        assert_eq!(settings.explorer_url, "https://explorer.example");
    }

    #[test]
    fn test_malformed_object_id_rejected() {
        let source = builder().set_override("sui_admin_cap_id", "cap").unwrap().build().unwrap();
        let err = Settings::from_config(source).unwrap_err();
        assert!(err.to_string().contains("SUI_ADMIN_CAP_ID"));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let settings = Settings::from_config(builder().build().unwrap()).unwrap();
        let debug = format!("{:?}", settings);
        assert!(!debug.contains(TEST_PRIVATE_KEY));
        assert!(debug.contains("<redacted>"));
    }
}
