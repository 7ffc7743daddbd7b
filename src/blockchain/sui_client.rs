// src/blockchain/sui_client.rs
//! Sui JSON-RPC client implementation.
//!
//! Provides the ledger half of credential issuance: it turns a
//! [`TransactionSpec`] into signed transaction bytes and executes them on a
//! Sui fullnode. Object references, the reference gas price and gas coins are
//! looked up over JSON-RPC right before signing, so the transaction always
//! refers to the latest object versions.

use crate::blockchain::transaction::TransactionSpec;
use crate::blockchain::types::{
    GasData, ObjectArg, ObjectDigest, ObjectId, ObjectRef, ParseIdError, SuiAddress,
    TransactionData, TransactionDataV1, TransactionExpiration, TransactionKind,
};
use crate::error::{IssuanceError, Result};
use crate::wallet::key_management::SigningIdentity;
use async_trait::async_trait;
use log::{debug, error};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Coin type used to pay for gas.
pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

/// Upper bound on gas coins in one payment.
const MAX_GAS_COINS: usize = 256;

/// Failures inside the ledger client, before they are coarsened into
/// [`IssuanceError::Transaction`].
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed {method} response: {reason}")]
    MalformedResponse { method: String, reason: String },

    #[error("object {0} could not be resolved")]
    UnresolvedObject(ObjectId),

    #[error("object {id} is unavailable: {reason}")]
    ObjectUnavailable { id: ObjectId, reason: String },

    #[error("insufficient gas: budget {budget} MIST, available {available} MIST")]
    InsufficientGas { budget: u64, available: u64 },

    #[error("transaction encoding failed: {0}")]
    Encoding(#[from] bcs::Error),

    #[error("transaction {digest} failed: {reason}")]
    ExecutionFailed { digest: String, reason: String },
}

impl From<LedgerError> for IssuanceError {
    fn from(err: LedgerError) -> Self {
        IssuanceError::Transaction(err.to_string())
    }
}

/// Ledger that records minted credentials.
#[async_trait]
pub trait CredentialLedger: Send + Sync {
    /// Signs `spec` with `identity`, executes it and returns the transaction digest.
    ///
    /// # Errors
    /// Returns [`IssuanceError::Transaction`] if resolution, signing,
    /// submission or on-chain execution fails.
    async fn submit(&self, spec: &TransactionSpec, identity: &SigningIdentity) -> Result<String>;
}

fn u64_from_str_or_num<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Sui encodes 64-bit integers as decimal strings in JSON.
#[derive(Debug, Deserialize)]
struct BigInt(#[serde(deserialize_with = "u64_from_str_or_num")] u64);

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    data: Option<ObjectData>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectData {
    object_id: String,
    #[serde(deserialize_with = "u64_from_str_or_num")]
    version: u64,
    digest: String,
    owner: Option<OwnerField>,
}

/// Owner as reported by the fullnode. Kinds this client cannot pass as
/// inputs are kept raw so the error can name them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OwnerField {
    Known(Owner),
    Unsupported(Value),
}

#[derive(Debug, Deserialize)]
enum Owner {
    AddressOwner(IgnoredAny),
    ObjectOwner(IgnoredAny),
    Shared {
        #[serde(deserialize_with = "u64_from_str_or_num")]
        initial_shared_version: u64,
    },
    Immutable,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinPage {
    data: Vec<Coin>,
    next_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Coin {
    coin_object_id: String,
    #[serde(deserialize_with = "u64_from_str_or_num")]
    version: u64,
    digest: String,
    #[serde(deserialize_with = "u64_from_str_or_num")]
    balance: u64,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    digest: String,
    effects: Option<Effects>,
}

#[derive(Debug, Deserialize)]
struct Effects {
    status: ExecutionStatus,
}

#[derive(Debug, Deserialize)]
struct ExecutionStatus {
    status: String,
    error: Option<String>,
}

/// Variant name of an owner the client does not understand.
fn owner_kind(owner: &Value) -> String {
    match owner {
        Value::Object(map) => map.keys().next().cloned().unwrap_or_else(|| "{}".into()),
        Value::String(kind) => kind.clone(),
        other => other.to_string(),
    }
}

fn malformed(method: &str, reason: impl ToString) -> LedgerError {
    LedgerError::MalformedResponse {
        method: method.to_string(),
        reason: reason.to_string(),
    }
}

fn object_ref(method: &str, id: &str, version: u64, digest: &str) -> Result<ObjectRef, LedgerError> {
    let id: ObjectId = id.parse().map_err(|e: ParseIdError| malformed(method, e))?;
    let digest = ObjectDigest::from_base58(digest).map_err(|e| malformed(method, e))?;
    Ok(ObjectRef(id, version, digest))
}

/// Sui fullnode client for submitting credential mints.
///
/// Holds no key material; the signer is passed per call so one client can
/// serve concurrent requests.
#[derive(Clone)]
pub struct SuiClient {
    /// Shared HTTP client (connection pooled)
    client: reqwest::Client,
    /// Fullnode JSON-RPC endpoint
    rpc_url: String,
    /// Gas budget for each mint, in MIST
    gas_budget: u64,
}

impl SuiClient {
    /// Creates a new Sui client.
    ///
    /// # Arguments
    /// * `client` - HTTP client used for JSON-RPC calls
    /// * `rpc_url` - Fullnode endpoint, e.g. `https://fullnode.testnet.sui.io:443`
    /// * `gas_budget` - Fixed gas budget per transaction in MIST
    pub fn new(client: reqwest::Client, rpc_url: &str, gas_budget: u64) -> Self {
        Self {
            client,
            rpc_url: rpc_url.to_string(),
            gas_budget,
        }
    }

    /// Performs one JSON-RPC call and decodes its `result`.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: Value = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.get("error") {
            return Err(LedgerError::Rpc {
                code: err.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        let result = response
            .get("result")
            .cloned()
            .ok_or_else(|| malformed(method, "missing result"))?;
        serde_json::from_value(result).map_err(|e| malformed(method, e))
    }

    /// Current reference gas price in MIST per gas unit.
    pub async fn reference_gas_price(&self) -> Result<u64, LedgerError> {
        let price: BigInt = self.call("suix_getReferenceGasPrice", json!([])).await?;
        Ok(price.0)
    }

    /// Looks up an object and turns it into a transaction input.
    ///
    /// Owned and immutable objects are pinned to their current version;
    /// shared objects are passed mutably by their initial shared version.
    pub async fn resolve_object(&self, id: ObjectId) -> Result<ObjectArg, LedgerError> {
        const METHOD: &str = "sui_getObject";
        let response: ObjectResponse = self
            .call(METHOD, json!([id.to_string(), { "showOwner": true }]))
            .await?;

        let data = match (response.data, response.error) {
            (Some(data), _) => data,
            (None, error) => {
                return Err(LedgerError::ObjectUnavailable {
                    id,
                    reason: error.map(|e| e.to_string()).unwrap_or_else(|| "no data".into()),
                })
            }
        };

        match data.owner {
            Some(OwnerField::Known(Owner::Shared { initial_shared_version })) => Ok(ObjectArg::SharedObject {
                id,
                initial_shared_version,
                mutable: true,
            }),
            Some(OwnerField::Known(Owner::AddressOwner(_) | Owner::ObjectOwner(_) | Owner::Immutable)) => Ok(
                ObjectArg::ImmOrOwnedObject(object_ref(METHOD, &data.object_id, data.version, &data.digest)?),
            ),
            Some(OwnerField::Unsupported(owner)) => Err(LedgerError::ObjectUnavailable {
                id,
                reason: format!("unsupported owner kind {}", owner_kind(&owner)),
            }),
            None => Err(malformed(METHOD, "owner missing")),
        }
    }

    /// Picks SUI coins owned by `owner` whose balances cover `budget`.
    ///
    /// # Arguments
    /// * `owner` - Address paying for gas
    /// * `budget` - Required total balance in MIST
    /// * `exclude` - Objects already used as inputs, which cannot pay gas
    pub async fn select_gas(
        &self,
        owner: SuiAddress,
        budget: u64,
        exclude: &[ObjectId],
    ) -> Result<Vec<ObjectRef>, LedgerError> {
        const METHOD: &str = "suix_getCoins";
        let mut payment = Vec::new();
        let mut total: u64 = 0;
        let mut cursor: Option<String> = None;

        loop {
            let page: CoinPage = self
                .call(METHOD, json!([owner.to_string(), SUI_COIN_TYPE, cursor, null]))
                .await?;

            for coin in page.data {
                let reference = object_ref(METHOD, &coin.coin_object_id, coin.version, &coin.digest)?;
                if exclude.contains(&reference.0) {
                    continue;
                }
                payment.push(reference);
                total = total.saturating_add(coin.balance);
                if total >= budget || payment.len() == MAX_GAS_COINS {
                    break;
                }
            }

            if total >= budget || payment.len() == MAX_GAS_COINS || !page.has_next_page {
                break;
            }
            cursor = page.next_cursor;
        }

        if total < budget {
            return Err(LedgerError::InsufficientGas { budget, available: total });
        }
        Ok(payment)
    }

    /// Resolves, encodes, signs and executes `spec`.
    async fn execute_move_call(
        &self,
        spec: &TransactionSpec,
        identity: &SigningIdentity,
    ) -> Result<String, LedgerError> {
        let sender = identity.address();
        let price = self.reference_gas_price().await?;

        let mut objects = HashMap::new();
        for id in spec.object_ids() {
            if !objects.contains_key(&id) {
                let resolved = self.resolve_object(id).await?;
                objects.insert(id, resolved);
            }
        }
        let programmable = spec.to_programmable(&objects)?;

        let inputs: Vec<ObjectId> = objects.keys().copied().collect();
        let payment = self.select_gas(sender, self.gas_budget, &inputs).await?;

        let tx = TransactionData::V1(TransactionDataV1 {
            kind: TransactionKind::ProgrammableTransaction(programmable),
            sender,
            gas_data: GasData {
                payment,
                owner: sender,
                price,
                budget: self.gas_budget,
            },
            expiration: TransactionExpiration::None,
        });
        let tx_bytes = tx.to_bcs()?;
        let signature = identity.sign_transaction(&tx_bytes);
        debug!(
            "Executing {}::{}::{} as {} ({} bytes)",
            spec.package,
            spec.module,
            spec.function,
            sender,
            tx_bytes.len()
        );

        const METHOD: &str = "sui_executeTransactionBlock";
        let response: ExecuteResponse = self
            .call(
                METHOD,
                json!([
                    base64::encode(&tx_bytes),
                    [signature],
                    { "showEffects": true },
                    "WaitForLocalExecution"
                ]),
            )
            .await?;

        let effects = response
            .effects
            .ok_or_else(|| malformed(METHOD, "effects missing"))?;
        if effects.status.status == "success" {
            Ok(response.digest)
        } else {
            Err(LedgerError::ExecutionFailed {
                digest: response.digest,
                reason: effects
                    .status
                    .error
                    .unwrap_or_else(|| effects.status.status.clone()),
            })
        }
    }
}

#[async_trait]
impl CredentialLedger for SuiClient {
    async fn submit(&self, spec: &TransactionSpec, identity: &SigningIdentity) -> Result<String> {
        self.execute_move_call(spec, identity).await.map_err(|e| {
            error!("Sui Mint Error: {}", e);
            IssuanceError::from(e)
        })
    }
}

/// Canned fullnode responses shared by ledger and issuer tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use crate::utils::config::tests::{ADMIN_CAP_ID, VERSION_OBJECT_ID};
    use crate::wallet::key_management::TEST_ADDRESS;
    use mockito::{Matcher, Mock, Server};
    use serde_json::{json, Value};

    pub(crate) const GAS_COIN_ID: &str =
        "0x00000000000000000000000000000000000000000000000000000000000000e4";
    pub(crate) const DIGEST_B58: &str = "US517G5965aydkZ46HS38QLi7UQiSojurfbQfKCELFx";

    pub(crate) async fn rpc(server: &mut Server, matcher: Value, result: Value) -> Mock {
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(matcher))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string())
            .create_async()
            .await
    }

    /// Mocks everything a mint needs up to, but not including, execution.
    pub(crate) async fn chain_state(server: &mut Server, coin_balance: &str) -> Vec<Mock> {
        vec![
            rpc(server, json!({ "method": "suix_getReferenceGasPrice" }), json!("750")).await,
            rpc(
                server,
                json!({ "method": "sui_getObject", "params": [ADMIN_CAP_ID, { "showOwner": true }] }),
                json!({ "data": {
                    "objectId": ADMIN_CAP_ID,
                    "version": "12",
                    "digest": DIGEST_B58,
                    "owner": { "AddressOwner": TEST_ADDRESS }
                }}),
            )
            .await,
            rpc(
                server,
                json!({ "method": "sui_getObject", "params": [VERSION_OBJECT_ID, { "showOwner": true }] }),
                json!({ "data": {
                    "objectId": VERSION_OBJECT_ID,
                    "version": "40",
                    "digest": DIGEST_B58,
                    "owner": { "Shared": { "initial_shared_version": 3 } }
                }}),
            )
            .await,
            rpc(
                server,
                json!({ "method": "suix_getCoins", "params": [TEST_ADDRESS, "0x2::sui::SUI", null, null] }),
                json!({
                    "data": [{
                        "coinType": "0x2::sui::SUI",
                        "coinObjectId": GAS_COIN_ID,
                        "version": "5",
                        "digest": DIGEST_B58,
                        "balance": coin_balance,
                        "previousTransaction": DIGEST_B58
                    }],
                    "nextCursor": null,
                    "hasNextPage": false
                }),
            )
            .await,
        ]
    }

    /// Mocks transaction execution reporting `status` in its effects.
    pub(crate) async fn execution(server: &mut Server, digest: &str, status: Value) -> Mock {
        server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({ "method": "sui_executeTransactionBlock" })),
                Matcher::Regex(r#""showEffects":true"#.to_string()),
                Matcher::Regex("WaitForLocalExecution".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": { "digest": digest, "effects": { "status": status } }
                })
                .to_string(),
            )
            .create_async()
            .await
    }
}
