// src/wallet/key_management.rs
//! Administrative key management for credential minting.
//!
//! Decodes the Bech32 `suiprivkey1…` secret configured for the service into
//! an Ed25519 signing key and derives the matching Sui address. The identity
//! is loaded once at startup and shared read-only by every request.
//!
//! Uses the following cryptographic primitives:
//! - Ed25519 signatures (via `ed25519-dalek`)
//! - Blake2b-256 for address derivation and intent digests
//!
//! # Security Notes
//! - The secret key is never logged, serialized or exposed through `Debug`
//! - Signing borrows `&self` and keeps no counters or nonces, so one identity
//!   can sign for many in-flight requests at once

use crate::blockchain::types::SuiAddress;
use crate::error::{IssuanceError, Result};
use crate::utils::crypto::hash_data;
use ed25519_dalek::{Signer, SigningKey};
use std::fmt;

/// Human-readable part of Bech32-encoded Sui private keys.
pub const SUI_PRIVATE_KEY_PREFIX: &str = "suiprivkey";

/// Signature scheme flag for Ed25519 keys and signatures.
pub const ED25519_FLAG: u8 = 0x00;

/// Intent prefix for signing transaction data: scope, version, app id.
const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

/// The service's signing key together with its derived on-chain address.
pub struct SigningIdentity {
    /// Securely stored private key (never exposed)
    signing_key: SigningKey,
    /// Address derived from the public key
    address: SuiAddress,
}

impl SigningIdentity {
    /// Decodes a Bech32 Sui private key and derives its address.
    ///
    /// # Arguments
    /// * `encoded` - Key in `suiprivkey1…` form
    ///
    /// # Errors
    /// Returns [`IssuanceError::Configuration`] if:
    /// - The Bech32 checksum or character set is invalid (e.g. truncated input)
    /// - The human-readable prefix is not `suiprivkey`
    /// - The key is not an Ed25519 key or is not exactly 32 bytes
    pub fn decode(encoded: &str) -> Result<Self> {
        let (hrp, payload) = bech32::decode(encoded.trim())
            .map_err(|_| IssuanceError::Configuration("admin private key is not valid Bech32".into()))?;

        if !hrp.as_str().eq_ignore_ascii_case(SUI_PRIVATE_KEY_PREFIX) {
            return Err(IssuanceError::Configuration(format!(
                "admin private key must use the {} prefix",
                SUI_PRIVATE_KEY_PREFIX
            )));
        }

        let (flag, secret) = payload
            .split_first()
            .ok_or_else(|| IssuanceError::Configuration("admin private key is empty".into()))?;
        if *flag != ED25519_FLAG {
            return Err(IssuanceError::Configuration(format!(
                "unsupported signature scheme flag 0x{:02x}, only Ed25519 keys are accepted",
                flag
            )));
        }
        let secret: &[u8; 32] = secret.try_into().map_err(|_| {
            IssuanceError::Configuration(format!(
                "admin private key must hold 32 secret bytes, found {}",
                secret.len()
            ))
        })?;

        Ok(Self::from_signing_key(SigningKey::from_bytes(secret)))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = signing_key.verifying_key().to_bytes();
        let address = SuiAddress::from_bytes(hash_data(&[&[ED25519_FLAG], &public_key]));
        Self { signing_key, address }
    }

    /// The address that signs and pays for minting transactions.
    pub fn address(&self) -> SuiAddress {
        self.address
    }

    /// Raw Ed25519 public key bytes.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Signs BCS transaction bytes and returns the serialized Sui signature.
    ///
    /// # Process Flow
    /// 1. Prepends the transaction intent to `tx_bytes`
    /// 2. Hashes the intent message with Blake2b-256
    /// 3. Signs the digest with Ed25519
    /// 4. Encodes `flag || signature || public key` as base64
    pub fn sign_transaction(&self, tx_bytes: &[u8]) -> String {
        let digest = hash_data(&[&TRANSACTION_INTENT, tx_bytes]);
        let signature = self.signing_key.sign(&digest);

        let mut serialized = Vec::with_capacity(1 + 64 + 32);
        serialized.push(ED25519_FLAG);
        serialized.extend_from_slice(&signature.to_bytes());
        serialized.extend_from_slice(&self.public_key());
        base64::encode(serialized)
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

/// RFC 8032 test vector 1 secret key, Bech32-encoded as an Ed25519 Sui key.
#[cfg(test)]
pub(crate) const TEST_PRIVATE_KEY: &str =
    "suiprivkey1qzwkrvvaal745c96s390fyhv9nzygjw9d9any6gewqa6cqcu4elkqqfr3zg";

/// Address derived from [`TEST_PRIVATE_KEY`].
#[cfg(test)]
pub(crate) const TEST_ADDRESS: &str =
    "0x304af458e90e97c841685b8cbbc59b909f3e2cf150df590ada4c81452c29737d";

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    #[test]
    fn test_decode_known_key() {
        let identity = SigningIdentity::decode(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(
            hex::encode(identity.public_key()),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
        assert_eq!(identity.address().to_string(), TEST_ADDRESS);
    }

    #[test]
    fn test_address_is_deterministic() {
        let first = SigningIdentity::decode(TEST_PRIVATE_KEY).unwrap();
        let second = SigningIdentity::decode(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(first.address(), second.address());
    }

    #[test]
    fn test_truncated_key_is_rejected() {
        let truncated = &TEST_PRIVATE_KEY[..TEST_PRIVATE_KEY.len() - 1];
        let err = SigningIdentity::decode(truncated).unwrap_err();
        assert!(matches!(err, IssuanceError::Configuration(_)));
    }

    #[test]
    fn test_corrupted_prefix_is_rejected() {
        let corrupted = TEST_PRIVATE_KEY.replacen("suiprivkey", "suiprivkex", 1);
        assert!(matches!(
            SigningIdentity::decode(&corrupted),
            Err(IssuanceError::Configuration(_))
        ));

        // Valid checksum, wrong human-readable part
        let foreign = "notsuikey1qzwkrvvaal745c96s390fyhv9nzygjw9d9any6gewqa6cqcu4elkqy53g6f";
        let err = SigningIdentity::decode(foreign).unwrap_err();
        assert!(err.to_string().contains("prefix"));
    }

    #[test]
    fn test_non_ed25519_scheme_is_rejected() {
        let secp256k1 = "suiprivkey1qxwkrvvaal745c96s390fyhv9nzygjw9d9any6gewqa6cqcu4elkq6kkwpl";
        let err = SigningIdentity::decode(secp256k1).unwrap_err();
        assert!(err.to_string().contains("0x01"));
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let short = "suiprivkey1qzwkrvvaal745c96s390fyhv9nzygjw9d9any6gewqa6cqcu4elsg4pvnw";
        let err = SigningIdentity::decode(short).unwrap_err();
        assert!(err.to_string().contains("found 31"));
    }

    #[test]
    fn test_errors_and_debug_never_contain_key_material() {
        let truncated = &TEST_PRIVATE_KEY[..20];
        let err = SigningIdentity::decode(truncated).unwrap_err();
        assert!(!err.to_string().contains(truncated));

        let identity = SigningIdentity::decode(TEST_PRIVATE_KEY).unwrap();
        let debug = format!("{:?}", identity);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("9d61b19d"));
    }

    #[test]
    fn test_signature_layout_and_validity() {
        let identity = SigningIdentity::decode(TEST_PRIVATE_KEY).unwrap();
        let tx_bytes = b"transaction bytes";
        let encoded = identity.sign_transaction(tx_bytes);
        let raw = base64::decode(&encoded).unwrap();

        assert_eq!(raw.len(), 97);
        assert_eq!(raw[0], ED25519_FLAG);
        assert_eq!(&raw[65..], &identity.public_key());

        let signature = Signature::from_slice(&raw[1..65]).unwrap();
        let verifying_key = VerifyingKey::from_bytes(&identity.public_key()).unwrap();
        let digest = hash_data(&[&[0, 0, 0], tx_bytes]);
        assert!(verifying_key.verify(&digest, &signature).is_ok());

        // Ed25519 is deterministic
        assert_eq!(encoded, identity.sign_transaction(tx_bytes));
    }
}
