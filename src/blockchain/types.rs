// src/blockchain/types.rs
//! Sui primitive and transaction types in their BCS wire layout.
//!
//! Only the subset needed to submit a single programmable Move call is
//! modelled. Enum variant order mirrors the on-chain definitions because BCS
//! encodes a variant by its position.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const SUI_ADDRESS_LENGTH: usize = 32;

/// Errors produced while parsing Sui identifiers from their text form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseIdError {
    #[error("expected 0x-prefixed hex, got {0:?}")]
    MissingPrefix(String),

    #[error("identifier is longer than 32 bytes: {0:?}")]
    TooLong(String),

    #[error("invalid hex in {0:?}")]
    InvalidHex(String),

    #[error("invalid base58 digest {0:?}")]
    InvalidDigest(String),
}

/// A 32-byte Sui account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SuiAddress(pub [u8; SUI_ADDRESS_LENGTH]);

/// Object IDs share the address representation.
pub type ObjectId = SuiAddress;

impl SuiAddress {
    pub const fn from_bytes(bytes: [u8; SUI_ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl FromStr for SuiAddress {
    type Err = ParseIdError;

    /// Parses `0x`-prefixed hex. Short forms such as `0x2` are left-padded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| ParseIdError::MissingPrefix(s.to_string()))?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseIdError::InvalidHex(s.to_string()));
        }
        if digits.len() > SUI_ADDRESS_LENGTH * 2 {
            return Err(ParseIdError::TooLong(s.to_string()));
        }

        let padded = format!("{:0>64}", digits);
        let mut bytes = [0u8; SUI_ADDRESS_LENGTH];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|_| ParseIdError::InvalidHex(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for SuiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for SuiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SuiAddress({})", self)
    }
}

/// Object version number.
pub type SequenceNumber = u64;

/// 32-byte object digest. Unlike addresses, digests are length-prefixed in BCS.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ObjectDigest(pub [u8; 32]);

impl ObjectDigest {
    /// Parses the base58 form returned by the JSON-RPC API.
    pub fn from_base58(s: &str) -> Result<Self, ParseIdError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| ParseIdError::InvalidDigest(s.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseIdError::InvalidDigest(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for ObjectDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl fmt::Debug for ObjectDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectDigest({})", bs58::encode(self.0).into_string())
    }
}

/// `(id, version, digest)` triple identifying one version of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectRef(pub ObjectId, pub SequenceNumber, pub ObjectDigest);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ObjectArg {
    ImmOrOwnedObject(ObjectRef),
    SharedObject {
        id: ObjectId,
        initial_shared_version: SequenceNumber,
        mutable: bool,
    },
}

/// A transaction input: either BCS-encoded pure bytes or an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CallArg {
    Pure(Vec<u8>),
    Object(ObjectArg),
}

/// Reference to a value available to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Argument {
    // Never produced here; it only holds tag 0 so `Input` encodes as 1.
    #[allow(dead_code)]
    GasCoin,
    Input(u16),
}

/// Generic type instantiation; the credential contract takes none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeTag {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgrammableMoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<TypeTag>,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Command {
    MoveCall(Box<ProgrammableMoveCall>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgrammableTransaction {
    pub inputs: Vec<CallArg>,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransactionKind {
    ProgrammableTransaction(ProgrammableTransaction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GasData {
    pub payment: Vec<ObjectRef>,
    pub owner: SuiAddress,
    pub price: u64,
    pub budget: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionExpiration {
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionDataV1 {
    pub kind: TransactionKind,
    pub sender: SuiAddress,
    pub gas_data: GasData,
    pub expiration: TransactionExpiration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransactionData {
    V1(TransactionDataV1),
}

impl TransactionData {
    /// BCS bytes of the transaction, as signed and submitted.
    pub fn to_bcs(&self) -> Result<Vec<u8>, bcs::Error> {
        bcs::to_bytes(self)
    }
}
