// src/blockchain/transaction.rs
//! Credential contract call construction.
//!
//! Builds the `cert::mint_credential_v2` Move call that records a credential
//! on Sui. Arguments are positional and must match the entry function's
//! signature exactly:
//!
//! ```text
//! mint_credential_v2(&AdminCap, &Version, address, String, String, String, String, String)
//!                    cap        version   issuer   name    course  date    issuer  blob id
//! ```

use crate::blockchain::sui_client::LedgerError;
use crate::blockchain::types::{
    Argument, CallArg, Command, ObjectArg, ObjectId, ProgrammableMoveCall, ProgrammableTransaction,
    SuiAddress,
};
use crate::models::credential::CredentialRequest;
use crate::utils::config::Settings;
use std::collections::HashMap;

/// Module holding the credential entry points.
pub const CREDENTIAL_MODULE: &str = "cert";

/// Entry function that mints a credential record.
pub const MINT_FUNCTION: &str = "mint_credential_v2";

/// Issuing organization recorded on every credential.
pub const ISSUER_NAME: &str = "EnumVerse Academy Inc.";

/// A pure (non-object) argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PureValue {
    Address(SuiAddress),
    String(String),
}

impl PureValue {
    /// BCS encoding of the value as the Move VM expects it.
    pub fn to_bcs(&self) -> Result<Vec<u8>, bcs::Error> {
        match self {
            PureValue::Address(address) => bcs::to_bytes(address),
            PureValue::String(value) => bcs::to_bytes(value),
        }
    }
}

/// One positional argument of a Move call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArgument {
    /// An on-chain object, resolved to a reference at submission time
    Object(ObjectId),
    Pure(PureValue),
}

/// A fully specified Move call, independent of gas and object versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSpec {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub arguments: Vec<CallArgument>,
}

impl TransactionSpec {
    /// Object IDs referenced by the call, in argument order.
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.arguments.iter().filter_map(|argument| match argument {
            CallArgument::Object(id) => Some(*id),
            CallArgument::Pure(_) => None,
        })
    }

    /// Lowers the call into a single-command programmable transaction.
    ///
    /// Each argument becomes one input, in order.
    ///
    /// # Arguments
    /// * `objects` - Resolved object arguments keyed by ID
    ///
    /// # Errors
    /// Returns an error if an object argument was not resolved or a pure
    /// value fails to encode.
    pub fn to_programmable(
        &self,
        objects: &HashMap<ObjectId, ObjectArg>,
    ) -> Result<ProgrammableTransaction, LedgerError> {
        let mut inputs = Vec::with_capacity(self.arguments.len());
        for argument in &self.arguments {
            let input = match argument {
                CallArgument::Object(id) => CallArg::Object(
                    objects
                        .get(id)
                        .cloned()
                        .ok_or(LedgerError::UnresolvedObject(*id))?,
                ),
                CallArgument::Pure(value) => CallArg::Pure(value.to_bcs()?),
            };
            inputs.push(input);
        }

        let arguments = (0..inputs.len() as u16).map(Argument::Input).collect();
        let call = ProgrammableMoveCall {
            package: self.package,
            module: self.module.clone(),
            function: self.function.clone(),
            type_arguments: Vec::new(),
            arguments,
        };

        Ok(ProgrammableTransaction {
            inputs,
            commands: vec![Command::MoveCall(Box::new(call))],
        })
    }
}

/// The deployed credential package and the objects its mint call needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialContract {
    /// Package containing the `cert` module
    pub package_id: ObjectId,
    /// Capability authorizing the admin to mint
    pub admin_cap_id: ObjectId,
    /// Shared object pinning the package version
    pub version_object_id: ObjectId,
}

impl CredentialContract {
    pub fn new(package_id: ObjectId, admin_cap_id: ObjectId, version_object_id: ObjectId) -> Self {
        Self {
            package_id,
            admin_cap_id,
            version_object_id,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.package_id, settings.admin_cap_id, settings.version_object_id)
    }

    /// Builds the mint call binding `blob_id` to the recipient metadata.
    ///
    /// # Arguments
    /// * `blob_id` - Walrus blob ID of the stored artifact
    /// * `request` - Recipient metadata
    /// * `issuer` - Address of the signing admin account
    pub fn mint_credential(
        &self,
        blob_id: &str,
        request: &CredentialRequest,
        issuer: SuiAddress,
    ) -> TransactionSpec {
        TransactionSpec {
            package: self.package_id,
            module: CREDENTIAL_MODULE.to_string(),
            function: MINT_FUNCTION.to_string(),
            arguments: vec![
                CallArgument::Object(self.admin_cap_id),
                CallArgument::Object(self.version_object_id),
                CallArgument::Pure(PureValue::Address(issuer)),
                CallArgument::Pure(PureValue::String(request.recipient_name.clone())),
                CallArgument::Pure(PureValue::String(request.course_name.clone())),
                CallArgument::Pure(PureValue::String(request.issue_date.clone())),
                CallArgument::Pure(PureValue::String(ISSUER_NAME.to_string())),
                CallArgument::Pure(PureValue::String(blob_id.to_string())),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::{ObjectDigest, ObjectRef};

    fn contract() -> CredentialContract {
        CredentialContract::new(
            SuiAddress::from_bytes([0xa1; 32]),
            SuiAddress::from_bytes([0xc2; 32]),
            SuiAddress::from_bytes([0xd3; 32]),
        )
    }

    fn request() -> CredentialRequest {
        CredentialRequest {
            recipient_email: "a@b.com".into(),
            recipient_name: "Alice".into(),
            course_name: "X101".into(),
            issue_date: "2024-01-01".into(),
        }
    }

    fn string(value: &str) -> CallArgument {
        CallArgument::Pure(PureValue::String(value.to_string()))
    }

    #[test]
    fn test_mint_arguments_are_ordered() {
        let issuer = SuiAddress::from_bytes([0x11; 32]);
        let spec = contract().mint_credential("Q1", &request(), issuer);

        assert_eq!(spec.package, SuiAddress::from_bytes([0xa1; 32]));
        assert_eq!(spec.module, "cert");
        assert_eq!(spec.function, "mint_credential_v2");
        assert_eq!(
            spec.arguments,
            vec![
                CallArgument::Object(SuiAddress::from_bytes([0xc2; 32])),
                CallArgument::Object(SuiAddress::from_bytes([0xd3; 32])),
                CallArgument::Pure(PureValue::Address(issuer)),
                string("Alice"),
                string("X101"),
                string("2024-01-01"),
                string("EnumVerse Academy Inc."),
                string("Q1"),
            ]
        );
    }

    #[test]
    fn test_email_is_not_minted() {
        let spec = contract().mint_credential("Q1", &request(), SuiAddress::from_bytes([0x11; 32]));
        assert!(!spec.arguments.contains(&string("a@b.com")));
    }

    #[test]
    fn test_build_is_deterministic() {
        let issuer = SuiAddress::from_bytes([0x11; 32]);
        assert_eq!(
            contract().mint_credential("Q1", &request(), issuer),
            contract().mint_credential("Q1", &request(), issuer)
        );
    }

    #[test]
    fn test_object_ids_in_argument_order() {
        let spec = contract().mint_credential("Q1", &request(), SuiAddress::from_bytes([0x11; 32]));
        let ids: Vec<_> = spec.object_ids().collect();
        assert_eq!(ids, vec![SuiAddress::from_bytes([0xc2; 32]), SuiAddress::from_bytes([0xd3; 32])]);
    }

    #[test]
    fn test_pure_string_encoding() {
        assert_eq!(
            PureValue::String("X101".into()).to_bcs().unwrap(),
            vec![4, b'X', b'1', b'0', b'1']
        );
        assert_eq!(
            PureValue::Address(SuiAddress::from_bytes([0x11; 32])).to_bcs().unwrap(),
            vec![0x11; 32]
        );
    }

    #[test]
    fn test_to_programmable() {
        let spec = contract().mint_credential("Q1", &request(), SuiAddress::from_bytes([0x11; 32]));
        let cap_ref = ObjectRef(SuiAddress::from_bytes([0xc2; 32]), 7, ObjectDigest([1; 32]));
        let mut objects = HashMap::new();
        objects.insert(SuiAddress::from_bytes([0xc2; 32]), ObjectArg::ImmOrOwnedObject(cap_ref));
        objects.insert(
            SuiAddress::from_bytes([0xd3; 32]),
            ObjectArg::SharedObject {
                id: SuiAddress::from_bytes([0xd3; 32]),
                initial_shared_version: 3,
                mutable: true,
            },
        );

        let programmable = spec.to_programmable(&objects).unwrap();
        assert_eq!(programmable.inputs.len(), 8);
        assert_eq!(programmable.inputs[0], CallArg::Object(ObjectArg::ImmOrOwnedObject(cap_ref)));
        assert_eq!(programmable.inputs[7], CallArg::Pure(vec![2, b'Q', b'1']));

        let Command::MoveCall(call) = &programmable.commands[0];
        assert_eq!(call.arguments, (0..8).map(Argument::Input).collect::<Vec<_>>());
        assert!(call.type_arguments.is_empty());
    }

    #[test]
    fn test_unresolved_object_fails() {
        let spec = contract().mint_credential("Q1", &request(), SuiAddress::from_bytes([0x11; 32]));
        let err = spec.to_programmable(&HashMap::new()).unwrap_err();
        assert!(matches!(err, LedgerError::UnresolvedObject(_)));
    }
}
