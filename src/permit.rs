//! EIP-2612 Permit
//!
//! Strongly-typed permit domain and message, their conversion into generic
//! typed data, and the report printed after a sign/verify cycle.

use crate::eip712::{
    decompose, get_pre_image, recover_typed_data, Eip712Domain, Eip712Signature, TypedData,
    TypedDataField, TypedDataSigner,
};
use crate::error::PermitResult;
use crate::utils::crypto::to_checksum_address;
use ethers_core::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PERMIT_TYPE_NAME: &str = "Permit";

/// The `Permit(owner,spender,value,nonce,deadline)` schema, in encoding order
pub fn permit_schema() -> Vec<TypedDataField> {
    vec![
        TypedDataField::new("owner", "address"),
        TypedDataField::new("spender", "address"),
        TypedDataField::new("value", "uint256"),
        TypedDataField::new("nonce", "uint256"),
        TypedDataField::new("deadline", "uint256"),
    ]
}

/// Signing context of an ERC-20 permit; must match the token byte for byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl PermitDomain {
    pub fn to_eip712(&self) -> Eip712Domain {
        Eip712Domain {
            name: Some(self.name.clone()),
            version: Some(self.version.clone()),
            chain_id: Some(serde_json::Value::from(self.chain_id)),
            verifying_contract: Some(to_checksum_address(self.verifying_contract.as_bytes())),
            salt: None,
        }
    }
}

/// The values signed by the token owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitMessage {
    pub owner: Address,
    pub spender: Address,
    /// Amount in token base units
    pub value: U256,
    pub nonce: U256,
    /// Unix timestamp after which the permit is rejected on-chain
    pub deadline: U256,
}

impl PermitMessage {
    pub fn to_typed_data(&self, domain: &PermitDomain) -> TypedData {
        let mut types = HashMap::new();
        types.insert(PERMIT_TYPE_NAME.to_string(), permit_schema());

        // uint256 values travel as decimal strings so nothing is truncated
        let message = serde_json::json!({
            "owner": to_checksum_address(self.owner.as_bytes()),
            "spender": to_checksum_address(self.spender.as_bytes()),
            "value": self.value.to_string(),
            "nonce": self.nonce.to_string(),
            "deadline": self.deadline.to_string(),
        });

        TypedData {
            types,
            primary_type: PERMIT_TYPE_NAME.to_string(),
            domain: domain.to_eip712(),
            message,
        }
    }
}

/// Sign a permit with the owner's key
pub fn sign_permit(
    signer: &TypedDataSigner,
    domain: &PermitDomain,
    message: &PermitMessage,
) -> PermitResult<Eip712Signature> {
    Ok(signer.sign(&message.to_typed_data(domain))?)
}

/// Recover the checksummed address that signed a permit
pub fn recover_permit(
    domain: &PermitDomain,
    message: &PermitMessage,
    signature: &Eip712Signature,
) -> PermitResult<String> {
    Ok(recover_typed_data(&message.to_typed_data(domain), signature)?)
}

/// Output of one sign/verify cycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PermitReport {
    pub signature: String,
    pub recovered: String,
    pub expected_signer: String,
    pub valid: bool,
    pub v: u8,
    pub r: String,
    pub s: String,
    pub digest: String,
    pub domain_separator: String,
    pub message: serde_json::Value,
}

impl PermitReport {
    /// Sign `typed_data`, recover the signer and decompose the signature
    pub fn build(signer: &TypedDataSigner, typed_data: &TypedData) -> PermitResult<Self> {
        let pre_image = get_pre_image(typed_data)?;
        let signature = signer.sign(typed_data)?;

        let recovered = recover_typed_data(typed_data, &signature)?;
        let expected_signer = signer.checksum_address();
        let parts = decompose(&signature.to_bytes())?;

        Ok(Self {
            signature: signature.to_hex(),
            valid: recovered == expected_signer,
            recovered,
            expected_signer,
            v: parts.v,
            r: parts.r_hex(),
            s: parts.s_hex(),
            digest: format!("0x{}", hex::encode(pre_image.final_hash)),
            domain_separator: format!("0x{}", hex::encode(pre_image.domain_separator)),
            message: typed_data.message.clone(),
        })
    }

    /// Plain-text rendering, one `label: value` per line
    pub fn to_text(&self) -> String {
        format!(
            "Signature: {}\nRecovered: {}\nValid: {}\nv: {}\nr: {}\ns: {}\n",
            self.signature, self.recovered, self.valid, self.v, self.r, self.s
        )
    }
}
