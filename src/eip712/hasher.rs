//! EIP-712 Hashing
//!
//! Implements domain separator and struct hashing for EIP-712.

use super::encoder::{encode_data, Types};
use super::types::*;
use crate::utils::crypto::keccak256;
use std::collections::HashMap;

/// Magic prefix for EIP-712 encoding
const EIP712_PREFIX: &[u8] = b"\x19\x01";

/// domainSeparator = hashStruct(eip712Domain)
pub fn domain_separator(domain: &Eip712Domain) -> Result<[u8; 32], Eip712Error> {
    let mut types = HashMap::new();
    types.insert(DOMAIN_TYPE_NAME.to_string(), domain.fields());

    hash_struct(DOMAIN_TYPE_NAME, &domain.to_value()?, &types)
}

/// hashStruct(s) = keccak256(typeHash || encodeData(s))
pub fn hash_struct(
    type_name: &str,
    data: &serde_json::Value,
    types: &Types,
) -> Result<[u8; 32], Eip712Error> {
    let encoded = encode_data(type_name, data, types)?;
    Ok(keccak256(&encoded))
}

/// The intermediate hashes of a typed-data digest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eip712PreImage {
    pub domain_separator: [u8; 32],
    pub struct_hash: [u8; 32],
    pub final_hash: [u8; 32],
}

/// Compute the domain separator, struct hash and final digest
pub fn get_pre_image(typed_data: &TypedData) -> Result<Eip712PreImage, Eip712Error> {
    typed_data.validate()?;

    let domain_separator = domain_separator(&typed_data.domain)?;
    let struct_hash = hash_struct(&typed_data.primary_type, &typed_data.message, &typed_data.types)?;

    let mut data = Vec::with_capacity(2 + 32 + 32);
    data.extend_from_slice(EIP712_PREFIX);
    data.extend_from_slice(&domain_separator);
    data.extend_from_slice(&struct_hash);

    Ok(Eip712PreImage {
        domain_separator,
        struct_hash,
        final_hash: keccak256(&data),
    })
}

/// hash = keccak256("\x19\x01" || domainSeparator || hashStruct(message))
pub fn hash_typed_data(typed_data: &TypedData) -> Result<[u8; 32], Eip712Error> {
    Ok(get_pre_image(typed_data)?.final_hash)
}
