//! EIP-712 Type Definitions
//!
//! Core data structures for EIP-712 typed data signing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the implicit domain struct type
pub const DOMAIN_TYPE_NAME: &str = "EIP712Domain";

/// Half of the secp256k1 group order; canonical signatures have `s <= N/2`
pub const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// A field in a struct type definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedDataField {
    /// The name of the field
    pub name: String,
    /// The type of the field (e.g., "address", "uint256", "bytes32")
    #[serde(rename = "type")]
    pub type_name: String,
}

impl TypedDataField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// The EIP-712 domain separator data
///
/// Only the fields that are present take part in the `EIP712Domain` type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// EIP-155 chain ID, as a JSON number or a decimal/hex string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

impl Eip712Domain {
    /// The `EIP712Domain` fields, in canonical order, for the values present
    pub fn fields(&self) -> Vec<TypedDataField> {
        let mut fields = Vec::new();

        if self.name.is_some() {
            fields.push(TypedDataField::new("name", "string"));
        }
        if self.version.is_some() {
            fields.push(TypedDataField::new("version", "string"));
        }
        if self.chain_id.is_some() {
            fields.push(TypedDataField::new("chainId", "uint256"));
        }
        if self.verifying_contract.is_some() {
            fields.push(TypedDataField::new("verifyingContract", "address"));
        }
        if self.salt.is_some() {
            fields.push(TypedDataField::new("salt", "bytes32"));
        }

        fields
    }

    pub fn to_value(&self) -> Result<serde_json::Value, Eip712Error> {
        serde_json::to_value(self).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }
}

/// Complete EIP-712 typed data structure (the `eth_signTypedData_v4` shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    /// Type definitions (struct name -> fields)
    pub types: HashMap<String, Vec<TypedDataField>>,

    /// The name of the primary type being signed
    pub primary_type: String,

    pub domain: Eip712Domain,

    /// The actual message data to sign
    pub message: serde_json::Value,
}

impl TypedData {
    pub fn from_json(json: &str) -> Result<Self, Eip712Error> {
        serde_json::from_str(json).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, Eip712Error> {
        serde_json::to_string(self).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// Validate the typed data structure
    pub fn validate(&self) -> Result<(), Eip712Error> {
        if !self.types.contains_key(&self.primary_type) {
            return Err(Eip712Error::InvalidPrimaryType(self.primary_type.clone()));
        }

        for fields in self.types.values() {
            for field in fields {
                self.validate_type(&field.type_name)?;
            }
        }

        Ok(())
    }

    /// Check if a type is valid (either a built-in type or defined in types)
    fn validate_type(&self, type_name: &str) -> Result<(), Eip712Error> {
        let base_type = match type_name.find('[') {
            Some(pos) => {
                if !type_name.ends_with(']') {
                    return Err(Eip712Error::InvalidType(type_name.to_string()));
                }
                &type_name[..pos]
            }
            None => type_name,
        };

        if is_atomic_type(base_type) || is_dynamic_type(base_type) || self.types.contains_key(base_type) {
            return Ok(());
        }

        Err(Eip712Error::InvalidType(type_name.to_string()))
    }
}

/// EIP-712 signature components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eip712Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Recovery byte, 27 or 28 for signatures produced here
    pub v: u8,
}

impl Eip712Signature {
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    /// Split a 65-byte signature (r || s || v)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Eip712Error> {
        if bytes.len() != 65 {
            return Err(Eip712Error::MalformedSignature(format!(
                "expected 65 bytes, got {}",
                bytes.len()
            )));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);

        Ok(Self { r, s, v: bytes[64] })
    }

    /// Parse a hex signature with or without the `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self, Eip712Error> {
        let s = s.trim();
        let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|e| Eip712Error::MalformedSignature(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    pub fn r_hex(&self) -> String {
        format!("0x{}", hex::encode(self.r))
    }

    pub fn s_hex(&self) -> String {
        format!("0x{}", hex::encode(self.s))
    }

    /// Map `v` to a secp256k1 recovery id.
    ///
    /// Accepts 27/28, raw 0/1, and EIP-155 `chainId * 2 + 35 + recId`.
    pub fn recovery_id(&self) -> Result<i32, Eip712Error> {
        match self.v {
            0 | 1 => Ok(self.v as i32),
            27 | 28 => Ok((self.v - 27) as i32),
            v if v >= 35 => Ok(((v - 35) % 2) as i32),
            v => Err(Eip712Error::MalformedSignature(format!("invalid recovery byte v={}", v))),
        }
    }

    /// Reject zero scalars and upper-half `s` values
    pub fn check_scalars(&self) -> Result<(), Eip712Error> {
        if self.r == [0u8; 32] {
            return Err(Eip712Error::MalformedSignature("r is zero".to_string()));
        }
        if self.s == [0u8; 32] {
            return Err(Eip712Error::MalformedSignature("s is zero".to_string()));
        }
        // Big-endian arrays compare in numeric order
        if self.s > SECP256K1_HALF_ORDER {
            return Err(Eip712Error::MalformedSignature(
                "s is in the upper half of the curve order".to_string(),
            ));
        }
        Ok(())
    }
}

/// Errors that can occur during EIP-712 operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum Eip712Error {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Invalid primary type: {0}")]
    InvalidPrimaryType(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid value for type {type_name}: {value}")]
    InvalidFieldType { type_name: String, value: String },

    #[error("Invalid private key: {0}")]
    KeyError(String),

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),
}

impl Eip712Error {
    pub(crate) fn invalid_value(type_name: &str, value: impl ToString) -> Self {
        Eip712Error::InvalidFieldType {
            type_name: type_name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Bit width of a `uintN`/`intN` type, if the name is one
pub fn integer_bits(type_name: &str) -> Option<usize> {
    let bits = type_name
        .strip_prefix("uint")
        .or_else(|| type_name.strip_prefix("int"))?;
    let n: usize = bits.parse().ok()?;
    (n > 0 && n <= 256 && n % 8 == 0).then_some(n)
}

/// Size of a `bytesN` type, if the name is one
pub fn fixed_bytes_size(type_name: &str) -> Option<usize> {
    let size = type_name.strip_prefix("bytes")?;
    let n: usize = size.parse().ok()?;
    (n > 0 && n <= 32).then_some(n)
}

/// Check if a type is an atomic (fixed-size) type
pub fn is_atomic_type(type_name: &str) -> bool {
    type_name == "address"
        || type_name == "bool"
        || integer_bits(type_name).is_some()
        || fixed_bytes_size(type_name).is_some()
}

/// Check if a type is a dynamic type
pub fn is_dynamic_type(type_name: &str) -> bool {
    type_name == "bytes" || type_name == "string"
}
