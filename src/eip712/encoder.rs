//! EIP-712 Type Encoding
//!
//! Implements `encodeType` and `encodeData` from the EIP-712 rules.
//! Every field value is encoded to exactly one 32-byte word:
//! atomic values are padded, dynamic values, structs and arrays are hashed.

use super::types::*;
use crate::utils::crypto::{keccak256, parse_address_bytes};
use ethers_core::types::{I256, U256};
use std::collections::{HashMap, HashSet};

pub type Types = HashMap<String, Vec<TypedDataField>>;

/// Encode a type string for a struct type
/// Format: "TypeName(type1 name1,type2 name2,...)Dep1(...)Dep2(...)"
pub fn encode_type(type_name: &str, types: &Types) -> Result<String, Eip712Error> {
    let fields = types
        .get(type_name)
        .ok_or_else(|| Eip712Error::InvalidType(type_name.to_string()))?;

    let mut result = format_type_string(type_name, fields);

    // Referenced types follow the primary type, sorted by name
    let mut deps: Vec<_> = find_type_dependencies(type_name, types)
        .into_iter()
        .filter(|dep| dep != type_name)
        .collect();
    deps.sort();

    for dep in deps {
        if let Some(dep_fields) = types.get(&dep) {
            result.push_str(&format_type_string(&dep, dep_fields));
        }
    }

    Ok(result)
}

fn format_type_string(type_name: &str, fields: &[TypedDataField]) -> String {
    let field_strs: Vec<String> = fields
        .iter()
        .map(|f| format!("{} {}", f.type_name, f.name))
        .collect();

    format!("{}({})", type_name, field_strs.join(","))
}

/// Find all struct types reachable from `type_name`, itself included
pub fn find_type_dependencies(type_name: &str, types: &Types) -> HashSet<String> {
    let mut dependencies = HashSet::new();
    let mut to_visit = vec![type_name.to_string()];

    while let Some(current) = to_visit.pop() {
        if dependencies.contains(&current) {
            continue;
        }

        if let Some(fields) = types.get(&current) {
            dependencies.insert(current.clone());

            for field in fields {
                let base_type = get_base_type(&field.type_name);
                if types.contains_key(base_type) && !dependencies.contains(base_type) {
                    to_visit.push(base_type.to_string());
                }
            }
        }
    }

    dependencies
}

/// Get the base type from a potentially array type
/// e.g., "Person[]" -> "Person", "uint256[2][]" -> "uint256"
pub fn get_base_type(type_name: &str) -> &str {
    match type_name.find('[') {
        Some(pos) => &type_name[..pos],
        None => type_name,
    }
}

/// typeHash = keccak256(encodeType(typeOf(s)))
pub fn type_hash(type_name: &str, types: &Types) -> Result<[u8; 32], Eip712Error> {
    let encoded = encode_type(type_name, types)?;
    Ok(keccak256(encoded.as_bytes()))
}

/// typeHash || encodeData(s), the preimage of hashStruct
pub fn encode_data(
    type_name: &str,
    value: &serde_json::Value,
    types: &Types,
) -> Result<Vec<u8>, Eip712Error> {
    let obj = value
        .as_object()
        .ok_or_else(|| Eip712Error::invalid_value(type_name, value))?;

    let fields = types
        .get(type_name)
        .ok_or_else(|| Eip712Error::InvalidType(type_name.to_string()))?;

    let mut encoded = Vec::with_capacity(32 * (fields.len() + 1));
    encoded.extend_from_slice(&type_hash(type_name, types)?);

    // Field order comes from the schema, not from the message object
    for field in fields {
        let field_value = obj
            .get(&field.name)
            .ok_or_else(|| Eip712Error::MissingField(format!("{}.{}", type_name, field.name)))?;

        encoded.extend_from_slice(&encode_field(&field.type_name, field_value, types)?);
    }

    Ok(encoded)
}

/// Encode one field value into its 32-byte word
pub fn encode_field(
    type_name: &str,
    value: &serde_json::Value,
    types: &Types,
) -> Result<[u8; 32], Eip712Error> {
    if type_name.ends_with(']') {
        return encode_array(type_name, value, types);
    }

    if types.contains_key(type_name) {
        return Ok(keccak256(&encode_data(type_name, value, types)?));
    }

    match type_name {
        "string" => {
            let s = value
                .as_str()
                .ok_or_else(|| Eip712Error::invalid_value(type_name, value))?;
            Ok(keccak256(s.as_bytes()))
        }
        "bytes" => {
            let s = value
                .as_str()
                .ok_or_else(|| Eip712Error::invalid_value(type_name, value))?;
            Ok(keccak256(&parse_hex(type_name, s)?))
        }
        _ => encode_atomic(type_name, value),
    }
}

/// Arrays hash the concatenation of their element words
fn encode_array(
    type_name: &str,
    value: &serde_json::Value,
    types: &Types,
) -> Result<[u8; 32], Eip712Error> {
    let open = type_name
        .rfind('[')
        .ok_or_else(|| Eip712Error::InvalidType(type_name.to_string()))?;
    let element_type = &type_name[..open];
    let length = &type_name[open + 1..type_name.len() - 1];

    let items = value
        .as_array()
        .ok_or_else(|| Eip712Error::invalid_value(type_name, value))?;

    if !length.is_empty() {
        let expected: usize = length
            .parse()
            .map_err(|_| Eip712Error::InvalidType(type_name.to_string()))?;
        if items.len() != expected {
            return Err(Eip712Error::invalid_value(
                type_name,
                format!("expected {} elements, got {}", expected, items.len()),
            ));
        }
    }

    let mut encoded = Vec::with_capacity(32 * items.len());
    for item in items {
        encoded.extend_from_slice(&encode_field(element_type, item, types)?);
    }

    Ok(keccak256(&encoded))
}

/// Encode an atomic (fixed-size) value
fn encode_atomic(type_name: &str, value: &serde_json::Value) -> Result<[u8; 32], Eip712Error> {
    let mut word = [0u8; 32];

    if type_name == "address" {
        let addr = value
            .as_str()
            .ok_or_else(|| Eip712Error::invalid_value(type_name, value))?;
        let bytes =
            parse_address_bytes(addr).map_err(|e| Eip712Error::invalid_value(type_name, e))?;
        word[12..].copy_from_slice(&bytes);
        return Ok(word);
    }

    if type_name == "bool" {
        let b = value
            .as_bool()
            .ok_or_else(|| Eip712Error::invalid_value(type_name, value))?;
        word[31] = b as u8;
        return Ok(word);
    }

    if let Some(bits) = integer_bits(type_name) {
        if type_name.starts_with('u') {
            parse_uint(type_name, bits, value)?.to_big_endian(&mut word);
        } else {
            // Two's complement of the 256-bit value is the sign-extended word
            parse_int(type_name, bits, value)?.into_raw().to_big_endian(&mut word);
        }
        return Ok(word);
    }

    if let Some(size) = fixed_bytes_size(type_name) {
        let s = value
            .as_str()
            .ok_or_else(|| Eip712Error::invalid_value(type_name, value))?;
        let bytes = parse_hex(type_name, s)?;
        if bytes.len() > size {
            return Err(Eip712Error::invalid_value(
                type_name,
                format!("bytes too long: {} > {}", bytes.len(), size),
            ));
        }
        // bytesN is left-aligned
        word[..bytes.len()].copy_from_slice(&bytes);
        return Ok(word);
    }

    Err(Eip712Error::InvalidType(type_name.to_string()))
}

/// Parse an unsigned integer from a JSON number or a decimal/hex string
pub fn parse_uint(
    type_name: &str,
    bits: usize,
    value: &serde_json::Value,
) -> Result<U256, Eip712Error> {
    let parsed = match value {
        // Floats and negatives are rejected; large numbers must be strings
        serde_json::Value::Number(n) => n.as_u64().map(U256::from),
        serde_json::Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
                Some(_) => None,
                // from_dec_str("") is Ok(0)
                None if s.is_empty() => None,
                None => U256::from_dec_str(s).ok(),
            }
        }
        _ => None,
    };

    let n = parsed.ok_or_else(|| Eip712Error::invalid_value(type_name, value))?;
    if n.bits() > bits {
        return Err(Eip712Error::invalid_value(type_name, value));
    }
    Ok(n)
}

/// Parse a signed integer from a JSON number or a decimal/hex string
pub fn parse_int(
    type_name: &str,
    bits: usize,
    value: &serde_json::Value,
) -> Result<I256, Eip712Error> {
    let parsed = match value {
        serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => {
            I256::from_dec_str(&n.to_string()).ok()
        }
        serde_json::Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok().map(I256::from_raw),
                Some(_) => None,
                None if s.trim_start_matches(['-', '+']).is_empty() => None,
                None => I256::from_dec_str(s).ok(),
            }
        }
        _ => None,
    };

    let n = parsed.ok_or_else(|| Eip712Error::invalid_value(type_name, value))?;

    // Magnitude must fit in bits - 1; !raw is -n - 1 for negative n
    let raw = n.into_raw();
    let magnitude = if n.is_negative() { !raw } else { raw };
    if magnitude.bits() > bits - 1 {
        return Err(Eip712Error::invalid_value(type_name, value));
    }
    Ok(n)
}

/// Parse a hex string (with or without 0x prefix)
fn parse_hex(type_name: &str, s: &str) -> Result<Vec<u8>, Eip712Error> {
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);

    hex::decode(s).map_err(|e| Eip712Error::invalid_value(type_name, format!("invalid hex: {}", e)))
}
