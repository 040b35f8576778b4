//! Chain State Queries
//!
//! Read-only JSON-RPC calls against the token contract. Signing never
//! depends on this module directly: it only consumes the nonce through
//! [`NonceSource`], so an offline nonce can be substituted.

use crate::error::{PermitError, PermitResult};
use crate::log_debug;
use crate::utils::crypto::{keccak256, to_checksum_address};
use ethers_core::types::{Address, U256};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Source of the owner's current permit nonce
pub trait NonceSource {
    fn nonce(&self, token: Address, owner: Address) -> PermitResult<U256>;
}

/// A nonce supplied by the operator instead of read from chain
#[derive(Debug, Clone, Copy)]
pub struct FixedNonce(pub U256);

impl NonceSource for FixedNonce {
    fn nonce(&self, _token: Address, _owner: Address) -> PermitResult<U256> {
        Ok(self.0)
    }
}

/// 4-byte function selector of a Solidity signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// ABI-encode a call whose arguments are all static 32-byte words
pub fn encode_call(signature: &str, args: &[[u8; 32]]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 32 * args.len());
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(arg);
    }
    data
}

fn address_word(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Extract `result` from a JSON-RPC 2.0 response body
fn decode_response(body: serde_json::Value) -> PermitResult<serde_json::Value> {
    let response: RpcResponse = serde_json::from_value(body)
        .map_err(|e| PermitError::chain_query_failed(format!("malformed JSON-RPC response: {}", e)))?;

    if let Some(err) = response.error {
        return Err(PermitError::chain_query_failed(err.message)
            .with_details(format!("rpc error code {}", err.code)));
    }

    response
        .result
        .ok_or_else(|| PermitError::chain_query_failed("JSON-RPC response has no result"))
}

fn decode_hex_result(result: &serde_json::Value) -> PermitResult<Vec<u8>> {
    let hex_str = result
        .as_str()
        .ok_or_else(|| PermitError::chain_query_failed(format!("expected hex result, got {}", result)))?;
    let digits = hex_str.strip_prefix("0x").unwrap_or(hex_str);

    hex::decode(digits)
        .map_err(|e| PermitError::chain_query_failed(format!("invalid hex in result: {}", e)))
}

/// First 32-byte word of an `eth_call` return value
fn first_word(data: &[u8]) -> PermitResult<[u8; 32]> {
    if data.len() < 32 {
        return Err(PermitError::chain_query_failed(format!(
            "call returned {} bytes, expected at least 32",
            data.len()
        )));
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&data[..32]);
    Ok(word)
}

/// Blocking JSON-RPC client for one endpoint
pub struct RpcClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> PermitResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PermitError::chain_query_failed(format!("client error: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    fn request(&self, method: &str, params: serde_json::Value) -> PermitResult<serde_json::Value> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        log_debug!("rpc", "JSON-RPC request", method = method);

        let body: serde_json::Value = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()?
            .error_for_status()?
            .json()?;

        decode_response(body)
    }

    /// `eth_call` against the latest block
    pub fn eth_call(&self, to: Address, data: &[u8]) -> PermitResult<Vec<u8>> {
        let params = serde_json::json!([
            {
                "to": to_checksum_address(to.as_bytes()),
                "data": format!("0x{}", hex::encode(data)),
            },
            "latest"
        ]);

        decode_hex_result(&self.request("eth_call", params)?)
    }

    pub fn chain_id(&self) -> PermitResult<u64> {
        let result = self.request("eth_chainId", serde_json::json!([]))?;
        let hex_str = result
            .as_str()
            .ok_or_else(|| {
                PermitError::chain_query_failed(format!("expected hex chain id, got {}", result))
            })?;

        u64::from_str_radix(hex_str.trim_start_matches("0x"), 16)
            .map_err(|e| PermitError::chain_query_failed(format!("invalid chain id {}: {}", hex_str, e)))
    }

    /// `nonces(owner)` of an EIP-2612 token
    pub fn nonces(&self, token: Address, owner: Address) -> PermitResult<U256> {
        let data = encode_call("nonces(address)", &[address_word(owner)]);
        let word = first_word(&self.eth_call(token, &data)?)?;
        Ok(U256::from_big_endian(&word))
    }

    /// `DOMAIN_SEPARATOR()` of an EIP-2612 token
    pub fn domain_separator(&self, token: Address) -> PermitResult<[u8; 32]> {
        let data = encode_call("DOMAIN_SEPARATOR()", &[]);
        first_word(&self.eth_call(token, &data)?)
    }
}

impl NonceSource for RpcClient {
    fn nonce(&self, token: Address, owner: Address) -> PermitResult<U256> {
        self.nonces(token, owner)
    }
}
