//! Permit Configuration
//!
//! Settings are read through a key lookup so the same code serves the
//! process environment, `.env` files and command-line flags.

use crate::error::{PermitError, PermitResult};
use crate::utils::crypto::{parse_address_bytes, to_checksum_address};
use ethers_core::types::Address;
use std::fmt;
use zeroize::Zeroizing;

pub const PRIVATE_KEY: &str = "PRIVATE_KEY";
pub const OWNER: &str = "OWNER";
pub const SPENDER: &str = "SPENDER";
pub const CONTRACT: &str = "CONTRACT";
pub const RPC_URL: &str = "RPC_URL";
pub const CHAIN_ID: &str = "CHAIN_ID";
pub const TOKEN_NAME: &str = "TOKEN_NAME";
pub const TOKEN_VERSION: &str = "TOKEN_VERSION";
pub const AMOUNT: &str = "AMOUNT";
pub const DECIMALS: &str = "DECIMALS";
pub const DEADLINE_SECS: &str = "DEADLINE_SECS";

/// Base Sepolia
pub const DEFAULT_CHAIN_ID: u64 = 84532;
pub const DEFAULT_TOKEN_NAME: &str = "Spidex-ERC20";
pub const DEFAULT_TOKEN_VERSION: &str = "1";
pub const DEFAULT_AMOUNT: &str = "0.5";
pub const DEFAULT_DECIMALS: u32 = 18;
pub const DEFAULT_DEADLINE_SECS: u64 = 3600;

/// Everything needed for one permit signing run
pub struct PermitConfig {
    pub private_key: Zeroizing<String>,
    pub owner: Address,
    pub spender: Address,
    /// Token contract, also the EIP-712 verifying contract
    pub token: Address,
    /// Needed only when the nonce is read from chain
    pub rpc_url: Option<String>,
    pub chain_id: u64,
    pub token_name: String,
    pub token_version: String,
    /// Human-readable amount, scaled by `decimals`
    pub amount: String,
    pub decimals: u32,
    /// Permit lifetime from now
    pub deadline_secs: u64,
}

impl PermitConfig {
    /// Build the config from any key lookup; blank values count as absent
    pub fn from_lookup<F>(lookup: F) -> PermitResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| get(key).ok_or_else(|| PermitError::config_missing(key));

        Ok(Self {
            private_key: Zeroizing::new(require(PRIVATE_KEY)?),
            owner: parse_address_setting(OWNER, &require(OWNER)?)?,
            spender: parse_address_setting(SPENDER, &require(SPENDER)?)?,
            token: parse_address_setting(CONTRACT, &require(CONTRACT)?)?,
            rpc_url: get(RPC_URL),
            chain_id: parse_setting(CHAIN_ID, get(CHAIN_ID), DEFAULT_CHAIN_ID)?,
            token_name: get(TOKEN_NAME).unwrap_or_else(|| DEFAULT_TOKEN_NAME.to_string()),
            token_version: get(TOKEN_VERSION).unwrap_or_else(|| DEFAULT_TOKEN_VERSION.to_string()),
            amount: get(AMOUNT).unwrap_or_else(|| DEFAULT_AMOUNT.to_string()),
            decimals: parse_setting(DECIMALS, get(DECIMALS), DEFAULT_DECIMALS)?,
            deadline_secs: parse_setting(DEADLINE_SECS, get(DEADLINE_SECS), DEFAULT_DEADLINE_SECS)?,
        })
    }

    /// Absolute deadline `deadline_secs` after the unix time `now`
    pub fn deadline_from(&self, now: i64) -> PermitResult<u64> {
        let now = u64::try_from(now).map_err(|_| {
            PermitError::invalid_input(format!("clock is before the unix epoch: {}", now))
        })?;

        now.checked_add(self.deadline_secs).ok_or_else(|| {
            PermitError::invalid_input(format!(
                "{}={} overflows the deadline",
                DEADLINE_SECS, self.deadline_secs
            ))
        })
    }

    /// The RPC endpoint, or `ConfigMissing` when a chain read needs one
    pub fn require_rpc_url(&self) -> PermitResult<&str> {
        self.rpc_url
            .as_deref()
            .ok_or_else(|| PermitError::config_missing(RPC_URL))
    }
}

impl fmt::Debug for PermitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermitConfig")
            .field("private_key", &"[REDACTED]")
            .field("owner", &to_checksum_address(self.owner.as_bytes()))
            .field("spender", &to_checksum_address(self.spender.as_bytes()))
            .field("token", &to_checksum_address(self.token.as_bytes()))
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("token_name", &self.token_name)
            .field("token_version", &self.token_version)
            .field("amount", &self.amount)
            .field("decimals", &self.decimals)
            .field("deadline_secs", &self.deadline_secs)
            .finish()
    }
}

fn parse_address_setting(key: &str, value: &str) -> PermitResult<Address> {
    parse_address_bytes(value)
        .map(Address::from)
        .map_err(|e| PermitError::invalid_input(format!("{} is not an address: {}", key, e)))
}

fn parse_setting<T>(key: &str, value: Option<String>, default: T) -> PermitResult<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|e| PermitError::invalid_input(format!("{}={}: {}", key, raw, e))),
        None => Ok(default),
    }
}
