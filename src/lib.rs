//! Permit Signer
//!
//! Builds EIP-2612 `Permit` typed data, signs it with a secp256k1 key and
//! verifies that the signature recovers the expected signer.
//!
//! # Architecture
//!
//! - **eip712**: typed-data encoding, hashing, signing and recovery
//! - **permit**: strongly-typed permit domain/message and the output report
//! - **amount**: exact decimal amount scaling
//! - **rpc**: read-only nonce and domain queries against the token
//! - **config**: settings from the environment, `.env` and CLI flags
//!
//! # Security
//!
//! Private key bytes are held in `zeroize` wrappers and never logged.
//!
//! # Example
//!
//! ```rust,ignore
//! use permit_signer::eip712::TypedDataSigner;
//! use permit_signer::permit::{sign_permit, recover_permit};
//!
//! let signer = TypedDataSigner::from_hex(&key_hex)?;
//! let signature = sign_permit(&signer, &domain, &message)?;
//! assert_eq!(recover_permit(&domain, &message, &signature)?, signer.checksum_address());
//! ```

pub mod utils;
pub mod error;
pub mod eip712;
pub mod permit;
pub mod amount;
pub mod rpc;
pub mod config;

pub use error::{ErrorCode, PermitError, PermitResult};
pub use utils::crypto::{keccak256, to_checksum_address};
