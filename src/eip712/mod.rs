//! EIP-712 Typed Data Signing
//!
//! Implementation of EIP-712 typed structured data hashing, signing and
//! signer recovery.
//!
//! # Reference
//! - <https://eips.ethereum.org/EIPS/eip-712>
//!
//! # Example
//! ```rust,ignore
//! use permit_signer::eip712::{TypedData, TypedDataSigner, recover_typed_data};
//!
//! let typed_data = TypedData::from_json(json_string)?;
//! let signer = TypedDataSigner::from_hex(&private_key_hex)?;
//! let signature = signer.sign(&typed_data)?;
//! assert_eq!(recover_typed_data(&typed_data, &signature)?, signer.checksum_address());
//! ```

pub mod types;
pub mod encoder;
pub mod hasher;
pub mod signer;

pub use types::*;
pub use encoder::*;
pub use hasher::*;
pub use signer::*;

#[cfg(test)]
mod tests;
