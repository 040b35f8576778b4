//! EIP-712 Signing
//!
//! Deterministic (RFC 6979) secp256k1 signing and public key recovery
//! over EIP-712 digests.

use super::hasher::hash_typed_data;
use super::types::*;
use crate::utils::crypto::{public_key_to_address, to_checksum_address};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use zeroize::Zeroizing;

/// Signs typed data with one private key.
///
/// The key bytes are zeroized when the signer is dropped.
pub struct TypedDataSigner {
    secret: Zeroizing<[u8; 32]>,
    address: [u8; 20],
}

impl TypedDataSigner {
    /// Build a signer from raw 32 key bytes
    pub fn from_bytes(private_key: &[u8]) -> Result<Self, Eip712Error> {
        let secret_key = parse_secret_key(private_key)?;
        let public_key = PublicKey::from_secret_key(&Secp256k1::signing_only(), &secret_key);

        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(private_key);

        Ok(Self {
            secret,
            address: public_key_to_address(&public_key),
        })
    }

    /// Build a signer from a hex key, with or without `0x`
    pub fn from_hex(private_key: &str) -> Result<Self, Eip712Error> {
        let key = private_key.trim();
        let key = key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")).unwrap_or(key);
        let bytes = Zeroizing::new(
            hex::decode(key).map_err(|e| Eip712Error::KeyError(format!("invalid hex: {}", e)))?,
        );
        Self::from_bytes(&bytes)
    }

    pub fn address(&self) -> [u8; 20] {
        self.address
    }

    /// EIP-55 checksum form of the signer address
    pub fn checksum_address(&self) -> String {
        to_checksum_address(&self.address)
    }

    pub fn sign(&self, typed_data: &TypedData) -> Result<Eip712Signature, Eip712Error> {
        sign_typed_data(typed_data, self.secret.as_slice())
    }
}

impl std::fmt::Debug for TypedDataSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedDataSigner")
            .field("address", &self.checksum_address())
            .finish_non_exhaustive()
    }
}

fn parse_secret_key(private_key: &[u8]) -> Result<SecretKey, Eip712Error> {
    if private_key.len() != 32 {
        return Err(Eip712Error::KeyError(format!(
            "expected 32 bytes, got {}",
            private_key.len()
        )));
    }

    // Rejects zero and values not below the curve order
    SecretKey::from_slice(private_key).map_err(|e| Eip712Error::KeyError(e.to_string()))
}

/// Sign EIP-712 typed data
pub fn sign_typed_data(
    typed_data: &TypedData,
    private_key: &[u8],
) -> Result<Eip712Signature, Eip712Error> {
    // Key problems are reported before message problems
    let secret_key = parse_secret_key(private_key)?;
    let hash = hash_typed_data(typed_data)?;

    Ok(sign_digest(&hash, &secret_key))
}

/// Sign a pre-computed 32-byte digest
pub fn sign_hash(hash: &[u8; 32], private_key: &[u8]) -> Result<Eip712Signature, Eip712Error> {
    let secret_key = parse_secret_key(private_key)?;
    Ok(sign_digest(hash, &secret_key))
}

fn sign_digest(hash: &[u8; 32], secret_key: &SecretKey) -> Eip712Signature {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(*hash);

    // libsecp256k1 always produces low-s signatures
    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&message, secret_key)
        .serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[0..32]);
    s.copy_from_slice(&compact[32..64]);

    Eip712Signature::new(r, s, recovery_id.to_i32() as u8 + 27)
}

/// Split a combined 65-byte signature into (r, s, v)
pub fn decompose(signature: &[u8]) -> Result<Eip712Signature, Eip712Error> {
    Eip712Signature::from_bytes(signature)
}

/// Recover the signer address of a digest
pub fn recover_address(
    hash: &[u8; 32],
    signature: &Eip712Signature,
) -> Result<[u8; 20], Eip712Error> {
    signature.check_scalars()?;
    let recovery_id = RecoveryId::from_i32(signature.recovery_id()?)
        .map_err(|e| Eip712Error::MalformedSignature(e.to_string()))?;

    let mut compact = [0u8; 64];
    compact[0..32].copy_from_slice(&signature.r);
    compact[32..64].copy_from_slice(&signature.s);

    let recoverable = RecoverableSignature::from_compact(&compact, recovery_id)
        .map_err(|e| Eip712Error::MalformedSignature(e.to_string()))?;

    let public_key = Secp256k1::verification_only()
        .recover_ecdsa(&Message::from_digest(*hash), &recoverable)
        .map_err(|e| Eip712Error::MalformedSignature(e.to_string()))?;

    Ok(public_key_to_address(&public_key))
}

/// Recover the checksummed signer address of typed data
pub fn recover_typed_data(
    typed_data: &TypedData,
    signature: &Eip712Signature,
) -> Result<String, Eip712Error> {
    let hash = hash_typed_data(typed_data)?;
    let address = recover_address(&hash, signature)?;
    Ok(to_checksum_address(&address))
}

/// Verify an EIP-712 signature against an expected signer
///
/// Addresses are compared without regard to checksum casing.
pub fn verify_typed_data(
    typed_data: &TypedData,
    signature: &Eip712Signature,
    expected_address: &str,
) -> Result<bool, Eip712Error> {
    let recovered = recover_typed_data(typed_data, signature)?;
    let expected = expected_address.trim();
    let expected = expected
        .strip_prefix("0x")
        .or_else(|| expected.strip_prefix("0X"))
        .unwrap_or(expected);

    Ok(recovered[2..].eq_ignore_ascii_case(expected))
}

/// Derive the address controlled by a private key
pub fn address_from_private_key(private_key: &[u8]) -> Result<[u8; 20], Eip712Error> {
    Ok(TypedDataSigner::from_bytes(private_key)?.address())
}
