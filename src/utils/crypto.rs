//! Hashing and Address Utilities
//!
//! Keccak-256 and Ethereum address helpers shared by the typed-data
//! signer and the chain query client.

use secp256k1::PublicKey;
use tiny_keccak::{Hasher, Keccak};

/// Keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Convert raw address bytes to checksummed Ethereum address (EIP-55)
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut result = String::from("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        if ch.is_ascii_digit() {
            result.push(ch);
        } else if nibble >= 8 {
            result.push(ch.to_ascii_uppercase());
        } else {
            result.push(ch);
        }
    }

    result
}

/// Derive the 20-byte Ethereum address of a secp256k1 public key
pub fn public_key_to_address(public_key: &PublicKey) -> [u8; 20] {
    // Uncompressed key is 0x04 || X || Y; the address hashes X || Y
    let pubkey_bytes = public_key.serialize_uncompressed();
    let hash = keccak256(&pubkey_bytes[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..32]);
    address
}

/// Parse a `0x`-prefixed (or bare) 40 hex char address.
///
/// All-lowercase and all-uppercase hex is taken as is; mixed case must be
/// a valid EIP-55 checksum.
pub fn parse_address_bytes(addr: &str) -> Result<[u8; 20], String> {
    let addr = addr.trim();
    let addr = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);

    if addr.len() != 40 {
        return Err(format!(
            "invalid length: expected 40 hex chars, got {}",
            addr.len()
        ));
    }

    let bytes = hex::decode(addr).map_err(|e| format!("invalid hex: {}", e))?;

    let mut result = [0u8; 20];
    result.copy_from_slice(&bytes);

    let has_lower = addr.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = addr.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && &to_checksum_address(&result)[2..] != addr {
        return Err(format!("bad address checksum: 0x{}", addr));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::{Secp256k1, SecretKey};

    #[test]
    fn test_keccak256() {
        let hash = keccak256(b"hello");
        assert_eq!(
            hex::encode(hash),
            "1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8"
        );
    }

    #[test]
    fn test_checksum_address() {
        let addr = hex::decode("cd2a3d9f938e13cd947ec05abc7fe734df8dd826").unwrap();
        assert_eq!(
            to_checksum_address(&addr),
            "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"
        );
    }

    #[test]
    fn test_public_key_to_address() {
        // First default Hardhat/Anvil account
        let secret = SecretKey::from_slice(
            &hex::decode("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80").unwrap(),
        )
        .unwrap();
        let public = PublicKey::from_secret_key(&Secp256k1::new(), &secret);

        assert_eq!(
            to_checksum_address(&public_key_to_address(&public)),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn test_parse_address_bytes() {
        let addr = parse_address_bytes("0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826").unwrap();
        assert_eq!(addr[0], 0xCD);

        assert!(parse_address_bytes("0x1234").is_err());
        assert!(parse_address_bytes("0xZZ2a3d9F938E13CD947Ec05AbC7FE734Df8DD826").is_err());
    }

    #[test]
    fn test_parse_address_checksum() {
        let expected = hex::decode("f39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();

        for ok in [
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266",
            "f39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
        ] {
            assert_eq!(parse_address_bytes(ok).unwrap().to_vec(), expected, "{}", ok);
        }

        // First letter flipped to upper case
        let err = parse_address_bytes("0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap_err();
        assert!(err.contains("checksum"), "{}", err);
    }
}
