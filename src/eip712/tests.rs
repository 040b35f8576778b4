//! EIP-712 Test Suite
//!
//! Reference vectors and cross-checks against ethers.

use super::*;
use ethers_core::types::transaction::eip712::Eip712;
use ethers_core::types::H256;
use ethers_signers::LocalWallet;
use std::str::FromStr;

const MAIL_JSON: &str = r#"{
    "types": {
        "EIP712Domain": [
            {"name": "name", "type": "string"},
            {"name": "version", "type": "string"},
            {"name": "chainId", "type": "uint256"},
            {"name": "verifyingContract", "type": "address"}
        ],
        "Person": [
            {"name": "name", "type": "string"},
            {"name": "wallet", "type": "address"}
        ],
        "Mail": [
            {"name": "from", "type": "Person"},
            {"name": "to", "type": "Person"},
            {"name": "contents", "type": "string"}
        ]
    },
    "primaryType": "Mail",
    "domain": {
        "name": "Ether Mail",
        "version": "1",
        "chainId": 1,
        "verifyingContract": "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"
    },
    "message": {
        "from": {
            "name": "Cow",
            "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"
        },
        "to": {
            "name": "Bob",
            "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB"
        },
        "contents": "Hello, Bob!"
    }
}"#;

const PERMIT_JSON: &str = r#"{
    "types": {
        "EIP712Domain": [
            {"name": "name", "type": "string"},
            {"name": "version", "type": "string"},
            {"name": "chainId", "type": "uint256"},
            {"name": "verifyingContract", "type": "address"}
        ],
        "Permit": [
            {"name": "owner", "type": "address"},
            {"name": "spender", "type": "address"},
            {"name": "value", "type": "uint256"},
            {"name": "nonce", "type": "uint256"},
            {"name": "deadline", "type": "uint256"}
        ]
    },
    "primaryType": "Permit",
    "domain": {
        "name": "Spidex-ERC20",
        "version": "1",
        "chainId": 84532,
        "verifyingContract": "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"
    },
    "message": {
        "owner": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
        "spender": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
        "value": "500000000000000000",
        "nonce": 0,
        "deadline": 1893456000
    }
}"#;

/// keccak256("cow"), the signer of the EIP-712 Mail example
const COW_KEY: &str = "c85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438aaf4";

const HARDHAT_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

#[test]
fn test_eip712_mail_digest() {
    let typed_data = TypedData::from_json(MAIL_JSON).unwrap();
    let pre_image = get_pre_image(&typed_data).unwrap();

    assert_eq!(
        hex::encode(pre_image.struct_hash),
        "c52c0ee5d84264471806290a3f2c4cecfc5490626bf912d01f240d7a274b371e"
    );
    assert_eq!(
        hex::encode(pre_image.final_hash),
        "be609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2"
    );
}

#[test]
fn test_eip712_mail_signature() {
    let typed_data = TypedData::from_json(MAIL_JSON).unwrap();
    let signer = TypedDataSigner::from_hex(COW_KEY).unwrap();
    assert_eq!(
        signer.checksum_address(),
        "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"
    );

    let signature = signer.sign(&typed_data).unwrap();
    assert_eq!(signature.v, 28);
    assert_eq!(
        hex::encode(signature.r),
        "4355c47d63924e8a72e509b65029052eb6c299d53a04e167c5775fd466751c9d"
    );
    assert_eq!(
        hex::encode(signature.s),
        "07299936d304c153f6443dfa05f40ff007d72911b6f72307f996231605b91562"
    );
}

#[test]
fn test_permit_digest_matches_ethers() {
    let ours = hash_typed_data(&TypedData::from_json(PERMIT_JSON).unwrap()).unwrap();

    let theirs: ethers_core::types::transaction::eip712::TypedData =
        serde_json::from_str(PERMIT_JSON).unwrap();
    assert_eq!(ours, theirs.encode_eip712().unwrap());
}

#[test]
fn test_signature_matches_ethers_wallet() {
    let typed_data = TypedData::from_json(PERMIT_JSON).unwrap();
    let hash = hash_typed_data(&typed_data).unwrap();

    let ours = TypedDataSigner::from_hex(HARDHAT_KEY).unwrap().sign(&typed_data).unwrap();

    let wallet = LocalWallet::from_str(HARDHAT_KEY).unwrap();
    let theirs = wallet.sign_hash(H256::from(hash)).unwrap();

    assert_eq!(ours.to_bytes().to_vec(), theirs.to_vec());
}

#[test]
fn test_permit_round_trip() {
    let typed_data = TypedData::from_json(PERMIT_JSON).unwrap();
    let signer = TypedDataSigner::from_hex(HARDHAT_KEY).unwrap();

    let signature = signer.sign(&typed_data).unwrap();
    let recovered = recover_typed_data(&typed_data, &signature).unwrap();

    assert_eq!(recovered, "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    assert!(verify_typed_data(&typed_data, &signature, &recovered.to_lowercase()).unwrap());
    assert!(verify_typed_data(&typed_data, &signature, &recovered[2..]).unwrap());
    assert!(verify_typed_data(
        &typed_data,
        &signature,
        &format!("0X{}", recovered[2..].to_uppercase())
    )
    .unwrap());
    assert!(!verify_typed_data(
        &typed_data,
        &signature,
        "0x0000000000000000000000000000000000000000"
    )
    .unwrap());
}

#[test]
fn test_signing_is_deterministic() {
    let typed_data = TypedData::from_json(PERMIT_JSON).unwrap();
    let signer = TypedDataSigner::from_hex(HARDHAT_KEY).unwrap();

    assert_eq!(
        signer.sign(&typed_data).unwrap().to_hex(),
        signer.sign(&typed_data).unwrap().to_hex()
    );
}

#[test]
fn test_decompose_signed_output() {
    let typed_data = TypedData::from_json(PERMIT_JSON).unwrap();
    let signature = TypedDataSigner::from_hex(HARDHAT_KEY).unwrap().sign(&typed_data).unwrap();

    let parts = decompose(&signature.to_bytes()).unwrap();
    assert!(parts.v == 27 || parts.v == 28);
    assert_ne!(parts.r, [0u8; 32]);
    assert_ne!(parts.s, [0u8; 32]);
    assert!(parts.check_scalars().is_ok());

    assert!(matches!(
        decompose(&signature.to_bytes()[..64]),
        Err(Eip712Error::MalformedSignature(_))
    ));
}

#[test]
fn test_tampered_message_changes_signer() {
    let typed_data = TypedData::from_json(PERMIT_JSON).unwrap();
    let signature = TypedDataSigner::from_hex(HARDHAT_KEY).unwrap().sign(&typed_data).unwrap();
    let original = recover_typed_data(&typed_data, &signature).unwrap();

    for (field, value) in [
        ("value", serde_json::json!("500000000000000001")),
        ("nonce", serde_json::json!(1)),
        ("deadline", serde_json::json!(1893456001)),
        ("spender", serde_json::json!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC")),
    ] {
        let mut tampered = typed_data.clone();
        tampered.message[field] = value;

        // A tampered digest may fail to recover at all; either way it is not the signer
        let recovered = recover_typed_data(&tampered, &signature).ok();
        assert_ne!(recovered.as_deref(), Some(original.as_str()), "field {}", field);
    }
}

#[test]
fn test_domain_separation() {
    let typed_data = TypedData::from_json(PERMIT_JSON).unwrap();
    let signature = TypedDataSigner::from_hex(HARDHAT_KEY).unwrap().sign(&typed_data).unwrap();
    let original = recover_typed_data(&typed_data, &signature).unwrap();

    let mut other_chain = typed_data.clone();
    other_chain.domain.chain_id = Some(serde_json::json!(8453));
    assert_ne!(recover_typed_data(&other_chain, &signature).ok(), Some(original.clone()));

    let mut other_contract = typed_data.clone();
    other_contract.domain.verifying_contract =
        Some("0x0000000000000000000000000000000000000001".to_string());
    assert_ne!(recover_typed_data(&other_contract, &signature).ok(), Some(original));
}

#[test]
fn test_invalid_field_type_fails_signing() {
    let mut typed_data = TypedData::from_json(PERMIT_JSON).unwrap();
    typed_data.message["owner"] = serde_json::json!("not-an-address");

    let err = TypedDataSigner::from_hex(HARDHAT_KEY).unwrap().sign(&typed_data).unwrap_err();
    assert!(matches!(err, Eip712Error::InvalidFieldType { ref type_name, .. } if type_name == "address"));
}

#[test]
fn test_bad_address_checksum_fails_signing() {
    let mut typed_data = TypedData::from_json(PERMIT_JSON).unwrap();
    typed_data.message["owner"] = serde_json::json!("0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    let err = TypedDataSigner::from_hex(HARDHAT_KEY).unwrap().sign(&typed_data).unwrap_err();
    assert!(matches!(err, Eip712Error::InvalidFieldType { ref type_name, .. } if type_name == "address"));

    // Lowercase carries no checksum and is accepted
    typed_data.message["owner"] = serde_json::json!("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    assert!(TypedDataSigner::from_hex(HARDHAT_KEY).unwrap().sign(&typed_data).is_ok());
}

#[test]
fn test_empty_uint_fails_signing() {
    let signer = TypedDataSigner::from_hex(HARDHAT_KEY).unwrap();

    for blank in ["", "   "] {
        let mut typed_data = TypedData::from_json(PERMIT_JSON).unwrap();
        typed_data.message["value"] = serde_json::json!(blank);

        let err = signer.sign(&typed_data).unwrap_err();
        assert!(
            matches!(err, Eip712Error::InvalidFieldType { ref type_name, .. } if type_name == "uint256"),
            "value {:?}",
            blank
        );
    }
}

#[test]
fn test_key_error_precedes_message_errors() {
    let mut typed_data = TypedData::from_json(PERMIT_JSON).unwrap();
    typed_data.message["owner"] = serde_json::json!("not-an-address");

    let err = sign_typed_data(&typed_data, &[0u8; 31]).unwrap_err();
    assert!(matches!(err, Eip712Error::KeyError(_)));
}

/// Nested struct arrays and fixed bytes hash without error
#[test]
fn test_struct_arrays_and_bytes() {
    let json = r#"{
        "types": {
            "EIP712Domain": [
                {"name": "name", "type": "string"},
                {"name": "chainId", "type": "uint256"}
            ],
            "Item": [
                {"name": "id", "type": "uint256"},
                {"name": "name", "type": "string"},
                {"name": "tag", "type": "bytes32"}
            ],
            "Order": [
                {"name": "items", "type": "Item[]"},
                {"name": "buyer", "type": "address"},
                {"name": "memo", "type": "bytes"}
            ]
        },
        "primaryType": "Order",
        "domain": {"name": "Marketplace", "chainId": 1},
        "message": {
            "items": [
                {"id": 1, "name": "Widget", "tag": "0x0101010101010101010101010101010101010101010101010101010101010101"},
                {"id": 2, "name": "Gadget", "tag": "0x0202020202020202020202020202020202020202020202020202020202020202"}
            ],
            "buyer": "0x1234567890123456789012345678901234567890",
            "memo": "0xdeadbeef"
        }
    }"#;

    let typed_data = TypedData::from_json(json).unwrap();
    let ours = hash_typed_data(&typed_data).unwrap();

    let theirs: ethers_core::types::transaction::eip712::TypedData =
        serde_json::from_str(json).unwrap();
    assert_eq!(ours, theirs.encode_eip712().unwrap());
}

#[test]
fn test_invalid_primary_type() {
    let json = r#"{
        "types": {
            "EIP712Domain": [{"name": "name", "type": "string"}],
            "Person": [{"name": "name", "type": "string"}]
        },
        "primaryType": "NonExistent",
        "domain": {"name": "Test"},
        "message": {}
    }"#;

    let typed_data = TypedData::from_json(json).unwrap();
    assert!(matches!(
        typed_data.validate(),
        Err(Eip712Error::InvalidPrimaryType(_))
    ));
}

#[test]
fn test_unknown_field_type() {
    let json = r#"{
        "types": {
            "EIP712Domain": [{"name": "name", "type": "string"}],
            "Person": [{"name": "wallet", "type": "Wallet"}]
        },
        "primaryType": "Person",
        "domain": {"name": "Test"},
        "message": {"wallet": "0x"}
    }"#;

    let typed_data = TypedData::from_json(json).unwrap();
    assert!(matches!(hash_typed_data(&typed_data), Err(Eip712Error::InvalidType(_))));
}

#[test]
fn test_json_round_trip_keeps_digest() {
    let typed_data = TypedData::from_json(MAIL_JSON).unwrap();
    let reparsed = TypedData::from_json(&typed_data.to_json().unwrap()).unwrap();
    assert_eq!(
        hash_typed_data(&typed_data).unwrap(),
        hash_typed_data(&reparsed).unwrap()
    );
}
