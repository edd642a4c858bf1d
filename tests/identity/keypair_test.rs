use fundledger::identity::{Address, Keypair, KeypairError};

/// Test: Each generated keypair should be unique
#[test]
fn test_keypairs_are_unique() {
    let keypair1 = Keypair::generate();
    let keypair2 = Keypair::generate();

    assert_ne!(
        keypair1.public_key_bytes(),
        keypair2.public_key_bytes(),
        "Two generated keypairs should have different public keys"
    );
}

/// Test: Can serialize keypair to bytes and restore it
#[test]
fn test_keypair_serialization() {
    let original = Keypair::generate();
    let restored = Keypair::from_bytes(&original.to_bytes())
        .expect("Should deserialize keypair from bytes");

    assert_eq!(original.public_key_bytes(), restored.public_key_bytes());
    assert_eq!(original.address(), restored.address());
}

/// Test: Hex backup restores the same address
#[test]
fn test_keypair_hex_roundtrip() {
    let original = Keypair::generate();
    let restored = Keypair::from_hex(&original.to_hex()).unwrap();

    assert_eq!(original.address(), restored.address());
}

/// Test: Invalid bytes should fail to deserialize
#[test]
fn test_invalid_keypair_bytes_fails() {
    assert_eq!(
        Keypair::from_bytes(&[0u8; 10]).err(),
        Some(KeypairError::InvalidLength {
            expected: 32,
            got: 10,
        })
    );
    assert!(matches!(
        Keypair::from_hex("not hex"),
        Err(KeypairError::InvalidEncoding(_))
    ));
}

/// Test: Debug output never leaks the secret key
#[test]
fn test_debug_hides_secret() {
    let keypair = Keypair::generate();
    let debug = format!("{:?}", keypair);

    assert!(!debug.contains(&keypair.to_hex()));
}

/// Test: The same secret always yields the same non-null address
#[test]
fn test_keypair_address_is_deterministic() {
    let first = Keypair::from_bytes(&[7u8; 32]).unwrap().address();
    let second = Keypair::from_bytes(&[7u8; 32]).unwrap().address();

    assert_eq!(first, second);
    assert!(!first.is_null());
    assert_ne!(first, Address::NULL);
}

/// Test: A secret parsed from its hex form signs for the same address
#[test]
fn test_keypair_from_str() {
    let original = Keypair::generate();
    let parsed: Keypair = original.to_hex().parse().unwrap();

    assert_eq!(parsed.address(), original.address());
    assert!(" zz ".parse::<Keypair>().is_err());
}
