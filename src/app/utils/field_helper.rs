use alloy_primitives::{Address, B256, U256};
use std::str::FromStr;

/// Scalar field order of BN254, the curve the Groth16 verifier runs on.
pub const BN254_SCALAR_MODULUS: U256 = U256::from_limbs([
    0x43e1f593f0000001,
    0x2833e84879b97091,
    0xb85045b68181585d,
    0x30644e72e131a029,
]);

pub fn reduce_to_field(value: U256) -> U256 {
    value % BN254_SCALAR_MODULUS
}

/// Decimal field-element encoding of a 32-byte hash, as circuit inputs expect.
pub fn hash_to_field_string(hash: &B256) -> String {
    reduce_to_field(U256::from_be_bytes(hash.0)).to_string()
}

pub fn u64_to_field_string(value: u64) -> String {
    U256::from(value).to_string()
}

/// Parses a decimal or `0x`-prefixed hex scalar.
pub fn parse_scalar(value: &str) -> Option<U256> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    U256::from_str(value).ok()
}

pub fn parse_address(value: &str) -> Option<Address> {
    let value = value.trim();
    if !value.starts_with("0x") && !value.starts_with("0X") {
        return None;
    }
    Address::from_str(value).ok()
}

/// Lowercase `0x` form used for keys and comparisons.
pub fn normalize_address(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulus_matches_bn254_order() {
        let expected = U256::from_str(
            "21888242871839275222246405745257275088548364400416711303786592216681495183617",
        )
        .unwrap();
        assert_eq!(BN254_SCALAR_MODULUS, expected);
    }

    #[test]
    fn hashes_are_reduced_into_field() {
        let max = B256::repeat_byte(0xff);
        let reduced = U256::from_str(&hash_to_field_string(&max)).unwrap();
        assert!(reduced < BN254_SCALAR_MODULUS);
    }

    #[test]
    fn scalars_parse_in_both_radixes() {
        assert_eq!(parse_scalar("255"), Some(U256::from(255u64)));
        assert_eq!(parse_scalar("0xff"), Some(U256::from(255u64)));
        assert_eq!(parse_scalar(""), None);
        assert_eq!(parse_scalar("nullifier"), None);
    }

    #[test]
    fn addresses_need_hex_prefix() {
        assert!(parse_address("0x00000000000000000000000000000000000000aa").is_some());
        assert!(parse_address("00000000000000000000000000000000000000aa").is_none());
        assert!(parse_address("0x1234").is_none());
    }
}
