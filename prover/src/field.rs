//! Scalar encoding
//!
//! Converts loosely-typed input scalars into BLS12-381 scalar field elements and back.
//! Input is never reduced modulo the field: a value that does not fit is rejected.
//!
//! Accepted spellings:
//! - JSON integers of any size
//! - decimal numeral strings (`"1000"`)
//! - hex numeral strings with a `0x` / `0X` prefix (`"0x3e8"`)

use ark_bls12_381::Fr;
use ark_ff::PrimeField;
use num_bigint::BigUint;
use serde_json::Value;

use crate::error::EncodingIssue;

/// Why a scalar could not become a field element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarError {
    /// Wrong JSON type, or a string that is not a numeral
    NotNumeric,
    /// A numeral with no canonical field representation
    Unrepresentable(EncodingIssue),
}

/// The scalar field modulus as an integer.
pub fn field_modulus() -> BigUint {
    Fr::MODULUS.into()
}

/// Encode an input scalar as a field element.
pub fn encode_scalar(value: &Value) -> Result<Fr, ScalarError> {
    let integer = match value {
        // With `arbitrary_precision` this is the numeral exactly as written
        Value::Number(n) => parse_numeral(&n.to_string())?,
        Value::String(s) => parse_numeral(s)?,
        _ => return Err(ScalarError::NotNumeric),
    };
    encode_integer(&integer).map_err(ScalarError::Unrepresentable)
}

/// Encode a non-negative integer, rejecting anything not below the modulus.
pub fn encode_integer(value: &BigUint) -> Result<Fr, EncodingIssue> {
    if *value >= field_modulus() {
        return Err(EncodingIssue::OutOfRange);
    }
    Ok(Fr::from_le_bytes_mod_order(&value.to_bytes_le()))
}

/// Read a field element back as its canonical integer.
pub fn decode_scalar(value: Fr) -> BigUint {
    value.into_bigint().into()
}

fn parse_numeral(text: &str) -> Result<BigUint, ScalarError> {
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let parsed = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ScalarError::NotNumeric);
        }
        BigUint::parse_bytes(hex.as_bytes(), 16)
    } else if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit()) {
        BigUint::parse_bytes(body.as_bytes(), 10)
    } else if looks_fractional(body) {
        return Err(ScalarError::Unrepresentable(if negative {
            EncodingIssue::Negative
        } else {
            EncodingIssue::NotInteger
        }));
    } else {
        return Err(ScalarError::NotNumeric);
    };

    let value = parsed.ok_or(ScalarError::NotNumeric)?;
    if negative && value != BigUint::ZERO {
        return Err(ScalarError::Unrepresentable(EncodingIssue::Negative));
    }
    Ok(value)
}

/// `1.5`, `2e10`, `3.0E-2`: numerals that parse as a float but not as an integer.
/// A sign after the leading `-` is not a numeral.
fn looks_fractional(body: &str) -> bool {
    let numeral = |b: u8| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-');
    body.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && body.bytes().all(numeral)
        && body.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_within_range() {
        let p_minus_one = field_modulus() - 1u32;
        let cases = [
            BigUint::ZERO,
            BigUint::from(1u32),
            BigUint::from(u64::MAX),
            BigUint::from(u64::MAX) * BigUint::from(u64::MAX),
            p_minus_one,
        ];

        for value in cases {
            let encoded = encode_scalar(&Value::String(value.to_string())).unwrap();
            assert_eq!(decode_scalar(encoded), value);
        }
    }

    #[test]
    fn test_json_numbers() {
        assert_eq!(encode_scalar(&json!(42)).unwrap(), Fr::from(42u64));
        assert_eq!(encode_scalar(&json!(u64::MAX)).unwrap(), Fr::from(u64::MAX));

        // Larger than u64, kept exact by arbitrary_precision
        let big: Value = serde_json::from_str("340282366920938463463374607431768211456").unwrap();
        let expected = BigUint::from(1u32) << 128;
        assert_eq!(decode_scalar(encode_scalar(&big).unwrap()), expected);
    }

    #[test]
    fn test_hex_and_whitespace() {
        assert_eq!(encode_scalar(&json!("0x3e8")).unwrap(), Fr::from(1000u64));
        assert_eq!(encode_scalar(&json!("0X3E8")).unwrap(), Fr::from(1000u64));
        assert_eq!(encode_scalar(&json!("  17 ")).unwrap(), Fr::from(17u64));
    }

    #[test]
    fn test_out_of_range() {
        let p = field_modulus();
        assert_eq!(
            encode_scalar(&Value::String(p.to_string())),
            Err(ScalarError::Unrepresentable(EncodingIssue::OutOfRange))
        );
        assert_eq!(encode_integer(&(p + 1u32)), Err(EncodingIssue::OutOfRange));
    }

    #[test]
    fn test_negative_and_fractional() {
        assert_eq!(
            encode_scalar(&json!(-5)),
            Err(ScalarError::Unrepresentable(EncodingIssue::Negative))
        );
        assert_eq!(
            encode_scalar(&json!("-0x10")),
            Err(ScalarError::Unrepresentable(EncodingIssue::Negative))
        );
        assert_eq!(
            encode_scalar(&json!(1.5)),
            Err(ScalarError::Unrepresentable(EncodingIssue::NotInteger))
        );
        assert_eq!(
            encode_scalar(&json!("2e10")),
            Err(ScalarError::Unrepresentable(EncodingIssue::NotInteger))
        );
        assert_eq!(
            encode_scalar(&json!("3.0E+2")),
            Err(ScalarError::Unrepresentable(EncodingIssue::NotInteger))
        );
        assert_eq!(
            encode_scalar(&json!(".5")),
            Err(ScalarError::Unrepresentable(EncodingIssue::NotInteger))
        );
        // Negative zero is still zero
        assert_eq!(encode_scalar(&json!("-0")).unwrap(), Fr::from(0u64));
    }

    #[test]
    fn test_non_numeric() {
        for value in [
            json!(null),
            json!(true),
            json!([1]),
            json!({"v": 1}),
            json!(""),
            json!("abc"),
            json!("0x"),
            json!("0xzz"),
            json!("inf"),
            json!("+5"),
            json!("+1.5"),
            json!("-+5"),
            json!("--5"),
        ] {
            assert_eq!(encode_scalar(&value), Err(ScalarError::NotNumeric), "{value}");
        }
    }
}
