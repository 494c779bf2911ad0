//! Canonical CBOR encoding for deterministic serialization.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats or tags
//!
//! Claims are signed over these bytes, so the same claim must produce the
//! same bytes on every platform.

use ciborium::value::{Integer, Value};

use crate::error::{CoreError, Result};

/// Encode a CBOR Value to canonical bytes.
pub fn to_canonical_bytes(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Decode a single CBOR item and require that it was canonically encoded.
pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Value> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;
    let reencoded = to_canonical_bytes(&value)?;
    if reencoded != bytes {
        return Err(CoreError::DecodingError("non-canonical CBOR".into()));
    }
    Ok(value)
}

/// Integer map key.
pub fn key(k: u64) -> Value {
    Value::Integer(k.into())
}

/// Look up an integer key in a decoded map.
pub fn get(map: &[(Value, Value)], key: u64) -> Option<&Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == i128::from(key)))
        .map(|(_, v)| v)
}

/// Read a non-negative integer out of a value.
pub fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Integer(i) => u64::try_from(*i).ok(),
        _ => None,
    }
}

fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<()> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr)?,
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(_) => {
            return Err(CoreError::EncodingError(
                "floats not supported in canonical encoding".into(),
            ))
        }
        _ => return Err(CoreError::EncodingError("unsupported CBOR value type".into())),
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n = i128::from(i);

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) -> Result<()> {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item)?;
    }
    Ok(())
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<()> {
    let mut pairs = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_buf = Vec::new();
        encode_value_to(&mut key_buf, k)?;
        pairs.push((key_buf, v));
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_encoding_sizes() {
        let cases: [(u64, usize); 5] = [(0, 1), (23, 1), (24, 2), (256, 3), (70_000, 5)];
        for (n, len) in cases {
            let bytes = to_canonical_bytes(&Value::Integer(n.into())).unwrap();
            assert_eq!(bytes.len(), len, "encoding of {n}");
        }
    }

    #[test]
    fn test_map_keys_sorted() {
        let value = Value::Map(vec![
            (key(2), Value::Null),
            (key(0), Value::Bool(true)),
            (key(1), Value::Text("x".into())),
        ]);
        let bytes = to_canonical_bytes(&value).unwrap();
        assert_eq!(bytes, vec![0xa3, 0x00, 0xf5, 0x01, 0x61, b'x', 0x02, 0xf6]);
    }

    #[test]
    fn test_decode_accepts_canonical() {
        let value = Value::Map(vec![(key(0), Value::Bytes(vec![1, 2, 3]))]);
        let bytes = to_canonical_bytes(&value).unwrap();
        let decoded = from_canonical_bytes(&bytes).unwrap();
        match decoded {
            Value::Map(map) => assert_eq!(get(&map, 0), Some(&Value::Bytes(vec![1, 2, 3]))),
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_non_minimal_integer() {
        // 5 encoded with a one-byte argument instead of inline.
        assert!(from_canonical_bytes(&[0x18, 0x05]).is_err());
    }

    #[test]
    fn test_decode_rejects_unsorted_map() {
        assert!(from_canonical_bytes(&[0xa2, 0x01, 0xf6, 0x00, 0xf6]).is_err());
    }

    #[test]
    fn test_floats_rejected() {
        assert!(to_canonical_bytes(&Value::Float(1.5)).is_err());
    }
}
