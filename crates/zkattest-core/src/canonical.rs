//! # Canonical Serialization: JCS Byte Production
//!
//! `CanonicalBytes` is the sole construction path for bytes that are
//! hashed into a schema hash. The verifier caches proving and verifying
//! keys by that hash, and the wallet recomputes it from the schema it
//! downloads, so any drift in serialization would silently break key
//! reuse.
//!
//! ## Coercion rules
//!
//! 1. `null`, `bool`, `string` and integers pass through unchanged.
//! 2. Whole-valued floats (`18.0`) are rewritten to integers (`18`), so a
//!    schema author's number formatting does not change the hash.
//! 3. Fractional floats are rejected with `FractionalNumber`.
//! 4. Objects and arrays are recursed.
//!
//! After coercion, `serde_jcs` produces RFC 8785 output: sorted keys,
//! compact separators, deterministic bytes.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Largest float magnitude that converts to `i64` without losing integer
/// precision (2^53).
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - Keys are sorted, separators are compact, numbers are integers.
/// - The content is valid UTF-8 JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(String);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FractionalNumber` if the value
    /// contains a non-integral number. Returns `SerializationFailed` if
    /// JCS serialization fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let coerced = coerce_json_value(value)?;
        let text = serde_jcs::to_string(&coerced)?;
        Ok(Self(text))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The canonical JSON text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Display for CanonicalBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn coerce_json_value(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(value),
        Value::Number(ref n) => {
            if n.is_i64() || n.is_u64() {
                return Ok(value);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT => {
                    Ok(Value::from(f as i64))
                }
                Some(f) => Err(CanonicalizationError::FractionalNumber(f)),
                None => Ok(value),
            }
        }
        Value::Object(map) => {
            let mut coerced = serde_json::Map::new();
            for (k, v) in map {
                coerced.insert(k, coerce_json_value(v)?);
            }
            Ok(Value::Object(coerced))
        }
        Value::Array(arr) => {
            let coerced: Result<Vec<_>, _> = arr.into_iter().map(coerce_json_value).collect();
            Ok(Value::Array(coerced?))
        }
    }
}
