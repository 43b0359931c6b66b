//! # Value Normalizer
//!
//! Converts a raw JSON input value into a BN254 scalar according to the
//! declared field type. The wallet and the verifier both run these rules,
//! so a value normalizes to the same field element on either side.
//!
//! | Type | Accepted | Element |
//! |------|----------|---------|
//! | integer / number | JSON number, numeric string | truncated toward zero; negatives as `p - |x|` |
//! | boolean | `true`/`false`, `1 t T TRUE true True`, `0 f F FALSE false False` | 1 / 0 |
//! | string | JSON string | `sha256(utf8)` reduced mod `p` |
//! | date | non-negative integer, RFC 3339, `YYYY-MM-DD` | Unix seconds |

use ark_bn254::Fr;
use ark_ff::PrimeField;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zkattest_core::Timestamp;
use zkattest_schema::{FieldDefinition, FieldType};

/// Largest float magnitude converted without overflowing `i128`.
const MAX_FLOAT_MAGNITUDE: f64 = 1.7e38;

/// A raw input value that cannot be turned into a field element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("field '{field}' expects {expected}, got {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("field '{field}' has unparseable value {value:?}")]
    Unparseable { field: String, value: String },

    #[error("field '{field}' is not a finite number")]
    NonFinite { field: String },

    #[error("field '{field}' is out of range")]
    OutOfRange { field: String },

    #[error("field '{field}' is a timestamp before 1970-01-01: {value}")]
    NegativeTimestamp { field: String, value: i64 },
}

/// Normalize `value` as an instance of `field`.
pub fn normalize(field: &FieldDefinition, value: &Value) -> Result<Fr, ConversionError> {
    match field.field_type {
        FieldType::Integer | FieldType::Number => normalize_number(&field.name, value),
        FieldType::Boolean => normalize_bool(&field.name, value),
        FieldType::String => match value {
            Value::String(s) => Ok(hash_string(s)),
            other => Err(wrong_type(&field.name, "a string", other)),
        },
        FieldType::Date => normalize_date(&field.name, value),
    }
}

/// Field element of a string value or string literal.
pub fn hash_string(s: &str) -> Fr {
    Fr::from_be_bytes_mod_order(&Sha256::digest(s.as_bytes()))
}

/// Field element of a signed integer; negatives wrap to `p - |x|`.
pub fn signed_to_field(x: i128) -> Fr {
    let magnitude = Fr::from(x.unsigned_abs());
    if x < 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn normalize_number(field: &str, value: &Value) -> Result<Fr, ConversionError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(signed_to_field(i128::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Fr::from(u))
            } else {
                let f = n.as_f64().ok_or_else(|| ConversionError::NonFinite {
                    field: field.to_string(),
                })?;
                truncate_float(field, f)
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(ConversionError::Unparseable {
                    field: field.to_string(),
                    value: String::new(),
                });
            }
            if let Ok(i) = s.parse::<i128>() {
                return Ok(signed_to_field(i));
            }
            match s.parse::<f64>() {
                Ok(f) => truncate_float(field, f),
                Err(_) => Err(ConversionError::Unparseable {
                    field: field.to_string(),
                    value: s.to_string(),
                }),
            }
        }
        other => Err(wrong_type(field, "a number", other)),
    }
}

fn truncate_float(field: &str, f: f64) -> Result<Fr, ConversionError> {
    if !f.is_finite() {
        return Err(ConversionError::NonFinite {
            field: field.to_string(),
        });
    }
    let t = f.trunc();
    if t.abs() > MAX_FLOAT_MAGNITUDE {
        return Err(ConversionError::OutOfRange {
            field: field.to_string(),
        });
    }
    Ok(signed_to_field(t as i128))
}

fn normalize_bool(field: &str, value: &Value) -> Result<Fr, ConversionError> {
    let b = match value {
        Value::Bool(b) => *b,
        Value::String(s) => match s.as_str() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => true,
            "0" | "f" | "F" | "FALSE" | "false" | "False" => false,
            _ => {
                return Err(ConversionError::Unparseable {
                    field: field.to_string(),
                    value: s.clone(),
                })
            }
        },
        other => return Err(wrong_type(field, "a boolean", other)),
    };
    Ok(Fr::from(u64::from(b)))
}

fn normalize_date(field: &str, value: &Value) -> Result<Fr, ConversionError> {
    let secs = match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Ok(Fr::from(u));
            }
            n.as_i64()
                .ok_or_else(|| wrong_type(field, "an integer timestamp", value))?
        }
        Value::String(s) => Timestamp::parse_date(s)
            .map_err(|_| ConversionError::Unparseable {
                field: field.to_string(),
                value: s.clone(),
            })?
            .epoch_secs(),
        other => return Err(wrong_type(field, "a date", other)),
    };
    if secs < 0 {
        return Err(ConversionError::NegativeTimestamp {
            field: field.to_string(),
            value: secs,
        });
    }
    Ok(Fr::from(secs.unsigned_abs()))
}

fn wrong_type(field: &str, expected: &'static str, found: &Value) -> ConversionError {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    ConversionError::WrongType {
        field: field.to_string(),
        expected,
        found: found.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zkattest_schema::Visibility;

    fn def(ty: FieldType) -> FieldDefinition {
        FieldDefinition {
            name: "f".into(),
            field_type: ty,
            required: true,
            visibility: Visibility::Secret,
            description: String::new(),
        }
    }

    fn n(v: Value) -> Result<Fr, ConversionError> {
        normalize(&def(FieldType::Integer), &v)
    }

    #[test]
    fn integers_and_numeric_strings() {
        assert_eq!(n(json!(42)).unwrap(), Fr::from(42u64));
        assert_eq!(n(json!(" 42 ")).unwrap(), Fr::from(42u64));
        assert_eq!(n(json!("42.9")).unwrap(), Fr::from(42u64));
        assert_eq!(n(json!(42.9)).unwrap(), Fr::from(42u64));
        assert_eq!(n(json!(u64::MAX)).unwrap(), Fr::from(u64::MAX));
    }

    #[test]
    fn negatives_wrap_around_modulus() {
        assert_eq!(n(json!(-5)).unwrap(), -Fr::from(5u64));
        assert_eq!(n(json!("-5.7")).unwrap(), -Fr::from(5u64));
        assert_eq!(n(json!(-5)).unwrap() + Fr::from(5u64), Fr::from(0u64));
    }

    #[test]
    fn number_rejects_non_numbers() {
        for bad in [json!(""), json!("  "), json!("abc"), json!(true), json!(null), json!([1]), json!({})] {
            assert!(n(bad.clone()).is_err(), "{bad}");
        }
        assert!(matches!(n(json!("NaN")), Err(ConversionError::NonFinite { .. })));
        assert!(matches!(n(json!("inf")), Err(ConversionError::NonFinite { .. })));
        assert!(matches!(n(json!(1e300)), Err(ConversionError::OutOfRange { .. })));
    }

    #[test]
    fn boolean_forms() {
        let b = def(FieldType::Boolean);
        for t in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(normalize(&b, &json!(t)).unwrap(), Fr::from(1u64));
        }
        for f in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(normalize(&b, &json!(f)).unwrap(), Fr::from(0u64));
        }
        assert_eq!(normalize(&b, &json!(true)).unwrap(), Fr::from(1u64));
        assert!(normalize(&b, &json!("yes")).is_err());
        assert!(normalize(&b, &json!(1)).is_err());
    }

    #[test]
    fn strings_are_hashed() {
        let s = def(FieldType::String);
        let a = normalize(&s, &json!("NL")).unwrap();
        assert_eq!(a, hash_string("NL"));
        assert_ne!(a, hash_string("nl"));
        assert!(normalize(&s, &json!(5)).is_err());
    }

    #[test]
    fn dates() {
        let d = def(FieldType::Date);
        assert_eq!(normalize(&d, &json!("2020-01-01")).unwrap(), Fr::from(1_577_836_800u64));
        assert_eq!(
            normalize(&d, &json!("2020-01-01T00:00:10Z")).unwrap(),
            Fr::from(1_577_836_810u64)
        );
        assert_eq!(normalize(&d, &json!(86400)).unwrap(), Fr::from(86400u64));
        assert!(matches!(
            normalize(&d, &json!(-1)),
            Err(ConversionError::NegativeTimestamp { value: -1, .. })
        ));
        assert!(matches!(
            normalize(&d, &json!("1969-12-31")),
            Err(ConversionError::NegativeTimestamp { .. })
        ));
        assert!(normalize(&d, &json!("01/01/2020")).is_err());
        assert!(normalize(&d, &json!(1.5)).is_err());
    }
}
