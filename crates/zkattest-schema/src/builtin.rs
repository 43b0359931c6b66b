//! # Built-in Schemas
//!
//! Schemas shipped with the service so a relying party can request a
//! common presentation without authoring one.

use crate::error::SchemaError;
use crate::model::SchemaDefinition;
use crate::parse::parse_schema_str;

/// Age over 18, with the current date supplied as public inputs and the
/// relying party's audience and nonce bound into the public witness.
pub const AGE_OVER_18_SCHEMA: &str = r#"{
  "schema_id": "age_over_18",
  "version": "1.0.1",
  "fields": [
    {"name": "birth_year", "type": "integer", "required": true, "secret": true, "description": "Year of birth"},
    {"name": "birth_month", "type": "integer", "required": true, "secret": true, "description": "Month of birth (1-12)"},
    {"name": "birth_day", "type": "integer", "required": true, "secret": true, "description": "Day of birth (1-31)"},
    {"name": "current_year", "type": "integer", "required": true, "public": true},
    {"name": "current_month", "type": "integer", "required": true, "public": true},
    {"name": "current_day", "type": "integer", "required": true, "public": true},
    {"name": "aud", "type": "string", "required": true, "public": true, "description": "Relying party audience"},
    {"name": "nonce", "type": "string", "required": true, "public": true, "description": "Per-request nonce"}
  ],
  "constraints": [
    {
      "type": "age_verification",
      "fields": ["birth_year", "birth_month", "birth_day", "current_year", "current_month", "current_day"],
      "operator": "ge",
      "value": 18,
      "error_message": "holder must be at least 18 years old"
    },
    {"type": "range_check", "fields": ["birth_month"], "operator": "between", "value": [1, 12]},
    {"type": "range_check", "fields": ["birth_day"], "operator": "between", "value": [1, 31]}
  ]
}"#;

/// Names accepted by [`builtin`].
pub const BUILTIN_NAMES: &[&str] = &["age_over_18"];

/// Parse the built-in age-over-18 schema.
pub fn age_over_18() -> Result<SchemaDefinition, SchemaError> {
    parse_schema_str(AGE_OVER_18_SCHEMA)
}

/// Look up a built-in schema by name. Returns `None` for unknown names.
pub fn builtin(name: &str) -> Option<Result<SchemaDefinition, SchemaError>> {
    match name {
        "age_over_18" => Some(age_over_18()),
        _ => None,
    }
}
