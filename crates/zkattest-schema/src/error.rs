//! # Schema Errors
//!
//! Every way a constraint schema can be rejected. A `SchemaError` is
//! reported to the schema author at request-creation time and never
//! reaches the circuit builder.

use thiserror::Error;
use zkattest_core::CanonicalizationError;

/// Malformed or inconsistent constraint schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The input is not JSON at all.
    #[error("schema is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The schema could not be reduced to canonical bytes.
    #[error("schema cannot be canonicalized: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// The document violates the structural JSON Schema.
    #[error("schema is structurally invalid:\n{}", violations.join("\n"))]
    Structural {
        /// One line per violation, prefixed with its instance path.
        violations: Vec<String>,
    },

    /// The embedded structural JSON Schema failed to compile.
    #[error("structural validator unavailable: {0}")]
    ValidatorUnavailable(String),

    #[error("schema must declare at least one field")]
    NoFields,

    #[error("field #{index} has an empty name")]
    EmptyFieldName { index: usize },

    #[error("duplicate field '{0}' in schema")]
    DuplicateField(String),

    /// A field claims to be both public and secret.
    #[error("field '{0}' is marked both public and secret")]
    ConflictingVisibility(String),

    #[error("constraint #{index} must declare a type")]
    MissingConstraintType { index: usize },

    #[error("unknown constraint type '{0}'")]
    UnknownConstraintType(String),

    #[error("constraint '{constraint}' references unknown field '{field}'")]
    UnknownField { constraint: String, field: String },

    /// Wrong number of fields for the constraint type.
    #[error("constraint '{constraint}' expects {expected} field(s), got {found}")]
    Arity {
        constraint: String,
        expected: &'static str,
        found: usize,
    },

    #[error("constraint '{constraint}' has invalid operator '{operator}'")]
    InvalidOperator { constraint: String, operator: String },

    #[error("constraint '{constraint}' is missing its value")]
    MissingValue { constraint: String },

    #[error("constraint '{constraint}' has an invalid value: {reason}")]
    InvalidValue { constraint: String, reason: String },

    /// Ordering and range constraints are meaningless over hashed strings.
    #[error("constraint '{constraint}' cannot order string field '{field}'; only eq/ne apply to strings")]
    UnsupportedStringOperation { constraint: String, field: String },

    /// A field's declared type does not fit the constraint.
    #[error("constraint '{constraint}' requires field '{field}' to be {expected}")]
    FieldType {
        constraint: String,
        field: String,
        expected: &'static str,
    },

    /// Three-field age check with no `current_*` public inputs to bind to.
    #[error(
        "age_verification over [birth_year, birth_month, birth_day] needs the current date as \
         public inputs; list current_year, current_month, current_day in the constraint"
    )]
    WallClockAgeConstraint,

    #[error("age_verification current-date field '{0}' must be public")]
    AgeFieldNotPublic(String),
}
