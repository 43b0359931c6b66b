//! # zkattest-schema: Constraint Schemas
//!
//! A constraint schema declares the fields of a claim (typed, secret or
//! public) and the constraints a proof must satisfy over them. This crate
//! parses schemas, validates them structurally and semantically, and hands
//! the circuit builder a closed, already-checked model.
//!
//! ## Crate Policy
//!
//! - Nothing downstream re-validates: a [`SchemaDefinition`] is only ever
//!   built by [`parse_schema`] and is immutable afterwards.
//! - The schema hash is computed over the canonical bytes, and every later
//!   stage reads those same bytes.

pub mod builtin;
pub mod error;
pub mod model;
pub mod parse;

pub use builtin::{age_over_18, builtin, AGE_OVER_18_SCHEMA, BUILTIN_NAMES};
pub use error::SchemaError;
pub use model::{
    AgeVerification, Comparison, ComparisonOperator, Constraint, DateFields, FieldDefinition,
    FieldType, Literal, Operand, RangeCheck, SchemaDefinition, Visibility,
};
pub use parse::{parse_schema, parse_schema_str, parse_schema_value};
