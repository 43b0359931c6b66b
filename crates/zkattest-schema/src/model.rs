//! # Schema Model
//!
//! Validated, immutable representation of a constraint schema. Instances
//! are produced only by [`parse_schema`](crate::parse_schema); once built,
//! the field order is fixed and the slot layout derived from it must not
//! change for as long as a verifying key issued for the schema hash is in
//! use.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use zkattest_core::{CanonicalBytes, ContentDigest};

/// Declared type of a field. Determines how raw input values are
/// normalized into field elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Number,
    Boolean,
    String,
    Date,
}

impl FieldType {
    /// Parse the `type` attribute. Empty means `string`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "" | "string" => Some(Self::String),
            "date" => Some(Self::Date),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Date => "date",
        }
    }

    /// Integer or number.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Number)
    }

    /// Strings are hashed into the field, so only equality is meaningful.
    pub fn is_hashed(&self) -> bool {
        matches!(self, Self::String)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a field is a circuit public input or a private witness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Secret,
    Public,
}

/// A declared schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub visibility: Visibility,
    pub description: String,
}

impl FieldDefinition {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// Relational operator of a `comparison` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    GreaterEqual,
    GreaterThan,
    LessEqual,
    LessThan,
    Equal,
    NotEqual,
}

impl ComparisonOperator {
    /// Accepts both the short and the long spelling (`ge`, `greater_equal`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "ge" | "greater_equal" => Some(Self::GreaterEqual),
            "gt" | "greater_than" => Some(Self::GreaterThan),
            "le" | "less_equal" => Some(Self::LessEqual),
            "lt" | "less_than" => Some(Self::LessThan),
            "eq" | "equal" => Some(Self::Equal),
            "ne" | "not_equal" => Some(Self::NotEqual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GreaterEqual => "ge",
            Self::GreaterThan => "gt",
            Self::LessEqual => "le",
            Self::LessThan => "lt",
            Self::Equal => "eq",
            Self::NotEqual => "ne",
        }
    }

    /// `eq` and `ne` are the only operators valid over hashed strings.
    pub fn is_equality(&self) -> bool {
        matches!(self, Self::Equal | Self::NotEqual)
    }
}

/// Constant on the right-hand side of a single-field comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Already an integer: numbers, numeric strings, booleans, dates.
    Integer(i64),
    /// A string literal, hashed into the field like a string input.
    Text(String),
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Field(String),
    Literal(Literal),
}

/// `min ≤ field ≤ max`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeCheck {
    pub field: String,
    pub min: i64,
    pub max: i64,
    pub error_message: Option<String>,
}

/// `left <op> right`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub left: String,
    pub operator: ComparisonOperator,
    pub right: Operand,
    pub error_message: Option<String>,
}

/// Field names making up a calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFields {
    pub year: String,
    pub month: String,
    pub day: String,
}

/// Age-over-threshold check between a secret birth date and a public
/// current date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeVerification {
    pub birth: DateFields,
    pub current: DateFields,
    pub min_age: i64,
    /// Declared with only the three birth fields and upgraded using the
    /// schema's `current_*` public fields.
    pub upgraded_from_legacy: bool,
    pub error_message: Option<String>,
}

/// A validated constraint. The set is closed; consumers match on it
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Range(RangeCheck),
    Comparison(Comparison),
    Age(AgeVerification),
}

impl Constraint {
    /// The `type` string this constraint was declared with.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Range(_) => "range_check",
            Self::Comparison(_) => "comparison",
            Self::Age(_) => "age_verification",
        }
    }

    /// Every field name the constraint reads, in declaration order.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::Range(r) => vec![r.field.as_str()],
            Self::Comparison(c) => match &c.right {
                Operand::Field(rhs) => vec![c.left.as_str(), rhs.as_str()],
                Operand::Literal(_) => vec![c.left.as_str()],
            },
            Self::Age(a) => vec![
                a.birth.year.as_str(),
                a.birth.month.as_str(),
                a.birth.day.as_str(),
                a.current.year.as_str(),
                a.current.month.as_str(),
                a.current.day.as_str(),
            ],
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Range(r) => r.error_message.as_deref(),
            Self::Comparison(c) => c.error_message.as_deref(),
            Self::Age(a) => a.error_message.as_deref(),
        }
    }
}

/// A parsed and validated constraint schema.
///
/// Carries the canonical bytes it was parsed from and their digest. The
/// digest is the schema hash that keys proving and verifying keys.
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    pub(crate) schema_id: String,
    pub(crate) version: String,
    pub(crate) fields: Vec<FieldDefinition>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) field_index: HashMap<String, usize>,
    pub(crate) canonical: CanonicalBytes,
    pub(crate) hash: ContentDigest,
}

impl SchemaDefinition {
    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.field_index.get(name).map(|&i| &self.fields[i])
    }

    /// Names of secret fields, in declaration order. Defines the witness
    /// slot layout.
    pub fn secret_field_order(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !f.is_public())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Names of public fields, in declaration order. Defines the public
    /// input layout, and therefore the public witness the verifier checks.
    pub fn public_field_order(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.is_public())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// The canonical JSON this schema was parsed from.
    pub fn canonical_json(&self) -> &CanonicalBytes {
        &self.canonical
    }

    /// `sha256:<hex>` of the canonical JSON.
    pub fn schema_hash(&self) -> ContentDigest {
        self.hash
    }
}
