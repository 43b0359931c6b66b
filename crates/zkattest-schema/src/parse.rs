//! # Schema Parsing
//!
//! `parse_schema` turns raw bytes into a [`SchemaDefinition`] in four
//! stages:
//!
//! 1. JSON decode.
//! 2. Canonicalization (JCS) and hashing. All later stages read the
//!    canonical form, so the schema hash always describes exactly what was
//!    validated.
//! 3. Structural validation against the embedded Draft 2020-12 JSON
//!    Schema (`schemas/constraint-schema.schema.json`).
//! 4. Semantic validation: unique names, known fields, per-type arity,
//!    operator spelling, bound and literal typing.

use std::collections::HashMap;
use std::sync::OnceLock;

use jsonschema::Validator;
use serde::Deserialize;
use serde_json::Value;
use zkattest_core::{sha256_digest, CanonicalBytes, Timestamp};

use crate::error::SchemaError;
use crate::model::{
    AgeVerification, Comparison, ComparisonOperator, Constraint, DateFields, FieldDefinition,
    FieldType, Literal, Operand, RangeCheck, SchemaDefinition, Visibility,
};

const STRUCTURAL_SCHEMA: &str = include_str!("../schemas/constraint-schema.schema.json");

/// Field names the legacy three-field age form is bound to.
const LEGACY_CURRENT_FIELDS: [&str; 3] = ["current_year", "current_month", "current_day"];

/// Upper bound on `min_age`.
const MAX_MIN_AGE: i64 = 150;

#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(default)]
    schema_id: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    constraints: Vec<RawConstraint>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    field_type: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    secret: Option<bool>,
    #[serde(default)]
    public: bool,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct RawConstraint {
    #[serde(rename = "type", default)]
    constraint_type: String,
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    operator: String,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    error_message: String,
}

/// Parse and validate a constraint schema from raw JSON bytes.
///
/// # Errors
///
/// Returns a [`SchemaError`] describing the first problem found. Structural
/// violations are reported all at once.
pub fn parse_schema(bytes: &[u8]) -> Result<SchemaDefinition, SchemaError> {
    let value: Value = serde_json::from_slice(bytes)?;
    parse_schema_value(&value)
}

/// Parse and validate a schema that is already a JSON value.
pub fn parse_schema_value(value: &Value) -> Result<SchemaDefinition, SchemaError> {
    let canonical = CanonicalBytes::new(value)?;
    let hash = sha256_digest(&canonical);
    let canonical_value: Value = serde_json::from_str(canonical.as_str())?;

    validate_structure(&canonical_value)?;

    let raw: RawSchema = serde_json::from_value(canonical_value)?;
    let (fields, field_index) = build_fields(raw.fields)?;
    let constraints = raw
        .constraints
        .into_iter()
        .enumerate()
        .map(|(i, c)| build_constraint(i, c, &fields, &field_index))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SchemaDefinition {
        schema_id: raw.schema_id,
        version: raw.version,
        fields,
        constraints,
        field_index,
        canonical,
        hash,
    })
}

/// Parse and validate a schema from JSON text.
pub fn parse_schema_str(text: &str) -> Result<SchemaDefinition, SchemaError> {
    parse_schema(text.as_bytes())
}

fn structural_validator() -> Result<&'static Validator, SchemaError> {
    static VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();
    VALIDATOR
        .get_or_init(|| {
            let schema: Value =
                serde_json::from_str(STRUCTURAL_SCHEMA).map_err(|e| e.to_string())?;
            jsonschema::options()
                .with_draft(jsonschema::Draft::Draft202012)
                .build(&schema)
                .map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| SchemaError::ValidatorUnavailable(e.clone()))
}

fn validate_structure(instance: &Value) -> Result<(), SchemaError> {
    let validator = structural_validator()?;
    let violations: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| {
            let path = e.instance_path.to_string();
            let path = if path.is_empty() { "/".to_string() } else { path };
            format!("{path}: {e}")
        })
        .collect();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Structural { violations })
    }
}

fn build_fields(
    raw: Vec<RawField>,
) -> Result<(Vec<FieldDefinition>, HashMap<String, usize>), SchemaError> {
    if raw.is_empty() {
        return Err(SchemaError::NoFields);
    }
    let mut fields = Vec::with_capacity(raw.len());
    let mut index = HashMap::with_capacity(raw.len());
    for (i, f) in raw.into_iter().enumerate() {
        if f.name.trim().is_empty() {
            return Err(SchemaError::EmptyFieldName { index: i });
        }
        if index.contains_key(&f.name) {
            return Err(SchemaError::DuplicateField(f.name));
        }
        if f.public && f.secret == Some(true) {
            return Err(SchemaError::ConflictingVisibility(f.name));
        }
        let visibility = if f.public {
            Visibility::Public
        } else {
            Visibility::Secret
        };
        // The structural schema already restricts `type` to known names.
        let field_type = FieldType::parse(&f.field_type).unwrap_or(FieldType::String);
        index.insert(f.name.clone(), i);
        fields.push(FieldDefinition {
            name: f.name,
            field_type,
            required: f.required,
            visibility,
            description: f.description,
        });
    }
    Ok((fields, index))
}

/// Declared fields by name. Constraint field names are checked against the
/// index before any lookup.
struct FieldTable<'a> {
    fields: &'a [FieldDefinition],
    index: &'a HashMap<String, usize>,
}

impl<'a> FieldTable<'a> {
    fn find(&self, name: &str) -> Option<&'a FieldDefinition> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    fn get(&self, name: &str) -> &'a FieldDefinition {
        &self.fields[self.index[name]]
    }
}

fn build_constraint(
    position: usize,
    raw: RawConstraint,
    fields: &[FieldDefinition],
    index: &HashMap<String, usize>,
) -> Result<Constraint, SchemaError> {
    let kind = raw.constraint_type.trim().to_string();
    if kind.is_empty() {
        return Err(SchemaError::MissingConstraintType { index: position });
    }
    if raw.fields.is_empty() {
        return Err(SchemaError::Arity {
            constraint: kind,
            expected: "at least 1",
            found: 0,
        });
    }
    for name in &raw.fields {
        if !index.contains_key(name) {
            return Err(SchemaError::UnknownField {
                constraint: kind,
                field: name.clone(),
            });
        }
    }
    let table = FieldTable { fields, index };
    let error_message = Some(raw.error_message.clone()).filter(|m| !m.is_empty());

    match kind.as_str() {
        "range_check" => build_range(&kind, raw, &table, error_message),
        "comparison" => build_comparison(&kind, raw, &table, error_message),
        "age_verification" => build_age(&kind, raw, &table, error_message),
        _ => Err(SchemaError::UnknownConstraintType(kind)),
    }
}

fn build_range(
    kind: &str,
    raw: RawConstraint,
    table: &FieldTable<'_>,
    error_message: Option<String>,
) -> Result<Constraint, SchemaError> {
    if raw.fields.len() != 1 {
        return Err(SchemaError::Arity {
            constraint: kind.to_string(),
            expected: "exactly 1",
            found: raw.fields.len(),
        });
    }
    if !matches!(raw.operator.trim(), "" | "between") {
        return Err(SchemaError::InvalidOperator {
            constraint: kind.to_string(),
            operator: raw.operator,
        });
    }
    let field = table.get(&raw.fields[0]);
    if field.field_type.is_hashed() {
        return Err(SchemaError::UnsupportedStringOperation {
            constraint: kind.to_string(),
            field: field.name.clone(),
        });
    }
    let invalid = |reason: &str| SchemaError::InvalidValue {
        constraint: kind.to_string(),
        reason: reason.to_string(),
    };
    let bounds = match raw.value {
        None => {
            return Err(SchemaError::MissingValue {
                constraint: kind.to_string(),
            })
        }
        Some(Value::Array(items)) => items,
        Some(_) => return Err(invalid("expected a two-element array [min, max]")),
    };
    let [lo, hi] = bounds.as_slice() else {
        return Err(invalid("expected a two-element array [min, max]"));
    };
    let (Some(min), Some(max)) = (lo.as_i64(), hi.as_i64()) else {
        return Err(invalid("range bounds must be whole numbers"));
    };
    if min > max {
        return Err(invalid("range lower bound exceeds upper bound"));
    }
    Ok(Constraint::Range(RangeCheck {
        field: field.name.clone(),
        min,
        max,
        error_message,
    }))
}

fn build_comparison(
    kind: &str,
    raw: RawConstraint,
    table: &FieldTable<'_>,
    error_message: Option<String>,
) -> Result<Constraint, SchemaError> {
    let operator = ComparisonOperator::parse(&raw.operator).ok_or_else(|| {
        SchemaError::InvalidOperator {
            constraint: kind.to_string(),
            operator: raw.operator.clone(),
        }
    })?;
    let left = table.get(&raw.fields[0]);

    let right = match raw.fields.len() {
        1 => {
            let value = raw.value.as_ref().ok_or_else(|| SchemaError::MissingValue {
                constraint: kind.to_string(),
            })?;
            Operand::Literal(literal_for(kind, left, value)?)
        }
        2 => {
            let rhs = table.get(&raw.fields[1]);
            if left.field_type.is_hashed() != rhs.field_type.is_hashed() {
                let non_string = if left.field_type.is_hashed() { rhs } else { left };
                return Err(SchemaError::FieldType {
                    constraint: kind.to_string(),
                    field: non_string.name.clone(),
                    expected: "a string when compared with a string",
                });
            }
            Operand::Field(rhs.name.clone())
        }
        found => {
            return Err(SchemaError::Arity {
                constraint: kind.to_string(),
                expected: "1 or 2",
                found,
            })
        }
    };

    if left.field_type.is_hashed() && !operator.is_equality() {
        return Err(SchemaError::UnsupportedStringOperation {
            constraint: kind.to_string(),
            field: left.name.clone(),
        });
    }

    Ok(Constraint::Comparison(Comparison {
        left: left.name.clone(),
        operator,
        right,
        error_message,
    }))
}

/// Type a comparison literal according to the field it is compared with.
fn literal_for(
    kind: &str,
    field: &FieldDefinition,
    value: &Value,
) -> Result<Literal, SchemaError> {
    let invalid = |reason: String| SchemaError::InvalidValue {
        constraint: kind.to_string(),
        reason,
    };
    match (field.field_type, value) {
        (FieldType::String, Value::String(s)) => Ok(Literal::Text(s.clone())),
        (FieldType::String, other) => Err(invalid(format!(
            "string field '{}' must be compared with a string literal, got {other}",
            field.name
        ))),
        (FieldType::Boolean, Value::Bool(b)) => Ok(Literal::Integer(i64::from(*b))),
        (FieldType::Date, Value::String(s)) => Timestamp::parse_date(s)
            .map(|ts| Literal::Integer(ts.epoch_secs()))
            .map_err(|e| invalid(e.to_string())),
        (_, Value::Number(n)) => n
            .as_i64()
            .map(Literal::Integer)
            .ok_or_else(|| invalid(format!("literal {n} is not a whole number"))),
        (_, Value::String(s)) => parse_integer_text(s)
            .map(Literal::Integer)
            .ok_or_else(|| invalid(format!("literal {s:?} is not numeric"))),
        (_, other) => Err(invalid(format!(
            "literal {other} cannot be compared with {} field '{}'",
            field.field_type, field.name
        ))),
    }
}

fn parse_integer_text(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>().ok()
}

fn build_age(
    kind: &str,
    raw: RawConstraint,
    table: &FieldTable<'_>,
    error_message: Option<String>,
) -> Result<Constraint, SchemaError> {
    if !matches!(raw.operator.trim(), "" | "ge" | "greater_equal") {
        return Err(SchemaError::InvalidOperator {
            constraint: kind.to_string(),
            operator: raw.operator,
        });
    }

    let (names, upgraded_from_legacy): (Vec<String>, bool) = match raw.fields.len() {
        6 => (raw.fields.clone(), false),
        3 => {
            let declared = LEGACY_CURRENT_FIELDS
                .iter()
                .all(|name| table.find(name).is_some_and(FieldDefinition::is_public));
            if !declared {
                return Err(SchemaError::WallClockAgeConstraint);
            }
            tracing::warn!(
                birth_fields = ?raw.fields,
                "deprecated three-field age_verification; binding to public current_year/current_month/current_day"
            );
            let mut names = raw.fields.clone();
            names.extend(LEGACY_CURRENT_FIELDS.iter().map(|s| s.to_string()));
            (names, true)
        }
        found => {
            return Err(SchemaError::Arity {
                constraint: kind.to_string(),
                expected: "6 (birth y/m/d, current y/m/d)",
                found,
            })
        }
    };

    for (i, name) in names.iter().enumerate() {
        let field = table.get(name);
        if !field.field_type.is_numeric() {
            return Err(SchemaError::FieldType {
                constraint: kind.to_string(),
                field: name.clone(),
                expected: "integer or number",
            });
        }
        if i >= 3 && !field.is_public() {
            return Err(SchemaError::AgeFieldNotPublic(name.clone()));
        }
    }

    let min_age = match raw.value.as_ref() {
        None => {
            return Err(SchemaError::MissingValue {
                constraint: kind.to_string(),
            })
        }
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => parse_integer_text(s),
        Some(_) => None,
    }
    .filter(|age| (0..=MAX_MIN_AGE).contains(age))
    .ok_or_else(|| SchemaError::InvalidValue {
        constraint: kind.to_string(),
        reason: format!("minimum age must be a whole number in 0..={MAX_MIN_AGE}"),
    })?;

    let date = |offset: usize| DateFields {
        year: names[offset].clone(),
        month: names[offset + 1].clone(),
        day: names[offset + 2].clone(),
    };

    Ok(Constraint::Age(AgeVerification {
        birth: date(0),
        current: date(3),
        min_age,
        upgraded_from_legacy,
        error_message,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: Value) -> Result<SchemaDefinition, SchemaError> {
        parse_schema_value(&v)
    }

    fn field(name: &str, ty: &str, public: bool) -> Value {
        json!({"name": name, "type": ty, "required": true, "public": public})
    }

    #[test]
    fn defaults_visibility_and_type() {
        let s = parse(json!({"fields": [{"name": "a"}, {"name": "b", "public": true}]})).unwrap();
        let a = s.field("a").unwrap();
        assert_eq!(a.visibility, Visibility::Secret);
        assert_eq!(a.field_type, FieldType::String);
        assert!(!a.required);
        assert!(s.field("b").unwrap().is_public());
        assert_eq!(s.secret_field_order(), vec!["a"]);
        assert_eq!(s.public_field_order(), vec!["b"]);
    }

    #[test]
    fn explicit_secret_false_still_secret() {
        let s = parse(json!({"fields": [{"name": "a", "secret": false}]})).unwrap();
        assert!(!s.field("a").unwrap().is_public());
    }

    #[test]
    fn rejects_empty_field_list() {
        assert!(matches!(parse(json!({"fields": []})), Err(SchemaError::NoFields)));
    }

    #[test]
    fn rejects_missing_fields_key_structurally() {
        match parse(json!({"schema_id": "x"})) {
            Err(SchemaError::Structural { violations }) => {
                assert!(violations.iter().any(|v| v.contains("fields")));
            }
            other => panic!("expected Structural, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_field_type_structurally() {
        let r = parse(json!({"fields": [{"name": "a", "type": "float"}]}));
        assert!(matches!(r, Err(SchemaError::Structural { .. })));
    }

    #[test]
    fn rejects_duplicate_and_empty_names() {
        let dup = parse(json!({"fields": [{"name": "a"}, {"name": "a"}]}));
        assert!(matches!(dup, Err(SchemaError::DuplicateField(n)) if n == "a"));
        let empty = parse(json!({"fields": [{"name": "a"}, {"name": " "}]}));
        assert!(matches!(empty, Err(SchemaError::EmptyFieldName { index: 1 })));
    }

    #[test]
    fn rejects_conflicting_visibility() {
        let r = parse(json!({"fields": [{"name": "a", "public": true, "secret": true}]}));
        assert!(matches!(r, Err(SchemaError::ConflictingVisibility(_))));
    }

    #[test]
    fn rejects_unknown_constraint_field_and_type() {
        let unknown_field = parse(json!({
            "fields": [field("x", "integer", false)],
            "constraints": [{"type": "range_check", "fields": ["y"], "value": [0, 1]}]
        }));
        assert!(matches!(unknown_field, Err(SchemaError::UnknownField { .. })));

        let unknown_type = parse(json!({
            "fields": [field("x", "integer", false)],
            "constraints": [{"type": "membership", "fields": ["x"]}]
        }));
        assert!(matches!(unknown_type, Err(SchemaError::UnknownConstraintType(t)) if t == "membership"));

        let missing_type = parse(json!({
            "fields": [field("x", "integer", false)],
            "constraints": [{"fields": ["x"]}]
        }));
        assert!(matches!(missing_type, Err(SchemaError::MissingConstraintType { index: 0 })));
    }

    #[test]
    fn range_check_bounds() {
        let s = parse(json!({
            "fields": [field("day", "integer", false)],
            "constraints": [{"type": "range_check", "fields": ["day"], "operator": "between", "value": [1, 31]}]
        }))
        .unwrap();
        assert_eq!(
            s.constraints()[0],
            Constraint::Range(RangeCheck {
                field: "day".into(),
                min: 1,
                max: 31,
                error_message: None
            })
        );

        for bad in [json!([1]), json!([5, 1]), json!(["a", 3]), json!(7)] {
            let r = parse(json!({
                "fields": [field("day", "integer", false)],
                "constraints": [{"type": "range_check", "fields": ["day"], "value": bad}]
            }));
            assert!(matches!(r, Err(SchemaError::InvalidValue { .. })), "{r:?}");
        }
    }

    #[test]
    fn whole_float_bounds_parse_like_integers() {
        let doc = |lo: Value, hi: Value| {
            json!({
                "fields": [field("day", "integer", false)],
                "constraints": [{"type": "range_check", "fields": ["day"], "value": [lo, hi]}]
            })
        };
        let floats = parse(doc(json!(1.0), json!(31.0))).unwrap();
        let ints = parse(doc(json!(1), json!(31))).unwrap();
        assert_eq!(floats.schema_hash(), ints.schema_hash());
        assert_eq!(floats.constraints(), ints.constraints());
    }

    #[test]
    fn range_check_fractional_bound_rejected() {
        let r = parse(json!({
            "fields": [field("day", "integer", false)],
            "constraints": [{"type": "range_check", "fields": ["day"], "value": [1.5, 31]}]
        }));
        assert!(matches!(r, Err(SchemaError::Canonicalization(_))));
    }

    #[test]
    fn range_check_on_string_rejected() {
        let r = parse(json!({
            "fields": [field("name", "string", false)],
            "constraints": [{"type": "range_check", "fields": ["name"], "value": [1, 2]}]
        }));
        assert!(matches!(r, Err(SchemaError::UnsupportedStringOperation { .. })));
    }

    #[test]
    fn comparison_literal_typing() {
        let s = parse(json!({
            "fields": [field("score", "integer", false), field("country", "string", false)],
            "constraints": [
                {"type": "comparison", "fields": ["score"], "operator": "gt", "value": "700"},
                {"type": "comparison", "fields": ["country"], "operator": "equal", "value": "NL"}
            ]
        }))
        .unwrap();
        match &s.constraints()[0] {
            Constraint::Comparison(c) => {
                assert_eq!(c.operator, ComparisonOperator::GreaterThan);
                assert_eq!(c.right, Operand::Literal(Literal::Integer(700)));
            }
            other => panic!("unexpected {other:?}"),
        }
        match &s.constraints()[1] {
            Constraint::Comparison(c) => {
                assert_eq!(c.right, Operand::Literal(Literal::Text("NL".into())));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn comparison_date_literal_becomes_timestamp() {
        let s = parse(json!({
            "fields": [field("issued", "date", false)],
            "constraints": [{"type": "comparison", "fields": ["issued"], "operator": "ge", "value": "2020-01-01"}]
        }))
        .unwrap();
        match &s.constraints()[0] {
            Constraint::Comparison(c) => {
                assert_eq!(c.right, Operand::Literal(Literal::Integer(1_577_836_800)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn comparison_string_ordering_rejected() {
        let r = parse(json!({
            "fields": [field("name", "string", false)],
            "constraints": [{"type": "comparison", "fields": ["name"], "operator": "lt", "value": "m"}]
        }));
        assert!(matches!(r, Err(SchemaError::UnsupportedStringOperation { .. })));
    }

    #[test]
    fn comparison_mixed_string_and_number_rejected() {
        let r = parse(json!({
            "fields": [field("name", "string", false), field("n", "integer", false)],
            "constraints": [{"type": "comparison", "fields": ["name", "n"], "operator": "eq"}]
        }));
        assert!(matches!(r, Err(SchemaError::FieldType { .. })));
    }

    #[test]
    fn comparison_operator_and_arity_errors() {
        let bad_op = parse(json!({
            "fields": [field("a", "integer", false)],
            "constraints": [{"type": "comparison", "fields": ["a"], "operator": ">=", "value": 1}]
        }));
        assert!(matches!(bad_op, Err(SchemaError::InvalidOperator { .. })));

        let no_value = parse(json!({
            "fields": [field("a", "integer", false)],
            "constraints": [{"type": "comparison", "fields": ["a"], "operator": "ge"}]
        }));
        assert!(matches!(no_value, Err(SchemaError::MissingValue { .. })));

        let three = parse(json!({
            "fields": [field("a", "integer", false), field("b", "integer", false), field("c", "integer", false)],
            "constraints": [{"type": "comparison", "fields": ["a", "b", "c"], "operator": "ge"}]
        }));
        assert!(matches!(three, Err(SchemaError::Arity { found: 3, .. })));
    }

    fn age_fields() -> Vec<Value> {
        vec![
            field("birth_year", "integer", false),
            field("birth_month", "integer", false),
            field("birth_day", "integer", false),
            field("current_year", "integer", true),
            field("current_month", "integer", true),
            field("current_day", "integer", true),
        ]
    }

    #[test]
    fn age_six_field_form() {
        let s = parse(json!({
            "fields": age_fields(),
            "constraints": [{
                "type": "age_verification",
                "fields": ["birth_year", "birth_month", "birth_day", "current_year", "current_month", "current_day"],
                "operator": "ge",
                "value": 18
            }]
        }))
        .unwrap();
        match &s.constraints()[0] {
            Constraint::Age(a) => {
                assert_eq!(a.min_age, 18);
                assert_eq!(a.current.day, "current_day");
                assert!(!a.upgraded_from_legacy);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn age_legacy_form_upgraded_when_current_fields_public() {
        let s = parse(json!({
            "fields": age_fields(),
            "constraints": [{"type": "age_verification", "fields": ["birth_year", "birth_month", "birth_day"], "value": 21}]
        }))
        .unwrap();
        match &s.constraints()[0] {
            Constraint::Age(a) => {
                assert!(a.upgraded_from_legacy);
                assert_eq!(a.current.year, "current_year");
                assert_eq!(a.min_age, 21);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn age_legacy_form_without_current_fields_rejected() {
        let r = parse(json!({
            "fields": [field("birth_year", "integer", false), field("birth_month", "integer", false), field("birth_day", "integer", false)],
            "constraints": [{"type": "age_verification", "fields": ["birth_year", "birth_month", "birth_day"], "value": 18}]
        }));
        assert!(matches!(r, Err(SchemaError::WallClockAgeConstraint)));
    }

    #[test]
    fn age_current_fields_must_be_public() {
        let mut fields = age_fields();
        fields[5] = field("current_day", "integer", false);
        let r = parse(json!({
            "fields": fields,
            "constraints": [{
                "type": "age_verification",
                "fields": ["birth_year", "birth_month", "birth_day", "current_year", "current_month", "current_day"],
                "value": 18
            }]
        }));
        assert!(matches!(r, Err(SchemaError::AgeFieldNotPublic(f)) if f == "current_day"));
    }

    #[test]
    fn age_min_age_validated() {
        for bad in [json!(-1), json!(151), json!("old"), json!([18])] {
            let r = parse(json!({
                "fields": age_fields(),
                "constraints": [{
                    "type": "age_verification",
                    "fields": ["birth_year", "birth_month", "birth_day", "current_year", "current_month", "current_day"],
                    "value": bad
                }]
            }));
            assert!(matches!(r, Err(SchemaError::InvalidValue { .. })), "{r:?}");
        }
    }

    #[test]
    fn schema_hash_ignores_formatting() {
        let a = parse_schema(br#"{"fields":[{"name":"a","type":"integer"}],"schema_id":"s"}"#).unwrap();
        let b = parse_schema(b"{ \"schema_id\" : \"s\",\n \"fields\" : [ {\"type\":\"integer\",\"name\":\"a\"} ] }").unwrap();
        assert_eq!(a.schema_hash(), b.schema_hash());
        assert_eq!(a.canonical_json(), b.canonical_json());
    }

    #[test]
    fn invalid_json_reported() {
        assert!(matches!(parse_schema(b"{not json"), Err(SchemaError::InvalidJson(_))));
    }
}
