//! # Dynamic Circuit
//!
//! Compiles a [`SchemaDefinition`] into an R1CS circuit over BN254.
//!
//! Construction happens once per schema: the slot layout (public slots
//! first, then secret slots, each in declaration order) and the compiled
//! constraint plan are shared behind `Arc`. Each proof works on its own
//! clone, which copies only the value slots.
//!
//! ## Comparator Domain
//!
//! `a ≤ b` is enforced by decomposing `b - a` into [`COMPARISON_BITS`]
//! little-endian bits with nothing left over. Ordering operands must lie in
//! `[0, 2^COMPARISON_BITS)`: field operands of a comparison and the birth
//! year of an age check are decomposed the same way. Negative inputs
//! normalize to `p - |x|` and therefore fail any ordering constraint they
//! reach. Negative bounds and literals are rejected at compile time.

use std::collections::HashMap;
use std::sync::Arc;

use ark_bn254::Fr;
use ark_ff::{BigInteger, One, PrimeField, Zero};
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::select::CondSelectGadget;
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, SynthesisError, SynthesisMode,
};
use serde_json::{json, Map, Value};
use thiserror::Error;
use zkattest_core::{sha256_digest, CanonicalBytes, CanonicalizationError, ContentDigest};
use zkattest_schema::{
    ComparisonOperator, Constraint, FieldDefinition, Literal, Operand, SchemaDefinition,
};

use crate::normalize::{hash_string, normalize, ConversionError};

/// A schema that parses but cannot be compiled into a circuit.
#[derive(Error, Debug)]
pub enum CompilationError {
    #[error("range_check on '{field}' has negative bound {bound}; only non-negative bounds are supported")]
    NegativeBound { field: String, bound: i64 },

    #[error("comparison on '{field}' has negative literal {value}; only non-negative literals are supported")]
    NegativeLiteral { field: String, value: i64 },

    #[error("constraint references undeclared field '{0}'")]
    UnknownField(String),

    #[error("layout fingerprint failed: {0}")]
    Fingerprint(#[from] CanonicalizationError),
}

/// Witness values rejected by [`DynamicCircuit::assign_values`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("missing required field '{0}'")]
    MissingRequired(String),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Position of a field among the circuit's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Public(usize),
    Secret(usize),
}

/// Immutable slot layout of a compiled schema.
#[derive(Debug)]
pub struct CircuitLayout {
    public: Vec<FieldDefinition>,
    secret: Vec<FieldDefinition>,
    slots: HashMap<String, Slot>,
    declared: Vec<Slot>,
    fingerprint: ContentDigest,
}

impl CircuitLayout {
    fn from_schema(schema: &SchemaDefinition) -> Result<Self, CompilationError> {
        let mut public = Vec::new();
        let mut secret = Vec::new();
        let mut slots = HashMap::with_capacity(schema.fields().len());
        let mut declared = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            let slot = if field.is_public() {
                public.push(field.clone());
                Slot::Public(public.len() - 1)
            } else {
                secret.push(field.clone());
                Slot::Secret(secret.len() - 1)
            };
            slots.insert(field.name.clone(), slot);
            declared.push(slot);
        }

        let describe = |fields: &[FieldDefinition]| -> Vec<Value> {
            fields
                .iter()
                .map(|f| json!({"name": f.name, "type": f.field_type.as_str()}))
                .collect()
        };
        let doc = json!({"public": describe(&public), "secret": describe(&secret)});
        let fingerprint = sha256_digest(&CanonicalBytes::new(&doc)?);

        Ok(Self {
            public,
            secret,
            slots,
            declared,
            fingerprint,
        })
    }

    /// Public fields in instance order.
    pub fn public_fields(&self) -> &[FieldDefinition] {
        &self.public
    }

    /// Secret fields in witness order.
    pub fn secret_fields(&self) -> &[FieldDefinition] {
        &self.secret
    }

    pub fn slot(&self, name: &str) -> Option<Slot> {
        self.slots.get(name).copied()
    }

    pub fn field(&self, slot: Slot) -> &FieldDefinition {
        match slot {
            Slot::Public(i) => &self.public[i],
            Slot::Secret(i) => &self.secret[i],
        }
    }

    /// Digest of the slot orders and field types. Keys issued for a schema
    /// hash are only valid while this stays the same.
    pub fn fingerprint(&self) -> ContentDigest {
        self.fingerprint
    }

    fn require(&self, name: &str) -> Result<Slot, CompilationError> {
        self.slot(name)
            .ok_or_else(|| CompilationError::UnknownField(name.to_string()))
    }
}

/// Right-hand side of a compiled comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledOperand {
    Slot(Slot),
    Constant(Fr),
}

/// A constraint reduced to slot references and field constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledRule {
    Range {
        slot: Slot,
        min: Fr,
        max: Fr,
    },
    Compare {
        left: Slot,
        operator: ComparisonOperator,
        right: CompiledOperand,
    },
    Age {
        birth: [Slot; 3],
        current: [Slot; 3],
        min_age: Fr,
    },
}

#[derive(Debug, Clone)]
pub struct CompiledConstraint {
    /// The schema's `error_message`, or `kind(field, ...)`.
    pub label: String,
    pub rule: CompiledRule,
}

fn compile_constraint(
    layout: &CircuitLayout,
    constraint: &Constraint,
) -> Result<CompiledConstraint, CompilationError> {
    let rule = match constraint {
        Constraint::Range(r) => {
            let slot = layout.require(&r.field)?;
            for bound in [r.min, r.max] {
                if bound < 0 {
                    return Err(CompilationError::NegativeBound {
                        field: r.field.clone(),
                        bound,
                    });
                }
            }
            CompiledRule::Range {
                slot,
                min: Fr::from(r.min.unsigned_abs()),
                max: Fr::from(r.max.unsigned_abs()),
            }
        }
        Constraint::Comparison(c) => {
            let left = layout.require(&c.left)?;
            let right = match &c.right {
                Operand::Field(name) => CompiledOperand::Slot(layout.require(name)?),
                Operand::Literal(Literal::Text(s)) => CompiledOperand::Constant(hash_string(s)),
                Operand::Literal(Literal::Integer(i)) if *i < 0 => {
                    return Err(CompilationError::NegativeLiteral {
                        field: c.left.clone(),
                        value: *i,
                    })
                }
                Operand::Literal(Literal::Integer(i)) => {
                    CompiledOperand::Constant(Fr::from(i.unsigned_abs()))
                }
            };
            CompiledRule::Compare {
                left,
                operator: c.operator,
                right,
            }
        }
        Constraint::Age(a) => {
            let birth = [
                layout.require(&a.birth.year)?,
                layout.require(&a.birth.month)?,
                layout.require(&a.birth.day)?,
            ];
            let current = [
                layout.require(&a.current.year)?,
                layout.require(&a.current.month)?,
                layout.require(&a.current.day)?,
            ];
            CompiledRule::Age {
                birth,
                current,
                min_age: Fr::from(a.min_age.unsigned_abs()),
            }
        }
    };
    let label = constraint
        .error_message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}({})", constraint.kind(), constraint.fields().join(", ")));
    Ok(CompiledConstraint { label, rule })
}

/// A schema compiled into a circuit, plus one set of input values.
#[derive(Debug, Clone)]
pub struct DynamicCircuit {
    layout: Arc<CircuitLayout>,
    plan: Arc<Vec<CompiledConstraint>>,
    public_values: Vec<Option<Fr>>,
    secret_values: Vec<Option<Fr>>,
}

impl DynamicCircuit {
    /// Compile `schema`. All malformed-constraint failures surface here.
    pub fn new(schema: &SchemaDefinition) -> Result<Self, CompilationError> {
        let layout = CircuitLayout::from_schema(schema)?;
        let plan = schema
            .constraints()
            .iter()
            .map(|c| compile_constraint(&layout, c))
            .collect::<Result<Vec<_>, _>>()?;
        let public_values = vec![None; layout.public.len()];
        let secret_values = vec![None; layout.secret.len()];
        Ok(Self {
            layout: Arc::new(layout),
            plan: Arc::new(plan),
            public_values,
            secret_values,
        })
    }

    pub fn layout(&self) -> &CircuitLayout {
        &self.layout
    }

    pub fn plan(&self) -> &[CompiledConstraint] {
        &self.plan
    }

    pub fn fingerprint(&self) -> ContentDigest {
        self.layout.fingerprint
    }

    /// An unassigned instance sharing this circuit's layout and plan.
    pub fn blank(&self) -> Self {
        Self {
            layout: Arc::clone(&self.layout),
            plan: Arc::clone(&self.plan),
            public_values: vec![None; self.public_values.len()],
            secret_values: vec![None; self.secret_values.len()],
        }
    }

    /// Normalize and assign `values`. Either every slot is written or none
    /// is. Optional fields left out are assigned zero.
    pub fn assign_values(&mut self, values: &Map<String, Value>) -> Result<(), AssignmentError> {
        let mut public = vec![None; self.public_values.len()];
        let mut secret = vec![None; self.secret_values.len()];
        for (name, raw) in values {
            let slot = self
                .layout
                .slot(name)
                .ok_or_else(|| AssignmentError::UnknownField(name.clone()))?;
            let element = normalize(self.layout.field(slot), raw)?;
            match slot {
                Slot::Public(i) => public[i] = Some(element),
                Slot::Secret(i) => secret[i] = Some(element),
            }
        }
        for &slot in &self.layout.declared {
            let assigned = match slot {
                Slot::Public(i) => public[i].is_some(),
                Slot::Secret(i) => secret[i].is_some(),
            };
            let field = self.layout.field(slot);
            if !assigned && field.required {
                return Err(AssignmentError::MissingRequired(field.name.clone()));
            }
        }
        self.public_values = public.into_iter().map(|v| v.or(Some(Fr::zero()))).collect();
        self.secret_values = secret.into_iter().map(|v| v.or(Some(Fr::zero()))).collect();
        Ok(())
    }

    /// Whether every slot holds a value.
    pub fn is_assigned(&self) -> bool {
        self.public_values
            .iter()
            .chain(&self.secret_values)
            .all(Option::is_some)
    }

    /// Assigned public inputs in instance order, or `None` before assignment.
    pub fn public_inputs(&self) -> Option<Vec<Fr>> {
        self.public_values.iter().copied().collect()
    }

    /// Normalize only the public fields found in `values`, in instance
    /// order. Keys naming anything else are ignored.
    pub fn public_inputs_from(&self, values: &Map<String, Value>) -> Result<Vec<Fr>, AssignmentError> {
        self.layout
            .public
            .iter()
            .map(|field| match values.get(&field.name) {
                Some(raw) => Ok(normalize(field, raw)?),
                None if field.required => Err(AssignmentError::MissingRequired(field.name.clone())),
                None => Ok(Fr::zero()),
            })
            .collect()
    }

    /// Number of R1CS constraints, synthesized in setup mode.
    pub fn constraint_count(&self) -> Result<usize, SynthesisError> {
        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_mode(SynthesisMode::Setup);
        self.blank().generate_constraints(cs.clone())?;
        Ok(cs.num_constraints())
    }

    /// Synthesize with the assigned values and check every constraint.
    pub fn is_satisfied(&self) -> Result<bool, SynthesisError> {
        let cs = ConstraintSystem::<Fr>::new_ref();
        self.clone().generate_constraints(cs.clone())?;
        cs.is_satisfied()
    }

    /// Label of the first compiled constraint the assigned values violate.
    pub fn unsatisfied_constraint(&self) -> Result<Option<&str>, SynthesisError> {
        for constraint in self.plan.iter() {
            let cs = ConstraintSystem::<Fr>::new_ref();
            let vars = self.allocate(cs.clone())?;
            enforce(&vars, &constraint.rule)?;
            if !cs.is_satisfied()? {
                return Ok(Some(constraint.label.as_str()));
            }
        }
        Ok(None)
    }

    fn allocate(&self, cs: ConstraintSystemRef<Fr>) -> Result<Allocated, SynthesisError> {
        let public = self
            .public_values
            .iter()
            .map(|v| FpVar::<Fr>::new_input(cs.clone(), || v.ok_or(SynthesisError::AssignmentMissing)))
            .collect::<Result<Vec<_>, _>>()?;
        let secret = self
            .secret_values
            .iter()
            .map(|v| FpVar::<Fr>::new_witness(cs.clone(), || v.ok_or(SynthesisError::AssignmentMissing)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Allocated { public, secret })
    }
}

impl ConstraintSynthesizer<Fr> for DynamicCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let vars = self.allocate(cs)?;
        for constraint in self.plan.iter() {
            enforce(&vars, &constraint.rule)?;
        }
        Ok(())
    }
}

struct Allocated {
    public: Vec<FpVar<Fr>>,
    secret: Vec<FpVar<Fr>>,
}

impl Allocated {
    fn get(&self, slot: Slot) -> &FpVar<Fr> {
        match slot {
            Slot::Public(i) => &self.public[i],
            Slot::Secret(i) => &self.secret[i],
        }
    }
}

/// Bit width of the ordering domain.
pub const COMPARISON_BITS: usize = 128;

/// `v ∈ [0, 2^COMPARISON_BITS)`.
fn enforce_in_domain(v: &FpVar<Fr>) -> Result<(), SynthesisError> {
    match v {
        // Constant bits would make the remainder check a no-op.
        FpVar::Constant(c) if c.into_bigint().num_bits() as usize <= COMPARISON_BITS => Ok(()),
        FpVar::Constant(_) => Err(SynthesisError::Unsatisfiable),
        FpVar::Var(_) => v.to_bits_le_with_top_bits_zero(COMPARISON_BITS).map(|_| ()),
    }
}

/// `a ≤ b` for operands in the ordering domain.
fn enforce_le(a: &FpVar<Fr>, b: &FpVar<Fr>) -> Result<(), SynthesisError> {
    enforce_in_domain(&(b - a))
}

fn constant(value: u64) -> FpVar<Fr> {
    FpVar::Constant(Fr::from(value))
}

fn enforce(vars: &Allocated, rule: &CompiledRule) -> Result<(), SynthesisError> {
    match rule {
        CompiledRule::Range { slot, min, max } => {
            let v = vars.get(*slot);
            enforce_le(&FpVar::Constant(*min), v)?;
            enforce_le(v, &FpVar::Constant(*max))
        }
        CompiledRule::Compare {
            left,
            operator,
            right,
        } => {
            let a = vars.get(*left);
            let b = match right {
                CompiledOperand::Slot(s) => vars.get(*s).clone(),
                CompiledOperand::Constant(c) => FpVar::Constant(*c),
            };
            let one = FpVar::Constant(Fr::one());
            if !operator.is_equality() {
                enforce_in_domain(a)?;
                enforce_in_domain(&b)?;
            }
            match operator {
                ComparisonOperator::GreaterEqual => enforce_le(&b, a),
                ComparisonOperator::GreaterThan => enforce_le(&(&b + &one), a),
                ComparisonOperator::LessEqual => enforce_le(a, &b),
                ComparisonOperator::LessThan => enforce_le(&(a + &one), &b),
                ComparisonOperator::Equal => a.enforce_equal(&b),
                // A witness with a == b must leave the system unsatisfied, not fail synthesis.
                ComparisonOperator::NotEqual => a.is_neq(&b)?.enforce_equal(&Boolean::TRUE),
            }
        }
        CompiledRule::Age {
            birth,
            current,
            min_age,
        } => {
            let [birth_year, birth_month, birth_day] = birth.map(|s| vars.get(s));
            let [current_year, current_month, current_day] = current.map(|s| vars.get(s));
            let twelve = constant(12);
            let thirty_one = constant(31);

            enforce_in_domain(birth_year)?;
            let min_valid_year = current_year - &FpVar::Constant(*min_age);
            enforce_le(birth_year, &min_valid_year)?;

            // Born in the boundary year: the month may not pass the current month.
            let year_eq = birth_year.is_eq(&min_valid_year)?;
            let month_bound = FpVar::conditionally_select(&year_eq, current_month, &twelve)?;
            enforce_le(birth_month, &month_bound)?;

            // Boundary year and month: the day may not pass the current day.
            let month_eq = birth_month.is_eq(current_month)?;
            let day_in_month = FpVar::conditionally_select(&month_eq, current_day, &thirty_one)?;
            let day_bound = FpVar::conditionally_select(&year_eq, &day_in_month, &thirty_one)?;
            enforce_le(birth_day, &day_bound)?;

            enforce_le(&constant(1), birth_month)?;
            enforce_le(birth_month, &twelve)?;
            enforce_le(&constant(1), birth_day)?;
            enforce_le(birth_day, &thirty_one)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zkattest_schema::{age_over_18, parse_schema_value};

    fn values(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("object expected"),
        }
    }

    fn age_inputs(birth: (u32, u32, u32)) -> Map<String, Value> {
        values(json!({
            "birth_year": birth.0, "birth_month": birth.1, "birth_day": birth.2,
            "current_year": 2024, "current_month": 7, "current_day": 15,
            "aud": "https://rp.example", "nonce": "n-1"
        }))
    }

    fn satisfied(circuit: &DynamicCircuit, inputs: &Map<String, Value>) -> bool {
        let mut c = circuit.blank();
        c.assign_values(inputs).unwrap();
        c.is_satisfied().unwrap()
    }

    #[test]
    fn age_boundary_around_eighteenth_birthday() {
        let circuit = DynamicCircuit::new(&age_over_18().unwrap()).unwrap();
        assert!(satisfied(&circuit, &age_inputs((2006, 7, 15))));
        assert!(!satisfied(&circuit, &age_inputs((2006, 7, 16))));
        assert!(satisfied(&circuit, &age_inputs((2006, 6, 15))));
        assert!(!satisfied(&circuit, &age_inputs((2006, 8, 14))));
        assert!(satisfied(&circuit, &age_inputs((1990, 12, 31))));
        assert!(!satisfied(&circuit, &age_inputs((2007, 1, 1))));
    }

    #[test]
    fn age_sanity_bounds_on_month_and_day() {
        let circuit = DynamicCircuit::new(&age_over_18().unwrap()).unwrap();
        assert!(!satisfied(&circuit, &age_inputs((1990, 0, 10))));
        assert!(!satisfied(&circuit, &age_inputs((1990, 13, 10))));
        assert!(!satisfied(&circuit, &age_inputs((1990, 5, 0))));
        assert!(!satisfied(&circuit, &age_inputs((1990, 5, 32))));
    }

    #[test]
    fn unsatisfied_constraint_is_labelled() {
        let circuit = DynamicCircuit::new(&age_over_18().unwrap()).unwrap();
        let mut c = circuit.blank();
        c.assign_values(&age_inputs((2010, 1, 1))).unwrap();
        assert_eq!(
            c.unsatisfied_constraint().unwrap(),
            Some("holder must be at least 18 years old")
        );
        let mut ok = circuit.blank();
        ok.assign_values(&age_inputs((2000, 1, 1))).unwrap();
        assert_eq!(ok.unsatisfied_constraint().unwrap(), None);
    }

    fn comparison_circuit(op: &str) -> DynamicCircuit {
        let schema = parse_schema_value(&json!({
            "fields": [
                {"name": "a", "type": "integer", "required": true},
                {"name": "b", "type": "integer", "public": true, "required": true}
            ],
            "constraints": [{"type": "comparison", "fields": ["a", "b"], "operator": op}]
        }))
        .unwrap();
        DynamicCircuit::new(&schema).unwrap()
    }

    #[test]
    fn comparison_operators() {
        let cases = [
            ("ge", [(5, 5, true), (4, 5, false)]),
            ("gt", [(6, 5, true), (5, 5, false)]),
            ("le", [(5, 5, true), (6, 5, false)]),
            ("lt", [(4, 5, true), (5, 5, false)]),
            ("eq", [(5, 5, true), (4, 5, false)]),
            ("ne", [(4, 5, true), (5, 5, false)]),
        ];
        for (op, checks) in cases {
            let circuit = comparison_circuit(op);
            for (a, b, expected) in checks {
                let ok = satisfied(&circuit, &values(json!({"a": a, "b": b})));
                assert_eq!(ok, expected, "{a} {op} {b}");
            }
        }
    }

    fn day_of_month_circuit() -> DynamicCircuit {
        let schema = parse_schema_value(&json!({
            "fields": [{"name": "d", "type": "integer", "required": true}],
            "constraints": [{"type": "range_check", "fields": ["d"], "value": [1, 31]}]
        }))
        .unwrap();
        DynamicCircuit::new(&schema).unwrap()
    }

    #[test]
    fn range_check_boundaries() {
        let circuit = day_of_month_circuit();
        assert!(circuit.constraint_count().unwrap() > 0);
        for (d, expected) in [(0, false), (1, true), (15, true), (31, true), (32, false), (-1, false)] {
            assert_eq!(satisfied(&circuit, &values(json!({"d": d}))), expected, "d={d}");
        }
    }

    #[test]
    fn not_equal_with_equal_values_is_unsatisfied() {
        let circuit = comparison_circuit("ne");
        let mut c = circuit.blank();
        c.assign_values(&values(json!({"a": 9, "b": 9}))).unwrap();
        assert!(!c.is_satisfied().unwrap());
        assert_eq!(c.unsatisfied_constraint().unwrap(), Some("comparison(a, b)"));
    }

    #[test]
    fn ordering_covers_large_operands() {
        let circuit = comparison_circuit("gt");
        let big = u64::MAX;
        assert!(satisfied(&circuit, &values(json!({"a": big, "b": big - 1}))));
        assert!(!satisfied(&circuit, &values(json!({"a": big - 1, "b": big}))));
        let i128_max = i128::MAX.to_string();
        assert!(satisfied(&circuit, &values(json!({"a": i128_max, "b": 1}))));
    }

    #[test]
    fn negative_value_fails_ordering() {
        let circuit = comparison_circuit("le");
        assert!(!satisfied(&circuit, &values(json!({"a": -1, "b": 5}))));
    }

    #[test]
    fn string_equality_against_literal() {
        let schema = parse_schema_value(&json!({
            "fields": [{"name": "country", "type": "string", "required": true}],
            "constraints": [{"type": "comparison", "fields": ["country"], "operator": "eq", "value": "NL"}]
        }))
        .unwrap();
        let circuit = DynamicCircuit::new(&schema).unwrap();
        assert!(satisfied(&circuit, &values(json!({"country": "NL"}))));
        assert!(!satisfied(&circuit, &values(json!({"country": "BE"}))));
    }

    #[test]
    fn negative_bounds_and_literals_do_not_compile() {
        let range = parse_schema_value(&json!({
            "fields": [{"name": "t", "type": "integer"}],
            "constraints": [{"type": "range_check", "fields": ["t"], "value": [-10, 10]}]
        }))
        .unwrap();
        assert!(matches!(
            DynamicCircuit::new(&range),
            Err(CompilationError::NegativeBound { bound: -10, .. })
        ));

        let literal = parse_schema_value(&json!({
            "fields": [{"name": "t", "type": "integer"}],
            "constraints": [{"type": "comparison", "fields": ["t"], "operator": "gt", "value": -3}]
        }))
        .unwrap();
        assert!(matches!(
            DynamicCircuit::new(&literal),
            Err(CompilationError::NegativeLiteral { value: -3, .. })
        ));
    }

    #[test]
    fn assignment_is_atomic() {
        let circuit = DynamicCircuit::new(&age_over_18().unwrap()).unwrap();
        let mut c = circuit.blank();
        let mut bad = age_inputs((2000, 1, 1));
        bad.insert("birth_day".into(), json!("soon"));
        assert!(matches!(c.assign_values(&bad), Err(AssignmentError::Conversion(_))));
        assert!(!c.is_assigned());

        let mut unknown = age_inputs((2000, 1, 1));
        unknown.insert("shoe_size".into(), json!(44));
        assert_eq!(
            c.assign_values(&unknown),
            Err(AssignmentError::UnknownField("shoe_size".into()))
        );

        let mut missing = age_inputs((2000, 1, 1));
        missing.remove("nonce");
        assert_eq!(
            c.assign_values(&missing),
            Err(AssignmentError::MissingRequired("nonce".into()))
        );
        assert!(c.public_inputs().is_none());
    }

    #[test]
    fn optional_fields_default_to_zero() {
        let schema = parse_schema_value(&json!({
            "fields": [{"name": "x", "type": "integer", "public": true}]
        }))
        .unwrap();
        let mut c = DynamicCircuit::new(&schema).unwrap();
        c.assign_values(&Map::new()).unwrap();
        assert_eq!(c.public_inputs(), Some(vec![Fr::zero()]));
    }

    #[test]
    fn public_inputs_follow_declaration_order() {
        let circuit = DynamicCircuit::new(&age_over_18().unwrap()).unwrap();
        let mut c = circuit.blank();
        let inputs = age_inputs((2000, 1, 1));
        c.assign_values(&inputs).unwrap();
        let public = c.public_inputs().unwrap();
        assert_eq!(public.len(), 5);
        assert_eq!(public[0], Fr::from(2024u64));
        assert_eq!(public[3], hash_string("https://rp.example"));
        assert_eq!(circuit.public_inputs_from(&inputs).unwrap(), public);
    }

    #[test]
    fn constraint_count_is_positive_and_stable() {
        let circuit = DynamicCircuit::new(&age_over_18().unwrap()).unwrap();
        let n = circuit.constraint_count().unwrap();
        assert!(n > 0);
        assert_eq!(circuit.blank().constraint_count().unwrap(), n);
    }

    #[test]
    fn fingerprint_depends_on_layout_only() {
        let a = parse_schema_value(&json!({"fields": [{"name": "x", "type": "integer"}]})).unwrap();
        let b = parse_schema_value(&json!({
            "fields": [{"name": "x", "type": "integer"}],
            "constraints": [{"type": "range_check", "fields": ["x"], "value": [0, 9]}]
        }))
        .unwrap();
        let c = parse_schema_value(&json!({"fields": [{"name": "x", "type": "integer", "public": true}]})).unwrap();
        let fa = DynamicCircuit::new(&a).unwrap().fingerprint();
        assert_eq!(fa, DynamicCircuit::new(&b).unwrap().fingerprint());
        assert_ne!(fa, DynamicCircuit::new(&c).unwrap().fingerprint());
    }
}
