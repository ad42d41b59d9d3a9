//! Value - polymorphic member value type
//!
//! A member's value can hold plain primitives, references to other
//! objects, and two container kinds:
//! - `Set`: unordered unique values
//! - `OrderedSet`: insertion-ordered unique values
//!
//! ## Operators
//!
//! Each value kind admits a fixed set of operators depending on the type
//! of the member it is applied to; see [`Value::allowed_operations`].
//! [`Value::apply`] folds one `(operator, value)` step onto an
//! accumulated value and returns the new value.
//!
//! ## Equality and hashing
//!
//! Floats compare and hash by normalized bit pattern (`0.0 == -0.0`,
//! `NaN == NaN`), so values are usable as set elements. `Set` equality
//! ignores order; `OrderedSet` equality requires identical order.
//! Container values are not usable as keys: [`Value::key_hash`] errors
//! for them.

use crate::error::{Error, Result};
use crate::fqon::Fqon;
use crate::op::Operator;
use crate::types::DataType;
use hashbrown::HashSet;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

const NUMERIC_OPS: &[Operator] = &[
    Operator::Assign,
    Operator::AddAssign,
    Operator::SubtractAssign,
    Operator::MultiplyAssign,
    Operator::DivideAssign,
];
const TEXT_OPS: &[Operator] = &[Operator::Assign, Operator::AddAssign];
const BOOL_OPS: &[Operator] = &[
    Operator::Assign,
    Operator::IntersectAssign,
    Operator::UnionAssign,
];
const ASSIGN_ONLY: &[Operator] = &[Operator::Assign];
const SET_OPS: &[Operator] = &[
    Operator::Assign,
    Operator::AddAssign,
    Operator::SubtractAssign,
    Operator::UnionAssign,
    Operator::IntersectAssign,
];
const ORDERED_SET_OPS: &[Operator] = &[
    Operator::Assign,
    Operator::AddAssign,
    Operator::SubtractAssign,
    Operator::IntersectAssign,
];
const ORDERED_ON_SET_OPS: &[Operator] = &[Operator::SubtractAssign, Operator::IntersectAssign];
const NO_OPS: &[Operator] = &[];

/// Polymorphic member value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// Text
    Text(Arc<str>),
    /// Boolean
    Bool(bool),
    /// File path (relative to the declaring namespace's file)
    File(Arc<str>),
    /// Reference to another object
    ObjectRef(Fqon),
    /// Unordered unique values
    Set(HashSet<Value>),
    /// Insertion-ordered unique values
    OrderedSet(IndexSet<Value>),
}

/// Normalized bits for float equality/hashing: all zeros collapse,
/// all NaNs collapse.
fn float_key(f: f64) -> u64 {
    if f == 0.0 {
        0
    } else if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_key(*a) == float_key(*b),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::File(a), Value::File(b)) => a == b,
            (Value::ObjectRef(a), Value::ObjectRef(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::OrderedSet(a), Value::OrderedSet(b)) => {
                // IndexSet equality ignores order; ordered sets must not.
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int(v) => v.hash(state),
            Value::Float(v) => float_key(*v).hash(state),
            Value::Text(v) => v.hash(state),
            Value::Bool(v) => v.hash(state),
            Value::File(v) => v.hash(state),
            Value::ObjectRef(v) => v.hash(state),
            // Order-independent combination, consistent with set equality.
            Value::Set(values) => {
                let mut acc: u64 = 0;
                for value in values {
                    acc ^= single_hash(value);
                }
                acc.hash(state);
            }
            Value::OrderedSet(values) => {
                for value in values {
                    value.hash(state);
                }
            }
        }
    }
}

fn single_hash(value: &Value) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl Value {
    /// Build an empty container of the given kind's neutral element, or
    /// the numeric/text zero. `None` for kinds without a neutral
    /// (bool, file, object references).
    pub fn neutral_of(data_type: &DataType) -> Option<Value> {
        match data_type {
            DataType::Int => Some(Value::Int(0)),
            DataType::Float => Some(Value::Float(0.0)),
            DataType::Text => Some(Value::Text(Arc::from(""))),
            DataType::Set(_) => Some(Value::Set(HashSet::new())),
            DataType::OrderedSet(_) => Some(Value::OrderedSet(IndexSet::new())),
            DataType::Bool | DataType::File | DataType::Object(_) => None,
        }
    }

    /// Human-readable kind name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bool(_) => "bool",
            Value::File(_) => "file",
            Value::ObjectRef(_) => "object",
            Value::Set(_) => "set",
            Value::OrderedSet(_) => "orderedset",
        }
    }

    /// The operators this value supports as the right-hand side of a
    /// member of the given type.
    pub fn allowed_operations(&self, with_type: &DataType) -> &'static [Operator] {
        match (self, with_type) {
            (Value::Int(_), DataType::Int) => NUMERIC_OPS,
            (Value::Float(_), DataType::Float) => NUMERIC_OPS,
            (Value::Text(_), DataType::Text) => TEXT_OPS,
            (Value::Bool(_), DataType::Bool) => BOOL_OPS,
            (Value::File(_), DataType::File) => ASSIGN_ONLY,
            (Value::ObjectRef(_), DataType::Object(_)) => ASSIGN_ONLY,
            (Value::Set(_), DataType::Set(_)) => SET_OPS,
            (Value::OrderedSet(_), DataType::OrderedSet(_)) => ORDERED_SET_OPS,
            (Value::OrderedSet(_), DataType::Set(_)) => ORDERED_ON_SET_OPS,
            _ => NO_OPS,
        }
    }

    /// Apply `(op, other)` to this value, producing the new value.
    ///
    /// Kind mismatches and undefined operations are errors; callers are
    /// expected to have checked [`Value::allowed_operations`] against the
    /// member type already, so any error here beyond division by zero is
    /// a consistency failure in the stored state.
    pub fn apply(&self, op: Operator, other: &Value) -> Result<Value> {
        if op == Operator::Assign {
            return Ok(other.clone());
        }

        match self {
            Value::Int(lhs) => {
                let rhs = other
                    .as_int()
                    .ok_or_else(|| mismatch(self, op, other))?;
                let result = match op {
                    Operator::AddAssign => lhs.checked_add(rhs),
                    Operator::SubtractAssign => lhs.checked_sub(rhs),
                    Operator::MultiplyAssign => lhs.checked_mul(rhs),
                    Operator::DivideAssign => {
                        if rhs == 0 {
                            return Err(Error::value("integer division by zero"));
                        }
                        lhs.checked_div(rhs)
                    }
                    _ => return Err(mismatch(self, op, other)),
                };
                result
                    .map(Value::Int)
                    .ok_or_else(|| Error::value("integer overflow"))
            }

            Value::Float(lhs) => {
                let rhs = match other {
                    Value::Float(v) => *v,
                    _ => return Err(mismatch(self, op, other)),
                };
                let result = match op {
                    Operator::AddAssign => lhs + rhs,
                    Operator::SubtractAssign => lhs - rhs,
                    Operator::MultiplyAssign => lhs * rhs,
                    Operator::DivideAssign => {
                        if rhs == 0.0 {
                            return Err(Error::value("float division by zero"));
                        }
                        lhs / rhs
                    }
                    _ => return Err(mismatch(self, op, other)),
                };
                Ok(Value::Float(result))
            }

            Value::Text(lhs) => match (op, other) {
                (Operator::AddAssign, Value::Text(rhs)) => {
                    Ok(Value::Text(Arc::from(format!("{lhs}{rhs}"))))
                }
                _ => Err(mismatch(self, op, other)),
            },

            Value::Bool(lhs) => match (op, other) {
                (Operator::IntersectAssign, Value::Bool(rhs)) => Ok(Value::Bool(*lhs && *rhs)),
                (Operator::UnionAssign, Value::Bool(rhs)) => Ok(Value::Bool(*lhs || *rhs)),
                _ => Err(mismatch(self, op, other)),
            },

            Value::Set(lhs) => {
                let mut values = lhs.clone();
                match op {
                    Operator::AddAssign | Operator::UnionAssign => {
                        for value in other.elements()? {
                            values.insert(value.clone());
                        }
                    }
                    Operator::SubtractAssign => {
                        for value in other.elements()? {
                            values.remove(value);
                        }
                    }
                    Operator::IntersectAssign => {
                        values.retain(|value| other.contains_element(value));
                    }
                    _ => return Err(mismatch(self, op, other)),
                }
                Ok(Value::Set(values))
            }

            Value::OrderedSet(lhs) => {
                let mut values = lhs.clone();
                match op {
                    Operator::AddAssign => {
                        // Left order first, new right-hand elements appended
                        // in their source order.
                        for value in other.elements()? {
                            values.insert(value.clone());
                        }
                    }
                    Operator::SubtractAssign => {
                        for value in other.elements()? {
                            values.shift_remove(value);
                        }
                    }
                    Operator::IntersectAssign => {
                        // Keeps left order.
                        values.retain(|value| other.contains_element(value));
                    }
                    _ => return Err(mismatch(self, op, other)),
                }
                Ok(Value::OrderedSet(values))
            }

            Value::File(_) | Value::ObjectRef(_) => Err(mismatch(self, op, other)),
        }
    }

    /// Hash usable as a consumer-side map key.
    ///
    /// Container values are not hashable as keys.
    pub fn key_hash(&self) -> Result<u64> {
        match self {
            Value::Set(_) | Value::OrderedSet(_) => Err(Error::value(format!(
                "{} values are not hashable",
                self.kind()
            ))),
            _ => Ok(single_hash(self)),
        }
    }

    /// Iterate over container elements; errors for non-containers.
    fn elements(&self) -> Result<Box<dyn Iterator<Item = &Value> + '_>> {
        match self {
            Value::Set(values) => Ok(Box::new(values.iter())),
            Value::OrderedSet(values) => Ok(Box::new(values.iter())),
            _ => Err(Error::value(format!(
                "expected a container value, got {}",
                self.kind()
            ))),
        }
    }

    /// Container membership test; false for non-containers.
    fn contains_element(&self, value: &Value) -> bool {
        match self {
            Value::Set(values) => values.contains(value),
            Value::OrderedSet(values) => values.contains(value),
            _ => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&str> {
        match self {
            Value::File(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object_ref(&self) -> Option<&Fqon> {
        match self {
            Value::ObjectRef(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&HashSet<Value>> {
        match self {
            Value::Set(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ordered_set(&self) -> Option<&IndexSet<Value>> {
        match self {
            Value::OrderedSet(v) => Some(v),
            _ => None,
        }
    }
}

fn mismatch(lhs: &Value, op: Operator, rhs: &Value) -> Error {
    Error::value(format!(
        "operation '{} {} {}' is not defined",
        lhs.kind(),
        op,
        rhs.kind()
    ))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Text(v) => write!(f, "\"{}\"", v.escape_default()),
            Value::Bool(v) => f.write_str(if *v { "True" } else { "False" }),
            Value::File(v) => write!(f, "\"{}\"", v.escape_default()),
            Value::ObjectRef(v) => write!(f, "{v}"),
            Value::Set(values) => {
                f.write_str("{")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("}")
            }
            Value::OrderedSet(values) => {
                f.write_str("<")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str(">")
            }
        }
    }
}
