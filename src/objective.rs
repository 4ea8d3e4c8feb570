//! Optimization criteria and Pareto dominance.
//!
//! An [`Objective`] names a criterion and the direction in which it is
//! optimized. [`Objectives`] collects the [`Value`] an evaluator produced for
//! each objective and answers dominance queries. All comparisons are
//! *sign-normalized*: a smaller normalized value is always better, so a
//! maximized objective compares with its raw ordering reversed.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Optimization direction of an [`Objective`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    Min,
    Max,
}

/// A named optimization criterion. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Objective {
    name: String,
    sign: Sign,
}

impl Objective {
    pub fn new(name: impl Into<String>, sign: Sign) -> Self {
        Self {
            name: name.into(),
            sign,
        }
    }

    pub fn minimize(name: impl Into<String>) -> Self {
        Self::new(name, Sign::Min)
    }

    pub fn maximize(name: impl Into<String>) -> Self {
        Self::new(name, Sign::Max)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    /// Compares two values of this objective so that `Less` means `a` is
    /// better than `b`.
    ///
    /// Raw payloads are compared first and the result is reversed for
    /// [`Sign::Max`]. [`Value::Infeasible`] is worse than every feasible value
    /// regardless of sign and equal to another infeasible value. A `NaN`
    /// double counts as infeasible. `-0.0` and `0.0` are equal.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        match (a.is_infeasible(), b.is_infeasible()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let raw = a.raw_cmp(b);
                match self.sign {
                    Sign::Min => raw,
                    Sign::Max => raw.reverse(),
                }
            }
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.sign {
            Sign::Min => "MIN",
            Sign::Max => "MAX",
        };
        write!(f, "{}({})", self.name, sign)
    }
}

/// The value an evaluator assigned to one objective.
///
/// The `From` conversions map `NaN` floats to [`Value::Infeasible`], as they
/// do `None`. A `NaN` built directly as [`Value::Double`] is still treated as
/// infeasible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Double(f64),
    Integer(i64),
    Infeasible,
}

impl Value {
    pub fn is_infeasible(&self) -> bool {
        match *self {
            Value::Double(v) => v.is_nan(),
            Value::Integer(_) => false,
            Value::Infeasible => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Double(v) if v.is_nan() => None,
            Value::Double(v) => Some(v),
            Value::Integer(v) => Some(v as f64),
            Value::Infeasible => None,
        }
    }

    /// Numeric order of two feasible payloads.
    fn raw_cmp(&self, other: &Value) -> Ordering {
        match (*self, *other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(&b),
            _ => {
                let a = self.as_f64().unwrap_or(f64::INFINITY);
                let b = other.as_f64().unwrap_or(f64::INFINITY);
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Double(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Infeasible => f.write_str("INFEASIBLE"),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        if v.is_nan() {
            Value::Infeasible
        } else {
            Value::Double(v)
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::from(v as f64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Infeasible, Into::into)
    }
}

/// Objective vector of one evaluated individual.
///
/// Keys are unique; iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Objectives {
    entries: Vec<(Objective, Value)>,
}

impl Objectives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the value stored for `objective`.
    pub fn add(&mut self, objective: Objective, value: impl Into<Value>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(o, _)| *o == objective) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((objective, value)),
        }
    }

    /// Builder-style [`Objectives::add`].
    pub fn with(mut self, objective: Objective, value: impl Into<Value>) -> Self {
        self.add(objective, value);
        self
    }

    pub fn add_infeasible(&mut self, objective: Objective) {
        self.add(objective, Value::Infeasible);
    }

    pub fn get(&self, objective: &Objective) -> Result<Value> {
        self.lookup(objective)
            .ok_or_else(|| Error::NotFound(objective.to_string()))
    }

    fn lookup(&self, objective: &Objective) -> Option<Value> {
        self.entries
            .iter()
            .find(|(o, _)| o == objective)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Objective, &Value)> {
        self.entries.iter().map(|(o, v)| (o, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Objective> {
        self.entries.iter().map(|(o, _)| o)
    }

    /// True if both vectors carry exactly the same objectives, in any order.
    pub fn same_keys(&self, other: &Objectives) -> bool {
        self.len() == other.len() && self.keys().all(|o| other.lookup(o).is_some())
    }

    /// True if `self` is no worse than `other` in every objective.
    ///
    /// Both vectors must carry the same objectives. An infeasible value only
    /// weakly dominates another infeasible value, so two fully infeasible
    /// vectors weakly dominate each other.
    pub fn weakly_dominates(&self, other: &Objectives) -> bool {
        debug_assert!(
            self.same_keys(other),
            "dominance check between different objective sets"
        );
        for (objective, mine) in &self.entries {
            let Some(theirs) = other.lookup(objective) else {
                return false;
            };
            if objective.compare(&theirs, mine) == Ordering::Less {
                return false;
            }
        }
        true
    }

    /// Strict Pareto dominance: weakly dominates and is not equal.
    pub fn dominates(&self, other: &Objectives) -> bool {
        self.weakly_dominates(other) && !other.weakly_dominates(self)
    }

    /// Sign-normalized values in insertion order: maximized objectives are
    /// negated and infeasible values become `+inf`, so smaller is better in
    /// every dimension.
    pub fn normalized(&self) -> Vec<f64> {
        self.entries
            .iter()
            .map(|(o, v)| match v.as_f64() {
                None => f64::INFINITY,
                Some(x) => match o.sign() {
                    Sign::Min => x,
                    Sign::Max => -x,
                },
            })
            .collect()
    }
}

impl FromIterator<(Objective, Value)> for Objectives {
    fn from_iter<I: IntoIterator<Item = (Objective, Value)>>(iter: I) -> Self {
        let mut objectives = Objectives::new();
        for (o, v) in iter {
            objectives.add(o, v);
        }
        objectives
    }
}

impl fmt::Display for Objectives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (o, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", o.name(), v)?;
        }
        f.write_str("]")
    }
}
