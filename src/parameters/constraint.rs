//! Admissible-value constraints
//!
//! A variable is either constrained by a quantized [`Range`], by an enumerated
//! [`ValueSet`], or not constrained at all (booleans). Capability negotiation
//! between two variables reduces to [`intersect`], a pure function over two
//! constraints that can be exercised without any parameter wiring.

use crate::config::DEFAULT_TOLERANCE;
use crate::parameters::bounds::Bounds;
use crate::parameters::value::{Datatype, Value};
use std::fmt;
use thiserror::Error;

/// Errors raised while building a variable's constraint
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("A range and a set cannot be used at the same time")]
    RangeAndSet,

    #[error("A range is not compatible with datatype <string>, expected a numerical datatype")]
    RangeOnString,

    #[error("Datatype <boolean> does not accept a range or a set")]
    ConstraintOnBoolean,

    #[error("Datatype <{datatype}> requires either a range or a set")]
    MissingConstraint { datatype: Datatype },

    #[error("A set needs at least one value")]
    EmptySet,

    #[error("Set values have mixed datatypes: <{first}> and <{other}>")]
    HeterogeneousSet { first: Datatype, other: Datatype },

    #[error("Invalid bounds: min ({min}) must not be greater than max ({max})")]
    InvalidBounds { min: Value, max: Value },

    #[error("Invalid step {step}: expected a finite value greater than zero")]
    InvalidStep { step: Value },

    #[error("Mismatch of types, expected <{expected}> but got <{found}>")]
    BoundTypeMismatch { expected: Datatype, found: Datatype },
}

/// A quantized numerical range
#[derive(Debug, Clone, PartialEq)]
pub enum Range {
    Float(Bounds<f64>),
    Integer(Bounds<i64>),
}

impl Range {
    /// Create a float range; the default is `min`
    ///
    /// # Examples
    ///
    /// ```
    /// use libdsp_rs::parameters::{Range, Value};
    ///
    /// let range = Range::float(0.0, 0.1, 1.0).unwrap();
    /// assert_eq!(range.apply(&Value::Float(-3.0)), Some(Value::Float(0.0)));
    /// assert_eq!(range.apply(&Value::Float(1.4)), Some(Value::Float(1.0)));
    /// ```
    pub fn float(min: f64, step: f64, max: f64) -> Result<Self, ConstructionError> {
        Ok(Self::Float(Bounds::new(min, step, max, None)?))
    }

    /// Create a float range with an explicit default
    pub fn float_with_default(
        min: f64,
        step: f64,
        max: f64,
        default: f64,
    ) -> Result<Self, ConstructionError> {
        Ok(Self::Float(Bounds::new(min, step, max, Some(default))?))
    }

    /// Create an integer range; the default is `min`
    pub fn integer(min: i64, step: i64, max: i64) -> Result<Self, ConstructionError> {
        Ok(Self::Integer(Bounds::new(min, step, max, None)?))
    }

    /// Create an integer range with an explicit default
    pub fn integer_with_default(
        min: i64,
        step: i64,
        max: i64,
        default: i64,
    ) -> Result<Self, ConstructionError> {
        Ok(Self::Integer(Bounds::new(min, step, max, Some(default))?))
    }

    /// Create a range of `datatype` from untyped bounds.
    ///
    /// Every bound must carry `datatype`, which must be numerical.
    pub fn from_values(
        datatype: Datatype,
        min: Value,
        step: Value,
        max: Value,
        default: Option<Value>,
    ) -> Result<Self, ConstructionError> {
        let mismatch = |v: &Value| ConstructionError::BoundTypeMismatch {
            expected: datatype,
            found: v.datatype(),
        };

        match datatype {
            Datatype::Float => {
                let cast = |v: &Value| v.as_f64().ok_or_else(|| mismatch(v));
                let default = default.as_ref().map(cast).transpose()?;
                Ok(Self::Float(Bounds::new(cast(&min)?, cast(&step)?, cast(&max)?, default)?))
            }
            Datatype::Integer => {
                let cast = |v: &Value| v.as_i64().ok_or_else(|| mismatch(v));
                let default = default.as_ref().map(cast).transpose()?;
                Ok(Self::Integer(Bounds::new(cast(&min)?, cast(&step)?, cast(&max)?, default)?))
            }
            Datatype::String => Err(ConstructionError::RangeOnString),
            Datatype::Boolean => Err(ConstructionError::ConstraintOnBoolean),
        }
    }

    pub fn datatype(&self) -> Datatype {
        match self {
            Self::Float(_) => Datatype::Float,
            Self::Integer(_) => Datatype::Integer,
        }
    }

    pub fn min(&self) -> Value {
        match self {
            Self::Float(b) => Value::Float(b.min),
            Self::Integer(b) => Value::Integer(b.min),
        }
    }

    pub fn step(&self) -> Value {
        match self {
            Self::Float(b) => Value::Float(b.step),
            Self::Integer(b) => Value::Integer(b.step),
        }
    }

    pub fn max(&self) -> Value {
        match self {
            Self::Float(b) => Value::Float(b.max),
            Self::Integer(b) => Value::Integer(b.max),
        }
    }

    pub fn default_value(&self) -> Value {
        match self {
            Self::Float(b) => Value::Float(b.default),
            Self::Integer(b) => Value::Integer(b.default),
        }
    }

    /// Quantize and clamp a candidate.
    ///
    /// Returns `None` for a candidate of another datatype or a NaN float.
    pub fn apply(&self, candidate: &Value) -> Option<Value> {
        match (self, candidate) {
            (Self::Float(_), Value::Float(v)) if v.is_nan() => None,
            (Self::Float(b), Value::Float(v)) => Some(Value::Float(b.apply(*v))),
            (Self::Integer(b), Value::Integer(v)) => Some(Value::Integer(b.apply(*v))),
            _ => None,
        }
    }

    /// Whether `value` is already an admissible point of the range
    pub fn admits(&self, value: &Value, tolerance: f64) -> bool {
        self.apply(value)
            .is_some_and(|applied| applied.approx_eq(value, tolerance))
    }

    /// Overlap with another range of the same datatype and grid
    pub fn intersect(&self, other: &Range, tolerance: f64) -> Option<Range> {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.intersect(b, tolerance).map(Self::Float),
            (Self::Integer(a), Self::Integer(b)) => a.intersect(b, tolerance).map(Self::Integer),
            _ => None,
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(b) => write!(f, "[{:.4} : {:.4} : {:.4}]", b.min, b.step, b.max),
            Self::Integer(b) => write!(f, "[{} : {} : {}]", b.min, b.step, b.max),
        }
    }
}

/// A non-empty, ordered set of admissible values sharing one datatype
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSet {
    datatype: Datatype,
    values: Vec<Value>,
    tolerance: f64,
}

impl ValueSet {
    /// Create a set from its values; the datatype is taken from the first one.
    ///
    /// # Examples
    ///
    /// ```
    /// use libdsp_rs::parameters::{ValueSet, Value};
    ///
    /// let set = ValueSet::new(vec![1.into(), 2.into(), 5.into()]).unwrap();
    /// assert_eq!(set.default_value(), &Value::Integer(1));
    /// assert!(ValueSet::new(vec![]).is_err());
    /// ```
    pub fn new(values: Vec<Value>) -> Result<Self, ConstructionError> {
        let first = values.first().ok_or(ConstructionError::EmptySet)?.datatype();
        if first == Datatype::Boolean {
            return Err(ConstructionError::ConstraintOnBoolean);
        }
        if let Some(other) = values.iter().map(Value::datatype).find(|dt| *dt != first) {
            return Err(ConstructionError::HeterogeneousSet { first, other });
        }

        Ok(Self {
            datatype: first,
            values,
            tolerance: DEFAULT_TOLERANCE,
        })
    }

    /// Create a set whose values must all carry `datatype`
    pub fn for_datatype(datatype: Datatype, values: Vec<Value>) -> Result<Self, ConstructionError> {
        if datatype == Datatype::Boolean {
            return Err(ConstructionError::ConstraintOnBoolean);
        }
        let set = Self::new(values)?;
        if set.datatype != datatype {
            return Err(ConstructionError::BoundTypeMismatch {
                expected: datatype,
                found: set.datatype,
            });
        }
        Ok(set)
    }

    /// Set the tolerance used for numerical membership
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`: a set holds at least one value
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// The first value of the set
    pub fn default_value(&self) -> &Value {
        &self.values[0]
    }

    /// Find the member matching `candidate`.
    ///
    /// Numbers match within the set's tolerance; strings match exactly.
    pub fn find(&self, candidate: &Value) -> Option<&Value> {
        self.values
            .iter()
            .find(|member| member.approx_eq(candidate, self.tolerance))
    }

    pub fn contains(&self, candidate: &Value) -> bool {
        self.find(candidate).is_some()
    }

    /// Map a candidate onto its matching member, or reject it
    pub fn apply(&self, candidate: &Value) -> Option<Value> {
        self.find(candidate).cloned()
    }

    /// Keep the members of `self` (in order) that `keep` accepts
    fn filter(&self, keep: impl Fn(&Value) -> bool) -> Option<ValueSet> {
        let values: Vec<Value> = self.values.iter().filter(|v| keep(v)).cloned().collect();
        if values.is_empty() {
            return None;
        }
        Some(Self {
            datatype: self.datatype,
            values,
            tolerance: self.tolerance,
        })
    }

    /// Members of `self` also present in `other`, in the order of `self`
    pub fn intersect(&self, other: &ValueSet) -> Option<ValueSet> {
        if self.datatype != other.datatype {
            return None;
        }
        self.filter(|v| other.contains(v))
    }

    /// Members of `self` that are already admissible points of `range`
    pub fn restrict_to(&self, range: &Range, tolerance: f64) -> Option<ValueSet> {
        if self.datatype != range.datatype() {
            return None;
        }
        self.filter(|v| range.admits(v, tolerance))
    }
}

impl fmt::Display for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        write!(f, "[{}]", values.join(" "))
    }
}

/// The admissible domain of a variable
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Any value of the datatype is accepted (booleans only)
    Unconstrained,

    Range(Range),

    Set(ValueSet),
}

impl Constraint {
    /// Datatype required by the constraint, if any
    pub fn datatype(&self) -> Option<Datatype> {
        match self {
            Self::Unconstrained => None,
            Self::Range(range) => Some(range.datatype()),
            Self::Set(set) => Some(set.datatype()),
        }
    }

    /// Default value of the constraint, `None` when unconstrained
    pub fn default_value(&self) -> Option<Value> {
        match self {
            Self::Unconstrained => None,
            Self::Range(range) => Some(range.default_value()),
            Self::Set(set) => Some(set.default_value().clone()),
        }
    }

    /// Filter a candidate: ranges quantize and clamp, sets map onto a member
    /// or reject. `None` means the candidate must be dropped.
    pub fn apply(&self, candidate: &Value) -> Option<Value> {
        match self {
            Self::Unconstrained => Some(candidate.clone()),
            Self::Range(range) => range.apply(candidate),
            Self::Set(set) => set.apply(candidate),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        matches!(self, Self::Unconstrained)
    }

    pub fn as_range(&self) -> Option<&Range> {
        match self {
            Self::Range(range) => Some(range),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&ValueSet> {
        match self {
            Self::Set(set) => Some(set),
            _ => None,
        }
    }
}

impl From<Range> for Constraint {
    fn from(range: Range) -> Self {
        Self::Range(range)
    }
}

impl From<ValueSet> for Constraint {
    fn from(set: ValueSet) -> Self {
        Self::Set(set)
    }
}

/// Intersect two constraints with the default tolerance.
///
/// See [`intersect_with_tolerance`].
pub fn intersect(a: &Constraint, b: &Constraint) -> Option<Constraint> {
    intersect_with_tolerance(a, b, DEFAULT_TOLERANCE)
}

/// Derive the domain admissible under both `a` and `b`, or `None` if empty.
///
/// - range and range: overlap of two ranges sharing step and grid
/// - range and set: set members that the range leaves unchanged, in set order
/// - set and set: members of `a` found in `b`, in the order of `a`
/// - unconstrained and anything: the other constraint
///
/// # Examples
///
/// ```
/// use libdsp_rs::parameters::{intersect, Constraint, ValueSet, Value};
///
/// let a = Constraint::Set(ValueSet::new(vec![1.into(), 2.into(), 5.into()]).unwrap());
/// let b = Constraint::Set(ValueSet::new(vec![0.into(), 1.into(), 2.into()]).unwrap());
/// let both = intersect(&a, &b).unwrap();
/// assert_eq!(both.as_set().unwrap().values(), &[Value::Integer(1), Value::Integer(2)]);
/// ```
pub fn intersect_with_tolerance(
    a: &Constraint,
    b: &Constraint,
    tolerance: f64,
) -> Option<Constraint> {
    match (a, b) {
        (Constraint::Unconstrained, other) | (other, Constraint::Unconstrained) => {
            Some(other.clone())
        }
        (Constraint::Range(ra), Constraint::Range(rb)) => {
            ra.intersect(rb, tolerance).map(Constraint::Range)
        }
        (Constraint::Range(range), Constraint::Set(set))
        | (Constraint::Set(set), Constraint::Range(range)) => {
            set.restrict_to(range, tolerance).map(Constraint::Set)
        }
        (Constraint::Set(sa), Constraint::Set(sb)) => sa.intersect(sb).map(Constraint::Set),
    }
}
