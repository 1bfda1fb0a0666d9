//! Scalar values and datatype enforcement
//!
//! Every variable holds exactly one [`Datatype`], fixed at construction. A
//! [`TypedValue`] refuses any write whose runtime type disagrees with it, so a
//! stored value can never silently change kind.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Raised when a candidate value has the wrong datatype
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Type mismatch: expected <{expected}> but got <{found}>")]
pub struct TypeMismatch {
    pub expected: Datatype,
    pub found: Datatype,
}

/// The scalar datatypes a variable can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Datatype {
    Float,
    Integer,
    Boolean,
    String,
}

impl Datatype {
    /// Whether values of this datatype are ordered numbers
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Float | Self::Integer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::String => "string",
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scalar value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl Value {
    /// Get the datatype of the value
    pub fn datatype(&self) -> Datatype {
        match self {
            Self::Float(_) => Datatype::Float,
            Self::Integer(_) => Datatype::Integer,
            Self::Boolean(_) => Datatype::Boolean,
            Self::String(_) => Datatype::String,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Compare two values, allowing floats to differ by less than `tolerance`.
    ///
    /// Values of different datatypes are never equal. Integers, booleans and
    /// strings compare exactly.
    pub fn approx_eq(&self, other: &Value, tolerance: f64) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => (a - b).abs() < tolerance,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::String(v) => f.write_str(v),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// A value slot bound to one datatype.
///
/// The slot starts empty and only accepts values of its own datatype.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    datatype: Datatype,
    value: Option<Value>,
}

impl TypedValue {
    /// Create an empty slot for the given datatype
    pub fn new(datatype: Datatype) -> Self {
        Self {
            datatype,
            value: None,
        }
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    /// Get the current value, or `None` if nothing was assigned yet
    pub fn get(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Check that `candidate` has the slot's datatype
    pub fn check(&self, candidate: &Value) -> Result<(), TypeMismatch> {
        if candidate.datatype() != self.datatype {
            return Err(TypeMismatch {
                expected: self.datatype,
                found: candidate.datatype(),
            });
        }
        Ok(())
    }

    /// Store `candidate`, failing without mutation if its datatype differs
    pub fn set(&mut self, candidate: Value) -> Result<(), TypeMismatch> {
        self.check(&candidate)?;
        self.value = Some(candidate);
        Ok(())
    }
}
