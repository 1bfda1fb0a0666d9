//! Constrained, typed variables
//!
//! A [`Variable`] pairs a [`TypedValue`] with its [`Constraint`] and a mutability
//! [`Status`]. Every write goes through [`Variable::set`], which checks the
//! datatype and then clamps, quantizes or filters the candidate.

use crate::parameters::constraint::{ConstructionError, Constraint, Range, ValueSet};
use crate::parameters::value::{Datatype, TypeMismatch, TypedValue, Value};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors that can occur when working with variables
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VariableError {
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),

    #[error("Construction error: {0}")]
    Construction(#[from] ConstructionError),
}

/// Mutability of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The value can be changed using the setter
    #[default]
    Dynamic,

    /// The value cannot be changed
    Constant,

    /// The value can be changed and is mirrored to linked peers
    Linked,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dynamic => write!(f, "dynamic"),
            Self::Constant => write!(f, "constant"),
            Self::Linked => write!(f, "linked"),
        }
    }
}

/// A typed value holder with an admissible domain
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    value: TypedValue,
    constraint: Constraint,
    status: Status,

    /// Constraint as it was before link negotiation narrowed it
    capabilities: Option<Constraint>,
}

impl Variable {
    /// Create a variable.
    ///
    /// Exactly one of `range` and `set` is required, except for booleans which
    /// accept neither. The value starts at the constraint's default; booleans
    /// start unset.
    ///
    /// # Examples
    ///
    /// ```
    /// use libdsp_rs::parameters::{Datatype, Range, Status, Value, Variable};
    ///
    /// let range = Range::float(0.0, 0.1, 1.0).unwrap();
    /// let mut var = Variable::new(Datatype::Float, Status::Dynamic, Some(range), None).unwrap();
    /// var.set(1.4).unwrap();
    /// assert_eq!(var.get(), Some(&Value::Float(1.0)));
    /// ```
    pub fn new(
        datatype: Datatype,
        status: Status,
        range: Option<Range>,
        set: Option<ValueSet>,
    ) -> Result<Self, VariableError> {
        let constraint = match (datatype, range, set) {
            (_, Some(_), Some(_)) => return Err(ConstructionError::RangeAndSet.into()),
            (Datatype::Boolean, None, None) => Constraint::Unconstrained,
            (Datatype::Boolean, _, _) => return Err(ConstructionError::ConstraintOnBoolean.into()),
            (Datatype::String, Some(_), None) => return Err(ConstructionError::RangeOnString.into()),
            (datatype, None, None) => {
                return Err(ConstructionError::MissingConstraint { datatype }.into())
            }
            (datatype, Some(range), None) => {
                Self::check_constraint_type(datatype, range.datatype())?;
                Constraint::Range(range)
            }
            (datatype, None, Some(set)) => {
                Self::check_constraint_type(datatype, set.datatype())?;
                Constraint::Set(set)
            }
        };

        let mut value = TypedValue::new(datatype);
        if let Some(default) = constraint.default_value() {
            value.set(default)?;
        }

        Ok(Self {
            value,
            constraint,
            status,
            capabilities: None,
        })
    }

    fn check_constraint_type(expected: Datatype, found: Datatype) -> Result<(), ConstructionError> {
        if expected != found {
            return Err(ConstructionError::BoundTypeMismatch { expected, found });
        }
        Ok(())
    }

    /// Start building a variable of the given datatype
    pub fn builder(datatype: Datatype) -> VariableBuilder {
        VariableBuilder::new(datatype)
    }

    /// Create a dynamic variable constrained by a range
    pub fn ranged(range: Range) -> Self {
        let datatype = range.datatype();
        let value = TypedValue::new(datatype);
        let mut var = Self {
            value,
            constraint: Constraint::Range(range),
            status: Status::Dynamic,
            capabilities: None,
        };
        var.reset();
        var
    }

    /// Create a dynamic variable constrained by a set
    pub fn enumerated(set: ValueSet) -> Self {
        let datatype = set.datatype();
        let mut var = Self {
            value: TypedValue::new(datatype),
            constraint: Constraint::Set(set),
            status: Status::Dynamic,
            capabilities: None,
        };
        var.reset();
        var
    }

    /// Create a dynamic, unset boolean variable
    pub fn boolean() -> Self {
        Self {
            value: TypedValue::new(Datatype::Boolean),
            constraint: Constraint::Unconstrained,
            status: Status::Dynamic,
            capabilities: None,
        }
    }

    pub fn datatype(&self) -> Datatype {
        self.value.datatype()
    }

    /// Get the current value, `None` for a boolean that was never assigned
    pub fn get(&self) -> Option<&Value> {
        self.value.get()
    }

    /// Write a candidate value.
    ///
    /// A datatype mismatch is always an error, even on a constant variable.
    /// Constant variables ignore the write. Ranges quantize and clamp the
    /// candidate; sets replace the value only if the candidate is a member.
    pub fn set(&mut self, candidate: impl Into<Value>) -> Result<(), VariableError> {
        let candidate = candidate.into();
        self.value.check(&candidate)?;

        if self.status == Status::Constant {
            return Ok(());
        }

        if let Some(accepted) = self.constraint.apply(&candidate) {
            self.value.set(accepted)?;
        }
        Ok(())
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Change the status. No transition is refused here; the owning
    /// parameter decides which transitions make sense.
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// Constraint saved before the first negotiation, if linked
    pub fn capabilities(&self) -> Option<&Constraint> {
        self.capabilities.as_ref()
    }

    /// The constraint this variable was created with
    pub fn own_constraint(&self) -> &Constraint {
        self.capabilities.as_ref().unwrap_or(&self.constraint)
    }

    /// Reset the value to the constraint's default
    pub fn reset(&mut self) {
        if let Some(default) = self.constraint.default_value() {
            // The default always carries the constraint's datatype
            let _ = self.value.set(default);
        }
    }

    /// Adopt a negotiated constraint and enter the linked status.
    ///
    /// The original constraint is saved on the first adoption only. The
    /// current value is filtered through the new constraint and falls back to
    /// its default when rejected.
    pub(crate) fn adopt(&mut self, constraint: Constraint) {
        if self.capabilities.is_none() {
            self.capabilities = Some(std::mem::replace(&mut self.constraint, constraint));
        } else {
            self.constraint = constraint;
        }
        self.status = Status::Linked;

        let filtered = self.value.get().and_then(|v| self.constraint.apply(v));
        match filtered {
            Some(value) => {
                let _ = self.value.set(value);
            }
            None => self.reset(),
        }
    }

    /// Replace the negotiated constraint without touching the value
    pub(crate) fn renegotiate(&mut self, constraint: Constraint) {
        if self.capabilities.is_some() {
            self.constraint = constraint;
        }
    }

    /// Drop the negotiated constraint and go back to dynamic
    pub(crate) fn restore(&mut self) {
        if let Some(own) = self.capabilities.take() {
            self.constraint = own;
        }
        self.status = Status::Dynamic;
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => write!(f, "({}, {}, {})", value, self.datatype(), self.status),
            None => write!(f, "(None, {}, {})", self.datatype(), self.status),
        }
    }
}

/// Builder for [`Variable`]
#[derive(Debug, Clone)]
pub struct VariableBuilder {
    datatype: Datatype,
    status: Status,
    range: Option<Range>,
    set: Option<ValueSet>,
    tolerance: Option<f64>,
    value: Option<Value>,
}

impl VariableBuilder {
    pub fn new(datatype: Datatype) -> Self {
        Self {
            datatype,
            status: Status::Dynamic,
            range: None,
            set: None,
            tolerance: None,
            value: None,
        }
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    pub fn set(mut self, set: ValueSet) -> Self {
        self.set = Some(set);
        self
    }

    /// Tolerance for numerical set membership
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Initial value, written through the setter before the status applies
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn build(self) -> Result<Variable, VariableError> {
        let set = match (self.set, self.tolerance) {
            (Some(set), Some(tolerance)) => Some(set.with_tolerance(tolerance)),
            (set, _) => set,
        };

        let mut var = Variable::new(self.datatype, Status::Dynamic, self.range, set)?;
        if let Some(value) = self.value {
            var.set(value)?;
        }
        var.set_status(self.status);
        Ok(var)
    }
}
