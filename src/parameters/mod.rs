//! # Parameter System
//!
//! Typed, constrained and observable parameters for signal-processing blocks.
//!
//! ## Key Features
//!
//! - **Typed Values**: Every variable carries one datatype (float, integer, boolean, string)
//!   and refuses writes of any other type
//! - **Constraints**: Values are quantized into a range `[min : step : max]` or restricted
//!   to a set of allowed values
//! - **Callbacks**: Owners are notified whenever a value actually changes
//! - **Linking**: Parameters can be linked so that their values stay identical, within the
//!   intersection of their constraints
//! - **Descriptors**: Parameters can be exported as serializable descriptors for hosts
//!
//! ## Core Components
//!
//! - [`Value`] and [`Datatype`]: Scalar values and their types
//! - [`Range`], [`ValueSet`] and [`Constraint`]: Admissible domains and their intersection
//! - [`Variable`]: A typed value with a constraint and a [`Status`]
//! - [`Parameter`]: A named, observable and linkable variable
//! - [`ParameterSet`]: A collection of parameters addressed by name
//!
//! ## Example Usage
//!
//! ```rust
//! use libdsp_rs::parameters::{LinkOutcome, Parameter, Range, Status, Value, ValueSet, Variable};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let cutoff = Parameter::builder("cutoff", Variable::ranged(Range::float(20.0, 1.0, 20000.0).unwrap()))
//!     .description("cutoff frequency")
//!     .units("Hz")
//!     .build();
//!
//! // Track changes
//! let changes = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&changes);
//! cutoff.push_callback(move || counter.set(counter.get() + 1));
//!
//! // Values are quantized and clamped
//! cutoff.set(440.3).unwrap();
//! assert_eq!(cutoff.get(), Some(Value::Float(440.0)));
//! cutoff.set(1e6).unwrap();
//! assert_eq!(cutoff.get(), Some(Value::Float(20000.0)));
//! assert_eq!(changes.get(), 2);
//!
//! // Linked parameters share the intersection of their sets
//! let a = Parameter::new("a", Variable::enumerated(ValueSet::new(vec![1.into(), 2.into(), 5.into()]).unwrap()));
//! let b = Parameter::new("b", Variable::enumerated(ValueSet::new(vec![0.into(), 1.into(), 2.into()]).unwrap()));
//! assert_eq!(a.link(&b).unwrap(), LinkOutcome::Linked);
//! assert_eq!(b.status(), Status::Linked);
//!
//! a.set(2).unwrap();
//! assert_eq!(b.get(), Some(Value::Integer(2)));
//! ```

pub mod bounds;
pub mod collection;
pub mod constraint;
pub mod descriptor;
pub mod parameter;
pub mod value;
pub mod variable;

pub use bounds::Bounds;
pub use collection::ParameterSet;
pub use constraint::{
    intersect, intersect_with_tolerance, ConstructionError, Constraint, Range, ValueSet,
};
pub use descriptor::{ConstraintDescriptor, ParameterDescriptor};
pub use parameter::{
    LinkOutcome, NegotiationFailure, Parameter, ParameterBuilder, ParameterError,
};
pub use value::{Datatype, TypeMismatch, TypedValue, Value};
pub use variable::{Status, Variable, VariableBuilder, VariableError};
