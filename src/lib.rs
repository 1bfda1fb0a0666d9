//! # libdsp-rs
//!
//! `libdsp-rs` provides the parameter layer of a digital signal processing
//! library: typed variables with range or set constraints, named parameters
//! that notify their owner on change, and links that keep several parameters
//! synchronized within the intersection of their constraints.
//!
//! The library provides:
//! - Typed values that cannot silently change datatype
//! - Quantized ranges and enumerated sets, with constraint intersection
//! - Observable parameters with change callbacks
//! - Link negotiation and value propagation across link groups
//! - Serializable parameter descriptors for automated GUI generation
//!
//! ## Basic Usage
//!
//! ```
//! use libdsp_rs::parameters::{Parameter, ParameterSet, Range, Value, Variable};
//!
//! let mut params = ParameterSet::new();
//! params
//!     .add(Parameter::with_description(
//!         "gain",
//!         Variable::ranged(Range::float(0.0, 0.1, 1.0).unwrap()),
//!         "output gain",
//!     ))
//!     .unwrap();
//!
//! params.set("gain", 0.55).unwrap();
//! let gain = params.value("gain").unwrap().and_then(|v| v.as_f64()).unwrap();
//! assert!((gain - 0.6).abs() < 1e-12);
//! ```

// Public modules
pub mod config;
pub mod error;

// Parameter system
pub mod parameters;

// Re-exports for convenience
pub use config::{LockPolicy, ParameterConfig, DEFAULT_TOLERANCE};
pub use error::{LibDspError, Result};
pub use parameters::{Parameter, ParameterSet, Value, Variable};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
