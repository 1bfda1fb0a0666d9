//! Serializable snapshots of parameters
//!
//! Descriptors are plain data: they carry everything a host needs to render a
//! control for a parameter (name, units, domain, current value) without
//! holding on to the parameter itself.

use crate::parameters::constraint::{Constraint, Range};
use crate::parameters::parameter::Parameter;
use crate::parameters::value::{Datatype, Value};
use crate::parameters::variable::Status;
use serde::Serialize;

/// Domain of a parameter, as exposed to hosts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConstraintDescriptor {
    Unconstrained,
    Range {
        min: Value,
        step: Value,
        max: Value,
        default: Value,
    },
    Set {
        values: Vec<Value>,
    },
}

impl From<&Range> for ConstraintDescriptor {
    fn from(range: &Range) -> Self {
        Self::Range {
            min: range.min(),
            step: range.step(),
            max: range.max(),
            default: range.default_value(),
        }
    }
}

impl From<&Constraint> for ConstraintDescriptor {
    fn from(constraint: &Constraint) -> Self {
        match constraint {
            Constraint::Unconstrained => Self::Unconstrained,
            Constraint::Range(range) => range.into(),
            Constraint::Set(set) => Self::Set {
                values: set.values().to_vec(),
            },
        }
    }
}

/// Snapshot of a parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub description: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub units: String,

    pub datatype: Datatype,
    pub status: Status,

    /// Current value, `null` for a boolean never assigned
    pub value: Option<Value>,

    pub constraint: ConstraintDescriptor,

    /// Names of the directly linked parameters
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub linked: Vec<String>,
}

impl From<&Parameter> for ParameterDescriptor {
    fn from(param: &Parameter) -> Self {
        Self {
            name: param.name().to_string(),
            description: param.description().to_string(),
            units: param.units().to_string(),
            datatype: param.datatype(),
            status: param.status(),
            value: param.get(),
            constraint: ConstraintDescriptor::from(&param.constraint()),
            linked: param
                .linked_peers()
                .iter()
                .map(|peer| peer.name().to_string())
                .collect(),
        }
    }
}

impl ParameterDescriptor {
    /// Serialize the descriptor to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
