//! Named collection of parameters
//!
//! A [`ParameterSet`] is what a processing block exposes to its host: every
//! parameter by name, in declaration order, plus a shared hook that runs
//! whenever any of them changes (typically used to recompute internal
//! coefficients).

use crate::parameters::descriptor::ParameterDescriptor;
use crate::parameters::parameter::{Parameter, ParameterError};
use crate::parameters::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

type Hook = Rc<RefCell<dyn FnMut()>>;

/// A collection of uniquely named parameters
#[derive(Default)]
pub struct ParameterSet {
    /// Map of parameter names to their position in `order`
    index: HashMap<String, usize>,

    /// Parameters in insertion order
    order: Vec<Parameter>,

    /// Hooks installed on every parameter, including later additions
    hooks: Vec<Hook>,
}

impl ParameterSet {
    /// Create a new empty collection
    ///
    /// # Examples
    ///
    /// ```
    /// use libdsp_rs::parameters::ParameterSet;
    ///
    /// let params = ParameterSet::new();
    /// assert!(params.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter to the collection
    ///
    /// Fails with [`ParameterError::DuplicateName`] if a parameter with the same
    /// name is already present. Hooks registered with [`on_change`](Self::on_change)
    /// are installed on the new parameter.
    pub fn add(&mut self, param: Parameter) -> Result<(), ParameterError> {
        let name = param.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ParameterError::DuplicateName { name });
        }

        for hook in &self.hooks {
            Self::install(&param, Rc::clone(hook));
        }
        debug!(parameter = %name, "parameter added to set");
        self.index.insert(name, self.order.len());
        self.order.push(param);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|&i| &self.order[i])
    }

    fn lookup(&self, name: &str) -> Result<&Parameter, ParameterError> {
        self.get(name).ok_or_else(|| ParameterError::ParameterNotFound {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Parameter names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.order.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.order.iter()
    }

    /// Set the value of the named parameter
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), ParameterError> {
        self.lookup(name)?.set(value)
    }

    /// Get the value of the named parameter
    pub fn value(&self, name: &str) -> Result<Option<Value>, ParameterError> {
        Ok(self.lookup(name)?.get())
    }

    /// Run `hook` whenever any parameter of the set changes value.
    ///
    /// The hook is installed on the current parameters and on every parameter
    /// added afterwards. A change that propagates through a link group runs it
    /// once per member of the set that changed.
    pub fn on_change<F>(&mut self, hook: F)
    where
        F: FnMut() + 'static,
    {
        let hook: Hook = Rc::new(RefCell::new(hook));
        for param in &self.order {
            Self::install(param, Rc::clone(&hook));
        }
        self.hooks.push(hook);
    }

    fn install(param: &Parameter, hook: Hook) {
        let name = param.name().to_string();
        param.push_callback(move || match hook.try_borrow_mut() {
            Ok(mut hook) => (&mut *hook)(),
            Err(_) => warn!(parameter = %name, "change hook is already running, skipped"),
        });
    }

    /// Human readable description, one parameter per line
    pub fn describe(&self) -> String {
        self.order
            .iter()
            .map(|param| param.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Descriptors of every parameter, in insertion order
    pub fn descriptors(&self) -> Vec<ParameterDescriptor> {
        self.order.iter().map(Parameter::descriptor).collect()
    }

    /// Serialize the descriptors of every parameter to a JSON array
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.descriptors())
    }
}

impl fmt::Debug for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSet")
            .field("parameters", &self.order)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}
