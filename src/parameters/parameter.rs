//! Parameter definition and link negotiation
//!
//! A [`Parameter`] is a named, observable handle around a [`Variable`]. Owners
//! register zero-argument callbacks that run whenever the value actually
//! changes, and may link parameters together so that their values stay
//! synchronized within the intersection of their constraints.
//!
//! Parameters are cheap to clone: every clone refers to the same underlying
//! parameter. Links hold weak references, so dropping the last handle of a
//! parameter removes it from its link group.

use crate::config::{LockPolicy, ParameterConfig};
use crate::parameters::constraint::{intersect_with_tolerance, Constraint};
use crate::parameters::descriptor::ParameterDescriptor;
use crate::parameters::value::{Datatype, TypeMismatch, Value};
use crate::parameters::variable::{Status, Variable, VariableError};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Errors that can occur when working with parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Variable error: {0}")]
    Variable(#[from] VariableError),

    #[error("Parameter '{name}' cannot be linked to itself")]
    InvalidPeer { name: String },

    #[error("Parameter '{name}' is linked and cannot be locked or unlocked")]
    LinkedStatus { name: String },

    #[error("Parameter '{name}' already exists")]
    DuplicateName { name: String },

    #[error("Parameter '{name}' not found")]
    ParameterNotFound { name: String },
}

impl From<TypeMismatch> for ParameterError {
    fn from(err: TypeMismatch) -> Self {
        ParameterError::Variable(VariableError::TypeMismatch(err))
    }
}

/// Why two parameters could not agree on a common domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationFailure {
    /// The two variables carry different datatypes
    DatatypeMismatch { local: Datatype, peer: Datatype },

    /// No value is admissible on both sides
    EmptyIntersection,

    /// One of the parameters is constant
    Locked,
}

impl fmt::Display for NegotiationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DatatypeMismatch { local, peer } => {
                write!(f, "datatypes are different ({} vs {})", local, peer)
            }
            Self::EmptyIntersection => write!(f, "no common admissible value"),
            Self::Locked => write!(f, "a constant parameter cannot be linked"),
        }
    }
}

/// Result of [`Parameter::link`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Negotiation succeeded and the parameters are now linked
    Linked,

    /// The parameters were already part of the same link group
    AlreadyLinked,

    /// The peer already belongs to another link group
    PeerInOtherGroup,

    /// Negotiation failed, nothing was changed
    Rejected(NegotiationFailure),
}

impl LinkOutcome {
    /// Whether the two parameters are linked after the call
    pub fn is_linked(&self) -> bool {
        matches!(self, Self::Linked | Self::AlreadyLinked)
    }
}

type Callback = Box<dyn FnMut()>;

struct Inner {
    name: String,
    description: String,
    units: String,
    config: ParameterConfig,
    variable: RefCell<Variable>,
    callbacks: RefCell<Vec<Callback>>,
    linked: RefCell<Vec<Weak<Inner>>>,

    /// Set while callbacks run or a value propagates through this parameter
    updating: Cell<bool>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let peers: Vec<Parameter> = self
            .linked
            .get_mut()
            .drain(..)
            .filter_map(|weak| weak.upgrade())
            .map(|inner| Parameter { inner })
            .collect();

        for peer in peers {
            peer.inner
                .linked
                .borrow_mut()
                .retain(|weak| weak.strong_count() > 0);
            debug!(parameter = %self.name, peer = %peer.name(), "dropped parameter leaves its link group");
            peer.settle();
        }
    }
}

/// Marks a parameter as updating for the lifetime of the guard
struct UpdateGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> UpdateGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

/// A named, observable and linkable variable
#[derive(Clone)]
pub struct Parameter {
    inner: Rc<Inner>,
}

impl Parameter {
    /// Create a new parameter with the given name and variable
    ///
    /// # Examples
    ///
    /// ```
    /// use libdsp_rs::parameters::{Parameter, Range, Variable};
    ///
    /// let gain = Parameter::new("gain", Variable::ranged(Range::float(0.0, 0.1, 1.0).unwrap()));
    /// gain.set(0.55).unwrap();
    /// assert!((gain.get().unwrap().as_f64().unwrap() - 0.6).abs() < 1e-12);
    /// ```
    pub fn new(name: &str, variable: Variable) -> Self {
        Self::builder(name, variable).build()
    }

    /// Create a new parameter with a short description for hints
    pub fn with_description(name: &str, variable: Variable, description: &str) -> Self {
        Self::builder(name, variable).description(description).build()
    }

    pub fn builder(name: &str, variable: Variable) -> ParameterBuilder {
        ParameterBuilder::new(name, variable)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn description(&self) -> &str {
        &self.inner.description
    }

    /// Physical units of the value (dB, Hz...), empty if none
    pub fn units(&self) -> &str {
        &self.inner.units
    }

    pub fn config(&self) -> &ParameterConfig {
        &self.inner.config
    }

    pub fn datatype(&self) -> Datatype {
        self.inner.variable.borrow().datatype()
    }

    pub fn status(&self) -> Status {
        self.inner.variable.borrow().status()
    }

    /// Get the current value
    pub fn get(&self) -> Option<Value> {
        self.inner.variable.borrow().get().cloned()
    }

    /// Current (possibly negotiated) constraint
    pub fn constraint(&self) -> Constraint {
        self.inner.variable.borrow().constraint().clone()
    }

    /// Constraint saved before negotiation, `None` when not linked
    pub fn capabilities(&self) -> Option<Constraint> {
        self.inner.variable.borrow().capabilities().cloned()
    }

    /// Snapshot of the underlying variable
    pub fn variable(&self) -> Variable {
        self.inner.variable.borrow().clone()
    }

    /// Serializable description of the parameter
    pub fn descriptor(&self) -> ParameterDescriptor {
        ParameterDescriptor::from(self)
    }

    /// Set the value of the parameter.
    ///
    /// The candidate goes through the variable's validation. If the stored
    /// value changed, callbacks run in registration order, then the new value
    /// is propagated to every member of the link group. A `set` issued while
    /// this parameter is already running callbacks or receiving a propagated
    /// value is ignored.
    pub fn set(&self, value: impl Into<Value>) -> Result<(), ParameterError> {
        let value = value.into();

        if self.inner.updating.get() {
            let datatype = self.datatype();
            if value.datatype() != datatype {
                return Err(TypeMismatch {
                    expected: datatype,
                    found: value.datatype(),
                }
                .into());
            }
            warn!(parameter = %self.name(), "ignoring re-entrant set during an update");
            return Ok(());
        }

        let Some(new) = self.write(value)? else {
            return Ok(());
        };

        let _guard = UpdateGuard::enter(&self.inner.updating);
        self.run_callbacks();
        self.propagate(&new);
        Ok(())
    }

    /// Write through the variable, returning the new value if it changed
    fn write(&self, value: Value) -> Result<Option<Value>, ParameterError> {
        let mut variable = self.inner.variable.borrow_mut();
        let before = variable.get().cloned();
        variable.set(value)?;
        let after = variable.get().cloned();

        if after == before {
            return Ok(None);
        }
        trace!(parameter = %self.inner.name, ?before, ?after, "value changed");
        Ok(after)
    }

    fn run_callbacks(&self) {
        // Callbacks are moved out so they may read this parameter or register
        // further callbacks while running
        let mut callbacks = std::mem::take(&mut *self.inner.callbacks.borrow_mut());
        trace!(parameter = %self.inner.name, count = callbacks.len(), "running callbacks");
        for callback in callbacks.iter_mut() {
            callback();
        }

        let mut slot = self.inner.callbacks.borrow_mut();
        callbacks.append(&mut slot);
        *slot = callbacks;
    }

    fn propagate(&self, value: &Value) {
        for member in self.group().into_iter().skip(1) {
            member.receive(value);
        }
    }

    /// Take a value propagated from a linked peer
    fn receive(&self, value: &Value) {
        if self.inner.updating.get() {
            return;
        }
        let _guard = UpdateGuard::enter(&self.inner.updating);

        match self.write(value.clone()) {
            Ok(Some(_)) => {
                trace!(parameter = %self.inner.name, "propagated value applied");
                self.run_callbacks();
            }
            Ok(None) => {}
            Err(err) => warn!(parameter = %self.inner.name, %err, "propagated value refused"),
        }
    }

    /// Append a callback, run after every change of the value
    pub fn push_callback<F>(&self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.inner.callbacks.borrow_mut().push(Box::new(callback));
    }

    pub fn callback_count(&self) -> usize {
        self.inner.callbacks.borrow().len()
    }

    /// Make the value constant
    pub fn lock(&self) -> Result<(), ParameterError> {
        self.transition(Status::Constant)
    }

    /// Make the value dynamic again
    pub fn unlock(&self) -> Result<(), ParameterError> {
        self.transition(Status::Dynamic)
    }

    pub fn is_locked(&self) -> bool {
        self.status() == Status::Constant
    }

    fn transition(&self, status: Status) -> Result<(), ParameterError> {
        let mut variable = self.inner.variable.borrow_mut();
        if variable.status() == Status::Linked {
            return match self.inner.config.lock_policy {
                LockPolicy::Reject => Err(ParameterError::LinkedStatus {
                    name: self.inner.name.clone(),
                }),
                LockPolicy::Ignore => {
                    warn!(parameter = %self.inner.name, requested = %status, "status change ignored while linked");
                    Ok(())
                }
            };
        }
        variable.set_status(status);
        Ok(())
    }

    /// Whether two handles refer to the same parameter
    pub fn ptr_eq(&self, other: &Parameter) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_linked(&self) -> bool {
        !self.inner.linked.borrow().is_empty()
    }

    /// Whether `other` is a direct link of this parameter
    pub fn is_linked_with(&self, other: &Parameter) -> bool {
        let target = Rc::as_ptr(&other.inner);
        self.inner
            .linked
            .borrow()
            .iter()
            .any(|weak| Weak::as_ptr(weak) == target)
    }

    /// Parameters directly linked to this one
    pub fn linked_peers(&self) -> Vec<Parameter> {
        self.inner
            .linked
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .map(|inner| Parameter { inner })
            .collect()
    }

    /// Every parameter transitively linked to this one, starting with itself
    pub fn group(&self) -> Vec<Parameter> {
        let mut members = vec![self.clone()];
        let mut next = 0;
        while next < members.len() {
            for peer in members[next].linked_peers() {
                if !members.iter().any(|member| member.ptr_eq(&peer)) {
                    members.push(peer);
                }
            }
            next += 1;
        }
        members
    }

    /// Compute the domain both parameters could agree on, without linking
    pub fn negotiate(&self, peer: &Parameter) -> Result<Constraint, NegotiationFailure> {
        let local = self.datatype();
        let remote = peer.datatype();
        if local != remote {
            return Err(NegotiationFailure::DatatypeMismatch {
                local,
                peer: remote,
            });
        }

        let ours = self.inner.variable.borrow();
        let theirs = peer.inner.variable.borrow();
        intersect_with_tolerance(
            ours.constraint(),
            theirs.constraint(),
            self.inner.config.tolerance,
        )
        .ok_or(NegotiationFailure::EmptyIntersection)
    }

    /// Link this parameter with `peer` so both values stay identical.
    ///
    /// Both variables adopt the intersection of their constraints and enter the
    /// linked status; the value of `self`, filtered through the intersection,
    /// is then mirrored into the peer. If `self` already belongs to a link
    /// group, the whole group adopts the narrowed constraint. Callbacks run on
    /// every participant whose value changed.
    ///
    /// A failed negotiation is reported through [`LinkOutcome::Rejected`] and
    /// leaves both sides untouched. Linking a parameter to itself is an error.
    pub fn link(&self, peer: &Parameter) -> Result<LinkOutcome, ParameterError> {
        if self.ptr_eq(peer) {
            return Err(ParameterError::InvalidPeer {
                name: self.inner.name.clone(),
            });
        }

        let mut participants = self.group();
        if participants.iter().any(|member| member.ptr_eq(peer)) {
            return Ok(LinkOutcome::AlreadyLinked);
        }
        if peer.status() == Status::Linked {
            debug!(parameter = %self.name(), peer = %peer.name(), "peer belongs to another link group");
            return Ok(LinkOutcome::PeerInOtherGroup);
        }
        if self.status() == Status::Constant || peer.status() == Status::Constant {
            debug!(parameter = %self.name(), peer = %peer.name(), "constant parameters cannot be linked");
            return Ok(LinkOutcome::Rejected(NegotiationFailure::Locked));
        }

        let constraint = match self.negotiate(peer) {
            Ok(constraint) => constraint,
            Err(failure) => {
                debug!(parameter = %self.name(), peer = %peer.name(), %failure, "link negotiation failed");
                return Ok(LinkOutcome::Rejected(failure));
            }
        };

        participants.push(peer.clone());
        let before: Vec<Option<Value>> = participants.iter().map(Parameter::get).collect();

        for member in &participants {
            member.inner.variable.borrow_mut().adopt(constraint.clone());
        }
        self.inner.linked.borrow_mut().push(Rc::downgrade(&peer.inner));
        peer.inner.linked.borrow_mut().push(Rc::downgrade(&self.inner));

        // The initiator's value wins; an unset initiator takes the peer's
        if let Some(value) = self.get().or_else(|| peer.get()) {
            for member in &participants {
                if let Err(err) = member.inner.variable.borrow_mut().set(value.clone()) {
                    warn!(parameter = %member.name(), %err, "negotiated value refused");
                }
            }
        }
        debug!(parameter = %self.name(), peer = %peer.name(), members = participants.len(), "parameters linked");

        for (member, before) in participants.iter().zip(before) {
            if member.get() != before {
                let _guard = UpdateGuard::enter(&member.inner.updating);
                member.run_callbacks();
            }
        }
        Ok(LinkOutcome::Linked)
    }

    /// Remove the link between this parameter and `peer`.
    ///
    /// A parameter left without links gets its own constraint back and becomes
    /// dynamic again. Parameters still linked to others get the intersection
    /// of their remaining group's constraints. Values are not changed.
    /// Returns `false` if the two were not directly linked.
    pub fn unlink(&self, peer: &Parameter) -> bool {
        if !self.is_linked_with(peer) {
            return false;
        }

        let ours = Rc::as_ptr(&self.inner);
        let theirs = Rc::as_ptr(&peer.inner);
        self.inner
            .linked
            .borrow_mut()
            .retain(|weak| Weak::as_ptr(weak) != theirs);
        peer.inner
            .linked
            .borrow_mut()
            .retain(|weak| Weak::as_ptr(weak) != ours);
        debug!(parameter = %self.name(), peer = %peer.name(), "parameters unlinked");

        self.settle();
        peer.settle();
        true
    }

    /// Remove every direct link of this parameter
    pub fn unlink_all(&self) {
        for peer in self.linked_peers() {
            self.unlink(&peer);
        }
    }

    /// Recompute the constraint after the link set of this parameter shrank
    fn settle(&self) {
        if !self.is_linked() {
            self.inner.variable.borrow_mut().restore();
            return;
        }

        let members = self.group();
        let tolerance = self.inner.config.tolerance;
        let owns: Vec<Constraint> = members
            .iter()
            .map(|member| member.inner.variable.borrow().own_constraint().clone())
            .collect();

        // Members may have only met through the departed peer's domain: keep
        // the current constraint, filtered by what every member still admits
        let constraint = intersect_all(owns[0].clone(), &owns[1..], tolerance)
            .or_else(|| intersect_all(self.constraint(), &owns, tolerance));
        let Some(constraint) = constraint else {
            warn!(parameter = %self.name(), "remaining link group has no common domain");
            return;
        };

        for member in &members {
            member.inner.variable.borrow_mut().renegotiate(constraint.clone());
        }
        debug!(parameter = %self.name(), members = members.len(), "link group constraint recomputed");
    }
}

/// Fold `others` into `start` by intersection
fn intersect_all(start: Constraint, others: &[Constraint], tolerance: f64) -> Option<Constraint> {
    others.iter().try_fold(start, |acc, other| {
        intersect_with_tolerance(&acc, other, tolerance)
    })
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Parameter {}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.inner.name)
            .field("variable", &*self.inner.variable.borrow())
            .field("callbacks", &self.callback_count())
            .field("linked", &self.inner.linked.borrow().len())
            .finish()
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variable = self.inner.variable.borrow();
        let datatype = variable.datatype();
        let units = if self.inner.units.is_empty() {
            String::new()
        } else {
            format!(" in {}", self.inner.units)
        };

        match variable.constraint() {
            Constraint::Range(range) => write!(
                f,
                "{} ({}, in range {}{}) : {}",
                self.inner.name, datatype, range, units, self.inner.description
            ),
            Constraint::Set(set) => write!(
                f,
                "{} ({}, values in the set {}{}) : {}",
                self.inner.name, datatype, set, units, self.inner.description
            ),
            Constraint::Unconstrained => write!(
                f,
                "{} ({}{}) : {}",
                self.inner.name, datatype, units, self.inner.description
            ),
        }
    }
}

/// Builder for [`Parameter`]
pub struct ParameterBuilder {
    name: String,
    variable: Variable,
    description: String,
    units: String,
    config: ParameterConfig,
}

impl ParameterBuilder {
    pub fn new(name: &str, variable: Variable) -> Self {
        Self {
            name: name.to_string(),
            variable,
            description: String::new(),
            units: String::new(),
            config: ParameterConfig::default(),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn units(mut self, units: &str) -> Self {
        self.units = units.to_string();
        self
    }

    pub fn config(mut self, config: ParameterConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the parameter. A new parameter has no links, so a variable
    /// handed over in the linked status starts out dynamic instead.
    pub fn build(self) -> Parameter {
        let mut variable = self.variable;
        if variable.status() == Status::Linked {
            warn!(parameter = %self.name, "parameter built without links, status reset to dynamic");
            variable.restore();
        }

        Parameter {
            inner: Rc::new(Inner {
                name: self.name,
                description: self.description,
                units: self.units,
                config: self.config,
                variable: RefCell::new(variable),
                callbacks: RefCell::new(Vec::new()),
                linked: RefCell::new(Vec::new()),
                updating: Cell::new(false),
            }),
        }
    }
}
