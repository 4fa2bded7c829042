//! The mediation surface.
//!
//! [`guard`] wraps a source object in a [`GuardedView`] that checks every
//! get, set, existence check, enumeration and delete against a [`Policy`].
//! Denied gets, sets and deletes are reported to the [`Forbidden`] handler;
//! denied existence checks and enumeration entries are silently filtered.
//!
//! Before the view is handed out, every function-valued property of the
//! source is rebound to the source itself. Methods called through the view
//! therefore see the raw object and are not subject to the policy.
//!
//! # Example
//!
//! ```
//! use gard::{guard, Forbidden, Object, ObjectRef, Value};
//!
//! let source = ObjectRef::new(Object::new().with("a", 1).with("b", 2));
//! let view = guard(&source, ["a"], Forbidden::noop()).unwrap();
//!
//! assert_eq!(view.get("a").unwrap(), Value::from(1));
//! assert_eq!(view.get("b").unwrap(), Value::Undefined);
//! assert!(!view.has("b"));
//! assert_eq!(view.keys(), vec!["a"]);
//! ```

use std::iter::FusedIterator;
use std::rc::Rc;

use gard_core::{
    Access, ObjectRef, Operation, PermissionSpec, Policy, PropertyAccess, Result, Value,
    call_property,
};
use log::{debug, trace};

use crate::forbidden::Forbidden;

/// Normalize `permissions` and wrap `source` in a guarded view.
///
/// Function-valued own properties of `source` are rebound to `source` in
/// place, once, before the view is returned.
///
/// # Errors
///
/// Returns the normalization error for a malformed specification, including
/// any error raised by a producer.
pub fn guard(
    source: &ObjectRef,
    permissions: impl Into<PermissionSpec>,
    forbidden: Forbidden,
) -> Result<GuardedView> {
    let policy = Policy::normalize(permissions.into())?;
    Ok(GuardedView::new(source.clone(), policy, forbidden))
}

/// A policy-filtered view of a source object.
///
/// Holds only the source handle, the policy, and the forbidden handler.
/// Clones share all three.
#[derive(Debug, Clone)]
pub struct GuardedView {
    source: ObjectRef,
    policy: Rc<Policy>,
    forbidden: Forbidden,
}

impl GuardedView {
    /// Wrap `source` with an already normalized policy.
    ///
    /// Accepts an `Rc<Policy>` so several views can share one policy.
    pub fn new(source: ObjectRef, policy: impl Into<Rc<Policy>>, forbidden: Forbidden) -> Self {
        let rebound = source.bind_methods();
        trace!("guarding object: {rebound} methods rebound to source");
        Self {
            source,
            policy: policy.into(),
            forbidden,
        }
    }

    /// The unmediated source object.
    pub fn source(&self) -> &ObjectRef {
        &self.source
    }

    /// The policy this view enforces.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    fn current(&self, name: &str) -> Value {
        self.source.borrow().get(name).cloned().unwrap_or_default()
    }

    /// Read `name`.
    ///
    /// Absent or undefined properties read as [`Value::Undefined`] without
    /// consulting the policy. Without `READ`, the forbidden handler's result
    /// is returned instead of the real value.
    pub fn get(&self, name: &str) -> Result<Value> {
        let value = self.current(name);
        if !value.is_defined() {
            return Ok(Value::Undefined);
        }

        if self.policy.permits(name, Access::READ) {
            trace!("get {name:?} permitted");
            return Ok(value);
        }

        debug!("get {name:?} forbidden");
        self.forbidden
            .invoke(name, &self.source, Operation::Get, Some(value.type_name()))
    }

    /// Write `name`.
    ///
    /// Always reports `true`. Without `WRITE` the forbidden handler runs and
    /// the source is left untouched.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<bool> {
        if self.policy.permits(name, Access::WRITE) {
            trace!("set {name:?} permitted");
            self.source.borrow_mut().insert(name, value);
            return Ok(true);
        }

        debug!("set {name:?} forbidden");
        self.forbidden
            .invoke(name, &self.source, Operation::Set, None)?;
        Ok(true)
    }

    /// Existence check: the property is defined and readable.
    ///
    /// Never invokes the forbidden handler.
    pub fn has(&self, name: &str) -> bool {
        self.current(name).is_defined() && self.policy.permits(name, Access::READ)
    }

    /// Remove `name`.
    ///
    /// Returns `false` without side effects if the property is undefined.
    /// Without `DELETE` the forbidden handler runs and `false` is returned.
    pub fn delete(&self, name: &str) -> Result<bool> {
        if !self.current(name).is_defined() {
            return Ok(false);
        }

        if self.policy.permits(name, Access::DELETE) {
            trace!("delete {name:?} permitted");
            self.source.borrow_mut().remove(name);
            return Ok(true);
        }

        debug!("delete {name:?} forbidden");
        self.forbidden
            .invoke(name, &self.source, Operation::Delete, None)?;
        Ok(false)
    }

    /// Readable own property names, in the source's enumeration order.
    pub fn keys(&self) -> Vec<String> {
        self.enumerate().collect()
    }

    /// Lazily enumerate readable own property names.
    ///
    /// The own-key list is captured now; each name is checked with
    /// [`GuardedView::has`] when the cursor reaches it.
    pub fn enumerate(&self) -> Enumerate<'_> {
        let keys = self.source.borrow().keys().map(str::to_owned).collect::<Vec<_>>();
        Enumerate {
            view: self,
            keys: keys.into_iter(),
        }
    }

    /// Read `name` through the view and invoke it, with the view as the
    /// receiver.
    ///
    /// Functions rebound at construction ignore that receiver and run
    /// against the source.
    ///
    /// # Errors
    ///
    /// Returns [`gard_core::Error::NotCallable`] if the read yields anything
    /// but a function, and propagates errors from the function.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        call_property(self, name, args)
    }
}

impl PropertyAccess for GuardedView {
    fn get(&self, name: &str) -> Result<Value> {
        GuardedView::get(self, name)
    }

    fn set(&self, name: &str, value: Value) -> Result<bool> {
        GuardedView::set(self, name, value)
    }

    fn has(&self, name: &str) -> bool {
        GuardedView::has(self, name)
    }

    fn delete(&self, name: &str) -> Result<bool> {
        GuardedView::delete(self, name)
    }

    fn keys(&self) -> Vec<String> {
        GuardedView::keys(self)
    }
}

/// Single-pass cursor over the readable own keys of a [`GuardedView`].
#[derive(Debug)]
pub struct Enumerate<'a> {
    view: &'a GuardedView,
    keys: std::vec::IntoIter<String>,
}

impl Iterator for Enumerate<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let view = self.view;
        self.keys.by_ref().find(|name| view.has(name))
    }
}

impl FusedIterator for Enumerate<'_> {}
