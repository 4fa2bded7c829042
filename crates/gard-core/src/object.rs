//! Own-property storage and the shared object handle.
//!
//! [`Object`] is an ordered map of own properties; insertion order is the
//! enumeration order. [`ObjectRef`] is the shared, interior-mutable handle
//! that callers and guarded views hold onto. Access through an `ObjectRef`
//! is never mediated.
//!
//! [`PropertyAccess`] is the common surface of raw objects and guarded
//! views, which lets method bodies run unchanged against either.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::value::Value;
use crate::{Error, Result};

/// The five property operations shared by raw objects and guarded views.
pub trait PropertyAccess {
    /// Read a property. Absent properties read as [`Value::Undefined`].
    fn get(&self, name: &str) -> Result<Value>;

    /// Write a property, reporting whether the write was accepted.
    fn set(&self, name: &str, value: Value) -> Result<bool>;

    /// Existence check.
    fn has(&self, name: &str) -> bool;

    /// Remove a property, reporting whether the removal succeeded.
    fn delete(&self, name: &str) -> Result<bool>;

    /// Own property names in enumeration order.
    fn keys(&self) -> Vec<String>;

    /// Read a property and invoke it with `self` as the receiver.
    fn call(&self, name: &str, args: &[Value]) -> Result<Value>
    where
        Self: Sized,
    {
        call_property(self, name, args)
    }
}

/// Read `name` from `target` and invoke it with `target` as the receiver.
///
/// This is the trait-object form of [`PropertyAccess::call`], for method
/// bodies that only hold a `&dyn PropertyAccess`.
///
/// # Errors
///
/// Returns [`Error::NotCallable`] if the value read is not a function, and
/// propagates errors from the read and from the function itself.
pub fn call_property(target: &dyn PropertyAccess, name: &str, args: &[Value]) -> Result<Value> {
    match target.get(name)? {
        Value::Function(function) => function.invoke(target, args),
        _ => Err(Error::not_callable(name)),
    }
}

// ============================================================================
// Object
// ============================================================================

/// An ordered set of own properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    properties: IndexMap<String, Value>,
}

impl Object {
    /// Create an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Build an object from a JSON object's entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if `data` is not a JSON object.
    pub fn from_json(data: serde_json::Value) -> Result<Self> {
        match data {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(Error::serialization(format!(
                "expected a JSON object, found {}",
                Value::from(other).type_name()
            ))),
        }
    }

    /// Look up an own property.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Insert or replace a property, keeping its position if it existed.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.properties.insert(name.into(), value.into())
    }

    /// Remove a property, preserving the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.properties.shift_remove(name)
    }

    /// Returns true if the object has an own property called `name`.
    pub fn contains_key(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Own property names in enumeration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Own properties in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Mutable access to property values, in enumeration order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.properties.values_mut()
    }

    /// Number of own properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns true if the object has no own properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Object
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            properties: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ============================================================================
// ObjectRef
// ============================================================================

/// Shared handle to an [`Object`].
///
/// Cloning is cheap and yields another handle to the same object. Each
/// [`PropertyAccess`] call borrows the object only for its own duration, so
/// no borrow is outstanding while callbacks or functions run.
#[derive(Clone, Default)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    /// Wrap an object in a new shared handle.
    pub fn new(object: Object) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    /// Borrow the underlying object.
    ///
    /// # Panics
    ///
    /// Panics if the object is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    /// Mutably borrow the underlying object.
    ///
    /// # Panics
    ///
    /// Panics if the object is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    /// Returns true if both handles point at the same object.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Replace every function-valued own property with a copy bound to this
    /// object. Returns the number of properties rebound.
    pub fn bind_methods(&self) -> usize {
        let mut object = self.0.borrow_mut();
        let mut bound = 0;
        for value in object.values_mut() {
            if let Value::Function(function) = value {
                if !function.is_bound() {
                    *function = function.bind(self);
                    bound += 1;
                }
            }
        }
        bound
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<Object>> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn upgrade(weak: &Weak<RefCell<Object>>) -> Option<Self> {
        weak.upgrade().map(Self)
    }
}

impl From<Object> for ObjectRef {
    fn from(object: Object) -> Self {
        Self::new(object)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(object) => f.debug_tuple("ObjectRef").field(&*object).finish(),
            Err(_) => f.write_str("ObjectRef(<borrowed>)"),
        }
    }
}

impl PropertyAccess for ObjectRef {
    fn get(&self, name: &str) -> Result<Value> {
        Ok(self.borrow().get(name).cloned().unwrap_or_default())
    }

    fn set(&self, name: &str, value: Value) -> Result<bool> {
        self.borrow_mut().insert(name, value);
        Ok(true)
    }

    fn has(&self, name: &str) -> bool {
        self.borrow().contains_key(name)
    }

    fn delete(&self, name: &str) -> Result<bool> {
        self.borrow_mut().remove(name);
        Ok(true)
    }

    fn keys(&self) -> Vec<String> {
        self.borrow().keys().map(str::to_owned).collect()
    }
}
