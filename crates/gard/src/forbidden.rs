//! Forbidden-access callbacks.
//!
//! A [`Forbidden`] handler runs inline whenever a guarded view denies a get,
//! set, or delete. Its return value is the result of a denied get and is
//! ignored for the other operations. An error it returns propagates to the
//! caller of the denied operation unchanged.

use std::fmt;
use std::rc::Rc;

use gard_core::{Error, ObjectRef, Operation, Result, Value};

/// Signature of a forbidden-access handler.
///
/// Arguments are the property name, the source object, the denied operation,
/// and, for gets only, the `typeof` tag of the hidden value.
pub type ForbiddenFn = dyn Fn(&str, &ObjectRef, Operation, Option<&str>) -> Result<Value>;

/// Handler invoked on denied access. The default does nothing and yields
/// [`Value::Undefined`].
#[derive(Clone, Default)]
pub struct Forbidden {
    handler: Option<Rc<ForbiddenFn>>,
}

impl Forbidden {
    /// Wrap a closure as a forbidden-access handler.
    ///
    /// # Example
    ///
    /// ```
    /// use gard::{Forbidden, Operation, Value};
    ///
    /// let forbidden = Forbidden::new(|property, _source, operation, _type| {
    ///     Ok(Value::from(format!("{operation} {property} denied")))
    /// });
    /// ```
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &ObjectRef, Operation, Option<&str>) -> Result<Value> + 'static,
    {
        Self {
            handler: Some(Rc::new(handler)),
        }
    }

    /// The no-op handler.
    pub fn noop() -> Self {
        Self::default()
    }

    /// A handler that answers every denied get with `value`.
    pub fn substitute(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::new(move |_, _, _, _| Ok(value.clone()))
    }

    /// A handler that turns every denied access into an [`Error::Callback`].
    pub fn error() -> Self {
        Self::new(|property, _, operation, _| {
            Err(Error::callback(format!(
                "{operation} of property {property:?} is forbidden"
            )))
        })
    }

    /// Run the handler.
    pub fn invoke(
        &self,
        property: &str,
        source: &ObjectRef,
        operation: Operation,
        value_type: Option<&str>,
    ) -> Result<Value> {
        match &self.handler {
            Some(handler) => handler(property, source, operation, value_type),
            None => Ok(Value::Undefined),
        }
    }
}

impl fmt::Debug for Forbidden {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forbidden")
            .field("noop", &self.handler.is_none())
            .finish()
    }
}
