//! Dynamic property values.
//!
//! A property holds either plain data (any JSON value), a [`Function`], or
//! nothing at all ([`Value::Undefined`]). Nested data is never mediated, so
//! it is stored as a plain `serde_json::Value`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::object::{Object, ObjectRef, PropertyAccess};
use crate::{Error, Result};

/// Signature of a method body: receiver plus arguments.
pub type MethodFn = dyn Fn(&dyn PropertyAccess, &[Value]) -> Result<Value>;

/// A callable property value.
///
/// An unbound function runs against whatever receiver it is invoked with. A
/// bound function (see [`Function::bind`]) always runs against the object it
/// was bound to and ignores the receiver passed at the call site.
///
/// # Example
///
/// ```
/// use gard_core::{Function, Object, ObjectRef, PropertyAccess, Value};
///
/// let source = ObjectRef::new(
///     Object::new()
///         .with("val", 1)
///         .with("getVal", Function::new(|this, _| this.get("val"))),
/// );
///
/// assert_eq!(source.call("getVal", &[]).unwrap(), Value::from(1));
/// ```
#[derive(Clone)]
pub struct Function {
    body: Rc<MethodFn>,
    receiver: Option<Weak<RefCell<Object>>>,
}

impl Function {
    /// Wrap a closure as an unbound function.
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&dyn PropertyAccess, &[Value]) -> Result<Value> + 'static,
    {
        Self {
            body: Rc::new(body),
            receiver: None,
        }
    }

    /// Return a copy of this function permanently bound to `object`.
    ///
    /// Binding an already bound function keeps the original receiver.
    /// The binding holds a weak reference, so an object storing its own
    /// bound methods does not keep itself alive.
    pub fn bind(&self, object: &ObjectRef) -> Self {
        if self.is_bound() {
            return self.clone();
        }
        Self {
            body: Rc::clone(&self.body),
            receiver: Some(object.downgrade()),
        }
    }

    /// Returns true if this function carries its own receiver.
    pub fn is_bound(&self) -> bool {
        self.receiver.is_some()
    }

    /// Invoke the function.
    ///
    /// `receiver` is used only when the function is unbound.
    ///
    /// # Errors
    ///
    /// Propagates whatever the body returns, and returns
    /// [`Error::DetachedReceiver`] if the bound object no longer exists.
    pub fn invoke(&self, receiver: &dyn PropertyAccess, args: &[Value]) -> Result<Value> {
        match &self.receiver {
            Some(weak) => {
                let bound = ObjectRef::upgrade(weak)
                    .ok_or_else(|| Error::DetachedReceiver("bound object was dropped".into()))?;
                (self.body)(&bound, args)
            }
            None => (self.body)(receiver, args),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        let same_receiver = match (&self.receiver, &other.receiver) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            (None, None) => true,
            _ => false,
        };
        Rc::ptr_eq(&self.body, &other.body) && same_receiver
    }
}

/// A property value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// No value. Absent properties read as `Undefined`.
    #[default]
    Undefined,

    /// Plain data.
    Data(serde_json::Value),

    /// A callable.
    Function(Function),
}

impl Value {
    /// Returns true for anything other than [`Value::Undefined`].
    pub fn is_defined(&self) -> bool {
        !matches!(self, Value::Undefined)
    }

    /// Returns true if this value is a [`Function`].
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// The `typeof` tag reported to forbidden callbacks.
    ///
    /// Null and arrays report `"object"`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Function(_) => "function",
            Value::Data(data) => match data {
                serde_json::Value::Bool(_) => "boolean",
                serde_json::Value::Number(_) => "number",
                serde_json::Value::String(_) => "string",
                serde_json::Value::Null
                | serde_json::Value::Array(_)
                | serde_json::Value::Object(_) => "object",
            },
        }
    }

    /// Borrow the plain data, if any.
    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Data(data) => Some(data),
            _ => None,
        }
    }

    /// Borrow the function, if any.
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    /// A finite floating-point number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] for NaN and the infinities, which JSON
    /// data cannot hold.
    pub fn number(n: f64) -> Result<Self> {
        serde_json::Number::from_f64(n)
            .map(|n| Value::Data(serde_json::Value::Number(n)))
            .ok_or_else(|| Error::serialization(format!("non-finite number {n}")))
    }

    /// Numeric data as `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_data().and_then(serde_json::Value::as_i64)
    }

    /// String data as `&str`.
    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(serde_json::Value::as_str)
    }
}

impl From<serde_json::Value> for Value {
    fn from(data: serde_json::Value) -> Self {
        Value::Data(data)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

macro_rules! impl_from_data {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Data(serde_json::Value::from(v))
                }
            }
        )*
    };
}

impl_from_data!(bool, i32, i64, u32, u64, String, &str);

/// Non-finite floats have no JSON form and convert to `null`; use
/// [`Value::number`] to reject them instead.
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Data(serde_json::Value::from(n))
    }
}
