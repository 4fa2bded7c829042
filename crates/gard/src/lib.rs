//! Gard — permission-guarded views over in-memory objects.
//!
//! [`guard`] takes a source object, a permission specification, and a
//! [`Forbidden`] handler, and returns a [`GuardedView`] that mediates every
//! property get, set, existence check, enumeration and delete.
//!
//! This is the umbrella crate: everything from `gard-core` is re-exported
//! here, so most users only depend on `gard`.
//!
//! # Modules
//!
//! - [`forbidden`]: Handlers for denied access
//! - [`view`]: The guarded view and its enumeration cursor
//!
//! # Example
//!
//! ```
//! use gard::{guard, Access, Forbidden, Object, ObjectRef, Value};
//!
//! let account = ObjectRef::new(Object::new().with("owner", "ada").with("balance", 100));
//! let view = guard(
//!     &account,
//!     [("owner", Access::READ), ("balance", Access::READWRITE)],
//!     Forbidden::substitute("<hidden>"),
//! )
//! .unwrap();
//!
//! view.set("owner", "mallory").unwrap();
//! assert_eq!(view.get("owner").unwrap(), Value::from("ada"));
//! assert!(!view.delete("balance").unwrap());
//! ```

#![doc = include_str!("../README.md")]

pub mod forbidden;
pub mod view;

pub use forbidden::{Forbidden, ForbiddenFn};
pub use view::{Enumerate, GuardedView, guard};

// Re-export the core crate and its key types
pub use gard_core;
pub use gard_core::{
    Access, DEL, Error, Function, GET, Object, ObjectRef, Operation, PermissionSpec, Policy,
    PolicyConfig, PropertyAccess, Result, SET, Value, WILDCARD, call_property,
};
