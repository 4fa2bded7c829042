//! Gard Core — permission model, object model, and errors.
//!
//! This crate provides the foundational types used by the `gard` mediation
//! surface. It has no internal gard dependencies.
//!
//! # Modules
//!
//! - [`access`]: `Access` bitmask and operation tags
//! - [`config`]: Loading permission specifications from files and env
//! - [`error`]: Error types and Result alias
//! - [`object`]: Own-property storage and the `PropertyAccess` trait
//! - [`policy`]: Permission specifications and the canonical `Policy`
//! - [`value`]: Dynamic property values and functions

#![doc = include_str!("../README.md")]

pub mod access;
pub mod config;
pub mod error;
pub mod object;
pub mod policy;
pub mod value;

// Re-export key types at crate root for convenience
pub use access::{Access, DEL, GET, Operation, SET};
pub use config::PolicyConfig;
pub use error::{Error, Result};
pub use object::{Object, ObjectRef, PropertyAccess, call_property};
pub use policy::{PermissionSpec, Policy, WILDCARD};
pub use value::{Function, Value};
