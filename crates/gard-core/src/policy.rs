//! Permission model.
//!
//! A [`PermissionSpec`] is what callers write: an allowlist of property
//! names, an explicit name-to-[`Access`] map, or a producer that returns one
//! of those. [`Policy::normalize`] turns any of them into the canonical
//! [`Policy`]: a fixed name-to-access map plus a default for unlisted names.
//!
//! # Example
//!
//! ```
//! use gard_core::{Access, PermissionSpec, Policy};
//!
//! let policy = Policy::normalize(PermissionSpec::grants([
//!     ("name", Access::READ),
//!     ("*", Access::READWRITE),
//! ]))
//! .unwrap();
//!
//! assert_eq!(policy.resolve("name"), Access::READ);
//! assert_eq!(policy.resolve("anything"), Access::READWRITE);
//! ```

use std::fmt;

use indexmap::IndexMap;
use log::trace;

use crate::access::Access;
use crate::{Error, Result};

/// Key whose grant becomes the default for unlisted properties.
pub const WILDCARD: &str = "*";

/// Deferred permission specification.
pub type Producer = Box<dyn FnOnce() -> Result<PermissionSpec>>;

/// A permission specification as written by the caller.
#[derive(Default)]
pub enum PermissionSpec {
    /// No permissions given: everything is denied.
    #[default]
    Unspecified,

    /// Listed names get [`Access::ALL`]; everything else gets nothing.
    Allow(Vec<String>),

    /// Explicit grants. A [`WILDCARD`] entry sets the default.
    Grants(IndexMap<String, Access>),

    /// Computed on demand; invoked exactly once during normalization.
    Producer(Producer),
}

impl PermissionSpec {
    /// Allowlist form.
    pub fn allow<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Allow(names.into_iter().map(Into::into).collect())
    }

    /// Explicit grants form.
    pub fn grants<I, S>(grants: I) -> Self
    where
        I: IntoIterator<Item = (S, Access)>,
        S: Into<String>,
    {
        Self::Grants(grants.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Producer form.
    pub fn producer<F>(producer: F) -> Self
    where
        F: FnOnce() -> Result<PermissionSpec> + 'static,
    {
        Self::Producer(Box::new(producer))
    }

    /// Interpret a JSON value as a permission specification.
    ///
    /// `null` is [`PermissionSpec::Unspecified`], an array of strings is the
    /// allowlist form, and an object of name to access (bitmask integer or
    /// flag names) is the grants form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpec`] for any other shape, for non-string
    /// array entries, and for invalid access values.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(Self::Unspecified),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_owned).ok_or_else(|| {
                        Error::invalid_spec(format!("allowlist entries must be strings: {item}"))
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Allow),
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(name, access)| {
                    serde_json::from_value::<Access>(access.clone())
                        .map(|access| (name.clone(), access))
                        .map_err(|e| Error::invalid_spec(format!("grant for {name:?}: {e}")))
                })
                .collect::<Result<IndexMap<_, _>>>()
                .map(Self::Grants),
            other => Err(Error::invalid_spec(format!(
                "expected an array or object, found {other}"
            ))),
        }
    }

    /// Parse a JSON document as a permission specification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] for malformed JSON and
    /// [`Error::InvalidSpec`] for the shapes rejected by [`Self::from_json`].
    pub fn from_json_str(s: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(s).map_err(|e| Error::serialization(e.to_string()))?;
        Self::from_json(&value)
    }
}

impl fmt::Debug for PermissionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => f.write_str("Unspecified"),
            Self::Allow(names) => f.debug_tuple("Allow").field(names).finish(),
            Self::Grants(grants) => f.debug_tuple("Grants").field(grants).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl From<Vec<String>> for PermissionSpec {
    fn from(names: Vec<String>) -> Self {
        Self::Allow(names)
    }
}

impl From<&[&str]> for PermissionSpec {
    fn from(names: &[&str]) -> Self {
        Self::allow(names.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for PermissionSpec {
    fn from(names: [&str; N]) -> Self {
        Self::allow(names)
    }
}

impl From<IndexMap<String, Access>> for PermissionSpec {
    fn from(grants: IndexMap<String, Access>) -> Self {
        Self::Grants(grants)
    }
}

impl<const N: usize> From<[(&str, Access); N]> for PermissionSpec {
    fn from(grants: [(&str, Access); N]) -> Self {
        Self::grants(grants)
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Canonical, immutable permission policy.
///
/// [`Policy::resolve`] returns the explicit grant for a name when there is
/// one, and the default otherwise. An explicit grant always wins, even when
/// it is [`Access::NONE`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    grants: IndexMap<String, Access>,
    default: Access,
}

impl Policy {
    /// Build a policy directly from grants and a default.
    pub fn new(grants: IndexMap<String, Access>, default: Access) -> Self {
        Self { grants, default }
    }

    /// A policy that denies everything.
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// A policy that grants everything.
    pub fn allow_all() -> Self {
        Self::new(IndexMap::new(), Access::ALL)
    }

    /// Normalize a permission specification.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by a producer, and returns
    /// [`Error::InvalidSpec`] if a producer returns another producer.
    pub fn normalize(spec: PermissionSpec) -> Result<Self> {
        let policy = match spec {
            PermissionSpec::Producer(producer) => Self::from_static_spec(producer()?)?,
            other => Self::from_static_spec(other)?,
        };

        trace!(
            "normalized policy: {} grants, default {}",
            policy.grants.len(),
            policy.default
        );
        Ok(policy)
    }

    fn from_static_spec(spec: PermissionSpec) -> Result<Self> {
        match spec {
            PermissionSpec::Unspecified => Ok(Self::deny_all()),
            PermissionSpec::Allow(names) => Ok(Self::new(
                names.into_iter().map(|name| (name, Access::ALL)).collect(),
                Access::NONE,
            )),
            PermissionSpec::Grants(grants) => {
                let default = grants.get(WILDCARD).copied().unwrap_or(Access::NONE);
                Ok(Self::new(grants, default))
            }
            PermissionSpec::Producer(_) => Err(Error::invalid_spec(
                "permission producer returned another producer",
            )),
        }
    }

    /// Access granted on `name`.
    pub fn resolve(&self, name: &str) -> Access {
        self.grants.get(name).copied().unwrap_or(self.default)
    }

    /// Returns true if `name` is granted any bit of `required`.
    pub fn permits(&self, name: &str, required: Access) -> bool {
        self.resolve(name).permits(required)
    }

    /// Access applied to names without an explicit grant.
    pub fn default_access(&self) -> Access {
        self.default
    }

    /// Explicit grants, including any [`WILDCARD`] entry.
    pub fn grants(&self) -> &IndexMap<String, Access> {
        &self.grants
    }
}

impl TryFrom<PermissionSpec> for Policy {
    type Error = Error;

    fn try_from(spec: PermissionSpec) -> Result<Self> {
        Policy::normalize(spec)
    }
}
