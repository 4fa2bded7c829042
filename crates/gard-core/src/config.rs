//! Loading permission specifications from configuration.
//!
//! Provides [`PolicyConfig`], which loads from TOML files, environment
//! variables, and defaults using the `confyg` crate.
//!
//! A policy file uses exactly one of the two declarative forms:
//!
//! ```toml
//! # allowlist form: listed names get ALL, everything else NONE
//! allow = ["name", "greet"]
//! ```
//!
//! ```toml
//! # grants form: integer masks or flag names; "*" sets the default
//! [grants]
//! name = "READ|WRITE"
//! secret = 0
//! "*" = "READ"
//! ```
//!
//! # Loading Priority
//!
//! 1. Explicit path argument
//! 2. `GARD_POLICY` environment variable
//! 3. XDG default: `~/.config/gard/policy.toml`
//! 4. Built-in defaults (deny everything)

use std::path::{Path, PathBuf};

use confyg::{Confygery, env};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::access::Access;
use crate::policy::{PermissionSpec, Policy};
use crate::{Error, Result};

/// Environment variable naming the policy file.
pub const POLICY_ENV_VAR: &str = "GARD_POLICY";

/// Declarative permission specification, as stored in a policy file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Allowlist form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow: Option<Vec<String>>,

    /// Grants form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grants: Option<IndexMap<String, Access>>,
}

impl PolicyConfig {
    /// Load configuration from file, environment, and defaults.
    ///
    /// A missing file is not an error; the environment overlay still applies.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                debug!("loading policy from {}", path.display());
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let mut env_opts = env::Options::with_top_level("GARD");
        env_opts.add_section("grants");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let mut config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        // The env section always materializes, even with no GARD_GRANTS_* set.
        config.grants = config.grants.filter(|grants| !grants.is_empty());

        Ok(config)
    }

    /// Resolve the policy file path from the explicit argument, env var, or
    /// XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var(POLICY_ENV_VAR) {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default policy path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("gard").join("policy.toml"))
    }

    /// Read a policy file without any environment overlay.
    ///
    /// Files ending in `.json` hold a bare permission specification (an
    /// array or an object, as accepted by [`PermissionSpec::from_json`]);
    /// anything else is parsed as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            match PermissionSpec::from_json_str(&contents)? {
                PermissionSpec::Allow(names) => Ok(Self::allow(names)),
                PermissionSpec::Grants(grants) => Ok(Self::grants(grants)),
                _ => Ok(Self::default()),
            }
        } else {
            Self::from_toml_str(&contents)
        }
    }

    /// Parse a TOML policy document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Allowlist config.
    pub fn allow(names: Vec<String>) -> Self {
        Self {
            allow: Some(names),
            grants: None,
        }
    }

    /// Grants config.
    pub fn grants(grants: IndexMap<String, Access>) -> Self {
        Self {
            allow: None,
            grants: Some(grants),
        }
    }

    /// Convert into a permission specification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if both forms are present, since the two
    /// disagree on how unlisted names default.
    pub fn into_spec(self) -> Result<PermissionSpec> {
        match (self.allow, self.grants) {
            (Some(_), Some(_)) => Err(Error::config(
                "policy declares both `allow` and `grants`; use one form",
            )),
            (Some(names), None) => Ok(PermissionSpec::Allow(names)),
            (None, Some(grants)) => Ok(PermissionSpec::Grants(grants)),
            (None, None) => Ok(PermissionSpec::Unspecified),
        }
    }

    /// Convert and normalize into a [`Policy`].
    pub fn into_policy(self) -> Result<Policy> {
        Policy::normalize(self.into_spec()?)
    }
}

// ============================================================================
// Tests
// ============================================================================
