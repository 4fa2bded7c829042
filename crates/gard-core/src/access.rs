//! Access bitmask and operation tags.
//!
//! [`Access`] is the per-property grant. Flags combine with `|`, and a check
//! passes when the granted mask shares at least one bit with the required
//! mask (see [`Access::permits`]).
//!
//! [`Operation`] identifies which mediated operation was denied when the
//! forbidden callback runs.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

bitflags! {
    /// Access rights granted on a single property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Access: u8 {
        /// No operation permitted.
        const NONE = 0;

        /// Get, existence check, enumeration and calls.
        const READ = 1 << 0;

        /// Set.
        const WRITE = 1 << 1;

        /// Delete.
        const DELETE = 1 << 2;

        /// `READ | WRITE`.
        const READWRITE = Self::READ.bits() | Self::WRITE.bits();

        /// `READ | WRITE | DELETE`.
        const ALL = Self::READ.bits() | Self::WRITE.bits() | Self::DELETE.bits();

        /// Methods are read before they are invoked, so calling needs `READ`.
        const CALL = Self::READ.bits();
    }
}

impl Access {
    /// Returns true if `self` grants any bit of `required`.
    pub fn permits(self, required: Access) -> bool {
        self.intersects(required)
    }

    /// Build an access mask from raw bits, rejecting unknown bits.
    pub fn try_from_bits(bits: u64) -> Result<Self> {
        u8::try_from(bits)
            .ok()
            .and_then(Access::from_bits)
            .ok_or_else(|| Error::invalid_spec(format!("access bits out of range: {bits}")))
    }

    fn flag_named(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "NONE" => Some(Self::NONE),
            "READ" | "CALL" => Some(Self::READ),
            "WRITE" => Some(Self::WRITE),
            "DELETE" => Some(Self::DELETE),
            "READWRITE" => Some(Self::READWRITE),
            "ALL" => Some(Self::ALL),
            _ => None,
        }
    }
}

impl FromStr for Access {
    type Err = Error;

    /// Parse a flag expression such as `"READ|WRITE"` or a decimal mask.
    ///
    /// Separators `|`, `+` and `,` are accepted; names are case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_spec("empty access expression"));
        }
        if let Ok(bits) = trimmed.parse::<u64>() {
            return Access::try_from_bits(bits);
        }

        trimmed
            .split(['|', '+', ','])
            .map(str::trim)
            .try_fold(Access::NONE, |acc, name| {
                Access::flag_named(name)
                    .map(|flag| acc | flag)
                    .ok_or_else(|| Error::invalid_spec(format!("unknown access flag: {name:?}")))
            })
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names: Vec<&str> = [
            (Access::READ, "READ"),
            (Access::WRITE, "WRITE"),
            (Access::DELETE, "DELETE"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();
        f.write_str(&names.join("|"))
    }
}

impl Serialize for Access {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for Access {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct AccessVisitor;

        impl Visitor<'_> for AccessVisitor {
            type Value = Access;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an access bitmask (0-7) or flag names like \"READ|WRITE\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Access, E> {
                Access::try_from_bits(v).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Access, E> {
                let bits = u64::try_from(v)
                    .map_err(|_| E::custom(format!("negative access bits: {v}")))?;
                self.visit_u64(bits)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Access, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AccessVisitor)
    }
}

// ============================================================================
// Operation tags
// ============================================================================

/// Tag passed to the forbidden callback for a denied get.
pub const GET: &str = "get";

/// Tag passed to the forbidden callback for a denied set.
pub const SET: &str = "set";

/// Tag passed to the forbidden callback for a denied delete.
pub const DEL: &str = "delete";

/// The mediated operations that can be reported as forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Property read.
    Get,
    /// Property write.
    Set,
    /// Property removal.
    Delete,
}

impl Operation {
    /// The string tag for this operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Get => GET,
            Operation::Set => SET,
            Operation::Delete => DEL,
        }
    }

    /// The access bit this operation requires.
    pub fn required(self) -> Access {
        match self {
            Operation::Get => Access::READ,
            Operation::Set => Access::WRITE,
            Operation::Delete => Access::DELETE,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_access_constant_values() {
        assert_eq!(Access::NONE.bits(), 0);
        assert_eq!(Access::READ.bits(), 1);
        assert_eq!(Access::WRITE.bits(), 2);
        assert_eq!(Access::DELETE.bits(), 4);
        assert_eq!(Access::READWRITE.bits(), 3);
        assert_eq!(Access::ALL.bits(), 7);
        assert_eq!(Access::CALL, Access::READ);
    }

    #[test]
    fn test_access_permits() {
        assert!(Access::ALL.permits(Access::DELETE));
        assert!(Access::READWRITE.permits(Access::WRITE));
        assert!(!Access::READWRITE.permits(Access::DELETE));
        assert!(!Access::NONE.permits(Access::READ));
        assert!(!Access::ALL.permits(Access::NONE));
    }

    #[test]
    fn test_access_from_str_names() {
        assert_eq!("READ|WRITE".parse::<Access>().unwrap(), Access::READWRITE);
        assert_eq!("read + delete".parse::<Access>().unwrap().bits(), 5);
        assert_eq!("call".parse::<Access>().unwrap(), Access::READ);
        assert_eq!("ALL".parse::<Access>().unwrap(), Access::ALL);
        assert_eq!("none".parse::<Access>().unwrap(), Access::NONE);
    }

    #[test]
    fn test_access_from_str_digits() {
        assert_eq!("6".parse::<Access>().unwrap().bits(), 6);
        assert!("8".parse::<Access>().is_err());
    }

    #[test]
    fn test_access_from_str_rejects_unknown() {
        let err = "READ|EXECUTE".parse::<Access>().unwrap_err();
        assert!(matches!(err, Error::InvalidSpec(_)));
        assert!("".parse::<Access>().is_err());
    }

    #[test]
    fn test_access_try_from_bits() {
        assert_eq!(Access::try_from_bits(7).unwrap(), Access::ALL);
        assert!(Access::try_from_bits(16).is_err());
        assert!(Access::try_from_bits(300).is_err());
    }

    #[test]
    fn test_access_display() {
        assert_eq!(Access::NONE.to_string(), "NONE");
        assert_eq!(Access::READWRITE.to_string(), "READ|WRITE");
        assert_eq!(Access::ALL.to_string(), "READ|WRITE|DELETE");
    }

    #[test]
    fn test_access_deserialize() {
        let mask: Access = serde_json::from_str("5").unwrap();
        assert_eq!(mask, Access::READ | Access::DELETE);

        let mask: Access = serde_json::from_str("\"WRITE\"").unwrap();
        assert_eq!(mask, Access::WRITE);

        assert!(serde_json::from_str::<Access>("-1").is_err());
        assert!(serde_json::from_str::<Access>("true").is_err());
    }

    #[test]
    fn test_operation_tags() {
        assert_eq!(Operation::Get.as_str(), "get");
        assert_eq!(Operation::Set.as_str(), "set");
        assert_eq!(Operation::Delete.as_str(), DEL);
        assert_eq!(Operation::Delete.to_string(), "delete");
        assert_eq!(Operation::Set.required(), Access::WRITE);
    }
}
