//! Strongly-typed identifiers for domain entities
//!
//! Parties and transfers are identified by UUID newtypes; invoices carry a
//! dense sequential number assigned by the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// The null identifier (all zero bits)
            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Returns true for the null identifier
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// An authenticated participant address (buyer, supplier, right holder)
define_id!(PartyId, "PTY");

// A settlement transfer executed on release
define_id!(TransferId, "TRF");

/// Sequential invoice number
///
/// Invoice numbers start at 1 and are never reused. `0` is not a valid
/// invoice number and is never produced by [`InvoiceId::first`]/[`InvoiceId::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(u64);

impl InvoiceId {
    /// The number assigned to the first invoice of a ledger
    pub fn first() -> Self {
        Self(1)
    }

    /// Wraps a raw invoice number
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the following invoice number
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw number
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns the identifier prefix for display
    pub fn prefix() -> &'static str {
        "INV"
    }
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INV-{}", self.0)
    }
}

impl FromStr for InvoiceId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("INV-").unwrap_or(s);
        Ok(Self(digits.parse()?))
    }
}

impl From<u64> for InvoiceId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<InvoiceId> for u64 {
    fn from(id: InvoiceId) -> u64 {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_id_display() {
        let id = PartyId::new();
        let display = id.to_string();
        assert!(display.starts_with("PTY-"));
    }

    #[test]
    fn test_id_parsing() {
        let original = PartyId::new();
        let parsed: PartyId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_nil_party() {
        assert!(PartyId::nil().is_nil());
        assert!(!PartyId::new().is_nil());
    }

    #[test]
    fn test_invoice_sequence() {
        let first = InvoiceId::first();
        assert_eq!(first.value(), 1);
        assert_eq!(first.next().value(), 2);
        assert_eq!(first.to_string(), "INV-1");
    }
}
