//! Strongly-typed ID wrappers for all entity types
//!
//! Newtype wrappers keep sector, category, budget and transaction ids from
//! being mixed up at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse an ID from a full UUID string
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, &self.0.to_string()[..8])
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(SectorId, "sec-");
define_id!(CategoryId, "cat-");
define_id!(BudgetId, "bud-");
define_id!(TransactionId, "txn-");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        let id = SectorId::new();
        let display = id.to_string();
        assert!(display.starts_with("sec-"));
        assert_eq!(display.len(), 12);
    }

    #[test]
    fn test_id_serializes_as_bare_uuid() {
        let id = BudgetId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
        let back: BudgetId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_from_str_accepts_prefixed_full_uuid() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let plain: CategoryId = uuid_str.parse().unwrap();
        let prefixed: CategoryId = format!("cat-{}", uuid_str).parse().unwrap();
        assert_eq!(plain, prefixed);
        assert!("cat-550e8400".parse::<CategoryId>().is_err());
    }
}
