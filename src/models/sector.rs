//! Sector model
//!
//! A sector is the top level of the budget hierarchy and owns a set of
//! categories. A category belongs to at most one sector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::category::{validate_name, NameValidationError};
use super::ids::{CategoryId, SectorId};

/// A group of categories budgeted together (e.g., "Home")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sector {
    pub id: SectorId,

    pub name: String,

    /// Categories owned by this sector
    #[serde(default)]
    pub category_ids: BTreeSet<CategoryId>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Sector {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SectorId::new(),
            name: name.into(),
            category_ids: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Build a sector that already owns some categories
    pub fn with_categories(
        name: impl Into<String>,
        category_ids: impl IntoIterator<Item = CategoryId>,
    ) -> Self {
        let mut sector = Self::new(name);
        sector.category_ids = category_ids.into_iter().collect();
        sector
    }

    pub fn contains(&self, category_id: CategoryId) -> bool {
        self.category_ids.contains(&category_id)
    }

    /// Add a category; returns false if it was already a member
    pub fn add_category(&mut self, category_id: CategoryId) -> bool {
        let added = self.category_ids.insert(category_id);
        if added {
            self.updated_at = Utc::now();
        }
        added
    }

    /// Remove a category; returns false if it wasn't a member
    pub fn remove_category(&mut self, category_id: CategoryId) -> bool {
        let removed = self.category_ids.remove(&category_id);
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    pub fn validate(&self) -> Result<(), NameValidationError> {
        validate_name(&self.name)
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_is_a_set() {
        let rent = CategoryId::new();
        let mut home = Sector::new("Home");

        assert!(home.add_category(rent));
        assert!(!home.add_category(rent));
        assert_eq!(home.category_ids.len(), 1);
        assert!(home.contains(rent));

        assert!(home.remove_category(rent));
        assert!(!home.remove_category(rent));
    }

    #[test]
    fn test_serialization_keeps_members() {
        let home = Sector::with_categories("Home", [CategoryId::new(), CategoryId::new()]);
        let json = serde_json::to_string(&home).unwrap();
        let back: Sector = serde_json::from_str(&json).unwrap();
        assert_eq!(back.category_ids, home.category_ids);
    }
}
