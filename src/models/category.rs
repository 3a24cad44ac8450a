//! Category model
//!
//! Categories are the spending classifications transactions attach to.
//! Sector membership is recorded on the [`Sector`](super::Sector), not here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::CategoryId;

/// Maximum length of sector and category names
pub const MAX_NAME_LEN: usize = 50;

/// A spending category (e.g., "Groceries")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,

    pub name: String,

    /// Opaque reference to an icon or image; never interpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryId::new(),
            name: name.into(),
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), NameValidationError> {
        validate_name(&self.name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), NameValidationError> {
    if name.trim().is_empty() {
        return Err(NameValidationError::EmptyName);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(NameValidationError::NameTooLong(name.len()));
    }
    Ok(())
}

/// Validation errors for sector and category names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    EmptyName,
    NameTooLong(usize),
}

impl fmt::Display for NameValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Name too long ({} chars, max {})", len, MAX_NAME_LEN)
            }
        }
    }
}

impl std::error::Error for NameValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        let mut category = Category::new("Groceries");
        assert!(category.validate().is_ok());

        category.rename("   ");
        assert_eq!(category.validate(), Err(NameValidationError::EmptyName));

        category.rename("a".repeat(51));
        assert_eq!(
            category.validate(),
            Err(NameValidationError::NameTooLong(51))
        );
    }

    #[test]
    fn test_image_is_omitted_when_absent() {
        let category = Category::new("Rent");
        let json = serde_json::to_string(&category).unwrap();
        assert!(!json.contains("image"));
    }
}
