//! The two participants sharing a budget

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two people sharing the budget
///
/// Display names live in [`crate::config::Settings`]; data rows only carry the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserSlot {
    User1,
    User2,
}

impl UserSlot {
    pub fn all() -> [Self; 2] {
        [Self::User1, Self::User2]
    }

    /// The other participant
    pub fn other(&self) -> Self {
        match self {
            Self::User1 => Self::User2,
            Self::User2 => Self::User1,
        }
    }
}

impl fmt::Display for UserSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User1 => write!(f, "user1"),
            Self::User2 => write!(f, "user2"),
        }
    }
}

impl FromStr for UserSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user1" | "1" => Ok(Self::User1),
            "user2" | "2" => Ok(Self::User2),
            other => Err(format!("Unknown user: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_other() {
        assert_eq!("User1".parse::<UserSlot>().unwrap(), UserSlot::User1);
        assert_eq!("2".parse::<UserSlot>().unwrap(), UserSlot::User2);
        assert!("3".parse::<UserSlot>().is_err());
        assert_eq!(UserSlot::User1.other(), UserSlot::User2);
    }
}
