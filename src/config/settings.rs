//! User settings for Tandem
//!
//! Holds the names of the two participants, the warning thresholds used by
//! the progress bars and the currency symbol used for display.

use serde::{Deserialize, Serialize};

use super::paths::TandemPaths;
use crate::engine::threshold::Thresholds;
use crate::error::TandemError;
use crate::models::UserSlot;

/// User settings for Tandem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Display name of the first participant
    #[serde(default = "default_user1_name")]
    pub user1_name: String,

    /// Display name of the second participant
    #[serde(default = "default_user2_name")]
    pub user2_name: String,

    /// Default currency symbol
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Warning / over thresholds, in percent of budget
    #[serde(default)]
    pub thresholds: Thresholds,
}

fn default_schema_version() -> u32 {
    1
}

fn default_user1_name() -> String {
    "User 1".to_string()
}

fn default_user2_name() -> String {
    "User 2".to_string()
}

fn default_currency() -> String {
    "$".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            user1_name: default_user1_name(),
            user2_name: default_user2_name(),
            currency_symbol: default_currency(),
            thresholds: Thresholds::default(),
        }
    }
}

impl Settings {
    /// Display name for a participant
    pub fn user_name(&self, user: UserSlot) -> &str {
        match user {
            UserSlot::User1 => &self.user1_name,
            UserSlot::User2 => &self.user2_name,
        }
    }

    /// Resolve a participant from a name or a slot keyword (`user1`, `user2`)
    pub fn resolve_user(&self, name: &str) -> Option<UserSlot> {
        let name = name.trim();
        if name.eq_ignore_ascii_case(&self.user1_name) {
            return Some(UserSlot::User1);
        }
        if name.eq_ignore_ascii_case(&self.user2_name) {
            return Some(UserSlot::User2);
        }
        name.parse().ok()
    }

    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &TandemPaths) -> Result<Self, TandemError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| TandemError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| TandemError::Config(format!("Failed to parse settings file: {}", e)))?;

        settings
            .thresholds
            .validate()
            .map_err(|e| TandemError::Config(e.to_string()))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &TandemPaths) -> Result<(), TandemError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| TandemError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| TandemError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
