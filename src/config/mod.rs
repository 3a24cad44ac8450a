//! Configuration module for Tandem
//!
//! - path resolution for the data directory
//! - user settings persistence (participants, thresholds)

pub mod paths;
pub mod settings;

pub use paths::TandemPaths;
pub use settings::Settings;
