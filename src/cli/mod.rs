//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod budget;
pub mod category;
pub mod config;
pub mod sector;
pub mod transaction;

pub use budget::{handle_budget_command, BudgetCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use config::{handle_config_command, ConfigArgs};
pub use sector::{handle_sector_command, SectorCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};
