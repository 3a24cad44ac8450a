//! Tandem - shared two-person budgeting
//!
//! Two people track shared spending against a two-level budget of sectors
//! and categories, per month and per year, with per-person split budgets
//! and warning thresholds.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (sectors, categories, budgets, transactions)
//! - `engine`: Pure budget logic (classification, totals, thresholds,
//!   propagation, projection)
//! - `storage`: JSON file storage layer
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use tandem_budget::config::{TandemPaths, Settings};
//! use tandem_budget::services::BudgetService;
//! use tandem_budget::storage::Storage;
//!
//! let paths = TandemPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths)?;
//! storage.load_all()?;
//!
//! let overview = BudgetService::new(&storage, &settings).overview(period)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{TandemError, TandemResult};
