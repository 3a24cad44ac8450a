//! Service layer for Tandem
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, audit logging, and cross-entity operations.

pub mod budget;
pub mod hierarchy;
pub mod period;
pub mod transaction;

pub use budget::{BudgetOverview, BudgetService, BudgetWarning, SectorBudgetMode, WarningKind, YearlyOverview};
pub use hierarchy::{HierarchyService, HierarchyTree};
pub use period::PeriodService;
pub use transaction::{CreateTransactionInput, TransactionFilter, TransactionService};
