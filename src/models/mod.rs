//! Core data models for Tandem
//!
//! Sectors group categories; category and sector budgets are kept per
//! period; transactions record what the two participants spent.

pub mod budget;
pub mod category;
pub mod ids;
pub mod money;
pub mod period;
pub mod sector;
pub mod transaction;
pub mod user;

pub use budget::{BudgetAmount, CategoryBudget, SectorBudget};
pub use category::Category;
pub use ids::{BudgetId, CategoryId, SectorId, TransactionId};
pub use money::Money;
pub use period::BudgetPeriod;
pub use sector::Sector;
pub use transaction::{Transaction, TransactionType};
pub use user::UserSlot;
