//! Storage layer for Tandem
//!
//! JSON files under the data directory, one per aggregate, each written
//! atomically. [`Storage`] ties the repositories together with the audit
//! log and is the [`BudgetStore`] propagation runs against.

pub mod budgets;
pub mod file_io;
pub mod hierarchy;
pub mod init;
pub mod propagation;
pub mod transactions;

pub use budgets::BudgetRepository;
pub use file_io::{read_json, write_json_atomic};
pub use hierarchy::HierarchyRepository;
pub use init::initialize_storage;
pub use propagation::PropagationRepository;
pub use transactions::TransactionRepository;

use std::sync::PoisonError;

use serde::Serialize;
use tracing::debug;

use crate::audit::{generate_detailed_diff, AuditEntry, AuditLogger, EntityType};
use crate::config::paths::TandemPaths;
use crate::engine::{BudgetStore, PropagationMarker};
use crate::error::{TandemError, TandemResult};
use crate::models::{BudgetPeriod, CategoryBudget, CategoryId, SectorBudget};

pub(crate) fn poisoned<T>(e: PoisonError<T>) -> TandemError {
    TandemError::Storage(format!("Lock poisoned: {}", e))
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: TandemPaths,
    pub hierarchy: HierarchyRepository,
    pub budgets: BudgetRepository,
    pub transactions: TransactionRepository,
    pub propagation: PropagationRepository,
    audit: AuditLogger,
}

impl Storage {
    pub fn new(paths: TandemPaths) -> TandemResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            hierarchy: HierarchyRepository::new(paths.hierarchy_file()),
            budgets: BudgetRepository::new(paths.budgets_file()),
            transactions: TransactionRepository::new(paths.transactions_file()),
            propagation: PropagationRepository::new(paths.propagation_file()),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    pub fn paths(&self) -> &TandemPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn load_all(&self) -> TandemResult<()> {
        self.hierarchy.load()?;
        self.budgets.load()?;
        self.transactions.load()?;
        self.propagation.load()?;
        debug!(base = %self.paths.base_dir().display(), "storage loaded");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    // Audit helpers

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> TandemResult<()> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    /// Log an update; without an explicit summary the field diff is used
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        diff_summary: Option<String>,
    ) -> TandemResult<()> {
        let diff_summary = diff_summary.or_else(|| {
            let before = serde_json::to_value(before).ok()?;
            let after = serde_json::to_value(after).ok()?;
            generate_detailed_diff(&before, &after)
        });
        self.audit.log(&AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            diff_summary,
        ))
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> TandemResult<()> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }

    fn log_upsert<T: Serialize>(
        &self,
        entity_type: EntityType,
        id: String,
        label: String,
        stored: &T,
        previous: Option<&T>,
    ) -> TandemResult<()> {
        match previous {
            Some(before) => self.log_update(entity_type, id, Some(label), before, stored, None),
            None => self.log_create(entity_type, id, Some(label), stored),
        }
    }

    /// "Rent 2025-03"; falls back to the id when the category is gone
    pub(crate) fn category_budget_label(&self, budget: &CategoryBudget) -> TandemResult<String> {
        let name = self
            .hierarchy
            .get_category(budget.category_id)?
            .map(|c| c.name)
            .unwrap_or_else(|| budget.category_id.to_string());
        Ok(format!("{} {}", name, budget.period))
    }

    pub(crate) fn sector_budget_label(&self, budget: &SectorBudget) -> TandemResult<String> {
        let name = self
            .hierarchy
            .get_sector(budget.sector_id)?
            .map(|s| s.name)
            .unwrap_or_else(|| budget.sector_id.to_string());
        Ok(format!("{} {}", name, budget.period))
    }

    /// Upsert, persist and audit a category budget
    pub fn store_category_budget(&self, budget: CategoryBudget) -> TandemResult<CategoryBudget> {
        let (stored, previous) = self.budgets.upsert_category_budget(budget)?;
        self.budgets.save()?;
        self.log_upsert(
            EntityType::CategoryBudget,
            stored.id.to_string(),
            self.category_budget_label(&stored)?,
            &stored,
            previous.as_ref(),
        )?;
        Ok(stored)
    }

    /// Upsert, persist and audit a sector budget
    pub fn store_sector_budget(&self, budget: SectorBudget) -> TandemResult<SectorBudget> {
        let (stored, previous) = self.budgets.upsert_sector_budget(budget)?;
        self.budgets.save()?;
        self.log_upsert(
            EntityType::SectorBudget,
            stored.id.to_string(),
            self.sector_budget_label(&stored)?,
            &stored,
            previous.as_ref(),
        )?;
        Ok(stored)
    }
}

impl BudgetStore for Storage {
    fn category_budgets_for_period(&self, period: BudgetPeriod) -> TandemResult<Vec<CategoryBudget>> {
        self.budgets.category_budgets_for_period(period)
    }

    fn sector_budgets_for_period(&self, period: BudgetPeriod) -> TandemResult<Vec<SectorBudget>> {
        self.budgets.sector_budgets_for_period(period)
    }

    fn upsert_category_budget(&self, budget: CategoryBudget) -> TandemResult<CategoryBudget> {
        self.store_category_budget(budget)
    }

    fn ensure_sector_budget_placeholder(
        &self,
        category_id: CategoryId,
        period: BudgetPeriod,
    ) -> TandemResult<Option<SectorBudget>> {
        let Some(sector) = self.hierarchy.sector_of(category_id)? else {
            return Ok(None);
        };
        if self.budgets.get_sector_budget(sector.id, period)?.is_some() {
            return Ok(None);
        }

        debug!(sector = %sector.name, %period, "creating placeholder sector budget");
        self.store_sector_budget(SectorBudget::placeholder(sector.id, period))
            .map(Some)
    }

    fn delete_sector_budgets_for_period(&self, period: BudgetPeriod) -> TandemResult<usize> {
        let removed = self.budgets.delete_sector_budgets_for_period(period)?;
        self.budgets.save()?;

        let entries = removed
            .iter()
            .map(|b| {
                Ok(AuditEntry::delete(
                    EntityType::SectorBudget,
                    b.id.to_string(),
                    Some(self.sector_budget_label(b)?),
                    b,
                ))
            })
            .collect::<TandemResult<Vec<_>>>()?;
        self.audit.log_batch(&entries)?;

        Ok(removed.len())
    }

    fn upsert_sector_budget(&self, budget: SectorBudget) -> TandemResult<SectorBudget> {
        self.store_sector_budget(budget)
    }

    fn save_marker(&self, marker: &PropagationMarker) -> TandemResult<()> {
        self.propagation.record(marker.clone())
    }

    fn clear_marker(&self, target: BudgetPeriod) -> TandemResult<()> {
        self.propagation.clear(target)
    }

    fn pending_markers(&self) -> TandemResult<Vec<PropagationMarker>> {
        self.propagation.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use crate::engine::propagation::carry_forward;
    use crate::models::{BudgetAmount, Category, Money, Sector};
    use tempfile::TempDir;

    fn storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TandemPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_storage_creation() {
        let (storage, temp) = storage();
        assert!(temp.path().join("data").exists());
        assert!(!storage.is_initialized());
    }

    #[test]
    fn test_store_category_budget_audits_create_then_update() {
        let (storage, _temp) = storage();
        let rent = Category::new("Rent");
        storage.hierarchy.upsert_category(rent.clone()).unwrap();
        let jan = BudgetPeriod::monthly(2025, 1);

        storage
            .store_category_budget(CategoryBudget::new(
                rent.id,
                jan,
                BudgetAmount::absolute(Money::from_units(1000)),
            ))
            .unwrap();
        storage
            .store_category_budget(CategoryBudget::new(
                rent.id,
                jan,
                BudgetAmount::absolute(Money::from_units(1100)),
            ))
            .unwrap();

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, Operation::Create);
        assert_eq!(entries[1].operation, Operation::Update);
        assert_eq!(entries[1].entity_name.as_deref(), Some("Rent 2025-01"));
        let diff = entries[1].diff_summary.as_deref().unwrap();
        assert!(diff.contains("amount.amount: 100000 -> 110000"));
        assert!(!diff.contains("id:"));
    }

    #[test]
    fn test_placeholder_only_for_assigned_categories() {
        let (storage, _temp) = storage();
        let rent = Category::new("Rent");
        let gifts = Category::new("Gifts");
        let home = Sector::with_categories("Home", [rent.id]);
        storage.hierarchy.upsert_sector(home.clone()).unwrap();
        let jan = BudgetPeriod::monthly(2025, 1);

        let created = storage.ensure_sector_budget_placeholder(rent.id, jan).unwrap();
        assert!(created.unwrap().auto_rollup);
        assert!(storage.ensure_sector_budget_placeholder(rent.id, jan).unwrap().is_none());
        assert!(storage.ensure_sector_budget_placeholder(gifts.id, jan).unwrap().is_none());
    }

    #[test]
    fn test_carry_forward_persists_to_disk() {
        let (storage, temp) = storage();
        let rent = Category::new("Rent");
        let home = Sector::with_categories("Home", [rent.id]);
        storage.hierarchy.upsert_category(rent.clone()).unwrap();
        storage.hierarchy.upsert_sector(home.clone()).unwrap();
        storage.hierarchy.save().unwrap();

        let jan = BudgetPeriod::monthly(2025, 1);
        storage
            .store_category_budget(CategoryBudget::new(
                rent.id,
                jan,
                BudgetAmount::absolute(Money::from_units(1000)),
            ))
            .unwrap();
        storage
            .store_sector_budget(SectorBudget::new(
                home.id,
                jan,
                BudgetAmount::absolute(Money::from_units(1500)),
                false,
            ))
            .unwrap();

        carry_forward(&storage, jan.next()).unwrap();

        let reopened =
            Storage::new(TandemPaths::with_base_dir(temp.path().to_path_buf())).unwrap();
        reopened.load_all().unwrap();
        let feb_sector = reopened
            .budgets
            .get_sector_budget(home.id, jan.next())
            .unwrap()
            .unwrap();
        assert!(!feb_sector.auto_rollup);
        assert_eq!(feb_sector.total(), Money::from_units(1500));
        assert!(reopened.propagation.pending().unwrap().is_empty());
    }
}
