//! Category and sector budget repository
//!
//! Rows are keyed by (owner, period), so each category and each sector has
//! at most one budget per period. Upserting over an existing key keeps that
//! row's id and creation time.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::TandemResult;
use crate::models::{BudgetPeriod, CategoryBudget, CategoryId, SectorBudget, SectorId};

use super::file_io::{read_json, write_json_atomic};
use super::poisoned;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BudgetData {
    #[serde(default)]
    category_budgets: Vec<CategoryBudget>,
    #[serde(default)]
    sector_budgets: Vec<SectorBudget>,
}

pub struct BudgetRepository {
    path: PathBuf,
    category_budgets: RwLock<HashMap<(CategoryId, BudgetPeriod), CategoryBudget>>,
    sector_budgets: RwLock<HashMap<(SectorId, BudgetPeriod), SectorBudget>>,
}

impl BudgetRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            category_budgets: RwLock::new(HashMap::new()),
            sector_budgets: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> TandemResult<()> {
        let file_data: BudgetData = read_json(&self.path)?;

        let mut category_budgets = self.category_budgets.write().map_err(poisoned)?;
        let mut sector_budgets = self.sector_budgets.write().map_err(poisoned)?;

        *category_budgets = file_data
            .category_budgets
            .into_iter()
            .map(|b| ((b.category_id, b.period), b))
            .collect();
        *sector_budgets = file_data
            .sector_budgets
            .into_iter()
            .map(|b| ((b.sector_id, b.period), b))
            .collect();

        Ok(())
    }

    pub fn save(&self) -> TandemResult<()> {
        let mut category_budgets = self.all_category_budgets()?;
        category_budgets.sort_by(|a, b| a.period.cmp(&b.period).then(a.created_at.cmp(&b.created_at)));
        let mut sector_budgets = self.all_sector_budgets()?;
        sector_budgets.sort_by(|a, b| a.period.cmp(&b.period).then(a.created_at.cmp(&b.created_at)));

        write_json_atomic(
            &self.path,
            &BudgetData {
                category_budgets,
                sector_budgets,
            },
        )
    }

    // Category budgets

    pub fn get_category_budget(
        &self,
        category_id: CategoryId,
        period: BudgetPeriod,
    ) -> TandemResult<Option<CategoryBudget>> {
        let rows = self.category_budgets.read().map_err(poisoned)?;
        Ok(rows.get(&(category_id, period)).cloned())
    }

    pub fn all_category_budgets(&self) -> TandemResult<Vec<CategoryBudget>> {
        let rows = self.category_budgets.read().map_err(poisoned)?;
        Ok(rows.values().cloned().collect())
    }

    pub fn category_budgets_for_period(&self, period: BudgetPeriod) -> TandemResult<Vec<CategoryBudget>> {
        let rows = self.category_budgets.read().map_err(poisoned)?;
        let mut list: Vec<_> = rows.values().filter(|b| b.period == period).cloned().collect();
        list.sort_by_key(|b| b.created_at);
        Ok(list)
    }

    /// Insert `budget`, or overwrite the amount of the existing row for its
    /// key. Returns the stored row and the row it replaced.
    pub fn upsert_category_budget(
        &self,
        mut budget: CategoryBudget,
    ) -> TandemResult<(CategoryBudget, Option<CategoryBudget>)> {
        let mut rows = self.category_budgets.write().map_err(poisoned)?;
        let key = (budget.category_id, budget.period);
        let previous = rows.get(&key).cloned();
        if let Some(existing) = &previous {
            budget.id = existing.id;
            budget.created_at = existing.created_at;
        }
        rows.insert(key, budget.clone());
        Ok((budget, previous))
    }

    pub fn delete_category_budget(
        &self,
        category_id: CategoryId,
        period: BudgetPeriod,
    ) -> TandemResult<Option<CategoryBudget>> {
        let mut rows = self.category_budgets.write().map_err(poisoned)?;
        Ok(rows.remove(&(category_id, period)))
    }

    /// Drop every period's budget for a category
    pub fn delete_category_budgets_for_category(&self, category_id: CategoryId) -> TandemResult<Vec<CategoryBudget>> {
        let mut rows = self.category_budgets.write().map_err(poisoned)?;
        let keys: Vec<_> = rows.keys().filter(|(id, _)| *id == category_id).copied().collect();
        Ok(keys.iter().filter_map(|k| rows.remove(k)).collect())
    }

    // Sector budgets

    pub fn get_sector_budget(
        &self,
        sector_id: SectorId,
        period: BudgetPeriod,
    ) -> TandemResult<Option<SectorBudget>> {
        let rows = self.sector_budgets.read().map_err(poisoned)?;
        Ok(rows.get(&(sector_id, period)).cloned())
    }

    pub fn all_sector_budgets(&self) -> TandemResult<Vec<SectorBudget>> {
        let rows = self.sector_budgets.read().map_err(poisoned)?;
        Ok(rows.values().cloned().collect())
    }

    pub fn sector_budgets_for_period(&self, period: BudgetPeriod) -> TandemResult<Vec<SectorBudget>> {
        let rows = self.sector_budgets.read().map_err(poisoned)?;
        let mut list: Vec<_> = rows.values().filter(|b| b.period == period).cloned().collect();
        list.sort_by_key(|b| b.created_at);
        Ok(list)
    }

    pub fn upsert_sector_budget(
        &self,
        mut budget: SectorBudget,
    ) -> TandemResult<(SectorBudget, Option<SectorBudget>)> {
        let mut rows = self.sector_budgets.write().map_err(poisoned)?;
        let key = (budget.sector_id, budget.period);
        let previous = rows.get(&key).cloned();
        if let Some(existing) = &previous {
            budget.id = existing.id;
            budget.created_at = existing.created_at;
        }
        rows.insert(key, budget.clone());
        Ok((budget, previous))
    }

    pub fn delete_sector_budget(
        &self,
        sector_id: SectorId,
        period: BudgetPeriod,
    ) -> TandemResult<Option<SectorBudget>> {
        let mut rows = self.sector_budgets.write().map_err(poisoned)?;
        Ok(rows.remove(&(sector_id, period)))
    }

    /// Remove every sector budget of `period`, returning what was removed
    pub fn delete_sector_budgets_for_period(&self, period: BudgetPeriod) -> TandemResult<Vec<SectorBudget>> {
        let mut rows = self.sector_budgets.write().map_err(poisoned)?;
        let keys: Vec<_> = rows.keys().filter(|(_, p)| *p == period).copied().collect();
        Ok(keys.iter().filter_map(|k| rows.remove(k)).collect())
    }

    pub fn delete_sector_budgets_for_sector(&self, sector_id: SectorId) -> TandemResult<Vec<SectorBudget>> {
        let mut rows = self.sector_budgets.write().map_err(poisoned)?;
        let keys: Vec<_> = rows.keys().filter(|(id, _)| *id == sector_id).copied().collect();
        Ok(keys.iter().filter_map(|k| rows.remove(k)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetAmount, Money};
    use tempfile::TempDir;

    fn repo() -> (BudgetRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let repo = BudgetRepository::new(temp_dir.path().join("budgets.json"));
        (repo, temp_dir)
    }

    fn jan() -> BudgetPeriod {
        BudgetPeriod::monthly(2025, 1)
    }

    fn absolute(units: i64) -> BudgetAmount {
        BudgetAmount::absolute(Money::from_units(units))
    }

    #[test]
    fn test_upsert_keeps_identity_of_existing_row() {
        let (repo, _temp) = repo();
        let category_id = CategoryId::new();

        let (first, previous) = repo
            .upsert_category_budget(CategoryBudget::new(category_id, jan(), absolute(100)))
            .unwrap();
        assert!(previous.is_none());

        let (second, previous) = repo
            .upsert_category_budget(CategoryBudget::new(category_id, jan(), absolute(250)))
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(previous.unwrap().amount, absolute(100));

        let rows = repo.category_budgets_for_period(jan()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, absolute(250));
    }

    #[test]
    fn test_delete_sector_budgets_for_period_leaves_other_periods() {
        let (repo, _temp) = repo();
        let home = SectorId::new();
        let food = SectorId::new();
        repo.upsert_sector_budget(SectorBudget::placeholder(home, jan())).unwrap();
        repo.upsert_sector_budget(SectorBudget::placeholder(food, jan())).unwrap();
        repo.upsert_sector_budget(SectorBudget::placeholder(home, jan().next())).unwrap();

        let removed = repo.delete_sector_budgets_for_period(jan()).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(repo.sector_budgets_for_period(jan()).unwrap().is_empty());
        assert!(repo.get_sector_budget(home, jan().next()).unwrap().is_some());
    }

    #[test]
    fn test_save_and_reload() {
        let (repo, temp) = repo();
        let category_id = CategoryId::new();
        let sector_id = SectorId::new();
        repo.upsert_category_budget(CategoryBudget::new(
            category_id,
            BudgetPeriod::yearly(2025),
            BudgetAmount::split(Money::from_units(600), Money::from_units(600)),
        ))
        .unwrap();
        repo.upsert_sector_budget(SectorBudget::new(sector_id, jan(), absolute(1500), false))
            .unwrap();
        repo.save().unwrap();

        let reloaded = BudgetRepository::new(temp.path().join("budgets.json"));
        reloaded.load().unwrap();

        let yearly = reloaded
            .get_category_budget(category_id, BudgetPeriod::yearly(2025))
            .unwrap()
            .unwrap();
        assert!(yearly.amount.is_split());
        let sector = reloaded.get_sector_budget(sector_id, jan()).unwrap().unwrap();
        assert!(!sector.auto_rollup);
        assert_eq!(sector.total(), Money::from_units(1500));
    }

    #[test]
    fn test_delete_for_owner() {
        let (repo, _temp) = repo();
        let category_id = CategoryId::new();
        for period in [jan(), jan().next(), BudgetPeriod::yearly(2025)] {
            repo.upsert_category_budget(CategoryBudget::new(category_id, period, absolute(10)))
                .unwrap();
        }
        repo.upsert_category_budget(CategoryBudget::new(CategoryId::new(), jan(), absolute(10)))
            .unwrap();

        assert_eq!(repo.delete_category_budgets_for_category(category_id).unwrap().len(), 3);
        assert_eq!(repo.all_category_budgets().unwrap().len(), 1);
    }
}
