//! Sector and category management
//!
//! Keeps every category in at most one sector: assigning a category moves it
//! out of whichever sector held it before.

use tracing::{debug, info};

use crate::audit::EntityType;
use crate::engine::hierarchy::{assign, SectorIndex};
use crate::engine::MembershipConflict;
use crate::error::{TandemError, TandemResult};
use crate::models::{Category, CategoryId, Sector, SectorId};
use crate::storage::Storage;

/// The whole hierarchy, ready for display
#[derive(Debug, Clone)]
pub struct HierarchyTree {
    pub sectors: Vec<(Sector, Vec<Category>)>,
    pub unassigned: Vec<Category>,
    pub conflicts: Vec<MembershipConflict>,
}

pub struct HierarchyService<'a> {
    storage: &'a Storage,
}

impl<'a> HierarchyService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    // Sectors

    pub fn create_sector(&self, name: &str) -> TandemResult<Sector> {
        let name = name.trim();
        if self.storage.hierarchy.get_sector_by_name(name)?.is_some() {
            return Err(TandemError::Duplicate {
                entity_type: "Sector",
                identifier: name.to_string(),
            });
        }

        let sector = Sector::new(name);
        sector
            .validate()
            .map_err(|e| TandemError::Validation(e.to_string()))?;

        self.storage.hierarchy.upsert_sector(sector.clone())?;
        self.storage.hierarchy.save()?;
        self.storage.log_create(
            EntityType::Sector,
            sector.id.to_string(),
            Some(sector.name.clone()),
            &sector,
        )?;

        info!(sector = %sector.name, "created sector");
        Ok(sector)
    }

    pub fn list_sectors(&self) -> TandemResult<Vec<Sector>> {
        self.storage.hierarchy.get_all_sectors()
    }

    /// Find a sector by name, displayed id, or full id
    pub fn find_sector(&self, identifier: &str) -> TandemResult<Option<Sector>> {
        if let Some(sector) = self.storage.hierarchy.get_sector_by_name(identifier)? {
            return Ok(Some(sector));
        }
        let sectors = self.storage.hierarchy.get_all_sectors()?;
        if let Some(sector) = sectors.into_iter().find(|s| s.id.to_string() == identifier) {
            return Ok(Some(sector));
        }
        match identifier.parse::<SectorId>() {
            Ok(id) => self.storage.hierarchy.get_sector(id),
            Err(_) => Ok(None),
        }
    }

    pub fn require_sector(&self, identifier: &str) -> TandemResult<Sector> {
        self.find_sector(identifier)?
            .ok_or_else(|| TandemError::sector_not_found(identifier))
    }

    /// Move `category_id` into `sector_id`, out of any other sector
    pub fn assign_category(&self, sector_id: SectorId, category_id: CategoryId) -> TandemResult<Sector> {
        let category = self
            .storage
            .hierarchy
            .get_category(category_id)?
            .ok_or_else(|| TandemError::category_not_found(category_id.to_string()))?;
        let mut target = self
            .storage
            .hierarchy
            .get_sector(sector_id)?
            .ok_or_else(|| TandemError::sector_not_found(sector_id.to_string()))?;

        let mut moves = Vec::new();
        for mut other in self.storage.hierarchy.get_all_sectors()? {
            if other.id == sector_id || !other.contains(category_id) {
                continue;
            }
            let before = other.clone();
            other.remove_category(category_id);
            self.storage.hierarchy.upsert_sector(other.clone())?;
            moves.push((before, other, format!("removed {}", category.name)));
        }

        let before = target.clone();
        if target.add_category(category_id) {
            self.storage.hierarchy.upsert_sector(target.clone())?;
            moves.push((before, target.clone(), format!("added {}", category.name)));
        }
        self.storage.hierarchy.save()?;

        for (before, after, summary) in &moves {
            self.log_sector_update(before, after, Some(summary.clone()))?;
        }
        debug!(category = %category.name, sector = %target.name, changed = moves.len(), "assigned category");

        Ok(target)
    }

    /// Take a category out of its sector. Returns the sector it left.
    pub fn unassign_category(&self, category_id: CategoryId) -> TandemResult<Option<Sector>> {
        let mut changed = Vec::new();
        for mut sector in self.storage.hierarchy.get_all_sectors()? {
            let before = sector.clone();
            if !sector.remove_category(category_id) {
                continue;
            }
            self.storage.hierarchy.upsert_sector(sector.clone())?;
            changed.push((before, sector));
        }
        self.storage.hierarchy.save()?;

        for (before, after) in &changed {
            self.log_sector_update(before, after, None)?;
        }
        Ok(changed.into_iter().next().map(|(_, after)| after))
    }

    fn log_sector_update(&self, before: &Sector, after: &Sector, summary: Option<String>) -> TandemResult<()> {
        self.storage.log_update(
            EntityType::Sector,
            after.id.to_string(),
            Some(after.name.clone()),
            before,
            after,
            summary,
        )
    }

    /// Delete a sector and all of its sector budgets. Its categories become
    /// unassigned.
    pub fn delete_sector(&self, sector_id: SectorId) -> TandemResult<Sector> {
        let sector = self
            .storage
            .hierarchy
            .delete_sector(sector_id)?
            .ok_or_else(|| TandemError::sector_not_found(sector_id.to_string()))?;
        self.storage.hierarchy.save()?;

        let budgets = self.storage.budgets.delete_sector_budgets_for_sector(sector_id)?;
        self.storage.budgets.save()?;
        for budget in &budgets {
            self.storage.log_delete(
                EntityType::SectorBudget,
                budget.id.to_string(),
                Some(format!("{} {}", sector.name, budget.period)),
                budget,
            )?;
        }

        self.storage.log_delete(
            EntityType::Sector,
            sector.id.to_string(),
            Some(sector.name.clone()),
            &sector,
        )?;
        info!(sector = %sector.name, budgets = budgets.len(), "deleted sector");
        Ok(sector)
    }

    // Categories

    /// Create a category, optionally placing it straight into a sector
    pub fn create_category(
        &self,
        name: &str,
        image: Option<String>,
        sector_id: Option<SectorId>,
    ) -> TandemResult<Category> {
        let name = name.trim();
        if self.storage.hierarchy.get_category_by_name(name)?.is_some() {
            return Err(TandemError::Duplicate {
                entity_type: "Category",
                identifier: name.to_string(),
            });
        }
        if let Some(id) = sector_id {
            if self.storage.hierarchy.get_sector(id)?.is_none() {
                return Err(TandemError::sector_not_found(id.to_string()));
            }
        }

        let mut category = Category::new(name);
        category.image = image;
        category
            .validate()
            .map_err(|e| TandemError::Validation(e.to_string()))?;

        self.storage.hierarchy.upsert_category(category.clone())?;
        self.storage.hierarchy.save()?;
        self.storage.log_create(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &category,
        )?;

        if let Some(id) = sector_id {
            self.assign_category(id, category.id)?;
        }

        info!(category = %category.name, "created category");
        Ok(category)
    }

    pub fn list_categories(&self) -> TandemResult<Vec<Category>> {
        self.storage.hierarchy.get_all_categories()
    }

    pub fn find_category(&self, identifier: &str) -> TandemResult<Option<Category>> {
        if let Some(category) = self.storage.hierarchy.get_category_by_name(identifier)? {
            return Ok(Some(category));
        }
        let categories = self.storage.hierarchy.get_all_categories()?;
        if let Some(category) = categories.into_iter().find(|c| c.id.to_string() == identifier) {
            return Ok(Some(category));
        }
        match identifier.parse::<CategoryId>() {
            Ok(id) => self.storage.hierarchy.get_category(id),
            Err(_) => Ok(None),
        }
    }

    pub fn require_category(&self, identifier: &str) -> TandemResult<Category> {
        self.find_category(identifier)?
            .ok_or_else(|| TandemError::category_not_found(identifier))
    }

    /// Delete a category with its budgets. Refused while transactions still
    /// reference it.
    pub fn delete_category(&self, category_id: CategoryId) -> TandemResult<Category> {
        let category = self
            .storage
            .hierarchy
            .get_category(category_id)?
            .ok_or_else(|| TandemError::category_not_found(category_id.to_string()))?;

        let in_use = self.storage.transactions.get_by_category(category_id)?.len();
        if in_use > 0 {
            return Err(TandemError::Validation(format!(
                "Cannot delete '{}': {} transactions use it",
                category.name, in_use
            )));
        }

        self.unassign_category(category_id)?;
        self.storage.hierarchy.delete_category(category_id)?;
        self.storage.hierarchy.save()?;

        let budgets = self
            .storage
            .budgets
            .delete_category_budgets_for_category(category_id)?;
        self.storage.budgets.save()?;
        for budget in &budgets {
            self.storage.log_delete(
                EntityType::CategoryBudget,
                budget.id.to_string(),
                Some(format!("{} {}", category.name, budget.period)),
                budget,
            )?;
        }

        self.storage.log_delete(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &category,
        )?;
        Ok(category)
    }

    /// Sectors with their categories, the unassigned rest, and any
    /// categories claimed twice in stored data
    pub fn tree(&self) -> TandemResult<HierarchyTree> {
        let sectors = self.storage.hierarchy.get_all_sectors()?;
        let categories = self.storage.hierarchy.get_all_categories()?;

        let conflicts = SectorIndex::build(&sectors).conflicts().to_vec();
        let assignment = assign(&sectors, &categories);

        Ok(HierarchyTree {
            sectors: assignment
                .sectors
                .into_iter()
                .map(|(s, cats)| (s.clone(), cats.into_iter().cloned().collect()))
                .collect(),
            unassigned: assignment.unassigned.into_iter().cloned().collect(),
            conflicts,
        })
    }
}
