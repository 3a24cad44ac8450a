//! Sector and category repository
//!
//! Both live in `data/hierarchy.json`. Lists come back in creation order,
//! which is also the order sectors are consulted when two of them claim
//! the same category.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::engine::hierarchy::SectorIndex;
use crate::error::TandemResult;
use crate::models::{Category, CategoryId, Sector, SectorId};

use super::file_io::{read_json, write_json_atomic};
use super::poisoned;

/// On-disk layout of `hierarchy.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HierarchyData {
    #[serde(default)]
    pub sectors: Vec<Sector>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

pub struct HierarchyRepository {
    path: PathBuf,
    sectors: RwLock<HashMap<SectorId, Sector>>,
    categories: RwLock<HashMap<CategoryId, Category>>,
}

impl HierarchyRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            sectors: RwLock::new(HashMap::new()),
            categories: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> TandemResult<()> {
        let file_data: HierarchyData = read_json(&self.path)?;

        let mut sectors = self.sectors.write().map_err(poisoned)?;
        let mut categories = self.categories.write().map_err(poisoned)?;

        *sectors = file_data.sectors.into_iter().map(|s| (s.id, s)).collect();
        *categories = file_data.categories.into_iter().map(|c| (c.id, c)).collect();

        Ok(())
    }

    pub fn save(&self) -> TandemResult<()> {
        let file_data = HierarchyData {
            sectors: self.get_all_sectors()?,
            categories: self.get_all_categories()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    // Sectors

    pub fn get_sector(&self, id: SectorId) -> TandemResult<Option<Sector>> {
        let sectors = self.sectors.read().map_err(poisoned)?;
        Ok(sectors.get(&id).cloned())
    }

    /// All sectors, oldest first
    pub fn get_all_sectors(&self) -> TandemResult<Vec<Sector>> {
        let sectors = self.sectors.read().map_err(poisoned)?;
        let mut list: Vec<_> = sectors.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(list)
    }

    /// Case-insensitive name lookup
    pub fn get_sector_by_name(&self, name: &str) -> TandemResult<Option<Sector>> {
        let sectors = self.sectors.read().map_err(poisoned)?;
        let name_lower = name.to_lowercase();
        Ok(sectors
            .values()
            .find(|s| s.name.to_lowercase() == name_lower)
            .cloned())
    }

    pub fn upsert_sector(&self, sector: Sector) -> TandemResult<()> {
        let mut sectors = self.sectors.write().map_err(poisoned)?;
        sectors.insert(sector.id, sector);
        Ok(())
    }

    pub fn delete_sector(&self, id: SectorId) -> TandemResult<Option<Sector>> {
        let mut sectors = self.sectors.write().map_err(poisoned)?;
        Ok(sectors.remove(&id))
    }

    /// The sector that owns `category_id`, first-created sector winning
    pub fn sector_of(&self, category_id: CategoryId) -> TandemResult<Option<Sector>> {
        let sectors = self.get_all_sectors()?;
        let owner = SectorIndex::build(&sectors).sector_of(category_id);
        Ok(owner.and_then(|id| sectors.into_iter().find(|s| s.id == id)))
    }

    // Categories

    pub fn get_category(&self, id: CategoryId) -> TandemResult<Option<Category>> {
        let categories = self.categories.read().map_err(poisoned)?;
        Ok(categories.get(&id).cloned())
    }

    /// All categories, oldest first
    pub fn get_all_categories(&self) -> TandemResult<Vec<Category>> {
        let categories = self.categories.read().map_err(poisoned)?;
        let mut list: Vec<_> = categories.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(list)
    }

    pub fn get_category_by_name(&self, name: &str) -> TandemResult<Option<Category>> {
        let categories = self.categories.read().map_err(poisoned)?;
        let name_lower = name.to_lowercase();
        Ok(categories
            .values()
            .find(|c| c.name.to_lowercase() == name_lower)
            .cloned())
    }

    pub fn upsert_category(&self, category: Category) -> TandemResult<()> {
        let mut categories = self.categories.write().map_err(poisoned)?;
        categories.insert(category.id, category);
        Ok(())
    }

    pub fn delete_category(&self, id: CategoryId) -> TandemResult<Option<Category>> {
        let mut categories = self.categories.write().map_err(poisoned)?;
        Ok(categories.remove(&id))
    }

    pub fn category_count(&self) -> TandemResult<usize> {
        let categories = self.categories.read().map_err(poisoned)?;
        Ok(categories.len())
    }
}
