//! Hierarchy classification
//!
//! Works out which categories belong to which sector, which are unassigned,
//! and which category budgets have no sector budget above them. Sector
//! members that don't exist in the category collection are skipped.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::models::{BudgetPeriod, Category, CategoryBudget, CategoryId, Sector, SectorBudget, SectorId};

/// Categories owned by `sector`, in category collection order
pub fn categories_for_sector<'a>(sector: &Sector, categories: &'a [Category]) -> Vec<&'a Category> {
    categories
        .iter()
        .filter(|c| sector.contains(c.id))
        .collect()
}

/// Categories that no sector claims
pub fn unassigned_categories<'a>(sectors: &[Sector], categories: &'a [Category]) -> Vec<&'a Category> {
    let assigned: HashSet<CategoryId> = sectors
        .iter()
        .flat_map(|s| s.category_ids.iter().copied())
        .collect();

    categories
        .iter()
        .filter(|c| !assigned.contains(&c.id))
        .collect()
}

/// A category listed by more than one sector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipConflict {
    pub category_id: CategoryId,
    /// The sector that keeps the category
    pub kept_by: SectorId,
    /// The later sector whose claim is ignored
    pub ignored: SectorId,
}

/// Category → owning sector lookup
///
/// Built in sector order; the first sector to list a category owns it, so a
/// category is never attributed to two sectors.
#[derive(Debug, Clone, Default)]
pub struct SectorIndex {
    owners: HashMap<CategoryId, SectorId>,
    conflicts: Vec<MembershipConflict>,
}

impl SectorIndex {
    pub fn build(sectors: &[Sector]) -> Self {
        let mut index = Self::default();
        for sector in sectors {
            for category_id in &sector.category_ids {
                match index.owners.get(category_id) {
                    Some(&owner) if owner != sector.id => {
                        warn!(
                            category = %category_id,
                            kept_by = %owner,
                            ignored = %sector.id,
                            "category is listed by more than one sector"
                        );
                        index.conflicts.push(MembershipConflict {
                            category_id: *category_id,
                            kept_by: owner,
                            ignored: sector.id,
                        });
                    }
                    Some(_) => {}
                    None => {
                        index.owners.insert(*category_id, sector.id);
                    }
                }
            }
        }
        index
    }

    pub fn sector_of(&self, category_id: CategoryId) -> Option<SectorId> {
        self.owners.get(&category_id).copied()
    }

    pub fn conflicts(&self) -> &[MembershipConflict] {
        &self.conflicts
    }
}

/// Sectors paired with the categories they own, plus the leftovers
#[derive(Debug, Clone)]
pub struct Assignment<'a> {
    pub sectors: Vec<(&'a Sector, Vec<&'a Category>)>,
    pub unassigned: Vec<&'a Category>,
}

/// Split the category collection across sectors with no overlap
pub fn assign<'a>(sectors: &'a [Sector], categories: &'a [Category]) -> Assignment<'a> {
    let index = SectorIndex::build(sectors);

    let mut by_sector: HashMap<SectorId, Vec<&'a Category>> = HashMap::new();
    let mut unassigned = Vec::new();
    for category in categories {
        match index.sector_of(category.id) {
            Some(sector_id) => by_sector.entry(sector_id).or_default().push(category),
            None => unassigned.push(category),
        }
    }

    let sectors = sectors
        .iter()
        .map(|s| (s, by_sector.remove(&s.id).unwrap_or_default()))
        .collect();

    Assignment {
        sectors,
        unassigned,
    }
}

fn budgeted_sectors(sector_budgets: &[SectorBudget]) -> HashSet<(SectorId, BudgetPeriod)> {
    sector_budgets
        .iter()
        .map(|b| (b.sector_id, b.period))
        .collect()
}

/// Category budgets whose owning sector has no budget row for the same period.
///
/// Budgets of unassigned categories are never orphaned.
pub fn orphaned_category_budgets<'a>(
    sectors: &[Sector],
    category_budgets: &'a [CategoryBudget],
    sector_budgets: &[SectorBudget],
) -> Vec<&'a CategoryBudget> {
    let index = SectorIndex::build(sectors);
    let budgeted = budgeted_sectors(sector_budgets);

    category_budgets
        .iter()
        .filter(|b| {
            index
                .sector_of(b.category_id)
                .is_some_and(|sector_id| !budgeted.contains(&(sector_id, b.period)))
        })
        .collect()
}

/// Sectors with no budget row for `period` but at least one budgeted child
pub fn sectors_without_budgets<'a>(
    sectors: &'a [Sector],
    category_budgets: &[CategoryBudget],
    sector_budgets: &[SectorBudget],
    period: BudgetPeriod,
) -> Vec<&'a Sector> {
    let index = SectorIndex::build(sectors);
    let budgeted = budgeted_sectors(sector_budgets);

    let with_child_budgets: HashSet<SectorId> = category_budgets
        .iter()
        .filter(|b| b.period == period)
        .filter_map(|b| index.sector_of(b.category_id))
        .collect();

    sectors
        .iter()
        .filter(|s| with_child_budgets.contains(&s.id) && !budgeted.contains(&(s.id, period)))
        .collect()
}
