//! Budget totals across the hierarchy
//!
//! A category that sits under a budgeted sector is already covered by the
//! sector's figure, so it is left out of the category sum.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use super::hierarchy::SectorIndex;
use super::summary::{BudgetSummary, SectorBudgetSummary};
use crate::models::{Money, Sector, SectorId};

/// Period-wide totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BudgetTotals {
    pub total_budget: Money,
    pub total_spent: Money,
    pub total_remaining: Money,
    pub overall_percentage: f64,
}

/// A sector's nominal total (its own amount, or the child sum when rolling up)
pub fn sector_total(summary: &SectorBudgetSummary) -> Money {
    summary.budget
}

pub fn sector_spent(summary: &SectorBudgetSummary) -> Money {
    summary.current_period_spent
}

/// Sum the period without counting any category twice
pub fn aggregate(
    sectors: &[Sector],
    category_summaries: &[BudgetSummary],
    sector_summaries: &[SectorBudgetSummary],
) -> BudgetTotals {
    let index = SectorIndex::build(sectors);

    let budgeted: Vec<&SectorBudgetSummary> = sector_summaries
        .iter()
        .filter(|s| s.has_budget())
        .collect();
    let covered: HashSet<SectorId> = budgeted.iter().map(|s| s.sector_id).collect();

    let uncovered: Vec<&BudgetSummary> = category_summaries
        .iter()
        .filter(|c| c.has_budget())
        .filter(|c| {
            index
                .sector_of(c.category_id)
                .map_or(true, |sector_id| !covered.contains(&sector_id))
        })
        .collect();

    let total_budget: Money = budgeted.iter().map(|s| sector_total(s)).sum::<Money>()
        + uncovered.iter().map(|c| c.budget).sum::<Money>();
    let total_spent: Money = budgeted.iter().map(|s| sector_spent(s)).sum::<Money>()
        + uncovered.iter().map(|c| c.current_period_spent).sum::<Money>();

    let overall_percentage = if total_budget.is_positive() {
        total_spent.as_f64() / total_budget.as_f64() * 100.0
    } else {
        0.0
    };

    BudgetTotals {
        total_budget,
        total_spent,
        total_remaining: total_budget - total_spent,
        overall_percentage,
    }
}

/// Rows that can be ordered for display
pub trait Ranked {
    fn has_budget(&self) -> bool;
    fn utilization(&self) -> f64;
}

impl Ranked for BudgetSummary {
    fn has_budget(&self) -> bool {
        BudgetSummary::has_budget(self)
    }

    fn utilization(&self) -> f64 {
        self.utilization_percentage()
    }
}

impl Ranked for SectorBudgetSummary {
    fn has_budget(&self) -> bool {
        SectorBudgetSummary::has_budget(self)
    }

    fn utilization(&self) -> f64 {
        self.utilization_percentage()
    }
}

/// Budgeted rows first, then by utilization, highest first. Ties keep their
/// input order.
pub fn sort_for_display<T: Ranked>(rows: &mut [T]) {
    rows.sort_by(|a, b| {
        b.has_budget().cmp(&a.has_budget()).then_with(|| {
            b.utilization()
                .partial_cmp(&a.utilization())
                .unwrap_or(Ordering::Equal)
        })
    });
}
