//! Per-period summaries
//!
//! Builds [`BudgetSummary`] and [`SectorBudgetSummary`] records from raw
//! rows. Summaries are recomputed on every read and never stored.

use std::collections::HashMap;

use serde::Serialize;

use super::hierarchy::SectorIndex;
use super::threshold::{remaining_percentage, utilization_percentage, BudgetStatus, Thresholds};
use crate::models::{
    BudgetAmount, BudgetId, BudgetPeriod, Category, CategoryBudget, CategoryId, Money, Sector,
    SectorBudget, SectorId, Transaction, TransactionId, TransactionType, UserSlot,
};

/// Spending attributed to one category in one period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Spend {
    pub total: Money,
    pub user1: Money,
    pub user2: Money,
}

impl Spend {
    fn add(&mut self, user: UserSlot, amount: Money) {
        self.total += amount;
        match user {
            UserSlot::User1 => self.user1 += amount,
            UserSlot::User2 => self.user2 += amount,
        }
    }

    pub fn user(&self, user: UserSlot) -> Money {
        match user {
            UserSlot::User1 => self.user1,
            UserSlot::User2 => self.user2,
        }
    }
}

/// Net spending per category for `period`.
///
/// Expenses count for the participant who paid. A reimbursement is
/// subtracted from the category and payer of the expense it offsets; one
/// whose expense is unknown or excluded for this granularity is ignored.
/// Income and settlements never count.
pub fn spend_by_category(transactions: &[Transaction], period: &BudgetPeriod) -> HashMap<CategoryId, Spend> {
    let by_id: HashMap<TransactionId, &Transaction> =
        transactions.iter().map(|t| (t.id, t)).collect();

    let mut spend: HashMap<CategoryId, Spend> = HashMap::new();
    for txn in transactions {
        if !period.contains(txn.date) || txn.is_excluded_from(period) {
            continue;
        }
        match txn.transaction_type {
            TransactionType::Expense => {
                if let Some(category_id) = txn.category_id {
                    spend.entry(category_id).or_default().add(txn.paid_by, txn.amount);
                }
            }
            TransactionType::Reimbursement => {
                let expense = txn
                    .reimburses_transaction_id
                    .and_then(|id| by_id.get(&id))
                    .filter(|e| e.is_expense() && !e.is_excluded_from(period));
                if let Some(category_id) = expense.and_then(|e| e.category_id) {
                    let payer = expense.map(|e| e.paid_by).unwrap_or(txn.paid_by);
                    spend.entry(category_id).or_default().add(payer, -txn.amount);
                }
            }
            TransactionType::Income | TransactionType::Settlement => {}
        }
    }
    spend
}

/// A category's budget position for one period
#[derive(Debug, Clone, Serialize)]
pub struct BudgetSummary {
    pub category_id: CategoryId,
    pub category_name: String,
    pub period: BudgetPeriod,
    /// `None` when the category has no budget row this period
    pub budget_id: Option<BudgetId>,
    pub amount: Option<BudgetAmount>,
    /// Nominal budget (zero without a row)
    pub budget: Money,
    pub current_period_spent: Money,
    pub user1_spent: Money,
    pub user2_spent: Money,
    pub remaining: Money,
    pub remaining_percentage: f64,
}

impl BudgetSummary {
    pub fn new(
        category: &Category,
        period: BudgetPeriod,
        budget: Option<&CategoryBudget>,
        spend: Spend,
    ) -> Self {
        let nominal = budget.map(|b| b.total()).unwrap_or_default();
        Self {
            category_id: category.id,
            category_name: category.name.clone(),
            period,
            budget_id: budget.map(|b| b.id),
            amount: budget.map(|b| b.amount),
            budget: nominal,
            current_period_spent: spend.total,
            user1_spent: spend.user1,
            user2_spent: spend.user2,
            remaining: nominal - spend.total,
            remaining_percentage: remaining_percentage(spend.total, nominal),
        }
    }

    pub fn has_budget(&self) -> bool {
        self.budget_id.is_some()
    }

    pub fn utilization_percentage(&self) -> f64 {
        utilization_percentage(self.current_period_spent, self.budget)
    }

    pub fn user_spent(&self, user: UserSlot) -> Money {
        match user {
            UserSlot::User1 => self.user1_spent,
            UserSlot::User2 => self.user2_spent,
        }
    }

    /// The participant's own budget; only split budgets have one
    pub fn user_budget(&self, user: UserSlot) -> Option<Money> {
        self.amount
            .filter(BudgetAmount::is_split)
            .map(|a| a.user_share(user))
    }

    pub fn status(&self, thresholds: &Thresholds) -> BudgetStatus {
        thresholds.bar_status(self.current_period_spent, self.budget)
    }

    /// A participant's status against their own share of a split budget
    pub fn user_status(&self, user: UserSlot, thresholds: &Thresholds) -> Option<BudgetStatus> {
        self.user_budget(user)
            .map(|share| thresholds.bar_status(self.user_spent(user), share))
    }
}

/// A sector's budget position for one period
#[derive(Debug, Clone, Serialize)]
pub struct SectorBudgetSummary {
    pub sector_id: SectorId,
    pub sector_name: String,
    pub period: BudgetPeriod,
    pub budget_id: Option<BudgetId>,
    pub amount: Option<BudgetAmount>,
    pub auto_rollup: bool,
    /// Effective budget: the child total for roll-up sectors (and sectors
    /// without a row), the sector's own amount otherwise
    pub budget: Money,
    pub current_period_spent: Money,
    pub user1_spent: Money,
    pub user2_spent: Money,
    /// Sum of the nominal budgets of the sector's categories
    pub category_budgets_total: Money,
    pub remaining: Money,
    pub remaining_percentage: f64,
}

impl SectorBudgetSummary {
    pub fn has_budget(&self) -> bool {
        self.budget_id.is_some()
    }

    pub fn utilization_percentage(&self) -> f64 {
        utilization_percentage(self.current_period_spent, self.budget)
    }

    /// A manual sector whose categories are budgeted above its ceiling
    pub fn children_exceed_ceiling(&self) -> bool {
        self.has_budget() && !self.auto_rollup && self.category_budgets_total > self.budget
    }

    pub fn user_spent(&self, user: UserSlot) -> Money {
        match user {
            UserSlot::User1 => self.user1_spent,
            UserSlot::User2 => self.user2_spent,
        }
    }

    pub fn user_budget(&self, user: UserSlot) -> Option<Money> {
        if self.auto_rollup {
            return None;
        }
        self.amount
            .filter(BudgetAmount::is_split)
            .map(|a| a.user_share(user))
    }

    pub fn status(&self, thresholds: &Thresholds) -> BudgetStatus {
        thresholds.bar_status(self.current_period_spent, self.budget)
    }

    pub fn user_status(&self, user: UserSlot, thresholds: &Thresholds) -> Option<BudgetStatus> {
        self.user_budget(user)
            .map(|share| thresholds.bar_status(self.user_spent(user), share))
    }
}

/// One summary per category, in category order
pub fn summarize_categories(
    categories: &[Category],
    category_budgets: &[CategoryBudget],
    transactions: &[Transaction],
    period: BudgetPeriod,
) -> Vec<BudgetSummary> {
    let budgets: HashMap<CategoryId, &CategoryBudget> = category_budgets
        .iter()
        .filter(|b| b.period == period)
        .map(|b| (b.category_id, b))
        .collect();
    let spend = spend_by_category(transactions, &period);

    categories
        .iter()
        .map(|c| {
            BudgetSummary::new(
                c,
                period,
                budgets.get(&c.id).copied(),
                spend.get(&c.id).copied().unwrap_or_default(),
            )
        })
        .collect()
}

/// One summary per sector, rolled up from the category summaries
pub fn summarize_sectors(
    sectors: &[Sector],
    sector_budgets: &[SectorBudget],
    category_summaries: &[BudgetSummary],
    period: BudgetPeriod,
) -> Vec<SectorBudgetSummary> {
    let index = SectorIndex::build(sectors);
    let budgets: HashMap<SectorId, &SectorBudget> = sector_budgets
        .iter()
        .filter(|b| b.period == period)
        .map(|b| (b.sector_id, b))
        .collect();

    sectors
        .iter()
        .map(|sector| {
            let children: Vec<&BudgetSummary> = category_summaries
                .iter()
                .filter(|s| index.sector_of(s.category_id) == Some(sector.id))
                .collect();

            let category_budgets_total: Money = children
                .iter()
                .filter(|s| s.has_budget())
                .map(|s| s.budget)
                .sum();
            let spent: Money = children.iter().map(|s| s.current_period_spent).sum();
            let user1_spent: Money = children.iter().map(|s| s.user1_spent).sum();
            let user2_spent: Money = children.iter().map(|s| s.user2_spent).sum();

            let row = budgets.get(&sector.id).copied();
            let auto_rollup = row.map(|b| b.auto_rollup).unwrap_or(true);
            let budget = match row {
                Some(b) if !b.auto_rollup => b.total(),
                _ => category_budgets_total,
            };

            SectorBudgetSummary {
                sector_id: sector.id,
                sector_name: sector.name.clone(),
                period,
                budget_id: row.map(|b| b.id),
                amount: row.map(|b| b.amount),
                auto_rollup,
                budget,
                current_period_spent: spent,
                user1_spent,
                user2_spent,
                category_budgets_total,
                remaining: budget - spent,
                remaining_percentage: remaining_percentage(spent, budget),
            }
        })
        .collect()
}
