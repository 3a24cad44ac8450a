//! Budget service
//!
//! Editing category and sector budgets, building period overviews and
//! warnings, running propagation against storage, and the yearly view with
//! projections.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::config::Settings;
use crate::engine::hierarchy::{orphaned_category_budgets, sectors_without_budgets, SectorIndex};
use crate::engine::propagation::{self, BudgetStore, PropagationReport};
use crate::engine::summary::{summarize_categories, summarize_sectors};
use crate::engine::{
    aggregate, project_on_track, sort_for_display, BudgetStatus, BudgetSummary, BudgetTotals,
    Projection, SectorBudgetSummary,
};
use crate::error::{TandemError, TandemResult};
use crate::models::{
    BudgetAmount, BudgetPeriod, CategoryBudget, CategoryId, Money, SectorBudget, SectorId, UserSlot,
};
use crate::storage::Storage;

/// A sector with its categories' summaries
#[derive(Debug, Clone, Serialize)]
pub struct SectorOverview {
    pub summary: SectorBudgetSummary,
    pub categories: Vec<BudgetSummary>,
}

/// Everything `budget overview` shows for one period
#[derive(Debug, Clone, Serialize)]
pub struct BudgetOverview {
    pub period: BudgetPeriod,
    pub sectors: Vec<SectorOverview>,
    pub unassigned: Vec<BudgetSummary>,
    pub totals: BudgetTotals,
}

impl BudgetOverview {
    pub fn category_summaries(&self) -> impl Iterator<Item = &BudgetSummary> {
        self.sectors
            .iter()
            .flat_map(|s| s.categories.iter())
            .chain(self.unassigned.iter())
    }

    pub fn find_category(&self, category_id: CategoryId) -> Option<&BudgetSummary> {
        self.category_summaries().find(|s| s.category_id == category_id)
    }

    pub fn find_sector(&self, sector_id: SectorId) -> Option<&SectorOverview> {
        self.sectors.iter().find(|s| s.summary.sector_id == sector_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A sector has budgeted categories but no budget of its own
    SectorWithoutBudget,
    /// A category budget sits under a sector with no budget this period
    OrphanedCategoryBudget,
    /// A manual sector's categories add up to more than its ceiling
    ChildrenExceedCeiling,
    /// A budget line is at the warning threshold
    NearLimit,
    /// A budget line is over
    OverBudget,
    /// One participant is over their share of a split budget
    UserOverShare,
    /// Two sectors list the same category
    MembershipConflict,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SectorWithoutBudget => "no sector budget",
            Self::OrphanedCategoryBudget => "orphaned",
            Self::ChildrenExceedCeiling => "over ceiling",
            Self::NearLimit => "warning",
            Self::OverBudget => "over",
            Self::UserOverShare => "over share",
            Self::MembershipConflict => "conflict",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetWarning {
    pub kind: WarningKind,
    /// The sector or category the warning is about
    pub subject: String,
    pub message: String,
}

/// A row of the yearly view
#[derive(Debug, Clone, Serialize)]
pub struct YearlyCategoryRow {
    pub summary: BudgetSummary,
    /// Only budgeted categories are projected
    pub projection: Option<Projection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearlySectorRow {
    pub summary: SectorBudgetSummary,
    pub projection: Option<Projection>,
}

/// The yearly budgets with a linear projection per line
#[derive(Debug, Clone, Serialize)]
pub struct YearlyOverview {
    pub period: BudgetPeriod,
    /// Month the projections are taken at
    pub month_of_year: u32,
    pub sectors: Vec<YearlySectorRow>,
    pub categories: Vec<YearlyCategoryRow>,
    pub totals: BudgetTotals,
    pub projection: Projection,
}

/// How `budget set-sector` should configure the sector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorBudgetMode {
    /// Total is the sum of the sector's category budgets
    AutoRollup,
    /// Independent ceiling
    Manual(BudgetAmount),
}

pub struct BudgetService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> BudgetService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    // Editing

    /// Set a category's budget for a period. If the category's sector has
    /// no budget for the period, a zero roll-up one is created and returned.
    pub fn set_category_budget(
        &self,
        category_id: CategoryId,
        period: BudgetPeriod,
        amount: BudgetAmount,
    ) -> TandemResult<(CategoryBudget, Option<SectorBudget>)> {
        let category = self
            .storage
            .hierarchy
            .get_category(category_id)?
            .ok_or_else(|| TandemError::category_not_found(category_id.to_string()))?;
        amount
            .validate()
            .map_err(|e| TandemError::Budget(e.to_string()))?;

        let budget = match self.storage.budgets.get_category_budget(category_id, period)? {
            Some(mut existing) => {
                existing.set_amount(amount);
                existing
            }
            None => CategoryBudget::new(category_id, period, amount),
        };
        let stored = self.storage.store_category_budget(budget)?;
        let placeholder = self
            .storage
            .ensure_sector_budget_placeholder(category_id, period)?;

        info!(category = %category.name, %period, amount = %stored.amount, "set category budget");
        Ok((stored, placeholder))
    }

    pub fn set_sector_budget(
        &self,
        sector_id: SectorId,
        period: BudgetPeriod,
        mode: SectorBudgetMode,
    ) -> TandemResult<SectorBudget> {
        let sector = self
            .storage
            .hierarchy
            .get_sector(sector_id)?
            .ok_or_else(|| TandemError::sector_not_found(sector_id.to_string()))?;

        let (amount, auto_rollup) = match mode {
            SectorBudgetMode::AutoRollup => (BudgetAmount::default(), true),
            SectorBudgetMode::Manual(amount) => {
                amount
                    .validate()
                    .map_err(|e| TandemError::Budget(e.to_string()))?;
                (amount, false)
            }
        };

        let budget = match self.storage.budgets.get_sector_budget(sector_id, period)? {
            Some(mut existing) => {
                existing.set_amount(amount, auto_rollup);
                existing
            }
            None => SectorBudget::new(sector_id, period, amount, auto_rollup),
        };
        let stored = self.storage.store_sector_budget(budget)?;

        info!(sector = %sector.name, %period, auto_rollup, "set sector budget");
        Ok(stored)
    }

    pub fn clear_category_budget(&self, category_id: CategoryId, period: BudgetPeriod) -> TandemResult<CategoryBudget> {
        let removed = self
            .storage
            .budgets
            .delete_category_budget(category_id, period)?
            .ok_or_else(|| TandemError::NotFound {
                entity_type: "Category budget",
                identifier: format!("{} {}", category_id, period),
            })?;
        self.storage.budgets.save()?;
        self.storage.log_delete(
            EntityType::CategoryBudget,
            removed.id.to_string(),
            Some(self.storage.category_budget_label(&removed)?),
            &removed,
        )?;
        Ok(removed)
    }

    pub fn clear_sector_budget(&self, sector_id: SectorId, period: BudgetPeriod) -> TandemResult<SectorBudget> {
        let removed = self
            .storage
            .budgets
            .delete_sector_budget(sector_id, period)?
            .ok_or_else(|| TandemError::NotFound {
                entity_type: "Sector budget",
                identifier: format!("{} {}", sector_id, period),
            })?;
        self.storage.budgets.save()?;
        self.storage.log_delete(
            EntityType::SectorBudget,
            removed.id.to_string(),
            Some(self.storage.sector_budget_label(&removed)?),
            &removed,
        )?;
        Ok(removed)
    }

    // Reading

    /// Summaries and totals for one period, sorted for display
    pub fn overview(&self, period: BudgetPeriod) -> TandemResult<BudgetOverview> {
        let sectors = self.storage.hierarchy.get_all_sectors()?;
        let categories = self.storage.hierarchy.get_all_categories()?;
        let category_budgets = self.storage.budgets.category_budgets_for_period(period)?;
        let sector_budgets = self.storage.budgets.sector_budgets_for_period(period)?;
        let transactions = self.storage.transactions.get_all()?;

        let category_summaries = summarize_categories(&categories, &category_budgets, &transactions, period);
        let mut sector_summaries = summarize_sectors(&sectors, &sector_budgets, &category_summaries, period);
        let totals = aggregate(&sectors, &category_summaries, &sector_summaries);

        let index = SectorIndex::build(&sectors);
        sort_for_display(&mut sector_summaries);
        let overview_sectors: Vec<SectorOverview> = sector_summaries
            .into_iter()
            .map(|summary| {
                let mut children: Vec<BudgetSummary> = category_summaries
                    .iter()
                    .filter(|c| index.sector_of(c.category_id) == Some(summary.sector_id))
                    .cloned()
                    .collect();
                sort_for_display(&mut children);
                SectorOverview {
                    summary,
                    categories: children,
                }
            })
            .collect();

        let mut unassigned: Vec<BudgetSummary> = category_summaries
            .into_iter()
            .filter(|c| index.sector_of(c.category_id).is_none())
            .collect();
        sort_for_display(&mut unassigned);

        debug!(%period, total = %totals.total_budget, spent = %totals.total_spent, "built overview");
        Ok(BudgetOverview {
            period,
            sectors: overview_sectors,
            unassigned,
            totals,
        })
    }

    /// Everything worth flagging for a period, most structural first
    pub fn warnings(&self, period: BudgetPeriod) -> TandemResult<Vec<BudgetWarning>> {
        let sectors = self.storage.hierarchy.get_all_sectors()?;
        let categories = self.storage.hierarchy.get_all_categories()?;
        let category_budgets = self.storage.budgets.category_budgets_for_period(period)?;
        let sector_budgets = self.storage.budgets.sector_budgets_for_period(period)?;
        let thresholds = &self.settings.thresholds;
        let money = |m: Money| m.format_with_symbol(&self.settings.currency_symbol);
        let category_name = |id: CategoryId| {
            categories
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| id.to_string())
        };

        let mut warnings = Vec::new();

        for conflict in SectorIndex::build(&sectors).conflicts() {
            let sector_name = |id: SectorId| {
                sectors
                    .iter()
                    .find(|s| s.id == id)
                    .map(|s| s.name.clone())
                    .unwrap_or_default()
            };
            warnings.push(BudgetWarning {
                kind: WarningKind::MembershipConflict,
                subject: category_name(conflict.category_id),
                message: format!(
                    "listed by both {} and {}; counted under {}",
                    sector_name(conflict.kept_by),
                    sector_name(conflict.ignored),
                    sector_name(conflict.kept_by)
                ),
            });
        }

        for sector in sectors_without_budgets(&sectors, &category_budgets, &sector_budgets, period) {
            warnings.push(BudgetWarning {
                kind: WarningKind::SectorWithoutBudget,
                subject: sector.name.clone(),
                message: format!("has category budgets but no sector budget for {}", period),
            });
        }

        for budget in orphaned_category_budgets(&sectors, &category_budgets, &sector_budgets) {
            warnings.push(BudgetWarning {
                kind: WarningKind::OrphanedCategoryBudget,
                subject: category_name(budget.category_id),
                message: format!("budget of {} is not covered by a sector budget", money(budget.total())),
            });
        }

        let overview = self.overview(period)?;

        for sector in &overview.sectors {
            let s = &sector.summary;
            if s.children_exceed_ceiling() {
                warnings.push(BudgetWarning {
                    kind: WarningKind::ChildrenExceedCeiling,
                    subject: s.sector_name.clone(),
                    message: format!(
                        "categories total {} against a ceiling of {}",
                        money(s.category_budgets_total),
                        money(s.budget)
                    ),
                });
            }
            if s.has_budget() {
                self.status_warnings(
                    &mut warnings,
                    &s.sector_name,
                    thresholds.card_status(s.current_period_spent, s.budget),
                    s.current_period_spent,
                    s.budget,
                );
                for user in UserSlot::all() {
                    if s.user_status(user, thresholds) == Some(BudgetStatus::Over) {
                        warnings.push(self.user_warning(&s.sector_name, user, s.user_spent(user), s.user_budget(user)));
                    }
                }
            }
        }

        for c in overview.category_summaries().filter(|c| c.has_budget()) {
            self.status_warnings(
                &mut warnings,
                &c.category_name,
                thresholds.card_status(c.current_period_spent, c.budget),
                c.current_period_spent,
                c.budget,
            );
            for user in UserSlot::all() {
                if c.user_status(user, thresholds) == Some(BudgetStatus::Over) {
                    warnings.push(self.user_warning(&c.category_name, user, c.user_spent(user), c.user_budget(user)));
                }
            }
        }

        Ok(warnings)
    }

    fn status_warnings(
        &self,
        warnings: &mut Vec<BudgetWarning>,
        subject: &str,
        status: BudgetStatus,
        spent: Money,
        budget: Money,
    ) {
        let kind = match status {
            BudgetStatus::Under => return,
            BudgetStatus::Warning => WarningKind::NearLimit,
            BudgetStatus::Over => WarningKind::OverBudget,
        };
        let symbol = &self.settings.currency_symbol;
        warnings.push(BudgetWarning {
            kind,
            subject: subject.to_string(),
            message: format!(
                "spent {} of {}",
                spent.format_with_symbol(symbol),
                budget.format_with_symbol(symbol)
            ),
        });
    }

    fn user_warning(&self, subject: &str, user: UserSlot, spent: Money, share: Option<Money>) -> BudgetWarning {
        let symbol = &self.settings.currency_symbol;
        BudgetWarning {
            kind: WarningKind::UserOverShare,
            subject: subject.to_string(),
            message: format!(
                "{} spent {} of their {} share",
                self.settings.user_name(user),
                spent.format_with_symbol(symbol),
                share.unwrap_or_default().format_with_symbol(symbol)
            ),
        }
    }

    // Propagation

    /// Copy the previous period's budgets into `target`
    pub fn carry_forward(&self, target: BudgetPeriod) -> TandemResult<PropagationReport> {
        self.resume_first()?;
        propagation::carry_forward(self.storage, target)
    }

    pub fn copy_period(&self, source: BudgetPeriod, target: BudgetPeriod) -> TandemResult<PropagationReport> {
        self.resume_first()?;
        propagation::copy_period(self.storage, source, target)
    }

    /// Finish any propagation a previous run left half done
    pub fn resume(&self) -> TandemResult<Vec<PropagationReport>> {
        propagation::resume_pending(self.storage)
    }

    fn resume_first(&self) -> TandemResult<()> {
        if !self.storage.pending_markers()?.is_empty() {
            self.resume()?;
        }
        Ok(())
    }

    // Yearly

    /// Yearly budgets for `year`, projected at `month_of_year`
    pub fn yearly_overview(&self, year: BudgetPeriod, month_of_year: u32) -> TandemResult<YearlyOverview> {
        if !year.is_yearly() {
            return Err(TandemError::Validation(format!("{} is not a year", year)));
        }
        let overview = self.overview(year)?;

        let categories: Vec<YearlyCategoryRow> = overview
            .category_summaries()
            .map(|summary| YearlyCategoryRow {
                projection: summary
                    .has_budget()
                    .then(|| project_on_track(summary.budget, summary.current_period_spent, month_of_year)),
                summary: summary.clone(),
            })
            .collect();
        let sectors = overview
            .sectors
            .iter()
            .map(|s| YearlySectorRow {
                projection: s.summary.has_budget().then(|| {
                    project_on_track(s.summary.budget, s.summary.current_period_spent, month_of_year)
                }),
                summary: s.summary.clone(),
            })
            .collect();

        let totals = overview.totals;
        Ok(YearlyOverview {
            period: year,
            month_of_year,
            sectors,
            categories,
            projection: project_on_track(totals.total_budget, totals.total_spent, month_of_year),
            totals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TandemPaths;
    use crate::engine::ProjectionStatus;
    use crate::models::{Category, Sector, Transaction};
    use crate::services::HierarchyService;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        storage: Storage,
        settings: Settings,
        home: Sector,
        rent: Category,
        utilities: Category,
        gifts: Category,
    }

    fn units(n: i64) -> Money {
        Money::from_units(n)
    }

    fn jan() -> BudgetPeriod {
        BudgetPeriod::monthly(2025, 1)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(TandemPaths::with_base_dir(temp.path().to_path_buf())).unwrap();
        let hierarchy = HierarchyService::new(&storage);
        let home = hierarchy.create_sector("Home").unwrap();
        let rent = hierarchy.create_category("Rent", None, Some(home.id)).unwrap();
        let utilities = hierarchy.create_category("Utilities", None, Some(home.id)).unwrap();
        let gifts = hierarchy.create_category("Gifts", None, None).unwrap();
        let home = storage.hierarchy.get_sector(home.id).unwrap().unwrap();
        Fixture {
            _temp: temp,
            storage,
            settings: Settings::default(),
            home,
            rent,
            utilities,
            gifts,
        }
    }

    fn spend(f: &Fixture, category: &Category, date: NaiveDate, amount: i64, user: UserSlot) {
        f.storage
            .transactions
            .upsert(Transaction::expense(category.id, date, units(amount), user))
            .unwrap();
    }

    #[test]
    fn test_setting_category_budget_creates_placeholder_once() {
        let f = fixture();
        let service = BudgetService::new(&f.storage, &f.settings);

        let (_, placeholder) = service
            .set_category_budget(f.rent.id, jan(), BudgetAmount::absolute(units(1000)))
            .unwrap();
        let placeholder = placeholder.unwrap();
        assert_eq!(placeholder.sector_id, f.home.id);
        assert!(placeholder.auto_rollup);

        let (_, again) = service
            .set_category_budget(f.utilities.id, jan(), BudgetAmount::absolute(units(300)))
            .unwrap();
        assert!(again.is_none());

        // unassigned categories never get one
        let (_, none) = service
            .set_category_budget(f.gifts.id, jan(), BudgetAmount::absolute(units(100)))
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_negative_budget_rejected() {
        let f = fixture();
        let service = BudgetService::new(&f.storage, &f.settings);
        let err = service
            .set_category_budget(f.rent.id, jan(), BudgetAmount::absolute(units(-5)))
            .unwrap_err();
        assert!(matches!(err, TandemError::Budget(_)));
    }

    #[test]
    fn test_overview_counts_manual_sector_once() {
        let f = fixture();
        let service = BudgetService::new(&f.storage, &f.settings);
        service
            .set_category_budget(f.rent.id, jan(), BudgetAmount::absolute(units(1000)))
            .unwrap();
        service
            .set_category_budget(f.utilities.id, jan(), BudgetAmount::absolute(units(300)))
            .unwrap();
        service
            .set_category_budget(f.gifts.id, jan(), BudgetAmount::absolute(units(100)))
            .unwrap();
        service
            .set_sector_budget(
                f.home.id,
                jan(),
                SectorBudgetMode::Manual(BudgetAmount::absolute(units(1500))),
            )
            .unwrap();
        spend(&f, &f.rent, day(1), 1000, UserSlot::User1);
        spend(&f, &f.gifts, day(9), 40, UserSlot::User2);

        let overview = service.overview(jan()).unwrap();
        assert_eq!(overview.totals.total_budget, units(1600));
        assert_eq!(overview.totals.total_spent, units(1040));

        let home = overview.find_sector(f.home.id).unwrap();
        assert_eq!(home.summary.budget, units(1500));
        assert_eq!(home.categories.len(), 2);
        // Rent (100%) sorts ahead of Utilities (0%)
        assert_eq!(home.categories[0].category_name, "Rent");
        assert_eq!(overview.unassigned[0].category_name, "Gifts");
    }

    #[test]
    fn test_warnings() {
        let f = fixture();
        let service = BudgetService::new(&f.storage, &f.settings);
        service
            .set_category_budget(f.rent.id, jan(), BudgetAmount::absolute(units(1000)))
            .unwrap();
        service
            .set_category_budget(
                f.utilities.id,
                jan(),
                BudgetAmount::split(units(50), units(50)),
            )
            .unwrap();
        service
            .set_sector_budget(
                f.home.id,
                jan(),
                SectorBudgetMode::Manual(BudgetAmount::absolute(units(900))),
            )
            .unwrap();
        spend(&f, &f.utilities, day(4), 60, UserSlot::User1);

        let warnings = service.warnings(jan()).unwrap();
        let kinds: Vec<WarningKind> = warnings.iter().map(|w| w.kind).collect();

        assert!(kinds.contains(&WarningKind::ChildrenExceedCeiling));
        let user = warnings
            .iter()
            .find(|w| w.kind == WarningKind::UserOverShare)
            .unwrap();
        assert_eq!(user.subject, "Utilities");
        assert!(user.message.starts_with("User 1 spent $60.00"));
        // 60 of 100 is under the warning threshold for the category as a whole
        assert!(!warnings
            .iter()
            .any(|w| w.subject == "Utilities" && w.kind == WarningKind::NearLimit));
    }

    #[test]
    fn test_orphan_and_missing_sector_budget_warnings() {
        let f = fixture();
        let service = BudgetService::new(&f.storage, &f.settings);
        service
            .set_category_budget(f.rent.id, jan(), BudgetAmount::absolute(units(1000)))
            .unwrap();
        service.clear_sector_budget(f.home.id, jan()).unwrap();

        let kinds: Vec<WarningKind> = service.warnings(jan()).unwrap().iter().map(|w| w.kind).collect();
        assert!(kinds.contains(&WarningKind::SectorWithoutBudget));
        assert!(kinds.contains(&WarningKind::OrphanedCategoryBudget));
    }

    #[test]
    fn test_clear_missing_budget_is_not_found() {
        let f = fixture();
        let service = BudgetService::new(&f.storage, &f.settings);
        assert!(service
            .clear_category_budget(f.rent.id, jan())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_carry_forward_through_service() {
        let f = fixture();
        let service = BudgetService::new(&f.storage, &f.settings);
        service
            .set_category_budget(f.rent.id, jan(), BudgetAmount::absolute(units(1000)))
            .unwrap();

        let report = service.carry_forward(jan().next()).unwrap();
        assert_eq!(report.category_budgets_copied, 1);
        assert_eq!(report.sector_budgets_copied, 1);

        let feb = service.overview(jan().next()).unwrap();
        assert_eq!(feb.totals.total_budget, units(1000));

        assert!(matches!(
            service.carry_forward(BudgetPeriod::monthly(2024, 6)),
            Err(TandemError::NothingToCopy(_))
        ));
    }

    #[test]
    fn test_yearly_overview_projection() {
        let f = fixture();
        let service = BudgetService::new(&f.storage, &f.settings);
        let year = BudgetPeriod::yearly(2025);
        service
            .set_category_budget(f.gifts.id, year, BudgetAmount::absolute(units(1200)))
            .unwrap();
        spend(&f, &f.gifts, NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(), 700, UserSlot::User1);

        let yearly = service.yearly_overview(year, 6).unwrap();
        let gifts = yearly
            .categories
            .iter()
            .find(|r| r.summary.category_id == f.gifts.id)
            .unwrap();
        let projection = gifts.projection.unwrap();
        assert_eq!(projection.status, ProjectionStatus::Outpacing);
        assert_eq!(projection.should_be_spent_by_now, Money::from_cents(59836));

        let rent = yearly
            .categories
            .iter()
            .find(|r| r.summary.category_id == f.rent.id)
            .unwrap();
        assert!(rent.projection.is_none());

        assert!(service.yearly_overview(jan(), 6).unwrap_err().is_validation());
    }
}
