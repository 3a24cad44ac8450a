//! Period propagation
//!
//! Copies a period's budgets into another period in three fixed steps:
//!
//! 1. upsert every category budget into the target, materialising a
//!    placeholder sector budget for each one's sector
//! 2. delete every sector budget of the target
//! 3. copy every sector budget of the source into the target
//!
//! A [`PropagationMarker`] is persisted before step 1 and cleared after step
//! 3. A failed run leaves its marker behind; re-running from step 1 repairs
//! the target.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::{TandemError, TandemResult};
use crate::models::{BudgetPeriod, CategoryBudget, CategoryId, SectorBudget};

/// What started a propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationKind {
    CarryForward,
    Copy,
}

impl fmt::Display for PropagationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CarryForward => write!(f, "carry-forward"),
            Self::Copy => write!(f, "copy"),
        }
    }
}

/// A propagation that has started but not finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationMarker {
    pub source: BudgetPeriod,
    pub target: BudgetPeriod,
    pub kind: PropagationKind,
    /// Last completed step, 0 before step 1 has finished
    pub step: u8,
    pub started_at: DateTime<Utc>,
}

impl PropagationMarker {
    pub fn new(source: BudgetPeriod, target: BudgetPeriod, kind: PropagationKind) -> Self {
        Self {
            source,
            target,
            kind,
            step: 0,
            started_at: Utc::now(),
        }
    }
}

/// Budget persistence as seen by propagation
///
/// Each method is a separate call that may fail on its own.
pub trait BudgetStore {
    fn category_budgets_for_period(&self, period: BudgetPeriod) -> TandemResult<Vec<CategoryBudget>>;

    fn sector_budgets_for_period(&self, period: BudgetPeriod) -> TandemResult<Vec<SectorBudget>>;

    /// Insert or replace the category's row for the budget's period
    fn upsert_category_budget(&self, budget: CategoryBudget) -> TandemResult<CategoryBudget>;

    /// Create a zero roll-up sector budget for the category's sector if that
    /// sector has none in `period`. Returns the row when one was created.
    fn ensure_sector_budget_placeholder(
        &self,
        category_id: CategoryId,
        period: BudgetPeriod,
    ) -> TandemResult<Option<SectorBudget>>;

    /// Returns how many rows were removed
    fn delete_sector_budgets_for_period(&self, period: BudgetPeriod) -> TandemResult<usize>;

    /// Insert or replace the sector's row for the budget's period
    fn upsert_sector_budget(&self, budget: SectorBudget) -> TandemResult<SectorBudget>;

    fn save_marker(&self, marker: &PropagationMarker) -> TandemResult<()>;

    fn clear_marker(&self, target: BudgetPeriod) -> TandemResult<()>;

    fn pending_markers(&self) -> TandemResult<Vec<PropagationMarker>>;
}

/// What a completed propagation did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropagationReport {
    pub source: BudgetPeriod,
    pub target: BudgetPeriod,
    pub category_budgets_copied: usize,
    pub placeholders_created: usize,
    pub sector_budgets_removed: usize,
    pub sector_budgets_copied: usize,
}

fn step_failed(step: u8, target: BudgetPeriod) -> impl Fn(TandemError) -> TandemError {
    move |e| {
        warn!(step, %target, error = %e, "propagation step failed");
        TandemError::Propagation {
            step,
            target: target.to_string(),
            reason: e.to_string(),
        }
    }
}

/// Run the three propagation steps from `source` into `target`
pub fn propagate<S: BudgetStore + ?Sized>(
    store: &S,
    source: BudgetPeriod,
    target: BudgetPeriod,
    kind: PropagationKind,
) -> TandemResult<PropagationReport> {
    let mut marker = PropagationMarker::new(source, target, kind);
    store.save_marker(&marker)?;
    info!(%source, %target, %kind, "propagating budgets");

    let mut report = PropagationReport {
        source,
        target,
        category_budgets_copied: 0,
        placeholders_created: 0,
        sector_budgets_removed: 0,
        sector_budgets_copied: 0,
    };

    // Step 1
    let fail = step_failed(1, target);
    for budget in store.category_budgets_for_period(source).map_err(&fail)? {
        let category_id = budget.category_id;
        store
            .upsert_category_budget(budget.copy_to(target))
            .map_err(&fail)?;
        report.category_budgets_copied += 1;

        if store
            .ensure_sector_budget_placeholder(category_id, target)
            .map_err(&fail)?
            .is_some()
        {
            report.placeholders_created += 1;
        }
    }
    marker.step = 1;
    store.save_marker(&marker).map_err(&fail)?;
    debug!(copied = report.category_budgets_copied, "step 1 done");

    // Step 2
    let fail = step_failed(2, target);
    report.sector_budgets_removed = store.delete_sector_budgets_for_period(target).map_err(&fail)?;
    marker.step = 2;
    store.save_marker(&marker).map_err(&fail)?;
    debug!(removed = report.sector_budgets_removed, "step 2 done");

    // Step 3
    let fail = step_failed(3, target);
    for budget in store.sector_budgets_for_period(source).map_err(&fail)? {
        store.upsert_sector_budget(budget.copy_to(target)).map_err(&fail)?;
        report.sector_budgets_copied += 1;
    }
    store.clear_marker(target).map_err(&fail)?;
    debug!(copied = report.sector_budgets_copied, "step 3 done");

    info!(
        %target,
        categories = report.category_budgets_copied,
        sectors = report.sector_budgets_copied,
        "propagation complete"
    );
    Ok(report)
}

fn ensure_source_has_rows<S: BudgetStore + ?Sized>(store: &S, source: BudgetPeriod) -> TandemResult<()> {
    if store.category_budgets_for_period(source)?.is_empty()
        && store.sector_budgets_for_period(source)?.is_empty()
    {
        return Err(TandemError::NothingToCopy(source.to_string()));
    }
    Ok(())
}

/// Carry the previous period's budgets into `target`
pub fn carry_forward<S: BudgetStore + ?Sized>(store: &S, target: BudgetPeriod) -> TandemResult<PropagationReport> {
    let source = target.prev();
    ensure_source_has_rows(store, source)?;
    propagate(store, source, target, PropagationKind::CarryForward)
}

/// Copy any period's budgets into another period of the same granularity
pub fn copy_period<S: BudgetStore + ?Sized>(
    store: &S,
    source: BudgetPeriod,
    target: BudgetPeriod,
) -> TandemResult<PropagationReport> {
    if source == target {
        return Err(TandemError::Validation(format!(
            "Cannot copy {} onto itself",
            source
        )));
    }
    if !source.same_granularity(&target) {
        return Err(TandemError::Validation(format!(
            "Cannot copy between {} and {}: periods differ in granularity",
            source, target
        )));
    }
    ensure_source_has_rows(store, source)?;
    propagate(store, source, target, PropagationKind::Copy)
}

/// Re-run every propagation that left a marker behind
pub fn resume_pending<S: BudgetStore + ?Sized>(store: &S) -> TandemResult<Vec<PropagationReport>> {
    let markers = store.pending_markers()?;
    if !markers.is_empty() {
        info!(count = markers.len(), "resuming interrupted propagations");
    }
    markers
        .into_iter()
        .map(|m| {
            debug!(period = %m.target, step = m.step, "resuming from step 1");
            propagate(store, m.source, m.target, m.kind)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetAmount, Money, Sector, SectorId};
    use std::cell::{Cell, RefCell};

    /// In-memory store that can be told to fail a named call once
    #[derive(Default)]
    struct MemoryStore {
        sectors: Vec<Sector>,
        category_budgets: RefCell<Vec<CategoryBudget>>,
        sector_budgets: RefCell<Vec<SectorBudget>>,
        markers: RefCell<Vec<PropagationMarker>>,
        calls: RefCell<Vec<&'static str>>,
        fail_once: Cell<Option<&'static str>>,
    }

    impl MemoryStore {
        fn call(&self, name: &'static str) -> TandemResult<()> {
            self.calls.borrow_mut().push(name);
            if self.fail_once.get() == Some(name) {
                self.fail_once.set(None);
                return Err(TandemError::Storage(format!("{} unavailable", name)));
            }
            Ok(())
        }

        fn category_rows(&self, period: BudgetPeriod) -> Vec<(CategoryId, BudgetAmount)> {
            let mut rows: Vec<_> = self
                .category_budgets
                .borrow()
                .iter()
                .filter(|b| b.period == period)
                .map(|b| (b.category_id, b.amount))
                .collect();
            rows.sort_by_key(|(id, _)| *id);
            rows
        }

        fn sector_rows(&self, period: BudgetPeriod) -> Vec<(SectorId, BudgetAmount, bool)> {
            let mut rows: Vec<_> = self
                .sector_budgets
                .borrow()
                .iter()
                .filter(|b| b.period == period)
                .map(|b| (b.sector_id, b.amount, b.auto_rollup))
                .collect();
            rows.sort_by_key(|(id, _, _)| *id);
            rows
        }
    }

    impl BudgetStore for MemoryStore {
        fn category_budgets_for_period(&self, period: BudgetPeriod) -> TandemResult<Vec<CategoryBudget>> {
            self.call("category_budgets_for_period")?;
            Ok(self
                .category_budgets
                .borrow()
                .iter()
                .filter(|b| b.period == period)
                .cloned()
                .collect())
        }

        fn sector_budgets_for_period(&self, period: BudgetPeriod) -> TandemResult<Vec<SectorBudget>> {
            self.call("sector_budgets_for_period")?;
            Ok(self
                .sector_budgets
                .borrow()
                .iter()
                .filter(|b| b.period == period)
                .cloned()
                .collect())
        }

        fn upsert_category_budget(&self, budget: CategoryBudget) -> TandemResult<CategoryBudget> {
            self.call("upsert_category_budget")?;
            let mut rows = self.category_budgets.borrow_mut();
            rows.retain(|b| !(b.category_id == budget.category_id && b.period == budget.period));
            rows.push(budget.clone());
            Ok(budget)
        }

        fn ensure_sector_budget_placeholder(
            &self,
            category_id: CategoryId,
            period: BudgetPeriod,
        ) -> TandemResult<Option<SectorBudget>> {
            self.call("ensure_sector_budget_placeholder")?;
            let Some(sector) = self.sectors.iter().find(|s| s.contains(category_id)) else {
                return Ok(None);
            };
            let mut rows = self.sector_budgets.borrow_mut();
            if rows.iter().any(|b| b.sector_id == sector.id && b.period == period) {
                return Ok(None);
            }
            let placeholder = SectorBudget::placeholder(sector.id, period);
            rows.push(placeholder.clone());
            Ok(Some(placeholder))
        }

        fn delete_sector_budgets_for_period(&self, period: BudgetPeriod) -> TandemResult<usize> {
            self.call("delete_sector_budgets_for_period")?;
            let mut rows = self.sector_budgets.borrow_mut();
            let before = rows.len();
            rows.retain(|b| b.period != period);
            Ok(before - rows.len())
        }

        fn upsert_sector_budget(&self, budget: SectorBudget) -> TandemResult<SectorBudget> {
            self.call("upsert_sector_budget")?;
            let mut rows = self.sector_budgets.borrow_mut();
            rows.retain(|b| !(b.sector_id == budget.sector_id && b.period == budget.period));
            rows.push(budget.clone());
            Ok(budget)
        }

        fn save_marker(&self, marker: &PropagationMarker) -> TandemResult<()> {
            self.call("save_marker")?;
            let mut markers = self.markers.borrow_mut();
            markers.retain(|m| m.target != marker.target);
            markers.push(marker.clone());
            Ok(())
        }

        fn clear_marker(&self, target: BudgetPeriod) -> TandemResult<()> {
            self.call("clear_marker")?;
            self.markers.borrow_mut().retain(|m| m.target != target);
            Ok(())
        }

        fn pending_markers(&self) -> TandemResult<Vec<PropagationMarker>> {
            Ok(self.markers.borrow().clone())
        }
    }

    fn jan() -> BudgetPeriod {
        BudgetPeriod::monthly(2025, 1)
    }

    fn feb() -> BudgetPeriod {
        BudgetPeriod::monthly(2025, 2)
    }

    /// Home = {Rent, Utilities} with a manual January budget; Food = {Groceries}
    /// with no sector budget; February has a stale Home row
    fn seeded() -> MemoryStore {
        let rent = CategoryId::new();
        let utilities = CategoryId::new();
        let groceries = CategoryId::new();
        let home = Sector::with_categories("Home", [rent, utilities]);
        let food = Sector::with_categories("Food", [groceries]);

        let store = MemoryStore {
            sectors: vec![home.clone(), food],
            ..Default::default()
        };
        *store.category_budgets.borrow_mut() = vec![
            CategoryBudget::new(rent, jan(), BudgetAmount::absolute(Money::from_units(1000))),
            CategoryBudget::new(
                utilities,
                jan(),
                BudgetAmount::split(Money::from_units(100), Money::from_units(150)),
            ),
            CategoryBudget::new(groceries, jan(), BudgetAmount::absolute(Money::from_units(400))),
        ];
        *store.sector_budgets.borrow_mut() = vec![
            SectorBudget::new(home.id, jan(), BudgetAmount::absolute(Money::from_units(1500)), false),
            SectorBudget::new(home.id, feb(), BudgetAmount::absolute(Money::from_units(9)), true),
        ];
        store
    }

    #[test]
    fn test_target_matches_source() {
        let store = seeded();
        let report = carry_forward(&store, feb()).unwrap();

        assert_eq!(report.category_budgets_copied, 3);
        assert_eq!(report.sector_budgets_copied, 1);
        assert_eq!(store.category_rows(feb()), store.category_rows(jan()));

        let sectors = store.sector_rows(feb());
        assert_eq!(sectors, store.sector_rows(jan()));
        // the stale February row and the Food placeholder are both gone
        assert_eq!(sectors.len(), 1);
        assert!(!sectors[0].2);
        assert!(store.pending_markers().unwrap().is_empty());
    }

    #[test]
    fn test_propagation_is_idempotent() {
        let store = seeded();
        carry_forward(&store, feb()).unwrap();
        let once = (store.category_rows(feb()), store.sector_rows(feb()));

        carry_forward(&store, feb()).unwrap();
        let twice = (store.category_rows(feb()), store.sector_rows(feb()));

        assert_eq!(once, twice);
    }

    #[test]
    fn test_steps_run_in_order() {
        let store = seeded();
        store.calls.borrow_mut().clear();
        propagate(&store, jan(), feb(), PropagationKind::Copy).unwrap();

        let calls = store.calls.borrow();
        let position = |name: &str| calls.iter().position(|c| *c == name).unwrap();
        let last = |name: &str| calls.iter().rposition(|c| *c == name).unwrap();

        assert!(last("upsert_category_budget") < position("delete_sector_budgets_for_period"));
        assert!(last("ensure_sector_budget_placeholder") < position("delete_sector_budgets_for_period"));
        assert!(position("delete_sector_budgets_for_period") < position("upsert_sector_budget"));
        assert_eq!(*calls.last().unwrap(), "clear_marker");
    }

    #[test]
    fn test_failure_at_step_two_then_resume_repairs() {
        let store = seeded();
        store.fail_once.set(Some("delete_sector_budgets_for_period"));

        let err = carry_forward(&store, feb()).unwrap_err();
        match &err {
            TandemError::Propagation { step, target, reason } => {
                assert_eq!(*step, 2);
                assert_eq!(target, "2025-02");
                assert!(reason.contains("delete_sector_budgets_for_period unavailable"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!store.calls.borrow().contains(&"upsert_sector_budget"));

        let pending = store.pending_markers().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].step, 1);
        assert_eq!(pending[0].kind, PropagationKind::CarryForward);

        let reports = resume_pending(&store).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(store.pending_markers().unwrap().is_empty());
        assert_eq!(store.sector_rows(feb()), store.sector_rows(jan()));
        assert_eq!(store.category_rows(feb()), store.category_rows(jan()));
    }

    #[test]
    fn test_failure_at_step_one_is_reported() {
        let store = seeded();
        store.fail_once.set(Some("ensure_sector_budget_placeholder"));

        let err = copy_period(&store, jan(), feb()).unwrap_err();
        assert!(matches!(err, TandemError::Propagation { step: 1, .. }));
        assert!(!store.calls.borrow().contains(&"delete_sector_budgets_for_period"));
    }

    #[test]
    fn test_copy_rejects_bad_periods() {
        let store = seeded();
        assert!(copy_period(&store, jan(), jan()).unwrap_err().is_validation());
        assert!(copy_period(&store, jan(), BudgetPeriod::yearly(2025))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_empty_source_is_nothing_to_copy() {
        let store = seeded();
        let err = copy_period(&store, BudgetPeriod::monthly(2024, 6), feb()).unwrap_err();
        assert!(matches!(err, TandemError::NothingToCopy(_)));
        // the target was left alone
        assert_eq!(store.sector_rows(feb()).len(), 1);
    }
}
