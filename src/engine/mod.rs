//! Budget engine
//!
//! Pure functions over model rows: hierarchy classification, thresholds,
//! per-period summaries, hierarchy-aware totals, period propagation and the
//! yearly projection. Nothing here touches the filesystem; propagation talks
//! to persistence through the [`BudgetStore`] trait.

pub mod hierarchy;
pub mod projection;
pub mod propagation;
pub mod summary;
pub mod threshold;
pub mod totals;

pub use hierarchy::{MembershipConflict, SectorIndex};
pub use projection::{project_on_track, Projection, ProjectionStatus};
pub use propagation::{
    BudgetStore, PropagationKind, PropagationMarker, PropagationReport,
};
pub use summary::{BudgetSummary, SectorBudgetSummary};
pub use threshold::{BudgetStatus, Thresholds};
pub use totals::{aggregate, sort_for_display, BudgetTotals};
