//! Linear yearly projection
//!
//! Assumes a yearly budget is spent evenly across 365 days and compares the
//! spend so far with what the elapsed share of the year implies.

use serde::Serialize;
use std::fmt;

use crate::models::Money;

const DAYS_PER_YEAR: f64 = 365.0;

/// How spending compares with the linear pace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionStatus {
    OnTrack,
    Outpacing,
    OverBudget,
}

impl fmt::Display for ProjectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnTrack => write!(f, "on track"),
            Self::Outpacing => write!(f, "outpacing"),
            Self::OverBudget => write!(f, "over budget"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    /// Spend the linear model expects by now
    pub should_be_spent_by_now: Money,
    /// Actual minus expected; positive means ahead of pace
    pub difference: Money,
    pub is_on_track: bool,
    pub status: ProjectionStatus,
}

/// Project a yearly budget at the end of `month_of_year` (1-12, clamped)
pub fn project_on_track(yearly_budget: Money, spent_to_date: Money, month_of_year: u32) -> Projection {
    let month = month_of_year.min(12);
    let days_elapsed = (f64::from(month) / 12.0 * DAYS_PER_YEAR).floor();

    // Daily rate times elapsed days, kept in unrounded cents for the
    // comparison. Multiplying first keeps a full year exact.
    let should = yearly_budget.cents() as f64 * days_elapsed / DAYS_PER_YEAR;
    let difference = spent_to_date.cents() as f64 - should;

    let status = if spent_to_date > yearly_budget {
        ProjectionStatus::OverBudget
    } else if difference > 0.0 {
        ProjectionStatus::Outpacing
    } else {
        ProjectionStatus::OnTrack
    };

    Projection {
        should_be_spent_by_now: Money::from_cents(should.round() as i64),
        difference: Money::from_cents(difference.round() as i64),
        is_on_track: difference <= 0.0,
        status,
    }
}
