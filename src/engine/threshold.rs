//! Threshold classification
//!
//! Maps a utilization percentage to a status tier. Every percentage computed
//! against a budget goes through [`utilization_percentage`], which defines the
//! zero-budget case instead of dividing by zero.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Money;

/// Status tier of a budget line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Under,
    Warning,
    Over,
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Under => write!(f, "under"),
            Self::Warning => write!(f, "warning"),
            Self::Over => write!(f, "over"),
        }
    }
}

/// Classify a percentage.
///
/// With only `yellow`, the over tier is implicit at anything above 100%.
/// With `red` as well, each threshold is compared on its own.
pub fn classify(percentage: f64, yellow: f64, red: Option<f64>) -> BudgetStatus {
    let over = match red {
        Some(red) => percentage >= red,
        None => percentage > 100.0,
    };
    if over {
        BudgetStatus::Over
    } else if percentage >= yellow {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Under
    }
}

/// `spent / budget * 100`.
///
/// A budget of exactly zero reads as 100% once anything has been spent and
/// 0% otherwise.
pub fn utilization_percentage(spent: Money, budget: Money) -> f64 {
    if budget.is_zero() {
        return if spent.is_positive() { 100.0 } else { 0.0 };
    }
    spent.as_f64() / budget.as_f64() * 100.0
}

/// Share of the budget left, in percent (may be negative when over)
pub fn remaining_percentage(spent: Money, budget: Money) -> f64 {
    100.0 - utilization_percentage(spent, budget)
}

/// Configured warning thresholds, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub yellow: f64,
    pub red: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            yellow: 80.0,
            red: 100.0,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ThresholdError> {
        if !(self.yellow > 0.0 && self.yellow.is_finite()) {
            return Err(ThresholdError::NotPositive(self.yellow));
        }
        if !(self.red.is_finite() && self.yellow <= self.red) {
            return Err(ThresholdError::Inverted {
                yellow: self.yellow,
                red: self.red,
            });
        }
        Ok(())
    }

    /// Progress-bar classification: yellow only, over above 100%
    pub fn bar_status(&self, spent: Money, budget: Money) -> BudgetStatus {
        classify(utilization_percentage(spent, budget), self.yellow, None)
    }

    /// Budget-card classification using both thresholds
    pub fn card_status(&self, spent: Money, budget: Money) -> BudgetStatus {
        classify(
            utilization_percentage(spent, budget),
            self.yellow,
            Some(self.red),
        )
    }
}

/// Invalid threshold configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ThresholdError {
    NotPositive(f64),
    Inverted { yellow: f64, red: f64 },
}

impl fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPositive(v) => write!(f, "Warning threshold must be positive, got {}", v),
            Self::Inverted { yellow, red } => write!(
                f,
                "Warning threshold {} must not exceed the over threshold {}",
                yellow, red
            ),
        }
    }
}

impl std::error::Error for ThresholdError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_budget_rule() {
        assert_eq!(utilization_percentage(Money::zero(), Money::zero()), 0.0);
        assert_eq!(utilization_percentage(Money::from_units(5), Money::zero()), 100.0);

        let thresholds = Thresholds::default();
        assert_eq!(
            thresholds.card_status(Money::from_units(5), Money::zero()),
            BudgetStatus::Over
        );
        assert_eq!(
            thresholds.card_status(Money::zero(), Money::zero()),
            BudgetStatus::Under
        );
    }

    #[test]
    fn test_single_threshold_over_is_strictly_above_100() {
        assert_eq!(classify(100.0, 80.0, None), BudgetStatus::Warning);
        assert_eq!(classify(100.01, 80.0, None), BudgetStatus::Over);
        assert_eq!(classify(79.9, 80.0, None), BudgetStatus::Under);
        assert_eq!(classify(80.0, 80.0, None), BudgetStatus::Warning);
    }

    #[test]
    fn test_two_thresholds_compare_independently() {
        assert_eq!(classify(90.0, 75.0, Some(90.0)), BudgetStatus::Over);
        assert_eq!(classify(89.0, 75.0, Some(90.0)), BudgetStatus::Warning);
        assert_eq!(classify(10.0, 75.0, Some(90.0)), BudgetStatus::Under);
    }

    #[test]
    fn test_bar_and_card_disagree_at_exactly_full() {
        let thresholds = Thresholds::default();
        let budget = Money::from_units(100);
        assert_eq!(thresholds.bar_status(budget, budget), BudgetStatus::Warning);
        assert_eq!(thresholds.card_status(budget, budget), BudgetStatus::Over);
    }

    #[test]
    fn test_remaining_percentage() {
        let budget = Money::from_units(200);
        assert_eq!(remaining_percentage(Money::from_units(50), budget), 75.0);
        assert_eq!(remaining_percentage(Money::from_units(300), budget), -50.0);
    }

    #[test]
    fn test_threshold_validation() {
        assert!(Thresholds::default().validate().is_ok());
        assert!(Thresholds { yellow: 0.0, red: 100.0 }.validate().is_err());
        assert!(Thresholds { yellow: 90.0, red: 80.0 }.validate().is_err());
    }
}
