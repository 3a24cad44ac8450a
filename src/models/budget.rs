//! Budget rows
//!
//! One [`CategoryBudget`] per category per period and one [`SectorBudget`]
//! per sector per period. Both carry a [`BudgetAmount`], which is either a
//! single absolute figure or a per-user split.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BudgetId, CategoryId, SectorId};
use super::money::Money;
use super::period::BudgetPeriod;
use super::user::UserSlot;

/// How a budget figure is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "budget_type", rename_all = "lowercase")]
pub enum BudgetAmount {
    /// One shared figure
    Absolute { amount: Money },
    /// Each participant has their own share
    Split {
        user1_amount: Money,
        user2_amount: Money,
    },
}

impl BudgetAmount {
    pub fn absolute(amount: Money) -> Self {
        Self::Absolute { amount }
    }

    pub fn split(user1_amount: Money, user2_amount: Money) -> Self {
        Self::Split {
            user1_amount,
            user2_amount,
        }
    }

    /// The nominal total of the budget
    pub fn total(&self) -> Money {
        match self {
            Self::Absolute { amount } => *amount,
            Self::Split {
                user1_amount,
                user2_amount,
            } => *user1_amount + *user2_amount,
        }
    }

    /// A participant's share; absolute budgets are shared as equal halves
    pub fn user_share(&self, user: UserSlot) -> Money {
        let (first, second) = match self {
            Self::Absolute { amount } => amount.halves(),
            Self::Split {
                user1_amount,
                user2_amount,
            } => (*user1_amount, *user2_amount),
        };
        match user {
            UserSlot::User1 => first,
            UserSlot::User2 => second,
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, Self::Split { .. })
    }

    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        let negative = match self {
            Self::Absolute { amount } => amount.is_negative(),
            Self::Split {
                user1_amount,
                user2_amount,
            } => user1_amount.is_negative() || user2_amount.is_negative(),
        };
        if negative {
            return Err(BudgetValidationError::NegativeBudget);
        }
        Ok(())
    }
}

impl Default for BudgetAmount {
    fn default() -> Self {
        Self::absolute(Money::zero())
    }
}

impl fmt::Display for BudgetAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute { amount } => write!(f, "{}", amount),
            Self::Split {
                user1_amount,
                user2_amount,
            } => write!(f, "{} ({} + {})", self.total(), user1_amount, user2_amount),
        }
    }
}

/// A category's budget for one period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryBudget {
    pub id: BudgetId,

    pub category_id: CategoryId,

    pub period: BudgetPeriod,

    pub amount: BudgetAmount,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl CategoryBudget {
    pub fn new(category_id: CategoryId, period: BudgetPeriod, amount: BudgetAmount) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            category_id,
            period,
            amount,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_amount(&mut self, amount: BudgetAmount) {
        self.amount = amount;
        self.updated_at = Utc::now();
    }

    /// A fresh row for another period with the same amount
    pub fn copy_to(&self, period: BudgetPeriod) -> Self {
        Self::new(self.category_id, period, self.amount)
    }

    pub fn total(&self) -> Money {
        self.amount.total()
    }
}

/// A sector's budget for one period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorBudget {
    pub id: BudgetId,

    pub sector_id: SectorId,

    pub period: BudgetPeriod,

    pub amount: BudgetAmount,

    /// When set, the sector's total is the sum of its categories' budgets
    /// and `amount` is not meaningful on its own
    #[serde(default)]
    pub auto_rollup: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl SectorBudget {
    pub fn new(
        sector_id: SectorId,
        period: BudgetPeriod,
        amount: BudgetAmount,
        auto_rollup: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            sector_id,
            period,
            amount,
            auto_rollup,
            created_at: now,
            updated_at: now,
        }
    }

    /// The default row created when a category budget is saved under a
    /// sector that has none for the period
    pub fn placeholder(sector_id: SectorId, period: BudgetPeriod) -> Self {
        Self::new(sector_id, period, BudgetAmount::default(), true)
    }

    pub fn set_amount(&mut self, amount: BudgetAmount, auto_rollup: bool) {
        self.amount = amount;
        self.auto_rollup = auto_rollup;
        self.updated_at = Utc::now();
    }

    /// A fresh row for another period with the same configuration
    pub fn copy_to(&self, period: BudgetPeriod) -> Self {
        Self::new(self.sector_id, period, self.amount, self.auto_rollup)
    }

    pub fn total(&self) -> Money {
        self.amount.total()
    }
}

/// Validation errors for budget rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetValidationError {
    NegativeBudget,
}

impl fmt::Display for BudgetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeBudget => write!(f, "Budget amount cannot be negative"),
        }
    }
}

impl std::error::Error for BudgetValidationError {}
