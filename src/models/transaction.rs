//! Transaction model
//!
//! Transactions record money moving between the two participants and the
//! outside world. Only expenses (net of their reimbursements) count against
//! budgets.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, TransactionId};
use super::money::Money;
use super::period::BudgetPeriod;
use super::user::UserSlot;

/// Kind of transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money spent on a category
    #[default]
    Expense,
    /// Money received
    Income,
    /// One participant paying the other back
    Settlement,
    /// Money returned against an earlier expense
    Reimbursement,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expense => write!(f, "expense"),
            Self::Income => write!(f, "income"),
            Self::Settlement => write!(f, "settlement"),
            Self::Reimbursement => write!(f, "reimbursement"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            "settlement" => Ok(Self::Settlement),
            "reimbursement" => Ok(Self::Reimbursement),
            other => Err(format!("Unknown transaction type: {}", other)),
        }
    }
}

/// A recorded transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    /// Required for expenses, optional for everything else
    pub category_id: Option<CategoryId>,

    /// Always positive; the type decides the direction
    pub amount: Money,

    pub date: NaiveDate,

    #[serde(default)]
    pub transaction_type: TransactionType,

    pub paid_by: UserSlot,

    /// Recipient of a settlement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_to: Option<UserSlot>,

    /// The expense a reimbursement offsets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reimburses_transaction_id: Option<TransactionId>,

    #[serde(default)]
    pub excluded_from_monthly_budget: bool,

    #[serde(default)]
    pub excluded_from_yearly_budget: bool,

    #[serde(default)]
    pub description: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    fn base(transaction_type: TransactionType, date: NaiveDate, amount: Money, paid_by: UserSlot) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            category_id: None,
            amount,
            date,
            transaction_type,
            paid_by,
            paid_to: None,
            reimburses_transaction_id: None,
            excluded_from_monthly_budget: false,
            excluded_from_yearly_budget: false,
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn expense(category_id: CategoryId, date: NaiveDate, amount: Money, paid_by: UserSlot) -> Self {
        let mut txn = Self::base(TransactionType::Expense, date, amount, paid_by);
        txn.category_id = Some(category_id);
        txn
    }

    pub fn income(date: NaiveDate, amount: Money, paid_to: UserSlot) -> Self {
        let mut txn = Self::base(TransactionType::Income, date, amount, paid_to);
        txn.paid_to = Some(paid_to);
        txn
    }

    pub fn settlement(date: NaiveDate, amount: Money, paid_by: UserSlot) -> Self {
        let mut txn = Self::base(TransactionType::Settlement, date, amount, paid_by);
        txn.paid_to = Some(paid_by.other());
        txn
    }

    /// A reimbursement offsetting `expense`, received by `paid_to`
    pub fn reimbursement(expense: &Transaction, date: NaiveDate, amount: Money, paid_to: UserSlot) -> Self {
        let mut txn = Self::base(TransactionType::Reimbursement, date, amount, expense.paid_by);
        txn.category_id = expense.category_id;
        txn.paid_to = Some(paid_to);
        txn.reimburses_transaction_id = Some(expense.id);
        txn
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }

    /// Whether the exclusion flag for this period's granularity is set
    pub fn is_excluded_from(&self, period: &BudgetPeriod) -> bool {
        if period.is_yearly() {
            self.excluded_from_yearly_budget
        } else {
            self.excluded_from_monthly_budget
        }
    }

    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if !self.amount.is_positive() {
            return Err(TransactionValidationError::NonPositiveAmount);
        }
        match self.transaction_type {
            TransactionType::Expense if self.category_id.is_none() => {
                Err(TransactionValidationError::MissingCategory)
            }
            TransactionType::Reimbursement if self.reimburses_transaction_id.is_none() => {
                Err(TransactionValidationError::MissingReimbursedExpense)
            }
            TransactionType::Settlement if self.paid_to == Some(self.paid_by) => {
                Err(TransactionValidationError::SelfSettlement)
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({})",
            self.date, self.transaction_type, self.amount, self.paid_by
        )
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    NonPositiveAmount,
    MissingCategory,
    MissingReimbursedExpense,
    SelfSettlement,
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount => write!(f, "Transaction amount must be positive"),
            Self::MissingCategory => write!(f, "Expenses need a category"),
            Self::MissingReimbursedExpense => {
                write!(f, "Reimbursements must reference the expense they offset")
            }
            Self::SelfSettlement => write!(f, "A settlement cannot be paid to its payer"),
        }
    }
}

impl std::error::Error for TransactionValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_expense_requires_category_and_positive_amount() {
        let mut txn = Transaction::expense(CategoryId::new(), date(), Money::from_units(10), UserSlot::User1);
        assert!(txn.validate().is_ok());

        txn.category_id = None;
        assert_eq!(txn.validate(), Err(TransactionValidationError::MissingCategory));

        let zero = Transaction::income(date(), Money::zero(), UserSlot::User2);
        assert_eq!(zero.validate(), Err(TransactionValidationError::NonPositiveAmount));
    }

    #[test]
    fn test_reimbursement_links_to_expense() {
        let expense = Transaction::expense(CategoryId::new(), date(), Money::from_units(80), UserSlot::User2);
        let refund = Transaction::reimbursement(&expense, date(), Money::from_units(20), UserSlot::User2);

        assert_eq!(refund.reimburses_transaction_id, Some(expense.id));
        assert_eq!(refund.category_id, expense.category_id);
        assert!(refund.validate().is_ok());
    }

    #[test]
    fn test_settlement_goes_to_other_user() {
        let settle = Transaction::settlement(date(), Money::from_units(40), UserSlot::User1);
        assert_eq!(settle.paid_to, Some(UserSlot::User2));
        assert!(settle.validate().is_ok());
    }

    #[test]
    fn test_exclusion_flags_are_independent() {
        let mut txn = Transaction::expense(CategoryId::new(), date(), Money::from_units(10), UserSlot::User1);
        txn.excluded_from_monthly_budget = true;

        assert!(txn.is_excluded_from(&BudgetPeriod::monthly(2025, 1)));
        assert!(!txn.is_excluded_from(&BudgetPeriod::yearly(2025)));
    }
}
