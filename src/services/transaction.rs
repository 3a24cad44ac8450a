//! Transaction service
//!
//! Recording expenses, income, settlements and reimbursements, listing them
//! with filters, and deleting them.

use chrono::NaiveDate;
use tracing::info;

use crate::audit::EntityType;
use crate::error::{TandemError, TandemResult};
use crate::models::{BudgetPeriod, CategoryId, Money, Transaction, TransactionId, TransactionType, UserSlot};
use crate::storage::Storage;

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
}

/// Options for filtering transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub category_id: Option<CategoryId>,
    pub period: Option<BudgetPeriod>,
    pub transaction_type: Option<TransactionType>,
    pub limit: Option<usize>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn period(mut self, period: BudgetPeriod) -> Self {
        self.period = Some(period);
        self
    }

    pub fn transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Input for recording a transaction
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
    pub amount: Money,
    /// Payer for expenses and settlements, recipient for income and
    /// reimbursements
    pub user: UserSlot,
    /// Required for expenses
    pub category_id: Option<CategoryId>,
    /// Required for reimbursements
    pub reimburses: Option<TransactionId>,
    pub description: Option<String>,
    pub excluded_from_monthly_budget: bool,
    pub excluded_from_yearly_budget: bool,
}

impl CreateTransactionInput {
    pub fn expense(category_id: CategoryId, date: NaiveDate, amount: Money, paid_by: UserSlot) -> Self {
        Self {
            transaction_type: TransactionType::Expense,
            date,
            amount,
            user: paid_by,
            category_id: Some(category_id),
            reimburses: None,
            description: None,
            excluded_from_monthly_budget: false,
            excluded_from_yearly_budget: false,
        }
    }
}

impl<'a> TransactionService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record a transaction
    pub fn create(&self, input: CreateTransactionInput) -> TandemResult<Transaction> {
        let mut txn = match input.transaction_type {
            TransactionType::Expense => {
                let category_id = input.category_id.ok_or_else(|| {
                    TandemError::Validation("Expenses need a category".into())
                })?;
                self.storage
                    .hierarchy
                    .get_category(category_id)?
                    .ok_or_else(|| TandemError::category_not_found(category_id.to_string()))?;
                Transaction::expense(category_id, input.date, input.amount, input.user)
            }
            TransactionType::Income => Transaction::income(input.date, input.amount, input.user),
            TransactionType::Settlement => Transaction::settlement(input.date, input.amount, input.user),
            TransactionType::Reimbursement => {
                let expense_id = input.reimburses.ok_or_else(|| {
                    TandemError::Validation(
                        "Reimbursements must reference the expense they offset".into(),
                    )
                })?;
                let expense = self
                    .storage
                    .transactions
                    .get(expense_id)?
                    .ok_or_else(|| TandemError::transaction_not_found(expense_id.to_string()))?;
                if !expense.is_expense() {
                    return Err(TandemError::Validation(format!(
                        "Transaction {} is a {}, not an expense",
                        expense.id, expense.transaction_type
                    )));
                }
                Transaction::reimbursement(&expense, input.date, input.amount, input.user)
            }
        };

        if let Some(description) = input.description {
            txn.description = description.trim().to_string();
        }
        txn.excluded_from_monthly_budget = input.excluded_from_monthly_budget;
        txn.excluded_from_yearly_budget = input.excluded_from_yearly_budget;

        txn.validate()
            .map_err(|e| TandemError::Validation(e.to_string()))?;

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;

        self.storage.log_create(
            EntityType::Transaction,
            txn.id.to_string(),
            Some(self.label(&txn)?),
            &txn,
        )?;

        info!(id = %txn.id, kind = %txn.transaction_type, amount = %txn.amount, "recorded transaction");
        Ok(txn)
    }

    pub fn get(&self, id: TransactionId) -> TandemResult<Option<Transaction>> {
        self.storage.transactions.get(id)
    }

    /// Find a transaction by full id or by the short id shown in listings
    pub fn find(&self, identifier: &str) -> TandemResult<Option<Transaction>> {
        if let Ok(id) = identifier.parse::<TransactionId>() {
            return self.storage.transactions.get(id);
        }
        let transactions = self.storage.transactions.get_all()?;
        Ok(transactions
            .into_iter()
            .find(|t| t.id.to_string() == identifier))
    }

    /// List transactions, newest last
    pub fn list(&self, filter: TransactionFilter) -> TandemResult<Vec<Transaction>> {
        let mut transactions = if let Some(category_id) = filter.category_id {
            self.storage.transactions.get_by_category(category_id)?
        } else if let Some(period) = filter.period {
            self.storage
                .transactions
                .get_by_date_range(period.start_date(), period.end_date())?
        } else {
            self.storage.transactions.get_all()?
        };

        if let Some(period) = filter.period {
            transactions.retain(|t| period.contains(t.date));
        }
        if let Some(kind) = filter.transaction_type {
            transactions.retain(|t| t.transaction_type == kind);
        }

        if let Some(limit) = filter.limit {
            let skip = transactions.len().saturating_sub(limit);
            transactions.drain(..skip);
        }

        Ok(transactions)
    }

    /// Delete a transaction. Expenses that still have reimbursements
    /// against them can't be deleted.
    pub fn delete(&self, id: TransactionId) -> TandemResult<Transaction> {
        let txn = self
            .storage
            .transactions
            .get(id)?
            .ok_or_else(|| TandemError::transaction_not_found(id.to_string()))?;

        let reimbursements = self.storage.transactions.reimbursements_of(id)?;
        if !reimbursements.is_empty() {
            return Err(TandemError::Validation(format!(
                "Transaction {} has {} reimbursement(s); delete those first",
                id,
                reimbursements.len()
            )));
        }

        let label = self.label(&txn)?;
        self.storage.transactions.delete(id)?;
        self.storage.transactions.save()?;

        self.storage
            .log_delete(EntityType::Transaction, id.to_string(), Some(label), &txn)?;

        Ok(txn)
    }

    /// "2025-01-04 expense Groceries"
    fn label(&self, txn: &Transaction) -> TandemResult<String> {
        let category = match txn.category_id {
            Some(id) => self.storage.hierarchy.get_category(id)?.map(|c| c.name),
            None => None,
        };
        Ok(match category {
            Some(name) => format!("{} {} {}", txn.date, txn.transaction_type, name),
            None => format!("{} {}", txn.date, txn.transaction_type),
        })
    }
}
