//! Transaction repository
//!
//! Keeps a category index next to the id map so per-category lookups don't
//! scan every transaction.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TandemResult;
use crate::models::{CategoryId, Transaction, TransactionId};

use super::file_io::{read_json, write_json_atomic};
use super::poisoned;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TransactionData {
    #[serde(default)]
    transactions: Vec<Transaction>,
}

pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
    by_category: RwLock<HashMap<CategoryId, Vec<TransactionId>>>,
}

fn sort_by_date(list: &mut [Transaction]) {
    list.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
}

impl TransactionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_category: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> TandemResult<()> {
        let file_data: TransactionData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(poisoned)?;
        let mut by_category = self.by_category.write().map_err(poisoned)?;
        data.clear();
        by_category.clear();

        for txn in file_data.transactions {
            if let Some(category_id) = txn.category_id {
                by_category.entry(category_id).or_default().push(txn.id);
            }
            data.insert(txn.id, txn);
        }

        Ok(())
    }

    pub fn save(&self) -> TandemResult<()> {
        let transactions = self.get_all()?;
        write_json_atomic(&self.path, &TransactionData { transactions })
    }

    pub fn get(&self, id: TransactionId) -> TandemResult<Option<Transaction>> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.get(&id).cloned())
    }

    /// All transactions by date, then entry order
    pub fn get_all(&self) -> TandemResult<Vec<Transaction>> {
        let data = self.data.read().map_err(poisoned)?;
        let mut list: Vec<_> = data.values().cloned().collect();
        sort_by_date(&mut list);
        Ok(list)
    }

    pub fn get_by_category(&self, category_id: CategoryId) -> TandemResult<Vec<Transaction>> {
        let data = self.data.read().map_err(poisoned)?;
        let by_category = self.by_category.read().map_err(poisoned)?;

        let mut list: Vec<_> = by_category
            .get(&category_id)
            .map(|ids| ids.iter().filter_map(|id| data.get(id).cloned()).collect())
            .unwrap_or_default();
        sort_by_date(&mut list);
        Ok(list)
    }

    /// Transactions dated within `start..=end`
    pub fn get_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> TandemResult<Vec<Transaction>> {
        let data = self.data.read().map_err(poisoned)?;
        let mut list: Vec<_> = data
            .values()
            .filter(|t| t.date >= start && t.date <= end)
            .cloned()
            .collect();
        sort_by_date(&mut list);
        Ok(list)
    }

    /// Reimbursements pointing at `expense_id`
    pub fn reimbursements_of(&self, expense_id: TransactionId) -> TandemResult<Vec<Transaction>> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data
            .values()
            .filter(|t| t.reimburses_transaction_id == Some(expense_id))
            .cloned()
            .collect())
    }

    pub fn upsert(&self, txn: Transaction) -> TandemResult<()> {
        let mut data = self.data.write().map_err(poisoned)?;
        let mut by_category = self.by_category.write().map_err(poisoned)?;

        if let Some(old_category) = data.get(&txn.id).and_then(|old| old.category_id) {
            if let Some(ids) = by_category.get_mut(&old_category) {
                ids.retain(|id| *id != txn.id);
            }
        }
        if let Some(category_id) = txn.category_id {
            by_category.entry(category_id).or_default().push(txn.id);
        }

        data.insert(txn.id, txn);
        Ok(())
    }

    pub fn delete(&self, id: TransactionId) -> TandemResult<Option<Transaction>> {
        let mut data = self.data.write().map_err(poisoned)?;
        let mut by_category = self.by_category.write().map_err(poisoned)?;

        let removed = data.remove(&id);
        if let Some(category_id) = removed.as_ref().and_then(|t| t.category_id) {
            if let Some(ids) = by_category.get_mut(&category_id) {
                ids.retain(|existing| *existing != id);
            }
        }
        Ok(removed)
    }

    pub fn count(&self) -> TandemResult<usize> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, UserSlot};
    use tempfile::TempDir;

    fn repo() -> (TransactionRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let repo = TransactionRepository::new(temp_dir.path().join("transactions.json"));
        (repo, temp_dir)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn test_category_index_follows_updates() {
        let (repo, _temp) = repo();
        let groceries = CategoryId::new();
        let dining = CategoryId::new();

        let mut txn = Transaction::expense(groceries, date(4), Money::from_units(30), UserSlot::User1);
        repo.upsert(txn.clone()).unwrap();
        assert_eq!(repo.get_by_category(groceries).unwrap().len(), 1);

        txn.category_id = Some(dining);
        repo.upsert(txn.clone()).unwrap();
        assert!(repo.get_by_category(groceries).unwrap().is_empty());
        assert_eq!(repo.get_by_category(dining).unwrap().len(), 1);

        repo.delete(txn.id).unwrap();
        assert!(repo.get_by_category(dining).unwrap().is_empty());
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_date_range_is_inclusive_and_sorted() {
        let (repo, _temp) = repo();
        let category = CategoryId::new();
        for day in [20, 1, 10, 31] {
            repo.upsert(Transaction::expense(category, date(day), Money::from_units(1), UserSlot::User2))
                .unwrap();
        }

        let days: Vec<u32> = repo
            .get_by_date_range(date(1), date(20))
            .unwrap()
            .iter()
            .map(|t| chrono::Datelike::day(&t.date))
            .collect();
        assert_eq!(days, vec![1, 10, 20]);
    }

    #[test]
    fn test_reimbursements_of() {
        let (repo, _temp) = repo();
        let expense = Transaction::expense(CategoryId::new(), date(2), Money::from_units(80), UserSlot::User1);
        let refund = Transaction::reimbursement(&expense, date(5), Money::from_units(20), UserSlot::User1);
        repo.upsert(expense.clone()).unwrap();
        repo.upsert(refund.clone()).unwrap();

        let found = repo.reimbursements_of(expense.id).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, refund.id);
    }

    #[test]
    fn test_save_and_reload() {
        let (repo, temp) = repo();
        repo.upsert(Transaction::income(date(1), Money::from_units(3000), UserSlot::User2))
            .unwrap();
        repo.save().unwrap();

        let reloaded = TransactionRepository::new(temp.path().join("transactions.json"));
        reloaded.load().unwrap();
        assert_eq!(reloaded.count().unwrap(), 1);
    }
}
