//! Transaction display formatting

use std::collections::HashMap;

use tabled::builder::Builder;
use tabled::settings::Style;

use super::{format_money, truncate};
use crate::config::Settings;
use crate::models::{Category, CategoryId, Transaction, TransactionType};

/// Format transactions as a register
pub fn format_transaction_register(
    transactions: &[Transaction],
    categories: &[Category],
    settings: &Settings,
) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let names: HashMap<CategoryId, &str> = categories.iter().map(|c| (c.id, c.name.as_str())).collect();

    let mut builder = Builder::default();
    builder.push_record(["ID", "Date", "Type", "Category", "Amount", "By", "Description"]);

    for txn in transactions {
        let category = txn
            .category_id
            .map(|id| names.get(&id).copied().unwrap_or("(deleted)"))
            .unwrap_or("");

        let mut kind = txn.transaction_type.to_string();
        if txn.excluded_from_monthly_budget || txn.excluded_from_yearly_budget {
            kind.push('*');
        }

        let who = match (txn.transaction_type, txn.paid_to) {
            (TransactionType::Settlement, Some(to)) => format!(
                "{} -> {}",
                settings.user_name(txn.paid_by),
                settings.user_name(to)
            ),
            (TransactionType::Income | TransactionType::Reimbursement, Some(to)) => {
                settings.user_name(to).to_string()
            }
            _ => settings.user_name(txn.paid_by).to_string(),
        };

        builder.push_record([
            txn.id.to_string(),
            txn.date.format("%Y-%m-%d").to_string(),
            kind,
            category.to_string(),
            format_money(txn.amount, &settings.currency_symbol),
            who,
            truncate(&txn.description, 30),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::sharp());
    format!("{}\n", table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, UserSlot};
    use chrono::NaiveDate;

    #[test]
    fn test_empty_register() {
        let output = format_transaction_register(&[], &[], &Settings::default());
        assert_eq!(output, "No transactions found.\n");
    }

    #[test]
    fn test_register_rows() {
        let groceries = Category::new("Groceries");
        let date = NaiveDate::from_ymd_opt(2025, 1, 4).unwrap();
        let mut expense = Transaction::expense(groceries.id, date, Money::from_units(82), UserSlot::User2);
        expense.excluded_from_monthly_budget = true;
        let settlement = Transaction::settlement(date, Money::from_units(40), UserSlot::User1);

        let output = format_transaction_register(
            &[expense, settlement],
            &[groceries],
            &Settings::default(),
        );
        assert!(output.contains("Groceries"));
        assert!(output.contains("expense*"));
        assert!(output.contains("$82.00"));
        assert!(output.contains("User 1 -> User 2"));
    }
}
