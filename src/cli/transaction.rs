//! Transaction CLI commands
//!
//! Implements CLI commands for recording, listing and deleting transactions.

use chrono::{Local, NaiveDate};
use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::transaction::format_transaction_register;
use crate::error::{TandemError, TandemResult};
use crate::models::{Money, TransactionType, UserSlot};
use crate::services::{
    CreateTransactionInput, HierarchyService, PeriodService, TransactionFilter, TransactionService,
};
use crate::storage::Storage;

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record a transaction
    Add {
        /// Amount, always positive (e.g., "42.50")
        amount: String,
        /// expense, income, settlement or reimbursement
        #[arg(short = 't', long = "type", default_value = "expense")]
        transaction_type: String,
        /// Category name or ID (required for expenses)
        #[arg(short, long)]
        category: Option<String>,
        /// Who paid (or, for income and reimbursements, who received):
        /// a participant name, user1 or user2
        #[arg(short, long, default_value = "user1")]
        by: String,
        /// Transaction date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// ID of the expense a reimbursement offsets
        #[arg(long)]
        reimburses: Option<String>,
        /// Free-text description
        #[arg(long)]
        description: Option<String>,
        /// Leave out of monthly budgets
        #[arg(long)]
        exclude_monthly: bool,
        /// Leave out of yearly budgets
        #[arg(long)]
        exclude_yearly: bool,
    },

    /// List transactions
    List {
        /// Only transactions in this period
        #[arg(short, long)]
        period: Option<String>,
        /// Filter by category name or ID
        #[arg(short = 'C', long)]
        category: Option<String>,
        /// Filter by type
        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,
        /// Number of most recent transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },
}

fn parse_date(s: &str) -> TandemResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| TandemError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", s)))
}

fn parse_type(s: &str) -> TandemResult<TransactionType> {
    s.parse().map_err(TandemError::Validation)
}

fn resolve_user(settings: &Settings, s: &str) -> TandemResult<UserSlot> {
    settings
        .resolve_user(s)
        .ok_or_else(|| TandemError::Validation(format!("Unknown participant: {}", s)))
}

/// Handle a transaction command
pub fn handle_transaction_command(
    storage: &Storage,
    settings: &Settings,
    cmd: TransactionCommands,
) -> TandemResult<()> {
    let service = TransactionService::new(storage);
    let hierarchy = HierarchyService::new(storage);

    match cmd {
        TransactionCommands::Add {
            amount,
            transaction_type,
            category,
            by,
            date,
            reimburses,
            description,
            exclude_monthly,
            exclude_yearly,
        } => {
            let amount = Money::parse(&amount)
                .map_err(|e| TandemError::Validation(format!("Invalid amount: {}", e)))?;
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => Local::now().date_naive(),
            };
            let category_id = category
                .map(|c| hierarchy.require_category(&c))
                .transpose()?
                .map(|c| c.id);
            let reimburses = match reimburses {
                Some(id) => Some(
                    service
                        .find(&id)?
                        .ok_or_else(|| TandemError::transaction_not_found(&id))?
                        .id,
                ),
                None => None,
            };

            let txn = service.create(CreateTransactionInput {
                transaction_type: parse_type(&transaction_type)?,
                date,
                amount,
                user: resolve_user(settings, &by)?,
                category_id,
                reimburses,
                description,
                excluded_from_monthly_budget: exclude_monthly,
                excluded_from_yearly_budget: exclude_yearly,
            })?;

            println!(
                "Recorded {} of {} on {}",
                txn.transaction_type,
                txn.amount.format_with_symbol(&settings.currency_symbol),
                txn.date
            );
            println!("  ID: {}", txn.id);
        }

        TransactionCommands::List {
            period,
            category,
            transaction_type,
            limit,
        } => {
            let mut filter = TransactionFilter::new().limit(limit);
            if let Some(period) = period {
                filter = filter.period(PeriodService::new().parse(&period)?);
            }
            if let Some(category) = category {
                filter = filter.category(hierarchy.require_category(&category)?.id);
            }
            if let Some(kind) = transaction_type {
                filter = filter.transaction_type(parse_type(&kind)?);
            }

            let transactions = service.list(filter)?;
            let categories = hierarchy.list_categories()?;
            print!(
                "{}",
                format_transaction_register(&transactions, &categories, settings)
            );
        }

        TransactionCommands::Delete { id } => {
            let txn = service
                .find(&id)?
                .ok_or_else(|| TandemError::transaction_not_found(&id))?;
            service.delete(txn.id)?;
            println!("Deleted transaction {}", txn.id);
        }
    }

    Ok(())
}
