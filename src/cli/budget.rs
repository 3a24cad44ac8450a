//! Budget CLI commands
//!
//! Implements CLI commands for setting budgets, viewing a period, and
//! moving budgets between periods.

use clap::{Args, Subcommand};

use crate::config::settings::Settings;
use crate::display::budget::{format_overview, format_propagation_report, format_warnings, format_yearly};
use crate::error::{TandemError, TandemResult};
use crate::models::{BudgetAmount, Money};
use crate::services::{BudgetService, HierarchyService, PeriodService, SectorBudgetMode};
use crate::storage::Storage;

/// A budget figure: one shared amount, or one per participant
#[derive(Args, Debug, Clone, Default)]
pub struct AmountArgs {
    /// Shared amount (e.g., "500" or "500.00")
    #[arg(short, long, conflicts_with_all = ["user1", "user2"])]
    pub amount: Option<String>,
    /// First participant's share
    #[arg(long, requires = "user2")]
    pub user1: Option<String>,
    /// Second participant's share
    #[arg(long, requires = "user1")]
    pub user2: Option<String>,
}

fn parse_money(s: &str) -> TandemResult<Money> {
    Money::parse(s).map_err(|e| TandemError::Validation(format!("Invalid amount '{}': {}", s, e)))
}

impl AmountArgs {
    /// `None` when no amount was given at all
    pub fn to_amount(&self) -> TandemResult<Option<BudgetAmount>> {
        match (&self.amount, &self.user1, &self.user2) {
            (Some(amount), None, None) => Ok(Some(BudgetAmount::absolute(parse_money(amount)?))),
            (None, Some(user1), Some(user2)) => Ok(Some(BudgetAmount::split(
                parse_money(user1)?,
                parse_money(user2)?,
            ))),
            (None, None, None) => Ok(None),
            _ => Err(TandemError::Validation(
                "Give either --amount or both --user1 and --user2".into(),
            )),
        }
    }

    fn require(&self) -> TandemResult<BudgetAmount> {
        self.to_amount()?.ok_or_else(|| {
            TandemError::Validation("An amount is required: --amount, or --user1 and --user2".into())
        })
    }
}

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Show sector and category budgets for a period
    Overview {
        /// Budget period (e.g., "2025-01", "2025", "January", "current", "last")
        #[arg(short, long)]
        period: Option<String>,
    },

    /// List everything that needs attention in a period
    Warnings {
        /// Budget period
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Set a category's budget
    Set {
        /// Category name or ID
        category: String,
        #[command(flatten)]
        amount: AmountArgs,
        /// Budget period
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Set a sector's budget, or make it roll up its categories
    #[command(name = "set-sector")]
    SetSector {
        /// Sector name or ID
        sector: String,
        #[command(flatten)]
        amount: AmountArgs,
        /// Use the sum of the category budgets as the sector total
        #[arg(long, conflicts_with_all = ["amount", "user1", "user2"])]
        auto_rollup: bool,
        /// Budget period
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Remove a category's budget for a period
    Clear {
        /// Category name or ID
        category: String,
        /// Budget period
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Remove a sector's budget for a period
    #[command(name = "clear-sector")]
    ClearSector {
        /// Sector name or ID
        sector: String,
        /// Budget period
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Copy the previous period's budgets into a period
    #[command(name = "carry-forward")]
    CarryForward {
        /// Period to fill (defaults to the current month)
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Copy one period's budgets into another of the same kind
    Copy {
        /// Source period
        #[arg(long)]
        from: String,
        /// Target period
        #[arg(long)]
        to: String,
    },

    /// Finish any carry-forward or copy that was interrupted
    Resume,

    /// Show yearly budgets with a linear projection
    Yearly {
        /// Year (defaults to the current year)
        #[arg(short, long)]
        year: Option<String>,
    },
}

/// Handle a budget command
pub fn handle_budget_command(
    storage: &Storage,
    settings: &Settings,
    cmd: BudgetCommands,
) -> TandemResult<()> {
    let period_service = PeriodService::new();
    let hierarchy = HierarchyService::new(storage);
    let service = BudgetService::new(storage, settings);
    let symbol = &settings.currency_symbol;

    match cmd {
        BudgetCommands::Overview { period } => {
            let period = period_service.parse_or_current(period.as_deref())?;
            let overview = service.overview(period)?;
            print!("{}", format_overview(&overview, settings, &period_service));

            let warnings = service.warnings(period)?;
            if !warnings.is_empty() {
                println!(
                    "\n{} warning(s). Run 'tandem budget warnings' for details.",
                    warnings.len()
                );
            }
        }

        BudgetCommands::Warnings { period } => {
            let period = period_service.parse_or_current(period.as_deref())?;
            println!("Warnings for {}:", period_service.format_period_friendly(&period));
            print!("{}", format_warnings(&service.warnings(period)?));
        }

        BudgetCommands::Set {
            category,
            amount,
            period,
        } => {
            let period = period_service.parse_or_current(period.as_deref())?;
            let category = hierarchy.require_category(&category)?;
            let amount = amount.require()?;

            let (budget, placeholder) = service.set_category_budget(category.id, period, amount)?;
            println!(
                "Set budget for '{}' in {}: {}",
                category.name,
                period_service.format_period_friendly(&period),
                budget.total().format_with_symbol(symbol)
            );
            if placeholder.is_some() {
                if let Some(sector) = storage.hierarchy.sector_of(category.id)? {
                    println!("Created a roll-up budget for sector '{}'", sector.name);
                }
            }
        }

        BudgetCommands::SetSector {
            sector,
            amount,
            auto_rollup,
            period,
        } => {
            let period = period_service.parse_or_current(period.as_deref())?;
            let sector = hierarchy.require_sector(&sector)?;
            let mode = if auto_rollup {
                SectorBudgetMode::AutoRollup
            } else {
                SectorBudgetMode::Manual(amount.require()?)
            };

            let budget = service.set_sector_budget(sector.id, period, mode)?;
            let friendly = period_service.format_period_friendly(&period);
            if budget.auto_rollup {
                println!("Sector '{}' now rolls up its categories in {}", sector.name, friendly);
            } else {
                println!(
                    "Set budget for sector '{}' in {}: {}",
                    sector.name,
                    friendly,
                    budget.total().format_with_symbol(symbol)
                );
            }
        }

        BudgetCommands::Clear { category, period } => {
            let period = period_service.parse_or_current(period.as_deref())?;
            let category = hierarchy.require_category(&category)?;
            service.clear_category_budget(category.id, period)?;
            println!(
                "Cleared budget for '{}' in {}",
                category.name,
                period_service.format_period_friendly(&period)
            );
        }

        BudgetCommands::ClearSector { sector, period } => {
            let period = period_service.parse_or_current(period.as_deref())?;
            let sector = hierarchy.require_sector(&sector)?;
            service.clear_sector_budget(sector.id, period)?;
            println!(
                "Cleared budget for sector '{}' in {}",
                sector.name,
                period_service.format_period_friendly(&period)
            );
        }

        BudgetCommands::CarryForward { period } => {
            let period = period_service.parse_or_current(period.as_deref())?;
            let report = service.carry_forward(period)?;
            println!("{}", format_propagation_report(&report));
        }

        BudgetCommands::Copy { from, to } => {
            let source = period_service.parse(&from)?;
            let target = period_service.parse(&to)?;
            let report = service.copy_period(source, target)?;
            println!("{}", format_propagation_report(&report));
        }

        BudgetCommands::Resume => {
            let reports = service.resume()?;
            if reports.is_empty() {
                println!("Nothing to resume.");
            }
            for report in &reports {
                println!("{}", format_propagation_report(report));
            }
        }

        BudgetCommands::Yearly { year } => {
            let year = period_service.parse_year_or_current(year.as_deref())?;
            let month = period_service.elapsed_months(year.year());
            let yearly = service.yearly_overview(year, month)?;
            print!("{}", format_yearly(&yearly, settings));
        }
    }

    Ok(())
}
