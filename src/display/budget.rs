//! Budget display formatting
//!
//! Overview, warnings and yearly tables. Column headers use the configured
//! participant names, so tables are assembled row by row.

use tabled::builder::Builder;
use tabled::settings::Style;

use super::{format_money, format_percent, progress_bar, status_marker};
use crate::config::Settings;
use crate::engine::{BudgetStatus, BudgetSummary, Projection, PropagationReport, SectorBudgetSummary};
use crate::models::{Money, UserSlot};
use crate::services::{BudgetOverview, BudgetWarning, PeriodService, YearlyOverview};

fn header(settings: &Settings, first: &str) -> Vec<String> {
    vec![
        first.to_string(),
        "Budget".to_string(),
        "Spent".to_string(),
        settings.user1_name.clone(),
        settings.user2_name.clone(),
        "Remaining".to_string(),
        "Used".to_string(),
        String::new(),
    ]
}

struct Row<'a> {
    label: String,
    has_budget: bool,
    budget: Money,
    spent: Money,
    user1: Money,
    user2: Money,
    remaining: Money,
    percentage: f64,
    settings: &'a Settings,
    status: BudgetStatus,
}

impl Row<'_> {
    fn cells(&self) -> Vec<String> {
        let symbol = &self.settings.currency_symbol;
        let money = |m| format_money(m, symbol);
        if !self.has_budget {
            return vec![
                self.label.clone(),
                "-".to_string(),
                money(self.spent),
                money(self.user1),
                money(self.user2),
                "-".to_string(),
                "-".to_string(),
                String::new(),
            ];
        }
        vec![
            self.label.clone(),
            money(self.budget),
            money(self.spent),
            money(self.user1),
            money(self.user2),
            money(self.remaining),
            format_percent(self.percentage),
            format!("{} {}", progress_bar(self.percentage), status_marker(self.status))
                .trim_end()
                .to_string(),
        ]
    }
}

fn category_row<'a>(summary: &BudgetSummary, settings: &'a Settings, indent: &str) -> Row<'a> {
    Row {
        label: format!("{}{}", indent, summary.category_name),
        has_budget: summary.has_budget(),
        budget: summary.budget,
        spent: summary.current_period_spent,
        user1: summary.user_spent(UserSlot::User1),
        user2: summary.user_spent(UserSlot::User2),
        remaining: summary.remaining,
        percentage: summary.utilization_percentage(),
        settings,
        status: summary.status(&settings.thresholds),
    }
}

fn sector_row<'a>(summary: &SectorBudgetSummary, settings: &'a Settings) -> Row<'a> {
    let label = if summary.auto_rollup {
        format!("{} (roll-up)", summary.sector_name)
    } else {
        summary.sector_name.clone()
    };
    Row {
        label,
        has_budget: summary.has_budget(),
        budget: summary.budget,
        spent: summary.current_period_spent,
        user1: summary.user_spent(UserSlot::User1),
        user2: summary.user_spent(UserSlot::User2),
        remaining: summary.remaining,
        percentage: summary.utilization_percentage(),
        settings,
        status: summary.status(&settings.thresholds),
    }
}

/// Format the period overview: sectors with their categories, then the
/// unassigned categories, then totals
pub fn format_overview(overview: &BudgetOverview, settings: &Settings, periods: &PeriodService) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Budget Overview: {}\n\n",
        periods.format_period_friendly(&overview.period)
    ));

    if overview.sectors.is_empty() && overview.unassigned.is_empty() {
        output.push_str("No categories found.\n\nRun 'tandem init' to create the defaults.\n");
        return output;
    }

    let mut builder = Builder::default();
    builder.push_record(header(settings, "Sector / Category"));

    for sector in &overview.sectors {
        builder.push_record(sector_row(&sector.summary, settings).cells());
        for category in &sector.categories {
            builder.push_record(category_row(category, settings, "  ").cells());
        }
    }
    if !overview.unassigned.is_empty() {
        let mut divider = vec![String::new(); 8];
        divider[0] = "(unassigned)".to_string();
        builder.push_record(divider);
        for category in &overview.unassigned {
            builder.push_record(category_row(category, settings, "  ").cells());
        }
    }

    let mut table = builder.build();
    table.with(Style::sharp());
    output.push_str(&table.to_string());
    output.push('\n');

    let totals = &overview.totals;
    let symbol = &settings.currency_symbol;
    output.push_str(&format!(
        "\nTotal budget: {}   Spent: {}   Remaining: {}   Used: {}\n",
        format_money(totals.total_budget, symbol),
        format_money(totals.total_spent, symbol),
        format_money(totals.total_remaining, symbol),
        format_percent(totals.overall_percentage)
    ));

    output
}

/// Format warnings, one per line
pub fn format_warnings(warnings: &[BudgetWarning]) -> String {
    if warnings.is_empty() {
        return "No warnings.\n".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(["Kind", "Subject", "Detail"]);
    for warning in warnings {
        builder.push_record([
            warning.kind.to_string(),
            warning.subject.clone(),
            warning.message.clone(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::sharp());
    format!("{}\n", table)
}

fn projection_cells(projection: Option<&Projection>, symbol: &str) -> [String; 3] {
    match projection {
        Some(p) => [
            format_money(p.should_be_spent_by_now, symbol),
            format_money(p.difference, symbol),
            p.status.to_string(),
        ],
        None => ["-".to_string(), "-".to_string(), String::new()],
    }
}

/// Format the yearly view with a projection per budgeted line
pub fn format_yearly(yearly: &YearlyOverview, settings: &Settings) -> String {
    let symbol = &settings.currency_symbol;
    let money = |m| format_money(m, symbol);

    let mut output = String::new();
    output.push_str(&format!(
        "Yearly Budget: {} (projected at month {})\n\n",
        yearly.period, yearly.month_of_year
    ));

    let mut builder = Builder::default();
    builder.push_record(["Line", "Budget", "Spent", "Expected", "Difference", "Pace"]);

    let sector_rows = yearly.sectors.iter().map(|row| {
        (
            row.summary.sector_name.clone(),
            row.summary.has_budget(),
            row.summary.budget,
            row.summary.current_period_spent,
            row.projection.as_ref(),
        )
    });
    let category_rows = yearly.categories.iter().map(|row| {
        (
            format!("  {}", row.summary.category_name),
            row.summary.has_budget(),
            row.summary.budget,
            row.summary.current_period_spent,
            row.projection.as_ref(),
        )
    });

    for (label, has_budget, budget, spent, projection) in sector_rows.chain(category_rows) {
        let [expected, difference, pace] = projection_cells(projection, symbol);
        let budget = if has_budget { money(budget) } else { "-".to_string() };
        builder.push_record([label, budget, money(spent), expected, difference, pace]);
    }

    let mut table = builder.build();
    table.with(Style::sharp());
    output.push_str(&table.to_string());
    output.push('\n');

    let p = &yearly.projection;
    output.push_str(&format!(
        "\nTotal: {} of {} spent, {} expected by now ({})\n",
        money(yearly.totals.total_spent),
        money(yearly.totals.total_budget),
        money(p.should_be_spent_by_now),
        p.status
    ));

    output
}

/// One line summarizing a finished propagation
pub fn format_propagation_report(report: &PropagationReport) -> String {
    format!(
        "Copied {} category budget(s) and {} sector budget(s) from {} to {}",
        report.category_budgets_copied, report.sector_budgets_copied, report.source, report.target
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BudgetTotals, ProjectionStatus};
    use crate::models::BudgetPeriod;
    use crate::services::WarningKind;
    use chrono::NaiveDate;

    fn periods() -> PeriodService {
        PeriodService::with_today(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
    }

    #[test]
    fn test_empty_overview() {
        let overview = BudgetOverview {
            period: BudgetPeriod::monthly(2025, 1),
            sectors: vec![],
            unassigned: vec![],
            totals: BudgetTotals::default(),
        };
        let output = format_overview(&overview, &Settings::default(), &periods());
        assert!(output.starts_with("Budget Overview: January 2025"));
        assert!(output.contains("No categories found"));
    }

    #[test]
    fn test_format_warnings() {
        assert_eq!(format_warnings(&[]), "No warnings.\n");

        let output = format_warnings(&[BudgetWarning {
            kind: WarningKind::OverBudget,
            subject: "Dining Out".into(),
            message: "spent $120.00 of $100.00".into(),
        }]);
        assert!(output.contains("Dining Out"));
        assert!(output.contains("over"));
    }

    #[test]
    fn test_projection_cells() {
        let projection = Projection {
            should_be_spent_by_now: Money::from_cents(59836),
            difference: Money::from_cents(10164),
            is_on_track: false,
            status: ProjectionStatus::Outpacing,
        };
        let cells = projection_cells(Some(&projection), "$");
        assert_eq!(cells, ["$598.36".to_string(), "$101.64".to_string(), "outpacing".to_string()]);
        assert_eq!(projection_cells(None, "$")[0], "-");
    }

    #[test]
    fn test_format_propagation_report() {
        let report = PropagationReport {
            source: BudgetPeriod::monthly(2025, 1),
            target: BudgetPeriod::monthly(2025, 2),
            category_budgets_copied: 3,
            placeholders_created: 1,
            sector_budgets_removed: 1,
            sector_budgets_copied: 2,
        };
        assert_eq!(
            format_propagation_report(&report),
            "Copied 3 category budget(s) and 2 sector budget(s) from 2025-01 to 2025-02"
        );
    }
}
