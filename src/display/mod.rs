//! Display formatting for terminal output
//!
//! Tables for overviews and registers, a tree for the hierarchy, and the
//! small helpers they share: money with the configured symbol, percentages
//! and progress bars.

pub mod budget;
pub mod hierarchy;
pub mod transaction;

pub use budget::{format_overview, format_propagation_report, format_warnings, format_yearly};
pub use hierarchy::{format_category_list, format_hierarchy_tree, format_sector_list};
pub use transaction::format_transaction_register;

use crate::engine::BudgetStatus;
use crate::models::Money;

const BAR_WIDTH: usize = 10;

/// Format money with the configured currency symbol
pub fn format_money(amount: Money, symbol: &str) -> String {
    amount.format_with_symbol(symbol)
}

/// "72.5%"; whole numbers drop the decimal
pub fn format_percent(percentage: f64) -> String {
    if percentage.fract() == 0.0 {
        format!("{:.0}%", percentage)
    } else {
        format!("{:.1}%", percentage)
    }
}

/// A fixed-width bar filled to `percentage`, capped at full
pub fn progress_bar(percentage: f64) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

/// Marker shown after a bar
pub fn status_marker(status: BudgetStatus) -> &'static str {
    match status {
        BudgetStatus::Under => "",
        BudgetStatus::Warning => "!",
        BudgetStatus::Over => "OVER",
    }
}

/// Truncate a string for fixed-width columns
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(72.5), "72.5%");
        assert_eq!(format_percent(100.0), "100%");
        assert_eq!(format_percent(-20.0), "-20%");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0), "[..........]");
        assert_eq!(progress_bar(50.0), "[#####.....]");
        assert_eq!(progress_bar(250.0), "[##########]");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Short", 10), "Short");
        assert_eq!(truncate("This is a very long description", 10), "This is...");
    }

    #[test]
    fn test_format_money_uses_symbol() {
        assert_eq!(format_money(Money::from_cents(123456), "€"), "€1234.56");
    }
}
