//! Period parsing and navigation
//!
//! Resolves what users type after `--period` into a [`BudgetPeriod`],
//! relative to a fixed "today" so results are reproducible.

use chrono::{Datelike, Local, NaiveDate};

use crate::error::{TandemError, TandemResult};
use crate::models::BudgetPeriod;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub struct PeriodService {
    today: NaiveDate,
}

impl Default for PeriodService {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodService {
    pub fn new() -> Self {
        Self::with_today(Local::now().date_naive())
    }

    /// Resolve relative periods against `today` instead of the clock
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn current_month(&self) -> BudgetPeriod {
        BudgetPeriod::month_of(self.today)
    }

    pub fn current_year(&self) -> BudgetPeriod {
        BudgetPeriod::yearly(self.today.year())
    }

    pub fn parse_or_current(&self, period: Option<&str>) -> TandemResult<BudgetPeriod> {
        match period {
            Some(s) => self.parse(s),
            None => Ok(self.current_month()),
        }
    }

    /// Parse a period.
    ///
    /// Accepts `2025-03`, `2025`, `current`/`now`/`this`, `last`/`prev`,
    /// `next`, `this-year`/`last-year`, and month names with or without a
    /// year (`march`, `Mar 2025`). A bare month name means its most recent
    /// occurrence.
    pub fn parse(&self, s: &str) -> TandemResult<BudgetPeriod> {
        let lower = s.trim().to_lowercase();

        match lower.as_str() {
            "current" | "now" | "this" => return Ok(self.current_month()),
            "last" | "prev" | "previous" => return Ok(self.current_month().prev()),
            "next" => return Ok(self.current_month().next()),
            "this-year" | "year" => return Ok(self.current_year()),
            "last-year" => return Ok(self.current_year().prev()),
            _ => {}
        }

        if let Some(period) = self.parse_month_name(&lower) {
            return Ok(period);
        }

        BudgetPeriod::parse(s.trim())
            .map_err(|_| TandemError::Validation(format!("Invalid period format: {}", s)))
    }

    /// A yearly period from `--year`, defaulting to the current year
    pub fn parse_year_or_current(&self, year: Option<&str>) -> TandemResult<BudgetPeriod> {
        let Some(year) = year else {
            return Ok(self.current_year());
        };
        match self.parse(year)? {
            period @ BudgetPeriod::Yearly { .. } => Ok(period),
            BudgetPeriod::Monthly { .. } => Err(TandemError::Validation(format!(
                "Expected a year, got {}",
                year
            ))),
        }
    }

    fn parse_month_name(&self, s: &str) -> Option<BudgetPeriod> {
        let (word, rest) = match s.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (s, ""),
        };
        if word.len() < 3 {
            return None;
        }

        let month = MONTH_NAMES
            .iter()
            .position(|name| name.to_lowercase().starts_with(word))? as u32
            + 1;

        let year = if rest.is_empty() {
            if month > self.today.month() {
                self.today.year() - 1
            } else {
                self.today.year()
            }
        } else {
            rest.parse().ok()?
        };

        Some(BudgetPeriod::monthly(year, month))
    }

    /// "March 2025" or "Year 2025"
    pub fn format_period_friendly(&self, period: &BudgetPeriod) -> String {
        match period {
            BudgetPeriod::Monthly { year, month } => {
                let name = MONTH_NAMES
                    .get(month.saturating_sub(1) as usize)
                    .copied()
                    .unwrap_or("?");
                format!("{} {}", name, year)
            }
            BudgetPeriod::Yearly { year } => format!("Year {}", year),
        }
    }

    /// Month of the year to project a yearly budget at: the current month
    /// for this year, 12 for past years and 0 for future ones
    pub fn elapsed_months(&self, year: i32) -> u32 {
        use std::cmp::Ordering;
        match year.cmp(&self.today.year()) {
            Ordering::Less => 12,
            Ordering::Equal => self.today.month(),
            Ordering::Greater => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PeriodService {
        PeriodService::with_today(NaiveDate::from_ymd_opt(2025, 6, 14).unwrap())
    }

    #[test]
    fn test_relative_periods() {
        let s = service();
        assert_eq!(s.parse("current").unwrap(), BudgetPeriod::monthly(2025, 6));
        assert_eq!(s.parse("LAST").unwrap(), BudgetPeriod::monthly(2025, 5));
        assert_eq!(s.parse("next").unwrap(), BudgetPeriod::monthly(2025, 7));
        assert_eq!(s.parse("last-year").unwrap(), BudgetPeriod::yearly(2024));
        assert_eq!(s.parse_or_current(None).unwrap(), BudgetPeriod::monthly(2025, 6));
    }

    #[test]
    fn test_standard_formats() {
        let s = service();
        assert_eq!(s.parse("2025-01").unwrap(), BudgetPeriod::monthly(2025, 1));
        assert_eq!(s.parse("2024").unwrap(), BudgetPeriod::yearly(2024));
        assert!(s.parse("2025-13").unwrap_err().is_validation());
        assert!(s.parse("soon").is_err());
    }

    #[test]
    fn test_month_names() {
        let s = service();
        assert_eq!(s.parse("Mar 2024").unwrap(), BudgetPeriod::monthly(2024, 3));
        assert_eq!(s.parse("march").unwrap(), BudgetPeriod::monthly(2025, 3));
        // a month later than today means last year's
        assert_eq!(s.parse("sept").unwrap(), BudgetPeriod::monthly(2024, 9));
    }

    #[test]
    fn test_year_argument() {
        let s = service();
        assert_eq!(s.parse_year_or_current(None).unwrap(), BudgetPeriod::yearly(2025));
        assert_eq!(s.parse_year_or_current(Some("2023")).unwrap(), BudgetPeriod::yearly(2023));
        assert!(s.parse_year_or_current(Some("2023-02")).is_err());
    }

    #[test]
    fn test_elapsed_months() {
        let s = service();
        assert_eq!(s.elapsed_months(2024), 12);
        assert_eq!(s.elapsed_months(2025), 6);
        assert_eq!(s.elapsed_months(2026), 0);
    }

    #[test]
    fn test_friendly_format() {
        let s = service();
        assert_eq!(s.format_period_friendly(&BudgetPeriod::monthly(2025, 1)), "January 2025");
        assert_eq!(s.format_period_friendly(&BudgetPeriod::yearly(2025)), "Year 2025");
    }
}
