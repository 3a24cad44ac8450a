//! Budget period representation
//!
//! Budgets are kept per calendar month and per calendar year.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a budget period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum BudgetPeriod {
    /// Monthly period (e.g., "2025-01")
    Monthly { year: i32, month: u32 },

    /// Calendar year period (e.g., "2025")
    Yearly { year: i32 },
}

impl BudgetPeriod {
    pub fn monthly(year: i32, month: u32) -> Self {
        Self::Monthly { year, month }
    }

    pub fn yearly(year: i32) -> Self {
        Self::Yearly { year }
    }

    /// The month containing today's date
    pub fn current_month() -> Self {
        Self::month_of(chrono::Local::now().date_naive())
    }

    /// The month containing a date
    pub fn month_of(date: NaiveDate) -> Self {
        Self::Monthly {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        match self {
            Self::Monthly { year, .. } | Self::Yearly { year } => *year,
        }
    }

    pub fn is_yearly(&self) -> bool {
        matches!(self, Self::Yearly { .. })
    }

    /// Whether two periods are both monthly or both yearly
    pub fn same_granularity(&self, other: &Self) -> bool {
        self.is_yearly() == other.is_yearly()
    }

    /// First day of the period
    pub fn start_date(&self) -> NaiveDate {
        let (year, month) = match self {
            Self::Monthly { year, month } => (*year, *month),
            Self::Yearly { year } => (*year, 1),
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
    }

    /// Last day of the period (inclusive)
    pub fn end_date(&self) -> NaiveDate {
        let start = self.start_date();
        self.next().start_date().pred_opt().unwrap_or(start)
    }

    /// Check if a date falls within this period
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }

    /// Get the next period of the same granularity
    pub fn next(&self) -> Self {
        match *self {
            Self::Monthly { year, month: 12 } => Self::Monthly {
                year: year + 1,
                month: 1,
            },
            Self::Monthly { year, month } => Self::Monthly {
                year,
                month: month + 1,
            },
            Self::Yearly { year } => Self::Yearly { year: year + 1 },
        }
    }

    /// Get the previous period of the same granularity
    pub fn prev(&self) -> Self {
        match *self {
            Self::Monthly { year, month: 1 } => Self::Monthly {
                year: year - 1,
                month: 12,
            },
            Self::Monthly { year, month } => Self::Monthly {
                year,
                month: month - 1,
            },
            Self::Yearly { year } => Self::Yearly { year: year - 1 },
        }
    }

    /// Parse a period string
    ///
    /// Formats:
    /// - Monthly: "2025-01"
    /// - Yearly: "2025"
    pub fn parse(s: &str) -> Result<Self, PeriodParseError> {
        let s = s.trim();
        let invalid = || PeriodParseError::InvalidFormat(s.to_string());

        match s.split_once('-') {
            Some((year, month)) => {
                let year: i32 = year.parse().map_err(|_| invalid())?;
                let month: u32 = month.parse().map_err(|_| invalid())?;
                if !(1..=12).contains(&month) {
                    return Err(PeriodParseError::InvalidMonth(month));
                }
                Ok(Self::Monthly { year, month })
            }
            None if s.len() == 4 => {
                let year: i32 = s.parse().map_err(|_| invalid())?;
                Ok(Self::Yearly { year })
            }
            None => Err(invalid()),
        }
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monthly { year, month } => write!(f, "{:04}-{:02}", year, month),
            Self::Yearly { year } => write!(f, "{:04}", year),
        }
    }
}

impl Ord for BudgetPeriod {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.start_date()
            .cmp(&other.start_date())
            .then_with(|| self.is_yearly().cmp(&other.is_yearly()))
    }
}

impl PartialOrd for BudgetPeriod {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Error type for period parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodParseError {
    InvalidFormat(String),
    InvalidMonth(u32),
}

impl fmt::Display for PeriodParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodParseError::InvalidFormat(s) => write!(f, "Invalid period format: {}", s),
            PeriodParseError::InvalidMonth(m) => write!(f, "Invalid month: {}", m),
        }
    }
}

impl std::error::Error for PeriodParseError {}
