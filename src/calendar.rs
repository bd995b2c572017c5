//! calendar-date utilities
//!
//! Due dates are plain calendar dates. They are never routed through a
//! timestamp parser: a `YYYY-MM-DD` string is split into its three numeric
//! parts and turned straight into a [`NaiveDate`], so no timezone offset can
//! move a due date onto the previous or next day.

use chrono::{Datelike, Duration, FixedOffset, Months, NaiveDate, Offset, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::errors::{BillingError, Result};

/// parse a `YYYY-MM-DD` date literally; a trailing `T...` time part is dropped
pub fn parse_due_date(value: &str) -> Result<NaiveDate> {
    let date_part = value.trim().split('T').next().unwrap_or_default();
    let mut parts = date_part.split('-');

    let (year, month, day) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(y), Some(m), Some(d), None) => (y, m, d),
        _ => {
            return Err(BillingError::InvalidDate {
                message: format!("expected YYYY-MM-DD, got '{}'", value),
            })
        }
    };

    let year: i32 = parse_component(year, value)?;
    let month: u32 = parse_component(month, value)?;
    let day: u32 = parse_component(day, value)?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| BillingError::InvalidDate {
        message: format!("'{}' is not a calendar date", value),
    })
}

fn parse_component<T: std::str::FromStr>(component: &str, original: &str) -> Result<T> {
    if component.is_empty() || !component.chars().all(|c| c.is_ascii_digit()) {
        return Err(BillingError::InvalidDate {
            message: format!("expected YYYY-MM-DD, got '{}'", original),
        });
    }
    component.parse().map_err(|_| BillingError::InvalidDate {
        message: format!("expected YYYY-MM-DD, got '{}'", original),
    })
}

/// whole days from `today` to `due`; negative when overdue
pub fn days_between(today: NaiveDate, due: NaiveDate) -> i64 {
    (due - today).num_days()
}

/// days until a `YYYY-MM-DD` due date, measured from `today`
pub fn days_until(due: &str, today: NaiveDate) -> Result<i64> {
    Ok(days_between(today, parse_due_date(due)?))
}

/// format a date the way the record store keeps it
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// first day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// the business's notion of "today"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Calendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// calendar at UTC
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// calendar from an offset in minutes east of UTC
    pub fn from_offset_minutes(minutes: i32) -> Result<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
            .ok_or_else(|| BillingError::InvalidConfiguration {
                message: format!("utc offset of {} minutes is out of range", minutes),
            })
    }

    /// today's local date at midnight
    pub fn today(&self, time: &SafeTimeProvider) -> NaiveDate {
        time.now().with_timezone(&self.offset).date_naive()
    }

    /// days until `due` from today's local date
    pub fn days_until(&self, due: &str, time: &SafeTimeProvider) -> Result<i64> {
        days_until(due, self.today(time))
    }

    /// days until an already-parsed due date
    pub fn days_until_date(&self, due: NaiveDate, time: &SafeTimeProvider) -> i64 {
        days_between(self.today(time), due)
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

/// payment-plan cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentCadence {
    Weekly,
    Biweekly,
    Monthly,
}

impl PaymentCadence {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentCadence::Weekly => "weekly",
            PaymentCadence::Biweekly => "biweekly",
            PaymentCadence::Monthly => "monthly",
        }
    }

    /// advance `periods` steps from `start`
    ///
    /// monthly steps are always taken from `start` itself, so a plan started
    /// on the 31st lands on the last day of shorter months without drifting.
    pub fn step(&self, start: NaiveDate, periods: u32) -> Result<NaiveDate> {
        let stepped = match self {
            PaymentCadence::Weekly => start.checked_add_signed(Duration::weeks(periods as i64)),
            PaymentCadence::Biweekly => start.checked_add_signed(Duration::weeks(2 * periods as i64)),
            PaymentCadence::Monthly => start.checked_add_months(Months::new(periods)),
        };
        stepped.ok_or_else(|| BillingError::InvalidDate {
            message: format!(
                "{} + {} {} periods is out of range",
                format_date(start),
                periods,
                self.label()
            ),
        })
    }
}

impl std::str::FromStr for PaymentCadence {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" | "semanal" => Ok(PaymentCadence::Weekly),
            "biweekly" | "quincenal" => Ok(PaymentCadence::Biweekly),
            "monthly" | "mensual" => Ok(PaymentCadence::Monthly),
            other => Err(BillingError::validation(format!("unknown payment plan '{}'", other))),
        }
    }
}
