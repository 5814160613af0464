//! Template filters
//!
//! Three named transforms are available inside letter templates:
//!
//! - `money` - `{{ amount | money }}` → `$1,234.50`
//! - `formatDate` - `{{ start | formatDate }}` → `June 1, 2023`
//! - `depositInterest` - `{{ deposit | depositInterest(start) | money }}`
//!
//! Every filter is total: malformed input falls back to the input value (or
//! an empty string for `formatDate`) instead of failing the render.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use minijinja::Environment;
use minijinja::value::{Value, ValueKind};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::rates::RateTable;

pub const MONEY: &str = "money";
pub const FORMAT_DATE: &str = "formatDate";
pub const DEPOSIT_INTEREST: &str = "depositInterest";

/// Names of every filter registered by [`FilterLibrary::register`]
pub const FILTER_NAMES: [&str; 3] = [MONEY, FORMAT_DATE, DEPOSIT_INTEREST];

const CURRENCY_SYMBOL: &str = "$";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Result of projecting a deposit forward with interest
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterestOutcome {
    /// Deposit plus accrued interest, unformatted
    Computed(f64),
    /// Start year precedes the earliest year in the rate table
    UnsupportedRange { start_year: i32, min_year: Option<i32> },
}

impl InterestOutcome {
    /// The computed amount, or `None` when the range is unsupported
    pub fn amount(&self) -> Option<f64> {
        match self {
            InterestOutcome::Computed(total) => Some(*total),
            InterestOutcome::UnsupportedRange { .. } => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, InterestOutcome::Computed(_))
    }
}

/// Filters bound to an interest-rate table
#[derive(Debug, Clone, Default)]
pub struct FilterLibrary {
    rates: Arc<RateTable>,
}

impl FilterLibrary {
    pub fn new(rates: RateTable) -> Self {
        debug!(years = rates.len(), "FilterLibrary::new: called");
        Self { rates: Arc::new(rates) }
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Register every filter on a template environment
    ///
    /// `today` is the end date for `depositInterest`.
    pub fn register(&self, env: &mut Environment<'_>, today: NaiveDate) {
        debug!(%today, "FilterLibrary::register: called");
        env.add_filter(MONEY, money);
        env.add_filter(FORMAT_DATE, format_date);

        let rates = Arc::clone(&self.rates);
        env.add_filter(DEPOSIT_INTEREST, move |deposit: Value, start: Option<Value>| {
            deposit_interest(deposit, start, today, &rates)
        });
    }

    /// Project a deposit through `today` using this library's rate table
    pub fn deposit_interest(&self, deposit: f64, start: NaiveDate, today: NaiveDate) -> InterestOutcome {
        deposit_with_interest(deposit, start, today, &self.rates)
    }
}

/// `money` filter
///
/// Strings must be nothing but a number after trimming: `"500 CAD"` passes
/// through unchanged rather than formatting its leading `500`.
pub fn money(value: Value) -> Value {
    match amount_from_value(&value) {
        Some(amount) => Value::from(format_money(amount)),
        None => {
            debug!(?value, "money: not a number, passing through");
            value
        }
    }
}

/// `formatDate` filter
pub fn format_date(value: Value) -> Value {
    if !value.is_true() {
        return Value::from("");
    }
    match value.as_str().and_then(parse_date) {
        Some(date) => Value::from(format_long_date(date)),
        None => {
            debug!(?value, "format_date: not a YYYY-MM-DD date, passing through");
            value
        }
    }
}

/// `depositInterest` filter; passes `deposit` through when it cannot compute
pub fn deposit_interest(deposit: Value, start: Option<Value>, today: NaiveDate, rates: &RateTable) -> Value {
    let Some(amount) = amount_from_value(&deposit) else {
        debug!(?deposit, "deposit_interest: deposit is not a number");
        return deposit;
    };
    let Some(start_date) = start.as_ref().and_then(|v| v.as_str()).and_then(parse_date) else {
        debug!(?start, "deposit_interest: start is not a YYYY-MM-DD date");
        return deposit;
    };

    match deposit_with_interest(amount, start_date, today, rates) {
        InterestOutcome::Computed(total) => Value::from(total),
        InterestOutcome::UnsupportedRange { .. } => deposit,
    }
}

/// Compound a deposit annually from `start` through `today`
///
/// Within a year interest is simple, pro-rated by days held (both endpoints
/// inclusive) over the length of that year. Years with no table entry accrue
/// nothing.
pub fn deposit_with_interest(deposit: f64, start: NaiveDate, today: NaiveDate, rates: &RateTable) -> InterestOutcome {
    debug!(%deposit, %start, %today, "deposit_with_interest: called");
    let start_year = start.year();
    let min_year = rates.min_year();
    match min_year {
        Some(min) if start_year >= min => {}
        _ => {
            debug!(%start_year, ?min_year, "deposit_with_interest: start year unsupported");
            return InterestOutcome::UnsupportedRange { start_year, min_year };
        }
    }

    let current_year = today.year();
    let mut principal = deposit;

    for year in start_year..=current_year {
        let Some(rate) = rates.rate_for(year) else {
            debug!(%year, "deposit_with_interest: no rate for year, skipping");
            continue;
        };
        let (Some(jan_1), Some(dec_31)) = (NaiveDate::from_ymd_opt(year, 1, 1), NaiveDate::from_ymd_opt(year, 12, 31))
        else {
            continue;
        };

        let year_start = if year == start_year { start } else { jan_1 };
        let year_end = if year == current_year { today } else { dec_31 };

        let days_held = ((year_end - year_start).num_days() + 1).max(0);
        let interest = principal * rate * (days_held as f64 / days_in_year(year) as f64);
        debug!(%year, %rate, %days_held, %interest, "deposit_with_interest: accrued");
        principal += interest;
    }

    InterestOutcome::Computed(principal)
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_year(year: i32) -> i64 {
    if is_leap_year(year) { 366 } else { 365 }
}

/// Format an amount as `$1,234.50`
pub fn format_money(amount: f64) -> String {
    let fixed = format!("{:.2}", amount);
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));
    format!("{}{}{}.{}", CURRENCY_SYMBOL, sign, group_thousands(whole), fraction)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Long-form en-CA date, e.g. `March 5, 2024`
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Parse a `YYYY-MM-DD` calendar date
///
/// The result is a naive date: no timezone is involved, so the calendar day
/// never shifts.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Parse a finite decimal amount from free text
pub fn parse_amount(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Finite amount held by a JSON answer value
pub fn amount_from_json(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        JsonValue::String(s) => parse_amount(s),
        _ => None,
    }
}

fn amount_from_value(value: &Value) -> Option<f64> {
    if let Some(s) = value.as_str() {
        return parse_amount(s);
    }
    if value.kind() == ValueKind::Number {
        return f64::try_from(value.clone()).ok().filter(|n| n.is_finite());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn flat_rate(year: i32, rate: f64) -> RateTable {
        [(year, rate)].into_iter().collect()
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(1234.5), "$1,234.50");
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(999.999), "$1,000.00");
        assert_eq!(format_money(1234567.891), "$1,234,567.89");
        assert_eq!(format_money(-1234.5), "$-1,234.50");
    }

    #[test]
    fn test_money_filter_passes_through_text() {
        assert_eq!(money(Value::from("abc")), Value::from("abc"));
        assert_eq!(money(Value::from("500 CAD")), Value::from("500 CAD"));
        assert_eq!(money(Value::from("500")), Value::from("$500.00"));
        assert_eq!(money(Value::from(1500)), Value::from("$1,500.00"));
        assert_eq!(money(Value::from(" 12.3 ")), Value::from("$12.30"));
        assert!(money(Value::UNDEFINED).is_undefined());
    }

    #[test]
    fn test_money_rejects_non_finite() {
        assert_eq!(money(Value::from("inf")), Value::from("inf"));
        assert_eq!(money(Value::from("NaN")), Value::from("NaN"));
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Value::from("2024-03-05")), Value::from("March 5, 2024"));
        assert_eq!(format_date(Value::from("2023-06-01")), Value::from("June 1, 2023"));
        assert_eq!(format_date(Value::from("2024-12-31")), Value::from("December 31, 2024"));
    }

    #[test]
    fn test_format_date_empty_and_missing() {
        assert_eq!(format_date(Value::from("")), Value::from(""));
        assert_eq!(format_date(Value::UNDEFINED), Value::from(""));
        assert_eq!(format_date(Value::from(())), Value::from(""));
    }

    #[test]
    fn test_format_date_passes_through_garbage() {
        assert_eq!(format_date(Value::from("next tuesday")), Value::from("next tuesday"));
    }

    #[test]
    fn test_parse_date_is_calendar_day() {
        // Year boundaries are where timezone shifts would show up
        let d = date("2024-01-01");
        assert_eq!((d.year(), d.month(), d.day()), (2024, 1, 1));
        let d = date("2023-12-31");
        assert_eq!((d.year(), d.month(), d.day()), (2023, 12, 31));
        assert!(parse_date("2023-02-30").is_none());
    }

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(2024));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
        assert_eq!(days_in_year(2024), 366);
        assert_eq!(days_in_year(2025), 365);
    }

    #[test]
    fn test_unsupported_range_abstains() {
        let rates = RateTable::default();
        let outcome = deposit_with_interest(1000.0, date("2022-06-01"), date("2024-06-01"), &rates);
        assert_eq!(
            outcome,
            InterestOutcome::UnsupportedRange {
                start_year: 2022,
                min_year: Some(2023)
            }
        );
        assert_eq!(outcome.amount(), None);

        let value = deposit_interest(
            Value::from("1000"),
            Some(Value::from("2022-06-01")),
            date("2024-06-01"),
            &rates,
        );
        assert_eq!(value, Value::from("1000"));
    }

    #[test]
    fn test_full_year_single_rate() {
        let rates = flat_rate(2023, 0.02);
        let outcome = deposit_with_interest(1000.0, date("2023-01-01"), date("2023-12-31"), &rates);
        let total = outcome.amount().unwrap();
        assert!((total - 1020.0).abs() < 1e-9, "got {}", total);
    }

    #[test]
    fn test_spans_leap_year() {
        let rates = RateTable::default();
        let total = deposit_with_interest(1000.0, date("2023-06-01"), date("2024-06-01"), &rates)
            .amount()
            .unwrap();
        assert!((total - 1022.8488035257129).abs() < 1e-6, "got {}", total);
        assert_eq!(format_money(total), "$1,022.85");
    }

    #[test]
    fn test_compounds_across_years() {
        let rates = RateTable::default();
        let total = deposit_with_interest(1200.0, date("2024-09-01"), date("2026-03-15"), &rates)
            .amount()
            .unwrap();
        assert!((total - 1222.3026).abs() < 1e-6, "got {}", total);
    }

    #[test]
    fn test_missing_year_accrues_nothing() {
        let rates: RateTable = [(2023, 0.02), (2025, 0.02)].into_iter().collect();
        let total = deposit_with_interest(1000.0, date("2024-01-01"), date("2024-12-31"), &rates)
            .amount()
            .unwrap();
        assert_eq!(total, 1000.0);
    }

    #[test]
    fn test_start_after_today_accrues_nothing() {
        let rates = flat_rate(2023, 0.02);
        let total = deposit_with_interest(1000.0, date("2023-10-01"), date("2023-03-01"), &rates)
            .amount()
            .unwrap();
        assert_eq!(total, 1000.0);
    }

    #[test]
    fn test_deposit_interest_filter_fallbacks() {
        let rates = RateTable::default();
        let today = date("2024-06-01");
        assert_eq!(
            deposit_interest(Value::from("lots"), Some(Value::from("2023-06-01")), today, &rates),
            Value::from("lots")
        );
        assert_eq!(deposit_interest(Value::from(1000), None, today, &rates), Value::from(1000));
        assert_eq!(
            deposit_interest(Value::from(1000), Some(Value::from("June")), today, &rates),
            Value::from(1000)
        );
    }

    #[test]
    fn test_amount_from_json() {
        assert_eq!(amount_from_json(&serde_json::json!(12)), Some(12.0));
        assert_eq!(amount_from_json(&serde_json::json!("12.5")), Some(12.5));
        assert_eq!(amount_from_json(&serde_json::json!(true)), None);
    }

    proptest! {
        #[test]
        fn prop_money_shape(amount in -1.0e12f64..1.0e12f64) {
            let formatted = money(Value::from(amount.to_string()));
            let s = formatted.as_str().unwrap().to_string();
            prop_assert!(s.starts_with('$'));

            let (whole, fraction) = s.rsplit_once('.').unwrap();
            prop_assert_eq!(fraction.len(), 2);
            prop_assert!(fraction.chars().all(|c| c.is_ascii_digit()));

            let whole = whole.trim_start_matches('$').trim_start_matches('-');
            let groups: Vec<&str> = whole.split(',').collect();
            prop_assert!(!groups[0].is_empty() && groups[0].len() <= 3);
            for group in &groups[1..] {
                prop_assert_eq!(group.len(), 3);
            }
        }

        #[test]
        fn prop_interest_monotonic_in_days(
            deposit in 1.0f64..100_000.0,
            rate in 0.0f64..0.2,
            first in 0u32..364,
            extra in 0u32..364,
        ) {
            let rates = flat_rate(2023, rate);
            let start = date("2023-01-01");
            let shorter = start + chrono::Days::new(first as u64);
            let longer = shorter + chrono::Days::new(extra as u64);
            let shorter = shorter.min(date("2023-12-31"));
            let longer = longer.min(date("2023-12-31"));

            let a = deposit_with_interest(deposit, start, shorter, &rates).amount().unwrap();
            let b = deposit_with_interest(deposit, start, longer, &rates).amount().unwrap();
            prop_assert!(b >= a);
        }
    }
}
