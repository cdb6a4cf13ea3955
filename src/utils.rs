// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::Error;
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d.round_dp(2))
}

/// `Jan 5, 2025`
pub fn display_date(d: NaiveDate) -> String {
    format!("{} {}, {}", d.format("%b"), d.day(), d.year())
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays stream one element per line.
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Folds Turkish letters to their ASCII look-alikes.
pub fn fold_turkish(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'ı' => 'i',
            'İ' => 'I',
            'ğ' => 'g',
            'Ğ' => 'G',
            'ü' => 'u',
            'Ü' => 'U',
            'ş' => 's',
            'Ş' => 'S',
            'ö' => 'o',
            'Ö' => 'O',
            'ç' => 'c',
            'Ç' => 'C',
            other => other,
        })
        .collect()
}

static ISO_LOOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("iso date pattern"));
static DAY_FIRST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4})$").expect("day-first pattern"));

/// Parses an imported date and checks it falls between January 1st ten years
/// before `today` and December 31st of next year.
pub fn validate_import_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, Error> {
    let trimmed: String = raw
        .trim()
        .chars()
        .map(|c| if matches!(c, '−' | '—' | '–') { '-' } else { c })
        .collect();
    if trimmed.is_empty() {
        return Err(Error::validation("date is required"));
    }
    let ymd = if let Some(c) = ISO_LOOSE.captures(&trimmed) {
        (c[1].parse::<i32>().ok(), c[2].parse::<u32>().ok(), c[3].parse::<u32>().ok())
    } else if let Some(c) = DAY_FIRST.captures(&trimmed) {
        (c[3].parse::<i32>().ok(), c[2].parse::<u32>().ok(), c[1].parse::<u32>().ok())
    } else {
        return Err(Error::validation(format!(
            "invalid date format '{}'; use YYYY-MM-DD or DD/MM/YYYY",
            raw
        )));
    };
    let date = match ymd {
        (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d),
        _ => None,
    }
    .ok_or_else(|| Error::validation(format!("invalid date '{}'", raw)))?;

    let min_year = today.year() - 10;
    let max_year = today.year() + 1;
    if date.year() < min_year || date.year() > max_year {
        return Err(Error::validation(format!(
            "date '{}' is outside acceptable range ({}-{})",
            raw, min_year, max_year
        )));
    }
    Ok(date)
}

/// Strips currency symbols, thousands separators and spaces, then rounds to
/// two decimals.
pub fn validate_import_amount(raw: &str) -> Result<Decimal, Error> {
    let clean: String = raw
        .chars()
        .filter(|c| !matches!(c, '₺' | '$' | '€' | '£' | ',') && !c.is_whitespace())
        .collect();
    if clean.is_empty() {
        return Err(Error::validation("amount is required"));
    }
    let amount = clean
        .trim_start_matches('+')
        .parse::<Decimal>()
        .map_err(|_| Error::validation(format!("invalid amount '{}'", raw)))?;
    if amount.abs() > Decimal::new(1_000_000, 0) {
        return Err(Error::validation(format!(
            "amount '{}' exceeds maximum limit of 1,000,000",
            raw
        )));
    }
    Ok(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

pub fn validate_bank(raw: Option<&str>) -> Result<String, Error> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::validation("bank name is required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn import_dates_accept_loose_and_day_first_forms() {
        let today = day(2025, 6, 1);
        assert_eq!(validate_import_date("2025-3-7", today).unwrap(), day(2025, 3, 7));
        assert_eq!(validate_import_date("07/03/2025", today).unwrap(), day(2025, 3, 7));
        assert_eq!(validate_import_date("7-3-2025", today).unwrap(), day(2025, 3, 7));
        assert_eq!(validate_import_date("2025–03–07", today).unwrap(), day(2025, 3, 7));
        assert!(validate_import_date("2025-02-30", today).is_err());
        assert!(validate_import_date("2014-12-31", today).is_err());
        assert!(validate_import_date("2027-01-01", today).is_err());
        assert!(validate_import_date("yesterday", today).is_err());
    }

    #[test]
    fn date_patterns_compile() {
        assert!(ISO_LOOSE.is_match("2025-01-02"));
        assert!(DAY_FIRST.is_match("02/01/2025"));
    }

    #[test]
    fn import_amounts_strip_symbols_and_round() {
        assert_eq!(validate_import_amount("₺1,234.567").unwrap(), Decimal::new(123457, 2));
        assert_eq!(validate_import_amount("-$ 12.5").unwrap(), Decimal::new(-1250, 2));
        assert!(validate_import_amount("1000000.01").is_err());
        assert!(validate_import_amount("abc").is_err());
        assert!(validate_import_amount("").is_err());
    }

    #[test]
    fn folds_turkish_letters() {
        assert_eq!(fold_turkish("ulaşım ğıda"), "ulasim gida");
    }

    #[test]
    fn display_date_is_short_month() {
        assert_eq!(display_date(day(2025, 1, 5)), "Jan 5, 2025");
    }
}
