//! Field normalizers. Every function here returns a usable value for any
//! input; defects are left for [`crate::validate`] to report.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::Regex;

use hogar_core::{CandidateTransaction, TransactionType, DESCRIPTION_PLACEHOLDER};

use crate::csv::{fields, RawRow};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_date_iso, r"^\d{4}-\d{2}-\d{2}$");
re!(re_date_day_first, r"^(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4})(?:\s.*)?$");
re!(re_date_year_first, r"^(\d{4})[/\-.](\d{1,2})[/\-.](\d{1,2})(?:[\sT].*)?$");
re!(re_two_decimals, r",\d{2}$");
re!(re_disallowed_chars, r"[^A-Za-z0-9áéíóúüñÁÉÍÓÚÜÑ\s.,;:()/\-€$]");

const GENERIC_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

const GENERIC_DATE_FORMATS: &[&str] = &[
    "%d %b %Y", "%d %B %Y", "%b %d, %Y", "%B %d, %Y", "%b %d %Y", "%d-%b-%Y", "%Y%m%d",
];

// ── Dates ────────────────────────────────────────────────────────────────────

/// Canonicalize a date cell to `YYYY-MM-DD`, falling back to today.
///
/// Slash, dash and dot separated dates with the year last are read day-first
/// (`03/04/2024` is 3 April). Hosts with month-first exports must convert
/// before import.
pub fn parse_date(raw: &str) -> String {
    parse_date_or(raw, Local::now().date_naive())
}

/// [`parse_date`] with an explicit fallback instead of today.
pub fn parse_date_or(raw: &str, fallback: NaiveDate) -> String {
    let s = raw.trim();
    if s.is_empty() {
        return format_date(fallback);
    }

    if re_date_iso().is_match(s) {
        return s.to_string();
    }

    // Calendar validity is checked by the validator, not here.
    if let Some(caps) = re_date_day_first().captures(s) {
        return format!("{}-{:0>2}-{:0>2}", &caps[3], &caps[2], &caps[1]);
    }
    if let Some(caps) = re_date_year_first().captures(s) {
        return format!("{}-{:0>2}-{:0>2}", &caps[1], &caps[2], &caps[3]);
    }

    if let Some(date) = parse_generic_date(s) {
        return format_date(date);
    }

    tracing::warn!(value = s, fallback = %fallback, "unrecognised date, using fallback");
    format_date(fallback)
}

fn parse_generic_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    for fmt in GENERIC_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    GENERIC_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ── Amounts ──────────────────────────────────────────────────────────────────

/// Parse an amount written in either European (`1.234,56`) or Anglo
/// (`1,234.56`) notation. The sign is kept; garbage becomes `0.0`.
///
/// With both separators present the last one is the decimal mark. A lone
/// comma is decimal only when exactly two digits follow it, so `1,234` reads
/// as 1234 and `12,5` as 125. That heuristic is lossy for three-decimal or
/// thousands-only inputs.
pub fn normalize_amount(raw: &str) -> f64 {
    let mut s: String = raw
        .chars()
        .filter(|c| !matches!(*c, '€' | '$' | '£') && !c.is_whitespace())
        .collect();

    let negative = s.starts_with('(') && s.ends_with(')') && s.len() > 2;
    if negative {
        s = s[1..s.len() - 1].to_string();
    }

    let last_comma = s.rfind(',');
    let last_dot = s.rfind('.');
    s = match (last_comma, last_dot) {
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replacen(',', ".", 1),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(comma), None) if re_two_decimals().is_match(&s) => {
            let (int_part, frac_part) = s.split_at(comma);
            format!("{}.{}", int_part.replace(',', ""), &frac_part[1..])
        }
        (Some(_), None) => s.replace(',', ""),
        _ => s,
    };

    match s.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            if negative {
                -value
            } else {
                value
            }
        }
        _ => {
            if !raw.trim().is_empty() {
                tracing::debug!(value = raw, "unparseable amount, using 0");
            }
            0.0
        }
    }
}

// ── Descriptions ─────────────────────────────────────────────────────────────

/// Single-space, strip unsupported symbols and capitalize the first letter.
pub fn clean_description(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let stripped = re_disallowed_chars().replace_all(&collapsed, "");
    let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut chars = cleaned.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => DESCRIPTION_PLACEHOLDER.to_string(),
    }
}

// ── Rows ─────────────────────────────────────────────────────────────────────

/// Build a candidate from a row already mapped to canonical field names.
///
/// The amount comes from `amount`, or from `credit` minus `debit` when there
/// is no amount column. The direction comes from an explicit `type` cell,
/// otherwise from the sign. A row with no amount at all gets `NaN` so that
/// validation reports it.
pub fn normalize_row(row: &RawRow) -> CandidateTransaction {
    let date = parse_date(row.get(fields::DATE).unwrap_or_default());
    let description = clean_description(row.get(fields::DESCRIPTION).unwrap_or_default());

    let signed = match non_blank(row, fields::AMOUNT) {
        Some(raw) => normalize_amount(raw),
        None => {
            let debit = non_blank(row, fields::DEBIT).map(normalize_amount);
            let credit = non_blank(row, fields::CREDIT).map(normalize_amount);
            match (debit, credit) {
                (None, None) => f64::NAN,
                (d, c) => c.unwrap_or(0.0).abs() - d.unwrap_or(0.0).abs(),
            }
        }
    };

    let transaction_type = non_blank(row, fields::TYPE)
        .and_then(|label| match TransactionType::from_str(label) {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!("{e}; inferring type from amount sign");
                None
            }
        })
        .unwrap_or(if signed < 0.0 {
            TransactionType::Expense
        } else {
            TransactionType::Income
        });

    CandidateTransaction::new(date, signed.abs(), transaction_type, description)
}

fn non_blank<'a>(row: &'a RawRow, key: &str) -> Option<&'a str> {
    row.get(key).filter(|v| !v.trim().is_empty())
}
