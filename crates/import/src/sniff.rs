use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Delimiters tried by [`detect_delimiter`], in tie-break order.
pub const DELIMITER_CANDIDATES: [char; 4] = [',', ';', '\t', '|'];

/// Reduced candidate set used by [`detect_csv_format`].
pub const CSV_FORMAT_CANDIDATES: [char; 3] = [',', ';', '\t'];

const DATE_SAMPLE_LIMIT: usize = 10;

/// Date layout observed in a column. Slash dates are always day-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "YYYY-MM-DD")]
    Iso,
    #[serde(rename = "DD/MM/YYYY")]
    DayMonthYear,
}

impl DateFormat {
    pub fn label(self) -> &'static str {
        match self {
            DateFormat::Iso => "YYYY-MM-DD",
            DateFormat::DayMonthYear => "DD/MM/YYYY",
        }
    }
}

impl std::fmt::Display for DateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn re_iso() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("invalid regex"))
}

fn re_day_first() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("invalid regex"))
}

/// Guess the field delimiter from the first line of `text`.
pub fn detect_delimiter(text: &str) -> char {
    most_frequent(first_line(text), &DELIMITER_CANDIDATES)
}

/// Same as [`detect_delimiter`] without the pipe candidate.
pub fn detect_csv_format(text: &str) -> char {
    most_frequent(first_line(text), &CSV_FORMAT_CANDIDATES)
}

/// Classify up to ten non-empty samples. Anything unrecognised is treated as ISO.
pub fn detect_date_format<S: AsRef<str>>(samples: &[S]) -> DateFormat {
    let samples: Vec<&str> = samples
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .take(DATE_SAMPLE_LIMIT)
        .collect();

    if samples.is_empty() {
        return DateFormat::Iso;
    }
    if samples.iter().all(|s| re_iso().is_match(s)) {
        return DateFormat::Iso;
    }
    if samples.iter().all(|s| re_day_first().is_match(s)) {
        return DateFormat::DayMonthYear;
    }
    DateFormat::Iso
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

fn most_frequent(line: &str, candidates: &[char]) -> char {
    let mut best = ',';
    let mut best_count = 0usize;
    for &candidate in candidates {
        let count = line.matches(candidate).count();
        // Strict comparison keeps the earlier candidate on ties.
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}
