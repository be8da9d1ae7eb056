use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive span of canonical `YYYY-MM-DD` dates. Both ends are absent when
/// no row carried a date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => write!(f, "{from} to {to}"),
            _ => write!(f, "empty"),
        }
    }
}

impl DateRange {
    /// Builds the range from any set of dates; blank entries are ignored.
    /// Canonical dates order lexicographically, so string min/max is enough.
    pub fn spanning<'a, I>(dates: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut present: Vec<&str> = dates
            .into_iter()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .collect();
        present.sort_unstable();

        DateRange {
            from: present.first().map(|d| d.to_string()),
            to: present.last().map(|d| d.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_none()
    }
}
