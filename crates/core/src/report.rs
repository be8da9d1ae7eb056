use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::period::DateRange;
use crate::transaction::ExistingTransaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Date,
    Amount,
    Description,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Date => write!(f, "date"),
            Field::Amount => write!(f, "amount"),
            Field::Description => write!(f, "description"),
        }
    }
}

/// One defect found in one row. Rows are reported, never dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Zero-based position of the row in the batch.
    pub row: usize,
    pub field: Field,
    pub message: String,
    /// The offending value as it was seen.
    pub value: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {} ({}='{}')", self.row, self.message, self.field, self.value)
    }
}

/// An incoming row paired with every stored transaction it duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub index: usize,
    pub matches: Vec<ExistingTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStats {
    pub total: usize,
    pub income: usize,
    pub expense: usize,
    pub total_income: f64,
    pub total_expense: f64,
    pub date_range: DateRange,
    /// Row count per category; uncategorized rows are not counted.
    pub categories: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceImpact {
    pub impact: f64,
    pub final_balance: f64,
    pub income_total: f64,
    pub expense_total: f64,
}
