use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Description used when a row has nothing printable left to show.
pub const DESCRIPTION_PLACEHOLDER: &str = "Sin descripción";

/// Sentinel some hosts store for dates that failed to parse.
pub const INVALID_DATE: &str = "Invalid Date";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Income => write!(f, "INCOME"),
            TransactionType::Expense => write!(f, "EXPENSE"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    /// Accepts the canonical labels plus the Spanish and bank-statement
    /// spellings that show up in exported `Tipo` columns.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "ingreso" | "ingresos" | "abono" | "credit" | "haber" => {
                Ok(TransactionType::Income)
            }
            "expense" | "gasto" | "gastos" | "cargo" | "debit" | "debe" => {
                Ok(TransactionType::Expense)
            }
            other => Err(format!("Unknown transaction type: '{other}'")),
        }
    }
}

/// A parsed-and-normalized row that the host has not accepted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTransaction {
    /// Canonical `YYYY-MM-DD`.
    pub date: String,
    /// Sign-less magnitude; direction lives in `transaction_type`.
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
}

impl CandidateTransaction {
    pub fn new(
        date: impl Into<String>,
        amount: f64,
        transaction_type: TransactionType,
        description: impl Into<String>,
    ) -> Self {
        CandidateTransaction {
            date: date.into(),
            amount,
            transaction_type,
            description: description.into(),
            category: None,
            sub_category: None,
        }
    }

    /// The date as a calendar value, if it is a real `YYYY-MM-DD` date.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }
}

/// A transaction the host already stores, used for duplicate detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: String,
    pub amount: f64,
    pub description: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn transaction_type_display_matches_wire_labels() {
        assert_eq!(TransactionType::Income.to_string(), "INCOME");
        assert_eq!(TransactionType::Expense.to_string(), "EXPENSE");
    }

    #[test]
    fn transaction_type_from_str_accepts_spanish_labels() {
        assert_eq!(TransactionType::from_str("Ingreso").unwrap(), TransactionType::Income);
        assert_eq!(TransactionType::from_str(" GASTO ").unwrap(), TransactionType::Expense);
        assert_eq!(TransactionType::from_str("income").unwrap(), TransactionType::Income);
        assert!(TransactionType::from_str("transfer").is_err());
    }

    #[test]
    fn candidate_serializes_with_camel_case_and_type_key() {
        let mut tx = CandidateTransaction::new("2024-03-01", 12.5, TransactionType::Expense, "Cafe");
        tx.category = Some("Ocio".into());
        tx.sub_category = Some("Cafeterías".into());
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "EXPENSE");
        assert_eq!(json["subCategory"], "Cafeterías");
        assert_eq!(json["amount"], 12.5);
    }

    #[test]
    fn candidate_omits_absent_category() {
        let tx = CandidateTransaction::new("2024-03-01", 1.0, TransactionType::Income, "Nomina");
        let json = serde_json::to_value(&tx).unwrap();
        assert!(json.get("category").is_none());
        assert!(json.get("subCategory").is_none());
    }

    #[test]
    fn calendar_date_rejects_impossible_dates() {
        let ok = CandidateTransaction::new("2024-02-29", 1.0, TransactionType::Income, "x");
        assert_eq!(ok.calendar_date(), NaiveDate::from_ymd_opt(2024, 2, 29));
        let bad = CandidateTransaction::new("2023-02-29", 1.0, TransactionType::Income, "x");
        assert_eq!(bad.calendar_date(), None);
    }

    #[test]
    fn existing_transaction_deserializes_without_id() {
        let tx: ExistingTransaction = serde_json::from_str(
            r#"{"date":"2024-01-15","amount":42.0,"description":"Luz","type":"EXPENSE"}"#,
        )
        .unwrap();
        assert_eq!(tx.id, None);
        assert_eq!(tx.transaction_type, TransactionType::Expense);
    }
}
