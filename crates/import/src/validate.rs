use hogar_core::{
    CandidateTransaction, Field, ValidationError, DESCRIPTION_PLACEHOLDER, INVALID_DATE,
};

/// Report structural defects; each row is checked independently and may
/// yield up to one error per field. Rows are never dropped here.
pub fn validate_transactions(rows: &[CandidateTransaction]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (row, tx) in rows.iter().enumerate() {
        if let Some(message) = date_defect(tx) {
            errors.push(ValidationError {
                row,
                field: Field::Date,
                message: message.to_string(),
                value: tx.date.clone(),
            });
        }

        if !tx.amount.is_finite() {
            errors.push(ValidationError {
                row,
                field: Field::Amount,
                message: "Importe inválido".to_string(),
                value: tx.amount.to_string(),
            });
        }

        let description = tx.description.trim();
        if description.is_empty() || description == DESCRIPTION_PLACEHOLDER {
            errors.push(ValidationError {
                row,
                field: Field::Description,
                message: "Descripción vacía".to_string(),
                value: tx.description.clone(),
            });
        }
    }

    if !errors.is_empty() {
        tracing::debug!(rows = rows.len(), errors = errors.len(), "validation found defects");
    }
    errors
}

fn date_defect(tx: &CandidateTransaction) -> Option<&'static str> {
    let date = tx.date.trim();
    if date.is_empty() {
        return Some("Fecha vacía");
    }
    if date == INVALID_DATE || tx.calendar_date().is_none() {
        return Some("Fecha inválida");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use hogar_core::TransactionType;

    fn tx(date: &str, amount: f64, description: &str) -> CandidateTransaction {
        CandidateTransaction::new(date, amount, TransactionType::Expense, description)
    }

    #[test]
    fn clean_row_has_no_errors() {
        assert!(validate_transactions(&[tx("2024-01-15", 10.0, "Luz")]).is_empty());
    }

    #[test]
    fn all_three_defects_are_reported() {
        let errors = validate_transactions(&[tx("Invalid Date", f64::NAN, "   ")]);
        assert_eq!(errors.len(), 3);
        let fields: Vec<Field> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, [Field::Date, Field::Amount, Field::Description]);
        assert!(errors.iter().all(|e| e.row == 0));
    }

    #[test]
    fn placeholder_description_is_an_error() {
        let errors = validate_transactions(&[tx("2024-01-15", 1.0, DESCRIPTION_PLACEHOLDER)]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, Field::Description);
    }

    #[test]
    fn empty_and_impossible_dates_are_errors() {
        let errors = validate_transactions(&[
            tx("", 1.0, "a"),
            tx("2024-02-31", 1.0, "b"),
            tx("2024-02-29", 1.0, "c"),
        ]);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].row, 0);
        assert_eq!(errors[0].message, "Fecha vacía");
        assert_eq!(errors[1].row, 1);
        assert_eq!(errors[1].value, "2024-02-31");
    }

    #[test]
    fn infinite_amount_is_an_error_but_zero_is_not() {
        let errors = validate_transactions(&[tx("2024-01-15", f64::INFINITY, "a"), tx("2024-01-15", 0.0, "b")]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, Field::Amount);
    }

    #[test]
    fn row_indices_follow_input_order() {
        let errors = validate_transactions(&[
            tx("2024-01-15", 1.0, "ok"),
            tx("2024-01-15", f64::NAN, "bad amount"),
            tx("2024-01-15", 1.0, "ok"),
            tx("Invalid Date", 1.0, "bad date"),
        ]);
        let rows: Vec<usize> = errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, [1, 3]);
    }
}
