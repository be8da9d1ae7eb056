use hogar_core::{CandidateTransaction, DuplicateMatch, ExistingTransaction};

/// Amounts closer than this are the same amount.
pub const AMOUNT_TOLERANCE: f64 = 0.01;

/// Pair each incoming row with every stored transaction on the same date,
/// with an amount within [`AMOUNT_TOLERANCE`] and the same description once
/// case and spacing are ignored. Rows without matches are left out.
pub fn detect_duplicates(
    new_rows: &[CandidateTransaction],
    existing: &[ExistingTransaction],
) -> Vec<DuplicateMatch> {
    let existing_keys: Vec<String> = existing.iter().map(|e| normalize(&e.description)).collect();

    let duplicates: Vec<DuplicateMatch> = new_rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let description = normalize(&row.description);
            let matches: Vec<ExistingTransaction> = existing
                .iter()
                .zip(&existing_keys)
                .filter(|(e, key)| {
                    e.date == row.date
                        && (e.amount - row.amount).abs() < AMOUNT_TOLERANCE
                        && **key == description
                })
                .map(|(e, _)| e.clone())
                .collect();

            (!matches.is_empty()).then_some(DuplicateMatch { index, matches })
        })
        .collect();

    tracing::debug!(
        rows = new_rows.len(),
        existing = existing.len(),
        duplicates = duplicates.len(),
        "duplicate scan finished"
    );
    duplicates
}

fn normalize(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
