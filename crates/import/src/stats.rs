use std::collections::BTreeMap;

use hogar_core::{BalanceImpact, CandidateTransaction, DateRange, TransactionStats};

/// Aggregate counts, sums, date span and category histogram in one pass.
pub fn get_transaction_stats(rows: &[CandidateTransaction]) -> TransactionStats {
    let mut stats = TransactionStats {
        total: rows.len(),
        ..Default::default()
    };
    let mut categories: BTreeMap<String, usize> = BTreeMap::new();

    for tx in rows {
        let amount = summable(tx);
        if tx.is_income() {
            stats.income += 1;
            stats.total_income += amount;
        } else {
            stats.expense += 1;
            stats.total_expense += amount;
        }
        if let Some(category) = &tx.category {
            *categories.entry(category.clone()).or_default() += 1;
        }
    }

    stats.date_range = DateRange::spanning(rows.iter().map(|tx| tx.date.as_str()));
    stats.categories = categories;
    stats
}

/// Net effect of the batch on an account balance.
pub fn calculate_balance_impact(rows: &[CandidateTransaction], current_balance: f64) -> BalanceImpact {
    // Same summation order as get_transaction_stats so the totals agree exactly.
    let (income_total, expense_total) = rows.iter().fold((0.0_f64, 0.0_f64), |(income, expense), tx| {
        if tx.is_income() {
            (income + summable(tx), expense)
        } else {
            (income, expense + summable(tx))
        }
    });

    let impact = income_total - expense_total;
    BalanceImpact {
        impact,
        final_balance: current_balance + impact,
        income_total,
        expense_total,
    }
}

/// Rows whose amount the validator rejects still count, but add nothing.
fn summable(tx: &CandidateTransaction) -> f64 {
    if tx.amount.is_finite() {
        tx.amount
    } else {
        0.0
    }
}
