use serde::Serialize;

use hogar_core::{
    BalanceImpact, CandidateTransaction, Category, DuplicateMatch, ExistingTransaction,
    TransactionStats, ValidationError,
};

use crate::categorize::{categorize_row, MerchantTable};
use crate::config::ImportConfig;
use crate::csv::{fields, map_csv_columns, parse_csv, parse_headers, suggest_column_mapping};
use crate::dedupe::detect_duplicates;
use crate::normalize::normalize_row;
use crate::sniff::{detect_date_format, detect_delimiter, DateFormat};
use crate::stats::{calculate_balance_impact, get_transaction_stats};
use crate::validate::validate_transactions;

/// What the caller already knows about the target account.
#[derive(Debug, Clone, Default)]
pub struct ImportContext {
    pub categories: Vec<Category>,
    pub existing: Vec<ExistingTransaction>,
    pub current_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub delimiter: char,
    pub date_format: DateFormat,
    /// Source header → canonical field actually applied.
    pub columns: Vec<(String, String)>,
    pub transactions: Vec<CandidateTransaction>,
    pub errors: Vec<ValidationError>,
    pub duplicates: Vec<DuplicateMatch>,
    pub stats: TransactionStats,
    pub balance_impact: BalanceImpact,
}

/// What the pipeline would do with a file, before importing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SniffReport {
    pub delimiter: char,
    pub date_format: DateFormat,
    pub headers: Vec<String>,
    pub suggested_columns: Vec<(String, String)>,
}

impl ImportResult {
    /// Rows with neither a validation error nor a duplicate.
    pub fn clean_rows(&self) -> Vec<&CandidateTransaction> {
        self.transactions
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                !self.errors.iter().any(|e| e.row == *i)
                    && !self.duplicates.iter().any(|d| d.index == *i)
            })
            .map(|(_, tx)| tx)
            .collect()
    }
}

/// Sniff → parse → map → normalize → categorize → validate/dedupe/aggregate.
///
/// Nothing here fails: defects end up in [`ImportResult::errors`].
pub struct ImportPipeline {
    config: ImportConfig,
    merchants: MerchantTable,
}

impl ImportPipeline {
    pub fn new(config: ImportConfig) -> Self {
        let merchants = config.merchant_table();
        Self { config, merchants }
    }

    /// Detect delimiter, headers, column mapping and date layout without
    /// normalizing anything.
    pub fn sniff(&self, text: &str) -> SniffReport {
        let text = strip_bom(text);
        let delimiter = self.delimiter_for(text);
        let headers = parse_headers(text, Some(delimiter));
        let suggested_columns = self.columns_for(&headers);

        let rows = map_csv_columns(&parse_csv(text, Some(delimiter)), &suggested_columns, false);
        let date_samples: Vec<&str> = rows.iter().filter_map(|r| r.get(fields::DATE)).collect();

        SniffReport {
            delimiter,
            date_format: detect_date_format(&date_samples),
            headers,
            suggested_columns,
        }
    }

    pub fn run(&self, text: &str, ctx: &ImportContext) -> ImportResult {
        let text = strip_bom(text);
        let delimiter = self.delimiter_for(text);
        let columns = self.columns_for(&parse_headers(text, Some(delimiter)));
        if !columns.iter().any(|(_, field)| field == fields::DATE) {
            tracing::warn!(?delimiter, "no date column recognised");
        }

        let raw = parse_csv(text, Some(delimiter));
        let rows = map_csv_columns(&raw, &columns, self.config.preserve_unmapped);

        let date_samples: Vec<&str> = rows.iter().filter_map(|r| r.get(fields::DATE)).collect();
        let date_format = detect_date_format(&date_samples);

        let transactions: Vec<CandidateTransaction> = rows
            .iter()
            .map(|row| {
                categorize_row(
                    normalize_row(row),
                    row.get(fields::CATEGORY),
                    &ctx.categories,
                    &self.merchants,
                )
            })
            .collect();

        let errors = validate_transactions(&transactions);
        let duplicates = detect_duplicates(&transactions, &ctx.existing);
        let stats = get_transaction_stats(&transactions);
        let balance_impact = calculate_balance_impact(&transactions, ctx.current_balance);

        tracing::info!(
            rows = transactions.len(),
            errors = errors.len(),
            duplicates = duplicates.len(),
            date_range = %stats.date_range,
            "import finished"
        );

        ImportResult {
            delimiter,
            date_format,
            columns,
            transactions,
            errors,
            duplicates,
            stats,
            balance_impact,
        }
    }

    fn delimiter_for(&self, text: &str) -> char {
        self.config.delimiter.unwrap_or_else(|| {
            let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or_default();
            detect_delimiter(header)
        })
    }

    fn columns_for(&self, headers: &[String]) -> Vec<(String, String)> {
        self.config
            .column_mapping()
            .unwrap_or_else(|| suggest_column_mapping(headers))
    }
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

impl Default for ImportPipeline {
    fn default() -> Self {
        Self::new(ImportConfig::default())
    }
}
