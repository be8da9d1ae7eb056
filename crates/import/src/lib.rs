pub mod categorize;
pub mod config;
pub mod csv;
pub mod dedupe;
pub mod normalize;
pub mod pipeline;
pub mod sniff;
pub mod stats;
pub mod validate;

pub use categorize::{
    categorize_row, detect_category_from_description, detect_sub_category, map_category,
    map_category_with, MerchantMapping, MerchantTable, MERCHANT_MAPPINGS,
};
pub use config::{ConfigError, ImportConfig};
pub use csv::{
    export_csv, map_csv_columns, parse_csv, parse_headers, suggest_column_mapping, ExportError,
    RawRow,
};
pub use dedupe::{detect_duplicates, AMOUNT_TOLERANCE};
pub use normalize::{clean_description, normalize_amount, normalize_row, parse_date, parse_date_or};
pub use pipeline::{ImportContext, ImportPipeline, ImportResult, SniffReport};
pub use sniff::{detect_csv_format, detect_date_format, detect_delimiter, DateFormat};
pub use stats::{calculate_balance_impact, get_transaction_stats};
pub use validate::validate_transactions;
