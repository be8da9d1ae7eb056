use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::categorize::{MerchantMapping, MerchantTable};
use crate::csv::fields;

const KNOWN_FIELDS: &[&str] = &[
    fields::DATE,
    fields::AMOUNT,
    fields::DESCRIPTION,
    fields::CATEGORY,
    fields::TYPE,
    fields::DEBIT,
    fields::CREDIT,
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(char),
    #[error("Column '{column}' maps to unknown field '{field}'")]
    UnknownField { column: String, field: String },
}

/// Per-bank import settings, usually read from a TOML file:
///
/// ```toml
/// delimiter = ";"
///
/// [columns]
/// "F. Valor" = "date"
/// "Concepto" = "description"
/// "Importe" = "amount"
///
/// [[merchants]]
/// keywords = ["PANADERIA PEPE"]
/// category = "Alimentación"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Skip sniffing and split on this character.
    pub delimiter: Option<char>,
    /// Source header → canonical field. Empty means auto-detect.
    pub columns: BTreeMap<String, String>,
    pub preserve_unmapped: bool,
    pub builtin_merchants: bool,
    /// Tried before the built-in merchant table.
    pub merchants: Vec<MerchantMapping>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            columns: BTreeMap::new(),
            preserve_unmapped: false,
            builtin_merchants: true,
            merchants: Vec::new(),
        }
    }
}

impl ImportConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: ImportConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(
            path = %path.display(),
            columns = config.columns.len(),
            merchants = config.merchants.len(),
            "loaded import config"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(d) = self.delimiter {
            if !d.is_ascii() {
                return Err(ConfigError::InvalidDelimiter(d));
            }
        }
        for (column, field) in &self.columns {
            if !KNOWN_FIELDS.contains(&field.as_str()) {
                return Err(ConfigError::UnknownField {
                    column: column.clone(),
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }

    /// Explicit column mapping, or `None` to fall back to header detection.
    pub fn column_mapping(&self) -> Option<Vec<(String, String)>> {
        if self.columns.is_empty() {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    pub fn merchant_table(&self) -> MerchantTable {
        MerchantTable::with_extra(self.merchants.clone(), self.builtin_merchants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        let config = ImportConfig::from_toml("").unwrap();
        assert_eq!(config, ImportConfig::default());
        assert!(config.builtin_merchants);
        assert!(config.column_mapping().is_none());
    }

    #[test]
    fn full_document() {
        let config = ImportConfig::from_toml(
            r#"
            delimiter = ";"
            preserve_unmapped = true

            [columns]
            "F. Valor" = "date"
            "Importe" = "amount"

            [[merchants]]
            keywords = ["PANADERIA PEPE"]
            category = "Alimentación"
            "#,
        )
        .unwrap();
        assert_eq!(config.delimiter, Some(';'));
        assert!(config.preserve_unmapped);
        assert_eq!(
            config.column_mapping().unwrap(),
            vec![
                ("F. Valor".to_string(), "date".to_string()),
                ("Importe".to_string(), "amount".to_string()),
            ]
        );
        let table = config.merchant_table();
        assert_eq!(table.detect("PANADERIA PEPE SL").unwrap().category, "Alimentación");
        assert!(table.detect("NETFLIX").is_some());
    }

    #[test]
    fn tab_delimiter_escape() {
        let config = ImportConfig::from_toml(r#"delimiter = "\t""#).unwrap();
        assert_eq!(config.delimiter, Some('\t'));
    }

    #[test]
    fn builtin_merchants_can_be_disabled() {
        let config = ImportConfig::from_toml("builtin_merchants = false").unwrap();
        assert!(config.merchant_table().is_empty());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = ImportConfig::from_toml("[columns]\nSaldo = \"balance\"").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownField { ref field, .. } if field == "balance"));
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let err = ImportConfig::from_toml(r#"delimiter = "¦""#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDelimiter('¦')));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            ImportConfig::from_toml("delimiter = "),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "delimiter = \"|\"").unwrap();
        let config = ImportConfig::load(file.path()).unwrap();
        assert_eq!(config.delimiter, Some('|'));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImportConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
