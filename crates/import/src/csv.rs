use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use hogar_core::CandidateTransaction;

use crate::sniff::detect_delimiter;

/// Canonical field names produced by column mapping and read by the normalizer.
pub mod fields {
    pub const DATE: &str = "date";
    pub const AMOUNT: &str = "amount";
    pub const DESCRIPTION: &str = "description";
    pub const CATEGORY: &str = "category";
    pub const TYPE: &str = "type";
    pub const DEBIT: &str = "debit";
    pub const CREDIT: &str = "credit";
}

/// Header aliases per canonical field, compared after folding case, accents
/// and dots. Earlier fields claim a header first.
const HEADER_ALIASES: &[(&str, &[&str])] = &[
    (
        fields::DATE,
        &[
            "fecha",
            "fecha operacion",
            "fecha valor",
            "f valor",
            "fecha contable",
            "date",
            "transaction date",
            "posted date",
        ],
    ),
    (
        fields::DESCRIPTION,
        &["concepto", "descripcion", "description", "detalle", "movimiento", "payee"],
    ),
    (fields::AMOUNT, &["importe", "cantidad", "monto", "amount", "importe eur"]),
    (fields::CATEGORY, &["categoria", "category"]),
    (fields::TYPE, &["tipo", "type", "tipo de movimiento"]),
    (fields::DEBIT, &["cargo", "cargos", "debe", "debit"]),
    (fields::CREDIT, &["abono", "abonos", "haber", "credit"]),
];

/// One CSV line keyed by header, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.cells.iter().any(|(k, _)| k == key)
    }

    /// Sets `key`, keeping its original position when it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| *k == key) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (k, v) in &self.cells {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(char),
}

/// Split `text` into header-keyed rows.
///
/// Blank lines are skipped, the first remaining line is the header, quoted
/// cells may contain the delimiter and `""` escapes. Every line is read on
/// its own, so a stray quote only affects the line it sits on. Short rows
/// simply lack their trailing keys; cells beyond the header are dropped.
/// When no delimiter is given it is sniffed from the header line.
pub fn parse_csv(text: &str, delimiter: Option<char>) -> Vec<RawRow> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header_line)) = lines.next() else {
        return Vec::new();
    };
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(header_line));
    let Some(delimiter_byte) = ascii_byte(delimiter) else {
        tracing::warn!(?delimiter, "non-ASCII delimiter, nothing parsed");
        return Vec::new();
    };

    let builder = line_reader(delimiter_byte);
    let headers: Vec<String> = match read_line(&builder, header_line) {
        Ok(record) => record.iter().map(str::to_string).collect(),
        Err(e) => {
            tracing::warn!("unreadable CSV header: {e}");
            return Vec::new();
        }
    };

    let mut rows = Vec::new();
    for (index, line) in lines {
        let record = match read_line(&builder, line) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(line = index + 1, "skipping unreadable CSV line: {e}");
                continue;
            }
        };
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect::<RawRow>(),
        );
    }

    tracing::debug!(
        delimiter = ?delimiter,
        columns = headers.len(),
        rows = rows.len(),
        "parsed CSV"
    );
    rows
}

/// The header line as parsed by [`parse_csv`], for column-mapping UIs.
pub fn parse_headers(text: &str, delimiter: Option<char>) -> Vec<String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(line) = text.lines().find(|line| !line.trim().is_empty()) else {
        return Vec::new();
    };
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(line));
    let Some(delimiter_byte) = ascii_byte(delimiter) else {
        return Vec::new();
    };

    match read_line(&line_reader(delimiter_byte), line) {
        Ok(record) => record.iter().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}

fn line_reader(delimiter: u8) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter);
    builder
}

/// One record from a single physical line. An unterminated quote runs to the
/// end of the line, never into the next one.
fn read_line(builder: &csv::ReaderBuilder, line: &str) -> Result<csv::StringRecord, csv::Error> {
    let mut record = csv::StringRecord::new();
    builder.from_reader(line.as_bytes()).read_record(&mut record)?;
    Ok(record)
}

/// Rename columns according to `header_to_field`, copying `row[source]` into
/// `result[target]` when present. With `preserve_unmapped`, other source
/// columns are carried through under their own names unless a mapped target
/// already took that name.
pub fn map_csv_columns<S, T>(
    rows: &[RawRow],
    header_to_field: &[(S, T)],
    preserve_unmapped: bool,
) -> Vec<RawRow>
where
    S: AsRef<str>,
    T: AsRef<str>,
{
    rows.iter()
        .map(|row| {
            let mut mapped = RawRow::new();
            for (source, target) in header_to_field {
                if let Some(value) = row.get(source.as_ref()) {
                    mapped.insert(target.as_ref(), value);
                }
            }

            if preserve_unmapped {
                for (key, value) in row.iter() {
                    let is_mapped = header_to_field.iter().any(|(s, _)| s.as_ref() == key);
                    if !is_mapped && !mapped.contains_key(key) {
                        mapped.insert(key, value);
                    }
                }
            }

            mapped
        })
        .collect()
}

/// Propose a header → field mapping for well-known bank export headers.
pub fn suggest_column_mapping<S: AsRef<str>>(headers: &[S]) -> Vec<(String, String)> {
    let folded: Vec<String> = headers.iter().map(|h| fold_header(h.as_ref())).collect();
    let mut claimed = vec![false; headers.len()];
    let mut mapping = Vec::new();

    for (field, aliases) in HEADER_ALIASES {
        let hit = folded
            .iter()
            .enumerate()
            .find(|(i, h)| !claimed[*i] && aliases.contains(&h.as_str()));
        if let Some((i, _)) = hit {
            claimed[i] = true;
            mapping.push((headers[i].as_ref().to_string(), field.to_string()));
        }
    }

    mapping
}

/// Write transactions as CSV with a fixed header.
pub fn export_csv(
    transactions: &[CandidateTransaction],
    delimiter: char,
) -> Result<String, ExportError> {
    let delimiter_byte = ascii_byte(delimiter).ok_or(ExportError::InvalidDelimiter(delimiter))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter_byte)
        .from_writer(Vec::new());

    writer.write_record(["date", "type", "amount", "description", "category", "subCategory"])?;
    for tx in transactions {
        let kind = tx.transaction_type.to_string();
        let amount = format!("{:.2}", tx.amount);
        writer.write_record([
            tx.date.as_str(),
            kind.as_str(),
            amount.as_str(),
            tx.description.as_str(),
            tx.category.as_deref().unwrap_or_default(),
            tx.sub_category.as_deref().unwrap_or_default(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn ascii_byte(c: char) -> Option<u8> {
    u8::try_from(c).ok().filter(u8::is_ascii)
}

fn fold_header(header: &str) -> String {
    let folded: String = header
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != '.' && *c != ':')
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
