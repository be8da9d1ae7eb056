use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use hogar_core::{Category, ExistingTransaction};
use hogar_import::{export_csv, ImportConfig, ImportContext, ImportPipeline};

use crate::OutputFormat;

pub struct ImportArgs<'a> {
    pub file: &'a Path,
    pub delimiter: Option<char>,
    pub config: Option<&'a Path>,
    pub categories: Option<&'a Path>,
    pub existing: Option<&'a Path>,
    pub balance: f64,
    pub format: OutputFormat,
}

pub fn sniff(file: &Path, delimiter: Option<char>, config: Option<&Path>) -> Result<()> {
    let pipeline = ImportPipeline::new(load_config(config, delimiter)?);
    let text = read_statement(file)?;
    write_json(&pipeline.sniff(&text))
}

pub fn import(args: ImportArgs<'_>) -> Result<()> {
    let pipeline = ImportPipeline::new(load_config(args.config, args.delimiter)?);
    let text = read_statement(args.file)?;

    let ctx = ImportContext {
        categories: read_json_list::<Category>(args.categories)?,
        existing: read_json_list::<ExistingTransaction>(args.existing)?,
        current_balance: args.balance,
    };
    let result = pipeline.run(&text, &ctx);

    for error in &result.errors {
        tracing::warn!("{error}");
    }

    match args.format {
        OutputFormat::Json => write_json(&result),
        OutputFormat::Csv => {
            let csv = export_csv(&result.transactions, ',')?;
            std::io::stdout()
                .lock()
                .write_all(csv.as_bytes())
                .context("writing CSV to stdout")
        }
    }
}

fn load_config(path: Option<&Path>, delimiter: Option<char>) -> Result<ImportConfig> {
    let mut config = match path {
        Some(path) => ImportConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ImportConfig::default(),
    };
    if delimiter.is_some() {
        config.delimiter = delimiter;
    }
    Ok(config)
}

/// Bank exports are frequently Latin-1; undecodable bytes become U+FFFD.
fn read_statement(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_json_list<T: DeserializeOwned>(path: Option<&Path>) -> Result<Vec<T>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn write_json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).context("writing JSON to stdout")?;
    writeln!(out)?;
    Ok(())
}
