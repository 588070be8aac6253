//! Reading datasets into a [`Table`] and writing cleaned tables back out.
//!
//! Delimited text and JSON go through polars; spreadsheets are read cell by
//! cell with calamine so that genuinely mixed columns survive ingestion.

mod frame;
mod spreadsheet;

use crate::error::{CleaningError, Result, ResultExt};
use crate::table::Table;
use polars::prelude::{
    CsvParseOptions, CsvReadOptions, CsvWriter, DataFrame, JsonReader, SerReader, SerWriter,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Number of rows polars samples when inferring CSV column dtypes.
const INFER_SCHEMA_LENGTH: usize = 1000;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// Comma-separated values.
    Csv,
    /// Tab-separated values (`.tsv` and `.txt`).
    Tsv,
    /// Excel or OpenDocument workbook; the first worksheet is read.
    Spreadsheet,
    /// An array of JSON records.
    Json,
}

impl InputFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" | "txt" => Ok(Self::Tsv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Ok(Self::Spreadsheet),
            "json" => Ok(Self::Json),
            "" => Err(CleaningError::UnsupportedFormat(format!(
                "'{}' has no file extension",
                path.display()
            ))),
            other => Err(CleaningError::UnsupportedFormat(format!(".{other}"))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Spreadsheet => "spreadsheet",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Read a dataset from disk, detecting the format from its extension.
pub fn read_path(path: &Path) -> Result<Table> {
    let format = InputFormat::from_path(path)?;
    read_path_as(path, format)
}

/// Read a dataset from disk with an explicitly declared format.
pub fn read_path_as(path: &Path, format: InputFormat) -> Result<Table> {
    info!("Loading {} as {}", path.display(), format);
    let bytes = std::fs::read(path).map_err(|e| {
        CleaningError::Io(e).with_context(format!("Failed to read '{}'", path.display()))
    })?;
    read_bytes(&bytes, format)
}

/// Parse raw bytes of a declared format into a table.
pub fn read_bytes(bytes: &[u8], format: InputFormat) -> Result<Table> {
    let table = match format {
        InputFormat::Csv => frame::table_from_dataframe(&read_delimited(bytes, b',')?)?,
        InputFormat::Tsv => frame::table_from_dataframe(&read_delimited(bytes, b'\t')?)?,
        InputFormat::Json => {
            let df = JsonReader::new(Cursor::new(bytes))
                .finish()
                .map_err(|e| CleaningError::Parse(format!("invalid JSON records: {e}")))?;
            frame::table_from_dataframe(&df)?
        }
        InputFormat::Spreadsheet => spreadsheet::read_first_sheet(bytes)?,
    };

    debug!(
        "Parsed {} table: {} rows x {} columns",
        format,
        table.height(),
        table.width()
    );
    Ok(table)
}

fn read_delimited(bytes: &[u8], separator: u8) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_LENGTH))
        .with_parse_options(CsvParseOptions::default().with_separator(separator))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| CleaningError::Parse(format!("invalid delimited text: {e}")))
}

/// Write a table as CSV.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut df = table.to_dataframe()?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .context(format!("Failed to write '{}'", path.display()))?;
    info!("Saved cleaned data to {}", path.display());
    Ok(())
}
