//! CSV ingestion and export.
//!
//! Bytes must already be UTF-8; character-set detection belongs to the
//! caller.

use crate::error::{Result, ResultExt};
use polars::prelude::*;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::debug;

/// Rows scanned to infer column dtypes.
const INFER_SCHEMA_ROWS: usize = 100;

/// Parse a delimited byte buffer with a header row.
pub fn read_csv_bytes(data: &[u8]) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .into_reader_with_file_handle(Cursor::new(data.to_vec()))
        .finish()
        .context("reading CSV")?;
    debug!("Parsed CSV: {} rows x {} columns", df.height(), df.width());
    Ok(df)
}

/// Read a CSV file from disk.
pub fn read_csv_file(path: impl AsRef<Path>) -> Result<DataFrame> {
    let data = std::fs::read(path.as_ref())?;
    read_csv_bytes(&data)
}

/// Serialize `df` as CSV with a header row.
pub fn write_csv<W: Write>(df: &mut DataFrame, writer: W) -> Result<()> {
    let mut writer = writer;
    CsvWriter::new(&mut writer)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)
        .context("writing CSV")?;
    Ok(())
}

/// Serialize `df` to CSV bytes.
pub fn write_csv_bytes(df: &mut DataFrame) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(df, &mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_csv_bytes() {
        let df = read_csv_bytes(b"x,city\n1,oslo\n2,\"rome, it\"\n,lima\n").unwrap();
        assert_eq!(df.shape(), (3, 2));
        assert_eq!(df.column("x").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("x").unwrap().null_count(), 1);
        assert_eq!(df.column("city").unwrap().str().unwrap().get(1), Some("rome, it"));
    }

    #[test]
    fn test_write_then_read() {
        let mut df = df!("a" => [1.5, 2.5], "b" => ["p", "q"]).unwrap();
        let bytes = write_csv_bytes(&mut df).unwrap();
        assert_eq!(String::from_utf8(bytes.clone()).unwrap(), "a,b\n1.5,p\n2.5,q\n");
        assert!(read_csv_bytes(&bytes).unwrap().equals_missing(&df));
    }
}
