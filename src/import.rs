// 📥 Import - CSV files into raw tables
//
// Header row required. Rows may be shorter or longer than the header; missing
// cells read as empty. Cells are trimmed so stray spaces and tabs never reach
// the normalizer.

use crate::records::RawTable;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Load a CSV file into a RawTable
pub fn load_table(path: &Path) -> Result<RawTable> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let table = read_table(file).with_context(|| format!("Failed to read {}", path.display()))?;

    debug!(
        "loaded {} rows ({} columns) from {}",
        table.len(),
        table.headers.len(),
        path.display()
    );
    Ok(table)
}

/// Read CSV from any reader
pub fn read_table<R: Read>(reader: R) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        // +2: 1-indexed plus the header row
        let record = result.with_context(|| format!("Failed to parse CSV line {}", line_num + 2))?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    Ok(RawTable::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_table_trims_and_keeps_ragged_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Name ,Department,Date,\tTime").unwrap();
        writeln!(file, " Ahmad ,Admin,2023-01-15,08:05").unwrap();
        writeln!(file, "Fatima,Accounting,2023-01-15").unwrap();
        file.flush().unwrap();

        let table = load_table(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.column_index("Time"), Some(3));
        assert_eq!(table.cell(0, 0), "Ahmad");
        assert_eq!(table.cell(1, 3), "");
    }

    #[test]
    fn test_read_table_from_bytes() {
        let data = "Name,Shift Date\nAhmad,2023-01-15\nAhmad,2023-01-16\n";
        let table = read_table(data.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["Name", "Shift Date"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_file_has_path_in_error() {
        let err = load_table(Path::new("/nonexistent/punches.csv")).unwrap_err();
        assert!(err.to_string().contains("punches.csv"));
    }
}
