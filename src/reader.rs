// 📂 Statement readers - file bytes → raw cell grids
// CSV exports are semicolon-delimited; spreadsheets are read from the first sheet

use crate::error::{Result, StatementError};
use crate::table::{excel_serial_to_datetime, Cell, RawTable};
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;
use tracing::debug;

// ============================================================================
// FORMAT DETECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementFormat {
    Csv,
    Xlsx,
}

impl StatementFormat {
    /// Case-insensitive extension check; `None` for anything else.
    pub fn detect(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(StatementFormat::Csv),
            "xlsx" => Some(StatementFormat::Xlsx),
            _ => None,
        }
    }

    /// Like [`detect`](Self::detect), but an unknown extension is an error.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::detect(path).ok_or_else(|| StatementError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string(),
        })
    }
}

// ============================================================================
// CSV
// ============================================================================

/// Decode CSV bytes: UTF-8 (BOM stripped), falling back to Windows-1251
/// for legacy Cyrillic exports.
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => match s.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => s,
        },
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1251.decode(&bytes);
            debug!("statement is not UTF-8, decoded as Windows-1251");
            decoded.into_owned()
        }
    }
}

/// Read a semicolon-delimited CSV whose first record is the header.
pub fn read_csv_table(path: &Path) -> Result<RawTable> {
    let bytes = std::fs::read(path).map_err(|e| StatementError::io(path, e))?;
    let content = decode_text(bytes);
    parse_csv_table(&content).map_err(|source| StatementError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_csv_table(content: &str) -> std::result::Result<RawTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let headers: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(|h| h.trim().to_string()).collect(),
        None => return Ok(RawTable::new(Vec::new(), Vec::new())),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        rows.push(record.iter().map(Cell::from_field).collect());
    }

    Ok(RawTable::new(headers, rows))
}

// ============================================================================
// XLSX
// ============================================================================

/// Every row of the first worksheet, preamble included.
pub fn read_xlsx_grid(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let workbook_error = |message: String| StatementError::Workbook {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e| workbook_error(format!("failed to open: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| workbook_error("no sheets found".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| workbook_error(format!("failed to read sheet '{}': {}", sheet_name, e)))?;

    let grid: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    debug!(sheet = %sheet_name, rows = grid.len(), "worksheet loaded");
    Ok(grid)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from_field(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match excel_serial_to_datetime(dt.as_f64()) {
            Ok(value) => Cell::DateTime(value),
            Err(_) => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(StatementFormat::detect(Path::new("tbc.csv")), Some(StatementFormat::Csv));
        assert_eq!(StatementFormat::detect(Path::new("BOG.XLSX")), Some(StatementFormat::Xlsx));
        assert_eq!(StatementFormat::detect(Path::new("notes.txt")), None);
        assert_eq!(StatementFormat::detect(Path::new("no_extension")), None);
    }

    #[test]
    fn test_from_path_unsupported() {
        let err = StatementFormat::from_path(Path::new("statement.pdf")).unwrap_err();
        match err {
            StatementError::UnsupportedFormat { extension, .. } => assert_eq!(extension, "pdf"),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_strips_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("Date;Volume".as_bytes());
        assert_eq!(decode_text(bytes), "Date;Volume");
    }

    #[test]
    fn test_decode_windows_1251_fallback() {
        // "Дата" in Windows-1251
        let bytes = vec![0xC4, 0xE0, 0xF2, 0xE0];
        assert_eq!(decode_text(bytes), "Дата");
    }

    #[test]
    fn test_parse_csv_table() {
        let table = parse_csv_table("Date; Volume ;Note\n2024-01-01;-150.00;rent\n2024-01-02;10;\n").unwrap();
        assert_eq!(table.headers(), &["Date", "Volume", "Note"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][1], Cell::Text("-150.00".to_string()));
        assert_eq!(table.rows()[1][2], Cell::Empty);
    }

    #[test]
    fn test_parse_empty_csv() {
        let table = parse_csv_table("").unwrap();
        assert!(table.headers().is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_out_of_range_datetime_cell_stays_numeric() {
        use calamine::{ExcelDateTime, ExcelDateTimeType};

        let data = Data::DateTime(ExcelDateTime::new(1e8, ExcelDateTimeType::DateTime, false));
        assert_eq!(cell_from_data(&data), Cell::Number(1e8));
    }

    #[test]
    fn test_read_csv_missing_file() {
        let err = read_csv_table(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, StatementError::Io { .. }));
    }
}
