// 📋 Raw Tables - parsed cells before any bank semantics
// Produced by the readers, consumed read-only by the transformers

use crate::error::{Result, StatementError};
use crate::normalize::{normalize, HeaderSet};
use chrono::{Duration, NaiveDate, NaiveDateTime};

// ============================================================================
// CELL
// ============================================================================

/// A single untyped cell as it came out of the file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Text cell from a raw CSV field (blank fields become `Empty`).
    pub fn from_field(field: &str) -> Self {
        if field.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(field.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display form used for header names and text columns.
    ///
    /// Integral numbers print without a fractional part so numeric
    /// identifiers survive a spreadsheet round trip ("1042", not "1042.0").
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Coerce to a date-time. `None` for empty cells.
    pub fn to_datetime(&self) -> std::result::Result<Option<NaiveDateTime>, String> {
        match self {
            Cell::Empty => Ok(None),
            Cell::DateTime(dt) => Ok(Some(*dt)),
            Cell::Number(n) => excel_serial_to_datetime(*n).map(Some),
            Cell::Text(s) if s.trim().is_empty() => Ok(None),
            Cell::Text(s) => parse_datetime(s).map(Some),
            Cell::Bool(b) => Err(format!("expected a date, found boolean {}", b)),
        }
    }

    /// Coerce to a decimal amount. `None` for empty cells.
    pub fn to_decimal(&self) -> std::result::Result<Option<f64>, String> {
        match self {
            Cell::Empty => Ok(None),
            Cell::Number(n) if n.is_finite() => Ok(Some(*n)),
            Cell::Number(n) => Err(format!("non-finite amount {}", n)),
            Cell::Text(s) if s.trim().is_empty() => Ok(None),
            Cell::Text(s) => parse_decimal(s).map(Some),
            Cell::Bool(b) => Err(format!("expected an amount, found boolean {}", b)),
            Cell::DateTime(dt) => Err(format!("expected an amount, found date {}", dt)),
        }
    }
}

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d.%m.%Y %H:%M:%S"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

fn parse_datetime(raw: &str) -> std::result::Result<NaiveDateTime, String> {
    let s = raw.trim();

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d.and_hms_opt(0, 0, 0).unwrap_or_default());
        }
    }

    Err(format!("unsupported date format: '{}'", s))
}

/// Excel serial date (1899-12-30 base); the fraction is the time of day.
pub(crate) fn excel_serial_to_datetime(serial: f64) -> std::result::Result<NaiveDateTime, String> {
    if !serial.is_finite() || serial < 0.0 {
        return Err(format!("invalid spreadsheet date serial {}", serial));
    }

    let base = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| "bad base date".to_string())?;

    let invalid = || format!("invalid spreadsheet date serial {}", serial);

    // the cast saturates; anything past chrono's range comes back as None
    let seconds = (serial * 86_400.0).round() as i64;
    Duration::try_seconds(seconds)
        .and_then(|offset| base.checked_add_signed(offset))
        .ok_or_else(invalid)
}

/// Parse amounts like "-150.00", "1 234,56", "1,234.56", "1.234,56", "+12".
///
/// With both `.` and `,` present the later one is the decimal mark.
fn parse_decimal(raw: &str) -> std::result::Result<f64, String> {
    let mut s: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'')
        .collect();

    match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => {
            s = s.replace('.', "").replace(',', ".");
        }
        (Some(_), Some(_)) => {
            s = s.replace(',', "");
        }
        (None, Some(_)) => {
            s = s.replace(',', ".");
        }
        _ => {}
    }

    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("not a decimal amount: '{}'", raw.trim()))
}

// ============================================================================
// RAW TABLE
// ============================================================================

/// Header row + data rows of untyped cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        RawTable { headers, rows }
    }

    /// Build a table from a raw grid whose header sits at `header_row`.
    /// Fully empty rows after the header are dropped.
    pub fn from_grid(grid: &[Vec<Cell>], header_row: usize) -> Self {
        let headers = grid
            .get(header_row)
            .map(|row| row.iter().map(|c| c.as_text().trim().to_string()).collect())
            .unwrap_or_default();

        let rows = grid
            .iter()
            .skip(header_row + 1)
            .filter(|row| !row.iter().all(Cell::is_empty))
            .cloned()
            .collect();

        RawTable { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header_set(&self) -> HeaderSet {
        HeaderSet::from_names(&self.headers)
    }

    /// Column access by normalized name, for one bank's transformer.
    pub fn columns(&self, bank: &'static str) -> Columns<'_> {
        Columns {
            table: self,
            bank,
            normalized: self.headers.iter().map(|h| normalize(h)).collect(),
        }
    }
}

// ============================================================================
// TYPED COLUMN ACCESS
// ============================================================================

/// Normalized-name view over a table's columns.
///
/// Every coercion failure is reported as `SchemaMismatch` naming the bank,
/// the column and the 1-based data row.
pub struct Columns<'a> {
    table: &'a RawTable,
    bank: &'static str,
    normalized: Vec<String>,
}

impl<'a> Columns<'a> {
    pub fn has(&self, column: &str) -> bool {
        self.normalized.iter().any(|c| c == column)
    }

    fn index(&self, column: &str) -> Option<usize> {
        self.normalized.iter().position(|c| c == column)
    }

    /// Fail fast when a declared column is absent.
    pub fn require(&self, columns: &[&str]) -> Result<()> {
        for column in columns {
            if !self.has(column) {
                return Err(StatementError::mismatch(self.bank, column, 0, "column missing"));
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> + '_ {
        self.table
            .rows
            .iter()
            .enumerate()
            .map(move |(i, cells)| RowView {
                columns: self,
                cells,
                number: i + 1,
            })
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

/// One data row, read through its table's normalized column names.
pub struct RowView<'a> {
    columns: &'a Columns<'a>,
    cells: &'a [Cell],
    number: usize,
}

impl<'a> RowView<'a> {
    /// 1-based data row number (header excluded).
    pub fn number(&self) -> usize {
        self.number
    }

    fn cell(&self, column: &str) -> Result<&'a Cell> {
        let idx = self.columns.index(column).ok_or_else(|| {
            StatementError::mismatch(self.columns.bank, column, self.number, "column missing")
        })?;
        Ok(self.cells.get(idx).unwrap_or(&EMPTY_CELL))
    }

    fn mismatch(&self, column: &str, reason: impl Into<String>) -> StatementError {
        StatementError::mismatch(self.columns.bank, column, self.number, reason)
    }

    /// Non-empty text, or `None` when the cell (or the column) is absent.
    pub fn text(&self, column: &str) -> Option<String> {
        let idx = self.columns.index(column)?;
        let cell = self.cells.get(idx)?;
        if cell.is_empty() {
            None
        } else {
            Some(cell.as_text().trim().to_string())
        }
    }

    /// Text that must be present.
    pub fn required_text(&self, column: &str) -> Result<String> {
        if self.cell(column)?.is_empty() {
            return Err(self.mismatch(column, "empty value"));
        }
        Ok(self.text(column).unwrap_or_default())
    }

    pub fn date(&self, column: &str) -> Result<NaiveDateTime> {
        self.optional_date(column)?
            .ok_or_else(|| self.mismatch(column, "empty date"))
    }

    pub fn optional_date(&self, column: &str) -> Result<Option<NaiveDateTime>> {
        self.cell(column)?
            .to_datetime()
            .map_err(|reason| self.mismatch(column, reason))
    }

    pub fn decimal(&self, column: &str) -> Result<f64> {
        self.optional_decimal(column)?
            .ok_or_else(|| self.mismatch(column, "empty amount"))
    }

    pub fn optional_decimal(&self, column: &str) -> Result<Option<f64>> {
        self.cell(column)?
            .to_decimal()
            .map_err(|reason| self.mismatch(column, reason))
    }
}
