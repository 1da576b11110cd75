// 💾 Statement writers - consolidated statement → CSV + XLSX
// Both files land together or not at all: each is written to a `.part`
// sibling first and renamed once both writes succeeded.

use crate::error::{Result, StatementError};
use crate::statement::{decimal_comma, ConsolidatedStatement, StatementRow};
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CSV_FILE_NAME: &str = "output_statement.csv";
pub const XLSX_FILE_NAME: &str = "output_statement.xlsx";

/// Output header, in column order.
pub const OUTPUT_COLUMNS: [&str; 9] = [
    "ID транзакции",
    "Дата",
    "Счёт",
    "Счёт получателя",
    "Сумма",
    "Приход / расход",
    "Валюта",
    "Комментарии",
    "bank",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: &Path) -> Self {
        OutputPaths {
            csv: dir.join(CSV_FILE_NAME),
            xlsx: dir.join(XLSX_FILE_NAME),
        }
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn output_error(path: &Path, message: impl ToString) -> StatementError {
    StatementError::Output {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

// ============================================================================
// CSV
// ============================================================================

/// Semicolon-delimited, decimal comma, header always present.
pub fn write_statement_csv(statement: &ConsolidatedStatement, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_path(path)
        .map_err(|e| output_error(path, e))?;

    writer
        .write_record(OUTPUT_COLUMNS)
        .map_err(|e| output_error(path, e))?;

    for row in statement.rows() {
        writer.serialize(row).map_err(|e| output_error(path, e))?;
    }

    writer.flush().map_err(|e| StatementError::io(path, e))?;
    Ok(())
}

/// Load a statement previously written by [`write_statement_csv`].
pub fn read_statement_csv(path: &Path) -> Result<ConsolidatedStatement> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .map_err(|source| StatementError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let rows = reader
        .deserialize::<StatementRow>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|source| StatementError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(ConsolidatedStatement::from_rows(rows))
}

// ============================================================================
// XLSX
// ============================================================================

/// Single sheet, bold header; every cell is text so amounts keep the comma.
pub fn write_statement_xlsx(statement: &ConsolidatedStatement, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook
        .add_worksheet()
        .set_name("Statement")
        .map_err(|e| output_error(path, e))?;

    for (col, name) in OUTPUT_COLUMNS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *name, &header_format)
            .map_err(|e| output_error(path, e))?;
    }

    for (index, row) in statement.rows().iter().enumerate() {
        let row_num = (index + 1) as u32;
        for (col, value) in row_cells(row).iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(row_num, col as u16, value)
                .map_err(|e| output_error(path, e))?;
        }
    }

    workbook.save(path).map_err(|e| output_error(path, e))?;
    Ok(())
}

fn row_cells(row: &StatementRow) -> [String; 9] {
    [
        row.transaction_id.clone(),
        row.date.clone(),
        row.account.clone().unwrap_or_default(),
        row.counterparty.clone().unwrap_or_default(),
        decimal_comma::format(row.amount),
        row.direction.label().to_string(),
        row.currency.clone().unwrap_or_default(),
        row.comment.clone().unwrap_or_default(),
        row.bank.code().to_string(),
    ]
}

// ============================================================================
// BOTH OUTPUTS
// ============================================================================

/// Write both outputs into `dir`; on any failure neither final file exists.
pub fn write_outputs(statement: &ConsolidatedStatement, dir: &Path) -> Result<OutputPaths> {
    let paths = OutputPaths::in_dir(dir);
    let csv_part = part_path(&paths.csv);
    let xlsx_part = part_path(&paths.xlsx);

    let written = write_statement_csv(statement, &csv_part)
        .and_then(|_| write_statement_xlsx(statement, &xlsx_part));

    if let Err(e) = written {
        discard(&[&csv_part, &xlsx_part]);
        return Err(e);
    }
    debug!(dir = %dir.display(), "temporary outputs written");

    if let Err(e) = fs::rename(&csv_part, &paths.csv) {
        discard(&[&csv_part, &xlsx_part]);
        return Err(StatementError::io(&paths.csv, e));
    }
    if let Err(e) = fs::rename(&xlsx_part, &paths.xlsx) {
        discard(&[&paths.csv, &xlsx_part]);
        return Err(StatementError::io(&paths.xlsx, e));
    }

    info!(
        rows = statement.len(),
        csv = %paths.csv.display(),
        xlsx = %paths.xlsx.display(),
        "statement written"
    );
    Ok(paths)
}

fn discard(paths: &[&Path]) {
    for path in paths {
        if path.exists() {
            let _ = fs::remove_file(path);
        }
    }
}
