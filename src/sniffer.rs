// 🔎 Header-row / Currency Sniffer
// Spreadsheet exports put titles and account metadata above the real header

use crate::error::{Result, StatementError};
use crate::table::Cell;
use std::collections::HashSet;
use tracing::debug;

/// Currency codes recognized when scanning metadata cells.
pub const KNOWN_CURRENCIES: [&str; 2] = ["eur", "gel"];

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Index of the first row whose cells contain every target column name.
///
/// Comparison ignores whitespace entirely, so `"Doc N"` matches `"DocN"` and
/// `" Doc  N "`. Data starts on the row after the returned index.
pub fn find_header_row(rows: &[Vec<Cell>], target: &[&str]) -> Result<usize> {
    let wanted: HashSet<String> = target.iter().map(|t| strip_whitespace(t)).collect();

    for (idx, row) in rows.iter().enumerate() {
        let present: HashSet<String> = row
            .iter()
            .map(|cell| strip_whitespace(&cell.as_text()))
            .collect();

        if wanted.is_subset(&present) {
            debug!(row = idx, "header row located");
            return Ok(idx);
        }
    }

    Err(StatementError::HeaderNotFound {
        columns: target.iter().map(|t| t.to_string()).collect(),
    })
}

/// First recognized currency code found in any cell, upper-cased.
///
/// Cells are compared after trimming, lower-casing and removing spaces.
/// Scans the whole grid row by row: the code may sit in any metadata cell.
pub fn find_currency(rows: &[Vec<Cell>]) -> Option<String> {
    rows.iter()
        .flat_map(|row| row.iter())
        .filter_map(|cell| match cell {
            Cell::Text(s) => Some(s.trim().to_lowercase().replace(' ', "")),
            _ => None,
        })
        .find(|value| KNOWN_CURRENCIES.contains(&value.as_str()))
        .map(|code| code.to_uppercase())
}
