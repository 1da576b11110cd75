// 🔄 Statement pipeline - files → dispatch → canonical rows → batch
//
// A directory run is all-or-nothing: every file is read and transformed
// before any row is committed to the batch.

use crate::dispatch::TransformerRegistry;
use crate::error::{Diagnostic, Result, StatementError};
use crate::reader::{read_csv_table, read_xlsx_grid, StatementFormat};
use crate::sniffer::{find_currency, find_header_row};
use crate::statement::{post_process, ConsolidatedStatement, StatementBatch};
use crate::table::{Cell, RawTable};
use crate::transaction::CanonicalTransaction;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Rows and diagnostics of one file, not yet committed.
struct FileOutcome {
    transactions: Vec<CanonicalTransaction>,
    diagnostics: Vec<Diagnostic>,
}

pub struct StatementProcessor {
    registry: TransformerRegistry,
    batch: StatementBatch,
    diagnostics: Vec<Diagnostic>,
}

impl StatementProcessor {
    pub fn new(registry: TransformerRegistry) -> Self {
        StatementProcessor {
            registry,
            batch: StatementBatch::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn registry(&self) -> &TransformerRegistry {
        &self.registry
    }

    pub fn batch(&self) -> &StatementBatch {
        &self.batch
    }

    /// Recoverable conditions met so far, in file order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Sorted, display-ready view of everything processed so far.
    pub fn post_process(&self) -> ConsolidatedStatement {
        post_process(&self.batch)
    }

    // ========================================================================
    // SINGLE FILE
    // ========================================================================

    /// Transform one statement file; its rows are also appended to the batch.
    pub fn process_file(&mut self, path: &Path) -> Result<Vec<CanonicalTransaction>> {
        let outcome = self.read_file(path)?;
        let transactions = outcome.transactions.clone();
        self.commit(outcome);
        Ok(transactions)
    }

    fn commit(&mut self, outcome: FileOutcome) -> usize {
        let count = outcome.transactions.len();
        self.batch.extend(outcome.transactions);
        self.diagnostics.extend(outcome.diagnostics);
        count
    }

    fn read_file(&self, path: &Path) -> Result<FileOutcome> {
        if !path.is_file() {
            return Err(StatementError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let format = StatementFormat::from_path(path)?;
        let (table, sniffed_currency) = match format {
            StatementFormat::Csv => (read_csv_table(path)?, None),
            StatementFormat::Xlsx => self.load_spreadsheet(path)?,
        };

        let mut diagnostics = Vec::new();

        let identified = self.registry.identify(&table).ok_or_else(|| {
            StatementError::NoMatchingSchema {
                columns: table.header_set().to_vec(),
            }
        })?;
        let transformer = identified.transformer;
        let bank = transformer.source_bank();
        diagnostics.extend(identified.ambiguity);

        debug!(file = %path.display(), bank = bank.code(), rows = table.len(), "schema identified");
        let transactions = transformer.transform(&table, sniffed_currency.as_deref())?;

        if transactions.iter().any(|tx| tx.currency.is_none()) {
            let diagnostic = Diagnostic::MissingCurrency {
                bank: bank.code(),
                path: path.to_path_buf(),
            };
            warn!("{}", diagnostic);
            diagnostics.push(diagnostic);
        }

        info!(
            file = %path.display(),
            bank = bank.code(),
            rows = transactions.len(),
            "statement processed"
        );

        Ok(FileOutcome {
            transactions,
            diagnostics,
        })
    }

    /// Locate the header below the preamble and sniff the account currency.
    fn load_spreadsheet(&self, path: &Path) -> Result<(RawTable, Option<String>)> {
        let grid = read_xlsx_grid(path)?;
        let header_row = self.locate_header(&grid)?;
        let currency = find_currency(&grid);

        debug!(
            file = %path.display(),
            header_row,
            currency = currency.as_deref().unwrap_or("-"),
            "spreadsheet layout sniffed"
        );

        Ok((RawTable::from_grid(&grid, header_row), currency))
    }

    fn locate_header(&self, grid: &[Vec<Cell>]) -> Result<usize> {
        let marker_sets = self.registry.header_markers();
        let mut first_error = None;

        for markers in &marker_sets {
            match find_header_row(grid, markers) {
                Ok(row) => return Ok(row),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        // no bank declares markers: the header is the first row
        match first_error {
            Some(e) => Err(e),
            None => Ok(0),
        }
    }

    // ========================================================================
    // DIRECTORY
    // ========================================================================

    /// Process every statement in `dir`, in file-name order.
    ///
    /// The first failing file aborts the run and nothing is committed.
    pub fn process_directory(&mut self, dir: &Path) -> Result<&StatementBatch> {
        let files = statement_files(dir)?;
        if files.is_empty() {
            return Err(StatementError::MissingInput {
                path: dir.to_path_buf(),
            });
        }

        info!(dir = %dir.display(), files = files.len(), "processing statements");

        let mut outcomes = Vec::with_capacity(files.len());
        for file in &files {
            match self.read_file(file) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(file = %file.display(), error = %e, "statement failed, aborting run");
                    return Err(e);
                }
            }
        }

        let total: usize = outcomes.into_iter().map(|o| self.commit(o)).sum();
        info!(rows = total, batch = self.batch.len(), "all statements processed");
        Ok(&self.batch)
    }
}

impl Default for StatementProcessor {
    fn default() -> Self {
        Self::new(TransformerRegistry::default())
    }
}

/// Supported statement files directly inside `dir`, sorted by name.
pub fn statement_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(StatementError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = fs::read_dir(dir).map_err(|e| StatementError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| StatementError::io(dir, e))?.path();
        if path.is_file() && StatementFormat::detect(&path).is_some() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

pub fn has_statement_files(dir: &Path) -> bool {
    statement_files(dir).map(|f| !f.is_empty()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Direction;

    const TBC_HEADER: &str = "Payer Account;Date;Volume;Currency;To Account;Bank Code;\
                              Message for Beneficiary;Note;Type;ID of Transaction";

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_process_tbc_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "tbc.csv",
            &format!("{}\nGE01;2024-01-20;-150.00;GEL;GE99;;;rent;;T-2\n", TBC_HEADER),
        );

        let mut processor = StatementProcessor::default();
        assert_eq!(processor.process_file(&path).unwrap().len(), 1);

        let tx = &processor.batch().transactions()[0];
        assert_eq!(tx.direction, Direction::Debit);
        assert_eq!(tx.amount, 150.0);
        assert!(processor.diagnostics().is_empty());
    }

    #[test]
    fn test_missing_currency_is_a_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "tbc.csv",
            &format!("{}\nGE01;2024-01-20;10;;;;;;;T-1\n", TBC_HEADER),
        );

        let mut processor = StatementProcessor::default();
        processor.process_file(&path).unwrap();

        assert_eq!(
            processor.diagnostics(),
            &[Diagnostic::MissingCurrency {
                bank: "TBC",
                path: path.clone()
            }]
        );
        assert_eq!(processor.batch().transactions()[0].currency, None);
    }

    #[test]
    fn test_ambiguous_schema_is_recorded_once() {
        use crate::banks::TbcTransformer;
        use crate::dispatch::BankTransformer;
        use crate::schema::SchemaDescriptor;
        use crate::transaction::SourceBank;

        // claims anything with date + volume, ahead of TBC
        struct Loose(SchemaDescriptor);

        impl BankTransformer for Loose {
            fn source_bank(&self) -> SourceBank {
                SourceBank::BankOfGeorgia
            }
            fn descriptor(&self) -> &SchemaDescriptor {
                &self.0
            }
            fn transform(&self, _: &RawTable, _: Option<&str>) -> Result<Vec<CanonicalTransaction>> {
                Ok(Vec::new())
            }
        }

        let registry = TransformerRegistry::empty()
            .register(Loose(SchemaDescriptor::subset(&["date", "volume"])))
            .register(TbcTransformer::new());

        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "tbc.csv",
            &format!("{}\nGE01;2024-01-20;10;GEL;;;;;;T-1\n", TBC_HEADER),
        );

        let mut processor = StatementProcessor::new(registry);
        processor.process_file(&path).unwrap();

        assert_eq!(
            processor.diagnostics(),
            &[Diagnostic::AmbiguousSchema {
                chosen: "BOG",
                candidates: vec!["BOG", "TBC"],
            }]
        );
    }

    #[test]
    fn test_unknown_columns_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "other.csv", "Foo;Bar\n1;2\n");

        let err = StatementProcessor::default().process_file(&path).unwrap_err();
        match err {
            StatementError::NoMatchingSchema { columns } => assert_eq!(columns, vec!["bar", "foo"]),
            other => panic!("expected NoMatchingSchema, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = StatementProcessor::default()
            .process_file(Path::new("/no/such/statement.csv"))
            .unwrap_err();
        assert!(matches!(err, StatementError::FileNotFound { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "notes.txt", "hello");

        let err = StatementProcessor::default().process_file(&path).unwrap_err();
        assert!(matches!(err, StatementError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_directory_failure_commits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "a_tbc.csv",
            &format!("{}\nGE01;2024-01-20;10;GEL;;;;;;T-1\n", TBC_HEADER),
        );
        write(dir.path(), "b_broken.csv", "Foo;Bar\n1;2\n");

        let mut processor = StatementProcessor::default();
        assert!(processor.process_directory(dir.path()).is_err());
        assert!(processor.batch().is_empty());
    }

    #[test]
    fn test_directory_without_statements() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "readme.txt", "nothing here");

        assert!(!has_statement_files(dir.path()));
        let err = StatementProcessor::default()
            .process_directory(dir.path())
            .unwrap_err();
        assert!(matches!(err, StatementError::MissingInput { .. }));
    }

    #[test]
    fn test_statement_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.CSV", "");
        write(dir.path(), "a.xlsx", "");
        write(dir.path(), "c.txt", "");

        let names: Vec<String> = statement_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.xlsx", "b.CSV"]);
    }

    #[test]
    fn test_locate_header_without_markers_uses_first_row() {
        let processor = StatementProcessor::new(TransformerRegistry::empty());
        let grid = vec![vec![Cell::from_field("Date")]];
        assert_eq!(processor.locate_header(&grid).unwrap(), 0);
    }

    #[test]
    fn test_locate_header_not_found() {
        let processor = StatementProcessor::default();
        let grid = vec![vec![Cell::from_field("Something else")]];
        assert!(matches!(
            processor.locate_header(&grid),
            Err(StatementError::HeaderNotFound { .. })
        ));
    }
}
