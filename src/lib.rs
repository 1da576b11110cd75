// Statement Merger - Core Library
// Reads TBC / Bank of Georgia exports and merges them into one statement

pub mod error;
pub mod normalize;      // Column Normalizer
pub mod table;          // Untyped cells + row views
pub mod transaction;    // Canonical schema
pub mod schema;         // Schema Matchers
pub mod sniffer;        // Header-row / Currency Sniffer
pub mod dispatch;       // Format Dispatcher
pub mod banks;          // Bank Transformers
pub mod reader;         // CSV / XLSX input
pub mod statement;      // Aggregator + Post-Processor
pub mod writer;         // CSV / XLSX output
pub mod pipeline;       // Per-file + per-directory orchestration
pub mod logging;

// Re-export commonly used types
pub use error::{Diagnostic, Result, StatementError};
pub use normalize::{normalize, HeaderSet};
pub use table::{Cell, RawTable};
pub use transaction::{CanonicalTransaction, Direction, SourceBank};
pub use schema::{MatchPolicy, SchemaDescriptor};
pub use sniffer::{find_currency, find_header_row};
pub use dispatch::{BankTransformer, Identified, TransformerRegistry};
pub use banks::{BogTransformer, TbcTransformer};
pub use statement::{
    aggregate, post_process,
    ConsolidatedStatement, StatementBatch, StatementKey, StatementRow,
};
pub use writer::{read_statement_csv, write_outputs, OutputPaths};
pub use pipeline::{has_statement_files, statement_files, StatementProcessor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
