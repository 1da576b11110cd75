// 🏗️ Format Dispatcher
// Capability trait for bank transformers + the ordered registry that picks one

use crate::banks::{BogTransformer, TbcTransformer};
use crate::error::{Diagnostic, Result};
use crate::normalize::HeaderSet;
use crate::schema::SchemaDescriptor;
use crate::table::RawTable;
use crate::transaction::{CanonicalTransaction, SourceBank};
use tracing::{debug, warn};

// ============================================================================
// CAPABILITY TRAIT
// ============================================================================

/// BankTransformer - one implementation per supported export format
///
/// Adding a bank: implement this trait (declare the column set, policy and
/// mapping) and register it. Nothing else changes.
pub trait BankTransformer: Send + Sync {
    /// Which bank tag the produced rows carry
    fn source_bank(&self) -> SourceBank;

    /// Expected normalized columns + match policy
    fn descriptor(&self) -> &SchemaDescriptor;

    /// Raw header names that locate the header row below a spreadsheet
    /// preamble. `None` for formats whose header is the first row.
    fn header_markers(&self) -> Option<&'static [&'static str]> {
        None
    }

    fn is_bank_columns(&self, headers: &HeaderSet) -> bool {
        self.descriptor().matches(headers)
    }

    /// Map a recognized table into canonical rows, sorted by date.
    ///
    /// `currency` is injected when the table carries no currency column.
    fn transform(&self, table: &RawTable, currency: Option<&str>) -> Result<Vec<CanonicalTransaction>>;
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Dispatch result: the chosen transformer, plus a diagnostic when the
/// header was accepted by more than one schema.
pub struct Identified<'a> {
    pub transformer: &'a dyn BankTransformer,
    pub ambiguity: Option<Diagnostic>,
}

/// Ordered set of transformers; read-only once built.
pub struct TransformerRegistry {
    transformers: Vec<Box<dyn BankTransformer>>,
}

impl TransformerRegistry {
    pub fn empty() -> Self {
        TransformerRegistry {
            transformers: Vec::new(),
        }
    }

    /// Registry with every supported bank, in dispatch order.
    pub fn new() -> Self {
        let registry = Self::empty()
            .register(BogTransformer::new())
            .register(TbcTransformer::new());

        debug!(banks = ?registry.banks(), "registered transformers");
        registry
    }

    pub fn register(mut self, transformer: impl BankTransformer + 'static) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }

    pub fn banks(&self) -> Vec<SourceBank> {
        self.transformers.iter().map(|t| t.source_bank()).collect()
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Marker sets for spreadsheet header sniffing, in registration order.
    pub fn header_markers(&self) -> Vec<&'static [&'static str]> {
        self.transformers
            .iter()
            .filter_map(|t| t.header_markers())
            .collect()
    }

    /// Every transformer accepting these headers, in registration order.
    pub fn matching(&self, headers: &HeaderSet) -> Vec<&dyn BankTransformer> {
        self.transformers
            .iter()
            .filter(|t| {
                let hit = t.is_bank_columns(headers);
                debug!(bank = t.source_bank().code(), hit, "checking columns");
                hit
            })
            .map(|t| &**t)
            .collect()
    }

    /// First registered transformer whose schema accepts the table.
    ///
    /// `None` when nothing matches; the caller decides whether that is fatal.
    /// Several matches are not an error: the first registered wins and the
    /// result carries an `AmbiguousSchema` diagnostic.
    pub fn identify(&self, table: &RawTable) -> Option<Identified<'_>> {
        let headers = table.header_set();
        let candidates = self.matching(&headers);
        let transformer = *candidates.first()?;

        let ambiguity = (candidates.len() > 1).then(|| Diagnostic::AmbiguousSchema {
            chosen: transformer.source_bank().code(),
            candidates: candidates.iter().map(|t| t.source_bank().code()).collect(),
        });
        if let Some(diagnostic) = &ambiguity {
            warn!("{}", diagnostic);
        }

        Some(Identified {
            transformer,
            ambiguity,
        })
    }

    /// Pairs (earlier, later) where the earlier schema would claim a table
    /// shaped exactly like the later one's declared columns.
    pub fn shadowed_pairs(&self) -> Vec<(SourceBank, SourceBank)> {
        let mut pairs = Vec::new();

        for (i, earlier) in self.transformers.iter().enumerate() {
            for later in &self.transformers[i + 1..] {
                if earlier.is_bank_columns(later.descriptor().columns()) {
                    pairs.push((earlier.source_bank(), later.source_bank()));
                }
            }
        }

        pairs
    }
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
