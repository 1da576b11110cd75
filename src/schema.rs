// 📐 Schema Matchers - recognize a bank by its header shape

use crate::normalize::HeaderSet;

// ============================================================================
// MATCH POLICY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Input header set must equal the declared set.
    /// For exports with a fixed column count.
    Exact,
    /// Declared set must be contained in the input header set.
    /// For exports that grow incidental columns across versions.
    Subset,
}

// ============================================================================
// SCHEMA DESCRIPTOR
// ============================================================================

/// Declared column set + match policy of one source bank.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    columns: HeaderSet,
    policy: MatchPolicy,
}

impl SchemaDescriptor {
    /// Declared names are normalized the same way input headers are.
    pub fn new(columns: &[&str], policy: MatchPolicy) -> Self {
        SchemaDescriptor {
            columns: HeaderSet::from_names(columns),
            policy,
        }
    }

    pub fn exact(columns: &[&str]) -> Self {
        Self::new(columns, MatchPolicy::Exact)
    }

    pub fn subset(columns: &[&str]) -> Self {
        Self::new(columns, MatchPolicy::Subset)
    }

    pub fn columns(&self) -> &HeaderSet {
        &self.columns
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn matches(&self, headers: &HeaderSet) -> bool {
        match self.policy {
            MatchPolicy::Exact => *headers == self.columns,
            MatchPolicy::Subset => self.columns.is_subset(headers),
        }
    }
}
