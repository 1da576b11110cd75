// 🔤 Column Normalizer
// Raw header strings → comparable tokens

use std::collections::BTreeSet;

const STRIPPED: [char; 4] = ['(', ')', ',', '.'];

/// Canonicalize a header name.
///
/// Lower-cases, trims, turns spaces (including non-breaking ones) and
/// hyphens into `_`, and drops `(`, `)`, `,`, `.`.
///
/// Punctuation is dropped before trimming, so a stray edge mark such as
/// `"Doc N ."` yields `doc_n` rather than `doc_n_`.
///
/// ```
/// use statement_merger::normalize::normalize;
/// assert_eq!(normalize(" Doc N. "), "doc_n");
/// assert_eq!(normalize("Sender Account (N)"), "sender_account_n");
/// ```
pub fn normalize(name: &str) -> String {
    let lowered: String = name
        .to_lowercase()
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .collect();

    lowered
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '\u{a0}' | '-' => '_',
            other => other,
        })
        .collect()
}

/// Normalized header tokens of a table.
///
/// Only constructible through [`normalize`], so descriptor columns and input
/// headers always go through the same canonicalization before comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet(BTreeSet<String>);

impl HeaderSet {
    /// Normalize every name; blank headers are skipped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        HeaderSet(
            names
                .into_iter()
                .map(|n| normalize(n.as_ref()))
                .filter(|n| !n.is_empty())
                .collect(),
        )
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains(column)
    }

    pub fn is_subset(&self, other: &HeaderSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}
