// 📑 Aggregator & Post-Processor
// Union of every bank's rows → one totally ordered, re-keyed statement

use crate::transaction::{CanonicalTransaction, Direction, SourceBank};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Display format of the `Дата` column.
pub const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y";

// ============================================================================
// STATEMENT BATCH
// ============================================================================

/// All canonical rows of one run, in file-submission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementBatch {
    transactions: Vec<CanonicalTransaction>,
}

impl StatementBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one file's rows; nothing is deduplicated.
    pub fn extend(&mut self, transactions: Vec<CanonicalTransaction>) {
        self.transactions.extend(transactions);
    }

    pub fn transactions(&self) -> &[CanonicalTransaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Concatenate per-file results in the order given.
pub fn aggregate(batches: Vec<Vec<CanonicalTransaction>>) -> StatementBatch {
    let mut batch = StatementBatch::new();
    for transactions in batches {
        batch.extend(transactions);
    }
    batch
}

// ============================================================================
// CONSOLIDATED STATEMENT
// ============================================================================

/// Composite lookup key. Not unique: two banks may reuse the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatementKey {
    pub transaction_id: String,
    pub date: String,
}

/// Output row; field order is the column order of both output files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    #[serde(rename = "ID транзакции")]
    pub transaction_id: String,

    #[serde(rename = "Дата")]
    pub date: String,

    #[serde(rename = "Счёт")]
    pub account: Option<String>,

    #[serde(rename = "Счёт получателя")]
    pub counterparty: Option<String>,

    #[serde(rename = "Сумма", with = "decimal_comma")]
    pub amount: f64,

    #[serde(rename = "Приход / расход")]
    pub direction: Direction,

    #[serde(rename = "Валюта")]
    pub currency: Option<String>,

    #[serde(rename = "Комментарии")]
    pub comment: Option<String>,

    #[serde(rename = "bank")]
    pub bank: SourceBank,
}

impl StatementRow {
    fn from_transaction(tx: CanonicalTransaction) -> Self {
        StatementRow {
            transaction_id: tx.transaction_id,
            date: tx.date.format(DISPLAY_DATE_FORMAT).to_string(),
            account: tx.account,
            counterparty: tx.counterparty,
            amount: tx.amount,
            direction: tx.direction,
            currency: tx.currency,
            comment: tx.comment,
            bank: tx.bank,
        }
    }

    pub fn key(&self) -> StatementKey {
        StatementKey {
            transaction_id: self.transaction_id.clone(),
            date: self.date.clone(),
        }
    }
}

/// Amounts as text with a decimal comma, e.g. `150,5`.
pub mod decimal_comma {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn format(amount: f64) -> String {
        amount.to_string().replace('.', ",")
    }

    pub fn serialize<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*amount))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid amount '{}'", raw)))
    }
}

/// Post-processed statement: final order, display dates, composite keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidatedStatement {
    rows: Vec<StatementRow>,
    index: HashMap<StatementKey, Vec<usize>>,
}

impl ConsolidatedStatement {
    /// Rows are taken as already ordered.
    pub fn from_rows(rows: Vec<StatementRow>) -> Self {
        let mut index: HashMap<StatementKey, Vec<usize>> = HashMap::new();
        for (position, row) in rows.iter().enumerate() {
            index.entry(row.key()).or_default().push(position);
        }
        ConsolidatedStatement { rows, index }
    }

    pub fn rows(&self) -> &[StatementRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every row under a key, in statement order.
    pub fn get(&self, transaction_id: &str, date: &str) -> Vec<&StatementRow> {
        let key = StatementKey {
            transaction_id: transaction_id.to_string(),
            date: date.to_string(),
        };
        self.index
            .get(&key)
            .map(|positions| positions.iter().map(|&p| &self.rows[p]).collect())
            .unwrap_or_default()
    }

    /// Keys carried by more than one row.
    pub fn duplicate_keys(&self) -> Vec<&StatementKey> {
        let mut keys: Vec<&StatementKey> = self
            .index
            .iter()
            .filter(|(_, positions)| positions.len() > 1)
            .map(|(key, _)| key)
            .collect();
        keys.sort();
        keys
    }
}

// ============================================================================
// POST-PROCESSING
// ============================================================================

/// Date, bank tag, transaction id, credit before debit. The remaining fields
/// only break ties so the result does not depend on file order.
fn statement_order(a: &CanonicalTransaction, b: &CanonicalTransaction) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.bank.code().cmp(b.bank.code()))
        .then_with(|| a.transaction_id.cmp(&b.transaction_id))
        .then_with(|| a.direction.sort_rank().cmp(&b.direction.sort_rank()))
        .then_with(|| a.amount.total_cmp(&b.amount))
        .then_with(|| a.account.cmp(&b.account))
        .then_with(|| a.counterparty.cmp(&b.counterparty))
        .then_with(|| a.currency.cmp(&b.currency))
        .then_with(|| a.comment.cmp(&b.comment))
}

/// Sort, reformat dates for display and key rows by (transaction id, date).
pub fn post_process(batch: &StatementBatch) -> ConsolidatedStatement {
    let mut transactions = batch.transactions.clone();
    transactions.sort_by(statement_order);

    let rows: Vec<StatementRow> = transactions
        .into_iter()
        .map(StatementRow::from_transaction)
        .collect();

    let statement = ConsolidatedStatement::from_rows(rows);
    debug!(
        rows = statement.len(),
        duplicate_keys = statement.duplicate_keys().len(),
        "statement post-processed"
    );
    statement
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn tx(d: u32, id: &str, amount: f64, direction: Direction, bank: SourceBank) -> CanonicalTransaction {
        CanonicalTransaction::new(day(d), id.to_string(), amount, direction, bank)
    }

    #[test]
    fn test_aggregate_keeps_order_and_duplicates() {
        let a = vec![tx(2, "1", 5.0, Direction::Credit, SourceBank::Tbc)];
        let b = vec![
            tx(1, "1", 5.0, Direction::Credit, SourceBank::Tbc),
            tx(1, "1", 5.0, Direction::Credit, SourceBank::Tbc),
        ];
        let batch = aggregate(vec![a, b]);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.transactions()[0].date, day(2));
    }

    #[test]
    fn test_post_process_order() {
        let batch = aggregate(vec![vec![
            tx(3, "A", 1.0, Direction::Credit, SourceBank::Tbc),
            tx(1, "B", 1.0, Direction::Debit, SourceBank::Tbc),
            tx(1, "B", 1.0, Direction::Credit, SourceBank::Tbc),
            tx(1, "Z", 1.0, Direction::Credit, SourceBank::BankOfGeorgia),
            tx(1, "A", 1.0, Direction::Credit, SourceBank::Tbc),
        ]]);

        let statement = post_process(&batch);
        let order: Vec<(&str, &str, Direction)> = statement
            .rows()
            .iter()
            .map(|r| (r.date.as_str(), r.transaction_id.as_str(), r.direction))
            .collect();

        assert_eq!(
            order,
            vec![
                ("01.01.2024", "Z", Direction::Credit),
                ("01.01.2024", "A", Direction::Credit),
                ("01.01.2024", "B", Direction::Credit),
                ("01.01.2024", "B", Direction::Debit),
                ("03.01.2024", "A", Direction::Credit),
            ]
        );
    }

    #[test]
    fn test_display_date_zero_padded() {
        let batch = aggregate(vec![vec![tx(5, "1", 1.0, Direction::Credit, SourceBank::Tbc)]]);
        assert_eq!(post_process(&batch).rows()[0].date, "05.01.2024");
    }

    #[test]
    fn test_duplicate_keys_are_kept() {
        let batch = aggregate(vec![
            vec![tx(4, "100", 10.0, Direction::Credit, SourceBank::Tbc)],
            vec![tx(4, "100", 20.0, Direction::Debit, SourceBank::BankOfGeorgia)],
        ]);

        let statement = post_process(&batch);
        assert_eq!(statement.len(), 2);

        let rows = statement.get("100", "04.01.2024");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].bank, SourceBank::BankOfGeorgia);
        assert_eq!(statement.duplicate_keys().len(), 1);
        assert!(statement.get("100", "05.01.2024").is_empty());
    }

    #[test]
    fn test_post_process_leaves_batch_untouched() {
        let batch = aggregate(vec![vec![
            tx(2, "1", 1.0, Direction::Credit, SourceBank::Tbc),
            tx(1, "2", 1.0, Direction::Credit, SourceBank::Tbc),
        ]]);
        let before = batch.clone();
        let _ = post_process(&batch);
        assert_eq!(batch, before);
    }

    #[test]
    fn test_decimal_comma_format() {
        assert_eq!(decimal_comma::format(150.5), "150,5");
        assert_eq!(decimal_comma::format(1200.0), "1200");
    }

    fn arb_tx() -> impl Strategy<Value = CanonicalTransaction> {
        (1u32..4, "[A-C]", 0u32..3, any::<bool>(), any::<bool>()).prop_map(
            |(d, id, cents, credit, tbc)| {
                let direction = if credit { Direction::Credit } else { Direction::Debit };
                let bank = if tbc { SourceBank::Tbc } else { SourceBank::BankOfGeorgia };
                tx(d, &id, f64::from(cents) * 0.5, direction, bank)
            },
        )
    }

    proptest! {
        #[test]
        fn prop_post_process_independent_of_file_order(
            files in prop::collection::vec(prop::collection::vec(arb_tx(), 0..5), 1..4)
        ) {
            let forward = post_process(&aggregate(files.clone()));
            let mut reversed_files = files;
            reversed_files.reverse();
            let reversed = post_process(&aggregate(reversed_files));
            prop_assert_eq!(forward.rows(), reversed.rows());
        }
    }
}
