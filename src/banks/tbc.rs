// 🏦 TBC Bank - fixed-layout CSV export with a signed volume column

use crate::dispatch::BankTransformer;
use crate::error::Result;
use crate::schema::SchemaDescriptor;
use crate::table::RawTable;
use crate::transaction::{CanonicalTransaction, Direction, SourceBank};
use tracing::debug;

pub const TBC_COLUMNS: [&str; 10] = [
    "payer_account",
    "date",
    "volume",
    "currency",
    "to_account",
    "bank_code",
    "message_for_beneficiary",
    "note",
    "type",
    "id_of_transaction",
];

/// TBC exports always carry the same ten columns, so the match is exact.
pub struct TbcTransformer {
    descriptor: SchemaDescriptor,
}

impl TbcTransformer {
    pub fn new() -> Self {
        TbcTransformer {
            descriptor: SchemaDescriptor::exact(&TBC_COLUMNS),
        }
    }
}

impl Default for TbcTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl BankTransformer for TbcTransformer {
    fn source_bank(&self) -> SourceBank {
        SourceBank::Tbc
    }

    fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    fn transform(&self, table: &RawTable, currency: Option<&str>) -> Result<Vec<CanonicalTransaction>> {
        let bank = self.source_bank();
        let columns = table.columns(bank.code());
        columns.require(&["date", "volume", "id_of_transaction"])?;

        let mut transactions = Vec::with_capacity(table.len());

        for row in columns.rows() {
            let date = row.date("date")?;
            let volume = row.decimal("volume")?;
            let id = row.required_text("id_of_transaction")?;

            // explicit column wins over the caller's currency
            let row_currency = row
                .text("currency")
                .or_else(|| currency.map(str::to_string));

            let tx = CanonicalTransaction::new(date, id, volume, Direction::from_signed(volume), bank)
                .with_account(row.text("payer_account"))
                .with_counterparty(row.text("to_account"))
                .with_currency(row_currency)
                .with_comment(row.text("note"));

            transactions.push(tx);
        }

        transactions.sort_by_key(|tx| tx.date);
        debug!(rows = transactions.len(), "TBC statement transformed");

        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatementError;
    use crate::table::Cell;

    fn tbc_table(rows: &[[&str; 10]]) -> RawTable {
        let headers = [
            "Payer Account", "Date", "Volume", "Currency", "To Account", "Bank Code",
            "Message for Beneficiary", "Note", "Type", "ID of Transaction",
        ];
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| Cell::from_field(v)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_tbc_transform_signs_and_sorts() {
        let table = tbc_table(&[
            ["GE01TB", "2024-01-20", "-150.00", "GEL", "GE99BG", "BAGAGE22", "rent", "January rent", "transfer", "T-2"],
            ["GE01TB", "2024-01-05", "2000", "GEL", "", "", "", "Salary", "income", "T-1"],
        ]);

        let txs = TbcTransformer::new().transform(&table, None).unwrap();

        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].transaction_id, "T-1");
        assert_eq!(txs[0].direction, Direction::Credit);
        assert_eq!(txs[0].amount, 2000.0);
        assert_eq!(txs[0].counterparty, None);

        assert_eq!(txs[1].transaction_id, "T-2");
        assert_eq!(txs[1].direction, Direction::Debit);
        assert_eq!(txs[1].amount, 150.0);
        assert_eq!(txs[1].account.as_deref(), Some("GE01TB"));
        assert_eq!(txs[1].counterparty.as_deref(), Some("GE99BG"));
        assert_eq!(txs[1].comment.as_deref(), Some("January rent"));
        assert_eq!(txs[1].currency.as_deref(), Some("GEL"));
        assert_eq!(txs[1].bank, SourceBank::Tbc);
    }

    #[test]
    fn test_tbc_currency_column_beats_caller_currency() {
        let table = tbc_table(&[
            ["A", "2024-01-01", "5", "USD", "", "", "", "", "", "1"],
            ["A", "2024-01-02", "5", "", "", "", "", "", "", "2"],
        ]);

        let txs = TbcTransformer::new().transform(&table, Some("GEL")).unwrap();
        assert_eq!(txs[0].currency.as_deref(), Some("USD"));
        assert_eq!(txs[1].currency.as_deref(), Some("GEL"));
    }

    #[test]
    fn test_tbc_bad_volume_is_schema_mismatch() {
        let table = tbc_table(&[["A", "2024-01-01", "n/a", "GEL", "", "", "", "", "", "1"]]);

        let err = TbcTransformer::new().transform(&table, None).unwrap_err();
        match err {
            StatementError::SchemaMismatch { bank, column, row, .. } => {
                assert_eq!(bank, "TBC");
                assert_eq!(column, "volume");
                assert_eq!(row, 1);
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_tbc_missing_column_is_schema_mismatch() {
        let table = RawTable::new(vec!["Date".to_string(), "Volume".to_string()], vec![]);
        let err = TbcTransformer::new().transform(&table, None).unwrap_err();
        assert!(matches!(err, StatementError::SchemaMismatch { ref column, .. } if column == "id_of_transaction"));
    }

    #[test]
    fn test_tbc_amounts_never_negative() {
        let table = tbc_table(&[
            ["A", "2024-01-01", "-0.01", "GEL", "", "", "", "", "", "1"],
            ["A", "2024-01-01", "0", "GEL", "", "", "", "", "", "2"],
            ["A", "2024-01-01", "99.99", "GEL", "", "", "", "", "", "3"],
        ]);

        let txs = TbcTransformer::new().transform(&table, None).unwrap();
        let signed: Vec<f64> = txs.iter().map(|t| t.signed_amount()).collect();

        assert!(txs.iter().all(|t| t.amount >= 0.0));
        assert_eq!(signed, vec![-0.01, 0.0, 99.99]);
    }
}
