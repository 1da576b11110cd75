// 🏦 Bank of Georgia - spreadsheet export with split debit/credit columns
//
// The workbook starts with a metadata preamble and carries the account
// currency in a metadata cell, not in a column.

use crate::dispatch::BankTransformer;
use crate::error::{Result, StatementError};
use crate::schema::SchemaDescriptor;
use crate::table::{RawTable, RowView};
use crate::transaction::{CanonicalTransaction, Direction, SourceBank};
use tracing::debug;

pub const BOG_COLUMNS: [&str; 9] = [
    "date",
    "doc_n",
    "debit",
    "credit",
    "recipient_name",
    "amount",
    "entry_comment",
    "nomination",
    "sender_account_n",
];

const HEADER_MARKERS: &[&str] = &["Date", "Doc N", "Loro Account"];
const FOREIGN_EXCHANGE_MARKER: &str = "Foreign Exchange";
const CONVERSION_NOISE: &str = "Conversion";

/// Column count varies between export versions, so extra columns are fine.
pub struct BogTransformer {
    descriptor: SchemaDescriptor,
}

impl BogTransformer {
    pub fn new() -> Self {
        BogTransformer {
            descriptor: SchemaDescriptor::subset(&BOG_COLUMNS),
        }
    }

    /// Magnitude comes from credit, falling back to debit.
    /// Returns the magnitude and the credit value it was read from, if any.
    fn volume(row: &RowView<'_>, bank: &'static str) -> Result<(f64, Option<f64>)> {
        let credit = row.optional_decimal("credit")?;
        let debit = row.optional_decimal("debit")?;

        let volume = credit.or(debit).ok_or_else(|| {
            StatementError::mismatch(bank, "credit", row.number(), "neither debit nor credit is set")
        })?;

        Ok((volume, credit))
    }

    /// Sign of the signed `amount` column when it is numeric, otherwise
    /// whichever of credit/debit is populated.
    fn direction(signed: Option<f64>, credit: Option<f64>) -> Direction {
        match signed {
            Some(amount) if amount < 0.0 => Direction::Debit,
            Some(_) => Direction::Credit,
            None if credit.is_some() => Direction::Credit,
            None => Direction::Debit,
        }
    }

    fn comment(row: &RowView<'_>) -> Option<String> {
        row.text("entry_comment").or_else(|| {
            row.text("nomination")
                .map(|n| n.replace(CONVERSION_NOISE, "").trim().to_string())
                .filter(|n| !n.is_empty())
        })
    }
}

impl Default for BogTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl BankTransformer for BogTransformer {
    fn source_bank(&self) -> SourceBank {
        SourceBank::BankOfGeorgia
    }

    fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    fn header_markers(&self) -> Option<&'static [&'static str]> {
        Some(HEADER_MARKERS)
    }

    fn transform(&self, table: &RawTable, currency: Option<&str>) -> Result<Vec<CanonicalTransaction>> {
        let bank = self.source_bank();
        let columns = table.columns(bank.code());
        columns.require(&["date", "doc_n", "debit", "credit"])?;

        let mut transactions = Vec::with_capacity(table.len());
        let mut foreign_exchange = 0usize;

        for row in columns.rows() {
            let date = row.date("date")?;
            let doc_n = row.required_text("doc_n")?;
            let (volume, credit) = Self::volume(&row, bank.code())?;

            // a non-numeric signed amount falls back to the debit/credit split
            let signed = row.optional_decimal("amount").ok().flatten();
            let direction = Self::direction(signed, credit);

            if row
                .text("entry_comment")
                .is_some_and(|c| c.contains(FOREIGN_EXCHANGE_MARKER))
            {
                foreign_exchange += 1;
            }

            let row_currency = row
                .text("currency")
                .or_else(|| currency.map(str::to_string));

            let tx = CanonicalTransaction::new(date, doc_n, volume, direction, bank)
                .with_counterparty(row.text("recipient_name"))
                .with_currency(row_currency)
                .with_comment(Self::comment(&row));

            transactions.push(tx);
        }

        transactions.sort_by_key(|tx| tx.date);
        debug!(
            rows = transactions.len(),
            foreign_exchange, "BOG statement transformed"
        );

        Ok(transactions)
    }
}
