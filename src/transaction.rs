// 💳 Canonical Transaction - the one schema every bank is mapped into

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ============================================================================
// SOURCE BANK
// ============================================================================

/// Which transformer produced a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceBank {
    #[serde(rename = "BOG")]
    BankOfGeorgia,
    #[serde(rename = "TBC")]
    Tbc,
}

impl SourceBank {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            SourceBank::BankOfGeorgia => "Bank of Georgia",
            SourceBank::Tbc => "TBC Bank",
        }
    }

    /// Tag written to the `bank` output column
    pub fn code(&self) -> &'static str {
        match self {
            SourceBank::BankOfGeorgia => "BOG",
            SourceBank::Tbc => "TBC",
        }
    }
}

// ============================================================================
// DIRECTION
// ============================================================================

/// Money in or out. The sign of a source amount lives only here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "Приход")]
    Credit,
    #[serde(rename = "Расход")]
    Debit,
}

impl Direction {
    pub fn from_signed(amount: f64) -> Self {
        if amount > 0.0 {
            Direction::Credit
        } else {
            Direction::Debit
        }
    }

    /// Localized label used in the output statements
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Credit => "Приход",
            Direction::Debit => "Расход",
        }
    }

    /// Credit rows sort ahead of debit rows.
    pub(crate) fn sort_rank(&self) -> u8 {
        match self {
            Direction::Credit => 0,
            Direction::Debit => 1,
        }
    }

    /// Re-apply the sign to a magnitude.
    pub fn signed(&self, amount: f64) -> f64 {
        match self {
            Direction::Credit => amount,
            Direction::Debit => -amount,
        }
    }
}

// ============================================================================
// CANONICAL TRANSACTION
// ============================================================================

/// One statement row after bank-specific normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTransaction {
    /// Account the statement belongs to (payer side)
    pub account: Option<String>,
    /// Recipient / counterparty account or name
    pub counterparty: Option<String>,
    pub date: NaiveDateTime,
    /// Unsigned magnitude
    pub amount: f64,
    pub direction: Direction,
    pub currency: Option<String>,
    pub comment: Option<String>,
    pub transaction_id: String,
    pub bank: SourceBank,
}

impl CanonicalTransaction {
    /// Create a row from a signed amount; the sign goes into `direction`.
    pub fn new(
        date: NaiveDateTime,
        transaction_id: String,
        amount: f64,
        direction: Direction,
        bank: SourceBank,
    ) -> Self {
        CanonicalTransaction {
            account: None,
            counterparty: None,
            date,
            amount: amount.abs(),
            direction,
            currency: None,
            comment: None,
            transaction_id,
            bank,
        }
    }

    /// Builder pattern: add source account
    pub fn with_account(mut self, account: Option<String>) -> Self {
        self.account = account;
        self
    }

    /// Builder pattern: add counterparty
    pub fn with_counterparty(mut self, counterparty: Option<String>) -> Self {
        self.counterparty = counterparty;
        self
    }

    pub fn with_currency(mut self, currency: Option<String>) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    /// Original signed amount.
    pub fn signed_amount(&self) -> f64 {
        self.direction.signed(self.amount)
    }
}
