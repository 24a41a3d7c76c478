//! Transactions and the inputs that create or overwrite them.

use chrono::{DateTime, Utc};
use envelope_shared::types::{AccountId, PairKey, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// The zero timestamp. An omitted `time` decodes to this and fails validation.
#[must_use]
pub fn zero_time() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// A movement of money from, to or between accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Identity, assigned at creation.
    pub id: TransactionId,
    /// Booking time.
    pub time: DateTime<Utc>,
    /// Free text.
    pub payee: String,
    /// Free text.
    pub description: String,
    /// Signed amount, never zero.
    pub amount: Decimal,
    /// Budget or tracking account, immutable once set.
    pub account: Option<AccountId>,
    /// Category account.
    pub category: Option<AccountId>,
    /// Seen on a statement.
    pub cleared: bool,
    /// Cleared and matched against a statement.
    pub reconciled: bool,
    /// Shared by the two legs of one transfer.
    pub pair_key: Option<PairKey>,
}

impl Transaction {
    /// True for one leg of a transfer.
    #[must_use]
    pub const fn is_paired(&self) -> bool {
        self.pair_key.is_some()
    }

    /// True when the transaction references the id as account or category.
    #[must_use]
    pub fn references(&self, id: AccountId) -> bool {
        self.account == Some(id) || self.category == Some(id)
    }
}

/// Create input. Identity is assigned by the ledger, never by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionDraft {
    /// Must be absent (or nil) on create.
    pub id: Option<TransactionId>,
    /// Booking time.
    pub time: DateTime<Utc>,
    /// Free text.
    pub payee: String,
    /// Free text.
    pub description: String,
    /// Signed amount.
    pub amount: Decimal,
    /// Budget or tracking account.
    pub account: Option<AccountId>,
    /// Category account.
    pub category: Option<AccountId>,
    /// Seen on a statement.
    pub cleared: bool,
}

impl TransactionDraft {
    /// Assigns a fresh identity and produces an unpaired, unreconciled transaction.
    ///
    /// # Errors
    ///
    /// Returns `IdentityAssigned` when the draft already carries a non-nil id.
    pub fn into_transaction(self) -> Result<Transaction, LedgerError> {
        if self.id.is_some_and(|id| !id.into_inner().is_nil()) {
            return Err(LedgerError::IdentityAssigned);
        }

        Ok(Transaction {
            id: TransactionId::new(),
            time: self.time,
            payee: self.payee,
            description: self.description,
            amount: self.amount,
            account: self.account,
            category: self.category,
            cleared: self.cleared,
            reconciled: false,
            pair_key: None,
        })
    }
}

/// Full overwrite input.
///
/// `account` is accepted so a stored record can be sent back as-is, but it
/// never replaces the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionUpdate {
    /// Booking time.
    pub time: DateTime<Utc>,
    /// Free text.
    pub payee: String,
    /// Free text.
    pub description: String,
    /// Signed amount.
    pub amount: Decimal,
    /// Ignored.
    pub account: Option<AccountId>,
    /// Category account.
    pub category: Option<AccountId>,
    /// Seen on a statement.
    pub cleared: bool,
    /// Matched against a statement.
    pub reconciled: bool,
}

impl From<Transaction> for TransactionUpdate {
    fn from(tx: Transaction) -> Self {
        Self {
            time: tx.time,
            payee: tx.payee,
            description: tx.description,
            amount: tx.amount,
            account: tx.account,
            category: tx.category,
            cleared: tx.cleared,
            reconciled: tx.reconciled,
        }
    }
}

/// Optional inclusive time bounds for transaction listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    /// Earliest time, inclusive.
    pub since: Option<DateTime<Utc>>,
    /// Latest time, inclusive.
    pub until: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Unbounded window.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            since: None,
            until: None,
        }
    }

    /// Window with both bounds optional.
    #[must_use]
    pub const fn new(since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        Self { since, until }
    }

    /// True when `time` falls inside both bounds.
    #[must_use]
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.since.is_none_or(|since| time >= since) && self.until.is_none_or(|until| time <= until)
    }
}
