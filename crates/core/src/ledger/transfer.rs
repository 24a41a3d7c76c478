//! Transfer planning: two legs bound by one pairing key.
//!
//! Planning is pure. Persisting both legs in one unit of work is the
//! caller's job.

use chrono::{DateTime, Utc};
use envelope_shared::types::{AccountId, PairKey, TransactionId};
use rust_decimal::Decimal;

use super::account::{Account, AccountType};
use super::error::LedgerError;
use super::transaction::Transaction;

/// The two legs of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    /// Key shared by both legs.
    pub pair_key: PairKey,
    /// Leg on the source, carrying `-amount`.
    pub debit: Transaction,
    /// Leg on the target, carrying `+amount`.
    pub credit: Transaction,
}

impl TransferPlan {
    /// Both legs, debit first.
    #[must_use]
    pub fn legs(&self) -> [&Transaction; 2] {
        [&self.debit, &self.credit]
    }

    /// Consumes the plan into its legs, debit first.
    #[must_use]
    pub fn into_legs(self) -> [Transaction; 2] {
        [self.debit, self.credit]
    }
}

/// Plans a transfer of `amount` from one account to another.
///
/// Without `category` both accounts must share a type. With `category`
/// neither side may be a category account, and the category lands only on
/// budget-type legs.
///
/// # Errors
///
/// Returns `AccountTypeMismatch` or `CategoryAccountInTransfer` when the
/// account types do not allow the requested variant.
pub fn plan_transfer(
    from: &Account,
    to: &Account,
    amount: Decimal,
    description: &str,
    category: Option<AccountId>,
    now: DateTime<Utc>,
) -> Result<TransferPlan, LedgerError> {
    match category {
        None if from.account_type != to.account_type => {
            return Err(LedgerError::AccountTypeMismatch {
                from: from.account_type,
                to: to.account_type,
            });
        }
        Some(_)
            if from.account_type == AccountType::Category
                || to.account_type == AccountType::Category =>
        {
            return Err(LedgerError::CategoryAccountInTransfer);
        }
        _ => {}
    }

    let pair_key = PairKey::new();
    let payee = format!("Transfer: {} → {}", from.name, to.name);

    let leg = |side: &Account, amount: Decimal| {
        let (account, category) = match side.account_type {
            AccountType::Category => (None, Some(side.id)),
            AccountType::Budget => (Some(side.id), category),
            AccountType::Tracking => (Some(side.id), None),
        };
        Transaction {
            id: TransactionId::new(),
            time: now,
            payee: payee.clone(),
            description: description.to_string(),
            amount,
            account,
            category,
            cleared: false,
            reconciled: false,
            pair_key: Some(pair_key),
        }
    };

    Ok(TransferPlan {
        pair_key,
        debit: leg(from, -amount),
        credit: leg(to, amount),
    })
}
