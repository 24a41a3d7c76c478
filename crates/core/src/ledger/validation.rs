//! Business rule validation for transactions.
//!
//! All soft rules are evaluated and reported together. A reference that
//! cannot be resolved aborts validation immediately.

use std::fmt;

use envelope_shared::types::AccountId;

use super::account::{Account, AccountType};
use super::error::LedgerError;
use super::transaction::{Transaction, zero_time};

/// A single broken transaction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Violation {
    /// `time` is the zero value.
    ZeroTime,
    /// Neither `account` nor `category` is set.
    MissingAccountAndCategory,
    /// `amount` is zero.
    ZeroAmount,
    /// Unpaired budget-account transaction without a category.
    UncategorizedBudgetTransaction,
    /// Tracking-account transaction carrying a category.
    CategorizedTrackingTransaction,
    /// `category` references an account that is not of type category.
    CategoryNotCategoryType,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ZeroTime => "time is zero",
            Self::MissingAccountAndCategory => "account and category are null",
            Self::ZeroAmount => "amount is zero",
            Self::UncategorizedBudgetTransaction => "budget account transactions need a category",
            Self::CategorizedTrackingTransaction => {
                "tracking account transactions must not have a category"
            }
            Self::CategoryNotCategoryType => "category is not of type category",
        })
    }
}

/// Every rule a transaction broke, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// True when no rule was broken.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the given rule was broken.
    #[must_use]
    pub fn contains(&self, violation: Violation) -> bool {
        self.0.contains(&violation)
    }

    /// The broken rules.
    #[must_use]
    pub fn as_slice(&self) -> &[Violation] {
        &self.0
    }

    fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }
}

impl From<Vec<Violation>> for Violations {
    fn from(v: Vec<Violation>) -> Self {
        Self(v)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Validates a transaction against the ledger rules.
///
/// `account_lookup` resolves the referenced accounts. It is called at most
/// once for `account` and once for `category`.
///
/// # Errors
///
/// Returns the lookup error as-is when a reference cannot be resolved, or
/// `LedgerError::Validation` carrying every violated rule.
pub fn validate_transaction<L>(tx: &Transaction, account_lookup: L) -> Result<(), LedgerError>
where
    L: Fn(AccountId) -> Result<Account, LedgerError>,
{
    let mut violations = Violations::default();

    if tx.time == zero_time() {
        violations.push(Violation::ZeroTime);
    }

    if tx.account.is_none() && tx.category.is_none() {
        violations.push(Violation::MissingAccountAndCategory);
    }

    if tx.amount.is_zero() {
        violations.push(Violation::ZeroAmount);
    }

    let account = tx.account.map(&account_lookup).transpose()?;
    let category = tx.category.map(&account_lookup).transpose()?;

    match account.map(|a| a.account_type) {
        Some(AccountType::Budget) if category.is_none() && !tx.is_paired() => {
            violations.push(Violation::UncategorizedBudgetTransaction);
        }
        Some(AccountType::Tracking) if category.is_some() => {
            violations.push(Violation::CategorizedTrackingTransaction);
        }
        _ => {}
    }

    if category.is_some_and(|c| c.account_type != AccountType::Category) {
        violations.push(Violation::CategoryNotCategoryType);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::Validation(violations))
    }
}
