//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur during ledger operations,
//! including rule violations, account/transfer errors, missing records
//! and storage failures.

use envelope_shared::types::{AccountId, TransactionId};
use envelope_shared::AppError;
use thiserror::Error;

use super::account::AccountType;
use super::validation::Violations;
use crate::retry::Failure;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// One or more transaction rules were violated.
    #[error("Invalid transaction: {0}")]
    Validation(Violations),

    /// Caller supplied an identity on create.
    #[error("Transaction id must be unset on create")]
    IdentityAssigned,

    /// Account name is empty.
    #[error("Account name must not be empty")]
    EmptyAccountName,

    /// Account type is not one of budget, category or tracking.
    #[error("Invalid account type: {0}")]
    InvalidAccountType(String),

    // ========== Transfer Errors ==========
    /// Category-less transfer between accounts of different types.
    #[error("Account type mismatch: {from} != {to}")]
    AccountTypeMismatch {
        /// Type of the source account.
        from: AccountType,
        /// Type of the target account.
        to: AccountType,
    },

    /// Category-carrying transfer with a category-type participant.
    #[error("Transfer contained category-type account")]
    CategoryAccountInTransfer,

    // ========== Not Found Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    // ========== Storage Errors ==========
    /// Storage layer failure (contention, I/O, driver errors).
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::IdentityAssigned => "IDENTITY_ASSIGNED",
            Self::EmptyAccountName => "EMPTY_ACCOUNT_NAME",
            Self::InvalidAccountType(_) => "INVALID_ACCOUNT_TYPE",
            Self::AccountTypeMismatch { .. } => "ACCOUNT_TYPE_MISMATCH",
            Self::CategoryAccountInTransfer => "CATEGORY_ACCOUNT_IN_TRANSFER",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - rejected before any mutation
            Self::Validation(_)
            | Self::IdentityAssigned
            | Self::EmptyAccountName
            | Self::InvalidAccountType(_)
            | Self::AccountTypeMismatch { .. }
            | Self::CategoryAccountInTransfer => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::TransactionNotFound(_) => 404,

            // 500 Internal Server Error
            Self::Storage(_) => 500,
        }
    }

    /// Returns true for a missing account or transaction.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::AccountNotFound(_) | Self::TransactionNotFound(_))
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Tags the error for the retry loop. Only storage failures are transient.
    #[must_use]
    pub fn classify(self) -> Failure<Self> {
        if self.is_retryable() {
            Failure::Transient(self)
        } else {
            Failure::Permanent(self)
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::Validation(_) => Self::Validation(message),
            LedgerError::IdentityAssigned
            | LedgerError::EmptyAccountName
            | LedgerError::InvalidAccountType(_)
            | LedgerError::AccountTypeMismatch { .. }
            | LedgerError::CategoryAccountInTransfer => Self::BadRequest(message),
            LedgerError::AccountNotFound(_) | LedgerError::TransactionNotFound(_) => {
                Self::NotFound(message)
            }
            LedgerError::Storage(_) => Self::Database(message),
        }
    }
}
