//! Core ledger logic for the envelope ledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Accounts, transactions, validation, transfers and balances
//! - `retry` - Bounded retry with permanent/transient failure classification

pub mod ledger;
pub mod retry;
