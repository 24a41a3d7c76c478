//! Database layer for the envelope ledger.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Database migrations and default account seeding
//! - Connection-generic repositories
//! - [`LedgerClient`], the retry-guarded operation set

pub mod client;
pub mod entities;
pub mod migration;
pub mod repositories;
pub mod seed;

pub use client::{LedgerClient, connect};
pub use repositories::{AccountRepository, TransactionRepository};
