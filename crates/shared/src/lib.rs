//! Shared types, errors, and configuration for the envelope ledger.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for accounts, transactions and transfer pairs
//! - Cent rounding for decimal amounts
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
