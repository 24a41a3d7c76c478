//! Repository abstractions for data access.
//!
//! Repositories borrow any `SeaORM` connection, so the same queries run on
//! the pool or inside an open database transaction. They speak domain types
//! and hide the entity models from the rest of the application.

pub mod account;
pub mod transaction;

pub use account::AccountRepository;
pub use transaction::TransactionRepository;
