//! Seed accounts that every ledger starts with.

use envelope_core::ledger::default_accounts;
use sea_orm::{ConnectionTrait, DbErr};
use tracing::info;

use crate::repositories::AccountRepository;

/// Inserts the default accounts that are not present yet.
///
/// Existing rows are left untouched, so renames and hidden flags survive a
/// restart. Returns the number of accounts inserted.
///
/// # Errors
///
/// Returns an error if a database query fails.
pub async fn ensure_default_accounts<C: ConnectionTrait>(db: &C) -> Result<usize, DbErr> {
    let repo = AccountRepository::new(db);
    let mut inserted = 0;

    for account in default_accounts() {
        if repo.find_by_id(account.id).await?.is_none() {
            repo.insert(&account).await?;
            info!(account_id = %account.id, name = %account.name, "Seeded default account");
            inserted += 1;
        }
    }

    Ok(inserted)
}
