//! Ledger client: the operation set over persistent storage.
//!
//! Every operation runs through the [`Retrier`]. Reads use the pooled
//! connection. Writes run as one database transaction per attempt, so a
//! retried attempt replays the whole unit and a failed one rolls back.

use std::time::Duration;

use chrono::Utc;
use envelope_core::ledger::{
    Account, AccountBalance, AccountType, LedgerError, NewAccount, TimeWindow, Transaction,
    TransactionDraft, TransactionUpdate, TransferPlan, UNALLOCATED_MONEY, aggregate_balances,
    apply_category, apply_overwrite, plan_transfer, sibling_amount, validate_account_name,
    validate_transaction,
};
use envelope_core::retry::{Failure, Retrier, RetryPolicy, RetrySnapshot};
use envelope_shared::config::DatabaseConfig;
use envelope_shared::types::{AccountId, TransactionId};
use futures::future::BoxFuture;
use rust_decimal::Decimal;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbErr,
    TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::migration::Migrator;
use crate::repositories::{AccountRepository, TransactionRepository};
use crate::seed::ensure_default_accounts;

/// Lifetime of pooled connections to an in-memory database. Dropping the
/// last connection drops the data, so it is kept for as long as possible.
const IN_MEMORY_CONNECTION_LIFETIME: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Description booked on starting-balance transactions.
const STARTING_BALANCE_DESCRIPTION: &str = "Starting Balance";

/// Maps a driver error into the ledger's transient storage error.
fn storage_error(err: DbErr) -> LedgerError {
    LedgerError::Storage(err.to_string())
}

/// Opens a connection pool sized from `config`.
///
/// In-memory `SQLite` gets exactly one long-lived connection, since every
/// connection would otherwise see its own empty database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options.sqlx_logging(false);

    if config.is_in_memory() {
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(IN_MEMORY_CONNECTION_LIFETIME)
            .max_lifetime(IN_MEMORY_CONNECTION_LIFETIME);
    } else {
        options
            .max_connections(config.max_connections)
            .min_connections(config.min_connections);
    }

    Database::connect(options).await
}

/// Resolves the accounts `tx` references through `db` and runs the rules.
async fn validate_in<C: ConnectionTrait>(db: &C, tx: &Transaction) -> Result<(), LedgerError> {
    let ids: Vec<AccountId> = [tx.account, tx.category].into_iter().flatten().collect();
    let accounts = AccountRepository::new(db)
        .find_many(&ids)
        .await
        .map_err(storage_error)?;

    validate_transaction(tx, |id| {
        accounts
            .get(&id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(id))
    })
}

/// Validates and inserts one transaction.
async fn insert_validated<C: ConnectionTrait>(db: &C, tx: &Transaction) -> Result<(), LedgerError> {
    validate_in(db, tx).await?;
    TransactionRepository::new(db)
        .insert(tx)
        .await
        .map_err(storage_error)
}

/// Loads a live account or fails with not-found.
async fn load_account<C: ConnectionTrait>(db: &C, id: AccountId) -> Result<Account, LedgerError> {
    AccountRepository::new(db)
        .find_by_id(id)
        .await
        .map_err(storage_error)?
        .ok_or(LedgerError::AccountNotFound(id))
}

/// Loads a live transaction or fails with not-found.
async fn load_transaction<C: ConnectionTrait>(
    db: &C,
    id: TransactionId,
) -> Result<Transaction, LedgerError> {
    TransactionRepository::new(db)
        .find_by_id(id)
        .await
        .map_err(storage_error)?
        .ok_or(LedgerError::TransactionNotFound(id))
}

/// Plans a transfer between two stored accounts and books both legs.
async fn book_transfer<C: ConnectionTrait>(
    db: &C,
    from: AccountId,
    to: AccountId,
    amount: Decimal,
    description: &str,
    category: Option<AccountId>,
) -> Result<TransferPlan, LedgerError> {
    let from = load_account(db, from).await?;
    let to = load_account(db, to).await?;
    let plan = plan_transfer(&from, &to, amount, description, category, Utc::now())?;

    for leg in plan.legs() {
        insert_validated(db, leg).await?;
    }

    Ok(plan)
}

/// Entry point to the envelope ledger.
///
/// Cheap to clone. Clones share the connection pool and retry metrics.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    db: DatabaseConnection,
    retrier: Retrier,
}

impl LedgerClient {
    /// Wraps an existing connection. Call [`Self::init`] before first use
    /// unless the schema and seed accounts are already in place.
    #[must_use]
    pub fn new(db: DatabaseConnection, policy: RetryPolicy) -> Self {
        Self {
            db,
            retrier: Retrier::new(policy),
        }
    }

    /// Connects, migrates and seeds the default accounts.
    ///
    /// # Errors
    ///
    /// Returns a storage error if any step fails.
    pub async fn connect(config: &DatabaseConfig, policy: RetryPolicy) -> Result<Self, LedgerError> {
        let db = connect(config).await.map_err(storage_error)?;
        let client = Self::new(db, policy);
        client.init().await?;
        Ok(client)
    }

    /// Applies pending migrations and inserts missing default accounts.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a migration or the seed fails.
    pub async fn init(&self) -> Result<(), LedgerError> {
        Migrator::up(&self.db, None).await.map_err(storage_error)?;
        let seeded = ensure_default_accounts(&self.db)
            .await
            .map_err(storage_error)?;
        info!(seeded, "Ledger storage ready");
        Ok(())
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Retry counters shared by all clones of this client.
    #[must_use]
    pub fn retry_metrics(&self) -> RetrySnapshot {
        self.retrier.metrics().snapshot()
    }

    /// Runs a read on the pool under the retry policy.
    async fn retry_read<T, F>(&self, op: F) -> Result<T, LedgerError>
    where
        F: for<'c> Fn(&'c DatabaseConnection) -> BoxFuture<'c, Result<T, LedgerError>>
            + Send
            + Sync,
        T: Send,
    {
        let op = &op;
        let db = &self.db;
        self.retrier
            .run(move || async move { op(db).await.map_err(LedgerError::classify) })
            .await
    }

    /// Runs `op` inside one database transaction per attempt.
    ///
    /// The transaction commits only when `op` succeeds. Any error drops it,
    /// which rolls every write of the attempt back.
    async fn retry_tx<T, F>(&self, op: F) -> Result<T, LedgerError>
    where
        F: for<'c> Fn(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, LedgerError>>
            + Send
            + Sync,
        T: Send,
    {
        let op = &op;
        let db = &self.db;
        self.retrier
            .run(move || async move {
                let txn = db
                    .begin()
                    .await
                    .map_err(|e| storage_error(e).classify())?;
                let value = op(&txn).await.map_err(LedgerError::classify)?;
                txn.commit()
                    .await
                    .map_err(|e| storage_error(e).classify())?;
                Ok::<_, Failure<LedgerError>>(value)
            })
            .await
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Creates an account of the named type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountType` for an unknown type, `EmptyAccountName`
    /// for a blank name, or a storage error.
    pub async fn create_account(
        &self,
        name: &str,
        account_type: &str,
    ) -> Result<Account, LedgerError> {
        let account = Account::new(name, account_type.parse::<AccountType>()?)?;

        self.retry_tx(move |txn| {
            let account = account.clone();
            Box::pin(async move {
                AccountRepository::new(txn)
                    .insert(&account)
                    .await
                    .map_err(storage_error)?;
                Ok(account)
            })
        })
        .await
        .inspect(|account| {
            info!(
                account_id = %account.id,
                account_type = %account.account_type,
                "Account created"
            );
        })
    }

    /// Creates an account and books its starting balance in the same unit.
    ///
    /// Budget accounts receive one cleared transaction categorized to
    /// Unallocated Money. Tracking accounts receive one cleared transaction
    /// without a category. Category accounts are funded by a transfer from
    /// Unallocated Money.
    ///
    /// # Errors
    ///
    /// Returns `EmptyAccountName`, a validation error from the opening
    /// transaction, or a storage error.
    pub async fn open_account(&self, new: NewAccount) -> Result<Account, LedgerError> {
        let account = Account::new(new.name, new.account_type)?;
        let starting_balance = new.starting_balance;

        let account = self
            .retry_tx(move |txn| {
                let account = account.clone();
                Box::pin(async move {
                    AccountRepository::new(txn)
                        .insert(&account)
                        .await
                        .map_err(storage_error)?;

                    if starting_balance.is_zero() {
                        return Ok(account);
                    }

                    if account.account_type == AccountType::Category {
                        book_transfer(
                            txn,
                            UNALLOCATED_MONEY,
                            account.id,
                            starting_balance,
                            STARTING_BALANCE_DESCRIPTION,
                            None,
                        )
                        .await?;
                    } else {
                        let category = (account.account_type == AccountType::Budget)
                            .then_some(UNALLOCATED_MONEY);
                        let opening = TransactionDraft {
                            time: Utc::now(),
                            description: STARTING_BALANCE_DESCRIPTION.to_string(),
                            amount: starting_balance,
                            account: Some(account.id),
                            category,
                            cleared: true,
                            ..TransactionDraft::default()
                        }
                        .into_transaction()?;
                        insert_validated(txn, &opening).await?;
                    }

                    Ok(account)
                })
            })
            .await?;

        info!(
            account_id = %account.id,
            account_type = %account.account_type,
            starting_balance = %starting_balance,
            "Account opened"
        );
        Ok(account)
    }

    /// Fetches an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` without retrying, or a storage error.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        debug!(account_id = %id, "Fetching account");
        self.retry_read(move |db| Box::pin(load_account(db, id)))
            .await
    }

    /// Lists accounts ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_accounts(&self, include_hidden: bool) -> Result<Vec<Account>, LedgerError> {
        self.list_accounts_filtered(None, include_hidden).await
    }

    /// Lists accounts of one type ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_accounts_by_type(
        &self,
        account_type: AccountType,
        include_hidden: bool,
    ) -> Result<Vec<Account>, LedgerError> {
        self.list_accounts_filtered(Some(account_type), include_hidden)
            .await
    }

    async fn list_accounts_filtered(
        &self,
        account_type: Option<AccountType>,
        include_hidden: bool,
    ) -> Result<Vec<Account>, LedgerError> {
        let accounts = self
            .retry_read(move |db| {
                Box::pin(async move {
                    AccountRepository::new(db)
                        .list(account_type, include_hidden)
                        .await
                        .map_err(storage_error)
                })
            })
            .await?;

        debug!(count = accounts.len(), include_hidden, "Listed accounts");
        Ok(accounts)
    }

    /// Lists accounts with their rounded balances.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_account_balances(
        &self,
        include_hidden: bool,
    ) -> Result<Vec<AccountBalance>, LedgerError> {
        let (accounts, lines) = self
            .retry_read(move |db| {
                Box::pin(async move {
                    let accounts = AccountRepository::new(db)
                        .list(None, include_hidden)
                        .await
                        .map_err(storage_error)?;
                    let lines = TransactionRepository::new(db)
                        .balance_lines()
                        .await
                        .map_err(storage_error)?;
                    Ok((accounts, lines))
                })
            })
            .await?;

        debug!(
            accounts = accounts.len(),
            transactions = lines.len(),
            "Aggregating balances"
        );
        Ok(aggregate_balances(accounts, &lines))
    }

    /// Renames an account.
    ///
    /// # Errors
    ///
    /// Returns `EmptyAccountName`, `AccountNotFound`, or a storage error.
    pub async fn update_account_name(&self, id: AccountId, name: &str) -> Result<(), LedgerError> {
        validate_account_name(name)?;
        let name = name.to_string();

        self.retry_tx(move |txn| {
            let name = name.clone();
            Box::pin(async move {
                let rows = AccountRepository::new(txn)
                    .set_name(id, &name)
                    .await
                    .map_err(storage_error)?;
                if rows == 0 {
                    return Err(LedgerError::AccountNotFound(id));
                }
                Ok(())
            })
        })
        .await?;

        info!(account_id = %id, "Account renamed");
        Ok(())
    }

    /// Shows or hides an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or a storage error.
    pub async fn update_account_hidden(
        &self,
        id: AccountId,
        hidden: bool,
    ) -> Result<(), LedgerError> {
        self.retry_tx(move |txn| {
            Box::pin(async move {
                let rows = AccountRepository::new(txn)
                    .set_hidden(id, hidden)
                    .await
                    .map_err(storage_error)?;
                if rows == 0 {
                    return Err(LedgerError::AccountNotFound(id));
                }
                Ok(())
            })
        })
        .await?;

        info!(account_id = %id, hidden, "Account visibility changed");
        Ok(())
    }

    /// Marks every cleared transaction of an account as reconciled.
    ///
    /// Balances are not checked. Returns the number of transactions touched.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn mark_account_reconciled(&self, id: AccountId) -> Result<u64, LedgerError> {
        let rows = self
            .retry_tx(move |txn| {
                Box::pin(async move {
                    TransactionRepository::new(txn)
                        .mark_reconciled(id)
                        .await
                        .map_err(storage_error)
                })
            })
            .await?;

        info!(account_id = %id, transactions = rows, "Account reconciled");
        Ok(rows)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Validates and stores a new transaction.
    ///
    /// # Errors
    ///
    /// Returns `IdentityAssigned`, a validation error, `AccountNotFound` for
    /// a dangling reference, or a storage error.
    pub async fn create_transaction(
        &self,
        draft: TransactionDraft,
    ) -> Result<Transaction, LedgerError> {
        let tx = draft.into_transaction()?;

        let tx = self
            .retry_tx(move |txn| {
                let tx = tx.clone();
                Box::pin(async move {
                    insert_validated(txn, &tx).await?;
                    Ok(tx)
                })
            })
            .await?;

        info!(transaction_id = %tx.id, amount = %tx.amount, "Transaction created");
        Ok(tx)
    }

    /// Fetches a transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` without retrying, or a storage error.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        debug!(transaction_id = %id, "Fetching transaction");
        self.retry_read(move |db| Box::pin(load_transaction(db, id)))
            .await
    }

    /// Lists transactions inside `window`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_transactions(
        &self,
        window: TimeWindow,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.list_transactions_filtered(window, None).await
    }

    /// Lists transactions that reference `id` as account or category.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_transactions_by_account(
        &self,
        id: AccountId,
        window: TimeWindow,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.list_transactions_filtered(window, Some(id)).await
    }

    async fn list_transactions_filtered(
        &self,
        window: TimeWindow,
        account: Option<AccountId>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let transactions = self
            .retry_read(move |db| {
                Box::pin(async move {
                    TransactionRepository::new(db)
                        .list(&window, account)
                        .await
                        .map_err(storage_error)
                })
            })
            .await?;

        debug!(count = transactions.len(), "Listed transactions");
        Ok(transactions)
    }

    /// Overwrites a transaction.
    ///
    /// `account` and the pairing key keep their stored values. When the
    /// amount of a transfer leg changes, its sibling moves to the negated
    /// amount in the same unit.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound`, a validation error, or a storage error.
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> Result<Transaction, LedgerError> {
        let updated = self
            .retry_tx(move |txn| {
                let update = update.clone();
                Box::pin(async move {
                    let stored = load_transaction(txn, id).await?;
                    let updated = apply_overwrite(&stored, update);
                    validate_in(txn, &updated).await?;

                    let repo = TransactionRepository::new(txn);
                    repo.save(&updated).await.map_err(storage_error)?;

                    if let (Some(pair_key), Some(amount)) =
                        (stored.pair_key, sibling_amount(&stored, &updated))
                    {
                        repo.set_sibling_amount(pair_key, id, amount)
                            .await
                            .map_err(storage_error)?;
                    }

                    Ok(updated)
                })
            })
            .await?;

        info!(transaction_id = %id, amount = %updated.amount, "Transaction updated");
        Ok(updated)
    }

    /// Sets the category of a transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound`, a validation error, or a storage error.
    pub async fn update_transaction_category(
        &self,
        id: TransactionId,
        category: AccountId,
    ) -> Result<Transaction, LedgerError> {
        let updated = self
            .retry_tx(move |txn| {
                Box::pin(async move {
                    let stored = load_transaction(txn, id).await?;
                    let updated = apply_category(&stored, category);
                    validate_in(txn, &updated).await?;
                    TransactionRepository::new(txn)
                        .save(&updated)
                        .await
                        .map_err(storage_error)?;
                    Ok(updated)
                })
            })
            .await?;

        info!(transaction_id = %id, category = %category, "Transaction categorized");
        Ok(updated)
    }

    /// Sets the cleared flag of a transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` or a storage error.
    pub async fn update_transaction_cleared(
        &self,
        id: TransactionId,
        cleared: bool,
    ) -> Result<(), LedgerError> {
        self.retry_tx(move |txn| {
            Box::pin(async move {
                let rows = TransactionRepository::new(txn)
                    .set_cleared(id, cleared)
                    .await
                    .map_err(storage_error)?;
                if rows == 0 {
                    return Err(LedgerError::TransactionNotFound(id));
                }
                Ok(())
            })
        })
        .await?;

        info!(transaction_id = %id, cleared, "Transaction cleared flag changed");
        Ok(())
    }

    /// Deletes a transaction. A transfer leg takes its sibling with it.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` or a storage error.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<(), LedgerError> {
        let rows = self
            .retry_tx(move |txn| {
                Box::pin(async move {
                    let stored = load_transaction(txn, id).await?;
                    let repo = TransactionRepository::new(txn);
                    let rows = match stored.pair_key {
                        Some(pair_key) => repo.soft_delete_pair(pair_key).await,
                        None => repo.soft_delete(id).await,
                    };
                    rows.map_err(storage_error)
                })
            })
            .await?;

        info!(transaction_id = %id, rows, "Transaction deleted");
        Ok(())
    }

    // ========================================================================
    // Transfers
    // ========================================================================

    /// Moves `amount` between two accounts of the same type.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `AccountTypeMismatch`, a validation error,
    /// or a storage error.
    pub async fn transfer_money(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        description: &str,
    ) -> Result<TransferPlan, LedgerError> {
        self.transfer(from, to, amount, description, None).await
    }

    /// Moves `amount` between two non-category accounts, categorizing the
    /// budget-side legs with `category`.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `CategoryAccountInTransfer`, a validation
    /// error, or a storage error.
    pub async fn transfer_money_with_category(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        description: &str,
        category: AccountId,
    ) -> Result<TransferPlan, LedgerError> {
        self.transfer(from, to, amount, description, Some(category))
            .await
    }

    async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        description: &str,
        category: Option<AccountId>,
    ) -> Result<TransferPlan, LedgerError> {
        let description = description.to_string();

        let plan = self
            .retry_tx(move |txn| {
                let description = description.clone();
                Box::pin(async move {
                    book_transfer(txn, from, to, amount, &description, category).await
                })
            })
            .await?;

        info!(
            pair_key = %plan.pair_key,
            from = %from,
            to = %to,
            amount = %amount,
            "Transfer booked"
        );
        Ok(plan)
    }
}
