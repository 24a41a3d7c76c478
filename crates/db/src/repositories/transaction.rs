//! Transaction repository for database operations.
//!
//! Deletes are soft: rows get a `deleted_at` stamp and every read skips them.

use chrono::Utc;
use envelope_core::ledger::{BalanceLine, TimeWindow, Transaction};
use envelope_shared::types::{AccountId, PairKey, TransactionId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::transactions;

impl From<transactions::Model> for Transaction {
    fn from(model: transactions::Model) -> Self {
        Self {
            id: TransactionId::from_uuid(model.id),
            time: model.time,
            payee: model.payee,
            description: model.description,
            amount: model.amount,
            account: model.account.map(AccountId::from_uuid),
            category: model.category.map(AccountId::from_uuid),
            cleared: model.cleared,
            reconciled: model.reconciled,
            pair_key: model.pair_key.map(PairKey::from_uuid),
        }
    }
}

/// Transaction repository over a borrowed connection.
#[derive(Debug, Clone, Copy)]
pub struct TransactionRepository<'c, C> {
    db: &'c C,
}

impl<'c, C: ConnectionTrait> TransactionRepository<'c, C> {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: &'c C) -> Self {
        Self { db }
    }

    /// Inserts a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn insert(&self, tx: &Transaction) -> Result<(), DbErr> {
        let now = Utc::now();

        transactions::ActiveModel {
            id: Set(tx.id.into_inner()),
            time: Set(tx.time),
            payee: Set(tx.payee.clone()),
            description: Set(tx.description.clone()),
            amount: Set(tx.amount),
            account: Set(tx.account.map(AccountId::into_inner)),
            category: Set(tx.category.map(AccountId::into_inner)),
            cleared: Set(tx.cleared),
            reconciled: Set(tx.reconciled),
            pair_key: Set(tx.pair_key.map(PairKey::into_inner)),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(self.db)
        .await?;

        Ok(())
    }

    /// Overwrites every mutable column of a stored transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the row is missing or the database update fails.
    pub async fn save(&self, tx: &Transaction) -> Result<(), DbErr> {
        transactions::ActiveModel {
            id: Set(tx.id.into_inner()),
            time: Set(tx.time),
            payee: Set(tx.payee.clone()),
            description: Set(tx.description.clone()),
            amount: Set(tx.amount),
            account: Set(tx.account.map(AccountId::into_inner)),
            category: Set(tx.category.map(AccountId::into_inner)),
            cleared: Set(tx.cleared),
            reconciled: Set(tx.reconciled),
            pair_key: Set(tx.pair_key.map(PairKey::into_inner)),
            created_at: NotSet,
            updated_at: Set(Utc::now()),
            deleted_at: NotSet,
        }
        .update(self.db)
        .await?;

        Ok(())
    }

    /// Finds a live transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, DbErr> {
        let model = transactions::Entity::find_by_id(id.into_inner())
            .filter(transactions::Column::DeletedAt.is_null())
            .one(self.db)
            .await?;

        Ok(model.map(Transaction::from))
    }

    /// Lists live transactions inside `window`, oldest first.
    ///
    /// With `account` set, only rows referencing it as account or category
    /// are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        window: &TimeWindow,
        account: Option<AccountId>,
    ) -> Result<Vec<Transaction>, DbErr> {
        let mut query =
            transactions::Entity::find().filter(transactions::Column::DeletedAt.is_null());

        if let Some(since) = window.since {
            query = query.filter(transactions::Column::Time.gte(since));
        }
        if let Some(until) = window.until {
            query = query.filter(transactions::Column::Time.lte(until));
        }
        if let Some(id) = account {
            query = query.filter(
                Condition::any()
                    .add(transactions::Column::Account.eq(id.into_inner()))
                    .add(transactions::Column::Category.eq(id.into_inner())),
            );
        }

        let models = query
            .order_by_asc(transactions::Column::Time)
            .order_by_asc(transactions::Column::Id)
            .all(self.db)
            .await?;

        Ok(models.into_iter().map(Transaction::from).collect())
    }

    /// Reads the columns balances depend on for every live transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balance_lines(&self) -> Result<Vec<BalanceLine>, DbErr> {
        let rows: Vec<(Decimal, Option<Uuid>, Option<Uuid>)> = transactions::Entity::find()
            .filter(transactions::Column::DeletedAt.is_null())
            .select_only()
            .column(transactions::Column::Amount)
            .column(transactions::Column::Account)
            .column(transactions::Column::Category)
            .into_tuple()
            .all(self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(amount, account, category)| BalanceLine {
                amount,
                account: account.map(AccountId::from_uuid),
                category: category.map(AccountId::from_uuid),
            })
            .collect())
    }

    /// Sets the amount of every live leg sharing `pair_key` except `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_sibling_amount(
        &self,
        pair_key: PairKey,
        id: TransactionId,
        amount: Decimal,
    ) -> Result<u64, DbErr> {
        let result = transactions::Entity::update_many()
            .col_expr(transactions::Column::Amount, Expr::value(amount))
            .col_expr(transactions::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(transactions::Column::PairKey.eq(pair_key.into_inner()))
            .filter(transactions::Column::Id.ne(id.into_inner()))
            .filter(transactions::Column::DeletedAt.is_null())
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Sets the cleared flag of one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_cleared(&self, id: TransactionId, cleared: bool) -> Result<u64, DbErr> {
        let result = transactions::Entity::update_many()
            .col_expr(transactions::Column::Cleared, Expr::value(cleared))
            .col_expr(transactions::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(transactions::Column::Id.eq(id.into_inner()))
            .filter(transactions::Column::DeletedAt.is_null())
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Marks every cleared transaction on `account` as reconciled.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_reconciled(&self, account: AccountId) -> Result<u64, DbErr> {
        let result = transactions::Entity::update_many()
            .col_expr(transactions::Column::Reconciled, Expr::value(true))
            .col_expr(transactions::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(transactions::Column::Account.eq(account.into_inner()))
            .filter(transactions::Column::Cleared.eq(true))
            .filter(transactions::Column::DeletedAt.is_null())
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Soft-deletes one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn soft_delete(&self, id: TransactionId) -> Result<u64, DbErr> {
        let now = Utc::now();
        let result = transactions::Entity::update_many()
            .col_expr(transactions::Column::DeletedAt, Expr::value(now))
            .col_expr(transactions::Column::UpdatedAt, Expr::value(now))
            .filter(transactions::Column::Id.eq(id.into_inner()))
            .filter(transactions::Column::DeletedAt.is_null())
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Soft-deletes every leg sharing `pair_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn soft_delete_pair(&self, pair_key: PairKey) -> Result<u64, DbErr> {
        let now = Utc::now();
        let result = transactions::Entity::update_many()
            .col_expr(transactions::Column::DeletedAt, Expr::value(now))
            .col_expr(transactions::Column::UpdatedAt, Expr::value(now))
            .filter(transactions::Column::PairKey.eq(pair_key.into_inner()))
            .filter(transactions::Column::DeletedAt.is_null())
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
