//! Account repository for database operations.

use std::collections::HashMap;

use chrono::Utc;
use envelope_core::ledger::{Account, AccountType};
use envelope_shared::types::AccountId;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use crate::entities::{accounts, sea_orm_active_enums};

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: AccountId::from_uuid(model.id),
            name: model.name,
            account_type: model.account_type.into(),
            hidden: model.hidden,
        }
    }
}

/// Account repository over a borrowed connection.
#[derive(Debug, Clone, Copy)]
pub struct AccountRepository<'c, C> {
    db: &'c C,
}

impl<'c, C: ConnectionTrait> AccountRepository<'c, C> {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: &'c C) -> Self {
        Self { db }
    }

    /// Inserts an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn insert(&self, account: &Account) -> Result<(), DbErr> {
        let now = Utc::now();

        accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            name: Set(account.name.clone()),
            account_type: Set(account.account_type.into()),
            hidden: Set(account.hidden),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(self.db)
        .await?;

        Ok(())
    }

    /// Finds a live account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, DbErr> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .filter(accounts::Column::DeletedAt.is_null())
            .one(self.db)
            .await?;

        Ok(model.map(Account::from))
    }

    /// Loads the live accounts among `ids`, keyed by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_many(&self, ids: &[AccountId]) -> Result<HashMap<AccountId, Account>, DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let models = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(ids.iter().copied().map(AccountId::into_inner)))
            .filter(accounts::Column::DeletedAt.is_null())
            .all(self.db)
            .await?;

        Ok(models
            .into_iter()
            .map(Account::from)
            .map(|account| (account.id, account))
            .collect())
    }

    /// Lists live accounts ordered by name, optionally narrowed to one type.
    ///
    /// Hidden accounts are skipped unless `include_hidden` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        account_type: Option<AccountType>,
        include_hidden: bool,
    ) -> Result<Vec<Account>, DbErr> {
        let mut query = accounts::Entity::find().filter(accounts::Column::DeletedAt.is_null());

        if !include_hidden {
            query = query.filter(accounts::Column::Hidden.eq(false));
        }
        if let Some(account_type) = account_type {
            query = query.filter(
                accounts::Column::AccountType
                    .eq(sea_orm_active_enums::AccountType::from(account_type)),
            );
        }

        let models = query
            .order_by_asc(accounts::Column::Name)
            .order_by_asc(accounts::Column::Id)
            .all(self.db)
            .await?;

        Ok(models.into_iter().map(Account::from).collect())
    }

    /// Renames an account. Returns the number of rows touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_name(&self, id: AccountId, name: &str) -> Result<u64, DbErr> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Name, Expr::value(name))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .filter(accounts::Column::DeletedAt.is_null())
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Sets the hidden flag. Returns the number of rows touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_hidden(&self, id: AccountId, hidden: bool) -> Result<u64, DbErr> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Hidden, Expr::value(hidden))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .filter(accounts::Column::DeletedAt.is_null())
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
