//! `SeaORM` active enums.

use envelope_core::ledger;
use sea_orm::entity::prelude::*;

/// Account type as stored in `accounts.account_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AccountType {
    #[sea_orm(string_value = "budget")]
    Budget,
    #[sea_orm(string_value = "category")]
    Category,
    #[sea_orm(string_value = "tracking")]
    Tracking,
}

impl From<ledger::AccountType> for AccountType {
    fn from(value: ledger::AccountType) -> Self {
        match value {
            ledger::AccountType::Budget => Self::Budget,
            ledger::AccountType::Category => Self::Category,
            ledger::AccountType::Tracking => Self::Tracking,
        }
    }
}

impl From<AccountType> for ledger::AccountType {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Budget => Self::Budget,
            AccountType::Category => Self::Category,
            AccountType::Tracking => Self::Tracking,
        }
    }
}
