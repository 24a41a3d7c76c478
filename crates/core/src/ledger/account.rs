//! Accounts: budget, category and tracking buckets of money.

use std::fmt;
use std::str::FromStr;

use envelope_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::{Uuid, uuid};

use super::error::LedgerError;

/// Namespace for the well-known seed account identifiers (UUID v5).
pub const ACCOUNT_ID_NAMESPACE: Uuid = uuid!("17de217e-94d7-4a9b-8833-ecca7f0eb6ca");

/// The always-present "Unallocated Money" category.
pub const UNALLOCATED_MONEY: AccountId =
    AccountId::from_uuid(uuid!("248e684a-b403-56c1-993e-a75b29763a29"));

/// The hidden "Starting Balance" category used for opening balances.
pub const STARTING_BALANCE: AccountId =
    AccountId::from_uuid(uuid!("342a94d7-2ebc-5390-8e6b-cc142e5eec70"));

/// Kind of account. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Real-money account whose spending must be categorized.
    Budget,
    /// Virtual envelope categorizing budget spending and income.
    Category,
    /// Net-worth account, never categorized.
    Tracking,
}

impl AccountType {
    /// All known account types.
    pub const ALL: [Self; 3] = [Self::Budget, Self::Category, Self::Tracking];

    /// Returns the wire/storage name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Category => "category",
            Self::Tracking => "tracking",
        }
    }

    /// Checks membership of a raw string in the closed set.
    #[must_use]
    pub fn is_valid(raw: &str) -> bool {
        raw.parse::<Self>().is_ok()
    }

    /// Category accounts are tallied by `category`, the others by `account`.
    #[must_use]
    pub const fn tallies_by_category(self) -> bool {
        matches!(self, Self::Category)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LedgerError::InvalidAccountType(s.to_string()))
    }
}

/// A named bucket of money.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Identity, immutable after creation.
    pub id: AccountId,
    /// Display name, never empty.
    pub name: String,
    /// Account kind.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Hidden accounts are left out of default listings.
    #[serde(default)]
    pub hidden: bool,
}

impl Account {
    /// Creates a visible account with a fresh identity.
    ///
    /// # Errors
    ///
    /// Returns `EmptyAccountName` for a blank name.
    pub fn new(name: impl Into<String>, account_type: AccountType) -> Result<Self, LedgerError> {
        let name = name.into();
        validate_account_name(&name)?;
        Ok(Self {
            id: AccountId::new(),
            name,
            account_type,
            hidden: false,
        })
    }
}

/// Rejects blank account names.
///
/// # Errors
///
/// Returns `EmptyAccountName` when the name is empty or whitespace only.
pub fn validate_account_name(name: &str) -> Result<(), LedgerError> {
    if name.trim().is_empty() {
        return Err(LedgerError::EmptyAccountName);
    }
    Ok(())
}

/// The accounts every ledger starts with.
#[must_use]
pub fn default_accounts() -> [Account; 2] {
    [
        Account {
            id: UNALLOCATED_MONEY,
            name: "Unallocated Money".to_string(),
            account_type: AccountType::Category,
            hidden: false,
        },
        Account {
            id: STARTING_BALANCE,
            name: "Starting Balance".to_string(),
            account_type: AccountType::Category,
            hidden: true,
        },
    ]
}

/// Input for opening an account with an optional starting balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    /// Display name.
    pub name: String,
    /// Account kind.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Opening amount; zero books nothing.
    #[serde(default)]
    pub starting_balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_type_parse() {
        assert_eq!("budget".parse::<AccountType>().unwrap(), AccountType::Budget);
        assert_eq!(
            "category".parse::<AccountType>().unwrap(),
            AccountType::Category
        );
        assert_eq!(
            "tracking".parse::<AccountType>().unwrap(),
            AccountType::Tracking
        );
        assert_eq!(
            "not-a-real-type".parse::<AccountType>(),
            Err(LedgerError::InvalidAccountType("not-a-real-type".into()))
        );
        assert!("Budget".parse::<AccountType>().is_err());
    }

    #[test]
    fn test_account_type_is_valid() {
        assert!(AccountType::is_valid("tracking"));
        assert!(!AccountType::is_valid(""));
        assert!(!AccountType::is_valid("savings"));
    }

    #[test]
    fn test_account_type_serde() {
        assert_eq!(
            serde_json::to_string(&AccountType::Category).unwrap(),
            "\"category\""
        );
        assert!(serde_json::from_str::<AccountType>("\"savings\"").is_err());
    }

    #[test]
    fn test_seed_ids_are_namespaced_v5() {
        assert_eq!(
            UNALLOCATED_MONEY.into_inner(),
            Uuid::new_v5(&ACCOUNT_ID_NAMESPACE, b"unallocated-money")
        );
        assert_eq!(
            STARTING_BALANCE.into_inner(),
            Uuid::new_v5(&ACCOUNT_ID_NAMESPACE, b"starting-balance")
        );
    }

    #[test]
    fn test_default_accounts() {
        let [unallocated, starting] = default_accounts();
        assert_eq!(unallocated.id, UNALLOCATED_MONEY);
        assert_eq!(unallocated.account_type, AccountType::Category);
        assert!(!unallocated.hidden);
        assert_eq!(starting.id, STARTING_BALANCE);
        assert!(starting.hidden);
    }

    #[test]
    fn test_new_account_rejects_blank_name() {
        assert_eq!(
            Account::new("  ", AccountType::Budget),
            Err(LedgerError::EmptyAccountName)
        );
        let acc = Account::new("Checking", AccountType::Budget).unwrap();
        assert_eq!(acc.name, "Checking");
        assert!(!acc.hidden);
    }

    #[test]
    fn test_account_json_shape() {
        let acc = Account {
            id: UNALLOCATED_MONEY,
            name: "Unallocated Money".into(),
            account_type: AccountType::Category,
            hidden: false,
        };
        let json = serde_json::to_value(&acc).unwrap();
        assert_eq!(json["type"], "category");
        assert_eq!(json["id"], UNALLOCATED_MONEY.to_string());
    }

    #[test]
    fn test_new_account_payload() {
        let input: NewAccount =
            serde_json::from_str(r#"{"name":"Cash","type":"tracking","startingBalance":12.5}"#)
                .unwrap();
        assert_eq!(input.account_type, AccountType::Tracking);
        assert_eq!(input.starting_balance, Decimal::new(125, 1));

        let input: NewAccount = serde_json::from_str(r#"{"name":"Food","type":"category"}"#).unwrap();
        assert!(input.starting_balance.is_zero());
    }
}
