//! Property-based tests for transaction validation rules.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use envelope_shared::types::{AccountId, PairKey, TransactionId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::account::{Account, AccountType};
use super::error::LedgerError;
use super::transaction::{Transaction, zero_time};
use super::validation::{Violation, validate_transaction};

/// Strategy to generate a non-zero signed amount.
fn nonzero_amount() -> impl Strategy<Value = Decimal> {
    // -1,000,000.00 ..= 1,000,000.00 without zero
    prop_oneof![
        (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2)),
        (1i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2)),
    ]
}

/// Strategy to generate any amount, zero included.
fn any_amount() -> impl Strategy<Value = Decimal> {
    prop_oneof![1 => Just(Decimal::ZERO), 4 => nonzero_amount()]
}

/// Strategy to generate a non-zero timestamp.
fn nonzero_time() -> impl Strategy<Value = DateTime<Utc>> {
    (1i64..4_102_444_800i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
}

fn any_time() -> impl Strategy<Value = DateTime<Utc>> {
    prop_oneof![1 => Just(zero_time()), 4 => nonzero_time()]
}

fn account_type() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Budget),
        Just(AccountType::Category),
        Just(AccountType::Tracking),
    ]
}

/// A reference slot: unset, or an account of the given type.
fn reference() -> impl Strategy<Value = Option<AccountType>> {
    prop_oneof![1 => Just(None), 3 => account_type().prop_map(Some)]
}

struct Case {
    tx: Transaction,
    accounts: HashMap<AccountId, Account>,
}

impl Case {
    fn new(
        time: DateTime<Utc>,
        amount: Decimal,
        account: Option<AccountType>,
        category: Option<AccountType>,
        paired: bool,
    ) -> Self {
        let mut accounts = HashMap::new();
        let mut make = |account_type: AccountType| {
            let acc = Account::new("prop", account_type).unwrap();
            let id = acc.id;
            accounts.insert(id, acc);
            id
        };
        let account = account.map(&mut make);
        let category = category.map(&mut make);

        Self {
            tx: Transaction {
                id: TransactionId::new(),
                time,
                payee: String::new(),
                description: String::new(),
                amount,
                account,
                category,
                cleared: false,
                reconciled: false,
                pair_key: paired.then(PairKey::new),
            },
            accounts,
        }
    }

    fn validate(&self) -> Result<(), LedgerError> {
        validate_transaction(&self.tx, |id| {
            self.accounts
                .get(&id)
                .cloned()
                .ok_or(LedgerError::AccountNotFound(id))
        })
    }

    fn type_of(&self, id: Option<AccountId>) -> Option<AccountType> {
        id.and_then(|id| self.accounts.get(&id)).map(|a| a.account_type)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // =========================================================================
    // Property 1: Accepted transactions are well-formed
    // =========================================================================

    /// *For any* transaction the validator accepts, at least one reference is
    /// set, the amount is non-zero and the time is non-zero.
    #[test]
    fn prop_accepted_transactions_are_well_formed(
        time in any_time(),
        amount in any_amount(),
        account in reference(),
        category in reference(),
        paired in any::<bool>(),
    ) {
        let case = Case::new(time, amount, account, category, paired);

        if case.validate().is_ok() {
            prop_assert!(case.tx.account.is_some() || case.tx.category.is_some());
            prop_assert!(!case.tx.amount.is_zero());
            prop_assert_ne!(case.tx.time, zero_time());
        }
    }

    // =========================================================================
    // Property 2: Violations match the rules exactly
    // =========================================================================

    /// *For any* transaction, the reported violations are exactly the rules
    /// it breaks, in rule order.
    #[test]
    fn prop_violations_match_rules(
        time in any_time(),
        amount in any_amount(),
        account in reference(),
        category in reference(),
        paired in any::<bool>(),
    ) {
        let case = Case::new(time, amount, account, category, paired);

        let acc_type = case.type_of(case.tx.account);
        let cat_type = case.type_of(case.tx.category);

        let mut expected = Vec::new();
        if time == zero_time() {
            expected.push(Violation::ZeroTime);
        }
        if acc_type.is_none() && cat_type.is_none() {
            expected.push(Violation::MissingAccountAndCategory);
        }
        if amount.is_zero() {
            expected.push(Violation::ZeroAmount);
        }
        if acc_type == Some(AccountType::Budget) && cat_type.is_none() && !paired {
            expected.push(Violation::UncategorizedBudgetTransaction);
        }
        if acc_type == Some(AccountType::Tracking) && cat_type.is_some() {
            expected.push(Violation::CategorizedTrackingTransaction);
        }
        if cat_type.is_some_and(|t| t != AccountType::Category) {
            expected.push(Violation::CategoryNotCategoryType);
        }

        match case.validate() {
            Ok(()) => prop_assert!(expected.is_empty(), "expected {:?}", expected),
            Err(LedgerError::Validation(v)) => prop_assert_eq!(v.as_slice(), expected.as_slice()),
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    // =========================================================================
    // Property 3: Unresolvable references abort validation
    // =========================================================================

    /// *For any* transaction referencing an unknown account, validation fails
    /// with not-found regardless of other violations.
    #[test]
    fn prop_unknown_reference_is_not_found(
        time in any_time(),
        amount in any_amount(),
        as_category in any::<bool>(),
    ) {
        let ghost = AccountId::new();
        let mut case = Case::new(time, amount, None, None, false);
        if as_category {
            case.tx.category = Some(ghost);
        } else {
            case.tx.account = Some(ghost);
        }

        prop_assert_eq!(case.validate(), Err(LedgerError::AccountNotFound(ghost)));
    }

    // =========================================================================
    // Property 4: Budget spending needs a category unless it is a transfer leg
    // =========================================================================

    #[test]
    fn prop_uncategorized_budget_needs_pairing(
        time in nonzero_time(),
        amount in nonzero_amount(),
        paired in any::<bool>(),
    ) {
        let case = Case::new(time, amount, Some(AccountType::Budget), None, paired);
        prop_assert_eq!(case.validate().is_ok(), paired);
    }
}
