//! Property-based tests for transfer planning and pairing-aware updates.

use chrono::Utc;
use envelope_shared::types::AccountId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::account::{Account, AccountType};
use super::error::LedgerError;
use super::transaction::TransactionUpdate;
use super::transfer::plan_transfer;
use super::update::{apply_overwrite, sibling_amount};

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn account_type() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Budget),
        Just(AccountType::Category),
        Just(AccountType::Tracking),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // =========================================================================
    // Property 1: Transfer legs share one key and cancel out
    // =========================================================================

    /// *For any* same-type transfer, both legs carry the same pairing key
    /// and their amounts sum to zero.
    #[test]
    fn prop_legs_pair_and_cancel(
        account_type in account_type(),
        amount in positive_amount(),
    ) {
        let from = Account::new("from", account_type).unwrap();
        let to = Account::new("to", account_type).unwrap();

        let plan = plan_transfer(&from, &to, amount, "prop", None, Utc::now()).unwrap();

        prop_assert_eq!(plan.debit.pair_key, Some(plan.pair_key));
        prop_assert_eq!(plan.credit.pair_key, Some(plan.pair_key));
        prop_assert!((plan.debit.amount + plan.credit.amount).is_zero());
        prop_assert_eq!(plan.debit.amount, -amount);
        prop_assert!(plan.debit.references(from.id));
        prop_assert!(plan.credit.references(to.id));
    }

    // =========================================================================
    // Property 2: Variant preconditions on account types
    // =========================================================================

    #[test]
    fn prop_type_rules(
        from_type in account_type(),
        to_type in account_type(),
        with_category in any::<bool>(),
        amount in positive_amount(),
    ) {
        let from = Account::new("from", from_type).unwrap();
        let to = Account::new("to", to_type).unwrap();
        let category = with_category.then(AccountId::new);

        let result = plan_transfer(&from, &to, amount, "", category, Utc::now());

        let involves_category =
            from_type == AccountType::Category || to_type == AccountType::Category;
        match (with_category, result) {
            (false, Ok(_)) => prop_assert_eq!(from_type, to_type),
            (false, Err(e)) => {
                prop_assert_ne!(from_type, to_type);
                prop_assert!(
                    matches!(e, LedgerError::AccountTypeMismatch { .. }),
                    "unexpected error {:?}",
                    e
                );
            }
            (true, Ok(plan)) => {
                prop_assert!(!involves_category);
                for leg in plan.legs() {
                    let is_budget = (leg.account == Some(from.id) && from_type == AccountType::Budget)
                        || (leg.account == Some(to.id) && to_type == AccountType::Budget);
                    prop_assert_eq!(leg.category.is_some(), is_budget);
                }
            }
            (true, Err(e)) => {
                prop_assert!(involves_category);
                prop_assert_eq!(e, LedgerError::CategoryAccountInTransfer);
            }
        }
    }

    // =========================================================================
    // Property 3: Overwrites never move a leg or decouple a pair
    // =========================================================================

    /// *For any* overwrite of a transfer leg, id, account and pairing key
    /// are kept, and the sibling follows only an amount change.
    #[test]
    fn prop_overwrite_pins_and_syncs_sibling(
        amount in positive_amount(),
        new_amount in positive_amount(),
        payee in "[a-z]{0,12}",
    ) {
        let from = Account::new("from", AccountType::Tracking).unwrap();
        let to = Account::new("to", AccountType::Tracking).unwrap();
        let plan = plan_transfer(&from, &to, amount, "", None, Utc::now()).unwrap();
        let stored = plan.debit;

        let update = TransactionUpdate {
            time: Utc::now(),
            payee,
            amount: -new_amount,
            account: Some(AccountId::new()),
            ..Default::default()
        };
        let updated = apply_overwrite(&stored, update);

        prop_assert_eq!(updated.id, stored.id);
        prop_assert_eq!(updated.account, stored.account);
        prop_assert_eq!(updated.pair_key, stored.pair_key);

        let sibling = sibling_amount(&stored, &updated);
        if new_amount == amount {
            prop_assert_eq!(sibling, None);
        } else {
            prop_assert_eq!(sibling, Some(new_amount));
            prop_assert!((updated.amount + new_amount).is_zero());
        }
    }
}
