//! Property-based tests for balance aggregation.

use envelope_shared::types::{AccountId, round_to_cents};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::account::{Account, AccountType};
use super::balance::{BalanceLine, aggregate_balances};

/// Strategy to generate a signed amount with up to four decimals.
fn amount() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

fn account_type() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Budget),
        Just(AccountType::Category),
        Just(AccountType::Tracking),
    ]
}

/// Accounts plus lines whose references point into them (or nowhere).
fn ledger() -> impl Strategy<Value = (Vec<Account>, Vec<BalanceLine>)> {
    prop::collection::vec(account_type(), 1..8).prop_flat_map(|types| {
        let accounts: Vec<Account> = types
            .into_iter()
            .map(|t| Account::new("prop", t).unwrap())
            .collect();
        let n = accounts.len();
        let slot = prop_oneof![1 => Just(None), 3 => (0..n).prop_map(Some)];
        let lines = prop::collection::vec((amount(), slot.clone(), slot), 0..40);
        (Just(accounts), lines).prop_map(|(accounts, raw)| {
            let lines = raw
                .into_iter()
                .map(|(amount, a, c)| BalanceLine {
                    amount,
                    account: a.map(|i| accounts[i].id),
                    category: c.map(|i| accounts[i].id),
                })
                .collect();
            (accounts, lines)
        })
    })
}

/// Naive per-account scan used as the reference result.
fn recompute(account: &Account, lines: &[BalanceLine]) -> Decimal {
    let side = |l: &BalanceLine| -> Option<AccountId> {
        if account.account_type == AccountType::Category {
            l.category
        } else {
            l.account
        }
    };
    round_to_cents(
        lines
            .iter()
            .filter(|&l| side(l) == Some(account.id))
            .map(|l| l.amount)
            .sum(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // =========================================================================
    // Property 1: Aggregation equals independent recomputation
    // =========================================================================

    /// *For any* set of accounts and transactions, every balance equals the
    /// rounded sum of the amounts matching that account's side.
    #[test]
    fn prop_balances_match_recomputation((accounts, lines) in ledger()) {
        let balances = aggregate_balances(accounts.clone(), &lines);

        prop_assert_eq!(balances.len(), accounts.len());
        for (balance, account) in balances.iter().zip(&accounts) {
            prop_assert_eq!(&balance.account, account);
            prop_assert_eq!(balance.balance, recompute(account, &lines));
        }
    }

    // =========================================================================
    // Property 2: Balances are always whole cents
    // =========================================================================

    #[test]
    fn prop_balances_are_whole_cents((accounts, lines) in ledger()) {
        for balance in aggregate_balances(accounts, &lines) {
            prop_assert_eq!(balance.balance, balance.balance.round_dp(2));
        }
    }
}
