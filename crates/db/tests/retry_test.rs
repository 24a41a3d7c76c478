//! Retry and concurrency behaviour of the ledger client.

use envelope_core::ledger::{
    AccountType, LedgerError, TimeWindow, TransactionDraft, UNALLOCATED_MONEY,
};
use envelope_core::retry::RetryPolicy;
use envelope_db::LedgerClient;
use envelope_shared::config::DatabaseConfig;
use envelope_shared::types::AccountId;
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

async fn setup(policy: RetryPolicy) -> LedgerClient {
    LedgerClient::connect(&DatabaseConfig::default(), policy)
        .await
        .expect("Failed to open in-memory ledger")
}

// ============================================================================
// Storage failures
// ============================================================================

#[tokio::test]
async fn test_storage_failure_is_retried_until_exhausted() {
    let client = setup(RetryPolicy::immediate(3)).await;
    client
        .connection()
        .clone()
        .close()
        .await
        .expect("Failed to close pool");

    let before = client.retry_metrics();
    let result = client.get_account(UNALLOCATED_MONEY).await;
    let after = client.retry_metrics();

    assert!(matches!(result, Err(LedgerError::Storage(_))));
    assert_eq!(after.attempts - before.attempts, 3);
    assert_eq!(after.transient_failures - before.transient_failures, 3);
    assert_eq!(after.exhausted - before.exhausted, 1);
}

#[tokio::test]
async fn test_storage_failure_on_write_is_retried() {
    let client = setup(RetryPolicy::immediate(2)).await;
    client
        .connection()
        .clone()
        .close()
        .await
        .expect("Failed to close pool");

    let before = client.retry_metrics();
    let result = client
        .transfer_money(UNALLOCATED_MONEY, UNALLOCATED_MONEY, dec!(1), "")
        .await;
    let after = client.retry_metrics();

    assert!(matches!(result, Err(LedgerError::Storage(_))));
    assert_eq!(after.attempts - before.attempts, 2);
}

#[tokio::test]
async fn test_clones_share_retry_metrics() {
    let client = setup(RetryPolicy::immediate(5)).await;
    let clone = client.clone();

    let before = client.retry_metrics();
    clone.list_accounts(true).await.unwrap();

    assert_eq!(client.retry_metrics().attempts - before.attempts, 1);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_concurrent_transfers_keep_pairs_balanced() {
    let client = setup(RetryPolicy::immediate(5)).await;
    let checking = client.create_account("Checking", "budget").await.unwrap().id;
    let savings = client.create_account("Savings", "budget").await.unwrap().id;
    client
        .create_transaction(TransactionDraft {
            time: chrono::Utc::now(),
            amount: dec!(1000),
            account: Some(checking),
            category: Some(UNALLOCATED_MONEY),
            ..TransactionDraft::default()
        })
        .await
        .unwrap();

    let tasks = (0..20).map(|i| {
        let client = client.clone();
        tokio::spawn(async move {
            if i % 2 == 0 {
                client.transfer_money(checking, savings, dec!(10), "even").await
            } else {
                client.transfer_money(savings, checking, dec!(2.5), "odd").await
            }
        })
    });

    for result in join_all(tasks).await {
        result.expect("task panicked").expect("transfer failed");
    }

    let txs = client.list_transactions(TimeWindow::all()).await.unwrap();
    assert_eq!(txs.len(), 41);
    let paired_sum: Decimal = txs.iter().filter(|t| t.is_paired()).map(|t| t.amount).sum();
    assert!(paired_sum.is_zero());

    let balances = client.list_account_balances(false).await.unwrap();
    let of = |id: AccountId| {
        balances
            .iter()
            .find(|b| b.account.id == id)
            .map(|b| b.balance)
            .unwrap()
    };
    assert_eq!(of(checking), dec!(925));
    assert_eq!(of(savings), dec!(75));

    let budgets = client
        .list_accounts_by_type(AccountType::Budget, false)
        .await
        .unwrap();
    assert_eq!(budgets.len(), 2);
}
