use gridsweep_core::ExecutionId;
use gridsweep_store::{
    persist_with_retry, ConcurrencyStamp, ConflictSafePersister, ExecutionStore,
    InMemoryExecutionStore, PendingExecution, PersistError, RetryPolicy, StoreError,
    StoredExecution,
};
use gridsweep_test_utils::{sample_execution, InsertOutcome, ScriptedStore, StoreCall};
use mockall::mock;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

mock! {
    pub Store {}

    #[async_trait::async_trait]
    impl ExecutionStore for Store {
        async fn insert(&self, pending: &PendingExecution) -> Result<StoredExecution, StoreError>;
        async fn current_stamp(&self) -> Result<ConcurrencyStamp, StoreError>;
        async fn list(&self) -> Result<Vec<StoredExecution>, StoreError>;
    }
}

fn pending() -> PendingExecution {
    PendingExecution::new(sample_execution(), ConcurrencyStamp::INITIAL)
}

fn policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries).unwrap()
}

#[tokio::test]
async fn exhausts_after_exactly_max_retries_attempts() {
    let store = ScriptedStore::always_conflicting();

    let error = persist_with_retry(&store, pending(), &policy(5), &CancellationToken::new())
        .await
        .unwrap_err();

    match error {
        PersistError::ConflictExhausted {
            attempts,
            last_conflict,
        } => {
            assert_eq!(attempts, 5);
            assert_eq!(last_conflict.expected, ConcurrencyStamp(4));
            assert_eq!(last_conflict.found, Some(ConcurrencyStamp(5)));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert_eq!(store.insert_count(), 5);
}

#[tokio::test]
async fn single_retry_budget_gives_up_on_first_conflict() {
    let store = ScriptedStore::always_conflicting();

    let error = persist_with_retry(&store, pending(), &policy(1), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(error.is_exhausted());
    assert_eq!(store.calls(), vec![StoreCall::Insert {
        baseline: ConcurrencyStamp::INITIAL
    }]);
}

#[tokio::test]
async fn conflict_then_success_reconciles_before_retrying() {
    let store = ScriptedStore::conflicting_times(1);

    let stored = persist_with_retry(&store, pending(), &policy(5), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stored.id, ExecutionId(1));
    assert_eq!(stored.execution, sample_execution());
    assert_eq!(
        store.calls(),
        vec![
            StoreCall::Insert {
                baseline: ConcurrencyStamp(0)
            },
            StoreCall::ReadStamp,
            StoreCall::Insert {
                baseline: ConcurrencyStamp(1)
            },
        ]
    );
}

#[tokio::test]
async fn succeeds_on_last_allowed_attempt() {
    let store = ScriptedStore::conflicting_times(4);

    let stored = persist_with_retry(&store, pending(), &policy(5), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stored.stamp, ConcurrencyStamp(5));
    assert_eq!(store.insert_count(), 5);
}

#[tokio::test]
async fn non_conflict_errors_are_not_retried() {
    let store = ScriptedStore::new([InsertOutcome::Unavailable], InsertOutcome::Succeed);

    let error = persist_with_retry(&store, pending(), &policy(5), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(error, PersistError::Store(StoreError::Unavailable(_))));
    assert_eq!(store.insert_count(), 1);
    assert!(!store.calls().contains(&StoreCall::ReadStamp));
}

#[tokio::test]
async fn failed_reconciliation_read_propagates() {
    let mut store = MockStore::new();
    store
        .expect_insert()
        .times(1)
        .returning(|p| Err(StoreError::conflict(p.baseline(), None)));
    store
        .expect_current_stamp()
        .times(1)
        .returning(|| Err(StoreError::Timeout { after_ms: 250 }));

    let error = persist_with_retry(&store, pending(), &policy(5), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        PersistError::Store(StoreError::Timeout { after_ms: 250 })
    ));
}

#[tokio::test]
async fn constraint_violation_surfaces_unchanged() {
    let mut store = MockStore::new();
    store
        .expect_insert()
        .times(1)
        .returning(|_| Err(StoreError::Constraint("covered_cells must be positive".into())));
    store.expect_current_stamp().never();

    let error = persist_with_retry(&store, pending(), &policy(3), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "constraint violation: covered_cells must be positive"
    );
}

#[tokio::test]
async fn already_cancelled_token_never_touches_the_store() {
    let store = ScriptedStore::conflicting_times(0);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let error = persist_with_retry(&store, pending(), &policy(5), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(error, PersistError::Cancelled { attempts: 0 }));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn cancellation_mid_retry_aborts_hanging_attempt() {
    let store = ScriptedStore::new([InsertOutcome::Conflict, InsertOutcome::Hang], InsertOutcome::Succeed);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let error = tokio::time::timeout(
        Duration::from_secs(5),
        persist_with_retry(&store, pending(), &policy(5), &cancel),
    )
    .await
    .expect("cancellation should end the loop")
    .unwrap_err();

    assert!(matches!(error, PersistError::Cancelled { attempts: 1 }));
    assert_eq!(store.insert_count(), 2);
}

#[tokio::test]
async fn cancellation_interrupts_backoff() {
    let store = ScriptedStore::always_conflicting();
    let cancel = CancellationToken::new();
    let policy = policy(5).with_backoff(Duration::from_secs(30));

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let error = tokio::time::timeout(
        Duration::from_secs(5),
        persist_with_retry(&store, pending(), &policy, &cancel),
    )
    .await
    .expect("backoff should observe cancellation")
    .unwrap_err();

    assert!(matches!(error, PersistError::Cancelled { attempts: 1 }));
    assert_eq!(store.insert_count(), 1);
}

#[tokio::test]
async fn persister_reads_initial_baseline_from_store() {
    let store = Arc::new(ScriptedStore::conflicting_times(0).at_stamp(ConcurrencyStamp(7)));
    let persister = ConflictSafePersister::new(Arc::clone(&store), RetryPolicy::default());

    let stored = persister
        .persist(sample_execution(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stored.stamp, ConcurrencyStamp(8));
    assert_eq!(
        store.calls(),
        vec![
            StoreCall::ReadStamp,
            StoreCall::Insert {
                baseline: ConcurrencyStamp(7)
            },
        ]
    );
}

#[tokio::test]
async fn persister_rides_out_contention_on_a_shared_store() {
    let store: Arc<dyn ExecutionStore> = Arc::new(InMemoryExecutionStore::new().with_contention(3));
    let persister = ConflictSafePersister::new(store, RetryPolicy::default());

    let stored = persister
        .persist(sample_execution(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stored.id, ExecutionId(1));
    assert_eq!(persister.store().list().await.unwrap(), vec![stored]);
}

#[tokio::test]
async fn concurrent_writers_all_land_with_distinct_ids() {
    let store = Arc::new(InMemoryExecutionStore::new());
    let persister = ConflictSafePersister::new(Arc::clone(&store), policy(64));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let persister = persister.clone();
            tokio::spawn(async move {
                persister
                    .persist(sample_execution(), &CancellationToken::new())
                    .await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 8);
    assert_eq!(store.len(), 8);
}

#[test]
fn zero_retry_budget_is_rejected() {
    assert!(RetryPolicy::new(0).is_err());
    assert_eq!(RetryPolicy::default().max_retries(), 5);
}
