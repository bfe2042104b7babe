//! Store behavior integration tests.

mod common;

use common::{memory_store, TestHarness};
use pos_store::{ChangeEvent, Record, StoreConfig, StoreError};
use serde_json::{json, Value};

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

// ============================================================================
// Round trip and convergence
// ============================================================================

#[tokio::test]
async fn set_then_get_returns_equal_value() {
    let harness = TestHarness::new();
    let values = [
        json!(null),
        json!(true),
        json!(42),
        json!(-1.5),
        json!("teks"),
        json!([1, "two", {"three": 3}]),
        json!({"nested": {"list": [1, 2], "flag": false}}),
    ];

    for (i, value) in values.iter().enumerate() {
        let key = format!("k{i}");
        harness.store.set(&key, value).unwrap();
        assert_eq!(harness.store.get(&key).as_ref(), Some(value));
    }
}

#[tokio::test]
async fn fresh_store_converges_to_last_write() {
    let harness = TestHarness::new();
    harness.store.set("pos_settings", &json!({"taxRate": 10})).unwrap();
    harness.store.set("pos_settings", &json!({"taxRate": 11})).unwrap();
    harness.store.set("gone", &1).unwrap();
    harness.store.remove("gone");

    let harness = harness.reopen().await;
    assert!(harness.store.keys().is_empty());

    assert_eq!(harness.store.migrate_from_durable().await, 1);
    assert_eq!(
        harness.store.get("pos_settings"),
        Some(json!({"taxRate": 11}))
    );
    assert_eq!(harness.store.get("gone"), None);
}

#[tokio::test]
async fn clear_survives_reopen() {
    let harness = TestHarness::new();
    harness.store.set("a", &1).unwrap();
    harness.store.clear();
    harness.store.set("b", &2).unwrap();

    let harness = harness.reopen().await;
    harness.store.migrate_from_durable().await;

    assert_eq!(harness.store.keys(), ["b"]);
}

// ============================================================================
// Collections
// ============================================================================

#[tokio::test]
async fn delete_twice_equals_delete_once() {
    let harness = TestHarness::new();
    let store = &harness.store;
    store.add_one("pos_products", &json!({"id": "P1"})).unwrap();
    store.add_one("pos_products", &json!({"id": "P2"})).unwrap();

    store.delete_one("pos_products", "P1").unwrap();
    let once = store.get("pos_products");
    store.delete_one("pos_products", "P1").unwrap();

    assert_eq!(store.get("pos_products"), once);
    assert_eq!(store.get_all("pos_products").len(), 1);
}

#[tokio::test]
async fn update_merges_rather_than_replaces() {
    let harness = TestHarness::new();
    let store = &harness.store;
    store
        .set("pos_products", &json!([{"id": "X", "a": 1, "b": 2}]))
        .unwrap();

    let merged = store
        .update_one("pos_products", "X", record(json!({"b": 3})))
        .unwrap()
        .unwrap();

    assert_eq!(merged["a"], 1);
    assert_eq!(merged["b"], 3);
    assert!(merged["updatedAt"].is_string());

    let harness = harness.reopen().await;
    harness.store.migrate_from_durable().await;
    let stored = harness.store.find_one("pos_products", "X").unwrap();
    assert_eq!(stored, merged);
}

// ============================================================================
// Backup and restore
// ============================================================================

#[tokio::test]
async fn restore_rejects_non_objects_without_changes() {
    let harness = TestHarness::new();
    let store = &harness.store;
    store.set("pos_users", &json!([{"id": "U1"}])).unwrap();
    store.set("pos_settings", &json!({"taxRate": 10})).unwrap();
    let before = store.backup().await.unwrap();

    for bad in [json!(null), json!("not an object")] {
        let err = store.restore(&bad).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidBackup(_)));
    }

    assert_eq!(store.backup().await.unwrap(), before);
    assert_eq!(store.get("pos_users"), Some(json!([{"id": "U1"}])));
}

#[tokio::test]
async fn backup_clear_restore_backup_round_trips() {
    let harness = TestHarness::new();
    let store = &harness.store;
    store
        .set("pos_products", &json!([{"id": "P1", "hargaBeli": 50000}]))
        .unwrap();
    store.set("pos_settings", &json!({"taxRate": 10.5})).unwrap();
    store.set("pos_categories", &json!(["Elektronik"])).unwrap();

    let captured = store.backup().await.unwrap();
    store.clear();
    assert!(store.backup().await.unwrap().is_empty());

    store.restore(&Value::Object(captured.clone())).await.unwrap();

    assert_eq!(store.backup().await.unwrap(), captured);
    assert_eq!(store.keys().len(), 3);
}

#[tokio::test]
async fn restored_state_survives_reopen() {
    let harness = TestHarness::new();
    harness.store.set("old", &1).unwrap();
    harness
        .store
        .restore(&json!({"pos_settings": {"currency": "IDR"}}))
        .await
        .unwrap();

    let harness = harness.reopen().await;
    harness.store.migrate_from_durable().await;

    assert_eq!(harness.store.keys(), ["pos_settings"]);
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn quota_failure_keeps_previous_value() {
    let (store, _backend) = memory_store(StoreConfig {
        fast_quota_bytes: 128,
        ..StoreConfig::default()
    });
    store.set("pos_products", &json!([{"id": "P1"}])).unwrap();

    let huge: Vec<Value> = (0..50).map(|i| json!({"id": i})).collect();
    let err = store.set("pos_products", &huge).unwrap_err();

    assert!(matches!(err, StoreError::QuotaExceeded { .. }));
    assert_eq!(store.get("pos_products"), Some(json!([{"id": "P1"}])));

    store.flush().await;
    let backup = store.backup().await.unwrap();
    assert_eq!(backup["pos_products"], json!([{"id": "P1"}]));
}

#[tokio::test]
async fn durable_outage_does_not_fail_writes() {
    let (store, backend) = memory_store(StoreConfig::default());
    backend.set_failing(true);

    store.set("k", &json!({"v": 1})).unwrap();
    store.add_one("items", &json!({"id": "1"})).unwrap();
    store.remove("k");
    store.flush().await;

    assert_eq!(store.get_all("items").len(), 1);
    backend.set_failing(false);
    assert!(backend.is_empty());
}

#[tokio::test]
async fn failed_migration_leaves_cache_usable() {
    let (store, backend) = memory_store(StoreConfig::default());
    backend.set_failing(true);

    assert_eq!(store.migrate_from_durable().await, 0);
    store.set("k", &1).unwrap();
    assert_eq!(store.get("k"), Some(json!(1)));
}

// ============================================================================
// Notifications
// ============================================================================

#[tokio::test]
async fn writes_and_restores_are_published() {
    let harness = TestHarness::new();
    let mut rx = harness.store.subscribe().unwrap();

    harness.store.set("pos_settings", &json!({"taxRate": 10})).unwrap();
    match rx.recv().await.unwrap() {
        ChangeEvent::Update { key, value, timestamp } => {
            assert_eq!(key, "pos_settings");
            assert_eq!(value, json!({"taxRate": 10}));
            assert!(timestamp > 0);
        }
        other => panic!("unexpected event {other:?}"),
    }

    harness.store.restore(&json!({"a": 1})).await.unwrap();
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(events.last(), Some(ChangeEvent::Restore { .. })));
}

#[tokio::test]
async fn removes_are_not_published() {
    let harness = TestHarness::new();
    harness.store.set("k", &1).unwrap();
    let mut rx = harness.store.subscribe().unwrap();

    harness.store.remove("k");
    assert!(rx.try_recv().is_err());
}
