#![allow(missing_docs, clippy::expect_used, clippy::unwrap_used)]

use serde_json::{Map, Value, json};
use std::time::Duration;
use tasklist_store::{MemoryStore, StoreError, StorePath, TreeStore};
use tokio::time::timeout;

fn path(raw: &str) -> StorePath {
    StorePath::parse(raw).expect("valid path")
}

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[tokio::test]
async fn subscription_yields_absent_value_first() {
    let store = MemoryStore::new();
    let mut sub = store.subscribe(&path("tasks")).await.unwrap();
    assert_eq!(sub.next().await.unwrap(), None);
}

#[tokio::test]
async fn subscription_delivers_full_subtree_on_descendant_change() {
    let store = MemoryStore::new();
    let mut sub = store.subscribe(&path("tasks")).await.unwrap();
    assert_eq!(sub.next().await.unwrap(), None);

    store
        .write(&path("tasks/a"), json!({ "text": "first", "isChecked": false }))
        .await
        .unwrap();
    let snapshot = timeout(Duration::from_secs(1), sub.next())
        .await
        .expect("snapshot arrives")
        .unwrap();
    assert_eq!(
        snapshot,
        Some(json!({ "a": { "text": "first", "isChecked": false } }))
    );

    store
        .update(&path("tasks/a"), fields(json!({ "isChecked": true })))
        .await
        .unwrap();
    let snapshot = sub.next().await.unwrap();
    assert_eq!(
        snapshot,
        Some(json!({ "a": { "text": "first", "isChecked": true } }))
    );
}

#[tokio::test]
async fn unrelated_writes_do_not_wake_subscribers() {
    let store = MemoryStore::new();
    let mut sub = store.subscribe(&path("tasks")).await.unwrap();
    sub.next().await.unwrap();

    store.write(&path("deletedTasks/x"), json!({ "text": "gone", "isChecked": true })).await.unwrap();
    assert!(
        timeout(Duration::from_millis(50), sub.next()).await.is_err(),
        "no snapshot expected for an unrelated subtree"
    );
}

#[tokio::test]
async fn push_keys_sort_in_creation_order() {
    let store = MemoryStore::new();
    let mut keys = Vec::new();
    for idx in 0..20 {
        let key = store
            .push(&path("tasks"), json!({ "text": format!("t{idx}"), "isChecked": false }))
            .await
            .unwrap();
        keys.push(key);
    }
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    let tasks = store.read_once(&path("tasks")).await.unwrap().unwrap();
    assert_eq!(tasks.as_object().unwrap().len(), 20);
}

#[tokio::test]
async fn update_on_missing_node_is_not_found() {
    let store = MemoryStore::new();
    let err = store
        .update(&path("tasks/missing"), fields(json!({ "isChecked": true })))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.read_once(&path("tasks/missing")).await.unwrap(), None);
}

#[tokio::test]
async fn remove_prunes_and_tolerates_absent_nodes() {
    let store = MemoryStore::from_value(json!({
        "tasks": { "a": { "text": "only", "isChecked": false } }
    }))
    .unwrap();
    store.remove(&path("tasks/a")).await.unwrap();
    store.remove(&path("tasks/a")).await.unwrap();
    assert_eq!(store.read_once(&path("tasks")).await.unwrap(), None);
    assert_eq!(store.read_once(&StorePath::root()).await.unwrap(), None);
}

#[tokio::test]
async fn create_keeps_an_existing_node() {
    let store = MemoryStore::new();
    let first = json!({ "text": "original", "isChecked": false });
    assert!(store.create(&path("deletedTasks/a"), first.clone()).await.unwrap());
    assert!(
        !store
            .create(&path("deletedTasks/a"), json!({ "text": "original", "isChecked": true }))
            .await
            .unwrap()
    );
    assert_eq!(store.read_once(&path("deletedTasks/a")).await.unwrap(), Some(first));

    store.remove(&path("deletedTasks/a")).await.unwrap();
    assert!(store.create(&path("deletedTasks/a"), json!({ "text": "again", "isChecked": true })).await.unwrap());
}

#[tokio::test]
async fn writing_null_removes_the_node() {
    let store = MemoryStore::new();
    store.write(&path("tasks/a/text"), json!("hello")).await.unwrap();
    store.write(&path("tasks/a"), Value::Null).await.unwrap();
    assert_eq!(store.read_once(&path("tasks")).await.unwrap(), None);
}

#[tokio::test]
async fn reserved_keys_are_rejected() {
    let store = MemoryStore::new();
    let err = store
        .write(&path("tasks"), json!({ "bad.key": { "text": "x" } }))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidPath { .. }));
}

#[tokio::test]
async fn subscription_closes_with_the_store() {
    let store = MemoryStore::new();
    let mut sub = store.subscribe(&path("tasks")).await.unwrap();
    sub.next().await.unwrap();
    drop(store);
    assert!(matches!(sub.next().await, Err(StoreError::Closed)));
}

#[tokio::test]
async fn persisted_tree_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("nested").join("store.json");

    let store = MemoryStore::open(&file).await.unwrap();
    assert_eq!(store.persist_path(), Some(file.as_path()));
    let key = store
        .push(&path("tasks"), json!({ "text": "persist me", "isChecked": false }))
        .await
        .unwrap();
    drop(store);

    let reopened = MemoryStore::open(&file).await.unwrap();
    let task = reopened
        .read_once(&path("tasks").child(&key).unwrap())
        .await
        .unwrap();
    assert_eq!(task, Some(json!({ "text": "persist me", "isChecked": false })));
}

#[tokio::test]
async fn open_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("store.json");
    std::fs::write(&file, "{ not json").unwrap();
    assert!(matches!(
        MemoryStore::open(&file).await,
        Err(StoreError::Serialization(_))
    ));
}
