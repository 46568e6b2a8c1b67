//! Behaviour shared by the local backends.

use std::sync::Arc;

use futures::TryStreamExt;
use serde_json::json;

use kioskwatch_core::{DeviceKey, IngestionService, QueryService, StatusRecord, StatusStore, StoreConfig};
use kioskwatch_storage::create_store;

fn record(payload: serde_json::Value) -> StatusRecord {
    StatusRecord::new(chrono::Utc::now(), payload)
}

async fn check_last_write_wins(store: Arc<dyn StatusStore>) {
    let key = DeviceKey::from("kiosk-01");
    store.put(&key, &record(json!({"vpn": "up", "extra": true}))).await.unwrap();
    store.put(&key, &record(json!({"vpn": "down"}))).await.unwrap();

    let items: Vec<_> = store.list().try_collect().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].1.payload, json!({"vpn": "down"}));
}

async fn check_concurrent_writers(store: Arc<dyn StatusStore>) {
    let ingest = IngestionService::new(store.clone());
    let query = QueryService::new(store.clone());

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let ingest = ingest.clone();
            tokio::spawn(async move {
                let body = json!({"Device": format!("kiosk-{i:02}"), "seq": i}).to_string();
                ingest.ingest(body.as_bytes()).await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let results = query.query_all().await.unwrap();
    assert_eq!(results.len(), 32);
    for entry in results {
        let seq = entry.payload["seq"].as_u64().unwrap();
        assert_eq!(entry.id.as_str(), format!("kiosk-{seq:02}"));
    }
}

#[tokio::test]
async fn test_memory_last_write_wins() {
    check_last_write_wins(create_store(&StoreConfig::memory()).unwrap()).await;
}

#[tokio::test]
async fn test_memory_concurrent_writers() {
    check_concurrent_writers(create_store(&StoreConfig::memory()).unwrap()).await;
}

#[cfg(feature = "redb")]
mod redb_backend {
    use super::*;

    fn redb_config(dir: &tempfile::TempDir) -> StoreConfig {
        StoreConfig::redb(dir.path().join("status.redb").to_string_lossy())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_redb_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        check_last_write_wins(create_store(&redb_config(&dir)).unwrap()).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_redb_concurrent_writers() {
        let dir = tempfile::tempdir().unwrap();
        check_concurrent_writers(create_store(&redb_config(&dir)).unwrap()).await;
    }

    #[tokio::test]
    async fn test_redb_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = redb_config(&dir);
        let rec = record(json!({"Device": "kiosk-07", "InternetConnectivity": {"HasInternet": true}}));

        {
            let store = create_store(&config).unwrap();
            store.put(&DeviceKey::from("kiosk-07"), &rec).await.unwrap();
        }

        let reopened = create_store(&config).unwrap();
        let loaded = reopened.get(&DeviceKey::from("kiosk-07")).await.unwrap();
        assert_eq!(loaded, Some(rec));
    }
}
