//! Flat-file driver behavior tests

use futures::TryStreamExt;
use ovs_stores::FlatFileDriver;
use ovs_stores::StoreDriver;
use serde_json::{Value, json};
use tempfile::TempDir;

fn driver_in(dir: &TempDir) -> FlatFileDriver {
    FlatFileDriver::new(dir.path())
}

#[tokio::test]
async fn test_connect_creates_base_directory() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("nested").join("store");
    let driver = FlatFileDriver::new(&base);

    driver.connect().await.unwrap();
    assert!(base.is_dir());
}

#[tokio::test]
async fn test_write_then_read_round_trip() {
    let dir = TempDir::new().unwrap();
    let driver = driver_in(&dir);
    driver.connect().await.unwrap();

    let payload = json!({"name": "steve", "balance": 100});
    driver.write("players", "p1", &payload).await.unwrap();

    assert_eq!(driver.read("players", "p1").await.unwrap(), Some(payload));
}

#[tokio::test]
async fn test_data_survives_driver_restart() {
    let dir = TempDir::new().unwrap();
    {
        let driver = driver_in(&dir);
        driver.connect().await.unwrap();
        driver
            .write("players", "p1", &json!({"balance": 42}))
            .await
            .unwrap();
        driver.close().await.unwrap();
    }

    // Fresh driver over the same directory reloads from disk
    let driver = driver_in(&dir);
    driver.connect().await.unwrap();
    let loaded = driver.read("players", "p1").await.unwrap().unwrap();
    assert_eq!(loaded["balance"], 42);
}

#[tokio::test]
async fn test_collection_file_is_a_json_map() {
    let dir = TempDir::new().unwrap();
    let driver = driver_in(&dir);
    driver.connect().await.unwrap();

    driver.write("players", "p1", &json!({"a": 1})).await.unwrap();
    driver.write("players", "p2", &json!({"a": 2})).await.unwrap();

    let content = std::fs::read_to_string(dir.path().join("players.json")).unwrap();
    let map: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(map["p1"]["a"], 1);
    assert_eq!(map["p2"]["a"], 2);
}

#[tokio::test]
async fn test_remove_reports_presence_and_persists() {
    let dir = TempDir::new().unwrap();
    let driver = driver_in(&dir);
    driver.connect().await.unwrap();

    driver.write("players", "p1", &json!({})).await.unwrap();
    assert!(driver.remove("players", "p1").await.unwrap());
    assert!(!driver.remove("players", "p1").await.unwrap());

    let content = std::fs::read_to_string(dir.path().join("players.json")).unwrap();
    let map: Value = serde_json::from_str(&content).unwrap();
    assert!(map.as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_scan_yields_key_order() {
    let dir = TempDir::new().unwrap();
    let driver = driver_in(&dir);
    driver.connect().await.unwrap();

    for id in ["c", "a", "b"] {
        driver.write("players", id, &json!({"id": id})).await.unwrap();
    }

    let items: Vec<(String, Value)> = driver
        .scan("players", None)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    let ids: Vec<&str> = items.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_scan_missing_collection_is_empty() {
    let dir = TempDir::new().unwrap();
    let driver = driver_in(&dir);
    driver.connect().await.unwrap();

    let items: Vec<(String, Value)> = driver
        .scan("nothing", None)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_corrupt_collection_file_surfaces_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("players.json"), "{not json").unwrap();

    let driver = driver_in(&dir);
    driver.connect().await.unwrap();

    let err = driver.read("players", "p1").await.unwrap_err();
    assert!(err.to_string().contains("players.json"));
}

#[tokio::test]
async fn test_failed_persist_does_not_expose_the_write() {
    let dir = TempDir::new().unwrap();
    let driver = driver_in(&dir);
    driver.connect().await.unwrap();

    driver
        .write("players", "p1", &json!({"balance": 100}))
        .await
        .unwrap();

    // A directory squatting on the temp path makes the next persist fail
    let tmp_path = dir.path().join("players.json.tmp");
    std::fs::create_dir(&tmp_path).unwrap();

    let err = driver.write("players", "p1", &json!({"balance": 999})).await;
    assert!(err.is_err());

    // Readers keep seeing the committed value, in memory and on disk
    let loaded = driver.read("players", "p1").await.unwrap().unwrap();
    assert_eq!(loaded["balance"], 100);
    let content = std::fs::read_to_string(dir.path().join("players.json")).unwrap();
    let map: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(map["p1"]["balance"], 100);

    // Once the path is clear again the write goes through
    std::fs::remove_dir(&tmp_path).unwrap();
    driver
        .write("players", "p1", &json!({"balance": 999}))
        .await
        .unwrap();
    assert_eq!(
        driver.read("players", "p1").await.unwrap().unwrap()["balance"],
        999
    );
}

#[tokio::test]
async fn test_failed_persist_does_not_expose_the_removal() {
    let dir = TempDir::new().unwrap();
    let driver = driver_in(&dir);
    driver.connect().await.unwrap();

    driver
        .write("players", "p1", &json!({"balance": 100}))
        .await
        .unwrap();
    std::fs::create_dir(dir.path().join("players.json.tmp")).unwrap();

    assert!(driver.remove("players", "p1").await.is_err());
    let loaded = driver.read("players", "p1").await.unwrap().unwrap();
    assert_eq!(loaded["balance"], 100);
}

#[tokio::test]
async fn test_no_temp_files_left_behind() {
    let dir = TempDir::new().unwrap();
    let driver = driver_in(&dir);
    driver.connect().await.unwrap();

    driver.write("players", "p1", &json!({})).await.unwrap();
    driver.remove("players", "p1").await.unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
