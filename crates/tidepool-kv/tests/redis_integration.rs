//! Integration tests - require Redis running
//!
//! Run with: `TIDEPOOL_REDIS_URL=redis://localhost:6379 cargo test -p tidepool-kv -- --ignored`

use std::time::Duration;

use tidepool_kv::{BigInt, KvConfig, KvFacade, Value};

const TEST_DB: i64 = 15;

async fn connect() -> KvFacade {
    let config = KvConfig::from_env().unwrap().db_index(TEST_DB);
    let mut kv = KvFacade::redis(config).unwrap();
    kv.connect().await.unwrap();
    kv
}

#[tokio::test]
#[ignore]
async fn test_connect_and_disconnect() {
    let mut kv = connect().await;
    assert!(kv.is_connected());
    kv.disconnect().await.unwrap();
    assert!(!kv.is_connected());
    kv.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_text_and_case() {
    let mut kv = connect().await;
    kv.set_text("TidepoolIT:Case", "bar", None).await.unwrap();
    assert_eq!(kv.get_text("tidepoolit:case").await.unwrap(), Some("bar".to_string()));

    kv.delete_keys(["tidepoolit:case"]).await.unwrap();
    kv.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_ttl_expiry() {
    let mut kv = connect().await;
    kv.set_text("tidepoolit:ttl", "x", Some(Duration::from_secs(1))).await.unwrap();
    assert!(kv.exists("tidepoolit:ttl").await.unwrap());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!kv.exists("tidepoolit:ttl").await.unwrap());
    kv.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_batches_and_objects() {
    let mut kv = connect().await;
    let value = Value::List(vec![
        Value::BigInt("123456789012345678901234567890".parse::<BigInt>().unwrap()),
        Value::from("x"),
    ]);

    kv.batch_set_object([("tidepoolit:obj:1", &value)], None).await.unwrap();
    kv.batch_set_text([("tidepoolit:txt:1", "a"), ("tidepoolit:txt:2", "b")], None)
        .await
        .unwrap();

    let objects = kv.batch_get_object(["tidepoolit:obj:1"]).await.unwrap();
    assert_eq!(objects["tidepoolit:obj:1"], Some(value));

    let texts = kv
        .batch_get_text(["tidepoolit:txt:1", "tidepoolit:txt:2", "tidepoolit:txt:3"])
        .await
        .unwrap();
    assert_eq!(texts["tidepoolit:txt:2"], Some("b".to_string()));
    assert_eq!(texts["tidepoolit:txt:3"], None);

    kv.batch_update_ttl(["tidepoolit:txt:1", "tidepoolit:txt:2"], Duration::from_secs(60))
        .await
        .unwrap();

    kv.delete_by_pattern("tidepoolit:*").await.unwrap();
    kv.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_delete_by_pattern_many_pages() {
    let mut kv = connect().await;
    let entries: Vec<(String, String)> = (0..500)
        .map(|i| (format!("tidepoolit:page:{}", i), "v".to_string()))
        .collect();
    kv.batch_set_text(entries.clone(), None).await.unwrap();

    let removed = kv.delete_by_pattern_paged("tidepoolit:page:*", 50).await.unwrap();
    assert_eq!(removed, 500);
    for (key, _) in &entries {
        assert!(!kv.exists(key).await.unwrap());
    }
    kv.disconnect().await.unwrap();
}
