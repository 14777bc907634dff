use std::sync::Arc;

use bytes::Bytes;
use redis_aof::key_value_store::DataType;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_log_order_matches_store_order() {
    let env = TestEnv::with_aof().await;

    let mut tasks = Vec::new();
    for task in 0..8u16 {
        let database = Arc::clone(&env.database);
        tasks.push(tokio::spawn(async move {
            let client = TestUtils::client_address(44000 + task);
            for i in 0..50 {
                let marker = format!("{}:{}", task, i);
                database
                    .exec(&client, TestUtils::rpush_command("markers", &[marker.as_str()]))
                    .await;
                database
                    .exec(&client, TestUtils::set_command("last", &marker))
                    .await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    env.flush().await;

    let (applied, last) = {
        let mut store = env.database.store().await;
        let applied = match store.get(b"markers").map(|value| value.data.clone()) {
            Some(DataType::Array(list)) => list.into_iter().collect::<Vec<Bytes>>(),
            other => panic!("unexpected markers value: {:?}", other),
        };
        let last = match store.get(b"last").map(|value| value.data.clone()) {
            Some(DataType::String(s)) => s,
            other => panic!("unexpected last value: {:?}", other),
        };
        (applied, last)
    };
    assert_eq!(applied.len(), 400);

    let records = env.log_records().await;
    let logged: Vec<Bytes> = records
        .iter()
        .filter(|record| record.name == "RPUSH")
        .map(|record| record.arguments[1].clone())
        .collect();
    assert_eq!(logged, applied);

    let last_logged = records
        .iter()
        .filter(|record| record.name == "SET")
        .last()
        .map(|record| record.arguments[1].clone());
    assert_eq!(last_logged, Some(last));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_small_queue_applies_backpressure() {
    let dir = tempfile::tempdir().unwrap();
    let config = redis_aof::config::ServerConfig {
        aof_queue_size: 2,
        ..TestUtils::aof_config(dir.path())
    };
    let database = Arc::new(redis_aof::database::Database::open(config.clone()).await.unwrap());

    let mut tasks = Vec::new();
    for task in 0..4u16 {
        let database = Arc::clone(&database);
        tasks.push(tokio::spawn(async move {
            let client = TestUtils::client_address(44100 + task);
            for _ in 0..100 {
                database
                    .exec(&client, TestUtils::incr_command("counter"))
                    .await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    database.shutdown().await;

    let records = TestUtils::read_records(&config.aof_path()).await;
    assert_eq!(records.len(), 400);
    assert!(records.iter().all(|record| record.name == "INCR"));
}
