use bytes::Bytes;
use redis_aof::{
    aof::CommandRecord,
    database::Database,
    key_value_store::{DataType, KeyValueStore},
};

use crate::test_utils::{TestEnv, TestUtils};

fn string_value(store: &mut KeyValueStore, key: &str) -> Option<Bytes> {
    match store.get(key.as_bytes()).map(|value| value.data.clone()) {
        Some(DataType::String(s)) => Some(s),
        _ => None,
    }
}

#[tokio::test]
async fn test_writes_are_logged_as_records() {
    let env = TestEnv::with_aof().await;
    let client = TestUtils::client_address(42000);

    env.exec(TestUtils::set_command("grape", "mango"), &client).await;
    env.exec(TestUtils::set_command_with_expiration("apple", "pear", 100), &client)
        .await;
    env.exec(TestUtils::get_command("grape"), &client).await;
    env.exec(TestUtils::rpush_command("fruits", &["kiwi", "lime"]), &client)
        .await;
    env.exec(TestUtils::command(&["DEL", "grape", "missing"]), &client)
        .await;
    env.exec(TestUtils::command(&["LPOP", "missing"]), &client).await;
    env.exec(TestUtils::command(&["SET", "grape"]), &client).await;
    env.flush().await;

    let records = env.log_records().await;
    assert_eq!(records.len(), 5, "records: {:?}", records);
    assert_eq!(records[0], CommandRecord::new("SET", ["grape", "mango"]));
    assert_eq!(records[1], CommandRecord::new("SET", ["apple", "pear"]));
    assert_eq!(records[2].name, "PEXPIREAT");
    assert_eq!(records[2].arguments[0], "apple");
    assert_eq!(
        records[3],
        CommandRecord::new("RPUSH", ["fruits", "kiwi", "lime"])
    );
    assert_eq!(records[4], CommandRecord::new("DEL", ["grape"]));
}

#[tokio::test]
async fn test_relative_expiration_is_logged_as_absolute() {
    let env = TestEnv::with_aof().await;
    let client = TestUtils::client_address(42001);

    let before = jiff::Timestamp::now().as_millisecond();
    env.exec(TestUtils::set_command("grape", "mango"), &client).await;
    env.exec(TestUtils::command(&["EXPIRE", "grape", "100"]), &client)
        .await;
    env.exec(TestUtils::command(&["PEXPIRE", "grape", "200000"]), &client)
        .await;
    let after = jiff::Timestamp::now().as_millisecond();
    env.flush().await;

    let records = env.log_records().await;
    let deadlines: Vec<i64> = records
        .iter()
        .filter(|record| record.name == "PEXPIREAT")
        .map(|record| std::str::from_utf8(&record.arguments[1]).unwrap().parse().unwrap())
        .collect();

    assert_eq!(deadlines.len(), 2);
    assert!(deadlines[0] >= before + 100_000 && deadlines[0] <= after + 100_000);
    assert!(deadlines[1] >= before + 200_000 && deadlines[1] <= after + 200_000);
}

#[tokio::test]
async fn test_lazy_expiration_is_logged_as_del() {
    let env = TestEnv::with_aof().await;
    let client = TestUtils::client_address(42002);

    env.exec(TestUtils::command(&["SET", "grape", "mango", "PX", "30"]), &client)
        .await;
    TestUtils::sleep_ms(80).await;
    env.exec_command_success_response(
        TestUtils::command(&["INCR", "grape"]),
        &client,
        &TestUtils::expected_integer(1),
    )
    .await;
    env.flush().await;

    let records = env.log_records().await;
    let names: Vec<&str> = records.iter().map(|record| record.name.as_str()).collect();
    assert_eq!(names, vec!["SET", "PEXPIREAT", "DEL", "INCR"]);
    assert_eq!(records[2], CommandRecord::new("DEL", ["grape"]));

    let mut store = env.replay_log().await;
    assert_eq!(string_value(&mut store, "grape"), Some(Bytes::from("1")));
}

#[tokio::test]
async fn test_restart_restores_state() {
    let env = TestEnv::with_aof().await;
    let client = TestUtils::client_address(42003);

    let commands = vec![
        TestUtils::set_command("grape", "mango"),
        TestUtils::set_command_with_expiration("apple", "pear", 100),
        TestUtils::incr_command("counter"),
        TestUtils::incr_command("counter"),
        TestUtils::rpush_command("fruits", &["kiwi", "lime", "plum"]),
        TestUtils::command(&["LPOP", "fruits"]),
        TestUtils::set_command("doomed", "soon"),
        TestUtils::command(&["DEL", "doomed"]),
    ];
    for command in commands {
        env.exec(command, &client).await;
    }

    let env = env.restart().await;

    let test_cases = vec![
        (
            TestUtils::get_command("grape"),
            TestUtils::expected_bulk_string("mango"),
        ),
        (
            TestUtils::get_command("apple"),
            TestUtils::expected_bulk_string("pear"),
        ),
        (
            TestUtils::command(&["TTL", "apple"]),
            TestUtils::expected_integer(100),
        ),
        (
            TestUtils::get_command("counter"),
            TestUtils::expected_bulk_string("2"),
        ),
        (
            TestUtils::lrange_command("fruits", 0, -1),
            TestUtils::expected_bulk_string_array(&["lime", "plum"]),
        ),
        (TestUtils::get_command("doomed"), TestUtils::expected_null()),
    ];

    for (command, expected) in test_cases {
        env.exec_command_success_response(command, &client, &expected)
            .await;
    }
}

#[tokio::test]
async fn test_transaction_records_are_logged() {
    let env = TestEnv::with_aof().await;
    let client = TestUtils::client_address(42004);

    env.exec(TestUtils::multi_command(), &client).await;
    env.exec(TestUtils::set_command("grape", "mango"), &client).await;
    env.exec(TestUtils::incr_command("counter"), &client).await;
    env.exec(TestUtils::exec_command(), &client).await;

    env.exec(TestUtils::multi_command(), &client).await;
    env.exec(TestUtils::set_command("apple", "pear"), &client).await;
    env.exec(TestUtils::discard_command(), &client).await;
    env.flush().await;

    assert_eq!(
        env.log_records().await,
        vec![
            CommandRecord::new("SET", ["grape", "mango"]),
            CommandRecord::new("INCR", ["counter"]),
        ]
    );
}

#[tokio::test]
async fn test_malformed_tail_is_ignored_and_cut() {
    let dir = tempfile::tempdir().unwrap();
    let config = TestUtils::aof_config(dir.path());

    let mut contents = Vec::new();
    contents.extend_from_slice(&CommandRecord::new("SET", ["grape", "mango"]).encode());
    contents.extend_from_slice(&CommandRecord::new("RPUSH", ["fruits", "kiwi"]).encode());
    contents.extend_from_slice(b"*3\r\n$3\r\nSET\r\n$5\r\napple\r\n$4\r\npe");
    tokio::fs::write(config.aof_path(), &contents).await.unwrap();

    let env = TestEnv {
        database: std::sync::Arc::new(Database::open(config).await.unwrap()),
        dir,
    };
    let client = TestUtils::client_address(42005);

    let test_cases = vec![
        (
            TestUtils::get_command("grape"),
            TestUtils::expected_bulk_string("mango"),
        ),
        (
            TestUtils::lrange_command("fruits", 0, -1),
            TestUtils::expected_bulk_string_array(&["kiwi"]),
        ),
        (TestUtils::get_command("apple"), TestUtils::expected_null()),
        (
            TestUtils::set_command("lemon", "lime"),
            TestUtils::expected_simple_string("OK"),
        ),
    ];
    for (command, expected) in test_cases {
        env.exec_command_success_response(command, &client, &expected)
            .await;
    }
    env.flush().await;

    assert_eq!(
        env.log_records().await,
        vec![
            CommandRecord::new("SET", ["grape", "mango"]),
            CommandRecord::new("RPUSH", ["fruits", "kiwi"]),
            CommandRecord::new("SET", ["lemon", "lime"]),
        ]
    );
}

#[tokio::test]
async fn test_corrupt_length_mid_file_keeps_later_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = TestUtils::aof_config(dir.path());

    let mut contents = Vec::new();
    contents.extend_from_slice(&CommandRecord::new("SET", ["grape", "mango"]).encode());
    contents.extend_from_slice(b"*2\r\n$3\r\nGET\r\n$999999999\r\nshort\r\n");
    contents.extend_from_slice(b"*2\r\n$3\r\nGET\r\n$500\r\nshort\r\n");
    contents.extend_from_slice(&CommandRecord::new("SET", ["apple", "pear"]).encode());
    tokio::fs::write(config.aof_path(), &contents).await.unwrap();

    let database = Database::open(config.clone()).await.unwrap();
    let client = TestUtils::client_address(42009);

    assert_eq!(
        database
            .exec(&client, TestUtils::get_command("apple"))
            .await,
        TestUtils::expected_bulk_string("pear")
    );
    assert_eq!(
        database
            .exec(&client, TestUtils::get_command("grape"))
            .await,
        TestUtils::expected_bulk_string("mango")
    );
    database.shutdown().await;

    let on_disk = tokio::fs::read(config.aof_path()).await.unwrap();
    assert_eq!(on_disk, contents);
}

#[tokio::test]
async fn test_binary_values_survive_restart() {
    let env = TestEnv::with_aof().await;
    let client = TestUtils::client_address(42010);
    let value: &[u8] = b"\xff\xfe\r\n\x00";

    env.exec_command_success_response(
        TestUtils::command_bytes(&[b"SET", b"k", value]),
        &client,
        "+OK\r\n",
    )
    .await;
    env.exec_command_success_response(
        TestUtils::command_bytes(&[b"RPUSH", b"\x80list", value, b"plain"]),
        &client,
        ":2\r\n",
    )
    .await;
    env.flush().await;

    assert_eq!(
        env.log_records().await[0],
        CommandRecord::new("SET", [Bytes::from("k"), Bytes::copy_from_slice(value)])
    );

    let env = env.restart().await;
    let mut expected = b"$5\r\n".to_vec();
    expected.extend_from_slice(value);
    expected.extend_from_slice(b"\r\n");

    assert_eq!(env.exec(TestUtils::get_command("k"), &client).await, expected);
    assert_eq!(
        env.exec(
            TestUtils::command_bytes(&[b"LRANGE", b"\x80list", b"0", b"0"]),
            &client
        )
        .await,
        [b"*1\r\n".as_slice(), &expected[..]].concat()
    );
}

#[tokio::test]
async fn test_unknown_and_invalid_records_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let config = TestUtils::aof_config(dir.path());

    let mut contents = Vec::new();
    contents.extend_from_slice(&CommandRecord::new("SET", ["grape", "mango"]).encode());
    contents.extend_from_slice(&CommandRecord::new("FUTURECMD", ["grape"]).encode());
    contents.extend_from_slice(&CommandRecord::new("SET", ["lonely"]).encode());
    contents.extend_from_slice(&CommandRecord::new("INCR", ["grape"]).encode());
    contents.extend_from_slice(&CommandRecord::new("set", ["apple", "pear"]).encode());
    tokio::fs::write(config.aof_path(), &contents).await.unwrap();

    let database = Database::open(config).await.unwrap();
    let client = TestUtils::client_address(42006);

    assert_eq!(
        database
            .exec(&client, TestUtils::get_command("grape"))
            .await,
        TestUtils::expected_bulk_string("mango")
    );
    assert_eq!(
        database
            .exec(&client, TestUtils::get_command("apple"))
            .await,
        TestUtils::expected_bulk_string("pear")
    );
    assert_eq!(
        database.exec(&client, TestUtils::command(&["DBSIZE"])).await,
        TestUtils::expected_integer(2)
    );

    database.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_drains_queue() {
    let env = TestEnv::with_aof().await;
    let client = TestUtils::client_address(42007);

    for i in 0..500 {
        env.exec(TestUtils::set_command(&format!("key:{}", i), "value"), &client)
            .await;
    }
    env.database.shutdown().await;

    let records = env.log_records().await;
    assert_eq!(records.len(), 500);
    assert_eq!(records[499], CommandRecord::new("SET", ["key:499", "value"]));

    let aof = env.database.aof().unwrap();
    assert!(aof.is_closed());
    assert!(aof
        .append(CommandRecord::new("SET", ["late", "value"]))
        .await
        .is_err());
}

#[tokio::test]
async fn test_appendonly_disabled_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = redis_aof::config::ServerConfig {
        dir: dir.path().to_path_buf(),
        ..Default::default()
    };

    let database = Database::open(config.clone()).await.unwrap();
    let client = TestUtils::client_address(42008);
    database
        .exec(&client, TestUtils::set_command("grape", "mango"))
        .await;
    database.shutdown().await;

    assert!(database.aof().is_none());
    assert!(!config.aof_path().exists());
}
