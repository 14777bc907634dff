use redis_aof::database::Database;

use crate::test_utils::TestUtils;

async fn run_cases(database: &Database, client_address: &str, test_cases: Vec<(Vec<&str>, String)>) {
    for (input, expected) in test_cases {
        assert_eq!(
            database
                .exec(client_address, TestUtils::command(&input))
                .await,
            expected,
            "executing {:?}",
            input
        );
    }
}

#[tokio::test]
async fn test_string_commands() {
    let database = Database::in_memory();
    let client = TestUtils::client_address(41844);

    let test_cases = vec![
        (vec!["SET", "grape", "mango"], TestUtils::expected_simple_string("OK")),
        (vec!["GET", "grape"], TestUtils::expected_bulk_string("mango")),
        (vec!["GET", "apple"], TestUtils::expected_null()),
        (vec!["INCR", "counter"], TestUtils::expected_integer(1)),
        (vec!["INCRBY", "counter", "10"], TestUtils::expected_integer(11)),
        (vec!["DECR", "counter"], TestUtils::expected_integer(10)),
        (vec!["DECRBY", "counter", "4"], TestUtils::expected_integer(6)),
        (
            vec!["INCR", "grape"],
            "-ERR value is not an integer or out of range\r\n".to_string(),
        ),
        (vec!["EXISTS", "grape", "counter", "apple"], TestUtils::expected_integer(2)),
        (vec!["TYPE", "grape"], TestUtils::expected_simple_string("string")),
        (vec!["TYPE", "apple"], TestUtils::expected_simple_string("none")),
        (vec!["DEL", "grape", "apple"], TestUtils::expected_integer(1)),
        (vec!["GET", "grape"], TestUtils::expected_null()),
        (vec!["ECHO", "hey"], TestUtils::expected_bulk_string("hey")),
        (vec!["PING"], TestUtils::expected_simple_string("PONG")),
        (
            vec!["GET"],
            "-ERR wrong number of arguments for 'get' command\r\n".to_string(),
        ),
    ];

    run_cases(&database, &client, test_cases).await;
}

#[tokio::test]
async fn test_list_commands() {
    let database = Database::in_memory();
    let client = TestUtils::client_address(41845);

    let test_cases = vec![
        (vec!["RPUSH", "fruits", "apple", "pear"], TestUtils::expected_integer(2)),
        (vec!["LPUSH", "fruits", "grape"], TestUtils::expected_integer(3)),
        (
            vec!["LRANGE", "fruits", "0", "-1"],
            TestUtils::expected_bulk_string_array(&["grape", "apple", "pear"]),
        ),
        (vec!["LLEN", "fruits"], TestUtils::expected_integer(3)),
        (vec!["TYPE", "fruits"], TestUtils::expected_simple_string("list")),
        (vec!["LPOP", "fruits"], TestUtils::expected_bulk_string("grape")),
        (
            vec!["LPOP", "fruits", "5"],
            TestUtils::expected_bulk_string_array(&["apple", "pear"]),
        ),
        (vec!["EXISTS", "fruits"], TestUtils::expected_integer(0)),
        (vec!["LPOP", "fruits"], TestUtils::expected_null()),
        (vec!["LPOP", "fruits", "2"], "*-1\r\n".to_string()),
        (vec!["SET", "grape", "mango"], TestUtils::expected_simple_string("OK")),
        (
            vec!["RPUSH", "grape", "apple"],
            "-WRONGTYPE Operation against a key holding the wrong kind of value\r\n".to_string(),
        ),
    ];

    run_cases(&database, &client, test_cases).await;
}

#[tokio::test]
async fn test_expiration_commands() {
    let database = Database::in_memory();
    let client = TestUtils::client_address(41846);

    let test_cases = vec![
        (vec!["SET", "grape", "mango"], TestUtils::expected_simple_string("OK")),
        (vec!["TTL", "grape"], TestUtils::expected_integer(-1)),
        (vec!["TTL", "apple"], TestUtils::expected_integer(-2)),
        (vec!["EXPIRE", "grape", "100"], TestUtils::expected_integer(1)),
        (vec!["TTL", "grape"], TestUtils::expected_integer(100)),
        (vec!["EXPIRE", "grape", "200", "NX"], TestUtils::expected_integer(0)),
        (vec!["EXPIRE", "grape", "50", "GT"], TestUtils::expected_integer(0)),
        (vec!["EXPIRE", "apple", "100"], TestUtils::expected_integer(0)),
        (vec!["PERSIST", "grape"], TestUtils::expected_integer(1)),
        (vec!["PERSIST", "grape"], TestUtils::expected_integer(0)),
        (vec!["EXPIRE", "grape", "-1"], TestUtils::expected_integer(1)),
        (vec!["GET", "grape"], TestUtils::expected_null()),
    ];

    run_cases(&database, &client, test_cases).await;
}

#[tokio::test]
async fn test_expired_key_is_gone() {
    let database = Database::in_memory();
    let client = TestUtils::client_address(41847);

    let test_cases = vec![
        (
            vec!["SET", "grape", "mango", "PX", "50"],
            TestUtils::expected_simple_string("OK"),
        ),
        (vec!["SET", "apple", "pear"], TestUtils::expected_simple_string("OK")),
    ];
    run_cases(&database, &client, test_cases).await;

    TestUtils::sleep_ms(100).await;

    let test_cases = vec![
        (vec!["KEYS", "*"], TestUtils::expected_bulk_string_array(&["apple"])),
        (vec!["DBSIZE"], TestUtils::expected_integer(1)),
        (vec!["GET", "grape"], TestUtils::expected_null()),
        (vec!["TTL", "grape"], TestUtils::expected_integer(-2)),
    ];
    run_cases(&database, &client, test_cases).await;
}

#[tokio::test]
async fn test_keys_and_flushall() {
    let database = Database::in_memory();
    let client = TestUtils::client_address(41848);

    let test_cases = vec![
        (vec!["SET", "user:2", "b"], TestUtils::expected_simple_string("OK")),
        (vec!["SET", "user:1", "a"], TestUtils::expected_simple_string("OK")),
        (vec!["RPUSH", "queue", "job"], TestUtils::expected_integer(1)),
        (
            vec!["KEYS", "user:*"],
            TestUtils::expected_bulk_string_array(&["user:1", "user:2"]),
        ),
        (
            vec!["KEYS", "*"],
            TestUtils::expected_bulk_string_array(&["queue", "user:1", "user:2"]),
        ),
        (vec!["DBSIZE"], TestUtils::expected_integer(3)),
        (vec!["FLUSHALL"], TestUtils::expected_simple_string("OK")),
        (vec!["DBSIZE"], TestUtils::expected_integer(0)),
    ];

    run_cases(&database, &client, test_cases).await;
}

#[tokio::test]
async fn test_transactions() {
    let database = Database::in_memory();
    let client = TestUtils::client_address(41849);

    let test_cases = vec![
        (vec!["MULTI"], TestUtils::expected_simple_string("OK")),
        (
            vec!["MULTI"],
            "-ERR MULTI calls can not be nested\r\n".to_string(),
        ),
        (vec!["SET", "grape", "mango"], TestUtils::expected_simple_string("QUEUED")),
        (
            vec!["SET", "grape"],
            "-ERR wrong number of arguments for 'set' command\r\n".to_string(),
        ),
        (vec!["GET", "grape"], TestUtils::expected_simple_string("QUEUED")),
        (vec!["INCR", "grape"], TestUtils::expected_simple_string("QUEUED")),
        (
            vec!["EXEC"],
            format!(
                "*3\r\n{}{}{}",
                TestUtils::expected_simple_string("OK"),
                TestUtils::expected_bulk_string("mango"),
                "-ERR value is not an integer or out of range\r\n"
            ),
        ),
        (vec!["MULTI"], TestUtils::expected_simple_string("OK")),
        (vec!["DEL", "grape"], TestUtils::expected_simple_string("QUEUED")),
        (vec!["DISCARD"], TestUtils::expected_simple_string("OK")),
        (vec!["GET", "grape"], TestUtils::expected_bulk_string("mango")),
        (vec!["DISCARD"], "-ERR DISCARD without MULTI\r\n".to_string()),
        (vec!["MULTI"], TestUtils::expected_simple_string("OK")),
        (vec!["EXEC"], "*0\r\n".to_string()),
    ];

    run_cases(&database, &client, test_cases).await;
}
