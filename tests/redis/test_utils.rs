use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use bytes::{Bytes, BytesMut};
use redis_aof::{
    aof::{load, CommandRecord},
    config::ServerConfig,
    database::Database,
    key_value_store::KeyValueStore,
    resp::RespValue,
};
use tempfile::TempDir;

/// Test utilities for simplifying Redis command tests
pub struct TestUtils;

/// Test environment: a database persisting into a private temporary directory
pub struct TestEnv {
    pub dir: TempDir,
    pub database: Arc<Database>,
}

impl TestEnv {
    /// Create a database with the append-only file enabled and automatic rewrites off
    pub async fn with_aof() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let database = Database::open(TestUtils::aof_config(dir.path()))
            .await
            .unwrap();

        Self {
            dir,
            database: Arc::new(database),
        }
    }

    pub fn config(&self) -> ServerConfig {
        TestUtils::aof_config(self.dir.path())
    }

    pub fn aof_path(&self) -> PathBuf {
        self.config().aof_path()
    }

    /// Execute a command and return the raw RESP reply
    pub async fn exec(&self, command: RespValue, client_address: &str) -> Bytes {
        self.database.exec(client_address, command).await
    }

    /// Execute a command and assert the reply
    pub async fn exec_command_success_response(
        &self,
        command: RespValue,
        client_address: &str,
        expected_response: &str,
    ) {
        assert_eq!(
            self.exec(command.clone(), client_address).await,
            expected_response,
            "executing {:?}",
            command
        );
    }

    /// Wait until every record queued so far is in the file
    pub async fn flush(&self) {
        self.database.aof().unwrap().flush().await.unwrap();
    }

    /// Close the database and open a new one on the same log, like a server restart
    pub async fn restart(self) -> Self {
        self.database.shutdown().await;
        let database = Database::open(self.config()).await.unwrap();

        Self {
            dir: self.dir,
            database: Arc::new(database),
        }
    }

    pub async fn log_records(&self) -> Vec<CommandRecord> {
        TestUtils::read_records(&self.aof_path()).await
    }

    /// Replay the log into a brand new store
    pub async fn replay_log(&self) -> KeyValueStore {
        let mut store = KeyValueStore::new();
        load(&mut store, &self.aof_path(), None).await.unwrap();
        store
    }
}

impl TestUtils {
    pub fn aof_config(dir: &Path) -> ServerConfig {
        ServerConfig {
            dir: dir.to_path_buf(),
            appendonly: true,
            auto_aof_rewrite_percentage: 0,
            ..ServerConfig::default()
        }
    }

    /// Decode every record of the log at `path`, asserting it ends on a record boundary
    pub async fn read_records(path: &Path) -> Vec<CommandRecord> {
        let bytes = tokio::fs::read(path).await.unwrap();
        let mut buffer = BytesMut::from(&bytes[..]);

        let mut records = Vec::new();
        while let Some(record) = CommandRecord::decode(&mut buffer).unwrap() {
            records.push(record);
        }
        assert!(buffer.is_empty(), "log ends with a partial record");

        records
    }

    /// Create a command from its parts
    pub fn command(parts: &[&str]) -> RespValue {
        RespValue::Array(
            parts
                .iter()
                .map(|part| RespValue::bulk_string(part))
                .collect(),
        )
    }

    /// Create a command whose parts are arbitrary bytes
    pub fn command_bytes(parts: &[&[u8]]) -> RespValue {
        RespValue::Array(
            parts
                .iter()
                .map(|part| RespValue::bulk_string(part))
                .collect(),
        )
    }

    /// Create a SET command
    pub fn set_command(key: &str, value: &str) -> RespValue {
        Self::command(&["SET", key, value])
    }

    /// Create a SET command expiring after `seconds`
    pub fn set_command_with_expiration(key: &str, value: &str, seconds: u64) -> RespValue {
        Self::command(&["SET", key, value, "EX", &seconds.to_string()])
    }

    /// Create a GET command
    pub fn get_command(key: &str) -> RespValue {
        Self::command(&["GET", key])
    }

    /// Create an INCR command
    pub fn incr_command(key: &str) -> RespValue {
        Self::command(&["INCR", key])
    }

    /// Create an RPUSH command with multiple values
    pub fn rpush_command(key: &str, values: &[&str]) -> RespValue {
        let mut parts = vec!["RPUSH", key];
        parts.extend_from_slice(values);
        Self::command(&parts)
    }

    /// Create an LRANGE command
    pub fn lrange_command(key: &str, start: i32, stop: i32) -> RespValue {
        Self::command(&["LRANGE", key, &start.to_string(), &stop.to_string()])
    }

    /// Create a MULTI command
    pub fn multi_command() -> RespValue {
        Self::command(&["MULTI"])
    }

    /// Create an EXEC command
    pub fn exec_command() -> RespValue {
        Self::command(&["EXEC"])
    }

    /// Create a DISCARD command
    pub fn discard_command() -> RespValue {
        Self::command(&["DISCARD"])
    }

    /// Create a BGREWRITEAOF command
    pub fn bgrewriteaof_command() -> RespValue {
        Self::command(&["BGREWRITEAOF"])
    }

    /// Generate a unique client address for testing
    pub fn client_address(port: u16) -> String {
        format!("127.0.0.1:{}", port)
    }

    /// Create expected bulk string response
    pub fn expected_bulk_string(value: &str) -> String {
        format!("${}\r\n{}\r\n", value.len(), value)
    }

    /// Create expected integer response
    pub fn expected_integer(value: i64) -> String {
        format!(":{}\r\n", value)
    }

    /// Create expected simple string response
    pub fn expected_simple_string(value: &str) -> String {
        format!("+{}\r\n", value)
    }

    /// Create expected null response
    pub fn expected_null() -> String {
        "$-1\r\n".to_string()
    }

    /// Create expected bulk string array response
    pub fn expected_bulk_string_array(items: &[&str]) -> String {
        let mut response = format!("*{}\r\n", items.len());
        for item in items {
            response.push_str(&format!("${}\r\n{}\r\n", item.len(), item));
        }
        response
    }

    /// Async sleep helper
    pub async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
