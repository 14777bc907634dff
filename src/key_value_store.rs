use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use jiff::Timestamp;

#[derive(Debug, PartialEq, Clone)]
pub enum DataType {
    String(Bytes),
    Array(VecDeque<Bytes>),
}

impl DataType {
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::Array(_) => "list",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Value {
    pub data: DataType,
    /// Absolute instant after which the key no longer exists.
    pub expiration: Option<Timestamp>,
}

impl Value {
    pub fn new(data: DataType) -> Self {
        Self {
            data,
            expiration: None,
        }
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        matches!(self.expiration, Some(expiration) if expiration <= now)
    }
}

/// In-memory keyspace.
///
/// Expired keys are removed lazily when they are looked up. Every lazy removal is
/// remembered until [`KeyValueStore::take_expired`] drains it, so the caller can log
/// an explicit `DEL` and keep replay independent of wall-clock time.
///
/// A store created with [`KeyValueStore::for_replay`] never expires keys on access:
/// it is rebuilding state from a log that already carries every deletion.
#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: HashMap<Bytes, Value>,
    replaying: bool,
    expired: Vec<Bytes>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_replay() -> Self {
        Self {
            replaying: true,
            ..Self::default()
        }
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn set_replaying(&mut self, replaying: bool) {
        self.replaying = replaying;
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    fn expire_if_needed(&mut self, key: &[u8]) {
        if self.replaying {
            return;
        }

        let now = self.now();
        if self
            .entries
            .get(key)
            .is_some_and(|value| value.is_expired_at(now))
        {
            if let Some((key, _)) = self.entries.remove_entry(key) {
                self.expired.push(key);
            }
        }
    }

    pub fn get(&mut self, key: &[u8]) -> Option<&Value> {
        self.expire_if_needed(key);
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Value> {
        self.expire_if_needed(key);
        self.entries.get_mut(key)
    }

    pub fn contains_key(&mut self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: Bytes, value: Value) -> Option<Value> {
        self.entries.insert(key, value)
    }

    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.expire_if_needed(key);
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored keys, including expired keys not yet collected.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys that are still alive, in no particular order.
    pub fn live_keys(&self) -> Vec<Bytes> {
        let now = self.now();
        self.entries
            .iter()
            .filter(|(_, value)| self.replaying || !value.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Visits every entry until `visit` returns `false`.
    pub fn for_each_key<F>(&self, mut visit: F)
    where
        F: FnMut(&Bytes, &Value) -> bool,
    {
        for (key, value) in &self.entries {
            if !visit(key, value) {
                break;
            }
        }
    }

    /// Visits every key carrying an expiration until `visit` returns `false`.
    pub fn for_each_expiration<F>(&self, mut visit: F)
    where
        F: FnMut(&Bytes, Timestamp) -> bool,
    {
        for (key, value) in &self.entries {
            if let Some(expiration) = value.expiration {
                if !visit(key, expiration) {
                    break;
                }
            }
        }
    }

    /// Returns the keys removed by lazy expiration since the previous call.
    pub fn take_expired(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.expired)
    }
}
