//! The command dispatcher.
//!
//! [`Database`] owns the live store, the per-client transaction state and, when
//! persistence is enabled, the append-only file. A command is executed and its log
//! records are queued while the store lock is held, so the log order always matches
//! the order in which commands took effect.

use std::sync::{Arc, Mutex as StdMutex};

use bytes::{BufMut, Bytes, BytesMut};
use tokio::{
    sync::{Mutex, MutexGuard},
    task::JoinHandle,
};
use tracing::{info, warn};

use crate::{
    aof::{spawn_rewrite_policy, Aof, AofError, CommandRecord},
    commands::{
        bgrewriteaof, config_get, discard, exec, multi, CommandError, CommandHandler, CommandKind,
    },
    config::ServerConfig,
    key_value_store::KeyValueStore,
    resp::RespValue,
    state::State,
};

#[derive(Debug)]
pub struct Database {
    store: Mutex<KeyValueStore>,
    state: Mutex<State>,
    aof: Option<Arc<Aof>>,
    config: ServerConfig,
    rewrite_policy: StdMutex<Option<JoinHandle<()>>>,
}

impl Database {
    /// Builds the database described by `config`, replaying the append-only file first
    /// when persistence is enabled.
    pub async fn open(config: ServerConfig) -> Result<Self, AofError> {
        let mut store = KeyValueStore::new();
        let mut rewrite_policy = None;

        let aof = match config.aof_config() {
            Some(aof_config) => {
                let aof = Arc::new(Aof::open(&aof_config).await?);
                let stats = aof.load_into(&mut store).await?;
                info!(
                    keys = store.len(),
                    records = stats.records,
                    "restored state from the append-only file"
                );

                rewrite_policy =
                    spawn_rewrite_policy(Arc::clone(&aof), aof_config.rewrite_policy.clone());
                Some(aof)
            }
            None => None,
        };

        Ok(Self {
            store: Mutex::new(store),
            state: Mutex::new(State::new()),
            aof,
            config,
            rewrite_policy: StdMutex::new(rewrite_policy),
        })
    }

    /// A database without persistence.
    pub fn in_memory() -> Self {
        Self {
            store: Mutex::new(KeyValueStore::new()),
            state: Mutex::new(State::new()),
            aof: None,
            config: ServerConfig::default(),
            rewrite_policy: StdMutex::new(None),
        }
    }

    pub fn aof(&self) -> Option<&Arc<Aof>> {
        self.aof.as_ref()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub async fn store(&self) -> MutexGuard<'_, KeyValueStore> {
        self.store.lock().await
    }

    /// Executes one client command and returns the RESP-encoded reply.
    pub async fn exec(&self, client_address: &str, input: RespValue) -> Bytes {
        let handler = match CommandHandler::new(input) {
            Ok(handler) => handler,
            Err(err) => return err.as_bytes(),
        };

        if let Some(response) = self.queue_if_in_transaction(client_address, &handler).await {
            return response;
        }

        let result = match handler.kind {
            CommandKind::Multi => {
                let mut state = self.state.lock().await;
                multi(client_address, &mut state, handler.arguments)
            }
            CommandKind::Discard => {
                let mut state = self.state.lock().await;
                discard(client_address, &mut state, handler.arguments)
            }
            CommandKind::Exec => {
                let commands = {
                    let mut state = self.state.lock().await;
                    exec(client_address, &mut state, handler.arguments)
                };

                match commands {
                    Ok(commands) => Ok(self.run_transaction(commands).await),
                    Err(err) => Err(err),
                }
            }
            _ => {
                let mut store = self.store.lock().await;
                Ok(self.run(&mut store, &handler).await)
            }
        };

        result.unwrap_or_else(|err| err.as_bytes())
    }

    /// Forgets any transaction left open by a disconnected client.
    pub async fn drop_client(&self, client_address: &str) {
        let mut state = self.state.lock().await;
        let _ = state.remove_transaction(client_address);
    }

    /// Stops the rewrite policy and closes the append-only file after draining it.
    pub async fn shutdown(&self) {
        let policy = self.rewrite_policy.lock().ok().and_then(|mut slot| slot.take());
        if let Some(policy) = policy {
            policy.abort();
        }

        if let Some(aof) = &self.aof {
            if let Err(err) = aof.shutdown().await {
                warn!(error = %err, "failed to close the append-only file");
            }
        }
    }

    async fn queue_if_in_transaction(
        &self,
        client_address: &str,
        handler: &CommandHandler,
    ) -> Option<Bytes> {
        if matches!(
            handler.kind,
            CommandKind::Multi | CommandKind::Exec | CommandKind::Discard
        ) {
            return None;
        }

        let mut state = self.state.lock().await;
        state.get_transaction(client_address)?;

        if let Some(err) = handler.validate_command_arguments() {
            return Some(err.as_bytes());
        }

        let response = match state.add_to_transaction(client_address, handler.clone()) {
            Ok(()) => RespValue::SimpleString("QUEUED".to_string()).encode(),
            Err(err) => CommandError::from(err).as_bytes(),
        };

        Some(response)
    }

    /// Runs queued commands back to back under one store lock.
    async fn run_transaction(&self, commands: Vec<CommandHandler>) -> Bytes {
        let mut store = self.store.lock().await;

        let mut responses = BytesMut::new();
        responses.put_slice(format!("*{}\r\n", commands.len()).as_bytes());

        for command in commands {
            responses.put_slice(&self.run(&mut store, &command).await);
        }

        responses.freeze()
    }

    /// Executes `handler` and queues its records, lazy deletions first.
    async fn run(&self, store: &mut KeyValueStore, handler: &CommandHandler) -> Bytes {
        let result = match handler.kind {
            CommandKind::BgRewriteAof => {
                return bgrewriteaof(self.aof.as_ref(), handler.arguments.clone())
                    .unwrap_or_else(|err| err.as_bytes());
            }
            CommandKind::ConfigGet => {
                return config_get(&self.config.parameters(), handler.arguments.clone())
                    .unwrap_or_else(|err| err.as_bytes());
            }
            _ => handler.execute(store),
        };

        let mut records = Vec::new();
        let expired = store.take_expired();
        if !expired.is_empty() {
            records.push(CommandRecord::del(expired));
        }

        let response = match result {
            Ok(output) => {
                records.extend(output.aof_records);
                output.response
            }
            Err(err) => err.as_bytes(),
        };

        self.append(records).await;
        response
    }

    async fn append(&self, records: Vec<CommandRecord>) {
        let Some(aof) = &self.aof else {
            return;
        };

        for record in records {
            if let Err(err) = aof.append(record).await {
                warn!(error = %err, "failed to queue record for the append-only file");
            }
        }
    }
}
