use std::collections::HashMap;

use bytes::Bytes;
use thiserror::Error;

use crate::{commands::CommandHandler, resp::RespValue};

#[derive(Error, Debug, PartialEq)]
pub enum StateError {
    #[error("MULTI calls can not be nested")]
    NestedTransaction,
    #[error("no transaction in progress")]
    NoTransaction,
}

impl StateError {
    pub fn as_bytes(&self) -> Bytes {
        match self {
            StateError::NestedTransaction => {
                RespValue::Error("ERR MULTI calls can not be nested".to_string()).encode()
            }
            StateError::NoTransaction => {
                RespValue::Error("ERR no transaction in progress".to_string()).encode()
            }
        }
    }
}

/// Per-client connection state shared by every connection of the server.
#[derive(Debug, Default)]
pub struct State {
    /// Commands queued by clients between MULTI and EXEC, keyed by client address.
    transactions: HashMap<String, Vec<CommandHandler>>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_transaction(&mut self, client_address: String) -> Result<(), StateError> {
        if self.transactions.contains_key(&client_address) {
            return Err(StateError::NestedTransaction);
        }

        self.transactions.insert(client_address, Vec::new());
        Ok(())
    }

    pub fn get_transaction(&self, client_address: &str) -> Option<&Vec<CommandHandler>> {
        self.transactions.get(client_address)
    }

    pub fn add_to_transaction(
        &mut self,
        client_address: &str,
        command: CommandHandler,
    ) -> Result<(), StateError> {
        let Some(transaction) = self.transactions.get_mut(client_address) else {
            return Err(StateError::NoTransaction);
        };

        transaction.push(command);
        Ok(())
    }

    pub fn remove_transaction(
        &mut self,
        client_address: &str,
    ) -> Result<Vec<CommandHandler>, StateError> {
        self.transactions
            .remove(client_address)
            .ok_or(StateError::NoTransaction)
    }
}
