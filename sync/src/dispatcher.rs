//! Routes raw logs to the handler registered for their source address.

use std::collections::HashMap;
use std::sync::Arc;

use quill_chain::{ContractAbis, ContractRegistry};
use quill_store::LedgerTxn;
use quill_types::{Address, RawLogEntry};

use crate::handlers::handler_for;
use crate::{ApplyContext, EventHandler, HandlerOutcome, SyncError};

pub struct Dispatcher {
    abis: Arc<ContractAbis>,
    handlers: HashMap<Address, Box<dyn EventHandler>>,
}

impl Dispatcher {
    /// An empty dispatcher; see [`Dispatcher::from_registry`].
    pub fn new(abis: Arc<ContractAbis>) -> Self {
        Self {
            abis,
            handlers: HashMap::new(),
        }
    }

    /// Register the built-in handler for every synced contract in `registry`.
    pub fn from_registry(registry: &ContractRegistry, abis: Arc<ContractAbis>) -> Self {
        let mut dispatcher = Self::new(abis);
        for address in registry.synced_addresses() {
            let handler = registry.kind_of(&address).ok().and_then(handler_for);
            if let Some(handler) = handler {
                dispatcher.register(address, handler);
            }
        }
        dispatcher
    }

    pub fn register(&mut self, address: Address, handler: Box<dyn EventHandler>) {
        tracing::debug!(kind = %handler.kind(), ?address, "event handler registered");
        self.handlers.insert(address, handler);
    }

    /// Every address with a handler, sorted.
    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<_> = self.handlers.keys().copied().collect();
        addresses.sort();
        addresses
    }

    /// Decode `log` and apply it inside `txn`.
    pub fn dispatch(
        &self,
        txn: &mut dyn LedgerTxn,
        log: &RawLogEntry,
        ctx: &ApplyContext,
    ) -> Result<HandlerOutcome, SyncError> {
        let handler = self
            .handlers
            .get(&log.address)
            .ok_or(SyncError::UnknownSource(log.address))?;
        let event = self.abis.get(handler.kind())?.decode(log)?;
        tracing::debug!(
            block = log.block_number,
            kind = %handler.kind(),
            event = event.name(),
            "applying event"
        );
        handler.handle(txn, event, ctx)
    }
}
