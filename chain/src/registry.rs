//! Contract kinds and the address table the node syncs from.

use std::collections::HashMap;
use std::fmt;

use ethers::types::Address;

use crate::ChainError;

/// The contracts the node knows how to talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContractKind {
    Metadata,
    Group,
    Token,
    User,
    /// Write-only: the node calls it but never syncs its events.
    Incentives,
}

impl ContractKind {
    pub const ALL: [ContractKind; 5] = [
        ContractKind::Metadata,
        ContractKind::Group,
        ContractKind::Token,
        ContractKind::User,
        ContractKind::Incentives,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::Group => "group",
            Self::Token => "token",
            Self::User => "user",
            Self::Incentives => "incentives",
        }
    }

    /// Whether logs from this contract are part of the sync filter.
    pub fn is_synced(&self) -> bool {
        !matches!(self, Self::Incentives)
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bidirectional map between deployed addresses and contract kinds.
#[derive(Clone, Debug, Default)]
pub struct ContractRegistry {
    by_address: HashMap<Address, ContractKind>,
    by_kind: HashMap<ContractKind, Address>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a deployment. Re-registering a kind replaces its address.
    pub fn register(&mut self, kind: ContractKind, address: Address) {
        if let Some(old) = self.by_kind.insert(kind, address) {
            self.by_address.remove(&old);
        }
        self.by_address.insert(address, kind);
    }

    pub fn with(mut self, kind: ContractKind, address: Address) -> Self {
        self.register(kind, address);
        self
    }

    pub fn kind_of(&self, address: &Address) -> Result<ContractKind, ChainError> {
        self.by_address
            .get(address)
            .copied()
            .ok_or(ChainError::UnknownContract(*address))
    }

    pub fn address_of(&self, kind: ContractKind) -> Option<Address> {
        self.by_kind.get(&kind).copied()
    }

    /// Addresses whose logs the sync driver fetches, in a stable order.
    pub fn synced_addresses(&self) -> Vec<Address> {
        let mut kinds: Vec<_> = self.by_kind.keys().filter(|k| k.is_synced()).copied().collect();
        kinds.sort();
        kinds.into_iter().filter_map(|k| self.address_of(k)).collect()
    }
}
