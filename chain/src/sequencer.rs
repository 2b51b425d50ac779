//! Serialized outbound transaction submission.

use std::sync::Arc;

use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{TransactionRequest, H256, U256};
use tokio::sync::Mutex;

use crate::abi::ContractAbis;
use crate::calls::ContractCall;
use crate::client::ChainClient;
use crate::registry::ContractRegistry;
use crate::ChainError;

/// Gas settings for every submitted transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasSettings {
    pub gas_limit: U256,
    pub gas_price: U256,
}

/// Signs and submits contract calls one at a time.
///
/// The last nonce used is kept behind an async lock that is held for the
/// whole query-sign-send sequence, so concurrent callers queue up and never
/// reuse a nonce. The local value only moves after a successful send.
pub struct NonceSequencer {
    client: Arc<dyn ChainClient>,
    wallet: LocalWallet,
    abis: Arc<ContractAbis>,
    registry: ContractRegistry,
    gas: GasSettings,
    last_nonce: Mutex<Option<U256>>,
}

impl NonceSequencer {
    pub fn new(
        client: Arc<dyn ChainClient>,
        wallet: LocalWallet,
        abis: Arc<ContractAbis>,
        registry: ContractRegistry,
        gas: GasSettings,
    ) -> Self {
        Self {
            client,
            wallet,
            abis,
            registry,
            gas,
            last_nonce: Mutex::new(None),
        }
    }

    pub fn account(&self) -> ethers::types::Address {
        self.wallet.address()
    }

    /// The nonce of the last successful submission, if any.
    pub async fn last_nonce(&self) -> Option<U256> {
        *self.last_nonce.lock().await
    }

    /// Forget the local nonce; the next submission adopts the chain's value.
    pub async fn resync(&self) {
        *self.last_nonce.lock().await = None;
        tracing::info!(account = ?self.wallet.address(), "nonce sequencer resynced");
    }

    /// Encode, sign and send `call`, returning the transaction hash.
    pub async fn submit(&self, call: &ContractCall) -> Result<H256, ChainError> {
        let kind = call.kind();
        let to = self
            .registry
            .address_of(kind)
            .ok_or_else(|| ChainError::Abi(format!("no address configured for {kind} contract")))?;
        let data = self.abis.get(kind)?.encode_call(call)?;

        let mut last = self.last_nonce.lock().await;
        let observed = self.client.confirmed_nonce(self.wallet.address()).await?;
        let nonce = next_nonce(*last, observed);

        let tx: TypedTransaction = TransactionRequest::new()
            .to(to)
            .value(U256::zero())
            .gas(self.gas.gas_limit)
            .gas_price(self.gas.gas_price)
            .data(data)
            .nonce(nonce)
            .chain_id(self.wallet.chain_id())
            .into();
        let signature = self
            .wallet
            .sign_transaction_sync(&tx)
            .map_err(|e| ChainError::Signing(e.to_string()))?;
        let raw = tx.rlp_signed(&signature);

        match self.client.send_raw_transaction(raw).await {
            Ok(hash) => {
                *last = Some(nonce);
                tracing::info!(method = call.method(), %nonce, "transaction hash: {hash:?}");
                Ok(hash)
            }
            Err(ChainError::NonceRejected(reason)) => {
                *last = None;
                tracing::warn!(method = call.method(), %nonce, %reason, "nonce rejected, resyncing");
                Err(ChainError::NonceRejected(reason))
            }
            Err(e) => {
                tracing::warn!(method = call.method(), %nonce, error = %e, "submission failed");
                Err(e)
            }
        }
    }
}

/// Adopt the chain's count when it is ahead of us, otherwise follow on.
fn next_nonce(last: Option<U256>, observed: U256) -> U256 {
    match last {
        Some(last) if observed <= last => last + 1,
        _ => observed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_adopts_observed() {
        assert_eq!(next_nonce(None, U256::from(7)), U256::from(7));
    }

    #[test]
    fn follows_on_when_chain_lags() {
        assert_eq!(next_nonce(Some(U256::from(7)), U256::from(7)), U256::from(8));
        assert_eq!(next_nonce(Some(U256::from(7)), U256::from(3)), U256::from(8));
    }

    #[test]
    fn adopts_chain_when_ahead() {
        assert_eq!(next_nonce(Some(U256::from(7)), U256::from(12)), U256::from(12));
    }
}
