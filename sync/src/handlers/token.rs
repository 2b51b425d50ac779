use quill_chain::{ContractEvent, ContractKind};
use quill_incentives::run_inflation;
use quill_store::LedgerTxn;
use quill_types::{Address, Amount, TokenLock};

use super::{fit_u64, identify_user, unexpected};
use crate::{ApplyContext, EventHandler, HandlerOutcome, SyncError};

/// Balances, inflation and token locks.
pub struct TokenHandler;

impl EventHandler for TokenHandler {
    fn kind(&self) -> ContractKind {
        ContractKind::Token
    }

    fn handle(
        &self,
        txn: &mut dyn LedgerTxn,
        event: ContractEvent,
        ctx: &ApplyContext,
    ) -> Result<HandlerOutcome, SyncError> {
        match event {
            ContractEvent::Transfer { from, to, value } => {
                if !from.is_zero() {
                    adjust_balance(txn, from, value, Direction::Debit, ctx)?;
                }
                if !to.is_zero() {
                    adjust_balance(txn, to, value, Direction::Credit, ctx)?;
                }
                Ok(HandlerOutcome::default())
            }
            ContractEvent::Inflate { amount } => {
                let outcome = run_inflation(txn, amount, &ctx.policy)?;
                tracing::debug!(
                    block = ctx.block_number,
                    batches = outcome.grants.len(),
                    "inflation applied"
                );
                Ok(HandlerOutcome {
                    grants: outcome.grants,
                    distribution: Some(outcome.summary),
                })
            }
            ContractEvent::Lock {
                user,
                resource_type,
                resource_dna,
                amount,
                expire,
            } => {
                let lock = TokenLock {
                    id: 0,
                    user_address: user,
                    resource_type: fit_u64(resource_type, "resource type")?,
                    resource_dna,
                    amount,
                    expire: fit_u64(expire, "lock expiry")?,
                    created_at: ctx.now,
                };
                let id = txn.insert_token_lock(lock)?;
                tracing::debug!(id, user = ?user, %amount, "token lock recorded");
                Ok(HandlerOutcome::default())
            }
            other => Err(unexpected(self.kind(), &other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Credit,
    Debit,
}

/// Debits saturate at zero: history before the first synced block is not
/// visible, so a recorded balance can trail the chain's.
fn adjust_balance(
    txn: &mut dyn LedgerTxn,
    address: Address,
    value: Amount,
    direction: Direction,
    ctx: &ApplyContext,
) -> Result<(), SyncError> {
    let mut user = identify_user(txn, address, ctx.now)?;
    user.balance = match direction {
        Direction::Credit => user.balance.saturating_add(value),
        Direction::Debit => {
            if value > user.balance {
                tracing::warn!(
                    user = ?address,
                    balance = %user.balance,
                    %value,
                    "debit exceeds recorded balance"
                );
            }
            user.balance.saturating_sub(value)
        }
    };
    txn.put_user(&user)?;
    Ok(())
}
