use quill_chain::{ContractEvent, ContractKind};
use quill_store::LedgerTxn;

use super::{identify_user, unexpected};
use crate::{ApplyContext, EventHandler, HandlerOutcome, SyncError};

/// Profile-level events of the user contract.
pub struct UserHandler;

impl EventHandler for UserHandler {
    fn kind(&self) -> ContractKind {
        ContractKind::User
    }

    fn handle(
        &self,
        txn: &mut dyn LedgerTxn,
        event: ContractEvent,
        ctx: &ApplyContext,
    ) -> Result<HandlerOutcome, SyncError> {
        match event {
            ContractEvent::UserTokenBurn { user, amount } => {
                let mut row = identify_user(txn, user, ctx.now)?;
                row.token_burned = true;
                txn.put_user(&row)?;
                tracing::debug!(user = ?user, %amount, "user tokens burned");
                Ok(HandlerOutcome::default())
            }
            other => Err(unexpected(self.kind(), &other)),
        }
    }
}
