use quill_chain::{ContractEvent, ContractKind};
use quill_crypto::group_dna;
use quill_store::LedgerTxn;
use quill_types::{Address, Dna, Group, GroupMember, TxStatus};

use super::{load_group, newly_confirmed, recover, signature_hex, unexpected};
use crate::{ApplyContext, EventHandler, HandlerOutcome, SyncError};

/// Groups and membership.
pub struct GroupHandler;

impl EventHandler for GroupHandler {
    fn kind(&self) -> ContractKind {
        ContractKind::Group
    }

    fn handle(
        &self,
        txn: &mut dyn LedgerTxn,
        event: ContractEvent,
        ctx: &ApplyContext,
    ) -> Result<HandlerOutcome, SyncError> {
        match event {
            ContractEvent::CreateGroup {
                title,
                description,
                signature,
            } => create(txn, title, description, &signature, ctx)?,
            ContractEvent::AddMember {
                group_dna,
                signature,
            } => {
                let member = recover(&GroupMember::signature_base(&group_dna), &signature)?;
                add_member(txn, &group_dna, member, &signature, ctx)?;
            }
            ContractEvent::RemoveMember {
                group_dna,
                signature,
            } => {
                let member = recover(&GroupMember::signature_base(&group_dna), &signature)?;
                remove_member(txn, &group_dna, member)?;
            }
            ContractEvent::RemoveMemberByOwner {
                group_dna,
                member_address,
                signature,
            } => {
                let base = GroupMember::owner_signature_base(&group_dna, &member_address);
                let signer = recover(&base, &signature)?;
                let owner = load_group(&*txn, &group_dna)?.user_address;
                if signer != owner {
                    return Err(SyncError::NotGroupOwner {
                        group: group_dna,
                        signer,
                    });
                }
                let member = member_address
                    .trim()
                    .parse::<Address>()
                    .map_err(|_| SyncError::InvalidAddress(member_address.clone()))?;
                remove_member(txn, &group_dna, member)?;
            }
            other => return Err(unexpected(self.kind(), &other)),
        }
        Ok(HandlerOutcome::default())
    }
}

/// Confirm a group and its owner's membership.
///
/// The DNA is derived from the signature, so the same event always lands on
/// the same group. The owner row does not move `member_count`.
fn create(
    txn: &mut dyn LedgerTxn,
    title: String,
    description: String,
    signature: &[u8],
    ctx: &ApplyContext,
) -> Result<(), SyncError> {
    let mut group = Group {
        title,
        description,
        signature: signature_hex(signature),
        ..Default::default()
    };
    group.user_address = recover(&group.signature_base(), signature)?;
    group.dna = group_dna(&group.signature);

    let mut group = match txn.get_group(&group.dna)? {
        Some(existing) => existing,
        None => Group {
            created_at: ctx.now,
            ..group
        },
    };
    group.tx_status = TxStatus::Confirmed;
    txn.put_group(&group)?;

    let mut owner = txn
        .get_member(&group.dna, &group.user_address)?
        .unwrap_or_else(|| GroupMember {
            group_dna: group.dna.clone(),
            member_address: group.user_address,
            created_at: ctx.now,
            ..Default::default()
        });
    owner.tx_status = TxStatus::Confirmed;
    txn.put_member(&owner)?;

    tracing::debug!(dna = %group.dna, owner = ?group.user_address, "group confirmed");
    Ok(())
}

fn add_member(
    txn: &mut dyn LedgerTxn,
    group_dna: &Dna,
    member: Address,
    signature: &[u8],
    ctx: &ApplyContext,
) -> Result<(), SyncError> {
    let existing = txn.get_member(group_dna, &member)?;
    let first = newly_confirmed(existing.as_ref().map(|m| m.tx_status));

    let mut row = existing.unwrap_or_else(|| GroupMember {
        group_dna: group_dna.clone(),
        member_address: member,
        created_at: ctx.now,
        ..Default::default()
    });
    row.signature = signature_hex(signature);
    row.tx_status = TxStatus::Confirmed;
    txn.put_member(&row)?;

    if first {
        let mut group = load_group(&*txn, group_dna)?;
        group.member_count += 1;
        txn.put_group(&group)?;
    }
    Ok(())
}

fn remove_member(
    txn: &mut dyn LedgerTxn,
    group_dna: &Dna,
    member: Address,
) -> Result<(), SyncError> {
    if !txn.delete_member(group_dna, &member)? {
        return Err(SyncError::MissingMember {
            group: group_dna.clone(),
            member,
        });
    }
    let mut group = load_group(&*txn, group_dna)?;
    group.member_count = group.member_count.saturating_sub(1);
    txn.put_group(&group)?;
    Ok(())
}
