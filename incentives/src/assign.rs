//! Grant assignment: per-user totals of a finished distribution, cut into
//! on-chain grant batches.

use std::collections::HashMap;

use quill_store::LedgerTxn;
use quill_types::{Address, Amount, GrantBatch, IncentiveStatus};

use crate::IncentiveError;

/// Most users one `grantIncentives` call may carry.
pub const GRANT_BATCH_USERS: usize = 100;

/// Sum every `Calculating` record per user, in creation order, then mark
/// them all `Paid`.
///
/// A batch is closed as soon as it holds `max_users` users; later records of
/// a user already in a closed batch start a new entry in the next one.
pub fn assign_grants(
    txn: &mut dyn LedgerTxn,
    max_users: usize,
) -> Result<Vec<GrantBatch>, IncentiveError> {
    let max_users = max_users.max(1);
    let mut records = txn.incentives_with_status(IncentiveStatus::Calculating)?;
    records.sort_by_key(|r| (r.created_at, r.id));

    let mut batches = Vec::new();
    let mut current = GrantBatch::default();
    let mut slots: HashMap<Address, usize> = HashMap::new();

    for record in &records {
        match slots.get(&record.user_address) {
            Some(&slot) => {
                current.amounts[slot] = current.amounts[slot].saturating_add(record.amount);
            }
            None => {
                slots.insert(record.user_address, current.len());
                current.users.push(record.user_address);
                current.amounts.push(record.amount);
                if current.len() == max_users {
                    batches.push(std::mem::take(&mut current));
                    slots.clear();
                }
            }
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }

    let paid = txn.transition_incentives(IncentiveStatus::Calculating, IncentiveStatus::Paid)?;
    let granted = batches
        .iter()
        .fold(Amount::zero(), |acc, b| acc.saturating_add(b.total()));
    tracing::info!(paid, batches = batches.len(), %granted, "incentives assigned");
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_nullables::NullStore;
    use quill_store::LedgerStore;
    use quill_types::{IncentiveKind, IncentiveRecord, Timestamp};

    fn calculating(txn: &mut dyn LedgerTxn, user: u8, created: u64, amount: u64) {
        let mut record =
            IncentiveRecord::pending(IncentiveKind::Like, Address::repeat_byte(user), Timestamp::new(created));
        record.status = IncentiveStatus::Calculating;
        record.amount = Amount::from(amount);
        txn.insert_incentive(record).unwrap();
    }

    #[test]
    fn sums_per_user_in_creation_order() {
        let store = NullStore::new();
        let mut txn = store.begin().unwrap();
        calculating(&mut txn, 2, 20, 5);
        calculating(&mut txn, 1, 10, 7);
        calculating(&mut txn, 2, 30, 1);

        let batches = assign_grants(&mut txn, GRANT_BATCH_USERS).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].users,
            vec![Address::repeat_byte(1), Address::repeat_byte(2)]
        );
        assert_eq!(batches[0].amounts, vec![Amount::from(7), Amount::from(6)]);

        assert!(txn
            .incentives_with_status(IncentiveStatus::Calculating)
            .unwrap()
            .is_empty());
        assert_eq!(
            txn.incentives_with_status(IncentiveStatus::Paid).unwrap().len(),
            3
        );
    }

    #[test]
    fn full_batch_is_closed_immediately() {
        let store = NullStore::new();
        let mut txn = store.begin().unwrap();
        calculating(&mut txn, 1, 1, 1);
        calculating(&mut txn, 2, 2, 1);
        calculating(&mut txn, 1, 3, 4); // user 1 again, after the batch closed
        calculating(&mut txn, 3, 4, 1);

        let batches = assign_grants(&mut txn, 2).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(
            batches[1].users,
            vec![Address::repeat_byte(1), Address::repeat_byte(3)]
        );
        assert_eq!(batches[1].amounts[0], Amount::from(4));
    }

    #[test]
    fn nothing_to_assign() {
        let store = NullStore::new();
        let mut txn = store.begin().unwrap();
        assert!(assign_grants(&mut txn, GRANT_BATCH_USERS).unwrap().is_empty());
    }
}
