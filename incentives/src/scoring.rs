//! Activity scoring: turning a confirmed like, comment or share into
//! incentive records.

use quill_store::LedgerTxn;
use quill_types::{Address, Amount, Article, Dna, IncentiveKind, IncentiveRecord, Timestamp};

use crate::reputation::user_reputation;
use crate::IncentiveError;

/// A newly confirmed engagement with an article.
#[derive(Clone, Copy, Debug)]
pub struct Activity<'a> {
    pub kind: IncentiveKind,
    pub actor: Address,
    pub article: &'a Article,
    pub group_dna: &'a Dna,
}

/// What an activity contributed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivityScore {
    /// The actor's HP, stored as the activity record's score.
    pub hp: Amount,
    /// `hp × weight`, added to the article's pending score.
    pub article_increment: Amount,
}

/// Record `activity` and add its weighted HP to the article's pending score.
///
/// The actor's HP is measured before the new record is written. The
/// article's pending record is created on first use, owned by the author.
pub fn record_activity(
    txn: &mut dyn LedgerTxn,
    activity: Activity<'_>,
    now: Timestamp,
) -> Result<ActivityScore, IncentiveError> {
    let weight = activity
        .kind
        .article_weight()
        .ok_or(IncentiveError::NotAnActivity(activity.kind))?;
    let hp = user_reputation(&*txn, &activity.actor, now)?;

    let mut record = IncentiveRecord::pending(activity.kind, activity.actor, now);
    record.article_dna = activity.article.dna.clone();
    record.group_dna = activity.group_dna.clone();
    record.score = hp;
    txn.insert_incentive(record)?;

    let increment = hp
        .checked_mul(Amount::from(weight))
        .ok_or(IncentiveError::Overflow("article score increment"))?;
    add_article_score(txn, activity.article, increment, now)?;

    tracing::debug!(
        kind = ?activity.kind,
        actor = ?activity.actor,
        article = %activity.article.dna,
        %hp,
        "activity scored"
    );
    Ok(ActivityScore {
        hp,
        article_increment: increment,
    })
}

fn add_article_score(
    txn: &mut dyn LedgerTxn,
    article: &Article,
    increment: Amount,
    now: Timestamp,
) -> Result<(), IncentiveError> {
    match txn.pending_article_incentive(&article.dna)? {
        Some(mut pending) => {
            pending.score = pending
                .score
                .checked_add(increment)
                .ok_or(IncentiveError::Overflow("article score"))?;
            txn.update_incentive(&pending)?;
        }
        None => {
            let mut pending =
                IncentiveRecord::pending(IncentiveKind::Article, article.user_address, now);
            pending.article_dna = article.dna.clone();
            pending.score = increment;
            txn.insert_incentive(pending)?;
        }
    }
    Ok(())
}
