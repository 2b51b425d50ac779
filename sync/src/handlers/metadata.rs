use quill_chain::{ContractEvent, ContractKind};
use quill_incentives::{record_activity, Activity};
use quill_store::LedgerTxn;
use quill_types::{
    share_signature_base, Article, ArticleComment, ArticleLike, Dna, GroupArticle,
    IncentiveKind, TxStatus, SHARE_GROUP_SEPARATOR,
};

use super::{identify_user, load_group, newly_confirmed, recover, signature_hex, unexpected};
use crate::{ApplyContext, EventHandler, HandlerOutcome, SyncError};

/// Articles and engagement: `PublishLog`, `LikeLog`, `CommentLog`, `ShareLog`.
pub struct MetadataHandler;

impl EventHandler for MetadataHandler {
    fn kind(&self) -> ContractKind {
        ContractKind::Metadata
    }

    fn handle(
        &self,
        txn: &mut dyn LedgerTxn,
        event: ContractEvent,
        ctx: &ApplyContext,
    ) -> Result<HandlerOutcome, SyncError> {
        match event {
            ContractEvent::Publish {
                title,
                content_hash,
                license,
                extras,
                block_hash,
                signature,
                dna,
            } => {
                let article = Article {
                    dna,
                    title,
                    content_hash,
                    license,
                    extra: extras,
                    block_hash,
                    signature: signature_hex(&signature),
                    ..Default::default()
                };
                publish(txn, article, &signature, ctx)?;
            }
            ContractEvent::Like {
                article_dna,
                group_dna,
                signature,
            } => like(txn, article_dna, group_dna, &signature, ctx)?,
            ContractEvent::Comment {
                article_dna,
                group_dna,
                content_hash,
                signature,
            } => comment(txn, article_dna, group_dna, content_hash, &signature, ctx)?,
            ContractEvent::Share {
                article_dna,
                groups_dna,
                signature,
            } => share(txn, article_dna, &groups_dna, &signature, ctx)?,
            other => return Err(unexpected(self.kind(), &other)),
        }
        Ok(HandlerOutcome::default())
    }
}

fn publish(
    txn: &mut dyn LedgerTxn,
    from_event: Article,
    signature: &[u8],
    ctx: &ApplyContext,
) -> Result<(), SyncError> {
    let mut article = match txn.get_article(&from_event.dna)? {
        Some(existing) => existing,
        None => {
            let expected =
                quill_crypto::article_dna(&from_event.signature, &from_event.block_hash);
            if expected != from_event.dna {
                tracing::warn!(
                    dna = %from_event.dna,
                    %expected,
                    "article DNA does not match its signature and block hash"
                );
            }
            let author = recover(&from_event.signature_base(), signature)?;
            identify_user(txn, author, ctx.now)?;
            Article {
                user_address: author,
                created_at: ctx.now,
                ..from_event
            }
        }
    };
    article.tx_status = TxStatus::Confirmed;
    txn.put_article(&article)?;
    tracing::debug!(dna = %article.dna, author = ?article.user_address, "article confirmed");
    Ok(())
}

fn load_article(txn: &dyn LedgerTxn, dna: &Dna) -> Result<Article, SyncError> {
    txn.get_article(dna)?
        .ok_or_else(|| SyncError::MissingArticle(dna.clone()))
}

fn like(
    txn: &mut dyn LedgerTxn,
    article_dna: Dna,
    group_dna: Dna,
    signature: &[u8],
    ctx: &ApplyContext,
) -> Result<(), SyncError> {
    let member = recover(&ArticleLike::signature_base(&article_dna, &group_dna), signature)?;
    let existing = txn.get_like(&article_dna, &group_dna, &member)?;
    let first = newly_confirmed(existing.as_ref().map(|l| l.tx_status));

    let mut like = existing.unwrap_or_else(|| ArticleLike {
        article_dna: article_dna.clone(),
        group_dna: group_dna.clone(),
        member_address: member,
        created_at: ctx.now,
        ..Default::default()
    });
    like.signature = signature_hex(signature);
    like.tx_status = TxStatus::Confirmed;
    txn.put_like(&like)?;

    if first {
        let mut article = load_article(&*txn, &article_dna)?;
        article.like_count += 1;
        txn.put_article(&article)?;
        record_activity(
            txn,
            Activity {
                kind: IncentiveKind::Like,
                actor: member,
                article: &article,
                group_dna: &group_dna,
            },
            ctx.now,
        )?;
    }
    Ok(())
}

fn comment(
    txn: &mut dyn LedgerTxn,
    article_dna: Dna,
    group_dna: Dna,
    content_hash: String,
    signature: &[u8],
    ctx: &ApplyContext,
) -> Result<(), SyncError> {
    let base = ArticleComment::signature_base(&article_dna, &group_dna, &content_hash);
    let member = recover(&base, signature)?;
    let existing = txn.get_comment(&article_dna, &group_dna, &member, &content_hash)?;
    let first = newly_confirmed(existing.as_ref().map(|c| c.tx_status));

    let mut comment = existing.unwrap_or_else(|| ArticleComment {
        article_dna: article_dna.clone(),
        group_dna: group_dna.clone(),
        member_address: member,
        content_hash,
        created_at: ctx.now,
        ..Default::default()
    });
    comment.signature = signature_hex(signature);
    comment.tx_status = TxStatus::Confirmed;
    txn.put_comment(&comment)?;

    if first {
        let mut article = load_article(&*txn, &article_dna)?;
        article.comment_count += 1;
        txn.put_article(&article)?;
        record_activity(
            txn,
            Activity {
                kind: IncentiveKind::Comment,
                actor: member,
                article: &article,
                group_dna: &group_dna,
            },
            ctx.now,
        )?;
    }
    Ok(())
}

/// One share event fans out into a `GroupArticle` per target group.
fn share(
    txn: &mut dyn LedgerTxn,
    article_dna: Dna,
    groups_joined: &str,
    signature: &[u8],
    ctx: &ApplyContext,
) -> Result<(), SyncError> {
    let member = recover(&share_signature_base(&article_dna, groups_joined), signature)?;
    let mut article = load_article(&*txn, &article_dna)?;

    let mut confirmed = 0u64;
    for group_dna in groups_joined
        .split(SHARE_GROUP_SEPARATOR)
        .filter(|g| !g.is_empty())
        .map(Dna::from)
    {
        let existing = txn.get_group_article(&group_dna, &article_dna, &member)?;
        if !newly_confirmed(existing.as_ref().map(|s| s.tx_status)) {
            continue;
        }
        let mut shared = existing.unwrap_or_else(|| GroupArticle {
            group_dna: group_dna.clone(),
            article_dna: article_dna.clone(),
            member_address: member,
            created_at: ctx.now,
            ..Default::default()
        });
        shared.tx_status = TxStatus::Confirmed;
        txn.put_group_article(&shared)?;

        let mut group = load_group(&*txn, &group_dna)?;
        group.article_count += 1;
        txn.put_group(&group)?;

        record_activity(
            txn,
            Activity {
                kind: IncentiveKind::Share,
                actor: member,
                article: &article,
                group_dna: &group_dna,
            },
            ctx.now,
        )?;
        confirmed += 1;
    }

    if confirmed > 0 {
        article.share_count += confirmed;
        txn.put_article(&article)?;
    }
    Ok(())
}
