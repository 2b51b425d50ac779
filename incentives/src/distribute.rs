//! Rank-dampened proportional distribution of an inflation.
//!
//! A run moves every pending record to `Calculating`, then:
//!
//! 1. ranks the article records by score (ties share a rank) and divides
//!    each score by `⌈√rank⌉`; the whole `Calculating` set is loaded and
//!    ranked in memory in one pass,
//! 2. gives each article its proportional share of the article pool, keeping
//!    90% for the author and carving out 10% for contributors,
//! 3. splits the carve-out across the article's likes, comments and shares
//!    in proportion to their scores.
//!
//! All amounts are truncated integers; nothing is ever negative.

use std::collections::HashMap;

use quill_store::LedgerTxn;
use quill_types::{Amount, Dna, IncentiveKind, IncentiveRecord, IncentiveStatus};
use serde::{Deserialize, Serialize};

use crate::IncentiveError;

/// Whole tokens in the fixed daily article pool.
pub const FIXED_ARTICLE_POOL_TOKENS: u64 = 10_800;

/// How the article pool is sized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticlePool {
    /// A fixed amount per run, regardless of the inflation.
    #[default]
    Fixed,
    /// The articles' 40% share of the inflation.
    InflationShare,
}

/// Pool sizing resolved against a concrete fixed amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolPolicy {
    pub article_pool: ArticlePool,
    pub fixed_amount: Amount,
}

impl Default for PoolPolicy {
    fn default() -> Self {
        Self {
            article_pool: ArticlePool::Fixed,
            fixed_amount: default_fixed_article_pool(),
        }
    }
}

impl PoolPolicy {
    fn article_pool(&self, split: &InflationSplit) -> Amount {
        match self.article_pool {
            ArticlePool::Fixed => self.fixed_amount,
            ArticlePool::InflationShare => split.articles,
        }
    }
}

pub fn default_fixed_article_pool() -> Amount {
    Amount::from(FIXED_ARTICLE_POOL_TOKENS) * Amount::exp10(18)
}

/// 40% articles, 40% groups, 20% nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InflationSplit {
    pub articles: Amount,
    pub groups: Amount,
    pub nodes: Amount,
}

impl InflationSplit {
    pub fn of(inflation: Amount) -> Self {
        let forty = inflation / 10 * 4 + inflation % 10 * 4 / 10;
        Self {
            articles: forty,
            groups: forty,
            nodes: forty / 2,
        }
    }
}

/// Totals of one distribution run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistributionSummary {
    pub split: InflationSplit,
    pub article_pool: Amount,
    /// Records moved from Pending to Calculating.
    pub locked: u64,
    /// Article records that took part in ranking.
    pub ranked: usize,
    pub total_score: Amount,
    pub to_authors: Amount,
    pub to_contributors: Amount,
}

/// `a × b / c` with a 512-bit intermediate. `c` must be nonzero.
pub fn mul_div(a: Amount, b: Amount, c: Amount) -> Result<Amount, IncentiveError> {
    if c.is_zero() {
        return Err(IncentiveError::Overflow("division by zero total"));
    }
    let wide = a.full_mul(b) / c.full_mul(Amount::one());
    Amount::try_from(wide).map_err(|_| IncentiveError::Overflow("proportional share"))
}

/// `⌈√n⌉` for `n ≥ 1`.
pub fn ceil_sqrt(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let mut root = (n as f64).sqrt() as u64;
    while root.saturating_mul(root) > n {
        root -= 1;
    }
    while (root + 1).saturating_mul(root + 1) <= n {
        root += 1;
    }
    if root * root == n {
        root
    } else {
        root + 1
    }
}

/// Dampen scores already sorted in descending order.
///
/// The rank only advances on a strictly lower score; a result of zero is
/// floored to one.
pub fn rank_and_dampen(sorted_scores: &[Amount]) -> Vec<Amount> {
    let mut rank = 0u64;
    let mut rank_score: Option<Amount> = None;
    sorted_scores
        .iter()
        .map(|score| {
            if rank_score.map_or(true, |prev| *score < prev) {
                rank += 1;
                rank_score = Some(*score);
            }
            let dampened = *score / Amount::from(ceil_sqrt(rank));
            if dampened.is_zero() {
                Amount::one()
            } else {
                dampened
            }
        })
        .collect()
}

/// One article's cut of the pool: `(author, contributors)`.
pub fn allocate(pool: Amount, dampened: Amount, total: Amount) -> Result<(Amount, Amount), IncentiveError> {
    let share = mul_div(pool, dampened, total)?;
    let contributors = share / 10;
    Ok((share - contributors, contributors))
}

/// Split `amount` by `scores`. All zero when the scores sum to zero.
pub fn split_by_score(amount: Amount, scores: &[Amount]) -> Result<Vec<Amount>, IncentiveError> {
    let total = scores
        .iter()
        .try_fold(Amount::zero(), |acc, s| acc.checked_add(*s))
        .ok_or(IncentiveError::Overflow("contributor score sum"))?;
    if total.is_zero() {
        return Ok(vec![Amount::zero(); scores.len()]);
    }
    scores.iter().map(|s| mul_div(amount, *s, total)).collect()
}

/// Run a full distribution for `inflation` inside `txn`.
///
/// Records are left in `Calculating` with their amounts set; grant assignment
/// moves them on to `Paid`.
pub fn distribute(
    txn: &mut dyn LedgerTxn,
    inflation: Amount,
    policy: &PoolPolicy,
) -> Result<DistributionSummary, IncentiveError> {
    let split = InflationSplit::of(inflation);
    let locked = txn.transition_incentives(IncentiveStatus::Pending, IncentiveStatus::Calculating)?;

    let mut summary = DistributionSummary {
        split,
        article_pool: policy.article_pool(&split),
        locked,
        ..Default::default()
    };

    distribute_articles(txn, &mut summary)?;
    distribute_groups(txn, split.groups)?;
    distribute_nodes(txn, split.nodes)?;

    tracing::info!(
        %inflation,
        pool = %summary.article_pool,
        locked = summary.locked,
        ranked = summary.ranked,
        total_score = %summary.total_score,
        to_authors = %summary.to_authors,
        to_contributors = %summary.to_contributors,
        "incentives distributed"
    );
    Ok(summary)
}

fn distribute_articles(
    txn: &mut dyn LedgerTxn,
    summary: &mut DistributionSummary,
) -> Result<(), IncentiveError> {
    let calculating = txn.incentives_with_status(IncentiveStatus::Calculating)?;

    let mut articles = Vec::new();
    let mut contributors: HashMap<Dna, Vec<IncentiveRecord>> = HashMap::new();
    for record in calculating {
        if record.kind == IncentiveKind::Article {
            if !record.score.is_zero() {
                articles.push(record);
            }
        } else if record.kind.is_contribution() {
            contributors
                .entry(record.article_dna.clone())
                .or_default()
                .push(record);
        }
    }
    // stable: equal scores stay in id order
    articles.sort_by(|a, b| b.score.cmp(&a.score));

    // Rank pass.
    let scores: Vec<Amount> = articles.iter().map(|r| r.score).collect();
    let dampened = rank_and_dampen(&scores);
    let mut total = Amount::zero();
    for (record, score) in articles.iter_mut().zip(dampened) {
        record.score = score;
        txn.update_incentive(record)?;
        total = total
            .checked_add(score)
            .ok_or(IncentiveError::Overflow("total article score"))?;
    }
    tracing::debug!(records = articles.len(), %total, "articles ranked");
    summary.ranked = articles.len();
    summary.total_score = total;

    // Allocation pass.
    for record in &mut articles {
        let (author, carve) = allocate(summary.article_pool, record.score, total)?;
        record.amount = author;
        txn.update_incentive(record)?;

        let mut article = txn
            .get_article(&record.article_dna)?
            .ok_or_else(|| IncentiveError::MissingArticle(record.article_dna.clone()))?;
        article.total_incentives = article.total_incentives.saturating_add(author);
        txn.put_article(&article)?;

        let paid = match contributors.get_mut(&record.article_dna) {
            Some(records) => pay_contributors(txn, records, carve)?,
            None => Amount::zero(),
        };
        summary.to_authors = summary.to_authors.saturating_add(author);
        summary.to_contributors = summary.to_contributors.saturating_add(paid);
    }
    Ok(())
}

fn pay_contributors(
    txn: &mut dyn LedgerTxn,
    records: &mut [IncentiveRecord],
    carve: Amount,
) -> Result<Amount, IncentiveError> {
    let scores: Vec<Amount> = records.iter().map(|r| r.score).collect();
    let amounts = split_by_score(carve, &scores)?;
    let mut paid = Amount::zero();
    for (record, amount) in records.iter_mut().zip(amounts) {
        if amount.is_zero() {
            continue;
        }
        record.amount = amount;
        txn.update_incentive(record)?;
        paid = paid.saturating_add(amount);
    }
    Ok(paid)
}

/// Group rewards: reserved, not yet computed.
fn distribute_groups(_txn: &mut dyn LedgerTxn, pool: Amount) -> Result<(), IncentiveError> {
    tracing::debug!(%pool, "group incentives not distributed");
    Ok(())
}

/// Node rewards: reserved, not yet computed.
fn distribute_nodes(_txn: &mut dyn LedgerTxn, pool: Amount) -> Result<(), IncentiveError> {
    tracing::debug!(%pool, "node incentives not distributed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_nullables::NullStore;
    use quill_store::LedgerStore;
    use quill_types::{Address, Article, Timestamp};

    fn amounts(values: &[u64]) -> Vec<Amount> {
        values.iter().map(|v| Amount::from(*v)).collect()
    }

    #[test]
    fn ties_share_a_rank() {
        assert_eq!(
            rank_and_dampen(&amounts(&[100, 100, 50])),
            amounts(&[100, 100, 25])
        );
    }

    #[test]
    fn dampened_zero_floors_to_one() {
        // ranks 1, 2, 3: the last divides 1 by 2
        assert_eq!(rank_and_dampen(&amounts(&[9, 4, 1])), amounts(&[9, 2, 1]));
    }

    #[test]
    fn ceil_sqrt_boundaries() {
        let expected = [(1, 1), (2, 2), (4, 2), (5, 3), (9, 3), (10, 4), (1_000_000, 1000)];
        for (n, root) in expected {
            assert_eq!(ceil_sqrt(n), root, "ceil_sqrt({n})");
        }
    }

    #[test]
    fn allocation_carves_a_tenth() {
        let (author, contributors) =
            allocate(Amount::from(1000), Amount::from(100), Amount::from(125)).unwrap();
        assert_eq!(contributors, Amount::from(80));
        assert_eq!(author, Amount::from(720));
    }

    #[test]
    fn contributors_split_by_score() {
        assert_eq!(
            split_by_score(Amount::from(80), &amounts(&[3, 1])).unwrap(),
            amounts(&[60, 20])
        );
        assert_eq!(
            split_by_score(Amount::from(80), &amounts(&[0, 0])).unwrap(),
            amounts(&[0, 0])
        );
    }

    #[test]
    fn inflation_split_ratios() {
        let split = InflationSplit::of(Amount::from(1000));
        assert_eq!(split.articles, Amount::from(400));
        assert_eq!(split.groups, Amount::from(400));
        assert_eq!(split.nodes, Amount::from(200));
        assert_eq!(InflationSplit::of(Amount::from(7)).articles, Amount::from(2));
    }

    #[test]
    fn default_pool_is_fixed() {
        let policy = PoolPolicy::default();
        assert_eq!(policy.article_pool, ArticlePool::Fixed);
        assert_eq!(
            policy.fixed_amount.to_string(),
            "10800000000000000000000"
        );
    }

    fn seed_article(txn: &mut dyn LedgerTxn, dna: &str, owner: u8, score: u64) {
        let article = Article {
            dna: Dna::from(dna),
            user_address: Address::repeat_byte(owner),
            ..Default::default()
        };
        txn.put_article(&article).unwrap();
        let mut record =
            IncentiveRecord::pending(IncentiveKind::Article, article.user_address, Timestamp::new(1));
        record.article_dna = article.dna.clone();
        record.score = Amount::from(score);
        txn.insert_incentive(record).unwrap();
    }

    fn seed_contribution(txn: &mut dyn LedgerTxn, dna: &str, user: u8, kind: IncentiveKind, score: u64) {
        let mut record = IncentiveRecord::pending(kind, Address::repeat_byte(user), Timestamp::new(2));
        record.article_dna = Dna::from(dna);
        record.score = Amount::from(score);
        txn.insert_incentive(record).unwrap();
    }

    #[test]
    fn full_run_allocates_pool_by_dampened_rank() {
        let store = NullStore::new();
        let mut txn = store.begin().unwrap();
        seed_article(&mut txn, "A", 1, 100);
        seed_article(&mut txn, "B", 2, 100);
        seed_article(&mut txn, "C", 3, 50);
        seed_article(&mut txn, "Z", 4, 0);
        seed_contribution(&mut txn, "A", 5, IncentiveKind::Like, 3);
        seed_contribution(&mut txn, "A", 6, IncentiveKind::Comment, 1);

        let policy = PoolPolicy {
            article_pool: ArticlePool::Fixed,
            fixed_amount: Amount::from(2250),
        };
        let summary = distribute(&mut txn, Amount::from(5000), &policy).unwrap();

        assert_eq!(summary.locked, 6);
        assert_eq!(summary.ranked, 3);
        assert_eq!(summary.total_score, Amount::from(225));

        // A: 2250 × 100 / 225 = 1000 → author 900, contributors 100 split 3:1
        let a = txn.get_article(&Dna::from("A")).unwrap().unwrap();
        assert_eq!(a.total_incentives, Amount::from(900));
        let c = txn.get_article(&Dna::from("C")).unwrap().unwrap();
        assert_eq!(c.total_incentives, Amount::from(225));
        let z = txn.get_article(&Dna::from("Z")).unwrap().unwrap();
        assert!(z.total_incentives.is_zero());

        let records = txn.incentives_with_status(IncentiveStatus::Calculating).unwrap();
        let like = records.iter().find(|r| r.kind == IncentiveKind::Like).unwrap();
        let comment = records.iter().find(|r| r.kind == IncentiveKind::Comment).unwrap();
        assert_eq!(like.amount, Amount::from(75));
        assert_eq!(comment.amount, Amount::from(25));
        assert_eq!(summary.to_contributors, Amount::from(100));
        assert!(summary.to_authors + summary.to_contributors <= policy.fixed_amount);
    }

    #[test]
    fn ranks_run_past_two_hundred_articles_without_restarting() {
        let store = NullStore::new();
        let mut txn = store.begin().unwrap();
        for i in 0..450u64 {
            seed_article(&mut txn, &format!("A{i}"), 1, 10_000 - i);
        }

        let summary = distribute(&mut txn, Amount::from(5000), &PoolPolicy::default()).unwrap();
        assert_eq!(summary.ranked, 450);

        let records = txn.incentives_with_status(IncentiveStatus::Calculating).unwrap();
        let score_of = |dna: &str| {
            records
                .iter()
                .find(|r| r.article_dna.as_str() == dna)
                .unwrap()
                .score
        };
        // rank 1, 201 (⌈√201⌉ = 15) and 450 (⌈√450⌉ = 22)
        assert_eq!(score_of("A0"), Amount::from(10_000));
        assert_eq!(score_of("A200"), Amount::from(9_800 / 15));
        assert_eq!(score_of("A449"), Amount::from(9_551 / 22));
    }

    #[test]
    fn run_without_articles_only_locks() {
        let store = NullStore::new();
        let mut txn = store.begin().unwrap();
        seed_contribution(&mut txn, "X", 1, IncentiveKind::Share, 10);
        let summary = distribute(&mut txn, Amount::from(100), &PoolPolicy::default()).unwrap();
        assert_eq!(summary.locked, 1);
        assert_eq!(summary.ranked, 0);
        assert!(txn.incentives_with_status(IncentiveStatus::Pending).unwrap().is_empty());
    }

    #[test]
    fn missing_article_row_fails_the_run() {
        let store = NullStore::new();
        let mut txn = store.begin().unwrap();
        let mut record =
            IncentiveRecord::pending(IncentiveKind::Article, Address::zero(), Timestamp::new(1));
        record.article_dna = Dna::from("GONE");
        record.score = Amount::from(5);
        txn.insert_incentive(record).unwrap();

        let err = distribute(&mut txn, Amount::from(100), &PoolPolicy::default()).unwrap_err();
        assert!(matches!(err, IncentiveError::MissingArticle(_)));
    }
}
