use proptest::prelude::*;

use quill_incentives::distribute::{allocate, ceil_sqrt, rank_and_dampen, split_by_score};
use quill_incentives::reputation;
use quill_types::Amount;

fn wei(n: u128) -> Amount {
    Amount::from(n)
}

proptest! {
    /// More recent activity never raises HP.
    #[test]
    fn hp_non_increasing_in_activity(balance in any::<u128>(), cj in 0u64..10_000) {
        prop_assert!(reputation(wei(balance), cj + 1) <= reputation(wei(balance), cj));
    }

    /// A larger balance never lowers HP.
    #[test]
    fn hp_non_decreasing_in_balance(a in any::<u128>(), b in any::<u128>(), cj in 0u64..10_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(reputation(wei(lo), cj) <= reputation(wei(hi), cj));
    }

    /// ⌈√n⌉ is the least root whose square covers n.
    #[test]
    fn ceil_sqrt_is_tight(n in 1u64..u64::MAX / 2) {
        let r = ceil_sqrt(n) as u128;
        prop_assert!(r * r >= n as u128);
        prop_assert!((r - 1) * (r - 1) < n as u128);
    }

    /// Dampening keeps scores positive and never above the raw score.
    #[test]
    fn dampened_scores_bounded(mut scores in prop::collection::vec(1u64..1_000_000, 1..300)) {
        scores.sort_unstable_by(|a, b| b.cmp(a));
        let raw: Vec<Amount> = scores.iter().map(|s| Amount::from(*s)).collect();
        let dampened = rank_and_dampen(&raw);
        prop_assert_eq!(dampened.len(), raw.len());
        for (d, r) in dampened.iter().zip(&raw) {
            prop_assert!(!d.is_zero());
            prop_assert!(d <= r);
        }
    }

    /// Article shares never pay out more than the pool.
    #[test]
    fn allocations_stay_within_pool(
        pool in any::<u128>(),
        scores in prop::collection::vec(1u64..1_000_000, 1..50),
    ) {
        let pool = wei(pool);
        let total = scores.iter().fold(Amount::zero(), |acc, s| acc + Amount::from(*s));
        let mut paid = Amount::zero();
        for s in &scores {
            let (author, contributors) = allocate(pool, Amount::from(*s), total).unwrap();
            prop_assert!(contributors * 9 <= author);
            paid = paid + author + contributors;
        }
        prop_assert!(paid <= pool);
    }

    /// Contributor splits never exceed the carve-out.
    #[test]
    fn contributor_split_within_amount(
        amount in any::<u128>(),
        scores in prop::collection::vec(0u64..1_000_000, 0..50),
    ) {
        let raw: Vec<Amount> = scores.iter().map(|s| Amount::from(*s)).collect();
        let split = split_by_score(wei(amount), &raw).unwrap();
        let sum = split.iter().fold(Amount::zero(), |acc, a| acc + *a);
        prop_assert!(sum <= wei(amount));
    }
}
