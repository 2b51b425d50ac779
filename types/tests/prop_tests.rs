use proptest::prelude::*;

use quill_types::{
    Address, Amount, Dna, HeadNotification, IncentiveKind, IncentiveRecord, IncentiveStatus,
    Timestamp,
};

proptest! {
    /// Any height rendered the way a node renders it parses back to itself.
    #[test]
    fn head_height_parses_hex(height in 0u64..u64::MAX) {
        let n = HeadNotification { number: format!("{:#x}", height), hash: "0x01".into() };
        prop_assert_eq!(n.parse().unwrap().height, height);
    }

    /// Heights without the 0x prefix are always rejected.
    #[test]
    fn head_height_requires_prefix(height in 0u64..u64::MAX) {
        let n = HeadNotification { number: format!("{:x}", height), hash: "0x01".into() };
        prop_assert!(n.parse().is_err());
    }

    /// The trailing-window lower bound never exceeds the reference time.
    #[test]
    fn window_start_not_after_now(now in 0u64..u64::MAX, window in 0u64..u64::MAX) {
        let start = Timestamp::new(now).minus_secs(window);
        prop_assert!(start <= Timestamp::new(now));
    }

    /// Incentive records survive the storage encoding unchanged.
    #[test]
    fn incentive_record_bincode(score in any::<u64>(), amount in any::<u64>(), secs in any::<u64>()) {
        let mut rec = IncentiveRecord::pending(IncentiveKind::Comment, Address::repeat_byte(3), Timestamp::new(secs));
        rec.article_dna = Dna::from("ART");
        rec.score = Amount::from(score);
        rec.amount = Amount::from(amount);
        rec.status = IncentiveStatus::Calculating;
        let encoded = bincode::serialize(&rec).unwrap();
        let decoded: IncentiveRecord = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, rec);
    }
}
