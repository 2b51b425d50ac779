//! Reputation ("HP") of a user.
//!
//! `weight = (θ + Cj / (3^(θ − Cj) + 1))²` and `hp = balance / weight / 10^18`,
//! all in truncating integer arithmetic. `Cj` is the number of incentive
//! records the user earned in the trailing window, so HP falls as a user
//! acts more often.

use quill_store::{LedgerTxn, StoreError};
use quill_types::{Address, Amount, Timestamp};

/// Activity threshold θ.
pub const THETA: u64 = 5;

/// Integer stand-in for e.
pub const E_APPROX: u64 = 3;

/// Trailing window for counting recent activity.
pub const WINDOW_SECS: u64 = 12 * 3600;

/// Token base units per whole token.
pub fn token_unit() -> Amount {
    Amount::exp10(18)
}

/// Divisor applied to the balance for a user with `recent` actions.
///
/// Once `recent` passes θ the exponent would go negative; integer
/// exponentiation then yields 1.
pub fn weight(recent: u64) -> Amount {
    let pow = match THETA.checked_sub(recent) {
        Some(exp) => Amount::from(E_APPROX).pow(Amount::from(exp)),
        None => Amount::one(),
    };
    let base = Amount::from(THETA) + Amount::from(recent) / (pow + Amount::one());
    base * base
}

/// HP for a balance (in base units) and recent action count.
pub fn reputation(balance: Amount, recent: u64) -> Amount {
    balance / weight(recent) / token_unit()
}

/// HP of `user` at `now`, read from the ledger. Unknown users have none.
pub fn user_reputation(
    txn: &dyn LedgerTxn,
    user: &Address,
    now: Timestamp,
) -> Result<Amount, StoreError> {
    let balance = txn.get_user(user)?.map(|u| u.balance).unwrap_or_default();
    let recent = txn.count_user_incentives_since(user, now.minus_secs(WINDOW_SECS))?;
    Ok(reputation(balance, recent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(n: u64) -> Amount {
        Amount::from(n) * token_unit()
    }

    #[test]
    fn quiet_users_divide_by_theta_squared() {
        for recent in 0..=3 {
            assert_eq!(weight(recent), Amount::from(25));
        }
        assert_eq!(reputation(tokens(2500), 0), Amount::from(100));
    }

    #[test]
    fn weight_grows_past_threshold() {
        assert_eq!(weight(4), Amount::from(36)); // 5 + 4/4
        assert_eq!(weight(5), Amount::from(49)); // 5 + 5/2
        assert_eq!(weight(6), Amount::from(64)); // 5 + 6/2, exponent clamped
        assert_eq!(weight(11), Amount::from(100));
    }

    #[test]
    fn fractional_hp_truncates() {
        assert_eq!(reputation(tokens(24), 0), Amount::zero());
        assert_eq!(reputation(tokens(25), 0), Amount::one());
    }
}
