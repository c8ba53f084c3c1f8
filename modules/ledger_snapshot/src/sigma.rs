//! Pool stake share (sigma) from a stake snapshot

use crate::{ledger::StakeSnapshot, SnapshotError};
use leaderlog_common::{
    rational_number::{rational_or_zero, RationalNumber},
    PoolId,
};

/// Stake delegated to `pool` over all stake in the snapshot.
///
/// A pool that is absent or has no stake gets 0, as does an empty snapshot.
pub fn calculate_sigma(
    snapshot: &StakeSnapshot,
    pool: &PoolId,
) -> Result<RationalNumber, SnapshotError> {
    let mut pool_stake = 0u64;
    let mut total_stake = 0u64;

    for (credential, lovelace) in snapshot.stake.0.iter() {
        total_stake = total_stake.checked_add(*lovelace).ok_or(SnapshotError::StakeOverflow)?;

        let delegated_here = snapshot
            .delegations
            .0
            .get(credential)
            .is_some_and(|delegate| pool.matches(delegate));
        if delegated_here {
            pool_stake += *lovelace;
        }
    }

    Ok(rational_or_zero(pool_stake, total_stake))
}
