//! Epoch and slot calculations across the Byron/Shelley era change

use crate::{genesis_values::GenesisValues, ReplayMode};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoundaryError {
    #[error("Tip slot {tip_slot} is inside the first epoch; there is no previous epoch of {epoch_length} slots to replay")]
    NoPreviousEpoch { tip_slot: u64, epoch_length: u64 },
}

/// Derive an epoch number from a slot, handling the Byron/Shelley era change
pub fn slot_to_epoch_with_shelley_params(
    slot: u64,
    byron_epoch_len: u64,
    shelley_epoch: u64,
    shelley_epoch_len: u64,
) -> u64 {
    let shelley_start_slot = shelley_epoch * byron_epoch_len;
    if slot < shelley_start_slot {
        slot / byron_epoch_len
    } else {
        shelley_epoch + (slot - shelley_start_slot) / shelley_epoch_len
    }
}

/// First absolute slot of an epoch, handling the Byron/Shelley era change
pub fn epoch_to_first_slot_with_shelley_params(
    epoch: u64,
    byron_epoch_len: u64,
    shelley_epoch: u64,
    shelley_epoch_len: u64,
) -> u64 {
    if epoch < shelley_epoch {
        epoch * byron_epoch_len
    } else {
        shelley_epoch * byron_epoch_len + (epoch - shelley_epoch) * shelley_epoch_len
    }
}

/// First slot of the epoch under evaluation.
///
/// `Current` resolves the epoch containing `tip_slot`; `PreviousEpoch` resolves
/// the epoch containing `tip_slot - epochLength`, the one that just ended.
pub fn resolve_first_slot_of_epoch(
    genesis: &GenesisValues,
    tip_slot: u64,
    mode: ReplayMode,
) -> Result<u64, BoundaryError> {
    let slot = match mode {
        ReplayMode::Current => tip_slot,
        ReplayMode::PreviousEpoch => tip_slot.checked_sub(genesis.shelley_epoch_len).ok_or(
            BoundaryError::NoPreviousEpoch {
                tip_slot,
                epoch_length: genesis.shelley_epoch_len,
            },
        )?,
    };
    Ok(genesis.epoch_to_first_slot(genesis.slot_to_epoch(slot)))
}

// -- Tests --
#[cfg(test)]
mod tests {
    use super::*;
    use crate::NetworkMagic;
    use bigdecimal::BigDecimal;

    const BYRON_SLOTS_PER_EPOCH: u64 = 21_600;
    const SHELLEY_SLOTS_PER_EPOCH: u64 = 432_000;

    fn slot_to_epoch(slot: u64) -> u64 {
        slot_to_epoch_with_shelley_params(slot, BYRON_SLOTS_PER_EPOCH, 208, SHELLEY_SLOTS_PER_EPOCH)
    }

    fn genesis(shelley_epoch: u64) -> GenesisValues {
        GenesisValues {
            network: NetworkMagic::Mainnet,
            byron_epoch_len: BYRON_SLOTS_PER_EPOCH,
            shelley_epoch,
            shelley_epoch_len: SHELLEY_SLOTS_PER_EPOCH,
            active_slots_coeff: BigDecimal::from(1),
        }
    }

    #[test]
    fn byron_epoch_0() {
        assert_eq!(0, slot_to_epoch(0));
    }

    #[test]
    fn byron_epoch_1() {
        assert_eq!(1, slot_to_epoch(21_600));
    }

    #[test]
    fn byron_last_slot() {
        assert_eq!(slot_to_epoch(4_492_799), 207);
    }

    #[test]
    fn shelley_first_slot() {
        assert_eq!(slot_to_epoch(4_492_800), 208);
    }

    #[test]
    fn shelley_epoch_209_start() {
        // 432_000 slots later
        assert_eq!(slot_to_epoch(4_492_800 + 432_000), 209);
    }

    #[test]
    fn first_slot_round_trips_at_boundaries() {
        for epoch in [0, 1, 207, 208, 209, 425] {
            let first =
                epoch_to_first_slot_with_shelley_params(epoch, BYRON_SLOTS_PER_EPOCH, 208, SHELLEY_SLOTS_PER_EPOCH);
            assert_eq!(slot_to_epoch(first), epoch);
            if first > 0 {
                assert_eq!(slot_to_epoch(first - 1), epoch - 1);
            }
        }
    }

    #[test]
    fn current_epoch_boundary() {
        let genesis = genesis(0);
        let first = resolve_first_slot_of_epoch(&genesis, 1_000_000, ReplayMode::Current).unwrap();
        assert_eq!(first, 864_000);
        assert!(first <= 1_000_000 && first > 1_000_000 - 432_000);
    }

    #[test]
    fn replay_epoch_boundary() {
        let genesis = genesis(0);
        let first =
            resolve_first_slot_of_epoch(&genesis, 1_000_000, ReplayMode::PreviousEpoch).unwrap();
        assert_eq!(first, 432_000);
        assert_eq!(
            first,
            resolve_first_slot_of_epoch(&genesis, 568_000, ReplayMode::Current).unwrap()
        );
    }

    #[test]
    fn replay_matches_shifted_tip_on_mainnet() {
        let genesis = genesis(208);
        for tip in [98_272_003, 98_236_800, 98_236_799, 4_492_800 + 432_000] {
            assert_eq!(
                resolve_first_slot_of_epoch(&genesis, tip, ReplayMode::PreviousEpoch).unwrap(),
                resolve_first_slot_of_epoch(&genesis, tip - 432_000, ReplayMode::Current).unwrap()
            );
        }
        assert_eq!(
            resolve_first_slot_of_epoch(&genesis, 98_272_003, ReplayMode::PreviousEpoch).unwrap(),
            98_236_800 - 432_000
        );
    }

    #[test]
    fn replay_before_first_epoch_ends() {
        let genesis = genesis(0);
        assert_eq!(
            resolve_first_slot_of_epoch(&genesis, 1_000, ReplayMode::PreviousEpoch),
            Err(BoundaryError::NoPreviousEpoch {
                tip_slot: 1_000,
                epoch_length: 432_000
            })
        );
    }
}
