/// Whole reward pool, in percent.
pub const PERCENT_DENOMINATOR: u8 = 100;

/// Number of reward tranches.
pub const TRANCHE_COUNT: usize = 3;

/// Multiples of the vesting period at which each tranche unlocks. Nothing is
/// withdrawable before the first boundary.
pub const TRANCHE_UNLOCK_PERIODS: [u64; TRANCHE_COUNT] = [2, 3, 4];
