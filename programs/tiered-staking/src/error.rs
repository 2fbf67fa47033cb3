use anchor_lang::prelude::*;

/// Result of a ledger transition, shared by the program handlers and the
/// standalone engine.
pub type LedgerResult<T> = std::result::Result<T, ErrorCode>;

#[error_code]
pub enum ErrorCode {
    #[msg("Amount must be greater than zero.")]
    InvalidAmount,
    #[msg("Amount exceeds the staked balance.")]
    InsufficientStake,
    #[msg("Withdrawals open two vesting periods after the pool starts.")]
    VestingNotElapsed,
    #[msg("Reward pool has already been funded.")]
    AlreadyFunded,
    #[msg("Reward pool has not been funded.")]
    PoolNotFunded,
    #[msg("Only the pool authority may do this.")]
    Unauthorized,
    #[msg("Stakers still hold a balance in the pool.")]
    ActiveStakersRemain,
    #[msg("Transfer exceeds the allowance granted to the pool.")]
    AllowanceExceeded,
    #[msg("Transfer exceeds the account balance.")]
    BalanceExceeded,
    #[msg("Tranche percentages must sum to 100.")]
    InvalidTranches,
    #[msg("Vesting period must be positive and fit four periods in a timestamp.")]
    InvalidVestingPeriod,
    #[msg("Pool has been dissolved.")]
    PoolClosed,
    #[msg("Arithmetic overflow.")]
    MathOverflow,
    #[msg("Staker record still holds a balance.")]
    StakeRemaining,
    #[msg("Pool has not been dissolved yet.")]
    PoolStillOpen,
}
