use anchor_lang::prelude::*;

#[event]
pub struct PoolInitialized {
    pub pool: Pubkey,
    pub authority: Pubkey,
    pub reward_amount: u64,
    pub vesting_period: u64,
    pub start_time: u64,
}

#[event]
pub struct Staked {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub balance: u64,
    pub total_staked: u64,
}

#[event]
pub struct Withdrawn {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub reward: u64,
    pub paid_pct: u8,
    pub total_staked: u64,
}

#[event]
pub struct PoolRewardAdded {
    pub pool: Pubkey,
    pub amount: u64,
}

#[event]
pub struct PoolRewardDissolved {
    pub pool: Pubkey,
    pub amount: u64,
}
