use crate::constants::TRANCHE_COUNT;
use crate::error::{ErrorCode, LedgerResult};
use crate::utils::{eligible_pct, validate_tranches, validate_vesting_period, withdrawal_reward};
use anchor_lang::prelude::*;

/// Construction parameters of a pool.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolConfig {
    /// Reward deposited by the authority when funding the pool.
    pub reward_amount: u64,
    /// Vesting period T, in seconds.
    pub vesting_period: u64,
    /// Percentages unlocked at 2T, 3T and 4T. Must sum to 100.
    pub tranche_pcts: [u8; TRANCHE_COUNT],
}

impl PoolConfig {
    pub fn validate(&self) -> LedgerResult<()> {
        validate_vesting_period(self.vesting_period)?;
        validate_tranches(&self.tranche_pcts)
    }
}

#[account]
#[derive(Default)]
pub struct Pool {
    /// Priviledged account, funds and dissolves the reward pool.
    pub authority: Pubkey,
    /// Nonce to derive the program-derived address owning the vaults.
    pub nonce: u8,
    /// Mint of the token that can be staked.
    pub staking_mint: Pubkey,
    /// Vault to store staked tokens.
    pub staking_vault: Pubkey,
    /// Mint of the reward token.
    pub reward_mint: Pubkey,
    /// Vault to store reward tokens.
    pub reward_vault: Pubkey,
    /// Reward the authority deposits when funding.
    pub reward_amount: u64,
    /// Vesting period T, in seconds.
    pub vesting_period: u64,
    /// Percentages unlocked at 2T, 3T and 4T.
    pub tranche_pcts: [u8; TRANCHE_COUNT],
    /// Pool start (t0), unix seconds.
    pub start_time: u64,
    /// Total staked amount
    pub total_staked: u64,
    /// Stakers with a positive balance
    pub user_stake_count: u32,
    /// Set once by `add_pool_reward`.
    pub funded: bool,
    /// Reward locked in at funding time.
    pub reward_pool_amount: u64,
    /// Reward paid out to stakers so far.
    pub total_reward_withdrawn: u64,
    /// Set by `dissolve_pool_reward`.
    pub closed: bool,
}

impl Pool {
    pub const SIZE: usize = 8 + 32 + 1 + 4 * 32 + 8 + 8 + TRANCHE_COUNT + 8 + 8 + 4 + 1 + 8 + 8 + 1;

    pub fn initialize(
        &mut self,
        authority: Pubkey,
        staking_mint: Pubkey,
        reward_mint: Pubkey,
        config: &PoolConfig,
        start_time: u64,
    ) -> LedgerResult<()> {
        config.validate()?;

        self.authority = authority;
        self.staking_mint = staking_mint;
        self.reward_mint = reward_mint;
        self.reward_amount = config.reward_amount;
        self.vesting_period = config.vesting_period;
        self.tranche_pcts = config.tranche_pcts;
        self.start_time = start_time;
        self.total_staked = 0;
        self.user_stake_count = 0;
        self.funded = false;
        self.reward_pool_amount = 0;
        self.total_reward_withdrawn = 0;
        self.closed = false;

        Ok(())
    }

    pub fn users(&self) -> u32 {
        self.user_stake_count
    }

    pub fn reward_withdrawn(&self) -> u64 {
        self.total_reward_withdrawn
    }

    /// Reward still held for stakers, including rounding dust and reward
    /// forfeited by early exits.
    pub fn remaining_reward(&self) -> u64 {
        self.reward_pool_amount
            .saturating_sub(self.total_reward_withdrawn)
    }

    /// Cumulative percentage unlocked at `now`, `None` before 2T.
    pub fn eligible_pct(&self, now: u64) -> Option<u8> {
        eligible_pct(
            now.saturating_sub(self.start_time),
            self.vesting_period,
            &self.tranche_pcts,
        )
    }

    pub fn check_stake(&self, amount: u64) -> LedgerResult<()> {
        if amount == 0 {
            return Err(ErrorCode::InvalidAmount);
        }
        if self.closed {
            return Err(ErrorCode::PoolClosed);
        }
        // Every balance is bounded by the total.
        self.total_staked
            .checked_add(amount)
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(())
    }

    pub fn record_stake(&mut self, user: &mut User, amount: u64) -> LedgerResult<()> {
        let balance = user
            .balance_staked
            .checked_add(amount)
            .ok_or(ErrorCode::MathOverflow)?;
        let total_staked = self
            .total_staked
            .checked_add(amount)
            .ok_or(ErrorCode::MathOverflow)?;

        if !user.is_active() {
            self.user_stake_count = self
                .user_stake_count
                .checked_add(1)
                .ok_or(ErrorCode::MathOverflow)?;
        }
        user.balance_staked = balance;
        self.total_staked = total_staked;

        Ok(())
    }

    /// Validates a withdrawal of `amount` by `user` at `now` and computes the
    /// reward it pays, without touching any state.
    pub fn plan_withdrawal(&self, user: &User, amount: u64, now: u64) -> LedgerResult<Withdrawal> {
        if amount == 0 {
            return Err(ErrorCode::InvalidAmount);
        }
        if amount > user.balance_staked {
            return Err(ErrorCode::InsufficientStake);
        }
        let eligible = self
            .eligible_pct(now)
            .ok_or(ErrorCode::VestingNotElapsed)?;

        // Unfunded pools release principal only and leave the unlock untouched.
        if !self.funded {
            return Ok(Withdrawal {
                amount,
                reward: 0,
                paid_pct: user.paid_pct,
            });
        }

        let reward = withdrawal_reward(
            self.remaining_reward(),
            user.balance_staked,
            self.total_staked,
            eligible,
            user.paid_pct,
        )?;

        Ok(Withdrawal {
            amount,
            reward,
            paid_pct: eligible.max(user.paid_pct),
        })
    }

    pub fn apply_withdrawal(&mut self, user: &mut User, withdrawal: &Withdrawal) -> LedgerResult<()> {
        let balance = user
            .balance_staked
            .checked_sub(withdrawal.amount)
            .ok_or(ErrorCode::InsufficientStake)?;
        let total_staked = self
            .total_staked
            .checked_sub(withdrawal.amount)
            .ok_or(ErrorCode::MathOverflow)?;
        let total_reward_withdrawn = self
            .total_reward_withdrawn
            .checked_add(withdrawal.reward)
            .ok_or(ErrorCode::MathOverflow)?;
        if total_reward_withdrawn > self.reward_pool_amount {
            return Err(ErrorCode::MathOverflow);
        }
        let reward_received = user
            .reward_received
            .checked_add(withdrawal.reward)
            .ok_or(ErrorCode::MathOverflow)?;

        user.balance_staked = balance;
        user.reward_received = reward_received;
        user.paid_pct = withdrawal.paid_pct;
        self.total_staked = total_staked;
        self.total_reward_withdrawn = total_reward_withdrawn;

        // `paid_pct` outlives the position so a restake cannot collect an
        // already paid tranche again.
        if !user.is_active() {
            self.user_stake_count = self.user_stake_count.saturating_sub(1);
        }

        Ok(())
    }

    /// A staker record carries its paid tranche, so it may only be closed
    /// once the pool is dissolved and nothing can be restaked.
    pub fn check_close_user(&self, user: &User) -> LedgerResult<()> {
        if user.is_active() {
            return Err(ErrorCode::StakeRemaining);
        }
        if !self.closed {
            return Err(ErrorCode::PoolStillOpen);
        }
        Ok(())
    }

    /// Reward `user` would receive by withdrawing everything at `now`.
    pub fn expected_reward(&self, user: &User, now: u64) -> u64 {
        if !user.is_active() {
            return 0;
        }
        self.plan_withdrawal(user, user.balance_staked, now)
            .map(|w| w.reward)
            .unwrap_or(0)
    }

    /// Returns the amount `caller` has to deposit to fund the pool.
    pub fn check_funding(&self, caller: &Pubkey) -> LedgerResult<u64> {
        if *caller != self.authority {
            return Err(ErrorCode::Unauthorized);
        }
        if self.closed {
            return Err(ErrorCode::PoolClosed);
        }
        if self.funded {
            return Err(ErrorCode::AlreadyFunded);
        }
        Ok(self.reward_amount)
    }

    pub fn record_funding(&mut self, amount: u64) {
        self.funded = true;
        self.reward_pool_amount = amount;
    }

    /// Returns the reward left to sweep back to `caller`.
    pub fn check_dissolve(&self, caller: &Pubkey) -> LedgerResult<u64> {
        if *caller != self.authority {
            return Err(ErrorCode::Unauthorized);
        }
        if self.closed {
            return Err(ErrorCode::PoolClosed);
        }
        if self.user_stake_count > 0 {
            return Err(ErrorCode::ActiveStakersRemain);
        }
        Ok(self.remaining_reward())
    }

    pub fn record_dissolve(&mut self) {
        self.closed = true;
    }
}

#[account]
#[derive(Default)]
pub struct User {
    /// Pool the this user belongs to.
    pub pool: Pubkey,
    /// The owner of this account.
    pub owner: Pubkey,
    /// The amount staked.
    pub balance_staked: u64,
    /// Cumulative tranche percentage already paid on the current position.
    pub paid_pct: u8,
    /// Lifetime reward paid to this staker.
    pub reward_received: u64,
    /// Signer nonce.
    pub nonce: u8,
}

impl User {
    pub const SIZE: usize = 8 + 32 + 32 + 8 + 1 + 8 + 1;

    pub fn new(pool: Pubkey, owner: Pubkey) -> Self {
        Self {
            pool,
            owner,
            ..Self::default()
        }
    }

    pub fn check_balance(&self) -> u64 {
        self.balance_staked
    }

    pub fn is_active(&self) -> bool {
        self.balance_staked > 0
    }
}

/// A validated withdrawal, ready to be paid out and applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Withdrawal {
    /// Principal returned to the staker.
    pub amount: u64,
    /// Reward paid alongside the principal.
    pub reward: u64,
    /// Staker's paid percentage once applied.
    pub paid_pct: u8,
}
