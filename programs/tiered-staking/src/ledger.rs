//! Off-chain staking ledger.
//!
//! Runs the same `Pool`/`User` transitions as the program, with custody and
//! time injected. Every operation validates first, moves tokens second and
//! only then mutates the ledger, so a failed call leaves no trace.

use crate::account::{Pool, PoolConfig, User};
use crate::asset::AssetLedger;
use crate::error::{ErrorCode, LedgerResult};
use crate::time::TimeSource;
use anchor_lang::prelude::{msg, Pubkey};
use std::collections::BTreeMap;

pub struct StakingLedger<A, C> {
    address: Pubkey,
    pool: Pool,
    stakers: BTreeMap<Pubkey, User>,
    assets: A,
    clock: C,
}

impl<A: AssetLedger, C: TimeSource> StakingLedger<A, C> {
    /// Creates a pool owned by `authority`, starting now.
    pub fn new(
        address: Pubkey,
        authority: Pubkey,
        staking_mint: Pubkey,
        reward_mint: Pubkey,
        config: &PoolConfig,
        assets: A,
        clock: C,
    ) -> LedgerResult<Self> {
        let mut pool = Pool::default();
        pool.initialize(authority, staking_mint, reward_mint, config, clock.now())?;
        msg!(
            "Pool {} started at {}, vesting period {}s",
            address,
            pool.start_time,
            pool.vesting_period
        );

        Ok(Self {
            address,
            pool,
            stakers: BTreeMap::new(),
            assets,
            clock,
        })
    }

    pub fn stake(&mut self, caller: &Pubkey, amount: u64) -> LedgerResult<()> {
        self.pool.check_stake(amount)?;
        self.assets
            .transfer_from(&self.pool.staking_mint, caller, amount)?;

        let address = self.address;
        let user = self
            .stakers
            .entry(*caller)
            .or_insert_with(|| User::new(address, *caller));
        self.pool.record_stake(user, amount)?;

        msg!("{} staked {}, balance {}", caller, amount, user.balance_staked);
        Ok(())
    }

    /// Returns the principal to `caller` with whatever reward has unlocked, and
    /// the reward paid.
    ///
    /// A staker who withdraws everything keeps a zero-balance record so the
    /// tranches already paid stay paid if they stake again.
    pub fn withdraw(&mut self, caller: &Pubkey, amount: u64) -> LedgerResult<u64> {
        let now = self.clock.now();
        let mut user = self.stakers.get(caller).cloned().unwrap_or_default();
        let withdrawal = self.pool.plan_withdrawal(&user, amount, now)?;

        let mut pool = self.pool.clone();
        pool.apply_withdrawal(&mut user, &withdrawal)?;
        self.check_custody_covers(withdrawal.amount, withdrawal.reward)?;

        self.assets
            .transfer_to(&self.pool.staking_mint, caller, withdrawal.amount)?;
        if withdrawal.reward > 0 {
            self.assets
                .transfer_to(&self.pool.reward_mint, caller, withdrawal.reward)?;
        }

        self.pool = pool;
        self.stakers.insert(*caller, user);

        msg!(
            "{} withdrew {} with reward {} at {}%",
            caller,
            withdrawal.amount,
            withdrawal.reward,
            withdrawal.paid_pct
        );
        Ok(withdrawal.reward)
    }

    pub fn add_pool_reward(&mut self, caller: &Pubkey) -> LedgerResult<()> {
        let amount = self.pool.check_funding(caller)?;
        self.assets
            .transfer_from(&self.pool.reward_mint, caller, amount)?;
        self.pool.record_funding(amount);

        msg!("Reward pool funded with {}", amount);
        Ok(())
    }

    /// Sweeps the unpaid reward back to the authority and closes the pool.
    /// Returns the amount swept.
    ///
    /// Only the ledger's own unpaid remainder leaves custody. When both mints
    /// are the same asset, staked principal sharing the custody account is
    /// never part of the sweep.
    pub fn dissolve_pool_reward(&mut self, caller: &Pubkey) -> LedgerResult<u64> {
        let amount = self.pool.check_dissolve(caller)?;
        if amount > 0 {
            self.assets
                .transfer_to(&self.pool.reward_mint, caller, amount)?;
        }
        self.pool.record_dissolve();

        msg!("Reward pool dissolved, {} returned", amount);
        Ok(amount)
    }

    /// Fails with `BalanceExceeded` unless custody holds both payouts, so the
    /// principal never moves when the reward transfer would fail.
    fn check_custody_covers(&self, principal: u64, reward: u64) -> LedgerResult<()> {
        let custody = self.assets.custody();
        let staking_mint = &self.pool.staking_mint;
        let reward_mint = &self.pool.reward_mint;

        if staking_mint == reward_mint {
            let needed = principal
                .checked_add(reward)
                .ok_or(ErrorCode::MathOverflow)?;
            if self.assets.balance_of(staking_mint, &custody) < needed {
                return Err(ErrorCode::BalanceExceeded);
            }
            return Ok(());
        }

        if self.assets.balance_of(staking_mint, &custody) < principal
            || self.assets.balance_of(reward_mint, &custody) < reward
        {
            return Err(ErrorCode::BalanceExceeded);
        }
        Ok(())
    }

    pub fn check_balance(&self, caller: &Pubkey) -> u64 {
        self.stakers
            .get(caller)
            .map(User::check_balance)
            .unwrap_or_default()
    }

    pub fn users(&self) -> u32 {
        self.pool.users()
    }

    pub fn reward_withdrawn(&self) -> u64 {
        self.pool.reward_withdrawn()
    }

    pub fn expected_reward(&self, caller: &Pubkey) -> u64 {
        self.stakers
            .get(caller)
            .map(|user| self.pool.expected_reward(user, self.clock.now()))
            .unwrap_or_default()
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn staker(&self, owner: &Pubkey) -> Option<&User> {
        self.stakers.get(owner)
    }

    pub fn stakers(&self) -> impl Iterator<Item = &User> {
        self.stakers.values()
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut A {
        &mut self.assets
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
