pub mod account;
pub mod asset;
pub mod constants;
pub mod context;
pub mod error;
pub mod events;
pub mod ledger;
pub mod time;
pub mod utils;

use account::*;
use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::invoke_signed;
use anchor_spl::token;
use context::*;
use events::*;
use time::cluster_now;

pub use asset::{AssetLedger, MemoryAssetLedger};
pub use ledger::StakingLedger;
pub use time::{ManualClock, SystemClock, TimeSource};

declare_id!("8B1hGbrhMAqi3i2kTQwh3qHxJ8KrSRicd7gstzMHBf41");

#[program]
pub mod tiered_staking {
    use super::*;

    pub fn initialize_pool(
        ctx: Context<InitializePool>,
        pool_nonce: u8,
        config: PoolConfig,
    ) -> Result<()> {
        let start_time = cluster_now()?;
        let pool = &mut ctx.accounts.pool;

        pool.initialize(
            ctx.accounts.authority.key(),
            ctx.accounts.staking_mint.key(),
            ctx.accounts.reward_mint.key(),
            &config,
            start_time,
        )?;
        pool.nonce = pool_nonce;
        pool.staking_vault = ctx.accounts.staking_vault.key();
        pool.reward_vault = ctx.accounts.reward_vault.key();

        emit!(PoolInitialized {
            pool: pool.key(),
            authority: pool.authority,
            reward_amount: pool.reward_amount,
            vesting_period: pool.vesting_period,
            start_time,
        });
        Ok(())
    }

    pub fn create_user(ctx: Context<CreateUser>) -> Result<()> {
        let user = &mut ctx.accounts.user;
        user.pool = *ctx.accounts.pool.to_account_info().key;
        user.owner = *ctx.accounts.owner.key;
        user.balance_staked = 0;
        user.paid_pct = 0;
        user.reward_received = 0;
        user.nonce = *ctx.bumps.get("user").ok_or(ProgramError::InvalidSeeds)?;

        Ok(())
    }

    pub fn stake(ctx: Context<Stake>, amount: u64) -> Result<()> {
        ctx.accounts.pool.check_stake(amount)?;

        // Transfer tokens into the stake vault.
        {
            let cpi_ctx = CpiContext::new(
                ctx.accounts.token_program.to_account_info(),
                token::Transfer {
                    from: ctx.accounts.stake_from_account.to_account_info(),
                    to: ctx.accounts.staking_vault.to_account_info(),
                    authority: ctx.accounts.owner.to_account_info(),
                },
            );
            token::transfer(cpi_ctx, amount)?;
        }

        ctx.accounts
            .pool
            .record_stake(&mut ctx.accounts.user, amount)?;

        msg!("Staked {}", amount);
        emit!(Staked {
            pool: ctx.accounts.pool.key(),
            owner: ctx.accounts.owner.key(),
            amount,
            balance: ctx.accounts.user.balance_staked,
            total_staked: ctx.accounts.pool.total_staked,
        });
        Ok(())
    }

    pub fn withdraw(ctx: Context<Withdraw>, amount: u64) -> Result<()> {
        let now = cluster_now()?;
        let withdrawal = ctx
            .accounts
            .pool
            .plan_withdrawal(&ctx.accounts.user, amount, now)?;

        // Transfer principal and reward from the pool vaults to the user.
        {
            let pool_key = ctx.accounts.pool.key();
            let seeds = &[pool_key.as_ref(), &[ctx.accounts.pool.nonce]];
            let pool_signer = &[&seeds[..]];

            let cpi_ctx = CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                token::Transfer {
                    from: ctx.accounts.staking_vault.to_account_info(),
                    to: ctx.accounts.stake_to_account.to_account_info(),
                    authority: ctx.accounts.pool_signer.to_account_info(),
                },
                pool_signer,
            );
            token::transfer(cpi_ctx, withdrawal.amount)?;

            if withdrawal.reward > 0 {
                let cpi_ctx = CpiContext::new_with_signer(
                    ctx.accounts.token_program.to_account_info(),
                    token::Transfer {
                        from: ctx.accounts.reward_vault.to_account_info(),
                        to: ctx.accounts.reward_account.to_account_info(),
                        authority: ctx.accounts.pool_signer.to_account_info(),
                    },
                    pool_signer,
                );
                token::transfer(cpi_ctx, withdrawal.reward)?;
            }
        }

        ctx.accounts
            .pool
            .apply_withdrawal(&mut ctx.accounts.user, &withdrawal)?;

        msg!(
            "Withdrew {} with reward {} at {}%",
            withdrawal.amount,
            withdrawal.reward,
            withdrawal.paid_pct
        );
        emit!(Withdrawn {
            pool: ctx.accounts.pool.key(),
            owner: ctx.accounts.owner.key(),
            amount: withdrawal.amount,
            reward: withdrawal.reward,
            paid_pct: withdrawal.paid_pct,
            total_staked: ctx.accounts.pool.total_staked,
        });
        Ok(())
    }

    pub fn add_pool_reward(ctx: Context<AddPoolReward>) -> Result<()> {
        let amount = ctx
            .accounts
            .pool
            .check_funding(ctx.accounts.authority.key)?;

        // Transfer reward tokens into the reward vault.
        if amount > 0 {
            let cpi_ctx = CpiContext::new(
                ctx.accounts.token_program.to_account_info(),
                token::Transfer {
                    from: ctx.accounts.from.to_account_info(),
                    to: ctx.accounts.reward_vault.to_account_info(),
                    authority: ctx.accounts.authority.to_account_info(),
                },
            );
            token::transfer(cpi_ctx, amount)?;
        }

        ctx.accounts.pool.record_funding(amount);

        msg!("Reward pool funded with {}", amount);
        emit!(PoolRewardAdded {
            pool: ctx.accounts.pool.key(),
            amount,
        });
        Ok(())
    }

    pub fn dissolve_pool_reward(ctx: Context<DissolvePoolReward>) -> Result<()> {
        ctx.accounts
            .pool
            .check_dissolve(ctx.accounts.authority.key)?;

        let pool_key = ctx.accounts.pool.key();
        let signer_seeds = &[pool_key.as_ref(), &[ctx.accounts.pool.nonce]];

        // The vault balance includes rounding dust and forfeited reward.
        let reward_vault_balance = ctx.accounts.reward_vault.amount;

        if reward_vault_balance > 0 {
            let ix = spl_token::instruction::transfer(
                &spl_token::ID,
                ctx.accounts.reward_vault.to_account_info().key,
                ctx.accounts.reward_refundee.to_account_info().key,
                ctx.accounts.pool_signer.key,
                &[ctx.accounts.pool_signer.key],
                reward_vault_balance,
            )?;
            invoke_signed(
                &ix,
                &[
                    ctx.accounts.token_program.to_account_info(),
                    ctx.accounts.reward_vault.to_account_info(),
                    ctx.accounts.reward_refundee.to_account_info(),
                    ctx.accounts.pool_signer.to_account_info(),
                ],
                &[signer_seeds],
            )?;
        }

        let ix = spl_token::instruction::close_account(
            &spl_token::ID,
            ctx.accounts.reward_vault.to_account_info().key,
            ctx.accounts.authority.key,
            ctx.accounts.pool_signer.key,
            &[ctx.accounts.pool_signer.key],
        )?;
        invoke_signed(
            &ix,
            &[
                ctx.accounts.token_program.to_account_info(),
                ctx.accounts.reward_vault.to_account_info(),
                ctx.accounts.authority.to_account_info(),
                ctx.accounts.pool_signer.to_account_info(),
            ],
            &[signer_seeds],
        )?;

        ctx.accounts.pool.record_dissolve();

        msg!("Reward pool dissolved, {} returned", reward_vault_balance);
        emit!(PoolRewardDissolved {
            pool: pool_key,
            amount: reward_vault_balance,
        });
        Ok(())
    }

    pub fn close_user(ctx: Context<CloseUser>) -> Result<()> {
        ctx.accounts.pool.check_close_user(&ctx.accounts.user)?;

        msg!("Closed staker record of {}", ctx.accounts.owner.key);
        Ok(())
    }
}
