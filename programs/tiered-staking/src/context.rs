use crate::account::*;
use crate::error::ErrorCode;
use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::token::{Mint, Token, TokenAccount};

#[derive(Accounts)]
#[instruction(pool_nonce: u8)]
pub struct InitializePool<'info> {
    /// CHECK: nothing to check.
    pub authority: AccountInfo<'info>,

    pub staking_mint: Box<Account<'info, Mint>>,
    #[account(
        constraint = staking_vault.mint == staking_mint.key(),
        constraint = staking_vault.owner == pool_signer.key(),
        // the vault must stay open until the pool dissolves
        constraint = staking_vault.close_authority == COption::None,
    )]
    pub staking_vault: Box<Account<'info, TokenAccount>>,

    pub reward_mint: Box<Account<'info, Mint>>,
    #[account(
        constraint = reward_vault.mint == reward_mint.key(),
        constraint = reward_vault.owner == pool_signer.key(),
        constraint = reward_vault.close_authority == COption::None,
        constraint = reward_vault.key() != staking_vault.key(),
    )]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        seeds = [
            pool.to_account_info().key.as_ref()
        ],
        bump = pool_nonce,
    )]
    /// CHECK: nothing to check.
    pub pool_signer: AccountInfo<'info>,

    #[account(
        zero,
    )]
    pub pool: Box<Account<'info, Pool>>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct CreateUser<'info> {
    #[account(
        constraint = !pool.closed @ ErrorCode::PoolClosed,
    )]
    pub pool: Box<Account<'info, Pool>>,
    #[account(
        init,
        payer = owner,
        space = User::SIZE,
        seeds = [
            owner.key.as_ref(),
            pool.to_account_info().key.as_ref()
        ],
        bump
    )]
    pub user: Box<Account<'info, User>>,
    #[account(mut)]
    pub owner: Signer<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct Stake<'info> {
    #[account(
        mut,
        has_one = staking_vault,
    )]
    pub pool: Box<Account<'info, Pool>>,
    #[account(mut)]
    pub staking_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        has_one = owner,
        has_one = pool,
        seeds = [
            owner.key.as_ref(),
            pool.to_account_info().key.as_ref()
        ],
        bump = user.nonce,
    )]
    pub user: Box<Account<'info, User>>,
    pub owner: Signer<'info>,
    #[account(
        mut,
        constraint = stake_from_account.mint == pool.staking_mint,
    )]
    pub stake_from_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct Withdraw<'info> {
    #[account(
        mut,
        has_one = staking_vault,
        has_one = reward_vault,
    )]
    pub pool: Box<Account<'info, Pool>>,
    #[account(mut)]
    pub staking_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        has_one = owner,
        has_one = pool,
        seeds = [
            owner.key.as_ref(),
            pool.to_account_info().key.as_ref()
        ],
        bump = user.nonce,
    )]
    pub user: Box<Account<'info, User>>,
    pub owner: Signer<'info>,
    #[account(
        mut,
        constraint = stake_to_account.mint == pool.staking_mint,
    )]
    pub stake_to_account: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        constraint = reward_account.mint == pool.reward_mint,
    )]
    pub reward_account: Box<Account<'info, TokenAccount>>,

    #[account(
        seeds = [
            pool.to_account_info().key.as_ref()
        ],
        bump = pool.nonce,
    )]
    /// CHECK: nothing to check.
    pub pool_signer: AccountInfo<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct AddPoolReward<'info> {
    #[account(
        mut,
        has_one = authority @ ErrorCode::Unauthorized,
        has_one = reward_vault,
    )]
    pub pool: Box<Account<'info, Pool>>,
    #[account(mut)]
    pub reward_vault: Box<Account<'info, TokenAccount>>,
    pub authority: Signer<'info>,
    #[account(
        mut,
        constraint = from.mint == pool.reward_mint,
    )]
    pub from: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct DissolvePoolReward<'info> {
    #[account(
        mut,
        has_one = authority @ ErrorCode::Unauthorized,
        has_one = reward_vault,
    )]
    pub pool: Box<Account<'info, Pool>>,
    #[account(mut)]
    pub authority: Signer<'info>,
    #[account(mut)]
    pub reward_vault: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        constraint = reward_refundee.mint == pool.reward_mint,
    )]
    pub reward_refundee: Box<Account<'info, TokenAccount>>,
    #[account(
        seeds = [
            pool.to_account_info().key.as_ref()
        ],
        bump = pool.nonce,
    )]
    /// CHECK: nothing to check.
    pub pool_signer: AccountInfo<'info>,
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct CloseUser<'info> {
    pub pool: Box<Account<'info, Pool>>,
    #[account(
        mut,
        close = owner,
        has_one = owner,
        has_one = pool,
        seeds = [
            owner.key.as_ref(),
            pool.to_account_info().key.as_ref()
        ],
        bump = user.nonce,
    )]
    pub user: Account<'info, User>,
    #[account(mut)]
    pub owner: Signer<'info>,
}
