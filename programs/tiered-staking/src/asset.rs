//! Token movement as seen by the off-chain ledger.
//!
//! On chain the SPL token program plays this role through CPI; off chain any
//! custody backend can be plugged into [`crate::ledger::StakingLedger`] by
//! implementing [`AssetLedger`].

use crate::error::{ErrorCode, LedgerResult};
use anchor_lang::prelude::Pubkey;
use std::collections::HashMap;

pub trait AssetLedger {
    /// Moves `amount` of `asset` from `owner` into pool custody, bounded by the
    /// allowance `owner` granted the pool.
    fn transfer_from(&mut self, asset: &Pubkey, owner: &Pubkey, amount: u64) -> LedgerResult<()>;

    /// Moves `amount` of `asset` out of pool custody to `recipient`. Fails
    /// without moving anything when custody holds less than `amount`.
    fn transfer_to(&mut self, asset: &Pubkey, recipient: &Pubkey, amount: u64) -> LedgerResult<()>;

    fn balance_of(&self, asset: &Pubkey, account: &Pubkey) -> u64;

    /// Account holding everything the pool takes in.
    fn custody(&self) -> Pubkey;
}

/// In-memory token balances and pool allowances, keyed by `(asset, account)`.
#[derive(Debug, Default, Clone)]
pub struct MemoryAssetLedger {
    custody: Pubkey,
    balances: HashMap<(Pubkey, Pubkey), u64>,
    allowances: HashMap<(Pubkey, Pubkey), u64>,
}

impl MemoryAssetLedger {
    /// `custody` is the account holding everything the pool takes in.
    pub fn new(custody: Pubkey) -> Self {
        Self {
            custody,
            ..Self::default()
        }
    }

    pub fn mint(&mut self, asset: &Pubkey, account: &Pubkey, amount: u64) {
        let balance = self.balances.entry((*asset, *account)).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Plain account-to-account transfer.
    pub fn transfer(
        &mut self,
        asset: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> LedgerResult<()> {
        let held = self.balance_of(asset, from);
        if held < amount {
            return Err(ErrorCode::BalanceExceeded);
        }
        self.balances.insert((*asset, *from), held - amount);
        self.mint(asset, to, amount);
        Ok(())
    }

    /// Sets the allowance `owner` grants the pool, replacing any previous one.
    pub fn approve(&mut self, asset: &Pubkey, owner: &Pubkey, amount: u64) {
        self.allowances.insert((*asset, *owner), amount);
    }

    pub fn allowance(&self, asset: &Pubkey, owner: &Pubkey) -> u64 {
        self.allowances
            .get(&(*asset, *owner))
            .copied()
            .unwrap_or_default()
    }
}

impl AssetLedger for MemoryAssetLedger {
    fn transfer_from(&mut self, asset: &Pubkey, owner: &Pubkey, amount: u64) -> LedgerResult<()> {
        let allowance = self.allowance(asset, owner);
        if allowance < amount {
            return Err(ErrorCode::AllowanceExceeded);
        }
        let custody = self.custody;
        self.transfer(asset, owner, &custody, amount)?;
        self.allowances.insert((*asset, *owner), allowance - amount);
        Ok(())
    }

    fn transfer_to(&mut self, asset: &Pubkey, recipient: &Pubkey, amount: u64) -> LedgerResult<()> {
        let custody = self.custody;
        self.transfer(asset, &custody, recipient, amount)
    }

    fn balance_of(&self, asset: &Pubkey, account: &Pubkey) -> u64 {
        self.balances
            .get(&(*asset, *account))
            .copied()
            .unwrap_or_default()
    }

    fn custody(&self) -> Pubkey {
        self.custody
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_from_spends_allowance() {
        let custody = Pubkey::new_unique();
        let asset = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let mut ledger = MemoryAssetLedger::new(custody);
        ledger.mint(&asset, &owner, 500);
        ledger.approve(&asset, &owner, 300);

        ledger.transfer_from(&asset, &owner, 200).unwrap();

        assert_eq!(ledger.balance_of(&asset, &owner), 300);
        assert_eq!(ledger.balance_of(&asset, &custody), 200);
        assert_eq!(ledger.allowance(&asset, &owner), 100);
    }

    #[test]
    fn transfer_from_failures_leave_balances() {
        let custody = Pubkey::new_unique();
        let asset = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let mut ledger = MemoryAssetLedger::new(custody);
        ledger.mint(&asset, &owner, 100);

        assert!(matches!(
            ledger.transfer_from(&asset, &owner, 50),
            Err(ErrorCode::AllowanceExceeded)
        ));

        ledger.approve(&asset, &owner, 1_000);
        assert!(matches!(
            ledger.transfer_from(&asset, &owner, 150),
            Err(ErrorCode::BalanceExceeded)
        ));
        assert_eq!(ledger.balance_of(&asset, &owner), 100);
        assert_eq!(ledger.balance_of(&asset, &custody), 0);
        assert_eq!(ledger.allowance(&asset, &owner), 1_000);
    }

    #[test]
    fn balances_are_per_asset() {
        let custody = Pubkey::new_unique();
        let staked = Pubkey::new_unique();
        let reward = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let mut ledger = MemoryAssetLedger::new(custody);
        ledger.mint(&staked, &owner, 10);
        ledger.approve(&staked, &owner, 10);
        ledger.transfer_from(&staked, &owner, 10).unwrap();

        ledger.mint(&reward, &custody, 7);
        ledger.transfer_to(&reward, &owner, 7).unwrap();

        assert_eq!(ledger.balance_of(&staked, &custody), 10);
        assert_eq!(ledger.balance_of(&reward, &custody), 0);
        assert_eq!(ledger.balance_of(&reward, &owner), 7);
        assert_eq!(ledger.balance_of(&staked, &owner), 0);
    }

    #[test]
    fn transfer_to_refuses_more_than_custody_holds() {
        let custody = Pubkey::new_unique();
        let asset = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();
        let mut ledger = MemoryAssetLedger::new(custody);
        ledger.mint(&asset, &custody, 40);

        assert!(matches!(
            ledger.transfer_to(&asset, &recipient, 41),
            Err(ErrorCode::BalanceExceeded)
        ));
        assert_eq!(ledger.balance_of(&asset, &custody), 40);
        assert_eq!(ledger.balance_of(&asset, &recipient), 0);

        ledger.transfer_to(&asset, &recipient, 40).unwrap();
        assert_eq!(ledger.balance_of(&asset, &custody), 0);
        assert_eq!(ledger.balance_of(&asset, &recipient), 40);
    }
}
