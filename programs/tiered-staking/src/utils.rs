use crate::constants::{PERCENT_DENOMINATOR, TRANCHE_COUNT, TRANCHE_UNLOCK_PERIODS};
use crate::error::{ErrorCode, LedgerResult};
use std::convert::TryFrom;

pub fn validate_tranches(tranche_pcts: &[u8; TRANCHE_COUNT]) -> LedgerResult<()> {
    let total: u16 = tranche_pcts.iter().map(|pct| u16::from(*pct)).sum();
    if total != u16::from(PERCENT_DENOMINATOR) {
        return Err(ErrorCode::InvalidTranches);
    }
    Ok(())
}

pub fn validate_vesting_period(vesting_period: u64) -> LedgerResult<()> {
    let last_boundary = TRANCHE_UNLOCK_PERIODS[TRANCHE_COUNT - 1];
    if vesting_period == 0 || vesting_period.checked_mul(last_boundary).is_none() {
        return Err(ErrorCode::InvalidVestingPeriod);
    }
    Ok(())
}

/// Cumulative reward percentage unlocked `elapsed` seconds after the pool
/// started, or `None` before the first tranche boundary.
pub fn eligible_pct(
    elapsed: u64,
    vesting_period: u64,
    tranche_pcts: &[u8; TRANCHE_COUNT],
) -> Option<u8> {
    let mut eligible = None;
    let mut cumulative: u8 = 0;
    for (periods, pct) in TRANCHE_UNLOCK_PERIODS.iter().zip(tranche_pcts.iter()) {
        if elapsed < vesting_period.saturating_mul(*periods) {
            break;
        }
        cumulative = cumulative.saturating_add(*pct);
        eligible = Some(cumulative);
    }
    eligible
}

/// Reward paid to a staker holding `balance` out of `total_staked` when they
/// withdraw with `eligible_pct` unlocked, having already been paid `paid_pct`.
///
/// The staker's pot is their pro-rata share of the unpaid pool; the newly
/// unlocked slice of what is still owed to them is paid out of it. A sole
/// staker's pot is the whole remainder, so the last withdrawal at 100% drains
/// the pool exactly.
pub fn withdrawal_reward(
    remaining: u64,
    balance: u64,
    total_staked: u64,
    eligible_pct: u8,
    paid_pct: u8,
) -> LedgerResult<u64> {
    if eligible_pct <= paid_pct || remaining == 0 || balance == 0 {
        return Ok(0);
    }

    let pot = if balance >= total_staked {
        remaining as u128
    } else {
        (remaining as u128)
            .checked_mul(balance as u128)
            .ok_or(ErrorCode::MathOverflow)?
            / total_staked as u128
    };

    let unlocked = u128::from(eligible_pct - paid_pct);
    let owed = u128::from(PERCENT_DENOMINATOR.saturating_sub(paid_pct));
    let reward = pot
        .checked_mul(unlocked)
        .and_then(|v| v.checked_div(owed))
        .ok_or(ErrorCode::MathOverflow)?;

    u64::try_from(reward).map_err(|_| ErrorCode::MathOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANCHES: [u8; 3] = [20, 30, 50];

    #[test]
    fn tranche_windows() {
        assert_eq!(eligible_pct(0, 300, &TRANCHES), None);
        assert_eq!(eligible_pct(599, 300, &TRANCHES), None);
        assert_eq!(eligible_pct(600, 300, &TRANCHES), Some(20));
        assert_eq!(eligible_pct(899, 300, &TRANCHES), Some(20));
        assert_eq!(eligible_pct(900, 300, &TRANCHES), Some(50));
        assert_eq!(eligible_pct(1199, 300, &TRANCHES), Some(50));
        assert_eq!(eligible_pct(1200, 300, &TRANCHES), Some(100));
        assert_eq!(eligible_pct(u64::MAX, 300, &TRANCHES), Some(100));
    }

    #[test]
    fn empty_first_tranche_still_opens_withdrawals() {
        assert_eq!(eligible_pct(600, 300, &[0, 0, 100]), Some(0));
        assert_eq!(eligible_pct(1200, 300, &[0, 0, 100]), Some(100));
    }

    #[test]
    fn tranche_validation() {
        assert!(validate_tranches(&TRANCHES).is_ok());
        assert!(validate_tranches(&[0, 0, 100]).is_ok());
        assert!(matches!(
            validate_tranches(&[20, 30, 40]),
            Err(ErrorCode::InvalidTranches)
        ));
        assert!(matches!(
            validate_tranches(&[200, 200, 112]),
            Err(ErrorCode::InvalidTranches)
        ));
    }

    #[test]
    fn vesting_period_validation() {
        assert!(validate_vesting_period(300).is_ok());
        assert!(matches!(
            validate_vesting_period(0),
            Err(ErrorCode::InvalidVestingPeriod)
        ));
        assert!(matches!(
            validate_vesting_period(u64::MAX / 2),
            Err(ErrorCode::InvalidVestingPeriod)
        ));
    }

    #[test]
    fn first_withdrawal_is_share_times_unlocked_pct() {
        // 1000 * 400/1000 * 20%
        assert_eq!(withdrawal_reward(1000, 400, 1000, 20, 0).unwrap(), 80);
        // 1000 * 250/1000 * 100%
        assert_eq!(withdrawal_reward(1000, 250, 1000, 100, 0).unwrap(), 250);
    }

    #[test]
    fn already_paid_tranche_pays_nothing() {
        assert_eq!(withdrawal_reward(1000, 400, 1000, 20, 20).unwrap(), 0);
        assert_eq!(withdrawal_reward(1000, 400, 1000, 50, 100).unwrap(), 0);
    }

    #[test]
    fn later_tranche_pays_only_the_new_slice() {
        // pot = 782 * 200/700 = 223, then 30 of the 80 still owed
        assert_eq!(withdrawal_reward(782, 200, 700, 50, 20).unwrap(), 83);
    }

    #[test]
    fn sole_staker_takes_the_remainder_at_full_unlock() {
        assert_eq!(withdrawal_reward(437, 300, 300, 100, 50).unwrap(), 437);
        assert_eq!(withdrawal_reward(437, 300, 0, 100, 0).unwrap(), 437);
    }

    #[test]
    fn large_amounts_do_not_overflow() {
        let reward = withdrawal_reward(u64::MAX, u64::MAX / 2, u64::MAX, 100, 0).unwrap();
        assert_eq!(reward, u64::MAX / 2);
    }
}
