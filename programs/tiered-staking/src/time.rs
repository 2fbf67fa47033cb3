use crate::error::ErrorCode;
use anchor_lang::prelude::*;
use anchor_lang::solana_program::clock;
use std::cell::Cell;
use std::convert::TryFrom;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the unix epoch, read once per ledger operation.
pub trait TimeSource {
    fn now(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn set(&self, now: u64) {
        self.now.set(now);
    }

    pub fn advance(&self, secs: u64) {
        self.now.set(self.now.get().saturating_add(secs));
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> u64 {
        self.now.get()
    }
}

/// Cluster time from the `Clock` sysvar.
pub fn cluster_now() -> Result<u64> {
    let clock = clock::Clock::get()?;
    u64::try_from(clock.unix_timestamp).map_err(|_| ErrorCode::MathOverflow.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_on_request() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now(), 1_000);
        clock.advance(620);
        assert_eq!(clock.now(), 1_620);
        clock.set(5);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn system_clock_is_past_epoch() {
        assert!(SystemClock.now() > 0);
    }
}
