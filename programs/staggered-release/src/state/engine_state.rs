use anchor_lang::prelude::*;

use crate::constants::{PRODUCTION_RELEASE_INTERVAL, TEST_RELEASE_INTERVAL};
use crate::error::{StaggeredError, StaggeredResult};
use crate::utils::schedule::compute_schedule;

/// Singleton engine state PDA: deployment config plus running counters.
#[account]
pub struct EngineState {
    /// Token mint held in custody.
    pub mint: Pubkey,
    /// Owner authority (emergency paths, keeper rotation, pause).
    pub owner: Pubkey,
    /// Sweep capability key (signs `process_pending_releases`).
    pub keeper: Pubkey,
    /// First tranche of a staggered schedule.
    pub unit_step: u64,
    /// Amounts strictly below this are paid out in one step.
    pub immediate_threshold: u64,
    /// Seconds between tranches, fixed at initialization.
    pub release_interval: i64,
    /// Whether `release_interval` was taken from the test-mode constant.
    pub test_mode: bool,
    /// Emergency pause flag (blocks creation, claims and sweeps).
    pub paused: bool,
    /// Id handed to the next created transfer (monotonic, never reused).
    pub next_transfer_id: u64,
    /// Transfers ever created.
    pub total_transfers: u64,
    /// Release steps ever executed (normal and emergency).
    pub total_releases: u64,
    /// Records currently active.
    pub active_transfers: u64,
    /// Tokens paid out to recipients through release steps.
    pub total_released_amount: u64,
    /// Sum of remaining_amount over active records (custody the vault must back).
    pub outstanding_amount: u64,
    /// Active index pages opened so far (pages 0..active_pages exist).
    pub active_pages: u32,
}

/// What `create_staggered_transfer` will do with an amount.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferPlan {
    pub schedule: Vec<u64>,
    /// Below the threshold: paid out in full at creation, never indexed as active.
    pub immediate: bool,
}

impl EngineState {
    pub const SIZE: usize =
        32 + // mint
        32 + // owner
        32 + // keeper
        8 +  // unit_step
        8 +  // immediate_threshold
        8 +  // release_interval
        1 +  // test_mode
        1 +  // paused
        8 +  // next_transfer_id
        8 +  // total_transfers
        8 +  // total_releases
        8 +  // active_transfers
        8 +  // total_released_amount
        8 +  // outstanding_amount
        4;   // active_pages

    pub fn interval_for(test_mode: bool) -> i64 {
        if test_mode {
            TEST_RELEASE_INTERVAL
        } else {
            PRODUCTION_RELEASE_INTERVAL
        }
    }

    pub fn plan_transfer(&self, amount: u64) -> StaggeredResult<TransferPlan> {
        let schedule = compute_schedule(amount, self.unit_step, self.immediate_threshold)?;
        Ok(TransferPlan {
            schedule,
            immediate: amount < self.immediate_threshold,
        })
    }

    /// Pages must stay contiguous so sweepers can enumerate 0..active_pages.
    /// Targeting the next unopened page opens it.
    pub fn use_active_page(&mut self, page: u32) -> StaggeredResult<()> {
        if page > self.active_pages {
            return Err(StaggeredError::InvalidActivePage);
        }
        if page == self.active_pages {
            self.active_pages = page.checked_add(1).ok_or(StaggeredError::MathOverflow)?;
        }
        Ok(())
    }

    /// Hands out the next id and books the committed amount.
    pub fn register_transfer(&mut self, total_amount: u64) -> StaggeredResult<u64> {
        let id = self.next_transfer_id;
        self.next_transfer_id = id.checked_add(1).ok_or(StaggeredError::MathOverflow)?;
        self.total_transfers = self
            .total_transfers
            .checked_add(1)
            .ok_or(StaggeredError::MathOverflow)?;
        self.active_transfers = self
            .active_transfers
            .checked_add(1)
            .ok_or(StaggeredError::MathOverflow)?;
        self.outstanding_amount = self
            .outstanding_amount
            .checked_add(total_amount)
            .ok_or(StaggeredError::MathOverflow)?;
        Ok(id)
    }

    /// Books one executed release step.
    pub fn record_release(&mut self, amount: u64, completed: bool) -> StaggeredResult<()> {
        self.total_releases = self
            .total_releases
            .checked_add(1)
            .ok_or(StaggeredError::MathOverflow)?;
        self.total_released_amount = self
            .total_released_amount
            .checked_add(amount)
            .ok_or(StaggeredError::MathOverflow)?;
        self.outstanding_amount = self
            .outstanding_amount
            .checked_sub(amount)
            .ok_or(StaggeredError::MathOverflow)?;
        if completed {
            self.mark_inactive()?;
        }
        Ok(())
    }

    /// Books a forced closure that disposed of `amount` outside the schedule.
    pub fn record_closure(&mut self, amount: u64) -> StaggeredResult<()> {
        self.outstanding_amount = self
            .outstanding_amount
            .checked_sub(amount)
            .ok_or(StaggeredError::MathOverflow)?;
        self.mark_inactive()
    }

    /// Custody held by the vault beyond what live records are owed.
    pub fn surplus(&self, vault_amount: u64) -> u64 {
        vault_amount.saturating_sub(self.outstanding_amount)
    }

    /// Guard for returning stray custody: funds owed to live records stay put.
    pub fn check_surplus_return(&self, vault_amount: u64, amount: u64) -> StaggeredResult<()> {
        if amount == 0 {
            return Err(StaggeredError::InvalidAmount);
        }
        if self.surplus(vault_amount) < amount {
            return Err(StaggeredError::InsufficientCustodyBalance);
        }
        Ok(())
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_transfers: self.total_transfers,
            total_releases: self.total_releases,
            active_transfers: self.active_transfers,
            total_released_amount: self.total_released_amount,
            outstanding_amount: self.outstanding_amount,
        }
    }

    fn mark_inactive(&mut self) -> StaggeredResult<()> {
        self.active_transfers = self
            .active_transfers
            .checked_sub(1)
            .ok_or(StaggeredError::MathOverflow)?;
        Ok(())
    }
}

/// Aggregate counters returned by `get_stats`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub total_transfers: u64,
    pub total_releases: u64,
    pub active_transfers: u64,
    pub total_released_amount: u64,
    pub outstanding_amount: u64,
}
