use anchor_lang::prelude::*;

use crate::constants::{ENGINE_SEED, TRANSFER_SEED};
use crate::state::{EngineState, TransferRecord};

/// Read-only eligibility quote; never fails for unknown ids.
pub fn can_execute_release(
    ctx: Context<CanExecuteRelease>,
    transfer_id: u64,
    caller: Pubkey,
) -> Result<bool> {
    let st = &ctx.accounts.engine_state;
    let now = Clock::get()?.unix_timestamp;

    let record = TransferRecord::load(&ctx.accounts.transfer_record.to_account_info())?;
    let (eligible, next_release_ts) = match record {
        Some(r) if r.id == transfer_id => (
            !st.paused && r.can_release(now, &caller, &st.keeper),
            r.next_release_ts,
        ),
        _ => (false, 0),
    };

    emit!(ReleaseEligibility {
        transfer_id,
        caller,
        eligible,
        next_release_ts,
        now,
    });

    Ok(eligible)
}

#[derive(Accounts)]
#[instruction(transfer_id: u64)]
pub struct CanExecuteRelease<'info> {
    #[account(seeds = [ENGINE_SEED], bump)]
    pub engine_state: Account<'info, EngineState>,

    #[account(seeds = [TRANSFER_SEED, &transfer_id.to_le_bytes()], bump)]
    /// CHECK: May be uninitialized; an absent record quotes as not eligible.
    pub transfer_record: UncheckedAccount<'info>,
}

#[event]
pub struct ReleaseEligibility {
    pub transfer_id: u64,
    pub caller: Pubkey,
    pub eligible: bool,
    pub next_release_ts: i64,
    pub now: i64,
}
