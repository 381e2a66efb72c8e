use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::constants::{ACTIVE_SEED, ENGINE_SEED, MAX_BATCH_RELEASE, VAULT_SEED};
use crate::error::StaggeredError;
use crate::state::{ActiveTransfers, EngineState, TransferRecord};
use crate::utils::release::{ReleasePlan, SweepSummary, SweepTally};
use crate::utils::token::{check_recipient_ata, transfer_from_vault};

use super::execute_staggered_release::StaggeredReleaseExecuted;

/// Sweeps one active page. Remaining accounts: `(transfer_record, recipient_ata)`
/// pairs, both writable.
///
/// A candidate that fails validation is counted and skipped with nothing
/// changed. Once a CPI has gone out, any later error aborts the whole
/// transaction so custody and records never disagree.
pub fn process_pending_releases<'info>(
    ctx: Context<'_, '_, 'info, 'info, ProcessPendingReleases<'info>>,
    batch_limit: u8,
) -> Result<SweepSummary> {
    require!(batch_limit > 0, StaggeredError::EmptyBatch);
    require!(
        ctx.remaining_accounts.len() % 2 == 0,
        StaggeredError::SweepAccountsMismatch
    );

    let engine_state_ai = ctx.accounts.engine_state.to_account_info();
    let engine_state_bump = ctx.bumps.engine_state;
    let keeper = ctx.accounts.keeper.key();

    let ProcessPendingReleases {
        engine_state: st,
        active_page,
        vault,
        token_program,
        ..
    } = &mut *ctx.accounts;

    require_keys_eq!(keeper, st.keeper, StaggeredError::UnauthorizedKeeper);
    require!(!st.paused, StaggeredError::EnginePaused);

    let now = Clock::get()?.unix_timestamp;
    let limit = (batch_limit as usize).min(MAX_BATCH_RELEASE);
    let mut tally = SweepTally::begin(vault.amount);

    for pair in ctx.remaining_accounts.chunks(2).take(limit) {
        let (record_ai, ata_ai) = (&pair[0], &pair[1]);
        tally.scan();

        let plan = match prepare(st, active_page, &tally, record_ai, ata_ai, now, &keeper) {
            Ok(Some(plan)) => plan,
            Ok(None) => continue,
            Err(err) => {
                tally.fail();
                msg!("sweep: skipped record {}: {}", record_ai.key, err);
                continue;
            }
        };

        transfer_from_vault(
            token_program.to_account_info(),
            vault.to_account_info(),
            ata_ai.clone(),
            engine_state_ai.clone(),
            engine_state_bump,
            plan.effect.amount,
        )?;

        let ReleasePlan { record, effect } = plan;
        record.store(record_ai)?;
        st.record_release(effect.amount, effect.completed)?;
        if effect.completed {
            active_page.remove(record.id);
        }
        tally.commit(&effect)?;

        emit!(StaggeredReleaseExecuted {
            transfer_id: record.id,
            recipient: record.recipient,
            caller: keeper,
            step_index: effect.step_index,
            amount: effect.amount,
            remaining_amount: effect.remaining_amount,
            next_release_ts: effect.next_release_ts,
            completed: effect.completed,
        });
    }

    let summary = tally.finish();
    emit!(SweepCompleted {
        keeper,
        page: active_page.page,
        scanned: summary.scanned,
        released: summary.released,
        failed: summary.failed,
        total_amount: summary.total_amount,
    });

    Ok(summary)
}

/// Every check for one candidate; `Ok(None)` when it is not due on this page.
fn prepare<'info>(
    st: &EngineState,
    page: &ActiveTransfers,
    tally: &SweepTally,
    record_ai: &'info AccountInfo<'info>,
    ata_ai: &'info AccountInfo<'info>,
    now: i64,
    keeper: &Pubkey,
) -> Result<Option<ReleasePlan>> {
    let Some(record) = TransferRecord::load(record_ai)? else {
        return Ok(None);
    };
    let Some(plan) = tally.plan(&record, page, now, keeper, st.release_interval)? else {
        return Ok(None);
    };
    require!(
        record_ai.is_writable && ata_ai.is_writable,
        StaggeredError::InvalidConfig
    );
    let ata = Account::<TokenAccount>::try_from(ata_ai)?;
    check_recipient_ata(ata_ai.key, &ata, &record.recipient, &st.mint)?;
    Ok(Some(plan))
}

#[derive(Accounts)]
pub struct ProcessPendingReleases<'info> {
    #[account(mut, seeds = [ENGINE_SEED], bump)]
    pub engine_state: Box<Account<'info, EngineState>>,

    #[account(
        mut,
        seeds = [ACTIVE_SEED, engine_state.key().as_ref(), &active_page.page.to_le_bytes()],
        bump = active_page.bump
    )]
    pub active_page: Box<Account<'info, ActiveTransfers>>,

    #[account(
        mut,
        seeds = [VAULT_SEED, engine_state.key().as_ref()],
        bump,
        constraint = vault.mint == engine_state.mint @ StaggeredError::InvalidTokenMint,
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    pub keeper: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[event]
pub struct SweepCompleted {
    pub keeper: Pubkey,
    pub page: u32,
    pub scanned: u32,
    pub released: u32,
    pub failed: u32,
    pub total_amount: u64,
}
