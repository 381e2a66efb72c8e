use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::constants::{ACTIVE_SEED, ENGINE_SEED, TRANSFER_SEED, VAULT_SEED};
use crate::error::StaggeredError;
use crate::state::{ActiveTransfers, EngineState, ReleaseEffect, TransferRecord};
use crate::utils::release::plan_release;
use crate::utils::token::{check_recipient_ata, transfer_from_vault};

/// Owner-forced release of the current tranche, ignoring the time gate and pause.
pub fn emergency_release(
    ctx: Context<EmergencyRelease>,
    transfer_id: u64,
) -> Result<ReleaseEffect> {
    let engine_state_ai = ctx.accounts.engine_state.to_account_info();
    let engine_state_bump = ctx.bumps.engine_state;

    let st = &mut ctx.accounts.engine_state;
    require_keys_eq!(ctx.accounts.owner.key(), st.owner, StaggeredError::UnauthorizedOwner);

    let record_ai = ctx.accounts.transfer_record.to_account_info();
    let record = TransferRecord::load(&record_ai)?.ok_or(StaggeredError::NotFound)?;
    require!(record.id == transfer_id, StaggeredError::NotFound);
    record.pending_step_amount()?;
    ctx.accounts.active_page.check_page(record.active_page)?;

    check_recipient_ata(
        &ctx.accounts.recipient_ata.key(),
        &ctx.accounts.recipient_ata,
        &record.recipient,
        &st.mint,
    )?;
    // No gate or caller check: the owner may force the tranche early.
    let now = Clock::get()?.unix_timestamp;
    let plan = plan_release(&record, now, st.release_interval, ctx.accounts.vault.amount)?;

    transfer_from_vault(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.recipient_ata.to_account_info(),
        engine_state_ai,
        engine_state_bump,
        plan.effect.amount,
    )?;

    let effect = plan.effect;
    plan.record.store(&record_ai)?;
    st.record_release(effect.amount, effect.completed)?;
    if effect.completed {
        ctx.accounts.active_page.remove(transfer_id);
    }

    emit!(EmergencyReleaseExecuted {
        owner: st.owner,
        transfer_id,
        recipient: record.recipient,
        step_index: effect.step_index,
        amount: effect.amount,
        remaining_amount: effect.remaining_amount,
        completed: effect.completed,
    });

    Ok(effect)
}

#[derive(Accounts)]
#[instruction(transfer_id: u64)]
pub struct EmergencyRelease<'info> {
    #[account(mut, seeds = [ENGINE_SEED], bump)]
    pub engine_state: Box<Account<'info, EngineState>>,

    /// The page holding this record's id (`TransferRecord::active_page`).
    #[account(
        mut,
        seeds = [ACTIVE_SEED, engine_state.key().as_ref(), &active_page.page.to_le_bytes()],
        bump = active_page.bump
    )]
    pub active_page: Box<Account<'info, ActiveTransfers>>,

    #[account(
        mut,
        seeds = [TRANSFER_SEED, &transfer_id.to_le_bytes()],
        bump
    )]
    /// CHECK: May be uninitialized; loaded and validated in-handler (NotFound).
    pub transfer_record: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, engine_state.key().as_ref()],
        bump,
        constraint = vault.mint == engine_state.mint @ StaggeredError::InvalidTokenMint,
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub recipient_ata: Box<Account<'info, TokenAccount>>,

    pub owner: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[event]
pub struct EmergencyReleaseExecuted {
    pub owner: Pubkey,
    pub transfer_id: u64,
    pub recipient: Pubkey,
    pub step_index: u8,
    pub amount: u64,
    pub remaining_amount: u64,
    pub completed: bool,
}
