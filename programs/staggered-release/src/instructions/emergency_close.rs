use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::constants::{ACTIVE_SEED, ENGINE_SEED, TRANSFER_SEED, VAULT_SEED};
use crate::error::StaggeredError;
use crate::state::{ActiveTransfers, EngineState, TransferRecord};
use crate::utils::release::plan_closure;
use crate::utils::token::transfer_from_vault;

/// Owner-forced closure: the whole remaining amount leaves custody to `destination`.
pub fn emergency_close(ctx: Context<EmergencyClose>, transfer_id: u64) -> Result<u64> {
    let engine_state_ai = ctx.accounts.engine_state.to_account_info();
    let engine_state_bump = ctx.bumps.engine_state;

    let st = &mut ctx.accounts.engine_state;
    require_keys_eq!(ctx.accounts.owner.key(), st.owner, StaggeredError::UnauthorizedOwner);
    require_keys_eq!(
        ctx.accounts.destination.mint,
        st.mint,
        StaggeredError::InvalidTokenMint
    );

    let record_ai = ctx.accounts.transfer_record.to_account_info();
    let record = TransferRecord::load(&record_ai)?.ok_or(StaggeredError::NotFound)?;
    require!(record.id == transfer_id, StaggeredError::NotFound);
    let (record, amount) = plan_closure(&record, ctx.accounts.vault.amount)?;
    ctx.accounts.active_page.check_page(record.active_page)?;

    transfer_from_vault(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.destination.to_account_info(),
        engine_state_ai,
        engine_state_bump,
        amount,
    )?;

    record.store(&record_ai)?;
    st.record_closure(amount)?;
    ctx.accounts.active_page.remove(transfer_id);

    emit!(EmergencyClosed {
        owner: st.owner,
        transfer_id,
        destination: ctx.accounts.destination.key(),
        amount,
        steps_released: record.current_step,
    });

    Ok(amount)
}

#[derive(Accounts)]
#[instruction(transfer_id: u64)]
pub struct EmergencyClose<'info> {
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
    pub destination: Box<Account<'info, TokenAccount>>,

    pub owner: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[event]
pub struct EmergencyClosed {
    pub owner: Pubkey,
    pub transfer_id: u64,
    pub destination: Pubkey,
    pub amount: u64,
    pub steps_released: u8,
}
