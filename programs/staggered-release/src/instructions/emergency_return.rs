use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::constants::{ENGINE_SEED, VAULT_SEED};
use crate::error::StaggeredError;
use crate::state::EngineState;
use crate::utils::token::transfer_from_vault;

/// Returns custody surplus (tokens not backing any live record) to `destination`.
pub fn emergency_return(ctx: Context<EmergencyReturn>, amount: u64) -> Result<()> {
    let st = &ctx.accounts.engine_state;
    require_keys_eq!(ctx.accounts.owner.key(), st.owner, StaggeredError::UnauthorizedOwner);
    require_keys_eq!(
        ctx.accounts.destination.mint,
        st.mint,
        StaggeredError::InvalidTokenMint
    );

    st.check_surplus_return(ctx.accounts.vault.amount, amount)?;

    transfer_from_vault(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.destination.to_account_info(),
        ctx.accounts.engine_state.to_account_info(),
        ctx.bumps.engine_state,
        amount,
    )?;

    emit!(EmergencyReturned {
        owner: st.owner,
        destination: ctx.accounts.destination.key(),
        recipient: ctx.accounts.destination.owner,
        amount,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct EmergencyReturn<'info> {
    #[account(seeds = [ENGINE_SEED], bump)]
    pub engine_state: Account<'info, EngineState>,

    #[account(
        mut,
        seeds = [VAULT_SEED, engine_state.key().as_ref()],
        bump,
        constraint = vault.mint == engine_state.mint @ StaggeredError::InvalidTokenMint,
    )]
    pub vault: Account<'info, TokenAccount>,

    #[account(mut)]
    pub destination: Account<'info, TokenAccount>,

    pub owner: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[event]
pub struct EmergencyReturned {
    pub owner: Pubkey,
    pub destination: Pubkey,
    pub recipient: Pubkey,
    pub amount: u64,
}
