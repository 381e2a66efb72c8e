use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::{ACTIVE_SEED, ENGINE_SEED, FIRST_TRANSFER_ID, VAULT_SEED};
use crate::error::StaggeredError;
use crate::state::{ActiveTransfers, EngineState};

pub fn initialize_engine(
    ctx: Context<InitializeEngine>,
    keeper: Pubkey,
    test_mode: bool,
    unit_step: u64,
    immediate_threshold: u64,
) -> Result<()> {
    require!(unit_step > 0, StaggeredError::InvalidConfig);
    require!(keeper != Pubkey::default(), StaggeredError::InvalidPubkey);
    require!(keeper != ctx.accounts.owner.key(), StaggeredError::InvalidConfig);
    require!(
        keeper != ctx.accounts.engine_state.key(),
        StaggeredError::InvalidConfig
    );
    require!(keeper != crate::ID, StaggeredError::InvalidConfig);

    let st = &mut ctx.accounts.engine_state;
    st.mint = ctx.accounts.mint.key();
    st.owner = ctx.accounts.owner.key();
    st.keeper = keeper;
    st.unit_step = unit_step;
    st.immediate_threshold = immediate_threshold;
    st.release_interval = EngineState::interval_for(test_mode);
    st.test_mode = test_mode;
    st.paused = false;
    st.next_transfer_id = FIRST_TRANSFER_ID;
    st.total_transfers = 0;
    st.total_releases = 0;
    st.active_transfers = 0;
    st.total_released_amount = 0;
    st.outstanding_amount = 0;
    st.active_pages = 1;

    let first_page = &mut ctx.accounts.active_page;
    first_page.page = 0;
    first_page.bump = ctx.bumps.active_page;
    first_page.ids = Vec::new();

    emit!(EngineInitialized {
        mint: st.mint,
        owner: st.owner,
        keeper: st.keeper,
        unit_step,
        immediate_threshold,
        release_interval: st.release_interval,
        test_mode,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct InitializeEngine<'info> {
    #[account(
        init,
        payer = owner,
        space = 8 + EngineState::SIZE,
        seeds = [ENGINE_SEED],
        bump
    )]
    pub engine_state: Account<'info, EngineState>,

    #[account(
        init,
        payer = owner,
        space = 8 + ActiveTransfers::SIZE,
        seeds = [ACTIVE_SEED, engine_state.key().as_ref(), &0u32.to_le_bytes()],
        bump
    )]
    pub active_page: Box<Account<'info, ActiveTransfers>>,

    #[account(
        init,
        payer = owner,
        token::mint = mint,
        token::authority = engine_state,
        seeds = [VAULT_SEED, engine_state.key().as_ref()],
        bump
    )]
    pub vault: Account<'info, TokenAccount>,

    pub mint: Account<'info, Mint>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

#[event]
pub struct EngineInitialized {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub keeper: Pubkey,
    pub unit_step: u64,
    pub immediate_threshold: u64,
    pub release_interval: i64,
    pub test_mode: bool,
}
