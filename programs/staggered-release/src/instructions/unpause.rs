use anchor_lang::prelude::*;

use crate::constants::ENGINE_SEED;
use crate::error::StaggeredError;
use crate::state::EngineState;

pub fn unpause(ctx: Context<Unpause>) -> Result<()> {
    let st = &mut ctx.accounts.engine_state;
    require_keys_eq!(ctx.accounts.owner.key(), st.owner, StaggeredError::UnauthorizedOwner);
    require!(st.paused, StaggeredError::EngineNotPaused);
    st.paused = false;
    emit!(EngineUnpaused { owner: st.owner });
    Ok(())
}

#[derive(Accounts)]
pub struct Unpause<'info> {
    #[account(mut, seeds = [ENGINE_SEED], bump)]
    pub engine_state: Account<'info, EngineState>,
    pub owner: Signer<'info>,
}

#[event]
pub struct EngineUnpaused {
    pub owner: Pubkey,
}
