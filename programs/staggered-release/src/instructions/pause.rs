use anchor_lang::prelude::*;

use crate::constants::ENGINE_SEED;
use crate::error::StaggeredError;
use crate::state::EngineState;

pub fn pause(ctx: Context<Pause>) -> Result<()> {
    let st = &mut ctx.accounts.engine_state;
    require_keys_eq!(ctx.accounts.owner.key(), st.owner, StaggeredError::UnauthorizedOwner);
    require!(!st.paused, StaggeredError::EnginePaused);
    st.paused = true;
    emit!(EnginePaused { owner: st.owner });
    Ok(())
}

#[derive(Accounts)]
pub struct Pause<'info> {
    #[account(mut, seeds = [ENGINE_SEED], bump)]
    pub engine_state: Account<'info, EngineState>,
    pub owner: Signer<'info>,
}

#[event]
pub struct EnginePaused {
    pub owner: Pubkey,
}
