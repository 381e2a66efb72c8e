use anchor_lang::prelude::*;

use crate::constants::ENGINE_SEED;
use crate::error::StaggeredError;
use crate::state::EngineState;

pub fn set_keeper(ctx: Context<SetKeeper>, new_keeper: Pubkey) -> Result<()> {
    require!(new_keeper != Pubkey::default(), StaggeredError::InvalidPubkey);

    let engine_state_key = ctx.accounts.engine_state.key();
    let st = &mut ctx.accounts.engine_state;
    require_keys_eq!(ctx.accounts.owner.key(), st.owner, StaggeredError::UnauthorizedOwner);

    require!(new_keeper != st.owner, StaggeredError::InvalidConfig);
    require!(new_keeper != engine_state_key, StaggeredError::InvalidConfig);
    require!(new_keeper != crate::ID, StaggeredError::InvalidConfig);

    let old = st.keeper;
    st.keeper = new_keeper;

    emit!(KeeperSet {
        owner: st.owner,
        old_keeper: old,
        new_keeper,
    });
    Ok(())
}

#[derive(Accounts)]
pub struct SetKeeper<'info> {
    #[account(mut, seeds = [ENGINE_SEED], bump)]
    pub engine_state: Account<'info, EngineState>,

    pub owner: Signer<'info>,
}

#[event]
pub struct KeeperSet {
    pub owner: Pubkey,
    pub old_keeper: Pubkey,
    pub new_keeper: Pubkey,
}
