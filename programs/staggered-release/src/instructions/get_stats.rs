use anchor_lang::prelude::*;

use crate::constants::ENGINE_SEED;
use crate::state::{EngineState, EngineStats};

pub fn get_stats(ctx: Context<GetStats>) -> Result<EngineStats> {
    let stats = ctx.accounts.engine_state.stats();
    emit!(StatsQuoted {
        total_transfers: stats.total_transfers,
        total_releases: stats.total_releases,
        active_transfers: stats.active_transfers,
        total_released_amount: stats.total_released_amount,
        outstanding_amount: stats.outstanding_amount,
    });
    Ok(stats)
}

#[derive(Accounts)]
pub struct GetStats<'info> {
    #[account(seeds = [ENGINE_SEED], bump)]
    pub engine_state: Account<'info, EngineState>,
}

#[event]
pub struct StatsQuoted {
    pub total_transfers: u64,
    pub total_releases: u64,
    pub active_transfers: u64,
    pub total_released_amount: u64,
    pub outstanding_amount: u64,
}
