use anchor_lang::prelude::*;

pub mod constants;
pub mod error;
pub mod instructions;
pub mod state;
pub mod utils;

pub use instructions::*;
pub use state::*;
pub use utils::release::SweepSummary;

declare_id!("29gsoSufVmqavhaBJDgYZBouQad3GtR1pEpbNgHA2Em1");

#[program]
pub mod staggered_release {
    use super::*;

    pub fn initialize_engine(
        ctx: Context<InitializeEngine>,
        keeper: Pubkey,
        test_mode: bool,
        unit_step: u64,
        immediate_threshold: u64,
    ) -> Result<()> {
        instructions::initialize_engine::initialize_engine(
            ctx,
            keeper,
            test_mode,
            unit_step,
            immediate_threshold,
        )
    }

    pub fn set_keeper(ctx: Context<SetKeeper>, new_keeper: Pubkey) -> Result<()> {
        instructions::set_keeper::set_keeper(ctx, new_keeper)
    }

    pub fn pause(ctx: Context<Pause>) -> Result<()> {
        instructions::pause::pause(ctx)
    }

    pub fn unpause(ctx: Context<Unpause>) -> Result<()> {
        instructions::unpause::unpause(ctx)
    }

    pub fn create_staggered_transfer(
        ctx: Context<CreateStaggeredTransfer>,
        amount: u64,
        recipient: Pubkey,
        page_index: u32,
    ) -> Result<u64> {
        instructions::create_staggered_transfer::create_staggered_transfer(
            ctx, amount, recipient, page_index,
        )
    }

    pub fn can_execute_release(
        ctx: Context<CanExecuteRelease>,
        transfer_id: u64,
        caller: Pubkey,
    ) -> Result<bool> {
        instructions::can_execute_release::can_execute_release(ctx, transfer_id, caller)
    }

    pub fn execute_staggered_release(
        ctx: Context<ExecuteStaggeredRelease>,
        transfer_id: u64,
    ) -> Result<ReleaseEffect> {
        instructions::execute_staggered_release::execute_staggered_release(ctx, transfer_id)
    }

    pub fn process_pending_releases<'info>(
        ctx: Context<'_, '_, 'info, 'info, ProcessPendingReleases<'info>>,
        batch_limit: u8,
    ) -> Result<SweepSummary> {
        instructions::process_pending_releases::process_pending_releases(ctx, batch_limit)
    }

    pub fn get_transfer_info(
        ctx: Context<GetTransferInfo>,
        transfer_id: u64,
    ) -> Result<TransferInfo> {
        instructions::get_transfer_info::get_transfer_info(ctx, transfer_id)
    }

    pub fn get_user_transfers(
        ctx: Context<GetUserTransfers>,
        user: Pubkey,
        page: u32,
    ) -> Result<UserTransfersView> {
        instructions::get_user_transfers::get_user_transfers(ctx, user, page)
    }

    pub fn get_stats(ctx: Context<GetStats>) -> Result<EngineStats> {
        instructions::get_stats::get_stats(ctx)
    }

    pub fn emergency_release(
        ctx: Context<EmergencyRelease>,
        transfer_id: u64,
    ) -> Result<ReleaseEffect> {
        instructions::emergency_release::emergency_release(ctx, transfer_id)
    }

    pub fn emergency_close(ctx: Context<EmergencyClose>, transfer_id: u64) -> Result<u64> {
        instructions::emergency_close::emergency_close(ctx, transfer_id)
    }

    pub fn emergency_return(ctx: Context<EmergencyReturn>, amount: u64) -> Result<()> {
        instructions::emergency_return::emergency_return(ctx, amount)
    }
}
