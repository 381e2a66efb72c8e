use anchor_lang::prelude::*;

use crate::constants::TRANSFER_SEED;
use crate::error::StaggeredError;
use crate::state::{TransferInfo, TransferRecord};

pub fn get_transfer_info(ctx: Context<GetTransferInfo>, transfer_id: u64) -> Result<TransferInfo> {
    let record = TransferRecord::load(&ctx.accounts.transfer_record.to_account_info())?
        .filter(|r| r.id == transfer_id)
        .ok_or(StaggeredError::NotFound)?;
    let info = record.info()?;

    emit!(TransferInfoQuoted {
        id: info.id,
        sender: info.sender,
        recipient: info.recipient,
        total_amount: info.total_amount,
        remaining_amount: info.remaining_amount,
        released_amount: info.released_amount,
        returned_amount: info.returned_amount,
        current_step: info.current_step,
        steps: info.schedule.len() as u8,
        next_release_ts: info.next_release_ts,
        active: info.active,
    });

    Ok(info)
}

#[derive(Accounts)]
#[instruction(transfer_id: u64)]
pub struct GetTransferInfo<'info> {
    #[account(seeds = [TRANSFER_SEED, &transfer_id.to_le_bytes()], bump)]
    /// CHECK: May be uninitialized; loaded and validated in-handler (NotFound).
    pub transfer_record: UncheckedAccount<'info>,
}

#[event]
pub struct TransferInfoQuoted {
    pub id: u64,
    pub sender: Pubkey,
    pub recipient: Pubkey,
    pub total_amount: u64,
    pub remaining_amount: u64,
    pub released_amount: u64,
    pub returned_amount: u64,
    pub current_step: u8,
    pub steps: u8,
    pub next_release_ts: i64,
    pub active: bool,
}
