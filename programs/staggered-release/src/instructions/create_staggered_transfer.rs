use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::constants::{
    ACTIVE_SEED, ENGINE_SEED, TRANSFER_SEED, USER_PAGE_SEED, USER_SEED, VAULT_SEED,
};
use crate::error::StaggeredError;
use crate::state::{ActiveTransfers, EngineState, TransferRecord, UserTransfers, UserTransfersPage};
use crate::utils::release::plan_release;
use crate::utils::token::{check_recipient_ata, transfer_from_vault};

use super::execute_staggered_release::StaggeredReleaseExecuted;

pub fn create_staggered_transfer(
    ctx: Context<CreateStaggeredTransfer>,
    amount: u64,
    recipient: Pubkey,
    page_index: u32,
) -> Result<u64> {
    require!(amount > 0, StaggeredError::InvalidAmount);
    require!(recipient != Pubkey::default(), StaggeredError::InvalidPubkey);
    let sender = ctx.accounts.sender.key();
    require_keys_neq!(recipient, sender, StaggeredError::InvalidPubkey);

    let engine_state_ai = ctx.accounts.engine_state.to_account_info();
    let engine_state_bump = ctx.bumps.engine_state;

    let st = &mut ctx.accounts.engine_state;
    require!(!st.paused, StaggeredError::EnginePaused);

    require_keys_eq!(
        ctx.accounts.sender_token_account.mint,
        st.mint,
        StaggeredError::InvalidTokenMint
    );
    require_keys_eq!(
        ctx.accounts.sender_token_account.owner,
        sender,
        StaggeredError::InvalidTokenAccount
    );
    check_recipient_ata(
        &ctx.accounts.recipient_ata.key(),
        &ctx.accounts.recipient_ata,
        &recipient,
        &st.mint,
    )?;

    let plan = st.plan_transfer(amount)?;
    let immediate = plan.immediate;
    // Pages stay contiguous: an open page or the next one.
    st.use_active_page(page_index)?;
    let page = &mut ctx.accounts.active_page;
    page.bind(page_index, ctx.bumps.active_page);
    page.check_page(page_index)?;
    if !immediate {
        require!(!page.is_full(), StaggeredError::ActiveIndexFull);
    }

    let now = Clock::get()?.unix_timestamp;
    let id = st.register_transfer(amount)?;

    // Lock the full amount in custody.
    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.sender_token_account.to_account_info(),
                to: ctx.accounts.vault.to_account_info(),
                authority: ctx.accounts.sender.to_account_info(),
            },
        ),
        amount,
    )?;

    let mut record = TransferRecord::open(
        id,
        sender,
        recipient,
        amount,
        plan.schedule,
        now,
        page_index,
        ctx.bumps.transfer_record,
    )?;

    emit!(StaggeredTransferCreated {
        id,
        sender,
        recipient,
        total_amount: amount,
        steps: record.schedule.len() as u8,
        immediate,
        next_release_ts: record.next_release_ts,
    });

    if immediate {
        // Below the threshold there is no staggering: pay out in the same instruction.
        ctx.accounts.vault.reload()?;
        let release = plan_release(&record, now, st.release_interval, ctx.accounts.vault.amount)?;
        transfer_from_vault(
            ctx.accounts.token_program.to_account_info(),
            ctx.accounts.vault.to_account_info(),
            ctx.accounts.recipient_ata.to_account_info(),
            engine_state_ai,
            engine_state_bump,
            release.effect.amount,
        )?;
        let effect = release.effect;
        record = release.record;
        st.record_release(effect.amount, effect.completed)?;

        emit!(StaggeredReleaseExecuted {
            transfer_id: id,
            recipient,
            caller: sender,
            step_index: effect.step_index,
            amount: effect.amount,
            remaining_amount: effect.remaining_amount,
            next_release_ts: effect.next_release_ts,
            completed: effect.completed,
        });
    } else {
        ctx.accounts.active_page.insert(id)?;
    }

    ctx.accounts.transfer_record.set_inner(record);

    let sender_transfers = &mut ctx.accounts.sender_transfers;
    sender_transfers.bind(sender);
    sender_transfers.append(&mut ctx.accounts.sender_page, id)?;
    let recipient_transfers = &mut ctx.accounts.recipient_transfers;
    recipient_transfers.bind(recipient);
    recipient_transfers.append(&mut ctx.accounts.recipient_page, id)?;

    Ok(id)
}

#[derive(Accounts)]
#[instruction(amount: u64, recipient: Pubkey, page_index: u32)]
pub struct CreateStaggeredTransfer<'info> {
    #[account(mut, seeds = [ENGINE_SEED], bump)]
    pub engine_state: Box<Account<'info, EngineState>>,

    /// Any open page with room, or page `engine_state.active_pages` to open a new one.
    #[account(
        init_if_needed,
        payer = sender,
        space = 8 + ActiveTransfers::SIZE,
        seeds = [ACTIVE_SEED, engine_state.key().as_ref(), &page_index.to_le_bytes()],
        bump
    )]
    pub active_page: Box<Account<'info, ActiveTransfers>>,

    #[account(
        init,
        payer = sender,
        space = 8 + TransferRecord::SIZE,
        seeds = [TRANSFER_SEED, &engine_state.next_transfer_id.to_le_bytes()],
        bump
    )]
    pub transfer_record: Box<Account<'info, TransferRecord>>,

    #[account(
        init_if_needed,
        payer = sender,
        space = 8 + UserTransfers::SIZE,
        seeds = [USER_SEED, sender.key().as_ref()],
        bump
    )]
    pub sender_transfers: Box<Account<'info, UserTransfers>>,

    #[account(
        init_if_needed,
        payer = sender,
        space = 8 + UserTransfersPage::SIZE,
        seeds = [
            USER_PAGE_SEED,
            sender.key().as_ref(),
            &sender_transfers.current_page().to_le_bytes()
        ],
        bump
    )]
    pub sender_page: Box<Account<'info, UserTransfersPage>>,

    #[account(
        init_if_needed,
        payer = sender,
        space = 8 + UserTransfers::SIZE,
        seeds = [USER_SEED, recipient.as_ref()],
        bump
    )]
    pub recipient_transfers: Box<Account<'info, UserTransfers>>,

    #[account(
        init_if_needed,
        payer = sender,
        space = 8 + UserTransfersPage::SIZE,
        seeds = [
            USER_PAGE_SEED,
            recipient.as_ref(),
            &recipient_transfers.current_page().to_le_bytes()
        ],
        bump
    )]
    pub recipient_page: Box<Account<'info, UserTransfersPage>>,

    #[account(
        mut,
        seeds = [VAULT_SEED, engine_state.key().as_ref()],
        bump,
        constraint = vault.mint == engine_state.mint @ StaggeredError::InvalidTokenMint,
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub sender_token_account: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub recipient_ata: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub sender: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[event]
pub struct StaggeredTransferCreated {
    pub id: u64,
    pub sender: Pubkey,
    pub recipient: Pubkey,
    pub total_amount: u64,
    pub steps: u8,
    pub immediate: bool,
    pub next_release_ts: i64,
}
