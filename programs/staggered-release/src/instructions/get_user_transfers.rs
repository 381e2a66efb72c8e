use anchor_lang::prelude::*;

use crate::constants::{USER_PAGE_SEED, USER_SEED};
use crate::state::{UserTransfers, UserTransfersPage, UserTransfersView};
use crate::utils::account::load_optional;

/// One page of ids where `user` is sender or recipient, in creation order.
/// `page_count` in the result tells the caller how many pages to walk.
pub fn get_user_transfers(
    ctx: Context<GetUserTransfers>,
    user: Pubkey,
    page: u32,
) -> Result<UserTransfersView> {
    // A user that never took part in a transfer has no index account yet.
    let header = load_optional::<UserTransfers>(&ctx.accounts.user_transfers)?
        .unwrap_or(UserTransfers { user, total: 0 });
    let ids_page = load_optional::<UserTransfersPage>(&ctx.accounts.user_transfers_page)?;
    let view = header.view(ids_page.as_ref(), page);

    emit!(UserTransfersQuoted {
        user,
        page,
        page_count: view.page_count,
        total: view.total,
        count: view.ids.len() as u32,
    });

    Ok(view)
}

#[derive(Accounts)]
#[instruction(user: Pubkey, page: u32)]
pub struct GetUserTransfers<'info> {
    #[account(seeds = [USER_SEED, user.as_ref()], bump)]
    /// CHECK: May be uninitialized; an absent index reads as empty.
    pub user_transfers: UncheckedAccount<'info>,

    #[account(seeds = [USER_PAGE_SEED, user.as_ref(), &page.to_le_bytes()], bump)]
    /// CHECK: May be uninitialized; an absent page reads as empty.
    pub user_transfers_page: UncheckedAccount<'info>,
}

#[event]
pub struct UserTransfersQuoted {
    pub user: Pubkey,
    pub page: u32,
    pub page_count: u32,
    pub total: u64,
    pub count: u32,
}
