use anchor_lang::prelude::*;

use crate::constants::USER_PAGE_CAPACITY;
use crate::error::{StaggeredError, StaggeredResult};

/// Per-user index header, sender and recipient side.
/// Seeds: [b"user_transfers", user]
///
/// Ids live in fixed-size pages; only the header's count is unbounded, so a
/// third party sending many dust transfers can never lock a user out of
/// receiving or creating further transfers.
#[account]
pub struct UserTransfers {
    pub user: Pubkey,
    /// Ids ever appended; page `total / USER_PAGE_CAPACITY` takes the next one.
    pub total: u64,
}

/// One page of a user's ids, in creation order.
/// Seeds: [b"user_transfers_page", user, page.to_le_bytes()]
#[account]
pub struct UserTransfersPage {
    pub user: Pubkey,
    pub page: u32,
    pub ids: Vec<u64>,
}

/// Returned by `get_user_transfers`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserTransfersView {
    pub user: Pubkey,
    pub page: u32,
    pub page_count: u32,
    pub total: u64,
    pub ids: Vec<u64>,
}

impl UserTransfers {
    pub const SIZE: usize =
        32 + // user
        8;   // total

    /// Binds a freshly created index to its user (no-op afterwards).
    pub fn bind(&mut self, user: Pubkey) {
        if self.user == Pubkey::default() {
            self.user = user;
        }
    }

    /// Page that receives the next appended id.
    pub fn current_page(&self) -> u32 {
        (self.total / USER_PAGE_CAPACITY as u64) as u32
    }

    pub fn page_count(&self) -> u32 {
        (self.total.div_ceil(USER_PAGE_CAPACITY as u64)) as u32
    }

    /// Appends `id` to the current page, which the caller derived from `current_page()`.
    pub fn append(&mut self, page: &mut UserTransfersPage, id: u64) -> StaggeredResult<()> {
        if page.user == Pubkey::default() && page.ids.is_empty() {
            page.user = self.user;
            page.page = self.current_page();
        }
        if page.user != self.user || page.page != self.current_page() {
            return Err(StaggeredError::InvalidUserPage);
        }
        if page.ids.len() >= USER_PAGE_CAPACITY {
            return Err(StaggeredError::InvalidUserPage);
        }
        page.ids.push(id);
        self.total = self.total.checked_add(1).ok_or(StaggeredError::MathOverflow)?;
        Ok(())
    }

    pub fn view(&self, page: Option<&UserTransfersPage>, index: u32) -> UserTransfersView {
        UserTransfersView {
            user: self.user,
            page: index,
            page_count: self.page_count(),
            total: self.total,
            ids: page.map(|p| p.ids.clone()).unwrap_or_default(),
        }
    }
}

impl UserTransfersPage {
    pub const SIZE: usize =
        32 + // user
        4 +  // page
        4 + 8 * USER_PAGE_CAPACITY; // ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_page() -> UserTransfersPage {
        UserTransfersPage {
            user: Pubkey::default(),
            page: 0,
            ids: Vec::new(),
        }
    }

    fn header(user: Pubkey) -> UserTransfers {
        let mut idx = UserTransfers {
            user: Pubkey::default(),
            total: 0,
        };
        idx.bind(user);
        idx
    }

    #[test]
    fn bind_is_sticky() {
        let user = Pubkey::new_unique();
        let mut idx = header(user);
        idx.bind(Pubkey::new_unique());
        assert_eq!(idx.user, user);
    }

    #[test]
    fn dust_flood_rolls_over_to_new_pages() {
        let user = Pubkey::new_unique();
        let mut idx = header(user);
        let mut pages: Vec<UserTransfersPage> = Vec::new();

        // Well past one page worth of one-unit transfers from a stranger.
        let flood = 3 * USER_PAGE_CAPACITY as u64 + 5;
        for id in 1..=flood {
            let want = idx.current_page() as usize;
            if pages.len() == want {
                pages.push(fresh_page());
            }
            idx.append(&mut pages[want], id).unwrap();
        }

        assert_eq!(idx.total, flood);
        assert_eq!(idx.page_count(), 4);
        assert_eq!(pages.len(), 4);
        assert!(pages[..3].iter().all(|p| p.ids.len() == USER_PAGE_CAPACITY));
        assert_eq!(pages[3].ids, vec![flood - 4, flood - 3, flood - 2, flood - 1, flood]);
        assert_eq!(pages[1].page, 1);
        assert_eq!(pages[0].ids.first(), Some(&1));

        // The user's own next transfer still lands.
        let want = idx.current_page() as usize;
        idx.append(&mut pages[want], flood + 1).unwrap();
        assert_eq!(idx.view(Some(&pages[3]), 3).ids.last(), Some(&(flood + 1)));
    }

    #[test]
    fn wrong_page_is_rejected() {
        let user = Pubkey::new_unique();
        let mut idx = header(user);
        let mut first = fresh_page();
        for id in 0..USER_PAGE_CAPACITY as u64 {
            idx.append(&mut first, id).unwrap();
        }
        // Page 0 is full; appending there again is refused, page 1 is expected.
        assert!(matches!(
            idx.append(&mut first, 999),
            Err(StaggeredError::InvalidUserPage)
        ));

        let mut foreign = UserTransfersPage {
            user: Pubkey::new_unique(),
            page: 1,
            ids: vec![7],
        };
        assert!(matches!(
            idx.append(&mut foreign, 999),
            Err(StaggeredError::InvalidUserPage)
        ));
        assert_eq!(idx.total, USER_PAGE_CAPACITY as u64);
    }

    #[test]
    fn view_of_missing_page_is_empty() {
        let idx = header(Pubkey::new_unique());
        let view = idx.view(None, 2);
        assert_eq!(view.page, 2);
        assert_eq!(view.page_count, 0);
        assert!(view.ids.is_empty());
    }

    #[test]
    fn page_fits_its_account() {
        let page = UserTransfersPage {
            user: Pubkey::new_unique(),
            page: u32::MAX,
            ids: vec![u64::MAX; USER_PAGE_CAPACITY],
        };
        let mut buf = Vec::new();
        page.try_serialize(&mut buf).unwrap();
        assert!(buf.len() <= 8 + UserTransfersPage::SIZE);
    }
}
