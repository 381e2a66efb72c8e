use anchor_lang::prelude::*;

use crate::constants::ACTIVE_PAGE_CAPACITY;
use crate::error::{StaggeredError, StaggeredResult};

/// One page of active staggered transfer ids (sweep candidates).
/// Seeds: [b"active_transfers", engine_state, page.to_le_bytes()]
///
/// Pages are opened on demand (`EngineState::active_pages`), so the number of
/// live transfers is not capped by a single account; a slot freed by a
/// completed or closed record is reused by the next insert on that page.
#[account]
pub struct ActiveTransfers {
    pub page: u32,
    pub bump: u8,
    pub ids: Vec<u64>,
}

impl ActiveTransfers {
    pub const SIZE: usize =
        4 + // page
        1 + // bump
        4 + 8 * ACTIVE_PAGE_CAPACITY; // ids

    /// Binds a freshly created page to its index and PDA bump (no-op afterwards).
    pub fn bind(&mut self, page: u32, bump: u8) {
        if self.bump == 0 && self.ids.is_empty() {
            self.page = page;
            self.bump = bump;
        }
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= ACTIVE_PAGE_CAPACITY
    }

    pub fn insert(&mut self, id: u64) -> StaggeredResult<()> {
        if self.is_full() {
            return Err(StaggeredError::ActiveIndexFull);
        }
        self.ids.push(id);
        Ok(())
    }

    /// Order is not preserved.
    pub fn remove(&mut self, id: u64) -> bool {
        match self.ids.iter().position(|&x| x == id) {
            Some(pos) => {
                self.ids.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// The record's page must be the one passed in.
    pub fn check_page(&self, record_page: u32) -> StaggeredResult<()> {
        if self.page != record_page {
            return Err(StaggeredError::InvalidActivePage);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EngineState;

    fn page(index: u32) -> ActiveTransfers {
        let mut p = ActiveTransfers {
            page: 0,
            bump: 0,
            ids: Vec::new(),
        };
        p.bind(index, 254);
        p
    }

    #[test]
    fn insert_remove_contains() {
        let mut idx = page(0);
        idx.insert(1).unwrap();
        idx.insert(2).unwrap();
        idx.insert(3).unwrap();
        assert!(idx.remove(1));
        assert!(!idx.remove(1));
        assert!(!idx.contains(1));
        assert!(idx.contains(2) && idx.contains(3));
        assert_eq!(idx.ids.len(), 2);
    }

    #[test]
    fn full_page_frees_slots_on_removal() {
        let mut idx = page(0);
        for id in 0..ACTIVE_PAGE_CAPACITY as u64 {
            idx.insert(id).unwrap();
        }
        assert!(matches!(idx.insert(u64::MAX), Err(StaggeredError::ActiveIndexFull)));
        idx.remove(0);
        idx.insert(u64::MAX).unwrap();
        assert!(idx.is_full());
    }

    #[test]
    fn live_transfers_spill_into_new_pages() {
        let mut st = EngineState {
            mint: Pubkey::new_unique(),
            owner: Pubkey::new_unique(),
            keeper: Pubkey::new_unique(),
            unit_step: 1,
            immediate_threshold: 1_000,
            release_interval: 15,
            test_mode: true,
            paused: false,
            next_transfer_id: 1,
            total_transfers: 0,
            total_releases: 0,
            active_transfers: 0,
            total_released_amount: 0,
            outstanding_amount: 0,
            active_pages: 1,
        };
        let mut pages = vec![page(0)];

        // Client-side placement: last page while it has room, else open the next.
        let live = 3 * ACTIVE_PAGE_CAPACITY as u64 + 1;
        for _ in 0..live {
            let target = if pages.last().is_some_and(|p| p.is_full()) {
                st.active_pages
            } else {
                st.active_pages - 1
            };
            st.use_active_page(target).unwrap();
            if pages.len() == target as usize {
                pages.push(page(target));
            }
            let id = st.register_transfer(1_000).unwrap();
            let p = &mut pages[target as usize];
            p.check_page(target).unwrap();
            p.insert(id).unwrap();
        }

        assert_eq!(st.active_pages, 4);
        assert_eq!(st.active_transfers, live);
        assert_eq!(pages[3].ids, vec![live]);
        assert!(matches!(
            pages[1].check_page(2),
            Err(StaggeredError::InvalidActivePage)
        ));
    }

    #[test]
    fn bind_is_sticky() {
        let mut idx = page(3);
        idx.insert(9).unwrap();
        idx.bind(7, 1);
        assert_eq!(idx.page, 3);
        assert_eq!(idx.bump, 254);
    }

    #[test]
    fn page_fits_its_account() {
        let idx = ActiveTransfers {
            page: u32::MAX,
            bump: 255,
            ids: vec![u64::MAX; ACTIVE_PAGE_CAPACITY],
        };
        let mut buf = Vec::new();
        idx.try_serialize(&mut buf).unwrap();
        assert!(buf.len() <= 8 + ActiveTransfers::SIZE);
    }
}
