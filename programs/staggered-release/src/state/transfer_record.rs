use std::io::Cursor;

use anchor_lang::prelude::*;

use crate::constants::MAX_SCHEDULE_STEPS;
use crate::error::{StaggeredError, StaggeredResult};
use crate::utils::account::load_optional;
use crate::utils::schedule::{next_release_after, released_through};

/// One staggered transfer. Seeds: [b"transfer", id.to_le_bytes()]
///
/// Never closed once created; completion and emergency closure only flip `active`.
#[account]
#[derive(Debug)]
pub struct TransferRecord {
    pub id: u64,
    pub sender: Pubkey,
    pub recipient: Pubkey,
    /// Amount committed at creation (smallest token unit).
    pub total_amount: u64,
    /// Amount not yet released.
    pub remaining_amount: u64,
    /// Tranche amounts, fixed at creation.
    pub schedule: Vec<u64>,
    /// Index of the next tranche to release.
    pub current_step: u8,
    /// The current tranche cannot be released before this timestamp.
    pub next_release_ts: i64,
    pub active: bool,
    pub emergency_closed: bool,
    pub created_ts: i64,
    /// Active index page holding this id while the record is live.
    pub active_page: u32,
    pub bump: u8,
}

/// Outcome of one executed release step.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseEffect {
    pub transfer_id: u64,
    pub step_index: u8,
    pub amount: u64,
    pub remaining_amount: u64,
    pub next_release_ts: i64,
    pub completed: bool,
}

/// Named snapshot returned by `get_transfer_info`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct TransferInfo {
    pub id: u64,
    pub sender: Pubkey,
    pub recipient: Pubkey,
    pub total_amount: u64,
    pub remaining_amount: u64,
    /// Paid to the recipient through release steps.
    pub released_amount: u64,
    /// Disposed of by an emergency close instead of being released.
    pub returned_amount: u64,
    pub schedule: Vec<u64>,
    pub current_step: u8,
    pub next_release_ts: i64,
    pub active: bool,
    pub emergency_closed: bool,
    pub created_ts: i64,
    pub active_page: u32,
}

impl TransferRecord {
    pub const SIZE: usize =
        8 +  // id
        32 + // sender
        32 + // recipient
        8 +  // total_amount
        8 +  // remaining_amount
        4 + 8 * MAX_SCHEDULE_STEPS + // schedule
        1 +  // current_step
        8 +  // next_release_ts
        1 +  // active
        1 +  // emergency_closed
        8 +  // created_ts
        4 +  // active_page
        1;   // bump

    /// Fresh record: first tranche due immediately (interval(0) == 0).
    pub fn open(
        id: u64,
        sender: Pubkey,
        recipient: Pubkey,
        total_amount: u64,
        schedule: Vec<u64>,
        now_ts: i64,
        active_page: u32,
        bump: u8,
    ) -> StaggeredResult<Self> {
        if total_amount == 0 || schedule.is_empty() {
            return Err(StaggeredError::InvalidAmount);
        }
        if schedule.len() > MAX_SCHEDULE_STEPS {
            return Err(StaggeredError::ScheduleTooLong);
        }
        if released_through(&schedule, schedule.len())? != total_amount {
            return Err(StaggeredError::InvalidAmount);
        }
        Ok(Self {
            id,
            sender,
            recipient,
            total_amount,
            remaining_amount: total_amount,
            schedule,
            current_step: 0,
            next_release_ts: now_ts,
            active: true,
            emergency_closed: false,
            created_ts: now_ts,
            active_page,
            bump,
        })
    }

    /// Loads a record from its PDA; `None` when the account was never created.
    pub fn load(info: &AccountInfo) -> Result<Option<Self>> {
        load_optional(info)
    }

    /// Writes the record back into its PDA.
    pub fn store(&self, info: &AccountInfo) -> Result<()> {
        let mut data = info.try_borrow_mut_data()?;
        let dst: &mut [u8] = &mut data;
        let mut writer = Cursor::new(dst);
        self.try_serialize(&mut writer)
    }

    /// Active and past its time gate.
    pub fn is_due(&self, now_ts: i64) -> bool {
        self.active && now_ts >= self.next_release_ts
    }

    /// Recipient self-claim or keeper sweep, once the gate has passed.
    pub fn can_release(&self, now_ts: i64, caller: &Pubkey, keeper: &Pubkey) -> bool {
        self.is_due(now_ts) && (caller == &self.recipient || caller == keeper)
    }

    /// Full eligibility check; returns the amount of the current tranche.
    pub fn check_release(
        &self,
        now_ts: i64,
        caller: &Pubkey,
        keeper: &Pubkey,
    ) -> StaggeredResult<u64> {
        if !self.active {
            return Err(StaggeredError::AlreadyCompleted);
        }
        if now_ts < self.next_release_ts {
            return Err(StaggeredError::NotEligibleYet);
        }
        if caller != &self.recipient && caller != keeper {
            return Err(StaggeredError::UnauthorizedCaller);
        }
        self.pending_step_amount()
    }

    /// Amount of the tranche at `current_step`.
    pub fn pending_step_amount(&self) -> StaggeredResult<u64> {
        if !self.active {
            return Err(StaggeredError::AlreadyCompleted);
        }
        self.schedule
            .get(self.current_step as usize)
            .copied()
            .ok_or(StaggeredError::AlreadyCompleted)
    }

    /// Applies the current tranche: debits it and advances the step.
    /// Time gating is the caller's concern (emergency release skips it).
    pub fn apply_release(
        &mut self,
        now_ts: i64,
        interval: i64,
    ) -> StaggeredResult<ReleaseEffect> {
        let amount = self.pending_step_amount()?;
        let step_index = self.current_step;
        let remaining = self
            .remaining_amount
            .checked_sub(amount)
            .ok_or(StaggeredError::MathOverflow)?;
        let next_step = step_index
            .checked_add(1)
            .ok_or(StaggeredError::MathOverflow)?;
        let completed = next_step as usize == self.schedule.len();

        let next_release_ts = if completed {
            self.next_release_ts
        } else {
            next_release_after(now_ts, interval)?.max(self.next_release_ts)
        };

        self.remaining_amount = remaining;
        self.current_step = next_step;
        self.next_release_ts = next_release_ts;
        if completed {
            self.active = false;
        }

        Ok(ReleaseEffect {
            transfer_id: self.id,
            step_index,
            amount,
            remaining_amount: remaining,
            next_release_ts,
            completed,
        })
    }

    /// Emergency closure: returns the amount that must leave custody.
    pub fn force_close(&mut self) -> StaggeredResult<u64> {
        if !self.active {
            return Err(StaggeredError::AlreadyCompleted);
        }
        let amount = self.remaining_amount;
        self.remaining_amount = 0;
        self.active = false;
        self.emergency_closed = true;
        Ok(amount)
    }

    /// Tranches actually paid out; an emergency close does not count.
    pub fn released_amount(&self) -> StaggeredResult<u64> {
        released_through(&self.schedule, self.current_step as usize)
    }

    /// Whatever left custody through a forced close.
    pub fn returned_amount(&self) -> StaggeredResult<u64> {
        let released = self.released_amount()?;
        self.total_amount
            .checked_sub(self.remaining_amount)
            .and_then(|gone| gone.checked_sub(released))
            .ok_or(StaggeredError::MathOverflow)
    }

    pub fn info(&self) -> StaggeredResult<TransferInfo> {
        Ok(TransferInfo {
            id: self.id,
            sender: self.sender,
            recipient: self.recipient,
            total_amount: self.total_amount,
            remaining_amount: self.remaining_amount,
            released_amount: self.released_amount()?,
            returned_amount: self.returned_amount()?,
            schedule: self.schedule.clone(),
            current_step: self.current_step,
            next_release_ts: self.next_release_ts,
            active: self.active,
            emergency_closed: self.emergency_closed,
            created_ts: self.created_ts,
            active_page: self.active_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_IMMEDIATE_THRESHOLD, DEFAULT_UNIT_STEP};
    use crate::utils::schedule::compute_schedule;

    const T0: i64 = 1_700_000_000;
    const INTERVAL: i64 = 15;

    fn record(total: u64) -> (TransferRecord, Pubkey) {
        let recipient = Pubkey::new_unique();
        let schedule =
            compute_schedule(total, DEFAULT_UNIT_STEP, DEFAULT_IMMEDIATE_THRESHOLD).unwrap();
        let r = TransferRecord::open(7, Pubkey::new_unique(), recipient, total, schedule, T0, 0, 255)
            .unwrap();
        (r, recipient)
    }

    fn assert_conserved(r: &TransferRecord) {
        let released = released_through(&r.schedule, r.current_step as usize).unwrap();
        assert_eq!(r.total_amount, r.remaining_amount + released);
    }

    #[test]
    fn first_tranche_due_at_creation() {
        let (r, recipient) = record(1001);
        let keeper = Pubkey::new_unique();
        assert!(r.can_release(T0, &recipient, &keeper));
        assert!(r.can_release(T0, &keeper, &keeper));
        assert!(!r.can_release(T0, &Pubkey::new_unique(), &keeper));
    }

    #[test]
    fn end_to_end_staggered_claims() {
        let (mut r, recipient) = record(1001);
        let keeper = Pubkey::new_unique();

        let amount = r.check_release(T0, &recipient, &keeper).unwrap();
        let effect = r.apply_release(T0, INTERVAL).unwrap();
        assert_eq!(amount, 1);
        assert_eq!(effect.amount, 1);
        assert_eq!(r.remaining_amount, 1000);
        assert_eq!(r.current_step, 1);
        assert_eq!(r.next_release_ts, T0 + INTERVAL);

        // Strictly before the gate: not eligible; at the gate: eligible.
        assert!(!r.can_release(T0 + INTERVAL - 1, &recipient, &keeper));
        assert!(matches!(
            r.check_release(T0 + INTERVAL - 1, &recipient, &keeper),
            Err(StaggeredError::NotEligibleYet)
        ));
        assert!(r.can_release(T0 + INTERVAL, &recipient, &keeper));

        let effect = r.apply_release(T0 + INTERVAL, INTERVAL).unwrap();
        assert_eq!(effect.amount, 2);
        assert_eq!(effect.step_index, 1);
        assert_eq!(r.remaining_amount, 998);
        assert_conserved(&r);
    }

    #[test]
    fn final_step_completes_record() {
        let (mut r, recipient) = record(1001);
        let keeper = Pubkey::new_unique();
        let mut now = T0;
        let mut paid = 0u64;
        let mut last_gate = r.next_release_ts;
        while r.active {
            paid += r.check_release(now, &recipient, &keeper).unwrap();
            let effect = r.apply_release(now, INTERVAL).unwrap();
            assert!(r.next_release_ts >= last_gate);
            last_gate = r.next_release_ts;
            assert_conserved(&r);
            assert_eq!(effect.completed, !r.active);
            now += INTERVAL;
        }
        assert_eq!(paid, 1001);
        assert_eq!(r.remaining_amount, 0);
        assert_eq!(r.current_step as usize, r.schedule.len());
        assert!(matches!(
            r.check_release(now, &recipient, &keeper),
            Err(StaggeredError::AlreadyCompleted)
        ));
        assert!(matches!(
            r.apply_release(now, INTERVAL),
            Err(StaggeredError::AlreadyCompleted)
        ));
    }

    #[test]
    fn immediate_record_is_single_step() {
        let (mut r, _) = record(500);
        assert_eq!(r.schedule, vec![500]);
        let effect = r.apply_release(T0, INTERVAL).unwrap();
        assert!(effect.completed);
        assert_eq!(effect.amount, 500);
        assert!(!r.active);
        assert_eq!(r.remaining_amount, 0);
    }

    #[test]
    fn stranger_is_unauthorized() {
        let (r, _) = record(1001);
        let keeper = Pubkey::new_unique();
        assert!(matches!(
            r.check_release(T0, &Pubkey::new_unique(), &keeper),
            Err(StaggeredError::UnauthorizedCaller)
        ));
    }

    #[test]
    fn early_forced_release_keeps_gate_monotonic() {
        let (mut r, _) = record(1001);
        r.apply_release(T0, INTERVAL).unwrap();
        let gate = r.next_release_ts;
        // Forced before the gate: the new gate never moves backwards.
        r.apply_release(T0 + 1, INTERVAL).unwrap();
        assert!(r.next_release_ts >= gate);
        assert_eq!(r.remaining_amount, 998);
        assert_conserved(&r);
    }

    #[test]
    fn force_close_disposes_remaining() {
        let (mut r, _) = record(1001);
        r.apply_release(T0, INTERVAL).unwrap();
        assert_eq!(r.force_close().unwrap(), 1000);
        assert!(!r.active);
        assert!(r.emergency_closed);
        assert_eq!(r.remaining_amount, 0);
        // Only the first tranche was released; the rest was returned.
        assert_eq!(r.released_amount().unwrap(), 1);
        assert_eq!(r.returned_amount().unwrap(), 1000);
        let info = r.info().unwrap();
        assert_eq!(info.released_amount, 1);
        assert_eq!(info.returned_amount, 1000);
        assert!(matches!(r.force_close(), Err(StaggeredError::AlreadyCompleted)));
        assert!(!r.can_release(T0 + 10 * INTERVAL, &r.recipient, &r.recipient));
    }

    #[test]
    fn open_rejects_inconsistent_schedule() {
        let who = Pubkey::new_unique();
        assert!(matches!(
            TransferRecord::open(1, who, who, 10, vec![1, 2], T0, 0, 0),
            Err(StaggeredError::InvalidAmount)
        ));
        assert!(matches!(
            TransferRecord::open(1, who, who, 0, vec![], T0, 0, 0),
            Err(StaggeredError::InvalidAmount)
        ));
    }

    #[test]
    fn snapshot_reports_released_amount() {
        let (mut r, recipient) = record(1001);
        r.apply_release(T0, INTERVAL).unwrap();
        let info = r.info().unwrap();
        assert_eq!(info.recipient, recipient);
        assert_eq!(info.released_amount, 1);
        assert_eq!(info.returned_amount, 0);
        assert_eq!(info.remaining_amount, 1000);
        assert_eq!(info.schedule.len(), 10);
    }

    #[test]
    fn record_fits_its_account() {
        let who = Pubkey::new_unique();
        let schedule = compute_schedule(u64::MAX, 1, 0).unwrap();
        let r = TransferRecord::open(1, who, who, u64::MAX, schedule, T0, u32::MAX, 255).unwrap();
        let mut buf = Vec::new();
        r.try_serialize(&mut buf).unwrap();
        assert!(buf.len() <= 8 + TransferRecord::SIZE);
    }
}
