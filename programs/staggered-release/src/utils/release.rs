//! Release planning. Every fallible check runs here against a copy of the
//! record, before any tokens leave custody; handlers then do the CPI and
//! commit the planned record as-is.

use anchor_lang::prelude::*;

use crate::error::{StaggeredError, StaggeredResult};
use crate::state::{ActiveTransfers, ReleaseEffect, TransferRecord};

/// A release that passed every check: the record as it will be stored and what moves.
#[derive(Clone, Debug)]
pub struct ReleasePlan {
    pub record: TransferRecord,
    pub effect: ReleaseEffect,
}

/// Plans the current tranche of `record` against `available` custody.
/// Time gating and caller checks belong to the caller (emergency release skips them).
pub fn plan_release(
    record: &TransferRecord,
    now_ts: i64,
    interval: i64,
    available: u64,
) -> StaggeredResult<ReleasePlan> {
    let amount = record.pending_step_amount()?;
    if available < amount {
        return Err(StaggeredError::InsufficientCustodyBalance);
    }
    let mut next = record.clone();
    let effect = next.apply_release(now_ts, interval)?;
    Ok(ReleasePlan {
        record: next,
        effect,
    })
}

/// Plans an emergency close; returns the closed record and the amount leaving custody.
pub fn plan_closure(
    record: &TransferRecord,
    available: u64,
) -> StaggeredResult<(TransferRecord, u64)> {
    let mut next = record.clone();
    let amount = next.force_close()?;
    if available < amount {
        return Err(StaggeredError::InsufficientCustodyBalance);
    }
    Ok((next, amount))
}

/// Aggregate result of one sweep.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub scanned: u32,
    pub released: u32,
    pub failed: u32,
    pub total_amount: u64,
}

/// Running state of a keeper sweep over one active page.
///
/// The vault account is not reloaded between CPIs, so custody is tracked
/// here and debited on every committed release.
#[derive(Clone, Copy, Debug)]
pub struct SweepTally {
    summary: SweepSummary,
    available: u64,
}

impl SweepTally {
    pub fn begin(vault_amount: u64) -> Self {
        Self {
            summary: SweepSummary::default(),
            available: vault_amount,
        }
    }

    pub fn scan(&mut self) {
        self.summary.scanned += 1;
    }

    /// `Ok(None)`: not a candidate on this page, or nothing due yet.
    pub fn plan(
        &self,
        record: &TransferRecord,
        page: &ActiveTransfers,
        now_ts: i64,
        keeper: &Pubkey,
        interval: i64,
    ) -> StaggeredResult<Option<ReleasePlan>> {
        if !page.contains(record.id) || !record.can_release(now_ts, keeper, keeper) {
            return Ok(None);
        }
        plan_release(record, now_ts, interval, self.available).map(Some)
    }

    /// A candidate rejected before its CPI; nothing about it changed.
    pub fn fail(&mut self) {
        self.summary.failed += 1;
    }

    /// Books a release whose CPI succeeded.
    pub fn commit(&mut self, effect: &ReleaseEffect) -> StaggeredResult<()> {
        self.available = self
            .available
            .checked_sub(effect.amount)
            .ok_or(StaggeredError::InsufficientCustodyBalance)?;
        self.summary.released += 1;
        self.summary.total_amount = self
            .summary
            .total_amount
            .checked_add(effect.amount)
            .ok_or(StaggeredError::MathOverflow)?;
        Ok(())
    }

    pub fn available(&self) -> u64 {
        self.available
    }

    pub fn finish(self) -> SweepSummary {
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_IMMEDIATE_THRESHOLD, DEFAULT_UNIT_STEP};
    use crate::utils::schedule::compute_schedule;

    const T0: i64 = 1_700_000_000;
    const INTERVAL: i64 = 15;

    fn record(id: u64, total: u64) -> TransferRecord {
        let schedule =
            compute_schedule(total, DEFAULT_UNIT_STEP, DEFAULT_IMMEDIATE_THRESHOLD).unwrap();
        TransferRecord::open(
            id,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            total,
            schedule,
            T0,
            0,
            255,
        )
        .unwrap()
    }

    fn page_of(records: &[TransferRecord]) -> ActiveTransfers {
        ActiveTransfers {
            page: 0,
            bump: 255,
            ids: records.iter().map(|r| r.id).collect(),
        }
    }

    /// The handler's loop without the CPI: `reject` stands in for a record whose
    /// recipient account fails validation.
    fn sweep(
        tally: &mut SweepTally,
        records: &mut [TransferRecord],
        page: &mut ActiveTransfers,
        now: i64,
        keeper: &Pubkey,
        reject: Option<u64>,
    ) {
        for r in records.iter_mut() {
            tally.scan();
            let planned = tally.plan(r, page, now, keeper, INTERVAL).and_then(|plan| {
                match plan {
                    Some(_) if reject == Some(r.id) => Err(StaggeredError::InvalidRecipientAta),
                    other => Ok(other),
                }
            });
            let plan = match planned {
                Ok(Some(plan)) => plan,
                Ok(None) => continue,
                Err(_) => {
                    tally.fail();
                    continue;
                }
            };
            *r = plan.record;
            if plan.effect.completed {
                page.remove(r.id);
            }
            tally.commit(&plan.effect).unwrap();
        }
    }

    #[test]
    fn rejected_record_is_left_untouched() {
        let keeper = Pubkey::new_unique();
        let mut records = vec![record(1, 1001), record(2, 5_000), record(3, 70_000)];
        let mut page = page_of(&records);
        let before = records[1].clone();

        let mut tally = SweepTally::begin(1_000_000);
        sweep(&mut tally, &mut records, &mut page, T0, &keeper, Some(2));
        let summary = tally.finish();

        assert_eq!(
            summary,
            SweepSummary {
                scanned: 3,
                released: 2,
                failed: 1,
                total_amount: 2,
            }
        );
        assert_eq!(records[1].current_step, before.current_step);
        assert_eq!(records[1].remaining_amount, before.remaining_amount);
        assert_eq!(records[1].next_release_ts, before.next_release_ts);
        assert_eq!(records[0].current_step, 1);
        assert_eq!(records[2].current_step, 1);
    }

    #[test]
    fn back_to_back_sweeps_release_nothing_new() {
        let keeper = Pubkey::new_unique();
        let mut records = vec![record(1, 1001), record(2, 5_000), record(3, 70_000)];
        let mut page = page_of(&records);

        let mut run = |now: i64, records: &mut Vec<TransferRecord>| {
            let mut tally = SweepTally::begin(1_000_000);
            sweep(&mut tally, records, &mut page, now, &keeper, None);
            tally.finish()
        };

        assert_eq!(run(T0, &mut records).released, 3);
        assert_eq!(run(T0, &mut records).released, 0);
        assert_eq!(run(T0 + INTERVAL - 1, &mut records).released, 0);
        let third = run(T0 + INTERVAL, &mut records);
        assert_eq!(third.released, 3);
        assert_eq!(third.total_amount, 6);
        assert!(records.iter().all(|r| r.current_step == 2));
    }

    #[test]
    fn custody_is_debited_across_the_batch() {
        let keeper = Pubkey::new_unique();
        // Step 0 of each is 1 unit; only two units are in custody.
        let mut records = vec![record(1, 1001), record(2, 1001), record(3, 1001)];
        let mut page = page_of(&records);

        let mut tally = SweepTally::begin(2);
        sweep(&mut tally, &mut records, &mut page, T0, &keeper, None);
        assert_eq!(tally.available(), 0);
        let summary = tally.finish();

        assert_eq!(summary.released, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(records[2].current_step, 0);
        assert_eq!(records[2].remaining_amount, 1001);
    }

    #[test]
    fn records_off_the_page_are_skipped() {
        let keeper = Pubkey::new_unique();
        let mut records = vec![record(1, 1001), record(2, 1001)];
        let mut page = page_of(&records[..1]);

        let mut tally = SweepTally::begin(100);
        sweep(&mut tally, &mut records, &mut page, T0, &keeper, None);
        let summary = tally.finish();

        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.released, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(records[1].current_step, 0);
    }

    #[test]
    fn final_tranche_leaves_the_page() {
        let keeper = Pubkey::new_unique();
        let mut records = vec![record(1, 15)];
        records[0].schedule = vec![1, 2, 4, 8];
        let mut page = page_of(&records);

        let mut now = T0;
        for _ in 0..4 {
            let mut tally = SweepTally::begin(100);
            sweep(&mut tally, &mut records, &mut page, now, &keeper, None);
            now += INTERVAL;
        }
        assert!(!records[0].active);
        assert!(page.ids.is_empty());
    }

    #[test]
    fn plan_release_fails_closed_on_short_custody() {
        let r = record(1, 1001);
        assert!(matches!(
            plan_release(&r, T0, INTERVAL, 0),
            Err(StaggeredError::InsufficientCustodyBalance)
        ));

        let plan = plan_release(&r, T0, INTERVAL, 1).unwrap();
        assert_eq!(plan.effect.amount, 1);
        assert_eq!(plan.record.remaining_amount, 1000);
        // The source record is a snapshot; only the plan moved.
        assert_eq!(r.current_step, 0);
    }

    #[test]
    fn immediate_payout_plans_a_single_completed_step() {
        let r = record(9, 500);
        let plan = plan_release(&r, T0, INTERVAL, 500).unwrap();
        assert!(plan.effect.completed);
        assert_eq!(plan.effect.amount, 500);
        assert!(!plan.record.active);
        assert_eq!(plan.record.remaining_amount, 0);
    }

    #[test]
    fn closure_requires_backing_custody() {
        let mut r = record(1, 1001);
        r.apply_release(T0, INTERVAL).unwrap();

        assert!(matches!(
            plan_closure(&r, 999),
            Err(StaggeredError::InsufficientCustodyBalance)
        ));
        let (closed, amount) = plan_closure(&r, 1000).unwrap();
        assert_eq!(amount, 1000);
        assert!(closed.emergency_closed);
        assert!(r.active);

        assert!(matches!(
            plan_closure(&closed, 1000),
            Err(StaggeredError::AlreadyCompleted)
        ));
    }
}
