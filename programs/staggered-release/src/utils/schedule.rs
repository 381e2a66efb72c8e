//! Geometric release schedule (integer-exact, no rounding loss).
//! - amount < immediate_threshold => single step [amount], no staggering
//! - otherwise steps start at unit_step and double while remaining > step
//! - the step that would reach or pass the remaining amount is clamped to it

use crate::constants::MAX_SCHEDULE_STEPS;
use crate::error::{StaggeredError, StaggeredResult};

/// Split `total_amount` into its ordered tranche amounts.
pub fn compute_schedule(
    total_amount: u64,
    unit_step: u64,
    immediate_threshold: u64,
) -> StaggeredResult<Vec<u64>> {
    if total_amount == 0 {
        return Err(StaggeredError::InvalidAmount);
    }
    if unit_step == 0 {
        return Err(StaggeredError::InvalidConfig);
    }
    if total_amount < immediate_threshold {
        return Ok(vec![total_amount]);
    }

    let mut steps = Vec::new();
    let mut remaining = total_amount;
    // u128 so doubling past u64::MAX is still comparable.
    let mut step = unit_step as u128;
    loop {
        if steps.len() >= MAX_SCHEDULE_STEPS {
            return Err(StaggeredError::ScheduleTooLong);
        }
        if step >= remaining as u128 {
            steps.push(remaining);
            break;
        }
        let amount = step as u64;
        steps.push(amount);
        remaining = remaining
            .checked_sub(amount)
            .ok_or(StaggeredError::MathOverflow)?;
        step = step.checked_mul(2).ok_or(StaggeredError::MathOverflow)?;
    }
    Ok(steps)
}

/// Sum of the first `steps` tranches (the amount already released).
pub fn released_through(schedule: &[u64], steps: usize) -> StaggeredResult<u64> {
    let mut sum: u64 = 0;
    for amount in schedule.iter().take(steps) {
        sum = sum
            .checked_add(*amount)
            .ok_or(StaggeredError::MathOverflow)?;
    }
    Ok(sum)
}

/// Earliest timestamp the following tranche may be released at.
pub fn next_release_after(now_ts: i64, interval: i64) -> StaggeredResult<i64> {
    if interval < 0 {
        return Err(StaggeredError::InvalidConfig);
    }
    now_ts
        .checked_add(interval)
        .ok_or(StaggeredError::MathOverflow)
}
