//! Time-based reward accrual.
//!
//! `reward = value * reward_per_day * reward_mult * elapsed_secs
//!           / (SECONDS_PER_DAY * REWARD_RATE_PRECISION * MULT_PRECISION)`
//!
//! The division happens once, at the end, so short intervals are not
//! truncated to zero step by step.

use bloom_core::constants::{MULT_PRECISION, REWARD_RATE_PRECISION, SECONDS_PER_DAY};
use bloom_core::error::RewardError;

const DENOMINATOR: u128 =
    SECONDS_PER_DAY as u128 * REWARD_RATE_PRECISION as u128 * MULT_PRECISION as u128;

/// Reward accrued by `value` at `reward_mult` over `elapsed_secs`.
///
/// Returns 0 when any factor is zero. Rounds down.
pub fn accrued_reward(
    value: u64,
    reward_mult: u64,
    reward_per_day: u64,
    elapsed_secs: u64,
) -> Result<u64, RewardError> {
    if value == 0 || reward_mult == 0 || reward_per_day == 0 || elapsed_secs == 0 {
        return Ok(0);
    }

    let numerator = (value as u128)
        .checked_mul(reward_per_day as u128)
        .and_then(|v| v.checked_mul(reward_mult as u128))
        .and_then(|v| v.checked_mul(elapsed_secs as u128))
        .ok_or(RewardError::ArithmeticOverflow)?;

    u64::try_from(numerator / DENOMINATOR).map_err(|_| RewardError::ArithmeticOverflow)
}
