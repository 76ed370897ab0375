//! Protocol constants. All amounts are in the smallest unit of the native
//! reward token; all timestamps and durations are Unix seconds.

pub const SECONDS_PER_DAY: u64 = 86_400;
pub const SECONDS_PER_WEEK: u64 = 7 * SECONDS_PER_DAY;

/// Fixed-point denominator for reward multipliers (`100_000` = 1.0x).
pub const MULT_PRECISION: u64 = 100_000;

/// Fixed-point denominator for the daily reward rate.
///
/// A `reward_per_day` of `34_724` yields `0.34724` of a node's value per day
/// at the base multiplier.
pub const REWARD_RATE_PRECISION: u64 = 100_000;

/// Basis-point denominator used by all fee computations.
pub const BPS_PRECISION: u64 = 10_000;

/// Daily reward rate used by the production deployment.
pub const DEFAULT_REWARD_PER_DAY: u64 = 34_724;

/// Minimum value a new node must be created with.
pub const DEFAULT_MIN_CREATION_PRICE: u64 = 10_000;

/// Multiplier of an unlocked node (tier 0).
pub const BASE_MULTIPLIER: u64 = MULT_PRECISION;

/// Lock length that unlocks the second multiplier tier.
pub const TIER_2_MIN_LOCK: u64 = SECONDS_PER_WEEK;
/// Additive bonus of the second multiplier tier.
pub const TIER_2_BONUS: u64 = 15_000;

/// Lock length that unlocks the third multiplier tier.
pub const TIER_3_MIN_LOCK: u64 = 3 * SECONDS_PER_WEEK;
/// Additive bonus of the third multiplier tier.
pub const TIER_3_BONUS: u64 = 25_000;

/// Fee charged on the first emergency claim inside a window (50%).
pub const EMERGENCY_BASE_FEE_BPS: u64 = 5_000;
/// Fee increase for every further emergency claim inside the window.
pub const EMERGENCY_FEE_STEP_BPS: u64 = 1_000;
/// Hard cap on the emergency fee (90%).
pub const EMERGENCY_MAX_FEE_BPS: u64 = 9_000;
/// Rolling window after which the emergency streak resets.
pub const EMERGENCY_WINDOW_SECS: u64 = SECONDS_PER_WEEK;
/// Delay after an emergency claim before a node may be locked again.
pub const PROCESSING_COOLDOWN_SECS: u64 = SECONDS_PER_DAY;

/// Highest token id of the tier badge collection.
pub const MAX_BADGE_TIER: u32 = 15;

/// Maximum length of a node name, in characters.
pub const MAX_NAME_LEN: usize = 32;
