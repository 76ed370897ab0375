//! Reward policy: multiplier tiers and the emergency-fee curve.
//!
//! These are configuration parameters, not derived values. Defaults mirror
//! the production deployment; see [`crate::constants`].

use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_MULTIPLIER, BPS_PRECISION, EMERGENCY_BASE_FEE_BPS, EMERGENCY_FEE_STEP_BPS,
    EMERGENCY_MAX_FEE_BPS, EMERGENCY_WINDOW_SECS, PROCESSING_COOLDOWN_SECS, TIER_2_BONUS,
    TIER_2_MIN_LOCK, TIER_3_BONUS, TIER_3_MIN_LOCK,
};
use crate::error::RewardError;

/// Maximum number of lock tiers a policy may define.
pub const MAX_LOCK_TIERS: usize = 10;

/// One step of the lock-duration multiplier table.
///
/// A lock of at least `min_duration` seconds earns `bonus` on top of the
/// base multiplier.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockTier {
    pub min_duration: u64,
    pub bonus: u64,
}

/// Escalating fee applied to emergency claims.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct EmergencyFeePolicy {
    /// Fee of the first emergency claim in a window.
    pub base_fee_bps: u64,
    /// Added for each further claim inside the window.
    pub step_bps: u64,
    /// Fee ceiling.
    pub max_fee_bps: u64,
    /// Rolling window after the last emergency claim that keeps a streak alive.
    pub window_secs: u64,
    /// Delay after an emergency claim before the node may be locked again.
    pub processing_cooldown_secs: u64,
}

impl Default for EmergencyFeePolicy {
    fn default() -> Self {
        Self {
            base_fee_bps: EMERGENCY_BASE_FEE_BPS,
            step_bps: EMERGENCY_FEE_STEP_BPS,
            max_fee_bps: EMERGENCY_MAX_FEE_BPS,
            window_secs: EMERGENCY_WINDOW_SECS,
            processing_cooldown_secs: PROCESSING_COOLDOWN_SECS,
        }
    }
}

/// Full reward policy consumed by the reward engine.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct RewardPolicy {
    /// Multiplier of an unlocked node.
    pub base_multiplier: u64,
    /// Tier table, sorted by ascending `min_duration`. Tier 0 must start at 0.
    pub lock_tiers: Vec<LockTier>,
    pub emergency: EmergencyFeePolicy,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            base_multiplier: BASE_MULTIPLIER,
            lock_tiers: vec![
                LockTier { min_duration: 0, bonus: 0 },
                LockTier { min_duration: TIER_2_MIN_LOCK, bonus: TIER_2_BONUS },
                LockTier { min_duration: TIER_3_MIN_LOCK, bonus: TIER_3_BONUS },
            ],
            emergency: EmergencyFeePolicy::default(),
        }
    }
}

impl RewardPolicy {
    /// Largest bonus any lock can earn.
    pub fn max_tier_bonus(&self) -> u64 {
        self.lock_tiers.last().map_or(0, |t| t.bonus)
    }

    /// Check structural soundness of the policy.
    ///
    /// Tiers must start at duration 0, strictly increase in duration, and
    /// never decrease in bonus. Fees must stay within 100% with
    /// `base <= max`, and the window must be non-zero.
    pub fn validate(&self) -> Result<(), RewardError> {
        let invalid = |msg: &str| Err(RewardError::InvalidPolicy(msg.to_string()));

        if self.base_multiplier == 0 {
            return invalid("base multiplier must be non-zero");
        }
        match self.lock_tiers.first() {
            None => return invalid("at least one lock tier is required"),
            Some(first) if first.min_duration != 0 || first.bonus != 0 => {
                return invalid("tier 0 must start at duration 0 with no bonus");
            }
            Some(_) => {}
        }
        if self.lock_tiers.len() > MAX_LOCK_TIERS {
            return invalid("too many lock tiers");
        }
        for pair in self.lock_tiers.windows(2) {
            if pair[1].min_duration <= pair[0].min_duration {
                return invalid("lock tier durations must strictly increase");
            }
            if pair[1].bonus < pair[0].bonus {
                return invalid("lock tier bonuses must not decrease");
            }
        }
        if self
            .base_multiplier
            .checked_add(self.max_tier_bonus())
            .is_none()
        {
            return invalid("multiplier overflow");
        }

        let fee = &self.emergency;
        if fee.max_fee_bps > BPS_PRECISION {
            return invalid("emergency fee cap exceeds 100%");
        }
        if fee.base_fee_bps > fee.max_fee_bps {
            return invalid("emergency base fee exceeds cap");
        }
        if fee.window_secs == 0 {
            return invalid("emergency window must be non-zero");
        }
        Ok(())
    }
}
