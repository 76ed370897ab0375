//! Reward engine implementing the [`RewardCalculator`] trait.
//!
//! Wraps a validated [`RewardPolicy`] and delegates to the accrual, tier,
//! and emergency-fee modules.

use bloom_core::error::RewardError;
use bloom_core::policy::RewardPolicy;
use bloom_core::traits::RewardCalculator;
use tracing::trace;

use crate::accrual::accrued_reward;
use crate::emergency::fee_bps;
use crate::tiers::LockTierTable;

/// The production reward calculator.
#[derive(Debug, Clone)]
pub struct RewardEngine {
    policy: RewardPolicy,
    tiers: LockTierTable,
}

impl RewardEngine {
    /// Create an engine from a policy, rejecting unsound policies.
    pub fn new(policy: RewardPolicy) -> Result<Self, RewardError> {
        policy.validate()?;
        let tiers = LockTierTable::new(policy.base_multiplier, policy.lock_tiers.clone())?;
        Ok(Self { policy, tiers })
    }

    pub fn policy(&self) -> &RewardPolicy {
        &self.policy
    }

    pub fn tiers(&self) -> &LockTierTable {
        &self.tiers
    }
}

impl Default for RewardEngine {
    fn default() -> Self {
        let policy = RewardPolicy::default();
        let tiers = LockTierTable::from_sorted(policy.base_multiplier, policy.lock_tiers.clone());
        Self { policy, tiers }
    }
}

impl RewardCalculator for RewardEngine {
    fn accrued_reward(
        &self,
        value: u64,
        reward_mult: u64,
        reward_per_day: u64,
        elapsed_secs: u64,
    ) -> Result<u64, RewardError> {
        let reward = accrued_reward(value, reward_mult, reward_per_day, elapsed_secs)?;
        trace!(value, reward_mult, elapsed_secs, reward, "accrued");
        Ok(reward)
    }

    fn base_multiplier(&self) -> u64 {
        self.policy.base_multiplier
    }

    fn lock_multiplier(&self, duration_secs: u64) -> u64 {
        self.tiers.multiplier_for(duration_secs)
    }

    fn tier_level(&self, index: usize) -> Result<u64, RewardError> {
        self.tiers.level(index)
    }

    fn emergency_fee_bps(&self, streak: u32) -> u64 {
        fee_bps(&self.policy.emergency, streak)
    }
}
