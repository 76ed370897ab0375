//! Lock-duration multiplier tiers.
//!
//! A step function over a sorted table: a lock earns the bonus of the
//! highest tier whose `min_duration` it reaches. The default table gives
//! 6-day locks the base multiplier, 13-day locks `+15_000`, and 27-day
//! locks `+25_000`.

use bloom_core::error::RewardError;
use bloom_core::policy::LockTier;

/// Validated, sorted multiplier table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTierTable {
    base_multiplier: u64,
    tiers: Vec<LockTier>,
}

impl LockTierTable {
    /// Build from a tier list. The caller is expected to have validated the
    /// policy; an empty list is still rejected here.
    pub fn new(base_multiplier: u64, tiers: Vec<LockTier>) -> Result<Self, RewardError> {
        if tiers.is_empty() {
            return Err(RewardError::InvalidPolicy("empty tier table".into()));
        }
        Ok(Self { base_multiplier, tiers })
    }

    /// Build from a table known to be sorted and non-empty.
    pub(crate) fn from_sorted(base_multiplier: u64, tiers: Vec<LockTier>) -> Self {
        Self { base_multiplier, tiers }
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Index of the tier a lock of `duration_secs` falls into.
    pub fn tier_index(&self, duration_secs: u64) -> usize {
        self.tiers
            .partition_point(|t| t.min_duration <= duration_secs)
            .saturating_sub(1)
    }

    /// Multiplier earned by a lock of `duration_secs`.
    pub fn multiplier_for(&self, duration_secs: u64) -> u64 {
        let bonus = self.tiers[self.tier_index(duration_secs)].bonus;
        self.base_multiplier.saturating_add(bonus)
    }

    /// Multiplier of tier `index`.
    pub fn level(&self, index: usize) -> Result<u64, RewardError> {
        self.tiers
            .get(index)
            .map(|t| self.base_multiplier.saturating_add(t.bonus))
            .ok_or(RewardError::InvalidTier(index))
    }
}
