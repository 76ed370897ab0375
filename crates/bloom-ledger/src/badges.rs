//! Tier badge collection.
//!
//! Each holder owns at most one badge tier in `1..=MAX_BADGE_TIER`.
//! Minting a new tier replaces the previous one.

use std::collections::HashMap;

use bloom_core::constants::MAX_BADGE_TIER;
use bloom_core::error::TierError;
use bloom_core::types::Address;
use parking_lot::RwLock;
use tracing::info;

pub struct BloomTiers {
    admin: Address,
    referral: RwLock<Option<Address>>,
    uri: String,
    holders: RwLock<HashMap<Address, u32>>,
}

impl BloomTiers {
    pub fn new(admin: Address, uri: impl Into<String>) -> Self {
        Self {
            admin,
            referral: RwLock::new(None),
            uri: uri.into(),
            holders: RwLock::new(HashMap::new()),
        }
    }

    /// Authorize the referral program to mint. Admin only.
    pub fn set_referral(&self, caller: &Address, referral: Address) -> Result<(), TierError> {
        if *caller != self.admin {
            return Err(TierError::NotApproved);
        }
        *self.referral.write() = Some(referral);
        Ok(())
    }

    pub fn mint(&self, caller: &Address, to: &Address, tier: u32) -> Result<(), TierError> {
        if *caller != self.admin && *self.referral.read() != Some(*caller) {
            return Err(TierError::NotApproved);
        }
        if !(1..=MAX_BADGE_TIER).contains(&tier) {
            return Err(TierError::InvalidTier(tier));
        }
        let previous = self.holders.write().insert(*to, tier);
        info!(%to, tier, ?previous, "badge minted");
        Ok(())
    }

    /// 1 if `holder` currently owns `tier`, else 0.
    pub fn balance_of(&self, holder: &Address, tier: u32) -> u64 {
        u64::from(self.tier_of(holder) == Some(tier))
    }

    pub fn tier_of(&self, holder: &Address) -> Option<u32> {
        self.holders.read().get(holder).copied()
    }

    pub fn uri(&self, tier: u32) -> Result<String, TierError> {
        if !(1..=MAX_BADGE_TIER).contains(&tier) {
            return Err(TierError::InvalidTier(tier));
        }
        Ok(format!("{}{}.json", self.uri, tier))
    }
}
