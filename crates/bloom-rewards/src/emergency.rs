//! Emergency-claim fee escalation.
//!
//! Each owner carries an [`EmergencyStreak`]. The fee of a claim is
//! `min(base + step * streak, max)` where `streak` counts earlier claims
//! whose window is still open. The streak is reset lazily: once `window`
//! seconds pass after the last claim, the next claim is charged the base
//! fee again.

use bloom_core::policy::EmergencyFeePolicy;
use serde::{Deserialize, Serialize};

/// Consecutive emergency claims inside the rolling window.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmergencyStreak {
    pub count: u32,
    pub last_claim: Option<u64>,
}

impl EmergencyStreak {
    /// Streak length that applies to a claim made at `now`.
    pub fn active_count(&self, now: u64, window_secs: u64) -> u32 {
        match self.last_claim {
            Some(last) if now < last.saturating_add(window_secs) => self.count,
            _ => 0,
        }
    }

    /// Record a claim at `now` and return the streak length it was charged at.
    pub fn record(&mut self, now: u64, window_secs: u64) -> u32 {
        let charged = self.active_count(now, window_secs);
        self.count = charged.saturating_add(1);
        self.last_claim = Some(now);
        charged
    }
}

/// Fee in basis points for a claim following `streak` earlier claims.
pub fn fee_bps(policy: &EmergencyFeePolicy, streak: u32) -> u64 {
    policy
        .base_fee_bps
        .saturating_add(policy.step_bps.saturating_mul(streak as u64))
        .min(policy.max_fee_bps)
}
