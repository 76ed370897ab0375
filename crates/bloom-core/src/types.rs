//! Core node types: addresses, nodes, and their serializable views.
//!
//! All amounts are in the smallest unit of the native reward token.
//! All timestamps are Unix seconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a Bloom node. Assigned sequentially from 1, never reused.
pub type BloomId = u64;

/// A 20-byte account address.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Derive a deterministic address from a human-readable label.
    ///
    /// Takes the first 20 bytes of the BLAKE3 hash of the label.
    pub fn from_label(label: &str) -> Self {
        let hash = blake3::hash(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash.as_bytes()[..20]);
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// Currency a deposit is paid in.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PayToken {
    /// The native reward token. Credited one-to-one, gated by the whitelist.
    Native,
    /// The stable token. Converted into native terms by the router.
    Stable,
}

impl fmt::Display for PayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Stable => f.write_str("stable"),
        }
    }
}

/// Lock dimension of a node at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    /// Locked until the contained timestamp (exclusive).
    Locked { until: u64 },
    /// A lock was started and has run out, but no action has cleared it yet.
    Expired { at: u64 },
}

/// A Bloom node: NFT-backed deposited value accruing time-based rewards.
///
/// Ownership lives in the node registry; the node itself never records
/// its owner.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Bloom {
    pub id: BloomId,
    pub name: String,
    /// Accumulated deposit in native units.
    pub value: u64,
    pub creation_time: u64,
    /// Baseline for elapsed-time accrual.
    pub last_interaction: u64,
    /// Fixed-point reward multiplier, see [`MULT_PRECISION`](crate::constants::MULT_PRECISION).
    pub reward_mult: u64,
    /// End of the current auto-compounding lock, if one has been started.
    pub lock_end: Option<u64>,
    /// Timestamp of the last emergency claim on this node.
    pub last_emergency: Option<u64>,
    /// Lifetime net rewards paid out.
    pub total_claimed: u64,
    /// Reward accrued before the last deposit and not yet realized.
    #[serde(default)]
    pub pending_carry: u64,
}

impl Bloom {
    /// A freshly minted node at the base multiplier.
    pub fn new(id: BloomId, name: String, value: u64, now: u64, base_multiplier: u64) -> Self {
        Self {
            id,
            name,
            value,
            creation_time: now,
            last_interaction: now,
            reward_mult: base_multiplier,
            lock_end: None,
            last_emergency: None,
            total_claimed: 0,
            pending_carry: 0,
        }
    }

    pub fn lock_state(&self, now: u64) -> LockState {
        match self.lock_end {
            None => LockState::Unlocked,
            Some(until) if now < until => LockState::Locked { until },
            Some(at) => LockState::Expired { at },
        }
    }

    /// Seconds since the last reward-affecting interaction.
    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_interaction)
    }

    /// Drop the lock and return the multiplier to base.
    pub fn clear_lock(&mut self, base_multiplier: u64) {
        self.lock_end = None;
        self.reward_mult = base_multiplier;
    }
}

/// Read-only snapshot of a node, joined with its registry owner.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BloomView {
    pub id: BloomId,
    pub owner: Address,
    pub name: String,
    pub value: u64,
    pub creation_time: u64,
    pub last_interaction: u64,
    pub reward_mult: u64,
    pub lock_end: Option<u64>,
    pub pending_rewards: u64,
    pub total_claimed: u64,
}

impl BloomView {
    /// Creation time as a UTC datetime, `None` if out of chrono's range.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.creation_time)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Render as a JSON object, as returned to off-chain clients.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "owner": self.owner.to_string(),
            "name": self.name,
            "value": self.value,
            "creationTime": self.creation_time,
            "lastInteraction": self.last_interaction,
            "rewardMult": self.reward_mult,
            "lockEnd": self.lock_end,
            "pendingRewards": self.pending_rewards,
            "totalClaimed": self.total_claimed,
        })
    }
}
