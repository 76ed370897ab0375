//! # bloom-rewards
//! Reward accrual and penalty engine.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! - **Accrual**: rewards are a pure function of value, multiplier, daily
//!   rate, and elapsed seconds, realized lazily on each interaction.
//! - **Lock tiers**: a step function maps lock length to an additive
//!   multiplier bonus.
//! - **Emergency fee**: each emergency claim inside a rolling window raises
//!   the fee by a fixed step up to a cap; the streak resets once a full
//!   window passes without a claim.

pub mod accrual;
pub mod emergency;
pub mod engine;
pub mod tiers;

pub use accrual::accrued_reward;
pub use emergency::EmergencyStreak;
pub use engine::RewardEngine;
pub use tiers::LockTierTable;
