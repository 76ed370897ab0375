//! # bloom-core
//! Foundation types, reward policy, and collaborator traits for Bloom nodes.

pub mod config;
pub mod constants;
pub mod error;
pub mod policy;
pub mod traits;
pub mod types;

pub use config::ManagerConfig;
pub use error::BloomError;
pub use policy::{EmergencyFeePolicy, LockTier, RewardPolicy};
pub use types::{Address, Bloom, BloomId, BloomView, LockState, PayToken};
