//! # bloom-manager
//! Bloom node lifecycle engine.
//!
//! [`manager::BloomsManager`] owns every node record, the total value
//! locked, and the per-owner emergency streaks behind a single mutex.
//! Rewards accrue lazily from `last_interaction` and are realized only by
//! compounding, claiming, emergency claiming, or starting a lock.
//!
//! Collaborators are injected as trait objects from `bloom-core`:
//! token ledgers, the price router, the node registry, the whitelist gate,
//! and the clock.

pub mod logging;
pub mod manager;

pub use logging::init_logging;
pub use manager::{Accounts, BloomsManager, Collaborators, EmergencyReceipt};
