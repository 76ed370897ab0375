//! # bloom-ledger
//! In-memory collaborators for the node manager.
//!
//! Every type here implements one of the `bloom-core` collaborator traits
//! with interior mutability, so it can be shared as `Arc<dyn Trait>`:
//! - [`token::MemoryLedger`]: fungible token with allowances and burning
//! - [`router::ConstantProductRouter`]: x*y=k price conversion
//! - [`whitelist::MemoryWhitelist`]: admin-managed access gate
//! - [`nft::BloomNft`]: node ownership registry
//! - [`badges::BloomTiers`]: one-tier-per-holder badge collection
//! - [`clock::ManualClock`] / [`clock::SystemClock`]

pub mod badges;
pub mod clock;
pub mod nft;
pub mod router;
pub mod token;
pub mod whitelist;

pub use badges::BloomTiers;
pub use clock::{ManualClock, SystemClock};
pub use nft::BloomNft;
pub use router::ConstantProductRouter;
pub use token::MemoryLedger;
pub use whitelist::MemoryWhitelist;
