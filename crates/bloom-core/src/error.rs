//! Error types for Bloom nodes and their collaborators.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("amount {amount} below minimum creation price {min}")] BelowMinimumPrice { amount: u64, min: u64 },
    #[error("node not found: {0}")] NotFound(u64),
    #[error("caller does not own node {0}")] NotOwner(u64),
    #[error("caller is not authorized")] NotAuthorized,
    #[error("node {id} already locked until {lock_end}")] AlreadyLocked { id: u64, lock_end: u64 },
    #[error("node {id} not processable until {until}")] NotProcessable { id: u64, until: u64 },
    #[error("node {id} locked until {lock_end}")] StillLocked { id: u64, lock_end: u64 },
    #[error("address not whitelisted: {0}")] NotWhitelisted(String),
    #[error("invalid node name")] InvalidName,
    #[error("lock duration must be non-zero")] InvalidLockDuration,
    #[error("amount must be non-zero")] ZeroAmount,
    #[error("value overflow")] ValueOverflow,
}

impl NodeError {
    /// Stable numeric code surfaced to callers that only understand codes.
    pub fn code(&self) -> u8 {
        match self {
            Self::NotFound(_) => 1,
            Self::BelowMinimumPrice { .. } => 2,
            Self::InvalidName => 3,
            Self::NotOwner(_) => 4,
            Self::NotAuthorized => 5,
            Self::NotWhitelisted(_) => 6,
            Self::ZeroAmount => 7,
            Self::ValueOverflow => 8,
            Self::InvalidLockDuration => 11,
            Self::AlreadyLocked { .. } => 12,
            Self::StillLocked { .. } => 13,
            Self::NotProcessable { .. } => 14,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewardError {
    #[error("arithmetic overflow")] ArithmeticOverflow,
    #[error("invalid tier: {0}")] InvalidTier(usize),
    #[error("invalid policy: {0}")] InvalidPolicy(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: u64, need: u64 },
    #[error("insufficient allowance: have {have}, need {need}")] InsufficientAllowance { have: u64, need: u64 },
    #[error("supply overflow")] SupplyOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("no pool for token: {0}")] UnknownPool(String),
    #[error("insufficient liquidity")] InsufficientLiquidity,
    #[error("zero input amount")] ZeroAmount,
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Not approved")] NotApproved,
    #[error("nonexistent token: {0}")] NonexistentToken(u64),
    #[error("token already minted: {0}")] AlreadyMinted(u64),
    #[error("caller is not owner nor approved")] NotOwnerNorApproved,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TierError {
    #[error("Invalid token ID: {0}")] InvalidTier(u32),
    #[error("Not approved")] NotApproved,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("caller is not the whitelist admin")] NotAdmin,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config source: {0}")] Source(String),
    #[error("invalid config: {0}")] Invalid(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BloomError {
    #[error(transparent)] Node(#[from] NodeError),
    #[error(transparent)] Reward(#[from] RewardError),
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Router(#[from] RouterError),
    #[error(transparent)] Registry(#[from] RegistryError),
    #[error(transparent)] Tier(#[from] TierError),
    #[error(transparent)] Gate(#[from] GateError),
    #[error(transparent)] Config(#[from] ConfigError),
}
