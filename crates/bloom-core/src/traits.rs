//! Trait interfaces between the node manager and its collaborators.
//!
//! - [`TokenLedger`]: fungible token balances (bloom-ledger implements)
//! - [`PriceRouter`]: converts stable deposits into native terms
//! - [`NodeRegistry`]: NFT ownership of node ids
//! - [`AccessGate`]: whitelist consulted before native deposits
//! - [`Clock`]: current Unix time
//! - [`RewardCalculator`]: reward and fee math (bloom-rewards implements)
//!
//! All collaborators take `&self` and synchronize internally, so the
//! manager can hold them as `Arc<dyn Trait>`.

use crate::constants::BPS_PRECISION;
use crate::error::{LedgerError, RegistryError, RewardError, RouterError};
use crate::types::{Address, BloomId, PayToken};

/// A fungible token ledger.
pub trait TokenLedger: Send + Sync {
    /// Ticker symbol, used in logs.
    fn symbol(&self) -> String;

    fn balance_of(&self, owner: &Address) -> u64;

    fn total_supply(&self) -> u64;

    fn allowance(&self, owner: &Address, spender: &Address) -> u64;

    /// Set `spender`'s allowance over `owner`'s balance to `amount`.
    fn approve(&self, owner: &Address, spender: &Address, amount: u64) -> Result<(), LedgerError>;

    fn transfer(&self, from: &Address, to: &Address, amount: u64) -> Result<(), LedgerError>;

    /// Move `amount` from `from` to `to`, spending `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), LedgerError>;

    fn burn(&self, from: &Address, amount: u64) -> Result<(), LedgerError>;

    /// Burn `amount` of `from`'s balance, spending `spender`'s allowance.
    fn burn_from(&self, spender: &Address, from: &Address, amount: u64) -> Result<(), LedgerError>;
}

/// Price conversion into native-token terms.
pub trait PriceRouter: Send + Sync {
    /// How many native units `amount_in` of `token_in` is worth.
    ///
    /// Native input must convert one-to-one.
    fn convert(&self, amount_in: u64, token_in: PayToken) -> Result<u64, RouterError>;
}

/// NFT registry recording who controls each node id.
pub trait NodeRegistry: Send + Sync {
    /// Mint `id` to `to`. Only an approved minter may call this.
    fn mint(&self, minter: &Address, to: &Address, id: BloomId) -> Result<(), RegistryError>;

    fn owner_of(&self, id: BloomId) -> Result<Address, RegistryError>;

    fn balance_of(&self, owner: &Address) -> u64;

    /// Single-token approval, if any.
    fn get_approved(&self, id: BloomId) -> Result<Option<Address>, RegistryError>;

    fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool;

    /// Whether `spender` may act on `id`.
    ///
    /// Default implementation: owner, single-token approval, or operator.
    fn is_approved_or_owner(&self, spender: &Address, id: BloomId) -> Result<bool, RegistryError> {
        let owner = self.owner_of(id)?;
        if owner == *spender || self.is_approved_for_all(&owner, spender) {
            return Ok(true);
        }
        Ok(self.get_approved(id)? == Some(*spender))
    }
}

/// Whitelist gate for native-token deposits.
pub trait AccessGate: Send + Sync {
    fn is_whitelisted(&self, account: &Address) -> bool;
}

/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Pure computation of rewards, multipliers, and emergency fees.
///
/// All math is integer-only with fixed-point precision.
pub trait RewardCalculator: Send + Sync {
    /// Reward accrued by `value` at `reward_mult` over `elapsed_secs`.
    fn accrued_reward(
        &self,
        value: u64,
        reward_mult: u64,
        reward_per_day: u64,
        elapsed_secs: u64,
    ) -> Result<u64, RewardError>;

    /// Multiplier of an unlocked node.
    fn base_multiplier(&self) -> u64;

    /// Multiplier earned by a lock of `duration_secs`.
    fn lock_multiplier(&self, duration_secs: u64) -> u64;

    /// Multiplier of tier `index`. Fails with `InvalidTier` outside the table.
    fn tier_level(&self, index: usize) -> Result<u64, RewardError>;

    /// Emergency fee in basis points for the claim following `streak` earlier
    /// claims inside the window.
    fn emergency_fee_bps(&self, streak: u32) -> u64;

    /// Split `gross` into `(net, fee)` for the given streak.
    ///
    /// Default implementation: `fee = gross * emergency_fee_bps / BPS_PRECISION`.
    fn split_emergency(&self, gross: u64, streak: u32) -> Result<(u64, u64), RewardError> {
        let fee_bps = self.emergency_fee_bps(streak).min(BPS_PRECISION);
        let fee = (gross as u128)
            .checked_mul(fee_bps as u128)
            .ok_or(RewardError::ArithmeticOverflow)?
            / BPS_PRECISION as u128;
        let fee = fee as u64;
        Ok((gross - fee, fee))
    }
}
