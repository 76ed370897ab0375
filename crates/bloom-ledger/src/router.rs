//! Constant-product price router.
//!
//! Quotes how much native token an input amount is worth using the
//! x*y=k formula with a swap fee:
//!
//! `out = in * (100_000 - fee) * reserve_out / (reserve_in * 100_000 + in * (100_000 - fee))`
//!
//! Quotes never move the reserves.

use std::collections::HashMap;

use bloom_core::error::RouterError;
use bloom_core::traits::PriceRouter;
use bloom_core::types::PayToken;
use parking_lot::RwLock;

/// Denominator of the swap fee.
pub const FEE_PRECISION: u64 = 100_000;

/// Default swap fee: 0.3%.
pub const DEFAULT_SWAP_FEE: u64 = 300;

/// Reserves of a `token <-> native` pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolReserves {
    pub reserve_in: u64,
    pub reserve_native: u64,
}

pub struct ConstantProductRouter {
    fee: u64,
    pools: RwLock<HashMap<PayToken, PoolReserves>>,
}

impl ConstantProductRouter {
    pub fn new(fee: u64) -> Self {
        Self {
            fee: fee.min(FEE_PRECISION),
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Router with a single stable pool where the stable token is worth
    /// about ten native units, matching the development deployment.
    pub fn mock() -> Self {
        let router = Self::new(DEFAULT_SWAP_FEE);
        router.set_pool(
            PayToken::Stable,
            PoolReserves { reserve_in: 1_000_000, reserve_native: 10_000_000 },
        );
        router
    }

    pub fn set_pool(&self, token: PayToken, reserves: PoolReserves) {
        self.pools.write().insert(token, reserves);
    }

    pub fn pool(&self, token: PayToken) -> Option<PoolReserves> {
        self.pools.read().get(&token).copied()
    }

    /// Output of swapping `amount_in` into a pool with the given reserves.
    pub fn get_amount_out(
        &self,
        amount_in: u64,
        reserve_in: u64,
        reserve_out: u64,
    ) -> Result<u64, RouterError> {
        if amount_in == 0 {
            return Err(RouterError::ZeroAmount);
        }
        if reserve_in == 0 || reserve_out == 0 {
            return Err(RouterError::InsufficientLiquidity);
        }
        let amount_in_with_fee = amount_in as u128 * (FEE_PRECISION - self.fee) as u128;
        let numerator = amount_in_with_fee
            .checked_mul(reserve_out as u128)
            .ok_or(RouterError::ArithmeticOverflow)?;
        let denominator = reserve_in as u128 * FEE_PRECISION as u128 + amount_in_with_fee;
        u64::try_from(numerator / denominator).map_err(|_| RouterError::ArithmeticOverflow)
    }
}

impl PriceRouter for ConstantProductRouter {
    fn convert(&self, amount_in: u64, token_in: PayToken) -> Result<u64, RouterError> {
        if token_in == PayToken::Native {
            return Ok(amount_in);
        }
        let pool = self
            .pool(token_in)
            .ok_or_else(|| RouterError::UnknownPool(token_in.to_string()))?;
        self.get_amount_out(amount_in, pool.reserve_in, pool.reserve_native)
    }
}
