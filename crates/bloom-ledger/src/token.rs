//! In-memory fungible token ledger.

use std::collections::HashMap;

use bloom_core::error::LedgerError;
use bloom_core::traits::TokenLedger;
use bloom_core::types::Address;
use parking_lot::RwLock;
use tracing::debug;

#[derive(Default)]
struct LedgerState {
    balances: HashMap<Address, u64>,
    allowances: HashMap<(Address, Address), u64>,
    total_supply: u64,
}

impl LedgerState {
    fn balance(&self, owner: &Address) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn debit(&mut self, from: &Address, amount: u64) -> Result<(), LedgerError> {
        let have = self.balance(from);
        if have < amount {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }
        self.balances.insert(*from, have - amount);
        Ok(())
    }

    fn credit(&mut self, to: &Address, amount: u64) -> Result<(), LedgerError> {
        let entry = self.balances.entry(*to).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(LedgerError::SupplyOverflow)?;
        Ok(())
    }

    /// Check and consume allowance. Must only be called once the rest of
    /// the operation is known to succeed.
    fn spend_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let key = (*owner, *spender);
        let have = self.allowances.get(&key).copied().unwrap_or(0);
        if have < amount {
            return Err(LedgerError::InsufficientAllowance { have, need: amount });
        }
        if have != u64::MAX {
            self.allowances.insert(key, have - amount);
        }
        Ok(())
    }

    fn check_allowance(&self, owner: &Address, spender: &Address, amount: u64) -> Result<(), LedgerError> {
        let have = self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0);
        if have < amount {
            return Err(LedgerError::InsufficientAllowance { have, need: amount });
        }
        Ok(())
    }
}

/// A fungible token held entirely in memory.
///
/// An allowance of `u64::MAX` is treated as infinite and never decremented.
pub struct MemoryLedger {
    symbol: String,
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// Create a ledger with `supply` minted to `holder`.
    pub fn with_supply(symbol: impl Into<String>, holder: &Address, supply: u64) -> Self {
        let ledger = Self::new(symbol);
        {
            let mut state = ledger.state.write();
            state.balances.insert(*holder, supply);
            state.total_supply = supply;
        }
        ledger
    }

    /// Create new tokens.
    pub fn mint(&self, to: &Address, amount: u64) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow)?;
        state.credit(to, amount)?;
        state.total_supply = supply;
        Ok(())
    }
}

impl TokenLedger for MemoryLedger {
    fn symbol(&self) -> String {
        self.symbol.clone()
    }

    fn balance_of(&self, owner: &Address) -> u64 {
        self.state.read().balance(owner)
    }

    fn total_supply(&self) -> u64 {
        self.state.read().total_supply
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.state
            .read()
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn approve(&self, owner: &Address, spender: &Address, amount: u64) -> Result<(), LedgerError> {
        self.state.write().allowances.insert((*owner, *spender), amount);
        Ok(())
    }

    fn transfer(&self, from: &Address, to: &Address, amount: u64) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        state.debit(from, amount)?;
        state.credit(to, amount)?;
        debug!(symbol = %self.symbol, %from, %to, amount, "transfer");
        Ok(())
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        state.check_allowance(from, spender, amount)?;
        state.debit(from, amount)?;
        state.credit(to, amount)?;
        state.spend_allowance(from, spender, amount)?;
        debug!(symbol = %self.symbol, %spender, %from, %to, amount, "transfer_from");
        Ok(())
    }

    fn burn(&self, from: &Address, amount: u64) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        state.debit(from, amount)?;
        state.total_supply -= amount;
        debug!(symbol = %self.symbol, %from, amount, "burn");
        Ok(())
    }

    fn burn_from(&self, spender: &Address, from: &Address, amount: u64) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        state.check_allowance(from, spender, amount)?;
        state.debit(from, amount)?;
        state.spend_allowance(from, spender, amount)?;
        state.total_supply -= amount;
        debug!(symbol = %self.symbol, %spender, %from, amount, "burn_from");
        Ok(())
    }
}
