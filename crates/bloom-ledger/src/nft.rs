//! Node ownership registry.
//!
//! Each node id is a non-fungible token. Only the admin and the configured
//! minter (the node manager) can mint; anyone may transfer a token they own
//! or are approved for.

use std::collections::{HashMap, HashSet};

use bloom_core::error::RegistryError;
use bloom_core::traits::NodeRegistry;
use bloom_core::types::{Address, BloomId};
use parking_lot::RwLock;
use tracing::{debug, info};

#[derive(Default)]
struct RegistryState {
    owners: HashMap<BloomId, Address>,
    balances: HashMap<Address, u64>,
    approvals: HashMap<BloomId, Address>,
    operators: HashSet<(Address, Address)>,
}

pub struct BloomNft {
    admin: Address,
    minter: RwLock<Option<Address>>,
    base_uri: String,
    state: RwLock<RegistryState>,
}

impl BloomNft {
    pub fn new(admin: Address, base_uri: impl Into<String>) -> Self {
        Self {
            admin,
            minter: RwLock::new(None),
            base_uri: base_uri.into(),
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Authorize `minter` to mint. Admin only.
    pub fn set_minter(&self, caller: &Address, minter: Address) -> Result<(), RegistryError> {
        if *caller != self.admin {
            return Err(RegistryError::NotApproved);
        }
        *self.minter.write() = Some(minter);
        info!(%minter, "registry minter set");
        Ok(())
    }

    pub fn transfer(
        &self,
        caller: &Address,
        from: &Address,
        to: &Address,
        id: BloomId,
    ) -> Result<(), RegistryError> {
        if !self.is_approved_or_owner(caller, id)? {
            return Err(RegistryError::NotOwnerNorApproved);
        }
        let mut state = self.state.write();
        if state.owners.get(&id) != Some(from) {
            return Err(RegistryError::NotOwnerNorApproved);
        }
        state.approvals.remove(&id);
        state.owners.insert(id, *to);
        if let Some(b) = state.balances.get_mut(from) {
            *b = b.saturating_sub(1);
        }
        *state.balances.entry(*to).or_insert(0) += 1;
        debug!(id, %from, %to, "node transferred");
        Ok(())
    }

    /// Approve `spender` for a single token. Owner or operator only.
    pub fn approve(&self, caller: &Address, spender: Address, id: BloomId) -> Result<(), RegistryError> {
        let owner = self.owner_of(id)?;
        if owner != *caller && !self.is_approved_for_all(&owner, caller) {
            return Err(RegistryError::NotOwnerNorApproved);
        }
        self.state.write().approvals.insert(id, spender);
        Ok(())
    }

    pub fn set_approval_for_all(&self, owner: &Address, operator: Address, approved: bool) {
        let mut state = self.state.write();
        if approved {
            state.operators.insert((*owner, operator));
        } else {
            state.operators.remove(&(*owner, operator));
        }
    }

    pub fn token_uri(&self, id: BloomId) -> Result<String, RegistryError> {
        self.owner_of(id)?;
        Ok(format!("{}{}", self.base_uri, id))
    }

    fn can_mint(&self, caller: &Address) -> bool {
        *caller == self.admin || *self.minter.read() == Some(*caller)
    }
}

impl NodeRegistry for BloomNft {
    fn mint(&self, minter: &Address, to: &Address, id: BloomId) -> Result<(), RegistryError> {
        if !self.can_mint(minter) {
            return Err(RegistryError::NotApproved);
        }
        let mut state = self.state.write();
        if state.owners.contains_key(&id) {
            return Err(RegistryError::AlreadyMinted(id));
        }
        state.owners.insert(id, *to);
        *state.balances.entry(*to).or_insert(0) += 1;
        debug!(id, %to, "node minted");
        Ok(())
    }

    fn owner_of(&self, id: BloomId) -> Result<Address, RegistryError> {
        self.state
            .read()
            .owners
            .get(&id)
            .copied()
            .ok_or(RegistryError::NonexistentToken(id))
    }

    fn balance_of(&self, owner: &Address) -> u64 {
        self.state.read().balances.get(owner).copied().unwrap_or(0)
    }

    fn get_approved(&self, id: BloomId) -> Result<Option<Address>, RegistryError> {
        let state = self.state.read();
        if !state.owners.contains_key(&id) {
            return Err(RegistryError::NonexistentToken(id));
        }
        Ok(state.approvals.get(&id).copied())
    }

    fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool {
        self.state.read().operators.contains(&(*owner, *operator))
    }
}
