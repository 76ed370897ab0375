//! Admin-managed whitelist gating native-token deposits.

use std::collections::HashSet;

use bloom_core::error::GateError;
use bloom_core::traits::AccessGate;
use bloom_core::types::Address;
use parking_lot::RwLock;
use tracing::info;

pub struct MemoryWhitelist {
    admin: Address,
    members: RwLock<HashSet<Address>>,
}

impl MemoryWhitelist {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            members: RwLock::new(HashSet::new()),
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn add_to_whitelist(&self, caller: &Address, accounts: &[Address]) -> Result<(), GateError> {
        self.ensure_admin(caller)?;
        let mut members = self.members.write();
        members.extend(accounts.iter().copied());
        info!(added = accounts.len(), total = members.len(), "whitelist updated");
        Ok(())
    }

    pub fn remove_from_whitelist(&self, caller: &Address, accounts: &[Address]) -> Result<(), GateError> {
        self.ensure_admin(caller)?;
        let mut members = self.members.write();
        for account in accounts {
            members.remove(account);
        }
        info!(removed = accounts.len(), total = members.len(), "whitelist updated");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    fn ensure_admin(&self, caller: &Address) -> Result<(), GateError> {
        if *caller != self.admin {
            return Err(GateError::NotAdmin);
        }
        Ok(())
    }
}

impl AccessGate for MemoryWhitelist {
    fn is_whitelisted(&self, account: &Address) -> bool {
        self.members.read().contains(account)
    }
}
