//! Shared deployment fixture for integration tests.

use std::sync::Arc;

use bloom_core::config::ManagerConfig;
use bloom_core::constants::{DEFAULT_MIN_CREATION_PRICE, DEFAULT_REWARD_PER_DAY, SECONDS_PER_DAY};
use bloom_core::traits::{Clock, TokenLedger};
use bloom_core::types::{Address, BloomId, PayToken};
use bloom_ledger::{BloomNft, ConstantProductRouter, ManualClock, MemoryLedger, MemoryWhitelist};
use bloom_manager::{Accounts, BloomsManager, Collaborators};

pub const DAY: u64 = SECONDS_PER_DAY;
pub const WEEK: u64 = 7 * DAY;

/// Arbitrary deployment time.
pub const GENESIS_TIME: u64 = 1_700_000_000;
/// Native supply minted to the deployer.
pub const INITIAL_SUPPLY: u64 = 1_000_000_000_000_000;
/// Native amount moved into the reward pool and approved for deposits.
pub const APPROVAL_AMOUNT: u64 = 10_000_000_000;
pub const MIN_NODE_PRICE: u64 = DEFAULT_MIN_CREATION_PRICE;
pub const REWARD_PER_DAY: u64 = DEFAULT_REWARD_PER_DAY;

pub fn account(label: &str) -> Address {
    Address::from_label(label)
}

/// A manager wired to fresh in-memory collaborators.
///
/// `owner` deployed everything: it is the admin of the manager, the
/// registry, and the whitelist, and holds the whole native supply.
pub struct Deployment {
    pub owner: Address,
    pub accounts: Accounts,
    pub nectar: Arc<MemoryLedger>,
    pub usdc: Arc<MemoryLedger>,
    pub router: Arc<ConstantProductRouter>,
    pub nft: Arc<BloomNft>,
    pub whitelist: Arc<MemoryWhitelist>,
    pub clock: Arc<ManualClock>,
    pub manager: BloomsManager,
}

impl Deployment {
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        let owner = account("owner");
        let accounts = Accounts {
            admin: owner,
            manager: account("blooms-manager"),
            treasury: account("vault"),
        };
        let nectar = Arc::new(MemoryLedger::with_supply("NCTR", &owner, INITIAL_SUPPLY));
        let usdc = Arc::new(MemoryLedger::with_supply("USDC.e", &owner, INITIAL_SUPPLY));
        let router = Arc::new(ConstantProductRouter::mock());
        let nft = Arc::new(BloomNft::new(owner, "https://"));
        nft.set_minter(&owner, accounts.manager).unwrap();
        let whitelist = Arc::new(MemoryWhitelist::new(owner));
        let clock = Arc::new(ManualClock::new(GENESIS_TIME));

        let collab = Collaborators {
            native: nectar.clone(),
            stable: usdc.clone(),
            router: router.clone(),
            registry: nft.clone(),
            whitelist: whitelist.clone(),
            clock: clock.clone(),
        };
        let manager = BloomsManager::new(&config, collab, accounts).unwrap();

        Self { owner, accounts, nectar, usdc, router, nft, whitelist, clock, manager }
    }

    /// The usual test setup: minimum price set, reward pool funded, owner
    /// whitelisted, and both tokens approved for the manager.
    pub fn ready() -> Self {
        let d = Self::new();
        d.manager.set_node_min_price(&d.owner, MIN_NODE_PRICE).unwrap();
        d.fund_pool(APPROVAL_AMOUNT);
        d.whitelist_accounts(&[d.owner]);
        d.approve_native(&d.owner, APPROVAL_AMOUNT);
        d.approve_stable(&d.owner, APPROVAL_AMOUNT);
        d
    }

    pub fn fund_pool(&self, amount: u64) {
        self.nectar.transfer(&self.owner, &self.accounts.manager, amount).unwrap();
    }

    pub fn whitelist_accounts(&self, accounts: &[Address]) {
        self.whitelist.add_to_whitelist(&self.owner, accounts).unwrap();
    }

    pub fn approve_native(&self, holder: &Address, amount: u64) {
        self.nectar.approve(holder, &self.accounts.manager, amount).unwrap();
    }

    pub fn approve_stable(&self, holder: &Address, amount: u64) {
        self.usdc.approve(holder, &self.accounts.manager, amount).unwrap();
    }

    /// A funded, approved, whitelisted account other than the owner.
    pub fn user(&self, label: &str, native: u64) -> Address {
        let user = account(label);
        self.nectar.transfer(&self.owner, &user, native).unwrap();
        self.approve_native(&user, native);
        self.whitelist_accounts(&[user]);
        user
    }

    /// Create `count` minimum-price native nodes owned by `self.owner`.
    pub fn create_blooms(&self, count: usize) -> Vec<BloomId> {
        (0..count)
            .map(|_| {
                self.manager
                    .create_bloom(&self.owner, "Bloom", MIN_NODE_PRICE, PayToken::Native)
                    .unwrap()
            })
            .collect()
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Move the clock to `GENESIS_TIME + offset`, like mining a block at
    /// that timestamp.
    pub fn mine_at(&self, offset: u64) {
        self.clock.set(GENESIS_TIME + offset);
    }

    pub fn native_balance(&self, account: &Address) -> u64 {
        self.nectar.balance_of(account)
    }

    pub fn pool_balance(&self) -> u64 {
        self.nectar.balance_of(&self.accounts.manager)
    }

    /// Sum of every node's value, read back through the views.
    pub fn sum_of_values(&self) -> u64 {
        let ids: Vec<BloomId> = (1..=self.manager.total_blooms() as u64).collect();
        self.manager
            .blooms_by_ids(&ids)
            .unwrap()
            .iter()
            .map(|v| v.value)
            .sum()
    }

    /// Native gained by `owner` across `f`.
    pub fn native_gain(&self, owner: &Address, f: impl FnOnce()) -> u64 {
        let before = self.native_balance(owner);
        f();
        self.native_balance(owner) - before
    }
}

impl Default for Deployment {
    fn default() -> Self {
        Self::new()
    }
}
