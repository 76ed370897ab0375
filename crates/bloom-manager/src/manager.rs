//! The Bloom node manager.
//!
//! Every public operation takes the state mutex for its whole duration and
//! validates all preconditions before the first collaborator call that
//! moves funds, so a failed operation leaves no partial mutation behind.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bloom_core::config::ManagerConfig;
use bloom_core::constants::MAX_NAME_LEN;
use bloom_core::error::{BloomError, ConfigError, LedgerError, NodeError, RegistryError, RewardError};
use bloom_core::policy::EmergencyFeePolicy;
use bloom_core::traits::{AccessGate, Clock, NodeRegistry, PriceRouter, RewardCalculator, TokenLedger};
use bloom_core::types::{Address, Bloom, BloomId, BloomView, LockState, PayToken};
use bloom_rewards::{EmergencyStreak, RewardEngine};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

/// External services the manager calls into.
#[derive(Clone)]
pub struct Collaborators {
    /// Native reward token. Native deposits are burned; rewards are paid
    /// from the manager's own balance.
    pub native: Arc<dyn TokenLedger>,
    /// Stable token. Stable deposits go to the treasury.
    pub stable: Arc<dyn TokenLedger>,
    pub router: Arc<dyn PriceRouter>,
    pub registry: Arc<dyn NodeRegistry>,
    pub whitelist: Arc<dyn AccessGate>,
    pub clock: Arc<dyn Clock>,
}

/// Addresses the manager acts as or pays to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Accounts {
    /// May change the reward rate and minimum price.
    pub admin: Address,
    /// The manager's own account: reward pool holder, minter, and spender.
    pub manager: Address,
    /// Receives stable deposits and emergency fees.
    pub treasury: Address,
}

/// Outcome of an emergency claim.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmergencyReceipt {
    pub gross: u64,
    pub net: u64,
    pub fee: u64,
    pub fee_bps: u64,
    /// Earlier claims inside the window this claim was charged for.
    pub streak: u32,
}

struct ManagerState {
    blooms: BTreeMap<BloomId, Bloom>,
    next_id: BloomId,
    total_value_locked: u64,
    streaks: HashMap<Address, EmergencyStreak>,
    reward_per_day: u64,
    min_creation_price: u64,
}

pub struct BloomsManager {
    collab: Collaborators,
    accounts: Accounts,
    rewards: Arc<dyn RewardCalculator>,
    emergency: EmergencyFeePolicy,
    state: Mutex<ManagerState>,
}

impl BloomsManager {
    /// Build a manager with a [`RewardEngine`] over `config.policy`.
    pub fn new(
        config: &ManagerConfig,
        collab: Collaborators,
        accounts: Accounts,
    ) -> Result<Self, BloomError> {
        config.validate()?;
        let engine = RewardEngine::new(config.policy.clone())?;
        Ok(Self::with_calculator(config, collab, accounts, Arc::new(engine)))
    }

    /// Build a manager with a custom reward calculator.
    ///
    /// The emergency window and processing cooldown still come from
    /// `config.policy.emergency`.
    pub fn with_calculator(
        config: &ManagerConfig,
        collab: Collaborators,
        accounts: Accounts,
        rewards: Arc<dyn RewardCalculator>,
    ) -> Self {
        info!(
            reward_per_day = config.reward_per_day,
            min_creation_price = config.min_creation_price,
            manager = %accounts.manager,
            treasury = %accounts.treasury,
            "bloom manager initialized"
        );
        Self {
            collab,
            accounts,
            rewards,
            emergency: config.policy.emergency.clone(),
            state: Mutex::new(ManagerState {
                blooms: BTreeMap::new(),
                next_id: 1,
                total_value_locked: 0,
                streaks: HashMap::new(),
                reward_per_day: config.reward_per_day,
                min_creation_price: config.min_creation_price,
            }),
        }
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    // ------------------------------------------------------------------
    // Creation and deposits
    // ------------------------------------------------------------------

    /// Deposit `amount` of `pay_token` and mint a new node to `caller`.
    pub fn create_bloom(
        &self,
        caller: &Address,
        name: &str,
        amount: u64,
        pay_token: PayToken,
    ) -> Result<BloomId, BloomError> {
        let mut state = self.state.lock();
        let name = validate_name(name)?;
        if amount < state.min_creation_price {
            return Err(NodeError::BelowMinimumPrice {
                amount,
                min: state.min_creation_price,
            }
            .into());
        }
        if amount == 0 {
            return Err(NodeError::ZeroAmount.into());
        }

        let id = state.next_id;
        if self.collab.registry.owner_of(id).is_ok() {
            return Err(RegistryError::AlreadyMinted(id).into());
        }
        let credited = self.quote(caller, amount, pay_token)?;
        let tvl = state
            .total_value_locked
            .checked_add(credited)
            .ok_or(NodeError::ValueOverflow)?;
        let next_id = id.checked_add(1).ok_or(NodeError::ValueOverflow)?;

        self.collect(caller, amount, pay_token)?;
        self.collab.registry.mint(&self.accounts.manager, caller, id)?;

        let now = self.collab.clock.now();
        state
            .blooms
            .insert(id, Bloom::new(id, name, credited, now, self.rewards.base_multiplier()));
        state.next_id = next_id;
        state.total_value_locked = tvl;
        info!(id, owner = %caller, amount, credited, %pay_token, tvl, "bloom created");
        Ok(id)
    }

    /// Deposit more value into an existing node. Returns the credited amount.
    ///
    /// Reward accrued on the old value is carried forward unrealized, and
    /// the deposit starts accruing from now.
    pub fn add_value(
        &self,
        caller: &Address,
        id: BloomId,
        amount: u64,
        pay_token: PayToken,
    ) -> Result<u64, BloomError> {
        let mut state = self.state.lock();
        self.authorize(&state, caller, id)?;
        if amount == 0 {
            return Err(NodeError::ZeroAmount.into());
        }
        let credited = self.quote(caller, amount, pay_token)?;
        let now = self.collab.clock.now();
        let bloom = &state.blooms[&id];
        let value = bloom.value.checked_add(credited).ok_or(NodeError::ValueOverflow)?;
        let carry = self.accrue(bloom, state.reward_per_day, now)?;
        let tvl = state
            .total_value_locked
            .checked_add(credited)
            .ok_or(NodeError::ValueOverflow)?;

        self.collect(caller, amount, pay_token)?;

        if let Some(bloom) = state.blooms.get_mut(&id) {
            bloom.value = value;
            bloom.pending_carry = carry;
            bloom.last_interaction = now;
        }
        state.total_value_locked = tvl;
        info!(id, amount, credited, %pay_token, value, tvl, carry, "value added");
        Ok(credited)
    }

    pub fn rename_bloom(&self, caller: &Address, id: BloomId, name: &str) -> Result<(), BloomError> {
        let mut state = self.state.lock();
        self.authorize(&state, caller, id)?;
        let name = validate_name(name)?;
        if let Some(bloom) = state.blooms.get_mut(&id) {
            debug!(id, old = %bloom.name, new = %name, "bloom renamed");
            bloom.name = name;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Locks and compounding
    // ------------------------------------------------------------------

    /// Lock a node for `duration_secs` and raise its multiplier to the
    /// matching tier. Rewards accrued so far are paid out first, fee-free.
    pub fn start_auto_compounding(
        &self,
        caller: &Address,
        id: BloomId,
        duration_secs: u64,
    ) -> Result<u64, BloomError> {
        let mut state = self.state.lock();
        let owner = self.authorize(&state, caller, id)?;
        if duration_secs == 0 {
            return Err(NodeError::InvalidLockDuration.into());
        }
        let now = self.collab.clock.now();
        let bloom = &state.blooms[&id];
        if let LockState::Locked { until } = bloom.lock_state(now) {
            return Err(NodeError::AlreadyLocked { id, lock_end: until }.into());
        }
        if let Some(last) = bloom.last_emergency {
            let until = last.saturating_add(self.emergency.processing_cooldown_secs);
            if now < until {
                return Err(NodeError::NotProcessable { id, until }.into());
            }
        }
        let lock_end = now
            .checked_add(duration_secs)
            .ok_or(NodeError::InvalidLockDuration)?;

        let pending = self.accrue(bloom, state.reward_per_day, now)?;
        self.ensure_pool(pending)?;
        self.pay(&owner, pending)?;

        let reward_mult = self.rewards.lock_multiplier(duration_secs);
        if let Some(bloom) = state.blooms.get_mut(&id) {
            bloom.last_interaction = now;
            bloom.pending_carry = 0;
            bloom.lock_end = Some(lock_end);
            bloom.reward_mult = reward_mult;
            bloom.total_claimed = bloom.total_claimed.saturating_add(pending);
        }
        info!(id, duration_secs, lock_end, reward_mult, paid = pending, "auto-compounding started");
        Ok(reward_mult)
    }

    /// Reinvest accrued rewards into the node. Returns the amount credited.
    ///
    /// Allowed during a lock. Once the lock has run out it is cleared and
    /// the multiplier returns to base.
    pub fn auto_compound(&self, caller: &Address, id: BloomId) -> Result<u64, BloomError> {
        let mut state = self.state.lock();
        self.authorize(&state, caller, id)?;
        let now = self.collab.clock.now();
        let bloom = &state.blooms[&id];
        let expired = matches!(bloom.lock_state(now), LockState::Expired { .. });
        let reward = self.accrue(bloom, state.reward_per_day, now)?;
        let value = bloom.value.checked_add(reward).ok_or(NodeError::ValueOverflow)?;
        let tvl = state
            .total_value_locked
            .checked_add(reward)
            .ok_or(NodeError::ValueOverflow)?;

        let base = self.rewards.base_multiplier();
        if let Some(bloom) = state.blooms.get_mut(&id) {
            bloom.value = value;
            bloom.last_interaction = now;
            bloom.pending_carry = 0;
            if expired {
                bloom.clear_lock(base);
                debug!(id, "expired lock cleared");
            }
        }
        state.total_value_locked = tvl;
        info!(id, reward, value, tvl, "auto-compounded");
        Ok(reward)
    }

    // ------------------------------------------------------------------
    // Claims
    // ------------------------------------------------------------------

    /// Pay accrued rewards to the node owner. Fails while a lock is active.
    pub fn auto_claim(&self, caller: &Address, id: BloomId) -> Result<u64, BloomError> {
        let mut state = self.state.lock();
        let owner = self.authorize(&state, caller, id)?;
        let now = self.collab.clock.now();
        let bloom = &state.blooms[&id];
        let expired = match bloom.lock_state(now) {
            LockState::Locked { until } => {
                return Err(NodeError::StillLocked { id, lock_end: until }.into());
            }
            LockState::Expired { .. } => true,
            LockState::Unlocked => false,
        };
        let reward = self.accrue(bloom, state.reward_per_day, now)?;
        self.ensure_pool(reward)?;
        self.pay(&owner, reward)?;

        let base = self.rewards.base_multiplier();
        if let Some(bloom) = state.blooms.get_mut(&id) {
            bloom.last_interaction = now;
            bloom.pending_carry = 0;
            bloom.total_claimed = bloom.total_claimed.saturating_add(reward);
            if expired {
                bloom.clear_lock(base);
            }
        }
        info!(id, %owner, reward, "rewards claimed");
        Ok(reward)
    }

    /// Claim accrued rewards at any time, paying an escalating fee to the
    /// treasury. Clears any lock and returns the multiplier to base.
    ///
    /// A claim with nothing accrued neither extends the owner's streak nor
    /// starts the processing cooldown.
    pub fn emergency_claim(&self, caller: &Address, id: BloomId) -> Result<EmergencyReceipt, BloomError> {
        let mut state = self.state.lock();
        let owner = self.authorize(&state, caller, id)?;
        let now = self.collab.clock.now();
        let window = self.emergency.window_secs;

        let gross = self.accrue(&state.blooms[&id], state.reward_per_day, now)?;
        let streak = state
            .streaks
            .get(&owner)
            .map(|s| s.active_count(now, window))
            .unwrap_or(0);
        let fee_bps = self.rewards.emergency_fee_bps(streak);
        let (net, fee) = self.rewards.split_emergency(gross, streak)?;

        self.ensure_pool(gross)?;
        self.pay(&owner, net)?;
        self.pay(&self.accounts.treasury, fee)?;

        if gross > 0 {
            state.streaks.retain(|_, s| s.active_count(now, window) > 0);
            state.streaks.entry(owner).or_default().record(now, window);
        }
        let base = self.rewards.base_multiplier();
        if let Some(bloom) = state.blooms.get_mut(&id) {
            bloom.clear_lock(base);
            if gross > 0 {
                bloom.last_emergency = Some(now);
            }
            bloom.last_interaction = now;
            bloom.pending_carry = 0;
            bloom.total_claimed = bloom.total_claimed.saturating_add(net);
        }

        if fee_bps >= self.emergency.max_fee_bps {
            warn!(id, %owner, streak, fee_bps, gross, net, "emergency claim charged at fee cap");
        } else {
            info!(id, %owner, streak, fee_bps, gross, net, fee, "emergency claim");
        }
        Ok(EmergencyReceipt { gross, net, fee, fee_bps, streak })
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Snapshots of the given nodes, in request order.
    pub fn blooms_by_ids(&self, ids: &[BloomId]) -> Result<Vec<BloomView>, BloomError> {
        let state = self.state.lock();
        let now = self.collab.clock.now();
        ids.iter()
            .map(|id| -> Result<BloomView, BloomError> {
                let bloom = state.blooms.get(id).ok_or(NodeError::NotFound(*id))?;
                Ok(BloomView {
                    id: *id,
                    owner: self.collab.registry.owner_of(*id)?,
                    name: bloom.name.clone(),
                    value: bloom.value,
                    creation_time: bloom.creation_time,
                    last_interaction: bloom.last_interaction,
                    reward_mult: bloom.reward_mult,
                    lock_end: bloom.lock_end,
                    pending_rewards: self.accrue(bloom, state.reward_per_day, now)?,
                    total_claimed: bloom.total_claimed,
                })
            })
            .collect()
    }

    pub fn bloom(&self, id: BloomId) -> Option<Bloom> {
        self.state.lock().blooms.get(&id).cloned()
    }

    /// Rewards a claim would realize right now, before any fee.
    pub fn pending_rewards(&self, id: BloomId) -> Result<u64, BloomError> {
        let state = self.state.lock();
        let bloom = state.blooms.get(&id).ok_or(NodeError::NotFound(id))?;
        Ok(self.accrue(bloom, state.reward_per_day, self.collab.clock.now())?)
    }

    pub fn total_value_locked(&self) -> u64 {
        self.state.lock().total_value_locked
    }

    pub fn total_blooms(&self) -> usize {
        self.state.lock().blooms.len()
    }

    pub fn creation_min_price(&self) -> u64 {
        self.state.lock().min_creation_price
    }

    pub fn reward_per_day(&self) -> u64 {
        self.state.lock().reward_per_day
    }

    /// Multiplier of lock tier `index`.
    pub fn tier_level(&self, index: usize) -> Result<u64, BloomError> {
        Ok(self.rewards.tier_level(index)?)
    }

    /// Earlier emergency claims by `owner` that still count toward the
    /// next claim's fee.
    pub fn emergency_streak(&self, owner: &Address) -> u32 {
        let now = self.collab.clock.now();
        self.state
            .lock()
            .streaks
            .get(owner)
            .map(|s| s.active_count(now, self.emergency.window_secs))
            .unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    pub fn set_node_min_price(&self, caller: &Address, min_price: u64) -> Result<(), BloomError> {
        self.ensure_admin(caller)?;
        self.state.lock().min_creation_price = min_price;
        info!(min_price, "minimum creation price updated");
        Ok(())
    }

    pub fn set_reward_per_day(&self, caller: &Address, reward_per_day: u64) -> Result<(), BloomError> {
        self.ensure_admin(caller)?;
        if reward_per_day == 0 {
            return Err(ConfigError::Invalid("reward_per_day must be non-zero".into()).into());
        }
        self.state.lock().reward_per_day = reward_per_day;
        info!(reward_per_day, "reward rate updated");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn ensure_admin(&self, caller: &Address) -> Result<(), BloomError> {
        if *caller != self.accounts.admin {
            return Err(NodeError::NotAuthorized.into());
        }
        Ok(())
    }

    /// Check the node exists and `caller` may act on it; return its owner.
    fn authorize(&self, state: &ManagerState, caller: &Address, id: BloomId) -> Result<Address, BloomError> {
        if !state.blooms.contains_key(&id) {
            return Err(NodeError::NotFound(id).into());
        }
        if !self.collab.registry.is_approved_or_owner(caller, id)? {
            return Err(NodeError::NotOwner(id).into());
        }
        Ok(self.collab.registry.owner_of(id)?)
    }

    /// Native value a deposit will be credited with.
    fn quote(&self, caller: &Address, amount: u64, pay_token: PayToken) -> Result<u64, BloomError> {
        match pay_token {
            PayToken::Native => {
                if !self.collab.whitelist.is_whitelisted(caller) {
                    return Err(NodeError::NotWhitelisted(caller.to_string()).into());
                }
                Ok(amount)
            }
            PayToken::Stable => Ok(self.collab.router.convert(amount, PayToken::Stable)?),
        }
    }

    fn collect(&self, caller: &Address, amount: u64, pay_token: PayToken) -> Result<(), BloomError> {
        match pay_token {
            PayToken::Native => self.collab.native.burn_from(&self.accounts.manager, caller, amount)?,
            PayToken::Stable => self.collab.stable.transfer_from(
                &self.accounts.manager,
                caller,
                &self.accounts.treasury,
                amount,
            )?,
        }
        Ok(())
    }

    /// Carried reward plus what accrued since `last_interaction`. Time past
    /// an expired lock accrues at the base multiplier.
    fn accrue(&self, bloom: &Bloom, reward_per_day: u64, now: u64) -> Result<u64, RewardError> {
        let fresh = match bloom.lock_state(now) {
            LockState::Expired { at: end } => {
                let boosted_secs = end.saturating_sub(bloom.last_interaction);
                let base_secs = now.saturating_sub(end.max(bloom.last_interaction));
                let boosted = self.rewards.accrued_reward(
                    bloom.value,
                    bloom.reward_mult,
                    reward_per_day,
                    boosted_secs,
                )?;
                let tail = self.rewards.accrued_reward(
                    bloom.value,
                    self.rewards.base_multiplier(),
                    reward_per_day,
                    base_secs,
                )?;
                boosted.checked_add(tail).ok_or(RewardError::ArithmeticOverflow)?
            }
            LockState::Locked { .. } | LockState::Unlocked => self.rewards.accrued_reward(
                bloom.value,
                bloom.reward_mult,
                reward_per_day,
                bloom.elapsed(now),
            )?,
        };
        fresh
            .checked_add(bloom.pending_carry)
            .ok_or(RewardError::ArithmeticOverflow)
    }

    fn ensure_pool(&self, amount: u64) -> Result<(), BloomError> {
        let have = self.collab.native.balance_of(&self.accounts.manager);
        if have < amount {
            warn!(have, need = amount, "reward pool exhausted");
            return Err(LedgerError::InsufficientBalance { have, need: amount }.into());
        }
        Ok(())
    }

    fn pay(&self, to: &Address, amount: u64) -> Result<(), BloomError> {
        if amount > 0 {
            self.collab.native.transfer(&self.accounts.manager, to, amount)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String, NodeError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_LEN {
        return Err(NodeError::InvalidName);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloom_core::constants::{BASE_MULTIPLIER, SECONDS_PER_DAY, SECONDS_PER_WEEK};
    use bloom_ledger::{
        BloomNft, ConstantProductRouter, ManualClock, MemoryLedger, MemoryWhitelist,
    };
    use mockall::mock;
    use mockall::predicate::eq;
    use proptest::prelude::*;

    const DAY: u64 = SECONDS_PER_DAY;
    const START: u64 = 1_700_000_000;
    const POOL: u64 = 10_000_000_000;

    mock! {
        pub Ledger {}
        impl TokenLedger for Ledger {
            fn symbol(&self) -> String;
            fn balance_of(&self, owner: &Address) -> u64;
            fn total_supply(&self) -> u64;
            fn allowance(&self, owner: &Address, spender: &Address) -> u64;
            fn approve(&self, owner: &Address, spender: &Address, amount: u64) -> Result<(), LedgerError>;
            fn transfer(&self, from: &Address, to: &Address, amount: u64) -> Result<(), LedgerError>;
            fn transfer_from(
                &self,
                spender: &Address,
                from: &Address,
                to: &Address,
                amount: u64,
            ) -> Result<(), LedgerError>;
            fn burn(&self, from: &Address, amount: u64) -> Result<(), LedgerError>;
            fn burn_from(&self, spender: &Address, from: &Address, amount: u64) -> Result<(), LedgerError>;
        }
    }

    mock! {
        pub Registry {}
        impl NodeRegistry for Registry {
            fn mint(&self, minter: &Address, to: &Address, id: BloomId) -> Result<(), RegistryError>;
            fn owner_of(&self, id: BloomId) -> Result<Address, RegistryError>;
            fn balance_of(&self, owner: &Address) -> u64;
            fn get_approved(&self, id: BloomId) -> Result<Option<Address>, RegistryError>;
            fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool;
            fn is_approved_or_owner(&self, spender: &Address, id: BloomId) -> Result<bool, RegistryError>;
        }
    }

    struct Fixture {
        manager: BloomsManager,
        native: Arc<MemoryLedger>,
        nft: Arc<BloomNft>,
        clock: Arc<ManualClock>,
        accounts: Accounts,
        user: Address,
    }

    fn accounts() -> Accounts {
        Accounts {
            admin: Address::from_label("admin"),
            manager: Address::from_label("manager"),
            treasury: Address::from_label("treasury"),
        }
    }

    fn fixture() -> Fixture {
        let accounts = accounts();
        let user = Address::from_label("user");
        let native = Arc::new(MemoryLedger::with_supply("NCTR", &user, 1_000_000_000));
        native.mint(&accounts.manager, POOL).unwrap();
        native.approve(&user, &accounts.manager, u64::MAX).unwrap();
        let stable = Arc::new(MemoryLedger::with_supply("USDC", &user, 1_000_000_000));
        stable.approve(&user, &accounts.manager, u64::MAX).unwrap();
        let nft = Arc::new(BloomNft::new(accounts.admin, "https://"));
        nft.set_minter(&accounts.admin, accounts.manager).unwrap();
        let whitelist = Arc::new(MemoryWhitelist::new(accounts.admin));
        whitelist.add_to_whitelist(&accounts.admin, &[user]).unwrap();
        let clock = Arc::new(ManualClock::new(START));

        let collab = Collaborators {
            native: native.clone(),
            stable,
            router: Arc::new(ConstantProductRouter::mock()),
            registry: nft.clone(),
            whitelist,
            clock: clock.clone(),
        };
        let manager = BloomsManager::new(&ManagerConfig::default(), collab, accounts).unwrap();
        Fixture { manager, native, nft, clock, accounts, user }
    }

    fn mocked(native: MockLedger, stable: MockLedger, registry: MockRegistry) -> BloomsManager {
        let accounts = accounts();
        let whitelist = MemoryWhitelist::new(accounts.admin);
        whitelist
            .add_to_whitelist(&accounts.admin, &[Address::from_label("user")])
            .unwrap();
        let collab = Collaborators {
            native: Arc::new(native),
            stable: Arc::new(stable),
            router: Arc::new(ConstantProductRouter::mock()),
            registry: Arc::new(registry),
            whitelist: Arc::new(whitelist),
            clock: Arc::new(ManualClock::new(START)),
        };
        BloomsManager::new(&ManagerConfig::default(), collab, accounts).unwrap()
    }

    #[test]
    fn create_requires_minimum_price() {
        let f = fixture();
        let err = f
            .manager
            .create_bloom(&f.user, "Bloom", 9_999, PayToken::Native)
            .unwrap_err();
        assert_eq!(err, NodeError::BelowMinimumPrice { amount: 9_999, min: 10_000 }.into());
        assert_eq!(f.manager.create_bloom(&f.user, "Bloom", 10_000, PayToken::Native).unwrap(), 1);
        assert_eq!(f.manager.total_value_locked(), 10_000);
    }

    #[test]
    fn native_deposit_is_burned() {
        let f = fixture();
        let supply = f.native.total_supply();
        f.manager.create_bloom(&f.user, "Bloom", 10_000, PayToken::Native).unwrap();
        assert_eq!(f.native.total_supply(), supply - 10_000);
    }

    #[test]
    fn ids_are_sequential() {
        let f = fixture();
        for expected in 1..=3 {
            let id = f.manager.create_bloom(&f.user, "Bloom", 10_000, PayToken::Native).unwrap();
            assert_eq!(id, expected);
        }
        assert_eq!(f.manager.total_blooms(), 3);
    }

    #[test]
    fn names_are_validated() {
        let f = fixture();
        let long = "x".repeat(MAX_NAME_LEN + 1);
        for bad in ["", "   ", long.as_str()] {
            assert_eq!(
                f.manager.create_bloom(&f.user, bad, 10_000, PayToken::Native),
                Err(NodeError::InvalidName.into())
            );
        }
        let id = f.manager.create_bloom(&f.user, "  Bloom ", 10_000, PayToken::Native).unwrap();
        assert_eq!(f.manager.bloom(id).unwrap().name, "Bloom");
    }

    #[test]
    fn lock_raises_multiplier_and_blocks_relock() {
        let f = fixture();
        let id = f.manager.create_bloom(&f.user, "Bloom", 10_000, PayToken::Native).unwrap();
        let mult = f.manager.start_auto_compounding(&f.user, id, 13 * DAY).unwrap();
        assert_eq!(mult, BASE_MULTIPLIER + 15_000);
        let err = f.manager.start_auto_compounding(&f.user, id, 27 * DAY).unwrap_err();
        assert_eq!(err, NodeError::AlreadyLocked { id, lock_end: START + 13 * DAY }.into());
        assert_eq!(
            f.manager.start_auto_compounding(&f.user, id, 0),
            Err(NodeError::InvalidLockDuration.into())
        );
    }

    #[test]
    fn claim_blocked_while_locked() {
        let f = fixture();
        let id = f.manager.create_bloom(&f.user, "Bloom", 10_000, PayToken::Native).unwrap();
        f.manager.start_auto_compounding(&f.user, id, 6 * DAY).unwrap();
        f.clock.advance(DAY);
        assert_eq!(
            f.manager.auto_claim(&f.user, id),
            Err(NodeError::StillLocked { id, lock_end: START + 6 * DAY }.into())
        );
        f.clock.advance(5 * DAY);
        assert!(f.manager.auto_claim(&f.user, id).unwrap() > 0);
        assert_eq!(f.manager.bloom(id).unwrap().lock_end, None);
    }

    #[test]
    fn compound_is_idempotent_without_elapsed_time() {
        let f = fixture();
        let id = f.manager.create_bloom(&f.user, "Bloom", 10_000, PayToken::Native).unwrap();
        f.clock.advance(DAY);
        assert_eq!(f.manager.auto_compound(&f.user, id).unwrap(), 3_472);
        let tvl = f.manager.total_value_locked();
        assert_eq!(f.manager.auto_compound(&f.user, id).unwrap(), 0);
        assert_eq!(f.manager.total_value_locked(), tvl);
    }

    #[test]
    fn expired_lock_accrues_base_rate_after_end() {
        let f = fixture();
        let id = f.manager.create_bloom(&f.user, "Bloom", 10_000, PayToken::Native).unwrap();
        f.manager.start_auto_compounding(&f.user, id, 7 * DAY).unwrap();
        f.clock.advance(8 * DAY);
        // 7 days at 1.15x plus 1 day at 1.0x
        let boosted = 10_000u128 * 34_724 * 115_000 * 7 * DAY as u128 / (86_400 * 10_000_000_000);
        let tail = 10_000u128 * 34_724 * 100_000 * DAY as u128 / (86_400 * 10_000_000_000);
        assert_eq!(f.manager.pending_rewards(id).unwrap() as u128, boosted + tail);
        f.manager.auto_compound(&f.user, id).unwrap();
        assert_eq!(f.manager.bloom(id).unwrap().reward_mult, BASE_MULTIPLIER);
    }

    /// Floor of one accrual span, written out independently of the engine.
    fn expected(value: u64, mult: u64, secs: u64) -> u64 {
        (value as u128 * 34_724 * mult as u128 * secs as u128 / (86_400 * 10_000_000_000)) as u64
    }

    #[test]
    fn add_value_keeps_pending_rewards_unlocked() {
        let f = fixture();
        let id = f.manager.create_bloom(&f.user, "Bloom", 10_000, PayToken::Native).unwrap();
        f.clock.advance(30 * DAY);
        let before = f.manager.pending_rewards(id).unwrap();
        assert_eq!(before, expected(10_000, BASE_MULTIPLIER, 30 * DAY));

        f.manager.add_value(&f.user, id, 1_000_000, PayToken::Native).unwrap();
        assert_eq!(f.manager.pending_rewards(id).unwrap(), before);
        assert_eq!(f.manager.bloom(id).unwrap().pending_carry, before);

        // A same-instant compound realizes only the carried reward.
        assert_eq!(f.manager.auto_compound(&f.user, id).unwrap(), before);
        assert_eq!(f.manager.bloom(id).unwrap().pending_carry, 0);
        assert_eq!(f.manager.total_value_locked(), 1_010_000 + before);
    }

    #[test]
    fn add_value_keeps_pending_rewards_locked() {
        let f = fixture();
        let id = f.manager.create_bloom(&f.user, "Bloom", 10_000, PayToken::Native).unwrap();
        f.manager.start_auto_compounding(&f.user, id, 13 * DAY).unwrap();
        f.clock.advance(3 * DAY);
        let before = f.manager.pending_rewards(id).unwrap();
        assert_eq!(before, expected(10_000, BASE_MULTIPLIER + 15_000, 3 * DAY));

        f.manager.add_value(&f.user, id, 1_000_000, PayToken::Native).unwrap();
        assert_eq!(f.manager.pending_rewards(id).unwrap(), before);

        // The deposit accrues at the locked multiplier from the deposit on.
        f.clock.advance(DAY);
        assert_eq!(
            f.manager.pending_rewards(id).unwrap(),
            before + expected(1_010_000, BASE_MULTIPLIER + 15_000, DAY)
        );
    }

    #[test]
    fn carry_survives_lock_expiry_and_is_paid_by_claim() {
        let f = fixture();
        let id = f.manager.create_bloom(&f.user, "Bloom", 10_000, PayToken::Native).unwrap();
        f.manager.start_auto_compounding(&f.user, id, 7 * DAY).unwrap();
        f.clock.advance(8 * DAY);
        let before = f.manager.pending_rewards(id).unwrap();
        f.manager.add_value(&f.user, id, 90_000, PayToken::Native).unwrap();
        f.clock.advance(DAY);
        let reward = f.manager.auto_claim(&f.user, id).unwrap();
        assert_eq!(reward, before + expected(100_000, BASE_MULTIPLIER, DAY));
        let bloom = f.manager.bloom(id).unwrap();
        assert_eq!(bloom.pending_carry, 0);
        assert_eq!(bloom.lock_end, None);
        assert_eq!(f.manager.pending_rewards(id).unwrap(), 0);
    }

    #[test]
    fn emergency_fee_goes_to_treasury() {
        let f = fixture();
        let id = f.manager.create_bloom(&f.user, "Bloom", 10_000, PayToken::Native).unwrap();
        f.manager.start_auto_compounding(&f.user, id, 13 * DAY).unwrap();
        f.clock.advance(DAY);
        let receipt = f.manager.emergency_claim(&f.user, id).unwrap();
        assert_eq!(
            receipt,
            EmergencyReceipt { gross: 3_993, net: 1_997, fee: 1_996, fee_bps: 5_000, streak: 0 }
        );
        assert_eq!(f.native.balance_of(&f.accounts.treasury), 1_996);
        assert_eq!(f.manager.emergency_streak(&f.user), 1);
        let bloom = f.manager.bloom(id).unwrap();
        assert_eq!(bloom.lock_end, None);
        assert_eq!(bloom.reward_mult, BASE_MULTIPLIER);
    }

    #[test]
    fn relock_waits_for_processing_cooldown() {
        let f = fixture();
        let id = f.manager.create_bloom(&f.user, "Bloom", 10_000, PayToken::Native).unwrap();
        f.manager.start_auto_compounding(&f.user, id, 13 * DAY).unwrap();
        f.clock.advance(DAY);
        f.manager.emergency_claim(&f.user, id).unwrap();
        let err = f.manager.start_auto_compounding(&f.user, id, 13 * DAY).unwrap_err();
        assert!(matches!(err, BloomError::Node(ref e) if e.code() == 14), "{err}");
        f.clock.advance(DAY);
        f.manager.start_auto_compounding(&f.user, id, 13 * DAY).unwrap();
    }

    #[test]
    fn streak_resets_after_window() {
        let f = fixture();
        let a = f.manager.create_bloom(&f.user, "A", 10_000, PayToken::Native).unwrap();
        let b = f.manager.create_bloom(&f.user, "B", 10_000, PayToken::Native).unwrap();
        f.clock.advance(DAY);
        f.manager.emergency_claim(&f.user, a).unwrap();
        assert_eq!(f.manager.emergency_claim(&f.user, b).unwrap().streak, 1);
        f.clock.advance(SECONDS_PER_WEEK);
        assert_eq!(f.manager.emergency_streak(&f.user), 0);
        assert_eq!(f.manager.emergency_claim(&f.user, a).unwrap().streak, 0);
    }

    #[test]
    fn expired_streaks_are_dropped() {
        let f = fixture();
        let other = Address::from_label("other");
        let mine = f.manager.create_bloom(&f.user, "A", 10_000, PayToken::Native).unwrap();
        let theirs = f.manager.create_bloom(&f.user, "B", 10_000, PayToken::Native).unwrap();
        f.nft.transfer(&f.user, &f.user, &other, theirs).unwrap();
        f.clock.advance(DAY);
        f.manager.emergency_claim(&f.user, mine).unwrap();
        assert_eq!(f.manager.state.lock().streaks.len(), 1);

        f.clock.advance(SECONDS_PER_WEEK);
        f.manager.emergency_claim(&other, theirs).unwrap();
        let state = f.manager.state.lock();
        assert_eq!(state.streaks.len(), 1);
        assert!(state.streaks.contains_key(&other));
    }

    #[test]
    fn empty_emergency_claim_records_nothing() {
        let f = fixture();
        let a = f.manager.create_bloom(&f.user, "A", 10_000, PayToken::Native).unwrap();
        let b = f.manager.create_bloom(&f.user, "B", 10_000, PayToken::Native).unwrap();
        f.manager.start_auto_compounding(&f.user, a, 13 * DAY).unwrap();

        let receipt = f.manager.emergency_claim(&f.user, a).unwrap();
        assert_eq!(receipt.gross, 0);
        assert_eq!(f.manager.emergency_streak(&f.user), 0);
        let bloom = f.manager.bloom(a).unwrap();
        assert_eq!(bloom.last_emergency, None);
        assert_eq!(bloom.lock_end, None);

        // No cooldown, and the next real claim pays the base fee.
        f.manager.start_auto_compounding(&f.user, a, 13 * DAY).unwrap();
        f.clock.advance(DAY);
        assert_eq!(f.manager.emergency_claim(&f.user, b).unwrap().fee_bps, 5_000);
    }

    #[test]
    fn admin_setters() {
        let f = fixture();
        assert_eq!(
            f.manager.set_node_min_price(&f.user, 1),
            Err(NodeError::NotAuthorized.into())
        );
        f.manager.set_node_min_price(&f.accounts.admin, 50_000).unwrap();
        assert_eq!(f.manager.creation_min_price(), 50_000);
        f.manager.set_reward_per_day(&f.accounts.admin, 50_000).unwrap();
        assert_eq!(f.manager.reward_per_day(), 50_000);
        assert!(f.manager.set_reward_per_day(&f.accounts.admin, 0).is_err());
        assert_eq!(
            f.manager.set_reward_per_day(&f.user, 1),
            Err(NodeError::NotAuthorized.into())
        );
    }

    #[test]
    fn empty_reward_pool_leaves_state_untouched() {
        let f = fixture();
        let id = f.manager.create_bloom(&f.user, "Bloom", 10_000, PayToken::Native).unwrap();
        let pool = f.native.balance_of(&f.accounts.manager);
        f.native
            .transfer(&f.accounts.manager, &Address::from_label("drain"), pool)
            .unwrap();
        f.clock.advance(DAY);
        let err = f.manager.auto_claim(&f.user, id).unwrap_err();
        assert_eq!(err, LedgerError::InsufficientBalance { have: 0, need: 3_472 }.into());
        assert_eq!(f.manager.bloom(id).unwrap().last_interaction, START);
        assert!(f.manager.emergency_claim(&f.user, id).is_err());
        assert_eq!(f.manager.emergency_streak(&f.user), 0);
    }

    #[test]
    fn failed_stable_transfer_mints_nothing() {
        let user = Address::from_label("user");
        let native = MockLedger::new();
        let mut stable = MockLedger::new();
        stable
            .expect_transfer_from()
            .times(1)
            .returning(|_, _, _, _| Err(LedgerError::InsufficientAllowance { have: 0, need: 10_000 }));
        let mut registry = MockRegistry::new();
        registry
            .expect_owner_of()
            .with(eq(1))
            .returning(|id| Err(RegistryError::NonexistentToken(id)));
        registry.expect_mint().never();

        let manager = mocked(native, stable, registry);
        let err = manager
            .create_bloom(&user, "Bloom", 10_000, PayToken::Stable)
            .unwrap_err();
        assert_eq!(err, LedgerError::InsufficientAllowance { have: 0, need: 10_000 }.into());
        assert_eq!(manager.total_value_locked(), 0);
        assert_eq!(manager.total_blooms(), 0);
    }

    #[test]
    fn non_whitelisted_native_deposit_touches_no_ledger() {
        let stranger = Address::from_label("stranger");
        let mut native = MockLedger::new();
        native.expect_burn_from().never();
        let mut registry = MockRegistry::new();
        registry
            .expect_owner_of()
            .returning(|id| Err(RegistryError::NonexistentToken(id)));
        registry.expect_mint().never();

        let manager = mocked(native, MockLedger::new(), registry);
        let err = manager
            .create_bloom(&stranger, "Bloom", 10_000, PayToken::Native)
            .unwrap_err();
        assert_eq!(err, NodeError::NotWhitelisted(stranger.to_string()).into());
    }

    #[test]
    fn registry_decides_authorization() {
        let user = Address::from_label("user");
        let operator = Address::from_label("operator");
        let mut native = MockLedger::new();
        native.expect_burn_from().times(1).returning(|_, _, _| Ok(()));
        let mut registry = MockRegistry::new();
        registry
            .expect_owner_of()
            .with(eq(1))
            .times(1)
            .returning(|id| Err(RegistryError::NonexistentToken(id)));
        registry.expect_mint().times(1).returning(|_, _, _| Ok(()));
        registry
            .expect_is_approved_or_owner()
            .withf(move |spender, _| *spender == operator)
            .returning(|_, _| Ok(false));
        registry
            .expect_is_approved_or_owner()
            .returning(|_, _| Ok(true));
        registry.expect_owner_of().returning(move |_| Ok(user));

        let manager = mocked(native, MockLedger::new(), registry);
        let id = manager.create_bloom(&user, "Bloom", 10_000, PayToken::Native).unwrap();
        assert_eq!(
            manager.rename_bloom(&operator, id, "Mine"),
            Err(NodeError::NotOwner(id).into())
        );
        manager.rename_bloom(&user, id, "BetterBloom").unwrap();
        assert_eq!(manager.bloom(id).unwrap().name, "BetterBloom");
    }

    #[test]
    fn missing_node_is_not_found() {
        let f = fixture();
        assert_eq!(f.manager.auto_compound(&f.user, 42), Err(NodeError::NotFound(42).into()));
        assert_eq!(f.manager.pending_rewards(42), Err(NodeError::NotFound(42).into()));
        assert_eq!(f.manager.blooms_by_ids(&[42]), Err(NodeError::NotFound(42).into()));
    }

    proptest! {
        #[test]
        fn names_within_limit_are_trimmed(name in "[A-Za-z0-9]{1,32}", pad in 0usize..4) {
            let padded = format!("{}{}{}", " ".repeat(pad), name, " ".repeat(pad));
            prop_assert_eq!(validate_name(&padded), Ok(name));
        }

        #[test]
        fn names_over_limit_are_rejected(name in "[A-Za-z0-9]{33,64}") {
            prop_assert_eq!(validate_name(&name), Err(NodeError::InvalidName));
        }

        #[test]
        fn pending_never_drops_as_time_passes(lock in 1u64..30 * SECONDS_PER_DAY, a in 0u64..40 * SECONDS_PER_DAY, b in 0u64..40 * SECONDS_PER_DAY) {
            let f = fixture();
            let id = f.manager.create_bloom(&f.user, "Bloom", 10_000, PayToken::Native).unwrap();
            f.manager.start_auto_compounding(&f.user, id, lock).unwrap();
            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            f.clock.set(START + early);
            let first = f.manager.pending_rewards(id).unwrap();
            f.clock.set(START + late);
            prop_assert!(f.manager.pending_rewards(id).unwrap() >= first);
        }
    }
}
