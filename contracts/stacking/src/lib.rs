#![no_std]

pub mod allowance;
pub mod clock;
pub mod delegation;
pub mod events;
pub mod pox_addr;
pub mod reward_set;
pub mod signer_auth;

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, Address, Bytes, BytesN,
    Env, Symbol, Vec,
};

use crate::pox_addr::{check_hashbytes, check_lock_period, check_pox_addr, check_version};

pub use crate::allowance::AllowedCaller;
pub use crate::delegation::DelegationRecord;
pub use crate::pox_addr::PoxAddress;
pub use crate::reward_set::RewardSetEntry;
pub use crate::signer_auth::SignerKeyTopic;

// ── Storage key constants ────────────────────────────────────────────────────

const FIRST_BURN_HEIGHT: Symbol = symbol_short!("FIRST_BH");
const PREPARE_LEN: Symbol = symbol_short!("PREP_LEN");
const REWARD_LEN: Symbol = symbol_short!("CYC_LEN");
const FIRST_CYCLE: Symbol = symbol_short!("FIRST_CYC");
const CONFIGURED: Symbol = symbol_short!("CONFIG");
const LIQUID_SUPPLY: Symbol = symbol_short!("LIQ_SUPP");

// Per-stacker state uses an enum key in persistent storage.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum StackerKey {
    Stacker(Address),
}

// ── Timing defaults ──────────────────────────────────────────────────────────

// Clock parameters in force until `set_burnchain_parameters` is called.
const DEFAULT_FIRST_BURNCHAIN_BLOCK_HEIGHT: u64 = 0;
const DEFAULT_PREPARE_CYCLE_LENGTH: u64 = 50;
const DEFAULT_REWARD_CYCLE_LENGTH: u64 = 1_050;

/// µSTX assumed liquid until the hosting environment overrides it.
const DEFAULT_TOTAL_LIQUID_SUPPLY_USTX: i128 = 1_000_000_000_000_000;
/// Divisor applied to the liquid supply to derive the slot minimum.
const STACKING_THRESHOLD_25: i128 = 8_000;

pub(crate) const TTL_THRESHOLD: u32 = 5_184_000;
pub(crate) const TTL_EXTEND_TO: u32 = 10_368_000;

// ── Contract errors ──────────────────────────────────────────────────────────

/// Error codes returned to callers.
///
/// # Code ranges
/// | Range   | Purpose                 |
/// |---------|-------------------------|
/// | 1 – 9   | Permission / lifecycle  |
/// | 10 – 29 | Stacking validation     |
/// | 30 – 39 | Signer authorization    |
///
/// Out-of-domain clock inputs (a height before the configured origin, or
/// cycle arithmetic overflow) are deliberately *not* represented here: they
/// trap and abort the invocation instead of returning a code.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    // ── Permission / lifecycle (1–9) ─────────────────────────
    /// Configuration already locked, or no matching signer authorization.
    NotAllowed = 1,
    /// The calling contract is not covered by a caller allowance.
    PermissionDenied = 2,

    // ── Stacking validation (10–29) ──────────────────────────
    StackingThresholdNotMet = 10,
    StackingInvalidLockPeriod = 11,
    StackingInvalidPoxAddress = 12,
    StackingInvalidAmount = 13,
    StackingAlreadyStacked = 14,
    StackingAlreadyDelegated = 15,
    InvalidStartBurnHeight = 16,
    DelegationAlreadyRevoked = 17,
    InvalidRewardCycle = 18,

    // ── Signer authorization (30–39) ─────────────────────────
    SignerAuthAmountTooHigh = 30,
    SignerAuthUsed = 31,
    InvalidSignatureRecover = 32,
    InvalidSignaturePubkey = 33,
}

// ── Public-facing types ──────────────────────────────────────────────────────

/// A stacker's commitment as returned by `get_stacker_info`: payout address,
/// membership window, and the slot index it holds in each cycle of that
/// window.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StackerInfo {
    pub pox_addr: PoxAddress,
    pub first_reward_cycle: u64,
    pub lock_period: u64,
    pub reward_set_indexes: Vec<u64>,
    pub delegated_to: Option<Address>,
}

// The stored commitment additionally remembers which authorization id
// created it; the query view above omits the id.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
struct StackerRecord {
    pox_addr: PoxAddress,
    first_reward_cycle: u64,
    lock_period: u64,
    reward_set_indexes: Vec<u64>,
    delegated_to: Option<Address>,
    auth_id: u64,
}

/// Returned by `stack_stx` on success.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LockReceipt {
    pub stacker: Address,
    pub lock_amount: i128,
    pub signer_key: BytesN<33>,
    pub unlock_burn_height: u64,
}

/// Snapshot of the timing configuration and network-wide stacking inputs.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoxInfo {
    pub first_burnchain_block_height: u64,
    pub prepare_cycle_length: u64,
    pub reward_cycle_length: u64,
    pub first_reward_cycle_id: u64,
    pub current_reward_cycle: u64,
    pub min_amount_ustx: i128,
    pub total_liquid_supply_ustx: i128,
}

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct StackingContract;

#[contractimpl]
impl StackingContract {
    // ── Configuration ───────────────────────────────────────────────────────

    /// Lock in the burnchain timing parameters.
    ///
    /// Succeeds exactly once for the lifetime of the contract; every later
    /// call returns `NotAllowed` and leaves the stored tuple untouched.
    /// Until the single successful call, the compiled-in defaults apply.
    pub fn set_burnchain_parameters(
        env: Env,
        first_burn_height: u64,
        prepare_cycle_length: u64,
        reward_cycle_length: u64,
        first_reward_cycle: u64,
    ) -> Result<bool, ContractError> {
        if env.storage().instance().has(&CONFIGURED) {
            return Err(ContractError::NotAllowed);
        }

        env.storage()
            .instance()
            .set(&FIRST_BURN_HEIGHT, &first_burn_height);
        env.storage()
            .instance()
            .set(&PREPARE_LEN, &prepare_cycle_length);
        env.storage().instance().set(&REWARD_LEN, &reward_cycle_length);
        env.storage().instance().set(&FIRST_CYCLE, &first_reward_cycle);
        env.storage().instance().set(&CONFIGURED, &true);

        events::publish_burnchain_configured(
            &env,
            first_burn_height,
            prepare_cycle_length,
            reward_cycle_length,
            first_reward_cycle,
        );

        Ok(true)
    }

    /// Timing configuration plus the network-wide stacking inputs, in one
    /// read.
    pub fn get_pox_info(env: Env) -> PoxInfo {
        PoxInfo {
            first_burnchain_block_height: Self::first_burn_height(&env),
            prepare_cycle_length: Self::prepare_cycle_length(&env),
            reward_cycle_length: Self::reward_cycle_length(&env),
            first_reward_cycle_id: Self::first_active_cycle(&env),
            current_reward_cycle: Self::current_cycle(&env),
            min_amount_ustx: Self::stacking_minimum(&env),
            total_liquid_supply_ustx: Self::liquid_supply(&env),
        }
    }

    // ── Cycle clock ─────────────────────────────────────────────────────────

    /// Reward cycle containing `burn_height`. Traps when the height precedes
    /// the configured first burnchain block height.
    pub fn burn_height_to_reward_cycle(env: Env, burn_height: u64) -> u64 {
        clock::burn_height_to_reward_cycle(
            burn_height,
            Self::first_burn_height(&env),
            Self::reward_cycle_length(&env),
        )
    }

    /// First burn height of `reward_cycle`. Traps on u64 overflow.
    pub fn reward_cycle_to_burn_height(env: Env, reward_cycle: u64) -> u64 {
        clock::reward_cycle_to_burn_height(
            reward_cycle,
            Self::first_burn_height(&env),
            Self::reward_cycle_length(&env),
        )
    }

    /// The reward cycle the chain is in right now.
    pub fn current_pox_reward_cycle(env: Env) -> u64 {
        Self::current_cycle(&env)
    }

    // ── Stacker ledger ──────────────────────────────────────────────────────

    /// A stacker's commitment, visible only while the current cycle lies in
    /// its membership window.
    pub fn get_stacker_info(env: Env, stacker: Address) -> Option<StackerInfo> {
        let record = Self::read_stacker(&env, &stacker)?;
        let current = Self::current_cycle(&env);
        if current < record.first_reward_cycle
            || current >= record.first_reward_cycle + record.lock_period
        {
            return None;
        }
        Some(StackerInfo {
            pox_addr: record.pox_addr,
            first_reward_cycle: record.first_reward_cycle,
            lock_period: record.lock_period,
            reward_set_indexes: record.reward_set_indexes,
            delegated_to: record.delegated_to,
        })
    }

    pub fn check_pox_addr_version(version: u32) -> bool {
        check_version(version)
    }

    pub fn check_pox_addr_hashbytes(version: u32, hashbytes: Bytes) -> bool {
        check_hashbytes(version, &hashbytes)
    }

    pub fn check_pox_lock_period(lock_period: u64) -> bool {
        check_lock_period(lock_period)
    }

    /// Minimum µSTX a stacker must lock to claim a reward slot.
    pub fn get_stacking_minimum(env: Env) -> i128 {
        Self::stacking_minimum(&env)
    }

    /// Full eligibility gate: lock period, then payout address, then the
    /// network minimum.
    pub fn can_stack_stx(
        env: Env,
        pox_addr: PoxAddress,
        amount_ustx: i128,
        _first_reward_cycle: u64,
        lock_period: u64,
    ) -> Result<bool, ContractError> {
        Self::check_stacking_args(&pox_addr, lock_period)?;
        if amount_ustx < Self::stacking_minimum(&env) {
            return Err(ContractError::StackingThresholdNotMet);
        }
        Ok(true)
    }

    /// Lighter gate for flows that do not yet know the network minimum:
    /// the amount merely has to be positive.
    pub fn minimal_can_stack_stx(
        _env: Env,
        pox_addr: PoxAddress,
        amount_ustx: i128,
        _first_reward_cycle: u64,
        lock_period: u64,
    ) -> Result<bool, ContractError> {
        Self::check_stacking_args(&pox_addr, lock_period)?;
        if amount_ustx <= 0 {
            return Err(ContractError::StackingInvalidAmount);
        }
        Ok(true)
    }

    /// Lock `amount_ustx` for `lock_period` reward cycles starting with the
    /// next one, claiming one reward-set slot per cycle.
    ///
    /// `sender` is the stacking principal (authenticated), `caller` the
    /// immediate calling contract; an indirect call requires an allowance.
    /// The signer permission for the current cycle is consumed on success.
    /// Every failure leaves all state untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn stack_stx(
        env: Env,
        sender: Address,
        caller: Address,
        amount_ustx: i128,
        pox_addr: PoxAddress,
        start_burn_height: u64,
        lock_period: u64,
        signer_sig: Option<BytesN<65>>,
        signer_key: BytesN<33>,
        max_amount: i128,
        auth_id: u64,
    ) -> Result<LockReceipt, ContractError> {
        sender.require_auth();

        // The commitment always begins with the next cycle; a start height
        // outside the current cycle would post-date or back-date it.
        let first_reward_cycle = Self::current_cycle(&env) + 1;
        let specified_cycle = Self::height_to_cycle(&env, start_burn_height) + 1;
        if first_reward_cycle != specified_cycle {
            return Err(ContractError::InvalidStartBurnHeight);
        }

        if !allowance::check_caller_allowed(&env, &sender, &caller) {
            return Err(ContractError::PermissionDenied);
        }
        if Self::has_unexpired_stacking(&env, &sender) {
            return Err(ContractError::StackingAlreadyStacked);
        }
        if delegation::get_active(&env, &sender).is_some() {
            return Err(ContractError::StackingAlreadyDelegated);
        }

        Self::check_stacking_args(&pox_addr, lock_period)?;
        if amount_ustx < Self::stacking_minimum(&env) {
            return Err(ContractError::StackingThresholdNotMet);
        }

        signer_auth::consume(
            &env,
            &pox_addr,
            first_reward_cycle - 1,
            &SignerKeyTopic::StackStx,
            lock_period,
            signer_sig.as_ref(),
            &signer_key,
            amount_ustx,
            max_amount,
            auth_id,
        )?;

        let reward_set_indexes = reward_set::add_pox_address_to_cycles(
            &env,
            &pox_addr,
            &signer_key,
            first_reward_cycle,
            lock_period,
            amount_ustx,
            &sender,
        );

        let record = StackerRecord {
            pox_addr,
            first_reward_cycle,
            lock_period,
            reward_set_indexes,
            delegated_to: None,
            auth_id,
        };
        Self::write_stacker(&env, &sender, &record);

        let unlock_burn_height = clock::reward_cycle_to_burn_height(
            first_reward_cycle + lock_period,
            Self::first_burn_height(&env),
            Self::reward_cycle_length(&env),
        );

        events::publish_stacked(
            &env,
            sender.clone(),
            amount_ustx,
            first_reward_cycle,
            lock_period,
            unlock_burn_height,
        );

        Ok(LockReceipt {
            stacker: sender,
            lock_amount: amount_ustx,
            signer_key,
            unlock_burn_height,
        })
    }

    // ── Reward set ──────────────────────────────────────────────────────────

    pub fn get_reward_set_size(env: Env, reward_cycle: u64) -> u64 {
        reward_set::size(&env, reward_cycle)
    }

    pub fn get_total_ustx_stacked(env: Env, reward_cycle: u64) -> i128 {
        reward_set::total_stacked(&env, reward_cycle)
    }

    pub fn get_reward_set_pox_address(
        env: Env,
        reward_cycle: u64,
        index: u64,
    ) -> Option<RewardSetEntry> {
        reward_set::entry(&env, reward_cycle, index)
    }

    // ── Caller allowances ───────────────────────────────────────────────────

    /// Grant `contract_caller` the right to stack on `sender`'s behalf,
    /// optionally until a burn height (inclusive). Must be called directly.
    pub fn allow_contract_caller(
        env: Env,
        sender: Address,
        caller: Address,
        contract_caller: Address,
        until_burn_height: Option<u64>,
    ) -> Result<bool, ContractError> {
        sender.require_auth();
        if sender != caller {
            return Err(ContractError::PermissionDenied);
        }

        allowance::allow(&env, &sender, &contract_caller, until_burn_height);
        events::publish_caller_allowed(&env, sender, contract_caller, until_burn_height);
        Ok(true)
    }

    /// Revoke a previously granted allowance. Must be called directly.
    /// Returns whether a record existed.
    pub fn disallow_contract_caller(
        env: Env,
        sender: Address,
        caller: Address,
        contract_caller: Address,
    ) -> Result<bool, ContractError> {
        sender.require_auth();
        if sender != caller {
            return Err(ContractError::PermissionDenied);
        }

        let existed = allowance::disallow(&env, &sender, &contract_caller);
        events::publish_caller_disallowed(&env, sender, contract_caller);
        Ok(existed)
    }

    /// True for a direct call, or for an indirect caller holding an
    /// unexpired allowance from `sender`.
    pub fn check_caller_allowed(env: Env, sender: Address, caller: Address) -> bool {
        allowance::check_caller_allowed(&env, &sender, &caller)
    }

    pub fn get_allowance_contract_callers(
        env: Env,
        sender: Address,
        contract_caller: Address,
    ) -> Option<AllowedCaller> {
        allowance::get(&env, &sender, &contract_caller)
    }

    // ── Delegation ──────────────────────────────────────────────────────────

    /// Delegate stacking authority over `amount_ustx` to an operator.
    pub fn delegate_stx(
        env: Env,
        sender: Address,
        caller: Address,
        amount_ustx: i128,
        delegate_to: Address,
        until_burn_height: Option<u64>,
        pox_addr: Option<PoxAddress>,
    ) -> Result<bool, ContractError> {
        sender.require_auth();
        if !allowance::check_caller_allowed(&env, &sender, &caller) {
            return Err(ContractError::PermissionDenied);
        }
        if delegation::get_active(&env, &sender).is_some() {
            return Err(ContractError::StackingAlreadyDelegated);
        }
        if let Some(ref addr) = pox_addr {
            if !check_pox_addr(addr) {
                return Err(ContractError::StackingInvalidPoxAddress);
            }
        }

        delegation::set(
            &env,
            &sender,
            &DelegationRecord {
                amount_ustx,
                delegated_to: delegate_to.clone(),
                until_burn_height,
                pox_addr,
            },
        );
        events::publish_delegated(&env, sender, delegate_to, amount_ustx, until_burn_height);
        Ok(true)
    }

    /// Revoke an active delegation, returning the revoked record.
    pub fn revoke_delegate_stx(
        env: Env,
        sender: Address,
        caller: Address,
    ) -> Result<DelegationRecord, ContractError> {
        sender.require_auth();
        if !allowance::check_caller_allowed(&env, &sender, &caller) {
            return Err(ContractError::PermissionDenied);
        }

        let record = delegation::get_active(&env, &sender)
            .ok_or(ContractError::DelegationAlreadyRevoked)?;
        delegation::remove(&env, &sender);
        events::publish_delegation_revoked(&env, sender, record.delegated_to.clone());
        Ok(record)
    }

    /// The sender's delegation, unless it has lapsed.
    pub fn get_check_delegation(env: Env, stacker: Address) -> Option<DelegationRecord> {
        delegation::get_active(&env, &stacker)
    }

    /// The raw delegation record, expired or not.
    pub fn get_delegation_info(env: Env, stacker: Address) -> Option<DelegationRecord> {
        delegation::get(&env, &stacker)
    }

    // ── Signer authorizations ───────────────────────────────────────────────

    /// Validate a signer permission without consuming it. See the engine
    /// module for the check order.
    #[allow(clippy::too_many_arguments)]
    pub fn verify_signer_key_sig(
        env: Env,
        pox_addr: PoxAddress,
        reward_cycle: u64,
        topic: SignerKeyTopic,
        period: u64,
        signer_sig: Option<BytesN<65>>,
        signer_key: BytesN<33>,
        amount: i128,
        max_amount: i128,
        auth_id: u64,
    ) -> Result<bool, ContractError> {
        signer_auth::verify(
            &env,
            &pox_addr,
            reward_cycle,
            &topic,
            period,
            signer_sig.as_ref(),
            &signer_key,
            amount,
            max_amount,
            auth_id,
        )?;
        Ok(true)
    }

    /// Pre-register (or disable) a signer-key authorization for one exact
    /// parameter tuple. Does not touch the tuple's consumption flag.
    #[allow(clippy::too_many_arguments)]
    pub fn set_signer_key_authorization(
        env: Env,
        signer: Address,
        caller: Address,
        pox_addr: PoxAddress,
        period: u64,
        reward_cycle: u64,
        topic: SignerKeyTopic,
        signer_key: BytesN<33>,
        allowed: bool,
        max_amount: i128,
        auth_id: u64,
    ) -> Result<bool, ContractError> {
        signer.require_auth();
        if !allowance::check_caller_allowed(&env, &signer, &caller) {
            return Err(ContractError::NotAllowed);
        }
        if period == 0 {
            return Err(ContractError::StackingInvalidLockPeriod);
        }
        if reward_cycle < Self::current_cycle(&env) {
            return Err(ContractError::InvalidRewardCycle);
        }
        if !check_pox_addr(&pox_addr) {
            return Err(ContractError::StackingInvalidPoxAddress);
        }

        signer_auth::set_authorization(
            &env,
            &signer_auth::SignerAuthKey {
                pox_addr,
                reward_cycle,
                topic,
                period,
                signer_key: signer_key.clone(),
                max_amount,
                auth_id,
            },
            allowed,
        );
        events::publish_signer_key_authorization_set(
            &env,
            signer,
            signer_key,
            reward_cycle,
            period,
            allowed,
            auth_id,
        );
        Ok(allowed)
    }

    /// Canonical digest an off-chain signer must sign to authorize one
    /// parameter tuple against this contract instance.
    pub fn get_signer_key_message_hash(
        env: Env,
        pox_addr: PoxAddress,
        reward_cycle: u64,
        topic: SignerKeyTopic,
        period: u64,
        max_amount: i128,
        auth_id: u64,
    ) -> BytesN<32> {
        signer_auth::signer_key_message_hash(
            &env,
            &pox_addr,
            reward_cycle,
            &topic,
            period,
            max_amount,
            auth_id,
        )
        .to_bytes()
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn first_burn_height(env: &Env) -> u64 {
        env.storage()
            .instance()
            .get(&FIRST_BURN_HEIGHT)
            .unwrap_or(DEFAULT_FIRST_BURNCHAIN_BLOCK_HEIGHT)
    }

    fn prepare_cycle_length(env: &Env) -> u64 {
        env.storage()
            .instance()
            .get(&PREPARE_LEN)
            .unwrap_or(DEFAULT_PREPARE_CYCLE_LENGTH)
    }

    fn reward_cycle_length(env: &Env) -> u64 {
        env.storage()
            .instance()
            .get(&REWARD_LEN)
            .unwrap_or(DEFAULT_REWARD_CYCLE_LENGTH)
    }

    fn first_active_cycle(env: &Env) -> u64 {
        env.storage().instance().get(&FIRST_CYCLE).unwrap_or(0)
    }

    fn liquid_supply(env: &Env) -> i128 {
        env.storage()
            .instance()
            .get(&LIQUID_SUPPLY)
            .unwrap_or(DEFAULT_TOTAL_LIQUID_SUPPLY_USTX)
    }

    fn stacking_minimum(env: &Env) -> i128 {
        Self::liquid_supply(env) / STACKING_THRESHOLD_25
    }

    fn height_to_cycle(env: &Env, burn_height: u64) -> u64 {
        clock::burn_height_to_reward_cycle(
            burn_height,
            Self::first_burn_height(env),
            Self::reward_cycle_length(env),
        )
    }

    fn current_cycle(env: &Env) -> u64 {
        Self::height_to_cycle(env, u64::from(env.ledger().sequence()))
    }

    /// Shared period/address validation in gate precedence order.
    fn check_stacking_args(pox_addr: &PoxAddress, lock_period: u64) -> Result<(), ContractError> {
        if !check_lock_period(lock_period) {
            return Err(ContractError::StackingInvalidLockPeriod);
        }
        if !check_pox_addr(pox_addr) {
            return Err(ContractError::StackingInvalidPoxAddress);
        }
        Ok(())
    }

    fn read_stacker(env: &Env, stacker: &Address) -> Option<StackerRecord> {
        env.storage()
            .persistent()
            .get(&StackerKey::Stacker(stacker.clone()))
    }

    fn write_stacker(env: &Env, stacker: &Address, record: &StackerRecord) {
        let key = StackerKey::Stacker(stacker.clone());
        env.storage().persistent().set(&key, record);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }

    /// A commitment blocks re-stacking from the moment it is written until
    /// its window ends, even though the query view only opens at the first
    /// reward cycle.
    fn has_unexpired_stacking(env: &Env, stacker: &Address) -> bool {
        match Self::read_stacker(env, stacker) {
            None => false,
            Some(info) => {
                Self::current_cycle(env) < info.first_reward_cycle + info.lock_period
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod test_signer_auth;
