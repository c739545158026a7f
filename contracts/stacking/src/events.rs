#![allow(deprecated)] // events().publish migration tracked separately

use soroban_sdk::{symbol_short, Address, BytesN, Env};

use crate::pox_addr::PoxAddress;

// ── Event payloads ──────────────────────────────────────────────────────────

/// Fired once when the burnchain timing parameters are locked in.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BurnchainConfiguredEvent {
    pub first_burn_height: u64,
    pub prepare_cycle_length: u64,
    pub reward_cycle_length: u64,
    pub first_reward_cycle: u64,
    pub burn_height: u64,
}

/// Fired when a stacker locks funds into a run of reward cycles.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StackedEvent {
    pub stacker: Address,
    pub amount_ustx: i128,
    pub first_reward_cycle: u64,
    pub lock_period: u64,
    pub unlock_burn_height: u64,
    pub burn_height: u64,
}

/// Fired when a stacker grants a calling contract an allowance.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallerAllowedEvent {
    pub sender: Address,
    pub contract_caller: Address,
    pub until_burn_height: Option<u64>,
    pub burn_height: u64,
}

/// Fired when a stacker revokes a calling contract's allowance.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallerDisallowedEvent {
    pub sender: Address,
    pub contract_caller: Address,
    pub burn_height: u64,
}

/// Fired when a stacker delegates to an operator.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DelegatedEvent {
    pub stacker: Address,
    pub delegated_to: Address,
    pub amount_ustx: i128,
    pub until_burn_height: Option<u64>,
    pub burn_height: u64,
}

/// Fired when a stacker revokes its delegation.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DelegationRevokedEvent {
    pub stacker: Address,
    pub delegated_to: Address,
    pub burn_height: u64,
}

/// Fired when a signer pre-registers or disables a key authorization.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignerKeyAuthorizationSetEvent {
    pub signer: Address,
    pub signer_key: BytesN<33>,
    pub reward_cycle: u64,
    pub period: u64,
    pub allowed: bool,
    pub auth_id: u64,
    pub burn_height: u64,
}

// ── Publishers ──────────────────────────────────────────────────────────────

fn burn_height(env: &Env) -> u64 {
    u64::from(env.ledger().sequence())
}

pub fn publish_burnchain_configured(
    env: &Env,
    first_burn_height: u64,
    prepare_cycle_length: u64,
    reward_cycle_length: u64,
    first_reward_cycle: u64,
) {
    env.events().publish(
        (symbol_short!("CONFIG"),),
        BurnchainConfiguredEvent {
            first_burn_height,
            prepare_cycle_length,
            reward_cycle_length,
            first_reward_cycle,
            burn_height: burn_height(env),
        },
    );
}

pub fn publish_stacked(
    env: &Env,
    stacker: Address,
    amount_ustx: i128,
    first_reward_cycle: u64,
    lock_period: u64,
    unlock_burn_height: u64,
) {
    env.events().publish(
        (symbol_short!("STACKED"), stacker.clone()),
        StackedEvent {
            stacker,
            amount_ustx,
            first_reward_cycle,
            lock_period,
            unlock_burn_height,
            burn_height: burn_height(env),
        },
    );
}

pub fn publish_caller_allowed(
    env: &Env,
    sender: Address,
    contract_caller: Address,
    until_burn_height: Option<u64>,
) {
    env.events().publish(
        (symbol_short!("ALLOW"), sender.clone()),
        CallerAllowedEvent {
            sender,
            contract_caller,
            until_burn_height,
            burn_height: burn_height(env),
        },
    );
}

pub fn publish_caller_disallowed(env: &Env, sender: Address, contract_caller: Address) {
    env.events().publish(
        (symbol_short!("DISALLOW"), sender.clone()),
        CallerDisallowedEvent {
            sender,
            contract_caller,
            burn_height: burn_height(env),
        },
    );
}

pub fn publish_delegated(
    env: &Env,
    stacker: Address,
    delegated_to: Address,
    amount_ustx: i128,
    until_burn_height: Option<u64>,
) {
    env.events().publish(
        (symbol_short!("DELEGATE"), stacker.clone()),
        DelegatedEvent {
            stacker,
            delegated_to,
            amount_ustx,
            until_burn_height,
            burn_height: burn_height(env),
        },
    );
}

pub fn publish_delegation_revoked(env: &Env, stacker: Address, delegated_to: Address) {
    env.events().publish(
        (symbol_short!("REVOKE"), stacker.clone()),
        DelegationRevokedEvent {
            stacker,
            delegated_to,
            burn_height: burn_height(env),
        },
    );
}

pub fn publish_signer_key_authorization_set(
    env: &Env,
    signer: Address,
    signer_key: BytesN<33>,
    reward_cycle: u64,
    period: u64,
    allowed: bool,
    auth_id: u64,
) {
    env.events().publish(
        (symbol_short!("AUTH_SET"), signer.clone()),
        SignerKeyAuthorizationSetEvent {
            signer,
            signer_key,
            reward_cycle,
            period,
            allowed,
            auth_id,
            burn_height: burn_height(env),
        },
    );
}
