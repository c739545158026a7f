//! Registry of calling contracts a stacker has authorized to act on its
//! behalf, with an optional burn-height expiry.

use soroban_sdk::{contracttype, Address, Env};

// ── Storage ──────────────────────────────────────────────────────────────────

/// Allowance granted by a stacker to one calling contract. A `None` expiry
/// never lapses.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowedCaller {
    pub until_burn_height: Option<u64>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum AllowanceKey {
    Allowance(Address, Address),
}

fn allowance_key(sender: &Address, contract_caller: &Address) -> AllowanceKey {
    AllowanceKey::Allowance(sender.clone(), contract_caller.clone())
}

// ── Registry operations ──────────────────────────────────────────────────────

pub fn allow(env: &Env, sender: &Address, contract_caller: &Address, until_burn_height: Option<u64>) {
    let key = allowance_key(sender, contract_caller);
    env.storage()
        .persistent()
        .set(&key, &AllowedCaller { until_burn_height });
    env.storage()
        .persistent()
        .extend_ttl(&key, crate::TTL_THRESHOLD, crate::TTL_EXTEND_TO);
}

/// Remove an allowance record. Returns whether one existed.
pub fn disallow(env: &Env, sender: &Address, contract_caller: &Address) -> bool {
    let key = allowance_key(sender, contract_caller);
    let existed = env.storage().persistent().has(&key);
    env.storage().persistent().remove(&key);
    existed
}

pub fn get(env: &Env, sender: &Address, contract_caller: &Address) -> Option<AllowedCaller> {
    env.storage()
        .persistent()
        .get(&allowance_key(sender, contract_caller))
}

/// A direct call (sender and caller coincide) is always allowed; an indirect
/// caller needs a live allowance record. An expired record counts as absent
/// without ever being deleted.
pub fn check_caller_allowed(env: &Env, sender: &Address, caller: &Address) -> bool {
    if sender == caller {
        return true;
    }
    match get(env, sender, caller) {
        None => false,
        Some(allowed) => match allowed.until_burn_height {
            None => true,
            Some(until) => u64::from(env.ledger().sequence()) <= until,
        },
    }
}
