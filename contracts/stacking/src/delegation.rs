//! Per-stacker delegation records.
//!
//! A stacker that has delegated may not stack directly until the delegation
//! is revoked or lapses. Expiry is lazy: a record past its burn-height bound
//! simply stops being returned by [`get_active`].

use soroban_sdk::{contracttype, Address, Env};

use crate::pox_addr::PoxAddress;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DelegationRecord {
    pub amount_ustx: i128,
    pub delegated_to: Address,
    pub until_burn_height: Option<u64>,
    pub pox_addr: Option<PoxAddress>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum DelegationKey {
    Delegation(Address),
}

fn delegation_key(stacker: &Address) -> DelegationKey {
    DelegationKey::Delegation(stacker.clone())
}

pub fn set(env: &Env, stacker: &Address, record: &DelegationRecord) {
    let key = delegation_key(stacker);
    env.storage().persistent().set(&key, record);
    env.storage()
        .persistent()
        .extend_ttl(&key, crate::TTL_THRESHOLD, crate::TTL_EXTEND_TO);
}

pub fn remove(env: &Env, stacker: &Address) {
    env.storage().persistent().remove(&delegation_key(stacker));
}

/// The raw stored record, expired or not.
pub fn get(env: &Env, stacker: &Address) -> Option<DelegationRecord> {
    env.storage().persistent().get(&delegation_key(stacker))
}

/// The stored record, unless its expiry has passed.
pub fn get_active(env: &Env, stacker: &Address) -> Option<DelegationRecord> {
    let record = get(env, stacker)?;
    if let Some(until) = record.until_burn_height {
        if u64::from(env.ledger().sequence()) > until {
            return None;
        }
    }
    Some(record)
}
