//! Per-cycle reward sets: an append-only list of payout slots plus running
//! aggregates, keyed by reward cycle.
//!
//! Slots are never merged: two stackers committing the same payout address
//! occupy two distinct indexes.

use soroban_sdk::{contracttype, Address, BytesN, Env, Vec};

use crate::pox_addr::PoxAddress;

/// One slot of a cycle's reward set.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardSetEntry {
    pub pox_addr: PoxAddress,
    pub signer: BytesN<33>,
    pub stacker: Option<Address>,
    pub total_ustx: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum RewardSetKey {
    Size(u64),
    Total(u64),
    Entry(u64, u64),
}

// ── Reads ────────────────────────────────────────────────────────────────────

fn load_size(env: &Env, reward_cycle: u64) -> u64 {
    env.storage()
        .persistent()
        .get(&RewardSetKey::Size(reward_cycle))
        .unwrap_or(0)
}

fn load_total(env: &Env, reward_cycle: u64) -> i128 {
    env.storage()
        .persistent()
        .get(&RewardSetKey::Total(reward_cycle))
        .unwrap_or(0)
}

/// Number of slots registered for a cycle; 0 when the cycle saw no activity.
pub fn size(env: &Env, reward_cycle: u64) -> u64 {
    load_size(env, reward_cycle)
}

/// Sum of µSTX across all of a cycle's slots; 0 when the cycle saw none.
pub fn total_stacked(env: &Env, reward_cycle: u64) -> i128 {
    load_total(env, reward_cycle)
}

pub fn entry(env: &Env, reward_cycle: u64, index: u64) -> Option<RewardSetEntry> {
    env.storage()
        .persistent()
        .get(&RewardSetKey::Entry(reward_cycle, index))
}

// ── Writes ───────────────────────────────────────────────────────────────────

/// Append one slot of `amount_ustx` for `stacker` to every cycle in
/// `[first_reward_cycle, first_reward_cycle + num_cycles)`, returning the
/// slot index assigned in each cycle in order.
pub fn add_pox_address_to_cycles(
    env: &Env,
    pox_addr: &PoxAddress,
    signer: &BytesN<33>,
    first_reward_cycle: u64,
    num_cycles: u64,
    amount_ustx: i128,
    stacker: &Address,
) -> Vec<u64> {
    let mut indexes = Vec::new(env);
    for i in 0..num_cycles {
        let cycle = first_reward_cycle + i;
        let index = load_size(env, cycle);

        let entry_key = RewardSetKey::Entry(cycle, index);
        env.storage().persistent().set(
            &entry_key,
            &RewardSetEntry {
                pox_addr: pox_addr.clone(),
                signer: signer.clone(),
                stacker: Some(stacker.clone()),
                total_ustx: amount_ustx,
            },
        );
        env.storage()
            .persistent()
            .extend_ttl(&entry_key, crate::TTL_THRESHOLD, crate::TTL_EXTEND_TO);

        let size_key = RewardSetKey::Size(cycle);
        env.storage().persistent().set(&size_key, &(index + 1));
        env.storage()
            .persistent()
            .extend_ttl(&size_key, crate::TTL_THRESHOLD, crate::TTL_EXTEND_TO);

        let total_key = RewardSetKey::Total(cycle);
        let total = load_total(env, cycle).saturating_add(amount_ustx);
        env.storage().persistent().set(&total_key, &total);
        env.storage()
            .persistent()
            .extend_ttl(&total_key, crate::TTL_THRESHOLD, crate::TTL_EXTEND_TO);

        indexes.push_back(index);
    }
    indexes
}
