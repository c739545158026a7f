//! Versioned payout addresses and the validity checks shared by every
//! stacking entry point.

use soroban_sdk::{contracttype, Bytes};

// ── Address version codes ────────────────────────────────────────────────────

pub const ADDRESS_VERSION_P2PKH: u32 = 0x00;
pub const ADDRESS_VERSION_P2SH: u32 = 0x01;
pub const ADDRESS_VERSION_P2SH_P2WPKH: u32 = 0x02;
pub const ADDRESS_VERSION_P2SH_P2WSH: u32 = 0x03;
pub const ADDRESS_VERSION_NATIVE_P2WPKH: u32 = 0x04;
pub const ADDRESS_VERSION_NATIVE_P2WSH: u32 = 0x05;
pub const ADDRESS_VERSION_NATIVE_P2TR: u32 = 0x06;

/// Highest version code accepted anywhere in the contract.
pub const MAX_ADDRESS_VERSION: u32 = ADDRESS_VERSION_NATIVE_P2TR;
/// Versions up to and including this one carry a 20-byte hash; the
/// remaining supported versions carry a 32-byte hash.
const MAX_ADDRESS_VERSION_BUFF_20: u32 = ADDRESS_VERSION_NATIVE_P2WPKH;

// ── Lock period bounds ───────────────────────────────────────────────────────

pub const MIN_POX_REWARD_CYCLES: u64 = 1;
pub const MAX_POX_REWARD_CYCLES: u64 = 12;

// ── Types ────────────────────────────────────────────────────────────────────

/// A versioned, hash-based payout address on the settlement chain.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoxAddress {
    pub version: u32,
    pub hashbytes: Bytes,
}

// ── Checks ───────────────────────────────────────────────────────────────────

pub fn check_version(version: u32) -> bool {
    version <= MAX_ADDRESS_VERSION
}

/// The hash length must match the class the version belongs to; a length
/// mismatch is invalid regardless of the version, and an unsupported
/// version is invalid regardless of the length.
pub fn check_hashbytes(version: u32, hashbytes: &Bytes) -> bool {
    if !check_version(version) {
        return false;
    }
    let expected = if version <= MAX_ADDRESS_VERSION_BUFF_20 {
        20
    } else {
        32
    };
    hashbytes.len() == expected
}

pub fn check_pox_addr(addr: &PoxAddress) -> bool {
    check_version(addr.version) && check_hashbytes(addr.version, &addr.hashbytes)
}

pub fn check_lock_period(period: u64) -> bool {
    (MIN_POX_REWARD_CYCLES..=MAX_POX_REWARD_CYCLES).contains(&period)
}

// ── Tests ────────────────────────────────────────────────────────────────────
