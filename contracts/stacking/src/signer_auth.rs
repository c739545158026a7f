//! One-time signer-key authorizations.
//!
//! A permission is identified by the full parameter tuple it covers and can
//! be satisfied two ways: a recoverable secp256k1 signature over the
//! canonical digest of that tuple, or a pre-registered authorization stored
//! by the signer. Both paths share one consumption flag, so a tuple spent
//! through either path stays spent forever.

use soroban_sdk::{
    contracttype, crypto::Hash, symbol_short, xdr::ToXdr, Address, Bytes, BytesN, Env, Symbol,
};

use crate::pox_addr::PoxAddress;
use crate::ContractError;

/// Prefix of every signed structured-data payload, preventing collisions
/// with any other signature scheme over the same key.
const STRUCTURED_DATA_PREFIX: [u8; 8] = *b"SGNRAUTH";

// ── Types ────────────────────────────────────────────────────────────────────

/// The operation class a signer permission is scoped to.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SignerKeyTopic {
    StackStx,
    AggCommit,
    StackExtend,
    StackIncrease,
}

/// The exact parameter tuple identifying one consumable permission. The
/// digest signed by the key omits `signer_key` (the key is recovered from
/// the signature); the storage key includes it.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignerAuthKey {
    pub pox_addr: PoxAddress,
    pub reward_cycle: u64,
    pub topic: SignerKeyTopic,
    pub period: u64,
    pub signer_key: BytesN<33>,
    pub max_amount: i128,
    pub auth_id: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum AuthKey {
    Enabled(SignerAuthKey),
    Used(SignerAuthKey),
}

/// Domain tuple mixed into the digest so signatures cannot be replayed
/// against another deployment of this contract.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
struct SignatureDomain {
    name: Symbol,
    version: Symbol,
    verifying_contract: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
struct SignerKeyMessage {
    pox_addr: PoxAddress,
    reward_cycle: u64,
    topic: SignerKeyTopic,
    period: u64,
    max_amount: i128,
    auth_id: u64,
}

// ── Digest ───────────────────────────────────────────────────────────────────

/// Canonical digest of one permission tuple:
/// `sha256(PREFIX || sha256(xdr(domain)) || sha256(xdr(message)))`.
pub fn signer_key_message_hash(
    env: &Env,
    pox_addr: &PoxAddress,
    reward_cycle: u64,
    topic: &SignerKeyTopic,
    period: u64,
    max_amount: i128,
    auth_id: u64,
) -> Hash<32> {
    let domain = SignatureDomain {
        name: Symbol::new(env, "pox_stacking_signer"),
        version: symbol_short!("v1"),
        verifying_contract: env.current_contract_address(),
    };
    let message = SignerKeyMessage {
        pox_addr: pox_addr.clone(),
        reward_cycle,
        topic: topic.clone(),
        period,
        max_amount,
        auth_id,
    };

    let domain_hash: Bytes = env.crypto().sha256(&domain.to_xdr(env)).to_bytes().into();
    let message_hash: Bytes = env.crypto().sha256(&message.to_xdr(env)).to_bytes().into();

    let mut payload = Bytes::from_array(env, &STRUCTURED_DATA_PREFIX);
    payload.append(&domain_hash);
    payload.append(&message_hash);
    env.crypto().sha256(&payload)
}

/// Recover the compressed public key from a 65-byte `r || s || recovery_id`
/// signature over `digest`.
fn recover_pubkey(
    env: &Env,
    digest: &Hash<32>,
    signature: &BytesN<65>,
) -> Result<BytesN<33>, ContractError> {
    let raw = signature.to_array();
    let recovery_id = raw[64];
    if recovery_id > 3 {
        return Err(ContractError::InvalidSignatureRecover);
    }

    let mut rs = [0u8; 64];
    rs.copy_from_slice(&raw[..64]);
    let uncompressed = env
        .crypto()
        .secp256k1_recover(digest, &BytesN::from_array(env, &rs), u32::from(recovery_id))
        .to_array();

    // SEC-1 compression: x coordinate with a parity prefix from y.
    let mut compressed = [0u8; 33];
    compressed[0] = 0x02 | (uncompressed[64] & 1);
    compressed[1..].copy_from_slice(&uncompressed[1..33]);
    Ok(BytesN::from_array(env, &compressed))
}

// ── State ────────────────────────────────────────────────────────────────────

pub fn is_used(env: &Env, key: &SignerAuthKey) -> bool {
    env.storage()
        .persistent()
        .get(&AuthKey::Used(key.clone()))
        .unwrap_or(false)
}

fn is_enabled(env: &Env, key: &SignerAuthKey) -> bool {
    env.storage()
        .persistent()
        .get(&AuthKey::Enabled(key.clone()))
        .unwrap_or(false)
}

fn mark_used(env: &Env, key: &SignerAuthKey) {
    let storage_key = AuthKey::Used(key.clone());
    env.storage().persistent().set(&storage_key, &true);
    env.storage()
        .persistent()
        .extend_ttl(&storage_key, crate::TTL_THRESHOLD, crate::TTL_EXTEND_TO);
}

/// Record (or disable) a pre-authorization. Never touches the used flag.
pub fn set_authorization(env: &Env, key: &SignerAuthKey, allowed: bool) {
    let storage_key = AuthKey::Enabled(key.clone());
    env.storage().persistent().set(&storage_key, &allowed);
    env.storage()
        .persistent()
        .extend_ttl(&storage_key, crate::TTL_THRESHOLD, crate::TTL_EXTEND_TO);
}

// ── Verification & consumption ───────────────────────────────────────────────

/// Validate a permission without mutating anything.
///
/// Check order: requested amount against the signed ceiling, then the shared
/// consumption flag, then whichever satisfaction path the caller chose.
pub fn verify(
    env: &Env,
    pox_addr: &PoxAddress,
    reward_cycle: u64,
    topic: &SignerKeyTopic,
    period: u64,
    signer_sig: Option<&BytesN<65>>,
    signer_key: &BytesN<33>,
    amount: i128,
    max_amount: i128,
    auth_id: u64,
) -> Result<(), ContractError> {
    if amount > max_amount {
        return Err(ContractError::SignerAuthAmountTooHigh);
    }

    let key = SignerAuthKey {
        pox_addr: pox_addr.clone(),
        reward_cycle,
        topic: topic.clone(),
        period,
        signer_key: signer_key.clone(),
        max_amount,
        auth_id,
    };
    if is_used(env, &key) {
        return Err(ContractError::SignerAuthUsed);
    }

    match signer_sig {
        Some(signature) => {
            let digest =
                signer_key_message_hash(env, pox_addr, reward_cycle, topic, period, max_amount, auth_id);
            let recovered = recover_pubkey(env, &digest, signature)?;
            if recovered != *signer_key {
                return Err(ContractError::InvalidSignaturePubkey);
            }
            Ok(())
        }
        None => {
            if is_enabled(env, &key) {
                Ok(())
            } else {
                Err(ContractError::NotAllowed)
            }
        }
    }
}

/// Validate as [`verify`] and, on success, burn the permission. The flag is
/// keyed by the canonical tuple alone, so a signature-satisfied call and a
/// registration-satisfied call for the same tuple share it.
pub fn consume(
    env: &Env,
    pox_addr: &PoxAddress,
    reward_cycle: u64,
    topic: &SignerKeyTopic,
    period: u64,
    signer_sig: Option<&BytesN<65>>,
    signer_key: &BytesN<33>,
    amount: i128,
    max_amount: i128,
    auth_id: u64,
) -> Result<(), ContractError> {
    verify(
        env, pox_addr, reward_cycle, topic, period, signer_sig, signer_key, amount, max_amount,
        auth_id,
    )?;
    mark_used(
        env,
        &SignerAuthKey {
            pox_addr: pox_addr.clone(),
            reward_cycle,
            topic: topic.clone(),
            period,
            signer_key: signer_key.clone(),
            max_amount,
            auth_id,
        },
    );
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────────
