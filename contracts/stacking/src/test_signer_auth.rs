extern crate std;

use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    Address, Bytes, BytesN, Env,
};

use crate::pox_addr::PoxAddress;
use crate::signer_auth::{self, SignerKeyTopic};
use crate::{ContractError, StackingContract, StackingContractClient};

// ── Test helpers ─────────────────────────────────────────────────────────────

const AMOUNT: i128 = 150_000_000_000;
const MAX_AMOUNT: i128 = 300_000_000_000;

fn setup() -> (Env, StackingContractClient<'static>) {
    let env = Env::default();
    env.mock_all_auths();

    let contract_id = env.register(StackingContract, ());
    let client = StackingContractClient::new(&env, &contract_id);

    (env, client)
}

fn pox(env: &Env) -> PoxAddress {
    PoxAddress {
        version: 0,
        hashbytes: Bytes::from_array(env, &[0x33; 20]),
    }
}

fn keypair(seed: u8) -> SigningKey {
    let mut bytes = [0u8; 32];
    bytes[31] = seed;
    SigningKey::from_bytes(&bytes.into()).expect("nonzero seed is a valid scalar")
}

fn pubkey_33(env: &Env, sk: &SigningKey) -> BytesN<33> {
    let point = sk.verifying_key().to_encoded_point(true);
    let mut raw = [0u8; 33];
    raw.copy_from_slice(point.as_bytes());
    BytesN::from_array(env, &raw)
}

/// Produce the 65-byte `r || s || recovery_id` signature the contract
/// expects, over the digest the contract itself publishes.
#[allow(clippy::too_many_arguments)]
fn sign_tuple(
    env: &Env,
    client: &StackingContractClient,
    sk: &SigningKey,
    pox_addr: &PoxAddress,
    reward_cycle: u64,
    topic: &SignerKeyTopic,
    period: u64,
    max_amount: i128,
    auth_id: u64,
) -> BytesN<65> {
    let digest = client.get_signer_key_message_hash(
        pox_addr,
        &reward_cycle,
        topic,
        &period,
        &max_amount,
        &auth_id,
    );
    let (sig, recid) = sk
        .sign_prehash_recoverable(&digest.to_array())
        .expect("signing cannot fail");

    let mut raw = [0u8; 65];
    raw[..64].copy_from_slice(&sig.to_bytes());
    raw[64] = recid.to_byte();
    BytesN::from_array(env, &raw)
}

// ── Signature path ────────────────────────────────────────────────────────────

#[test]
fn test_verify_accepts_a_valid_signature() {
    let (env, client) = setup();
    let sk = keypair(1);
    let signer_key = pubkey_33(&env, &sk);
    let addr = pox(&env);

    let sig = sign_tuple(
        &env,
        &client,
        &sk,
        &addr,
        1,
        &SignerKeyTopic::AggCommit,
        1,
        MAX_AMOUNT,
        1,
    );

    assert!(client.verify_signer_key_sig(
        &addr,
        &1,
        &SignerKeyTopic::AggCommit,
        &1,
        &Some(sig),
        &signer_key,
        &AMOUNT,
        &MAX_AMOUNT,
        &1,
    ));
}

#[test]
fn test_verify_rejects_amount_above_ceiling() {
    let (env, client) = setup();
    let sk = keypair(1);
    let signer_key = pubkey_33(&env, &sk);
    let addr = pox(&env);

    let sig = sign_tuple(
        &env,
        &client,
        &sk,
        &addr,
        1,
        &SignerKeyTopic::AggCommit,
        1,
        AMOUNT,
        1,
    );

    // Requested amount exceeds the signed ceiling.
    let result = client.try_verify_signer_key_sig(
        &addr,
        &1,
        &SignerKeyTopic::AggCommit,
        &1,
        &Some(sig),
        &signer_key,
        &(AMOUNT * 2),
        &AMOUNT,
        &1,
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::SignerAuthAmountTooHigh),
        _ => unreachable!("Expected SignerAuthAmountTooHigh error"),
    }
}

#[test]
fn test_verify_rejects_a_signature_by_another_key() {
    let (env, client) = setup();
    let signer = keypair(1);
    let impostor = keypair(2);
    let signer_key = pubkey_33(&env, &signer);
    let addr = pox(&env);

    let sig = sign_tuple(
        &env,
        &client,
        &impostor,
        &addr,
        1,
        &SignerKeyTopic::AggCommit,
        1,
        MAX_AMOUNT,
        1,
    );

    let result = client.try_verify_signer_key_sig(
        &addr,
        &1,
        &SignerKeyTopic::AggCommit,
        &1,
        &Some(sig),
        &signer_key,
        &AMOUNT,
        &MAX_AMOUNT,
        &1,
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::InvalidSignaturePubkey),
        _ => unreachable!("Expected InvalidSignaturePubkey error"),
    }
}

#[test]
fn test_verify_rejects_a_signature_over_different_parameters() {
    let (env, client) = setup();
    let sk = keypair(1);
    let signer_key = pubkey_33(&env, &sk);
    let addr = pox(&env);

    // Signed for period 1, presented for period 2: the recovered key no
    // longer matches.
    let sig = sign_tuple(
        &env,
        &client,
        &sk,
        &addr,
        1,
        &SignerKeyTopic::AggCommit,
        1,
        MAX_AMOUNT,
        1,
    );

    let result = client.try_verify_signer_key_sig(
        &addr,
        &1,
        &SignerKeyTopic::AggCommit,
        &2,
        &Some(sig),
        &signer_key,
        &AMOUNT,
        &MAX_AMOUNT,
        &1,
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::InvalidSignaturePubkey),
        _ => unreachable!("Expected InvalidSignaturePubkey error"),
    }
}

#[test]
fn test_verify_rejects_malformed_recovery_byte() {
    let (env, client) = setup();
    let sk = keypair(1);
    let signer_key = pubkey_33(&env, &sk);
    let addr = pox(&env);

    let sig = sign_tuple(
        &env,
        &client,
        &sk,
        &addr,
        1,
        &SignerKeyTopic::AggCommit,
        1,
        MAX_AMOUNT,
        1,
    );
    let mut raw = sig.to_array();
    raw[64] = 7;
    let mangled = BytesN::from_array(&env, &raw);

    let result = client.try_verify_signer_key_sig(
        &addr,
        &1,
        &SignerKeyTopic::AggCommit,
        &1,
        &Some(mangled),
        &signer_key,
        &AMOUNT,
        &MAX_AMOUNT,
        &1,
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::InvalidSignatureRecover),
        _ => unreachable!("Expected InvalidSignatureRecover error"),
    }
}

// ── Pre-registration path ─────────────────────────────────────────────────────

#[test]
fn test_verify_accepts_a_prior_authorization() {
    let (env, client) = setup();
    let signer = Address::generate(&env);
    let sk = keypair(1);
    let signer_key = pubkey_33(&env, &sk);
    let addr = pox(&env);

    client.set_signer_key_authorization(
        &signer,
        &signer,
        &addr,
        &1,
        &1,
        &SignerKeyTopic::AggCommit,
        &signer_key,
        &true,
        &MAX_AMOUNT,
        &1,
    );

    assert!(client.verify_signer_key_sig(
        &addr,
        &1,
        &SignerKeyTopic::AggCommit,
        &1,
        &None,
        &signer_key,
        &AMOUNT,
        &MAX_AMOUNT,
        &1,
    ));
}

#[test]
fn test_verify_without_signature_or_registration() {
    let (env, client) = setup();
    let sk = keypair(1);
    let signer_key = pubkey_33(&env, &sk);
    let addr = pox(&env);

    let result = client.try_verify_signer_key_sig(
        &addr,
        &1,
        &SignerKeyTopic::AggCommit,
        &1,
        &None,
        &signer_key,
        &AMOUNT,
        &MAX_AMOUNT,
        &1,
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::NotAllowed),
        _ => unreachable!("Expected NotAllowed error"),
    }
}

#[test]
fn test_disabled_registration_is_not_allowed() {
    let (env, client) = setup();
    let signer = Address::generate(&env);
    let sk = keypair(1);
    let signer_key = pubkey_33(&env, &sk);
    let addr = pox(&env);

    client.set_signer_key_authorization(
        &signer,
        &signer,
        &addr,
        &1,
        &1,
        &SignerKeyTopic::AggCommit,
        &signer_key,
        &true,
        &MAX_AMOUNT,
        &1,
    );
    client.set_signer_key_authorization(
        &signer,
        &signer,
        &addr,
        &1,
        &1,
        &SignerKeyTopic::AggCommit,
        &signer_key,
        &false,
        &MAX_AMOUNT,
        &1,
    );

    let result = client.try_verify_signer_key_sig(
        &addr,
        &1,
        &SignerKeyTopic::AggCommit,
        &1,
        &None,
        &signer_key,
        &AMOUNT,
        &MAX_AMOUNT,
        &1,
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::NotAllowed),
        _ => unreachable!("Expected NotAllowed error"),
    }
}

#[test]
fn test_set_signer_key_authorization_guards() {
    let (env, client) = setup();
    let signer = Address::generate(&env);
    let other = Address::generate(&env);
    let sk = keypair(1);
    let signer_key = pubkey_33(&env, &sk);
    let addr = pox(&env);

    // Indirect call without an allowance.
    let result = client.try_set_signer_key_authorization(
        &signer,
        &other,
        &addr,
        &1,
        &1,
        &SignerKeyTopic::AggCommit,
        &signer_key,
        &true,
        &MAX_AMOUNT,
        &1,
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::NotAllowed),
        _ => unreachable!("Expected NotAllowed error"),
    }

    // Zero period.
    let result = client.try_set_signer_key_authorization(
        &signer,
        &signer,
        &addr,
        &0,
        &1,
        &SignerKeyTopic::AggCommit,
        &signer_key,
        &true,
        &MAX_AMOUNT,
        &1,
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::StackingInvalidLockPeriod),
        _ => unreachable!("Expected StackingInvalidLockPeriod error"),
    }

    // Reward cycle already in the past.
    env.ledger().set_sequence_number(2 * 1_050);
    let result = client.try_set_signer_key_authorization(
        &signer,
        &signer,
        &addr,
        &1,
        &1,
        &SignerKeyTopic::AggCommit,
        &signer_key,
        &true,
        &MAX_AMOUNT,
        &1,
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::InvalidRewardCycle),
        _ => unreachable!("Expected InvalidRewardCycle error"),
    }

    // Malformed payout address.
    let bad = PoxAddress {
        version: 1,
        hashbytes: Bytes::from_array(&env, &[0u8; 4]),
    };
    let result = client.try_set_signer_key_authorization(
        &signer,
        &signer,
        &bad,
        &1,
        &2,
        &SignerKeyTopic::AggCommit,
        &signer_key,
        &true,
        &MAX_AMOUNT,
        &1,
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::StackingInvalidPoxAddress),
        _ => unreachable!("Expected StackingInvalidPoxAddress error"),
    }
}

// ── Consumption ───────────────────────────────────────────────────────────────

#[test]
fn test_consumed_tuple_rejects_even_a_fresh_valid_signature() {
    let (env, client) = setup();
    let sk = keypair(1);
    let signer_key = pubkey_33(&env, &sk);
    let addr = pox(&env);
    let topic = SignerKeyTopic::AggCommit;

    let sig = sign_tuple(&env, &client, &sk, &addr, 1, &topic, 1, MAX_AMOUNT, 1);

    // Burn the tuple through the signature path.
    env.as_contract(&client.address, || {
        signer_auth::consume(
            &env,
            &addr,
            1,
            &topic,
            1,
            Some(&sig),
            &signer_key,
            AMOUNT,
            MAX_AMOUNT,
            1,
        )
        .unwrap();
    });

    // A brand-new, perfectly valid signature over the same tuple is dead.
    let fresh = sign_tuple(&env, &client, &sk, &addr, 1, &topic, 1, MAX_AMOUNT, 1);
    let result = client.try_verify_signer_key_sig(
        &addr,
        &1,
        &topic,
        &1,
        &Some(fresh),
        &signer_key,
        &AMOUNT,
        &MAX_AMOUNT,
        &1,
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::SignerAuthUsed),
        _ => unreachable!("Expected SignerAuthUsed error"),
    }

    // So is the registration path over the same tuple.
    let result = client.try_verify_signer_key_sig(
        &addr,
        &1,
        &topic,
        &1,
        &None,
        &signer_key,
        &AMOUNT,
        &MAX_AMOUNT,
        &1,
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::SignerAuthUsed),
        _ => unreachable!("Expected SignerAuthUsed error"),
    }
}

#[test]
fn test_stack_stx_with_a_signature() {
    let (env, client) = setup();
    let stacker = Address::generate(&env);
    let sk = keypair(1);
    let signer_key = pubkey_33(&env, &sk);
    let addr = pox(&env);

    // The stack-stx consumption tuple is scoped to the current cycle.
    let sig = sign_tuple(
        &env,
        &client,
        &sk,
        &addr,
        0,
        &SignerKeyTopic::StackStx,
        6,
        MAX_AMOUNT,
        7,
    );

    let receipt = client.stack_stx(
        &stacker,
        &stacker,
        &AMOUNT,
        &addr,
        &0,
        &6,
        &Some(sig.clone()),
        &signer_key,
        &MAX_AMOUNT,
        &7,
    );
    assert_eq!(receipt.signer_key, signer_key);
    assert_eq!(client.get_reward_set_size(&1), 1);

    // The tuple is spent; replaying the same signature cannot stack again.
    let result = client.try_verify_signer_key_sig(
        &addr,
        &0,
        &SignerKeyTopic::StackStx,
        &6,
        &Some(sig),
        &signer_key,
        &AMOUNT,
        &MAX_AMOUNT,
        &7,
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::SignerAuthUsed),
        _ => unreachable!("Expected SignerAuthUsed error"),
    }
}

// ── Digest ────────────────────────────────────────────────────────────────────

#[test]
fn test_message_hash_is_stable_per_instance() {
    let (env, client) = setup();
    let addr = pox(&env);

    let a = client.get_signer_key_message_hash(
        &addr,
        &1,
        &SignerKeyTopic::StackStx,
        &6,
        &MAX_AMOUNT,
        &1,
    );
    let b = client.get_signer_key_message_hash(
        &addr,
        &1,
        &SignerKeyTopic::StackStx,
        &6,
        &MAX_AMOUNT,
        &1,
    );
    assert_eq!(a, b);
}

#[test]
fn test_message_hash_differs_between_instances() {
    let (env, client) = setup();
    let other_id = env.register(StackingContract, ());
    let other = StackingContractClient::new(&env, &other_id);
    let addr = pox(&env);

    let a = client.get_signer_key_message_hash(
        &addr,
        &1,
        &SignerKeyTopic::StackStx,
        &6,
        &MAX_AMOUNT,
        &1,
    );
    let b = other.get_signer_key_message_hash(
        &addr,
        &1,
        &SignerKeyTopic::StackStx,
        &6,
        &MAX_AMOUNT,
        &1,
    );
    assert_ne!(a, b);
}
