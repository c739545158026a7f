#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pox_stacking::{PoxAddress, SignerKeyTopic, StackingContract, StackingContractClient};
use soroban_sdk::{testutils::Address as _, Address, Bytes, BytesN, Env};

#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Stack {
        amount: u64,
        period: u8,
        version: u8,
        hash_len: u8,
        auth_id: u8,
    },
    AllowCaller {
        target: u8,
        until: Option<u32>,
    },
    DisallowCaller {
        target: u8,
    },
    Delegate {
        amount: u64,
        target: u8,
        until: Option<u32>,
    },
    Revoke,
    Verify {
        amount: u64,
        max_amount: u64,
        auth_id: u8,
    },
}

fuzz_target!(|actions: Vec<FuzzAction>| {
    let env = Env::default();
    env.mock_all_auths();

    let contract_id = env.register(StackingContract, ());
    let client = StackingContractClient::new(&env, &contract_id);

    let mut users = vec![];
    for _ in 0..5 {
        users.push(Address::generate(&env));
    }
    let signer_key = BytesN::from_array(&env, &[0x02; 33]);

    // Drive the contract with arbitrary parameters looking for unhandled
    // panics; only the documented clock traps are expected, and the inputs
    // below stay inside the clock's domain.
    for (i, action) in actions.into_iter().enumerate() {
        let caller = &users[i % users.len()];
        match action {
            FuzzAction::Stack {
                amount,
                period,
                version,
                hash_len,
                auth_id,
            } => {
                let amt = amount as i128;
                let period = u64::from(period % 16);
                let pox = PoxAddress {
                    version: u32::from(version % 8),
                    hashbytes: Bytes::from_slice(&env, &vec![0x11u8; (hash_len % 40) as usize]),
                };
                let cycle = client.current_pox_reward_cycle();
                let _ = client.try_set_signer_key_authorization(
                    caller,
                    caller,
                    &pox,
                    &period,
                    &cycle,
                    &SignerKeyTopic::StackStx,
                    &signer_key,
                    &true,
                    &amt,
                    &u64::from(auth_id),
                );
                let start = u64::from(env.ledger().sequence());
                let _ = client.try_stack_stx(
                    caller,
                    caller,
                    &amt,
                    &pox,
                    &start,
                    &period,
                    &None,
                    &signer_key,
                    &amt,
                    &u64::from(auth_id),
                );
            }
            FuzzAction::AllowCaller { target, until } => {
                let target = &users[target as usize % users.len()];
                let _ = client.try_allow_contract_caller(
                    caller,
                    caller,
                    target,
                    &until.map(u64::from),
                );
            }
            FuzzAction::DisallowCaller { target } => {
                let target = &users[target as usize % users.len()];
                let _ = client.try_disallow_contract_caller(caller, caller, target);
            }
            FuzzAction::Delegate {
                amount,
                target,
                until,
            } => {
                let target = &users[target as usize % users.len()];
                let _ = client.try_delegate_stx(
                    caller,
                    caller,
                    &(amount as i128),
                    target,
                    &until.map(u64::from),
                    &None,
                );
            }
            FuzzAction::Revoke => {
                let _ = client.try_revoke_delegate_stx(caller, caller);
            }
            FuzzAction::Verify {
                amount,
                max_amount,
                auth_id,
            } => {
                let pox = PoxAddress {
                    version: 0,
                    hashbytes: Bytes::from_array(&env, &[0x11; 20]),
                };
                let _ = client.try_verify_signer_key_sig(
                    &pox,
                    &client.current_pox_reward_cycle(),
                    &SignerKeyTopic::StackStx,
                    &6,
                    &None,
                    &signer_key,
                    &(amount as i128),
                    &(max_amount as i128),
                    &u64::from(auth_id),
                );
            }
        }
    }
});
