//! A hostile store: every perturbation must make loads fail or leave them exact.

mod common;

use std::collections::BTreeSet;

use common::{share, Deployment};
use proptest::prelude::*;
use sfs_client::{Sentinel, User};
use sfs_core::{RecordId, SfsError};
use sfs_storage::{BlobStore, TamperAction};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn ids(env: &Deployment) -> BTreeSet<RecordId> {
    env.store.ids().unwrap().into_iter().collect()
}

fn sentinel_of(env: &Deployment) -> (RecordId, Sentinel) {
    env.store
        .ids()
        .unwrap()
        .into_iter()
        .find_map(|id| {
            let bytes = env.store.get(&id).unwrap()?;
            Sentinel::from_bytes(&bytes).ok().map(|s| (id, s))
        })
        .expect("a sentinel is stored")
}

/// Alice owns "file" (two blocks) and shares it with Bob.
fn shared_file(env: &Deployment) -> (User, User, Vec<u8>) {
    let alice = env.create("alice");
    let bob = env.create("bob");
    alice.store_file("file", b"first block|").unwrap();
    alice.append_file("file", b"second block").unwrap();
    share(&alice, &bob, "file");
    (alice, bob, b"first block|second block".to_vec())
}

fn assert_load_fails_or_exact(user: &User, expected: &[u8]) -> Result<(), TestCaseError> {
    // A failed attempt may purge; the retry must not succeed with other bytes.
    for _ in 0..2 {
        if let Ok(data) = user.load_file("file") {
            prop_assert_eq!(&data[..], expected);
        }
    }
    Ok(())
}

// ── Targeted tampering ──────────────────────────────────────────────────────

#[test]
fn test_flipped_block_fails_every_load() {
    let env = Deployment::new();
    let alice = env.create("alice");
    alice.store_file("file", b"head").unwrap();

    let before = ids(&env);
    alice.append_file("file", b"tail").unwrap();
    let block = *ids(&env).difference(&before).next().unwrap();

    assert!(env.store.flip_bit(&block, 50, 1).unwrap());
    assert!(alice.load_file("file").unwrap_err().is_integrity());
    // Blocks sit past the verification chain, so the pointer survives.
    let again = env.login("alice");
    assert!(again.load_file("file").unwrap_err().is_integrity());
}

#[test]
fn test_flipped_metadata_purges_pointer() {
    let env = Deployment::new();
    let alice = env.create("alice");
    alice.store_file("file", b"content").unwrap();

    let (_, sentinel) = sentinel_of(&env);
    assert!(env.store.flip_bit(&sentinel.metadata_id, 90, 2).unwrap());
    assert!(alice.load_file("file").unwrap_err().is_integrity());

    // The drop was committed: a fresh login no longer maps the name.
    let again = env.login("alice");
    assert!(matches!(again.load_file("file"), Err(SfsError::AccessDenied(_))));
}

#[test]
fn test_flipped_metadata_is_integrity_failure() {
    let env = Deployment::new();
    let alice = env.create("alice");
    alice.store_file("file", b"content").unwrap();

    let (_, sentinel) = sentinel_of(&env);
    for byte in [0, 40, 70, 100] {
        let snapshot = env.store.snapshot().unwrap();
        let alice = env.login("alice");
        assert!(env.store.flip_bit(&sentinel.metadata_id, byte, 0).unwrap());
        assert!(alice.load_file("file").unwrap_err().is_integrity());
        env.store.restore(&snapshot).unwrap();
    }
    assert_eq!(alice.load_file("file").unwrap(), b"content");
}

#[test]
fn test_missing_records() {
    let env = Deployment::new();
    let (alice, bob, _) = shared_file(&env);
    let (sentinel_id, sentinel) = sentinel_of(&env);

    let snapshot = env.store.snapshot().unwrap();
    env.store.delete(&sentinel.metadata_id).unwrap();
    assert!(bob.load_file("file").unwrap_err().is_integrity());

    env.store.restore(&snapshot).unwrap();
    env.store.delete(&sentinel_id).unwrap();
    assert!(alice.load_file("file").unwrap_err().is_integrity());
}

#[test]
fn test_sentinel_cannot_be_repointed() {
    let env = Deployment::new();
    let alice = env.create("alice");
    alice.store_file("real", b"real").unwrap();
    let (real_id, _) = sentinel_of(&env);

    // A second file by the same owner: its sentinel copied over the first.
    alice.store_file("decoy", b"decoy").unwrap();
    let decoy_id = env
        .store
        .ids()
        .unwrap()
        .into_iter()
        .find(|id| {
            *id != real_id
                && env
                    .store
                    .get(id)
                    .unwrap()
                    .is_some_and(|b| Sentinel::from_bytes(&b).is_ok())
        })
        .unwrap();
    let mut forged = Sentinel::from_bytes(&env.store.get(&real_id).unwrap().unwrap()).unwrap();
    let decoy = Sentinel::from_bytes(&env.store.get(&decoy_id).unwrap().unwrap()).unwrap();
    forged.metadata_id = decoy.metadata_id;
    forged.keys = decoy.keys;
    env.store.overwrite(&real_id, forged.to_bytes().unwrap()).unwrap();

    assert!(alice.load_file("real").unwrap_err().is_integrity());
}

#[test]
fn test_swapped_blocks_detected() {
    let env = Deployment::new();
    let alice = env.create("alice");
    alice.store_file("file", b"one").unwrap();

    let before = ids(&env);
    alice.append_file("file", b"two").unwrap();
    let second = *ids(&env).difference(&before).next().unwrap();
    let before = ids(&env);
    alice.append_file("file", b"three").unwrap();
    let third = *ids(&env).difference(&before).next().unwrap();

    assert!(env.store.swap(&second, &third).unwrap());
    assert!(alice.load_file("file").unwrap_err().is_integrity());
}

#[test]
fn test_garbage_user_record() {
    let env = Deployment::new();
    let alice = env.create("alice");
    let before = ids(&env);
    env.create("bob");
    let bob_record = *ids(&env).difference(&before).next().unwrap();

    env.store.overwrite(&bob_record, vec![0xAB; 200]).unwrap();
    assert!(matches!(
        User::login(&env.backend, "bob", common::PASSWORD),
        Err(SfsError::AuthenticationFailure)
    ));
    alice.store_file("unaffected", b"ok").unwrap();
}

// ── Random perturbations ────────────────────────────────────────────────────

fn tamper_action() -> impl Strategy<Value = TamperAction> {
    prop_oneof![
        4 => (any::<usize>(), any::<usize>(), 0u8..8)
            .prop_map(|(target, byte, bit)| TamperAction::FlipBit { target, byte, bit }),
        1 => any::<usize>().prop_map(|target| TamperAction::Delete { target }),
        1 => (any::<usize>(), prop::collection::vec(any::<u8>(), 0..300))
            .prop_map(|(target, garbage)| TamperAction::Overwrite { target, garbage }),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| TamperAction::Swap { a, b }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_single_flip_never_yields_wrong_bytes(target in any::<usize>(), byte in any::<usize>(), bit in 0u8..8) {
        let env = Deployment::new();
        let (alice, bob, expected) = shared_file(&env);

        TamperAction::FlipBit { target, byte, bit }.apply(&env.store).unwrap();
        assert_load_fails_or_exact(&alice, &expected)?;
        assert_load_fails_or_exact(&bob, &expected)?;
    }

    #[test]
    fn prop_perturbations_never_yield_wrong_bytes(actions in prop::collection::vec(tamper_action(), 1..6)) {
        let env = Deployment::new();
        let (alice, bob, expected) = shared_file(&env);

        for action in &actions {
            action.apply(&env.store).unwrap();
        }
        assert_load_fails_or_exact(&alice, &expected)?;
        assert_load_fails_or_exact(&bob, &expected)?;
    }
}
