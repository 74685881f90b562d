//! Sharing, receiving and revocation across several users.

mod common;

use common::{share, Deployment};
use sfs_client::CapabilityToken;
use sfs_core::SfsError;

#[test]
fn test_share_and_receive() {
    let env = Deployment::new();
    let alice = env.create("alice");
    let bob = env.create("bob");

    alice.store_file("doc", b"draft").unwrap();
    let token = alice.share_file("doc", "bob").unwrap();
    bob.receive_file("my copy", "alice", &token).unwrap();

    assert_eq!(bob.load_file("my copy").unwrap(), b"draft");

    bob.append_file("my copy", b" + bob's edits").unwrap();
    assert_eq!(alice.load_file("doc").unwrap(), b"draft + bob's edits");

    bob.store_file("my copy", b"rewritten by bob").unwrap();
    assert_eq!(alice.load_file("doc").unwrap(), b"rewritten by bob");
}

#[test]
fn test_share_with_unknown_user() {
    let env = Deployment::new();
    let alice = env.create("alice");
    alice.store_file("doc", b"x").unwrap();

    assert!(matches!(
        alice.share_file("doc", "nobody"),
        Err(SfsError::NotFound(_))
    ));
    assert!(matches!(
        alice.share_file("missing", "alice"),
        Err(SfsError::AccessDenied(_))
    ));
}

#[test]
fn test_token_for_someone_else() {
    let env = Deployment::new();
    let alice = env.create("alice");
    env.create("bob");
    let carol = env.create("carol");

    alice.store_file("doc", b"for bob only").unwrap();
    let token = alice.share_file("doc", "bob").unwrap();

    let err = carol.receive_file("doc", "alice", &token).unwrap_err();
    assert!(err.is_integrity());
    assert!(matches!(carol.load_file("doc"), Err(SfsError::AccessDenied(_))));
}

#[test]
fn test_token_from_wrong_sender() {
    let env = Deployment::new();
    let alice = env.create("alice");
    let bob = env.create("bob");
    env.create("mallory");

    alice.store_file("doc", b"x").unwrap();
    let token = alice.share_file("doc", "bob").unwrap();

    assert!(bob.receive_file("doc", "mallory", &token).unwrap_err().is_integrity());
    assert!(matches!(
        bob.receive_file("doc", "ghost", &token),
        Err(SfsError::NotFound(_))
    ));
}

#[test]
fn test_tampered_token() {
    let env = Deployment::new();
    let alice = env.create("alice");
    let bob = env.create("bob");

    alice.store_file("doc", b"x").unwrap();
    let mut bytes = alice.share_file("doc", "bob").unwrap().to_bytes();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x80;

    let token = CapabilityToken::from_bytes(&bytes).unwrap();
    assert!(bob.receive_file("doc", "alice", &token).unwrap_err().is_integrity());
}

#[test]
fn test_receive_onto_existing_name() {
    let env = Deployment::new();
    let alice = env.create("alice");
    let bob = env.create("bob");

    alice.store_file("doc", b"alice's").unwrap();
    bob.store_file("doc", b"bob's").unwrap();
    let token = alice.share_file("doc", "bob").unwrap();

    assert!(matches!(
        bob.receive_file("doc", "alice", &token),
        Err(SfsError::AlreadyExists(_))
    ));
    assert_eq!(bob.load_file("doc").unwrap(), b"bob's");
}

#[test]
fn test_token_travels_as_text() {
    let env = Deployment::new();
    let alice = env.create("alice");
    let bob = env.create("bob");

    alice.store_file("doc", b"over the wire").unwrap();
    let text = alice.share_file("doc", "bob").unwrap().to_base64();

    let token = CapabilityToken::from_base64(&format!("{text}\n")).unwrap();
    bob.receive_file("doc", "alice", &token).unwrap();
    assert_eq!(bob.load_file("doc").unwrap(), b"over the wire");
}

#[test]
fn test_resharing_existing_member_reissues_token() {
    let env = Deployment::new();
    let alice = env.create("alice");
    let bob = env.create("bob");

    alice.store_file("doc", b"x").unwrap();
    alice.share_file("doc", "bob").unwrap();
    let again = alice.share_file("doc", "bob").unwrap();

    bob.receive_file("doc", "alice", &again).unwrap();
    assert_eq!(bob.load_file("doc").unwrap(), b"x");
}

// ── Revocation ──────────────────────────────────────────────────────────────

/// A shares with B and C; B reshares with D and E; E reshares with F.
/// Revoking B removes B, D, E and F; A and C keep access.
#[test]
fn test_revoke_removes_subtree() {
    let env = Deployment::new();
    let [a, b, c, d, e, f] = ["a", "b", "c", "d", "e", "f"].map(|name| env.create(name));

    a.store_file("file", b"v1").unwrap();
    share(&a, &b, "file");
    share(&a, &c, "file");
    share(&b, &d, "file");
    share(&b, &e, "file");
    share(&e, &f, "file");
    for user in [&a, &b, &c, &d, &e, &f] {
        assert_eq!(user.load_file("file").unwrap(), b"v1");
    }

    let stale = b.share_file("file", "e").unwrap();
    a.revoke_file("file", "b").unwrap();
    a.append_file("file", b" v2").unwrap();

    for user in [&a, &c] {
        assert_eq!(user.load_file("file").unwrap(), b"v1 v2");
    }
    for user in [&b, &d, &e, &f] {
        assert!(user.load_file("file").is_err(), "{} kept access", user.username());
        assert!(matches!(user.load_file("file"), Err(SfsError::AccessDenied(_))));
    }

    // A token issued before revocation still points at the rebuilt sentinel.
    e.receive_file("again", "b", &stale).unwrap();
    assert!(e.load_file("again").is_err());
}

#[test]
fn test_surviving_members_keep_writing() {
    let env = Deployment::new();
    let [a, b, c] = ["a", "b", "c"].map(|name| env.create(name));

    a.store_file("file", b"start").unwrap();
    share(&a, &b, "file");
    share(&a, &c, "file");
    a.revoke_file("file", "b").unwrap();

    c.append_file("file", b"+c").unwrap();
    assert_eq!(a.load_file("file").unwrap(), b"start+c");
    assert!(b.append_file("file", b"+b").is_err());
}

#[test]
fn test_revoke_permissions() {
    let env = Deployment::new();
    let [a, b, c] = ["a", "b", "c"].map(|name| env.create(name));

    a.store_file("file", b"x").unwrap();
    share(&a, &b, "file");
    share(&b, &c, "file");

    assert!(matches!(
        b.revoke_file("file", "c"),
        Err(SfsError::AuthorizationFailure(_))
    ));
    assert!(matches!(
        a.revoke_file("file", "a"),
        Err(SfsError::AuthorizationFailure(_))
    ));
    assert!(matches!(
        a.revoke_file("file", "stranger"),
        Err(SfsError::AccessDenied(_))
    ));

    a.revoke_file("file", "c").unwrap();
    assert!(matches!(
        a.revoke_file("file", "c"),
        Err(SfsError::AccessDenied(_))
    ));
    assert_eq!(b.load_file("file").unwrap(), b"x");
}

#[test]
fn test_reshare_after_revoke_restores_access() {
    let env = Deployment::new();
    let [a, b] = ["a", "b"].map(|name| env.create(name));

    a.store_file("file", b"secret").unwrap();
    share(&a, &b, "file");
    a.revoke_file("file", "b").unwrap();

    // After revocation the pointer is gone too; a new share works again.
    assert!(b.load_file("file").is_err());
    share(&a, &b, "file");
    assert_eq!(b.load_file("file").unwrap(), b"secret");
}
