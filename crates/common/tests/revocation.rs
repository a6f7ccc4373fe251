//! Integration tests for revoking shared access

mod common;

use ::common::client::ClientError;

fn lost_access<T: std::fmt::Debug>(result: Result<T, ClientError>) -> bool {
    matches!(
        result,
        Err(ClientError::NotFound(_)) | Err(ClientError::Integrity(_))
    )
}

#[tokio::test]
async fn test_alice_and_bob() {
    let (client, _) = common::setup_test_env();
    let alice = common::new_user(&client, "alice").await;
    let bob = common::new_user(&client, "bob").await;

    alice.store_file("file", b"ab").await.unwrap();
    alice.append_to_file("file", b"cd").await.unwrap();
    assert_eq!(alice.load_file("file").await.unwrap(), b"abcd");

    common::share(&alice, &bob, "file", "file").await;
    bob.append_to_file("file", b"ef").await.unwrap();
    assert_eq!(alice.load_file("file").await.unwrap(), b"abcdef");

    alice.revoke_access("file", "bob").await.unwrap();
    assert!(lost_access(bob.load_file("file").await));
    assert!(lost_access(bob.append_to_file("file", b"!!").await));

    alice.append_to_file("file", b"gh").await.unwrap();
    assert_eq!(alice.load_file("file").await.unwrap(), b"abcdefgh");
}

#[tokio::test]
async fn test_revocation_cascades_through_subshares() {
    let (client, _) = common::setup_test_env();
    let alice = common::new_user(&client, "alice").await;
    let bob = common::new_user(&client, "bob").await;
    let carol = common::new_user(&client, "carol").await;
    let dave = common::new_user(&client, "dave").await;
    let erin = common::new_user(&client, "erin").await;

    alice.store_file("doc", b"v1").await.unwrap();
    common::share(&alice, &bob, "doc", "doc").await;
    common::share(&bob, &carol, "doc", "doc").await;
    common::share(&alice, &dave, "doc", "doc").await;
    common::share(&dave, &erin, "doc", "doc").await;

    alice.revoke_access("doc", "bob").await.unwrap();

    assert!(lost_access(bob.load_file("doc").await));
    assert!(lost_access(carol.load_file("doc").await));
    assert!(lost_access(carol.append_to_file("doc", b"x").await));

    alice.append_to_file("doc", b"+alice").await.unwrap();
    erin.append_to_file("doc", b"+erin").await.unwrap();
    for user in [&alice, &dave, &erin] {
        assert_eq!(user.load_file("doc").await.unwrap(), b"v1+alice+erin");
    }

    // dave can still share onwards after the re-key
    let frank = common::new_user(&client, "frank").await;
    common::share(&dave, &frank, "doc", "doc").await;
    assert_eq!(frank.load_file("doc").await.unwrap(), b"v1+alice+erin");
}

#[tokio::test]
async fn test_revoked_invitation_cannot_be_accepted() {
    let (client, _) = common::setup_test_env();
    let alice = common::new_user(&client, "alice").await;
    let bob = common::new_user(&client, "bob").await;
    let carol = common::new_user(&client, "carol").await;

    alice.store_file("doc", b"x").await.unwrap();
    common::share(&alice, &bob, "doc", "doc").await;
    let pending = bob.create_invitation("doc", "carol").await.unwrap();

    // never accepted
    let unaccepted = alice.create_invitation("doc", "carol").await.unwrap();
    alice.revoke_access("doc", "carol").await.unwrap();
    assert!(matches!(
        carol.accept_invitation("alice", unaccepted, "doc").await,
        Err(ClientError::NotFound(_))
    ));

    // carol's pending invite from bob dies with bob's subtree
    alice.revoke_access("doc", "bob").await.unwrap();
    assert!(matches!(
        carol.accept_invitation("bob", pending, "doc").await,
        Err(ClientError::NotFound(_))
    ));
    assert!(lost_access(bob.create_invitation("doc", "carol").await));
}

#[tokio::test]
async fn test_revoke_errors() {
    let (client, _) = common::setup_test_env();
    let alice = common::new_user(&client, "alice").await;
    let bob = common::new_user(&client, "bob").await;
    let carol = common::new_user(&client, "carol").await;

    alice.store_file("doc", b"x").await.unwrap();

    // no shares at all
    assert!(matches!(
        alice.revoke_access("doc", "bob").await,
        Err(ClientError::NotShared(_))
    ));
    assert!(matches!(
        alice.revoke_access("nope", "bob").await,
        Err(ClientError::NotFound(_))
    ));

    common::share(&alice, &bob, "doc", "doc").await;
    common::share(&bob, &carol, "doc", "doc").await;

    // carol is bob's share, not alice's
    assert!(matches!(
        alice.revoke_access("doc", "carol").await,
        Err(ClientError::NotShared(_))
    ));
    // only the owner revokes
    assert!(matches!(
        bob.revoke_access("doc", "carol").await,
        Err(ClientError::NotOwner(name)) if name == "doc"
    ));
    assert_eq!(carol.load_file("doc").await.unwrap(), b"x");

    alice.revoke_access("doc", "bob").await.unwrap();
    assert!(matches!(
        alice.revoke_access("doc", "bob").await,
        Err(ClientError::NotShared(_))
    ));
}

#[tokio::test]
async fn test_double_invite_is_revoked_together() {
    let (client, _) = common::setup_test_env();
    let alice = common::new_user(&client, "alice").await;
    let bob = common::new_user(&client, "bob").await;

    alice.store_file("doc", b"x").await.unwrap();
    common::share(&alice, &bob, "doc", "first").await;
    common::share(&alice, &bob, "doc", "second").await;

    alice.revoke_access("doc", "bob").await.unwrap();
    assert!(lost_access(bob.load_file("first").await));
    assert!(lost_access(bob.load_file("second").await));
}

#[tokio::test]
async fn test_reshare_after_revoke() {
    let (client, _) = common::setup_test_env();
    let alice = common::new_user(&client, "alice").await;
    let bob = common::new_user(&client, "bob").await;

    alice.store_file("doc", b"v1").await.unwrap();
    common::share(&alice, &bob, "doc", "doc").await;
    alice.revoke_access("doc", "bob").await.unwrap();
    alice.append_to_file("doc", b"+v2").await.unwrap();

    // re-accepting under the same name replaces the dead pointer
    let invite = alice.create_invitation("doc", "bob").await.unwrap();
    bob.accept_invitation("alice", invite, "doc").await.unwrap();
    assert_eq!(bob.load_file("doc").await.unwrap(), b"v1+v2");

    bob.append_to_file("doc", b"+bob").await.unwrap();
    assert_eq!(alice.load_file("doc").await.unwrap(), b"v1+v2+bob");
}

#[tokio::test]
async fn test_revoked_user_can_reuse_filename() {
    let (client, _) = common::setup_test_env();
    let alice = common::new_user(&client, "alice").await;
    let bob = common::new_user(&client, "bob").await;

    alice.store_file("doc", b"alice's").await.unwrap();
    common::share(&alice, &bob, "doc", "doc").await;
    alice.revoke_access("doc", "bob").await.unwrap();

    bob.store_file("doc", b"bob's own").await.unwrap();
    assert_eq!(bob.load_file("doc").await.unwrap(), b"bob's own");
    assert_eq!(alice.load_file("doc").await.unwrap(), b"alice's");
}
