//! Integration tests for user creation and login

mod common;

use ::common::client::{Client, ClientError};
use ::common::datastore::MemoryDatastore;
use ::common::directory::{encrypt_tag, verify_tag, KeyDirectory, PublicKey};
use ::common::location::Location;

#[tokio::test]
async fn test_init_and_get_user() {
    let (client, _) = common::setup_test_env();

    let alice = client.init_user("alice", "hunter2").await.unwrap();
    assert_eq!(alice.name(), "alice");

    let again = client.get_user("alice", "hunter2").await.unwrap();
    assert_eq!(again.name(), "alice");
    assert_eq!(again.verifying_key(), alice.verifying_key());
    assert_eq!(again.encryption_key(), alice.encryption_key());
}

#[tokio::test]
async fn test_public_keys_are_published() {
    let (client, _) = common::setup_test_env();
    let alice = common::new_user(&client, "alice").await;

    let verify = client.directory().lookup(&verify_tag("alice")).await.unwrap();
    assert_eq!(verify, Some(PublicKey::Verifying(alice.verifying_key())));

    let encrypt = client.directory().lookup(&encrypt_tag("alice")).await.unwrap();
    assert_eq!(encrypt, Some(PublicKey::Encryption(alice.encryption_key())));
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user() {
    let (client, _) = common::setup_test_env();
    client.init_user("alice", "hunter2").await.unwrap();

    assert!(matches!(
        client.get_user("alice", "hunter3").await,
        Err(ClientError::AuthenticationFailure)
    ));
    assert!(matches!(
        client.get_user("bob", "hunter2").await,
        Err(ClientError::AuthenticationFailure)
    ));
    assert!(matches!(
        client.get_user("", "").await,
        Err(ClientError::AuthenticationFailure)
    ));
}

#[tokio::test]
async fn test_duplicate_user() {
    let (client, _) = common::setup_test_env();
    client.init_user("alice", "one").await.unwrap();

    assert!(matches!(
        client.init_user("alice", "two").await,
        Err(ClientError::DuplicateUser(name)) if name == "alice"
    ));
    // the first registration is untouched
    assert!(client.get_user("alice", "one").await.is_ok());
    assert!(client.get_user("alice", "two").await.is_err());
}

#[tokio::test]
async fn test_duplicate_user_caught_by_directory() {
    let (client, _) = common::setup_test_env();
    client.init_user("alice", "one").await.unwrap();

    // the user record is gone (wiped datastore) but published keys remain
    let client = Client::new(
        MemoryDatastore::new(),
        client.directory().clone(),
        common::FAST_KDF,
    );
    assert!(matches!(
        client.init_user("alice", "two").await,
        Err(ClientError::DuplicateUser(_))
    ));
}

#[tokio::test]
async fn test_empty_username_rejected() {
    let (client, _) = common::setup_test_env();
    assert!(matches!(
        client.init_user("", "password").await,
        Err(ClientError::InvalidUsername)
    ));
}

#[tokio::test]
async fn test_tampered_user_record() {
    let (client, datastore) = common::setup_test_env();
    client.init_user("alice", "hunter2").await.unwrap();

    let location = Location::from_context(b"alice");
    let mut data = datastore.raw_get(&location).unwrap().to_vec();
    // past the length prefix, inside the ciphertext
    data[10] ^= 1;
    datastore.raw_put(location, data);

    assert!(matches!(
        client.get_user("alice", "hunter2").await,
        Err(ClientError::AuthenticationFailure)
    ));
}

#[tokio::test]
async fn test_two_sessions_stay_coherent() {
    let (client, _) = common::setup_test_env();
    let laptop = client.init_user("alice", "pw").await.unwrap();
    let phone = client.get_user("alice", "pw").await.unwrap();

    laptop.store_file("notes", b"from laptop").await.unwrap();
    assert_eq!(phone.load_file("notes").await.unwrap(), b"from laptop");

    phone.append_to_file("notes", b", and phone").await.unwrap();
    assert_eq!(
        laptop.load_file("notes").await.unwrap(),
        b"from laptop, and phone"
    );
}
