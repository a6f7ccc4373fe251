//! Integration tests for clients over a durable object store

mod common;

use std::path::Path;

use ::common::client::ClientError;
use ::common::config::{ClientConfig, CONFIG_FILE_NAME};
use ::common::location::Location;
use object_store::ObjectStoreConfig;

fn local_config(path: &Path) -> ClientConfig {
    common::init_tracing();
    ClientConfig {
        kdf: common::FAST_KDF,
        storage: ObjectStoreConfig::Local {
            path: path.to_path_buf(),
        },
    }
}

#[tokio::test]
async fn test_full_flow_on_local_storage() {
    let temp_dir = tempfile::tempdir().unwrap();
    let client = local_config(temp_dir.path()).connect().await.unwrap();

    let alice = client.init_user("alice", "ecila").await.unwrap();
    let bob = client.init_user("bob", "bob-pw").await.unwrap();
    let carol = client.init_user("carol", "lorac").await.unwrap();

    alice.store_file("doc", b"ab").await.unwrap();
    let invite = alice.create_invitation("doc", "bob").await.unwrap();
    bob.accept_invitation("alice", invite, "doc").await.unwrap();
    bob.append_to_file("doc", b"cd").await.unwrap();

    let invite = bob.create_invitation("doc", "carol").await.unwrap();
    carol.accept_invitation("bob", invite, "shared").await.unwrap();
    assert_eq!(carol.load_file("shared").await.unwrap(), b"abcd");

    alice.revoke_access("doc", "bob").await.unwrap();
    assert!(bob.load_file("doc").await.is_err());
    assert!(carol.load_file("shared").await.is_err());

    alice.append_to_file("doc", b"ef").await.unwrap();
    assert_eq!(alice.load_file("doc").await.unwrap(), b"abcdef");
}

#[tokio::test]
async fn test_state_survives_reconnect() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = local_config(temp_dir.path());

    {
        let client = config.connect().await.unwrap();
        let alice = client.init_user("alice", "ecila").await.unwrap();
        client.init_user("bob", "bob-pw").await.unwrap();
        alice.store_file("doc", b"persisted").await.unwrap();
        let invite = alice.create_invitation("doc", "bob").await.unwrap();
        client
            .get_user("bob", "bob-pw")
            .await
            .unwrap()
            .accept_invitation("alice", invite, "doc")
            .await
            .unwrap();
    }

    let client = config.connect().await.unwrap();
    assert!(matches!(
        client.init_user("alice", "another").await,
        Err(ClientError::DuplicateUser(_))
    ));
    assert!(matches!(
        client.get_user("alice", "wrong").await,
        Err(ClientError::AuthenticationFailure)
    ));

    let bob = client.get_user("bob", "bob-pw").await.unwrap();
    assert_eq!(bob.load_file("doc").await.unwrap(), b"persisted");
}

#[tokio::test]
async fn test_config_file_round_trip() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = local_config(&temp_dir.path().join("data"));
    config
        .save(temp_dir.path().join(CONFIG_FILE_NAME))
        .unwrap();

    let loaded = ClientConfig::load(temp_dir.path()).unwrap();
    assert_eq!(loaded, config);

    let client = loaded.connect().await.unwrap();
    let alice = client.init_user("alice", "ecila").await.unwrap();
    alice.store_file("doc", b"x").await.unwrap();
    assert!(temp_dir.path().join("data").join("records").is_dir());
}

#[tokio::test]
async fn test_tampered_files_on_disk() {
    let temp_dir = tempfile::tempdir().unwrap();
    let client = local_config(temp_dir.path()).connect().await.unwrap();
    let alice = client.init_user("alice", "ecila").await.unwrap();
    alice.store_file("doc", b"on disk").await.unwrap();

    // corrupt everything but the user record
    let user_record = Location::from_context(b"alice").to_string();
    for entry in std::fs::read_dir(temp_dir.path().join("records")).unwrap() {
        let entry = entry.unwrap();
        if entry.file_name().to_string_lossy() != user_record {
            std::fs::write(entry.path(), b"corrupted").unwrap();
        }
    }

    assert!(matches!(
        alice.load_file("doc").await,
        Err(ClientError::Integrity(_))
    ));
    // the user record itself is untouched
    client.get_user("alice", "ecila").await.unwrap();
}
