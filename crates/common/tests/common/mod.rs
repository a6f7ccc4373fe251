//! Shared test utilities for client integration tests
#![allow(dead_code)]

use common::client::{Client, User};
use common::crypto::KdfParams;
use common::datastore::MemoryDatastore;
use common::directory::MemoryKeyDirectory;
use tracing_subscriber::EnvFilter;

pub type TestClient = Client<MemoryDatastore, MemoryKeyDirectory>;
pub type TestUser = User<MemoryDatastore, MemoryKeyDirectory>;

/// Argon2 parameters cheap enough for tests
pub const FAST_KDF: KdfParams = KdfParams {
    mem_cost_kib: 64,
    time_cost: 1,
    parallelism: 1,
};

/// Log to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Set up a client over fresh in-memory collaborators. The returned
/// datastore handle shares state with the client, for tampering.
pub fn setup_test_env() -> (TestClient, MemoryDatastore) {
    init_tracing();
    let datastore = MemoryDatastore::new();
    let client = Client::new(datastore.clone(), MemoryKeyDirectory::new(), FAST_KDF);
    (client, datastore)
}

/// Create a user whose password is their name reversed.
pub async fn new_user(client: &TestClient, name: &str) -> TestUser {
    client
        .init_user(name, &name.chars().rev().collect::<String>())
        .await
        .unwrap()
}

/// Share `filename` from `sender` to `recipient`, accepted as `as_name`.
pub async fn share(sender: &TestUser, recipient: &TestUser, filename: &str, as_name: &str) {
    let invite = sender
        .create_invitation(filename, recipient.name())
        .await
        .unwrap();
    recipient
        .accept_invitation(sender.name(), invite, as_name)
        .await
        .unwrap();
}
