//! Shared fixtures: an in-memory deployment with cheap credential parameters.

#![allow(dead_code)]

use std::sync::Arc;

use sfs_client::{Backend, User};
use sfs_core::config::{CryptoConfig, LoggingConfig};
use sfs_core::logging::init_logging;
use sfs_storage::{MemoryBlobStore, MemoryDirectory};

pub const PASSWORD: &str = "correct horse battery staple";

pub struct Deployment {
    pub store: Arc<MemoryBlobStore>,
    pub directory: Arc<MemoryDirectory>,
    pub backend: Backend,
}

impl Deployment {
    pub fn new() -> Self {
        init_logging(&LoggingConfig {
            level: "warn".into(),
            ..Default::default()
        });

        let store = Arc::new(MemoryBlobStore::new());
        let directory = Arc::new(MemoryDirectory::new());
        let backend = Backend::from_config(store.clone(), directory.clone(), &cheap_params());
        Self {
            store,
            directory,
            backend,
        }
    }

    pub fn create(&self, username: &str) -> User {
        User::create(&self.backend, username, PASSWORD).unwrap()
    }

    pub fn login(&self, username: &str) -> User {
        User::login(&self.backend, username, PASSWORD).unwrap()
    }
}

pub fn cheap_params() -> CryptoConfig {
    CryptoConfig {
        argon2_mem_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        identifier_hash_rounds: 32,
    }
}

/// `sender` shares `filename` with `recipient`, who receives it under the same name.
pub fn share(sender: &User, recipient: &User, filename: &str) {
    let token = sender.share_file(filename, recipient.username()).unwrap();
    recipient
        .receive_file(filename, sender.username(), &token)
        .unwrap();
}
