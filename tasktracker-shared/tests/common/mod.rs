//! Shared fixtures for the service integration tests

#![allow(dead_code)]

use std::sync::Arc;

use tasktracker_shared::auth::password::{HashParams, PasswordPolicy};
use tasktracker_shared::services::{AccountService, AccountSettings, ReportService, TaskService};
use tasktracker_shared::store::MemoryStore;
use uuid::Uuid;

pub const PASSWORD: &str = "Corr3ct!Horse";

/// Cheap Argon2 parameters so tests stay fast
pub fn fast_settings() -> AccountSettings {
    AccountSettings {
        password_policy: PasswordPolicy::default(),
        hash_params: HashParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        ..Default::default()
    }
}

/// All three services over one in-memory store
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub accounts: AccountService,
    pub tasks: TaskService,
    pub reports: ReportService,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            accounts: AccountService::new(store.clone(), store.clone(), fast_settings()),
            tasks: TaskService::new(store.clone()),
            reports: ReportService::new(store.clone(), store.clone()),
            store,
        }
    }

    /// Registers a user with [`PASSWORD`] and returns their id
    pub async fn user(&self, email: &str) -> Uuid {
        self.accounts
            .register(email, PASSWORD, "Test User")
            .await
            .expect("registration should succeed")
    }
}
