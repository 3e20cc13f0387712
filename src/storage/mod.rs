// Key-value persistence, partitioned per identity; sqlite and in-memory implementations

use std::sync::Arc;

pub mod memory;
pub mod sql;

pub use memory::MemoryBackend;
pub use sql::SqlBackend;

pub const POSITION_KEY_PREFIX: &str = "khatma_juz_position_";
pub const TRIAL_START_KEY: &str = "khatma_trial_start";
pub const CELEBRATION_KEY: &str = "khatma_celebration_shown_round";

pub fn progress_key(year: i32) -> String {
    format!("khatma_progress_{}", year)
}

pub fn position_key(juz: u8) -> String {
    format!("{}{}", POSITION_KEY_PREFIX, juz)
}

/// Opaque string blobs under string keys, as seen by one identity.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
    async fn list_keys(&self) -> anyhow::Result<Vec<String>>;
    async fn remove_many(&self, keys: &[String]) -> anyhow::Result<()>;
}

/// Hands out the store for a namespace. Namespaces never see each other's keys.
pub trait StorageBackend: Send + Sync {
    fn scoped(&self, namespace: &str) -> Arc<dyn KeyValueStore>;
}
