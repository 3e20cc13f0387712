use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{KeyValueStore, StorageBackend};

type Entries = HashMap<(String, String), String>;

/// Process-local backend. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    shared: Arc<Mutex<Entries>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn scoped(&self, namespace: &str) -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore {
            namespace: namespace.to_string(),
            shared: self.shared.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    namespace: String,
    shared: Arc<Mutex<Entries>>,
}

impl MemoryStore {
    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn entry_key(&self, key: &str) -> (String, String) {
        (self.namespace.clone(), key.to_string())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries().get(&self.entry_key(key)).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let entry_key = self.entry_key(key);
        self.entries().insert(entry_key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let entry_key = self.entry_key(key);
        self.entries().remove(&entry_key);
        Ok(())
    }

    async fn list_keys(&self) -> anyhow::Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .entries()
            .keys()
            .filter(|(ns, _)| *ns == self.namespace)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn remove_many(&self, keys: &[String]) -> anyhow::Result<()> {
        let mut entries = self.entries();
        for key in keys {
            entries.remove(&(self.namespace.clone(), key.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn namespaces_are_isolated() -> anyhow::Result<()> {
        let backend = MemoryBackend::new();
        let alice = backend.scoped("alice");
        let bob = backend.scoped("bob");

        alice.set("k", "1").await?;
        assert_eq!(alice.get("k").await?.as_deref(), Some("1"));
        assert_eq!(bob.get("k").await?, None);
        assert!(bob.list_keys().await?.is_empty());

        bob.set("k", "2").await?;
        alice.remove_many(&["k".to_string()]).await?;
        assert_eq!(alice.get("k").await?, None);
        assert_eq!(bob.get("k").await?.as_deref(), Some("2"));
        Ok(())
    }

    #[tokio::test]
    async fn rescoping_sees_earlier_writes() -> anyhow::Result<()> {
        let backend = MemoryBackend::new();
        backend.scoped("alice").set("a", "x").await?;
        backend.scoped("alice").set("b", "y").await?;
        assert_eq!(backend.scoped("alice").list_keys().await?, vec!["a", "b"]);
        backend.scoped("alice").remove("a").await?;
        assert_eq!(backend.scoped("alice").list_keys().await?, vec!["b"]);
        Ok(())
    }
}
