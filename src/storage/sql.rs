use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use entities::kv_entry;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::OnConflict,
};

use super::{KeyValueStore, StorageBackend};

/// sea-orm backed storage over the `kv_entries` table.
#[derive(Debug, Clone)]
pub struct SqlBackend {
    db: Arc<DatabaseConnection>,
}

impl SqlBackend {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl StorageBackend for SqlBackend {
    fn scoped(&self, namespace: &str) -> Arc<dyn KeyValueStore> {
        Arc::new(SqlStore {
            db: self.db.clone(),
            namespace: namespace.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SqlStore {
    db: Arc<DatabaseConnection>,
    namespace: String,
}

#[async_trait::async_trait]
impl KeyValueStore for SqlStore {
    #[tracing::instrument(level = "debug", skip(self), fields(namespace = %self.namespace))]
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = kv_entry::Entity::find_by_id((self.namespace.clone(), key.to_string()))
            .one(self.db.as_ref())
            .await
            .with_context(|| format!("Failed to read key {}", key))?;
        Ok(row.map(|m| m.value))
    }

    #[tracing::instrument(level = "debug", skip(self, value), fields(namespace = %self.namespace))]
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let model = kv_entry::ActiveModel {
            namespace: Set(self.namespace.clone()),
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(Utc::now()),
        };
        kv_entry::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([kv_entry::Column::Namespace, kv_entry::Column::Key])
                    .update_columns([kv_entry::Column::Value, kv_entry::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(self.db.as_ref())
            .await
            .with_context(|| format!("Failed to write key {}", key))?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), fields(namespace = %self.namespace))]
    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        kv_entry::Entity::delete_many()
            .filter(kv_entry::Column::Namespace.eq(self.namespace.as_str()))
            .filter(kv_entry::Column::Key.eq(key))
            .exec(self.db.as_ref())
            .await
            .with_context(|| format!("Failed to remove key {}", key))?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), fields(namespace = %self.namespace))]
    async fn list_keys(&self) -> anyhow::Result<Vec<String>> {
        let keys = kv_entry::Entity::find()
            .filter(kv_entry::Column::Namespace.eq(self.namespace.as_str()))
            .select_only()
            .column(kv_entry::Column::Key)
            .order_by_asc(kv_entry::Column::Key)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .context("Failed to list keys")?;
        Ok(keys)
    }

    #[tracing::instrument(level = "debug", skip(self), fields(namespace = %self.namespace))]
    async fn remove_many(&self, keys: &[String]) -> anyhow::Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        kv_entry::Entity::delete_many()
            .filter(kv_entry::Column::Namespace.eq(self.namespace.as_str()))
            .filter(kv_entry::Column::Key.is_in(keys.iter().cloned()))
            .exec(self.db.as_ref())
            .await
            .with_context(|| format!("Failed to remove {} keys", keys.len()))?;
        Ok(())
    }
}
