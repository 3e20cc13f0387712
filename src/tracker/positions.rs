use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use crate::clock::Clock;
use crate::domain::mapping::position_from_json;
use crate::domain::{ResumePosition, TrackerState, juz_info};
use crate::storage::{KeyValueStore, POSITION_KEY_PREFIX, position_key};

/// Per-juz resume positions plus the in-memory "reading for the tracker" session.
///
/// Several juz share a surah (1 to 3 all sit in Al-Baqarah), so a position is
/// only written for the juz the reader explicitly opened from the tracker.
/// Completed juz never get one: writes are checked against `progress` while
/// holding the store lock, the same lock the tracker clears under.
pub struct ResumeStore {
    store: Mutex<Arc<dyn KeyValueStore>>,
    active: Mutex<Option<u8>>,
    progress: watch::Receiver<TrackerState>,
    clock: Arc<dyn Clock>,
}

impl ResumeStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        progress: watch::Receiver<TrackerState>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            active: Mutex::new(None),
            progress,
            clock,
        }
    }

    /// Points the store at another namespace and drops any active session.
    pub(crate) async fn rebind(&self, store: Arc<dyn KeyValueStore>) {
        *self.store.lock().await = store;
        *self.active.lock().await = None;
    }

    fn is_completed(&self, juz: u8) -> bool {
        self.progress.borrow().contains(juz)
    }

    /// Declares `juz` as the one being read. Replaces any previous session.
    pub async fn start_session(&self, juz: u8) -> bool {
        if juz_info(juz).is_none() {
            tracing::debug!(juz, "ignoring session for unknown juz");
            return false;
        }
        *self.active.lock().await = Some(juz);
        true
    }

    pub async fn end_session(&self) {
        *self.active.lock().await = None;
    }

    pub async fn active_juz(&self) -> Option<u8> {
        *self.active.lock().await
    }

    /// Upserts the position for `juz`. Returns false when nothing was
    /// written: unknown juz, juz already completed, or a storage failure.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn save(&self, juz: u8, surah: u16, verse: u16) -> bool {
        if juz_info(juz).is_none() {
            return false;
        }
        let store = self.store.lock().await;
        if self.is_completed(juz) {
            tracing::debug!(juz, "juz already completed, not saving a position");
            return false;
        }
        let position = ResumePosition {
            surah,
            verse,
            timestamp: self.clock.now().timestamp_millis(),
        };
        let raw = match serde_json::to_string(&position) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode resume position");
                return false;
            }
        };
        match store.set(&position_key(juz), &raw).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, juz, "failed to save resume position");
                false
            }
        }
    }

    pub async fn get(&self, juz: u8) -> Option<ResumePosition> {
        let store = self.store.lock().await;
        match store.get(&position_key(juz)).await {
            Ok(raw) => raw.as_deref().and_then(position_from_json),
            Err(e) => {
                tracing::debug!(error = %e, juz, "failed to read resume position");
                None
            }
        }
    }

    pub async fn clear(&self, juz: u8) {
        let store = self.store.lock().await;
        if let Err(e) = store.remove(&position_key(juz)).await {
            tracing::warn!(error = %e, juz, "failed to clear resume position");
        }
    }

    /// Removes every stored position in the current namespace.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn clear_all(&self) {
        let store = self.store.lock().await;
        let keys = match store.list_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list resume positions");
                return;
            }
        };
        let doomed: Vec<String> = keys
            .into_iter()
            .filter(|k| k.starts_with(POSITION_KEY_PREFIX))
            .collect();
        if let Err(e) = store.remove_many(&doomed).await {
            tracing::warn!(error = %e, count = doomed.len(), "failed to clear resume positions");
        }
    }

    /// Saves `surah:verse` for the active juz when it lies inside that juz.
    /// Returns the juz written to, if any.
    pub async fn record_reading(&self, surah: u16, verse: u16) -> Option<u8> {
        let juz = self.active_juz().await?;
        let info = juz_info(juz)?;
        if !info.contains(surah, verse) {
            tracing::debug!(juz, surah, verse, "reading position outside active juz");
            return None;
        }
        self.save(juz, surah, verse).await.then_some(juz)
    }
}
