//! Self-paced khatma tracker: which juz are done this round, rounds, streak and trial window.
//!
//! Every mutation is applied to a clone of the latest in-memory snapshot under
//! one lock, published to subscribers, then written through to storage.
//! Storage failures are logged and never surfaced; the in-memory state stays
//! authoritative for the running process.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tokio::sync::{Mutex, MutexGuard, watch};
use tokio::task::JoinHandle;

use crate::clock::{Clock, days_between};
use crate::domain::mapping::{parse_iso_date, progress_from_json};
use crate::domain::{JUZ_COUNT, JuzProgress, ResumePosition, TrackerState};
use crate::storage::{
    CELEBRATION_KEY, KeyValueStore, StorageBackend, TRIAL_START_KEY, progress_key,
};

pub mod positions;

pub use positions::ResumeStore;

pub const GUEST_NAMESPACE: &str = "guest";
pub const DEFAULT_TRIAL_DAYS: i64 = 3;

/// Storage namespace for a signed-in user id, or the guest partition.
pub fn namespace_for(user: Option<&str>) -> String {
    match user.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => GUEST_NAMESPACE.to_string(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrackerSettings {
    pub trial_days: i64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            trial_days: DEFAULT_TRIAL_DAYS,
        }
    }
}

/// Snapshot plus everything derived from it, for presentation clients.
#[derive(Debug, Clone)]
pub struct TrackerSummary {
    pub state: TrackerState,
    pub streak_days: u32,
    pub total_pages_read: u32,
    pub trial_expired: bool,
    pub should_celebrate: bool,
    pub active_juz: Option<u8>,
    pub positions: BTreeMap<u8, ResumePosition>,
}

struct Inner {
    namespace: String,
    store: Arc<dyn KeyValueStore>,
    state: TrackerState,
    trial_start: Option<NaiveDate>,
    celebrated_round: Option<u32>,
}

struct Loaded {
    state: TrackerState,
    trial_start: Option<NaiveDate>,
    celebrated_round: Option<u32>,
}

pub struct KhatmaTracker {
    backend: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
    settings: TrackerSettings,
    inner: Mutex<Inner>,
    positions: ResumeStore,
    updates: watch::Sender<TrackerState>,
}

impl KhatmaTracker {
    /// Loads the tracker for `user` (guest when `None`).
    pub async fn load(
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        settings: TrackerSettings,
        user: Option<&str>,
    ) -> Self {
        let namespace = namespace_for(user);
        let store = backend.scoped(&namespace);
        let loaded = load_namespace(store.as_ref(), clock.as_ref()).await;
        let (updates, progress) = watch::channel(loaded.state.clone());
        tracing::debug!(%namespace, juz = loaded.state.completed_juz.len(), "khatma tracker loaded");
        KhatmaTracker {
            positions: ResumeStore::new(store.clone(), progress, clock.clone()),
            inner: Mutex::new(Inner {
                namespace,
                store,
                state: loaded.state,
                trial_start: loaded.trial_start,
                celebrated_round: loaded.celebrated_round,
            }),
            backend,
            clock,
            settings,
            updates,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackerState> {
        self.updates.subscribe()
    }

    pub fn positions(&self) -> &ResumeStore {
        &self.positions
    }

    pub async fn state(&self) -> TrackerState {
        self.lock_current().await.state.clone()
    }

    pub async fn namespace(&self) -> String {
        self.inner.lock().await.namespace.clone()
    }

    /// Rebinds to the partition of `user` and reloads from it, so progress
    /// never leaks between accounts.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn switch_identity(&self, user: Option<&str>) {
        let namespace = namespace_for(user);
        let store = self.backend.scoped(&namespace);
        let loaded = load_namespace(store.as_ref(), self.clock.as_ref()).await;

        let mut inner = self.inner.lock().await;
        self.positions.rebind(store.clone()).await;
        *inner = Inner {
            namespace,
            store,
            state: loaded.state,
            trial_start: loaded.trial_start,
            celebrated_round: loaded.celebrated_round,
        };
        self.updates.send_replace(inner.state.clone());
        tracing::info!(namespace = %inner.namespace, "khatma tracker switched identity");
    }

    /// Reloads on every identity change published on `identity`.
    pub fn follow_identity(
        self: &Arc<Self>,
        mut identity: watch::Receiver<Option<String>>,
    ) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            while identity.changed().await.is_ok() {
                let user = identity.borrow_and_update().clone();
                tracker.switch_identity(user.as_deref()).await;
            }
        })
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn mark(&self, juz: u8) -> TrackerState {
        let today = self.clock.today();
        let (_inner, state, changed) = self.update(|s| s.mark(juz, today)).await;
        if changed {
            self.positions.clear(juz).await;
        }
        state
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn unmark(&self, juz: u8) -> TrackerState {
        let today = self.clock.today();
        self.update(|s| s.unmark(juz, today)).await.1
    }

    /// Flips one juz; what interactive clients call.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn toggle(&self, juz: u8) -> TrackerState {
        let today = self.clock.today();
        let (_inner, state, changed) = self.update(|s| s.toggle(juz, today)).await;
        if changed && state.contains(juz) {
            self.positions.clear(juz).await;
        }
        state
    }

    /// Starts the next round *whatever the current progress*: this is
    /// reset-and-advance, not complete-and-advance. Partial progress is lost.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn advance_round(&self) -> TrackerState {
        let now_ms = self.clock.now().timestamp_millis();
        let (_inner, state, _) = self
            .update(|s| {
                s.advance_round(now_ms);
                true
            })
            .await;
        self.positions.clear_all().await;
        tracing::info!(round = state.current_round, "khatma round advanced");
        state
    }

    /// Back to the initial state for the same year.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn reset(&self) -> TrackerState {
        let (_inner, state, _) = self
            .update(|s| {
                s.reset();
                true
            })
            .await;
        self.positions.clear_all().await;
        tracing::info!("khatma tracker reset");
        state
    }

    pub async fn juz_progress(&self, juz: u8) -> JuzProgress {
        self.lock_current().await.state.juz_progress(juz)
    }

    pub async fn total_pages_read(&self) -> u32 {
        self.lock_current().await.state.total_pages_read()
    }

    pub async fn streak_days(&self) -> u32 {
        let today = self.clock.today();
        self.lock_current().await.state.streak_days(today)
    }

    pub async fn is_trial_expired(&self) -> bool {
        let inner = self.lock_current().await;
        self.trial_expired(inner.trial_start)
    }

    fn trial_expired(&self, trial_start: Option<NaiveDate>) -> bool {
        trial_start.is_some_and(|start| {
            days_between(start, self.clock.today()) >= self.settings.trial_days
        })
    }

    /// True once per finished round, until `mark_celebration_shown` is called.
    pub async fn should_celebrate(&self) -> bool {
        let inner = self.lock_current().await;
        celebrate(&inner)
    }

    pub async fn mark_celebration_shown(&self) {
        let mut inner = self.lock_current().await;
        let round = inner.state.current_round;
        inner.celebrated_round = Some(round);
        if let Err(e) = inner.store.set(CELEBRATION_KEY, &round.to_string()).await {
            tracing::warn!(error = %e, round, "failed to persist celebration marker");
        }
    }

    pub async fn summary(&self) -> TrackerSummary {
        let (state, trial_start, should_celebrate) = {
            let inner = self.lock_current().await;
            (inner.state.clone(), inner.trial_start, celebrate(&inner))
        };
        let mut positions = BTreeMap::new();
        for juz in 1..=JUZ_COUNT {
            if state.contains(juz) {
                continue;
            }
            if let Some(p) = self.positions.get(juz).await {
                positions.insert(juz, p);
            }
        }
        TrackerSummary {
            streak_days: state.streak_days(self.clock.today()),
            total_pages_read: state.total_pages_read(),
            trial_expired: self.trial_expired(trial_start),
            should_celebrate,
            active_juz: self.positions.active_juz().await,
            positions,
            state,
        }
    }

    /// Locks the tracker, first reloading from the record of the current
    /// year when the calendar has moved past the loaded one.
    async fn lock_current(&self) -> MutexGuard<'_, Inner> {
        let mut inner = self.inner.lock().await;
        let year = self.clock.today().year();
        if inner.state.year != year {
            let loaded = load_namespace(inner.store.as_ref(), self.clock.as_ref()).await;
            tracing::info!(
                namespace = %inner.namespace,
                from = inner.state.year,
                to = year,
                "khatma year rolled over"
            );
            inner.state = loaded.state;
            inner.trial_start = loaded.trial_start;
            inner.celebrated_round = loaded.celebrated_round;
            self.updates.send_replace(inner.state.clone());
        }
        inner
    }

    /// Applies `f` to a clone of the current state; commits, publishes and
    /// persists when it reports a change. The guard is handed back so
    /// follow-up position clears happen before anyone else sees the state.
    async fn update<F>(&self, f: F) -> (MutexGuard<'_, Inner>, TrackerState, bool)
    where
        F: FnOnce(&mut TrackerState) -> bool,
    {
        let mut inner = self.lock_current().await;
        let mut next = inner.state.clone();
        if !f(&mut next) {
            return (inner, next, false);
        }
        inner.state = next.clone();
        self.updates.send_replace(next.clone());
        persist(inner.store.as_ref(), &next).await;
        (inner, next, true)
    }
}

fn celebrate(inner: &Inner) -> bool {
    inner.state.is_complete && inner.celebrated_round != Some(inner.state.current_round)
}

async fn persist(store: &dyn KeyValueStore, state: &TrackerState) {
    let raw = match serde_json::to_string(state) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "failed to encode khatma progress");
            return;
        }
    };
    if let Err(e) = store.set(&progress_key(state.year), &raw).await {
        tracing::warn!(error = %e, year = state.year, "failed to persist khatma progress");
    }
}

async fn load_namespace(store: &dyn KeyValueStore, clock: &dyn Clock) -> Loaded {
    let today = clock.today();
    let year = today.year();

    let state = match store.get(&progress_key(year)).await {
        Ok(Some(raw)) => progress_from_json(&raw, year),
        Ok(None) => TrackerState::initial(year),
        Err(e) => {
            tracing::debug!(error = %e, year, "failed to read khatma progress, starting fresh");
            TrackerState::initial(year)
        }
    };

    // An unreadable start counts as missing.
    let trial_start = match store.get(TRIAL_START_KEY).await {
        Ok(Some(raw)) if parse_iso_date(&raw).is_some() => parse_iso_date(&raw),
        Ok(stale) => {
            if let Some(raw) = stale {
                tracing::warn!(%raw, "unreadable trial start, restarting the trial today");
            }
            let raw = today.format("%Y-%m-%d").to_string();
            if let Err(e) = store.set(TRIAL_START_KEY, &raw).await {
                tracing::warn!(error = %e, "failed to persist trial start");
            }
            Some(today)
        }
        Err(e) => {
            tracing::debug!(error = %e, "failed to read trial start");
            None
        }
    };

    let celebrated_round = match store.get(CELEBRATION_KEY).await {
        Ok(raw) => raw.and_then(|r| r.trim().parse::<u32>().ok()),
        Err(e) => {
            tracing::debug!(error = %e, "failed to read celebration marker");
            None
        }
    };

    Loaded {
        state,
        trial_start,
        celebrated_round,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_default_to_guest() {
        assert_eq!(namespace_for(None), GUEST_NAMESPACE);
        assert_eq!(namespace_for(Some("  ")), GUEST_NAMESPACE);
        assert_eq!(namespace_for(Some(" uid-42 ")), "uid-42");
    }
}
