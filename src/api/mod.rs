use std::collections::HashMap;
use std::sync::Arc;

use poem::{
    Endpoint, EndpointExt, Route,
    middleware::{Cors, Tracing as PoemTracing},
};
use poem_openapi::OpenApiService;
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::storage::StorageBackend;
use crate::tracker::{KhatmaTracker, TrackerSettings, namespace_for};

pub mod models;
pub mod routes;
pub mod services;

pub use routes::KhatmaApi;

/// One tracker per storage namespace, so spellings of a user id that resolve
/// to the same namespace share a tracker.
pub struct TrackerRegistry {
    backend: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
    settings: TrackerSettings,
    trackers: Mutex<HashMap<String, Arc<KhatmaTracker>>>,
}

impl TrackerRegistry {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            backend,
            clock,
            settings,
            trackers: Mutex::new(HashMap::new()),
        }
    }

    pub async fn tracker_for(&self, user: &str) -> Arc<KhatmaTracker> {
        let namespace = namespace_for(Some(user));
        let mut trackers = self.trackers.lock().await;
        if let Some(tracker) = trackers.get(&namespace) {
            return tracker.clone();
        }
        let tracker = Arc::new(
            KhatmaTracker::load(
                self.backend.clone(),
                self.clock.clone(),
                self.settings,
                Some(&namespace),
            )
            .await,
        );
        trackers.insert(namespace, tracker.clone());
        tracker
    }
}

/// The full HTTP app: API at `/`, RapiDoc at `/ui`, OpenAPI document at `/spec`.
pub fn app(registry: Arc<TrackerRegistry>, server_url: String) -> impl Endpoint {
    let version = env!("CARGO_PKG_VERSION");
    let api_service = OpenApiService::new(KhatmaApi { registry }, "Khatma Tracker API", version)
        .server(server_url);
    let ui = api_service.rapidoc();
    let spec = api_service.spec();
    Route::new()
        .nest("/", api_service)
        .nest("/ui", ui)
        .nest("/spec", poem::endpoint::make_sync(move |_| spec.clone()))
        .with(Cors::new())
        .with(PoemTracing)
}
