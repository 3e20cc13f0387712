pub mod api;
pub mod clock;
pub mod config;
pub mod domain;
pub mod storage;
pub mod tracker;

pub use tracker::{KhatmaTracker, ResumeStore, TrackerSettings, TrackerSummary};

pub type KhatmaResult<T> = anyhow::Result<T>;
