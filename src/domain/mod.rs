pub mod juz;
pub mod mapping;
pub mod models;

pub use juz::{JUZ_COUNT, Juz, all_juz, juz_info};
pub use models::{JuzProgress, ResumePosition, RoundStatus, TrackerState};
