use poem_openapi::payload::Json;

use super::check_juz;
use crate::api::models::{EmptyOkResponseDto, SummaryResponseDto};
use crate::tracker::KhatmaTracker;

pub struct ProgressService<'a> {
    pub tracker: &'a KhatmaTracker,
}

pub enum JuzAction {
    Mark,
    Unmark,
    Toggle,
}

impl<'a> ProgressService<'a> {
    pub fn new(tracker: &'a KhatmaTracker) -> Self {
        Self { tracker }
    }

    async fn summary(&self) -> SummaryResponseDto {
        SummaryResponseDto::Ok(Json(self.tracker.summary().await.into()))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get(&self) -> SummaryResponseDto {
        self.summary().await
    }

    #[tracing::instrument(level = "debug", skip(self, action))]
    pub async fn apply(&self, juz: u8, action: JuzAction) -> SummaryResponseDto {
        let juz = match check_juz(juz) {
            Ok(juz) => juz,
            Err(e) => return SummaryResponseDto::BadRequest(e),
        };
        match action {
            JuzAction::Mark => self.tracker.mark(juz).await,
            JuzAction::Unmark => self.tracker.unmark(juz).await,
            JuzAction::Toggle => self.tracker.toggle(juz).await,
        };
        self.summary().await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn advance_round(&self) -> SummaryResponseDto {
        self.tracker.advance_round().await;
        self.summary().await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn reset(&self) -> SummaryResponseDto {
        self.tracker.reset().await;
        self.summary().await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn celebration_shown(&self) -> EmptyOkResponseDto {
        self.tracker.mark_celebration_shown().await;
        EmptyOkResponseDto::Ok
    }
}
