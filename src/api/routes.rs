use std::sync::Arc;

use poem_openapi::{
    OpenApi,
    param::Path,
    payload::{Json, PlainText},
};

use super::TrackerRegistry;
use super::models::{
    EmptyOkResponseDto, JuzListResponseDto, JuzResponseDto, PositionResponseDto,
    ReadingRequestDto, ReadingResponseDto, SavePositionRequestDto, SessionRequestDto,
    SummaryResponseDto,
};
use super::services::{
    health::HealthService,
    juz::JuzService,
    positions::PositionService,
    progress::{JuzAction, ProgressService},
};

pub struct KhatmaApi {
    pub registry: Arc<TrackerRegistry>,
}

#[OpenApi]
impl KhatmaApi {
    #[oai(path = "/health", method = "get")]
    #[tracing::instrument(level = "debug", skip(self))]
    async fn health(&self) -> PlainText<String> {
        HealthService.status_text().await
    }

    // ===== Juz table =====

    /// Boundaries of all 30 juz
    #[oai(path = "/v1/juz", method = "get")]
    async fn list_juz(&self) -> JuzListResponseDto {
        JuzService.list()
    }

    /// Boundaries of one juz
    #[oai(path = "/v1/juz/:juz", method = "get")]
    async fn get_juz(&self, juz: Path<u8>) -> JuzResponseDto {
        JuzService.get(juz.0)
    }

    // ===== Khatma progress =====

    /// Progress summary with streak, pages read and resume positions
    #[oai(path = "/v1/users/:user/khatma", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, user))]
    async fn get_progress(&self, user: Path<String>) -> SummaryResponseDto {
        let tracker = self.registry.tracker_for(&user.0).await;
        ProgressService::new(&tracker).get().await
    }

    /// Flip a juz between done and not done
    #[oai(path = "/v1/users/:user/khatma/juz/:juz/toggle", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, user, juz))]
    async fn toggle_juz(&self, user: Path<String>, juz: Path<u8>) -> SummaryResponseDto {
        let tracker = self.registry.tracker_for(&user.0).await;
        ProgressService::new(&tracker)
            .apply(juz.0, JuzAction::Toggle)
            .await
    }

    /// Mark a juz as done
    #[oai(path = "/v1/users/:user/khatma/juz/:juz", method = "put")]
    #[tracing::instrument(level = "debug", skip(self, user, juz))]
    async fn mark_juz(&self, user: Path<String>, juz: Path<u8>) -> SummaryResponseDto {
        let tracker = self.registry.tracker_for(&user.0).await;
        ProgressService::new(&tracker)
            .apply(juz.0, JuzAction::Mark)
            .await
    }

    /// Mark a juz as not done
    #[oai(path = "/v1/users/:user/khatma/juz/:juz", method = "delete")]
    #[tracing::instrument(level = "debug", skip(self, user, juz))]
    async fn unmark_juz(&self, user: Path<String>, juz: Path<u8>) -> SummaryResponseDto {
        let tracker = self.registry.tracker_for(&user.0).await;
        ProgressService::new(&tracker)
            .apply(juz.0, JuzAction::Unmark)
            .await
    }

    /// Start the next round. Not gated on completion: unfinished progress is discarded.
    #[oai(path = "/v1/users/:user/khatma/rounds", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, user))]
    async fn advance_round(&self, user: Path<String>) -> SummaryResponseDto {
        let tracker = self.registry.tracker_for(&user.0).await;
        ProgressService::new(&tracker).advance_round().await
    }

    /// Wipe progress for the current year
    #[oai(path = "/v1/users/:user/khatma/reset", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, user))]
    async fn reset(&self, user: Path<String>) -> SummaryResponseDto {
        let tracker = self.registry.tracker_for(&user.0).await;
        ProgressService::new(&tracker).reset().await
    }

    /// Record that the completion celebration was shown for this round
    #[oai(path = "/v1/users/:user/khatma/celebration", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, user))]
    async fn celebration_shown(&self, user: Path<String>) -> EmptyOkResponseDto {
        let tracker = self.registry.tracker_for(&user.0).await;
        ProgressService::new(&tracker).celebration_shown().await
    }

    // ===== Resume positions =====

    #[oai(path = "/v1/users/:user/khatma/juz/:juz/position", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, user, juz))]
    async fn get_position(&self, user: Path<String>, juz: Path<u8>) -> PositionResponseDto {
        let tracker = self.registry.tracker_for(&user.0).await;
        PositionService::new(tracker.positions()).get(juz.0).await
    }

    #[oai(path = "/v1/users/:user/khatma/juz/:juz/position", method = "put")]
    #[tracing::instrument(level = "debug", skip(self, user, juz, body))]
    async fn save_position(
        &self,
        user: Path<String>,
        juz: Path<u8>,
        body: Json<SavePositionRequestDto>,
    ) -> PositionResponseDto {
        let tracker = self.registry.tracker_for(&user.0).await;
        PositionService::new(tracker.positions())
            .save(juz.0, body.0.surah, body.0.verse)
            .await
    }

    #[oai(path = "/v1/users/:user/khatma/juz/:juz/position", method = "delete")]
    #[tracing::instrument(level = "debug", skip(self, user, juz))]
    async fn clear_position(&self, user: Path<String>, juz: Path<u8>) -> EmptyOkResponseDto {
        let tracker = self.registry.tracker_for(&user.0).await;
        PositionService::new(tracker.positions()).clear(juz.0).await
    }

    /// Declare which juz the reader is opening from the tracker
    #[oai(path = "/v1/users/:user/khatma/session", method = "put")]
    #[tracing::instrument(level = "debug", skip(self, user, body))]
    async fn start_session(
        &self,
        user: Path<String>,
        body: Json<SessionRequestDto>,
    ) -> EmptyOkResponseDto {
        let tracker = self.registry.tracker_for(&user.0).await;
        PositionService::new(tracker.positions())
            .start_session(body.0.juz)
            .await
    }

    #[oai(path = "/v1/users/:user/khatma/session", method = "delete")]
    #[tracing::instrument(level = "debug", skip(self, user))]
    async fn end_session(&self, user: Path<String>) -> EmptyOkResponseDto {
        let tracker = self.registry.tracker_for(&user.0).await;
        PositionService::new(tracker.positions()).end_session().await
    }

    /// Report the verse currently on screen; saved only for the active session juz
    #[oai(path = "/v1/users/:user/khatma/reading", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, user, body))]
    async fn record_reading(
        &self,
        user: Path<String>,
        body: Json<ReadingRequestDto>,
    ) -> ReadingResponseDto {
        let tracker = self.registry.tracker_for(&user.0).await;
        PositionService::new(tracker.positions())
            .record_reading(body.0.surah, body.0.verse)
            .await
    }
}
