use poem_openapi::payload::Json;

use super::check_juz;
use crate::api::models::{
    EmptyOkResponseDto, ErrorDto, PositionResponseDto, ReadingResponseDto, ReadingResultDto,
    ResumePositionDto,
};
use crate::tracker::ResumeStore;

pub struct PositionService<'a> {
    pub positions: &'a ResumeStore,
}

impl<'a> PositionService<'a> {
    pub fn new(positions: &'a ResumeStore) -> Self {
        Self { positions }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get(&self, juz: u8) -> PositionResponseDto {
        let juz = match check_juz(juz) {
            Ok(juz) => juz,
            Err(e) => return PositionResponseDto::BadRequest(e),
        };
        match self.positions.get(juz).await {
            Some(p) => PositionResponseDto::Ok(Json(ResumePositionDto::new(juz, p))),
            None => PositionResponseDto::NotFound(Json(ErrorDto {
                message: format!("No resume position for juz {}", juz),
            })),
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn save(&self, juz: u8, surah: u16, verse: u16) -> PositionResponseDto {
        let juz = match check_juz(juz) {
            Ok(juz) => juz,
            Err(e) => return PositionResponseDto::BadRequest(e),
        };
        if !self.positions.save(juz, surah, verse).await {
            return PositionResponseDto::BadRequest(Json(ErrorDto {
                message: format!("Juz {} is already complete or the position could not be saved", juz),
            }));
        }
        self.get(juz).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn clear(&self, juz: u8) -> EmptyOkResponseDto {
        match check_juz(juz) {
            Ok(juz) => {
                self.positions.clear(juz).await;
                EmptyOkResponseDto::Ok
            }
            Err(e) => EmptyOkResponseDto::BadRequest(e),
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn start_session(&self, juz: u8) -> EmptyOkResponseDto {
        match check_juz(juz) {
            Ok(juz) => {
                self.positions.start_session(juz).await;
                EmptyOkResponseDto::Ok
            }
            Err(e) => EmptyOkResponseDto::BadRequest(e),
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn end_session(&self) -> EmptyOkResponseDto {
        self.positions.end_session().await;
        EmptyOkResponseDto::Ok
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn record_reading(&self, surah: u16, verse: u16) -> ReadingResponseDto {
        let recorded_juz = self.positions.record_reading(surah, verse).await;
        ReadingResponseDto::Ok(Json(ReadingResultDto { recorded_juz }))
    }
}
