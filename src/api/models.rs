use chrono::NaiveDate;
use poem_openapi::{ApiResponse, Enum, Object, payload::Json};

use crate::domain::{Juz, ResumePosition, RoundStatus};
use crate::tracker::TrackerSummary;

#[derive(Debug, Clone, Object)]
pub struct ErrorDto {
    /// Human-readable error message
    pub message: String,
}

impl From<String> for ErrorDto {
    fn from(message: String) -> Self {
        ErrorDto { message }
    }
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct JuzDto {
    pub number: u8,
    pub start_surah: u16,
    pub start_verse: u16,
    pub end_surah: u16,
    pub end_verse: u16,
    pub start_page: u16,
    pub end_page: u16,
    pub total_pages: u16,
}

impl From<&Juz> for JuzDto {
    fn from(j: &Juz) -> Self {
        JuzDto {
            number: j.number,
            start_surah: j.start_surah,
            start_verse: j.start_verse,
            end_surah: j.end_surah,
            end_verse: j.end_verse,
            start_page: j.start_page,
            end_page: j.end_page,
            total_pages: j.total_pages,
        }
    }
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct ResumePositionDto {
    pub juz: u8,
    pub surah: u16,
    pub verse: u16,
    /// Epoch milliseconds of the last save
    pub timestamp: i64,
}

impl ResumePositionDto {
    pub fn new(juz: u8, p: ResumePosition) -> Self {
        ResumePositionDto {
            juz,
            surah: p.surah,
            verse: p.verse,
            timestamp: p.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
#[oai(rename_all = "snake_case")]
pub enum RoundStatusDto {
    InProgress,
    RoundComplete,
}

impl From<RoundStatus> for RoundStatusDto {
    fn from(status: RoundStatus) -> Self {
        match status {
            RoundStatus::InProgress => RoundStatusDto::InProgress,
            RoundStatus::RoundComplete => RoundStatusDto::RoundComplete,
        }
    }
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct KhatmaSummaryDto {
    pub status: RoundStatusDto,
    /// Completed juz numbers, ascending
    pub completed_juz: Vec<u8>,
    pub year: i32,
    pub is_complete: bool,
    pub last_progress_date: Option<NaiveDate>,
    pub current_round: u32,
    /// Epoch milliseconds of each finished round
    pub completed_rounds: Vec<i64>,
    pub streak_count: u32,
    /// Live streak relative to today
    pub streak_days: u32,
    pub total_pages_read: u32,
    pub trial_expired: bool,
    pub should_celebrate: bool,
    pub active_juz: Option<u8>,
    pub positions: Vec<ResumePositionDto>,
}

impl From<TrackerSummary> for KhatmaSummaryDto {
    fn from(s: TrackerSummary) -> Self {
        KhatmaSummaryDto {
            status: s.state.status().into(),
            completed_juz: s.state.completed_juz.iter().copied().collect(),
            year: s.state.year,
            is_complete: s.state.is_complete,
            last_progress_date: s.state.last_progress_date,
            current_round: s.state.current_round,
            completed_rounds: s.state.completed_rounds,
            streak_count: s.state.streak_count,
            streak_days: s.streak_days,
            total_pages_read: s.total_pages_read,
            trial_expired: s.trial_expired,
            should_celebrate: s.should_celebrate,
            active_juz: s.active_juz,
            positions: s
                .positions
                .into_iter()
                .map(|(juz, p)| ResumePositionDto::new(juz, p))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct SavePositionRequestDto {
    pub surah: u16,
    pub verse: u16,
}

#[derive(Debug, Clone, Object)]
pub struct SessionRequestDto {
    pub juz: u8,
}

#[derive(Debug, Clone, Object)]
pub struct ReadingRequestDto {
    pub surah: u16,
    pub verse: u16,
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct ReadingResultDto {
    /// Juz whose resume position was written, if any
    pub recorded_juz: Option<u8>,
}

#[derive(ApiResponse)]
pub enum JuzListResponseDto {
    /// All 30 juz
    #[oai(status = 200)]
    Ok(Json<Vec<JuzDto>>),
}

#[derive(ApiResponse)]
pub enum JuzResponseDto {
    /// Juz boundaries
    #[oai(status = 200)]
    Ok(Json<JuzDto>),

    /// No such juz
    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum SummaryResponseDto {
    /// Current khatma progress
    #[oai(status = 200)]
    Ok(Json<KhatmaSummaryDto>),

    /// Juz number out of range
    #[oai(status = 400)]
    BadRequest(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum PositionResponseDto {
    /// Stored resume position
    #[oai(status = 200)]
    Ok(Json<ResumePositionDto>),

    /// Juz number out of range
    #[oai(status = 400)]
    BadRequest(Json<ErrorDto>),

    /// Nothing stored for this juz
    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum EmptyOkResponseDto {
    /// Done
    #[oai(status = 200)]
    Ok,

    /// Invalid input
    #[oai(status = 400)]
    BadRequest(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum ReadingResponseDto {
    /// Whether a position was recorded
    #[oai(status = 200)]
    Ok(Json<ReadingResultDto>),
}
