pub mod health;
pub mod juz;
pub mod positions;
pub mod progress;

use poem_openapi::payload::Json;

use super::models::ErrorDto;
use crate::domain::juz::is_valid_juz;

fn check_juz(juz: u8) -> Result<u8, Json<ErrorDto>> {
    if is_valid_juz(juz as i64) {
        Ok(juz)
    } else {
        Err(Json(ErrorDto {
            message: format!("Juz must be between 1 and 30, got {}", juz),
        }))
    }
}
