use poem_openapi::payload::Json;

use crate::api::models::{ErrorDto, JuzDto, JuzListResponseDto, JuzResponseDto};
use crate::domain::{all_juz, juz_info};

pub struct JuzService;

impl JuzService {
    pub fn list(&self) -> JuzListResponseDto {
        JuzListResponseDto::Ok(Json(all_juz().iter().map(JuzDto::from).collect()))
    }

    pub fn get(&self, number: u8) -> JuzResponseDto {
        match juz_info(number) {
            Some(j) => JuzResponseDto::Ok(Json(j.into())),
            None => JuzResponseDto::NotFound(Json(ErrorDto {
                message: format!("Unknown juz {}", number),
            })),
        }
    }
}
