use poem_openapi::payload::PlainText;

pub struct HealthService;

impl HealthService {
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn status_text(&self) -> PlainText<String> {
        PlainText(format!("khatma_tracker version={}", env!("CARGO_PKG_VERSION")))
    }
}
