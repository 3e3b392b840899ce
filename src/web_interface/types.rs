use serde::Serialize;

/// API error payload
#[derive(Serialize)]
pub struct ApiError {
    pub message: String,
}

/// One catalog entry as served by `GET /screenshots`.
#[derive(Serialize)]
pub struct ScreenshotEntry {
    pub url: String,
    pub timestamp: String,
}
