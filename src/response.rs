use actix_web::http::StatusCode;
use serde::Serialize;
use utoipa::ToSchema;

/// Envelope for single-resource responses: `{"data": ...}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Envelope for every error response: `{"error": "...", "code": 400}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, status: StatusCode) -> Self {
        Self {
            error: error.into(),
            code: status.as_u16(),
        }
    }
}
