use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;

use crate::engine::EngineError;
use crate::ml::{FeatureError, PredictionError};
use crate::types::ErrorResponse;

/// Failure surfaced to HTTP clients as `{"error": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::Internal(_) => Status::InternalServerError,
        }
    }

    pub fn model_not_loaded() -> Self {
        ApiError::Internal("Model not loaded. Please ensure the model file exists.".to_string())
    }

    pub fn engine_not_initialized() -> Self {
        ApiError::Internal("Gemini model not initialized.".to_string())
    }

    pub fn prediction_failed(detail: impl std::fmt::Display) -> Self {
        ApiError::Internal(format!("An error occurred during prediction: {detail}"))
    }
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::Feature(FeatureError::Missing(name)) => ApiError::BadRequest(format!(
                "Missing data for feature: {name}. Please ensure all required fields are provided."
            )),
            other => ApiError::prediction_failed(other),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Internal(format!("Failed to communicate with Gemini API: {err}"))
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).respond_to(req)
    }
}
