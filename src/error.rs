use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::{error, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::models::ErrorResponse;
use crate::render::render_error;

pub const NO_FILE_MESSAGE: &str = "Please select a photo first!";

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("no file selected")]
    NoFileSelected,

    #[error("upload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("a classification is already in flight")]
    Busy,

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("failed to read upload: {0}")]
    Upload(String),
}

impl ClassifyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ClassifyError::NoFileSelected
            | ClassifyError::InvalidImage(_)
            | ClassifyError::Upload(_) => StatusCode::BAD_REQUEST,
            ClassifyError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ClassifyError::Busy => StatusCode::TOO_MANY_REQUESTS,
            ClassifyError::ModelLoad(_) | ClassifyError::Inference(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text shown to the user. Internal detail stays in the log.
    pub fn user_message(&self) -> &'static str {
        match self {
            ClassifyError::NoFileSelected => NO_FILE_MESSAGE,
            ClassifyError::TooLarge { .. } => "The selected photo is too large.",
            ClassifyError::InvalidImage(_) => "The selected file is not a readable image.",
            ClassifyError::Busy => "Another photo is still being classified. Please wait.",
            ClassifyError::ModelLoad(_) => "The classification model could not be loaded.",
            ClassifyError::Inference(_) => "Classification failed. Please try again.",
            ClassifyError::Upload(_) => "The upload could not be read.",
        }
    }
}

/// A [`ClassifyError`] tied to the request that hit it.
#[derive(Debug, Error)]
#[error("request {request_id}: {source}")]
pub struct RequestError {
    pub request_id: Uuid,
    #[source]
    pub source: ClassifyError,
}

impl RequestError {
    pub fn new(request_id: Uuid, source: ClassifyError) -> Self {
        if source.status().is_server_error() {
            error!("[{}] {}", request_id, source);
        } else {
            warn!("[{}] {}", request_id, source);
        }
        Self { request_id, source }
    }
}

impl ResponseError for RequestError {
    fn status_code(&self) -> StatusCode {
        self.source.status()
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.source.user_message();
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            request_id: self.request_id,
            error: message.to_string(),
            rendered: render_error(message),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_map_to_client_statuses() {
        assert_eq!(ClassifyError::NoFileSelected.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ClassifyError::InvalidImage("truncated".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ClassifyError::TooLarge { size: 11, limit: 10 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(ClassifyError::Busy.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn model_failures_are_server_errors_with_generic_message() {
        let err = ClassifyError::Inference("shape mismatch [1, 1000]".into());

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.user_message().contains("shape"));
    }

    #[test]
    fn no_file_message_matches_page_alert() {
        assert_eq!(
            ClassifyError::NoFileSelected.user_message(),
            "Please select a photo first!"
        );
    }
}
