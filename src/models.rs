use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::render::Rendered;

/// One label/probability pair produced by the model.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub probability: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub request_id: Uuid,
    pub predictions: Vec<Prediction>,
    #[serde(flatten)]
    pub rendered: Rendered,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub request_id: Uuid,
    pub error: String,
    #[serde(flatten)]
    pub rendered: Rendered,
}

/// Body of `POST /classify/data-url`.
#[derive(Debug, Deserialize)]
pub struct DataUrlRequest {
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub labels: usize,
    pub in_flight: usize,
}
