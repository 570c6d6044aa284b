use actix_multipart::Multipart;
use actix_web::error::JsonPayloadError;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::acquire::{self, ImageHandle, SelectedFile};
use crate::classifier::Classifier;
use crate::config::Config;
use crate::error::{ClassifyError, RequestError};
use crate::gate::InferenceGate;
use crate::models::{ClassifyResponse, DataUrlRequest, HealthResponse, Prediction};
use crate::page;
use crate::render::render;

/// Shared across workers. The classifier is read-only after start-up.
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
    pub gate: InferenceGate,
    pub config: Config,
}

impl AppState {
    pub fn new(classifier: Arc<dyn Classifier>, config: Config) -> Self {
        Self {
            classifier,
            gate: InferenceGate::new(config.max_in_flight),
            config,
        }
    }
}

/// Registers the routes. JSON bodies are capped to fit a base64 data URL of
/// `max_upload_bytes` plus its envelope.
pub fn configure(max_upload_bytes: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(json_config(max_upload_bytes))
            .service(web::resource("/").route(web::get().to(index)))
            .service(web::resource("/health").route(web::get().to(health)))
            .service(web::resource("/classify").route(web::post().to(classify)))
            .service(web::resource("/classify/data-url").route(web::post().to(classify_data_url)));
    }
}

fn json_config(max_upload_bytes: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(max_upload_bytes / 3 * 4 + 4096)
        .error_handler(json_error)
}

/// Body errors go out in the same shape as every other classify error.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let source = match err {
        JsonPayloadError::OverflowKnownLength { length, limit } => ClassifyError::TooLarge {
            size: length,
            limit,
        },
        JsonPayloadError::Overflow { limit } => ClassifyError::TooLarge { size: limit, limit },
        other => ClassifyError::Upload(other.to_string()),
    };
    RequestError::new(Uuid::new_v4(), source).into()
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page::INDEX_HTML)
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        model: state.config.model_path.display().to_string(),
        labels: state.classifier.label_count(),
        in_flight: state.gate.in_flight(),
    })
}

pub async fn classify(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, RequestError> {
    let request_id = Uuid::new_v4();

    let outcome = async {
        let _permit = state.gate.try_acquire().ok_or(ClassifyError::Busy)?;
        let file = acquire::read_first_file(payload, state.config.max_upload_bytes).await?;
        run_pipeline(&state, request_id, file).await
    }
    .await;

    respond(request_id, outcome)
}

pub async fn classify_data_url(
    state: web::Data<AppState>,
    body: web::Json<DataUrlRequest>,
) -> Result<HttpResponse, RequestError> {
    let request_id = Uuid::new_v4();

    let outcome = async {
        let _permit = state.gate.try_acquire().ok_or(ClassifyError::Busy)?;
        let url = body.into_inner().image.unwrap_or_default();
        let file = acquire::parse_data_url(&url, state.config.max_upload_bytes)?;
        run_pipeline(&state, request_id, file).await
    }
    .await;

    respond(request_id, outcome)
}

/// Decode then classify, each on the blocking pool, strictly in that order.
async fn run_pipeline(
    state: &AppState,
    request_id: Uuid,
    file: SelectedFile,
) -> Result<Vec<Prediction>, ClassifyError> {
    info!(
        "[{}] Received {} ({} bytes, {})",
        request_id,
        file.file_name.as_deref().unwrap_or("data URL"),
        file.len(),
        file.mime.as_deref().unwrap_or("unknown type")
    );

    let image = web::block(move || ImageHandle::decode(&file))
        .await
        .map_err(|e| ClassifyError::Inference(e.to_string()))??;
    info!(
        "[{}] Decoded image {}x{}",
        request_id,
        image.width(),
        image.height()
    );

    let classifier = Arc::clone(&state.classifier);
    let predictions = web::block(move || classifier.classify(&image))
        .await
        .map_err(|e| ClassifyError::Inference(e.to_string()))??;
    info!("[{}] {} predictions", request_id, predictions.len());

    Ok(predictions)
}

fn respond(
    request_id: Uuid,
    outcome: Result<Vec<Prediction>, ClassifyError>,
) -> Result<HttpResponse, RequestError> {
    let predictions = outcome.map_err(|e| RequestError::new(request_id, e))?;
    let rendered = render(Some(predictions.as_slice()));
    Ok(HttpResponse::Ok().json(ClassifyResponse {
        request_id,
        predictions,
        rendered,
    }))
}
