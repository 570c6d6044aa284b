mod acquire;
mod classifier;
mod config;
mod error;
mod gate;
mod handlers;
mod models;
mod page;
mod render;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use crate::classifier::TractClassifier;
use crate::config::Config;
use crate::handlers::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about = "Classify uploaded photos with a pretrained ONNX model")]
struct Args {
    /// TOML config file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long)]
    bind: Option<String>,

    /// Path to the ONNX model
    #[arg(long)]
    model: Option<PathBuf>,

    /// Path to the label file, one label per line
    #[arg(long)]
    labels: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(model) = self.model {
            config.model_path = model;
        }
        if let Some(labels) = self.labels {
            config.labels_path = labels;
        }
        config.validate()?;
        Ok(config)
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config()?;
    let classifier = TractClassifier::load(&config)
        .with_context(|| format!("loading model {}", config.model_path.display()))?;

    let bind = config.bind.clone();
    let max_upload_bytes = config.max_upload_bytes;
    let state = web::Data::new(AppState::new(Arc::new(classifier), config));

    info!("Server running at http://{}", bind);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(handlers::configure(max_upload_bytes))
    })
    .bind(bind.as_str())?
    .run()
    .await?;

    Ok(())
}
