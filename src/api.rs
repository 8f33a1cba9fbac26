// projeto: bilstm_price
// file: src/api.rs
// HTTP surface: POST /predict and POST /train over one shared predictor

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, ResponseError, http::StatusCode, web};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::{AppConfig, ServerSection};
use crate::rna::predictor::{PricePredictor, TrainingConfig};
use crate::rna::utils::PredictorError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Predictor(#[from] PredictorError),
    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Predictor(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(rename = "productId", default)]
    pub product_id: Value,
    #[serde(default)]
    pub prices: Option<Vec<f64>>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    #[serde(rename = "productId")]
    pub product_id: Value,
    #[serde(rename = "predictedPrice")]
    pub predicted_price: f64,
}

#[derive(Debug, Deserialize)]
pub struct TrainRequest {
    #[serde(default)]
    pub prices: Option<Vec<f64>>,
}

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub success: bool,
    pub message: String,
}

/// Everything the handlers share. The predictor is locked for the whole of a
/// predict or train call.
pub struct ApiState {
    predictor: Mutex<PricePredictor>,
    training: TrainingConfig,
    model_path: PathBuf,
    limits: ServerSection,
}

impl ApiState {
    pub fn new(predictor: PricePredictor, training: TrainingConfig, model_path: PathBuf, limits: ServerSection) -> Self {
        Self { predictor: Mutex::new(predictor), training, model_path, limits }
    }

    /// Builds the predictor from `config` and tries to load the persisted model.
    pub fn from_config(config: &AppConfig) -> Result<Self, PredictorError> {
        config.validate()?;
        let mut predictor: PricePredictor = PricePredictor::new(config.predictor.sequence_length)?;
        match predictor.load(&config.predictor.model_path) {
            Ok(()) => info!("✅ Pre-trained model loaded from {}", config.predictor.model_path.display()),
            Err(PredictorError::PersistedModelMissing(_)) => {
                warn!("⚠️ No pre-trained model found. Train a model first.")
            }
            Err(e) => warn!("⚠️ Could not load {}: {}. Train a model first.", config.predictor.model_path.display(), e),
        }
        Ok(Self::new(
            predictor,
            config.training.clone(),
            config.predictor.model_path.clone(),
            config.server.clone(),
        ))
    }

    /// A panic while the lock was held leaves the predictor half-updated, so
    /// it is reset and the lock is made usable again.
    fn lock_predictor(&self) -> Result<MutexGuard<'_, PricePredictor>, ApiError> {
        Ok(self.predictor.lock().unwrap_or_else(|poisoned| {
            error!("❌ A request panicked while holding the predictor; resetting it");
            let mut predictor = poisoned.into_inner();
            predictor.reset();
            self.predictor.clear_poison();
            predictor
        }))
    }
}

fn require_prices(prices: Option<Vec<f64>>, minimum: usize, what: &str) -> Result<Vec<f64>, ApiError> {
    match prices {
        Some(prices) if prices.len() >= minimum => Ok(prices),
        _ => Err(ApiError::BadRequest(format!("Need at least {minimum} {what}"))),
    }
}

async fn predict(state: web::Data<ApiState>, body: web::Json<PredictRequest>) -> Result<HttpResponse, ApiError> {
    let PredictRequest { product_id, prices } = body.into_inner();
    let prices = require_prices(prices, state.limits.min_predict_prices, "historical prices")?;

    let worker = state.clone();
    let predicted_price = web::block(move || -> Result<f64, ApiError> {
        Ok(worker.lock_predictor()?.predict(&prices)?)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .inspect_err(|e| error!("❌ Prediction failed: {}", e))?;

    Ok(HttpResponse::Ok().json(PredictResponse { product_id, predicted_price }))
}

async fn train(state: web::Data<ApiState>, body: web::Json<TrainRequest>) -> Result<HttpResponse, ApiError> {
    let prices = require_prices(body.into_inner().prices, state.limits.min_train_prices, "prices for training")?;

    let worker = state.clone();
    web::block(move || -> Result<(), ApiError> {
        let mut predictor = worker.lock_predictor()?;
        let history = predictor.train(&prices, &worker.training)?;
        if let Some(last) = history.last() {
            info!("🏁 Final epoch {}: loss={:.6}", last.epoch, last.loss);
        }
        predictor.save(&worker.model_path)?;
        Ok(())
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .inspect_err(|e| error!("❌ Training failed: {}", e))?;

    Ok(HttpResponse::Ok().json(TrainResponse {
        success: true,
        message: "Model trained successfully".to_string(),
    }))
}

/// Registers the routes and a JSON extractor that answers malformed bodies
/// with `{"error": ..}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(16 * 1024 * 1024)
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .route("/predict", web::post().to(predict))
    .route("/train", web::post().to(train));
}

/// Cross-origin access for browser front-ends: any origin, method and header.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

pub async fn serve(state: ApiState, host: &str, port: u16) -> std::io::Result<()> {
    let state = web::Data::new(state);
    info!("🌐 Serving on http://{}:{}", host, port);
    HttpServer::new(move || App::new().app_data(state.clone()).wrap(cors()).configure(configure))
        .bind((host, port))?
        .run()
        .await
}
