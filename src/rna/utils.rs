// projeto: bilstm_price
// file: src/rna/utils.rs
// Error type shared by the predictor, its persistence and the data helpers

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Insufficient history: need at least {required} price points, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },
    #[error("Model not initialized: {0}")]
    ModelNotInitialized(String),
    #[error("Model file not found: {}", .0.display())]
    PersistedModelMissing(PathBuf),
    #[error("Invalid input shape: {0}")]
    InvalidShape(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid price at index {index}: {value}")]
    InvalidPrice { index: usize, value: f64 },
    #[error("Training error: {0}")]
    Training(String),
    #[error("Scaler has not been fitted")]
    ScalerNotFitted,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Tensor error: {0}")]
    Tensor(String),
}

pub type Result<T> = std::result::Result<T, PredictorError>;

/// Rejects NaN and infinite prices before they reach the scaler.
pub fn ensure_finite(prices: &[f64]) -> Result<()> {
    match prices.iter().position(|p| !p.is_finite()) {
        Some(index) => Err(PredictorError::InvalidPrice { index, value: prices[index] }),
        None => Ok(()),
    }
}
