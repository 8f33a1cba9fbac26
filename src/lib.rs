// projeto: bilstm_price
// file: src/lib.rs

pub mod api;
pub mod config;
pub mod rna;

pub use config::AppConfig;
pub use rna::{PredictorError, PricePredictor, TrainingConfig};
