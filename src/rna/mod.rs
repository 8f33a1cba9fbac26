// projeto: bilstm_price
// file: src/rna/mod.rs
// Module declarations for the BiLSTM price predictor

pub mod utils;     // Error type and input checks
pub mod scaler;    // Min-max feature scaling
pub mod data;      // Sliding windows, price files and the synthetic series
pub mod model;     // Stacked bidirectional LSTM network (burn)
pub mod metrics;   // Per-epoch training history and error metrics
pub mod storage;   // Single-file model persistence
pub mod predictor; // PricePredictor: prepare, train, predict, save, load

pub use data::{WindowedDataset, load_prices, synthetic_series};
pub use metrics::{EpochMetrics, TrainingHistory};
pub use model::{PriceModel, PriceModelConfig};
pub use predictor::{DEFAULT_SEQUENCE_LENGTH, InputShape, PricePredictor, TrainBackend, TrainingConfig};
pub use scaler::MinMaxScaler;
pub use storage::{DEFAULT_MODEL_PATH, PersistedModel};
pub use utils::{PredictorError, Result};
