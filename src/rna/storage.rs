// projeto: bilstm_price
// file: src/rna/storage.rs
// Single-file persistence: architecture, scaler and burn weights in one bincode container

use std::fs;
use std::path::Path;

use burn::{
    module::Module,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
    tensor::backend::Backend,
};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};

use crate::rna::model::{PriceModel, PriceModelConfig};
use crate::rna::scaler::MinMaxScaler;
use crate::rna::utils::{PredictorError, Result};

pub const DEFAULT_MODEL_PATH: &str = "bilstm_price_model.h5";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureRecord {
    pub input_features: usize,
    pub recurrent_widths: Vec<usize>,
    pub dropout: f64,
    pub dense_width: usize,
}

impl From<&PriceModelConfig> for ArchitectureRecord {
    fn from(config: &PriceModelConfig) -> Self {
        Self {
            input_features: config.input_features,
            recurrent_widths: config.recurrent_widths.clone(),
            dropout: config.dropout,
            dense_width: config.dense_width,
        }
    }
}

impl From<&ArchitectureRecord> for PriceModelConfig {
    fn from(record: &ArchitectureRecord) -> Self {
        PriceModelConfig::new()
            .with_input_features(record.input_features)
            .with_recurrent_widths(record.recurrent_widths.clone())
            .with_dropout(record.dropout)
            .with_dense_width(record.dense_width)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedModel {
    pub format_version: u32,
    pub sequence_length: usize,
    pub architecture: ArchitectureRecord,
    pub scaler: Option<MinMaxScaler>,
    pub saved_at: String,
    pub weights: Vec<u8>,
}

impl PersistedModel {
    pub fn from_model<B: Backend>(
        model: &PriceModel<B>,
        config: &PriceModelConfig,
        sequence_length: usize,
        scaler: Option<&MinMaxScaler>,
    ) -> Result<Self> {
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        let weights = Recorder::<B>::record(&recorder, model.clone().into_record(), ())
            .map_err(|e| PredictorError::Persistence(format!("Failed to record weights: {:?}", e)))?;

        Ok(Self {
            format_version: FORMAT_VERSION,
            sequence_length,
            architecture: ArchitectureRecord::from(config),
            scaler: scaler.cloned(),
            saved_at: Utc::now().to_rfc3339(),
            weights,
        })
    }

    pub fn model_config(&self) -> PriceModelConfig {
        PriceModelConfig::from(&self.architecture)
    }

    /// Rebuilds the architecture and loads the recorded parameters into it.
    pub fn to_model<B: Backend>(&self, device: &B::Device) -> Result<PriceModel<B>> {
        let config = self.model_config();
        config.validate().map_err(PredictorError::InvalidShape)?;

        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        let record = Recorder::<B>::load(&recorder, self.weights.clone(), device)
            .map_err(|e| PredictorError::Persistence(format!("Failed to load weights: {:?}", e)))?;
        Ok(config.init::<B>(device).load_record(record))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| PredictorError::Serialization(format!("Failed to encode model: {}", e)))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        info!("💾 Model saved to {}", path.display());
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PredictorError::PersistedModelMissing(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        let (persisted, _): (PersistedModel, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                .map_err(|e| PredictorError::Serialization(format!("Failed to decode {}: {}", path.display(), e)))?;

        if persisted.format_version != FORMAT_VERSION {
            return Err(PredictorError::Persistence(format!(
                "Unsupported model format version {} (expected {})",
                persisted.format_version, FORMAT_VERSION
            )));
        }
        info!("📂 Model loaded from {} (saved at {})", path.display(), persisted.saved_at);
        Ok(persisted)
    }
}
