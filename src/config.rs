// projeto: bilstm_price
// file: src/config.rs
// TOML application settings: predictor, training and HTTP server sections

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::rna::predictor::{DEFAULT_SEQUENCE_LENGTH, TrainingConfig};
use crate::rna::storage::DEFAULT_MODEL_PATH;
use crate::rna::utils::{PredictorError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorSection {
    pub sequence_length: usize,
    pub model_path: PathBuf,
}

impl Default for PredictorSection {
    fn default() -> Self {
        Self {
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Minimum `prices` length accepted by `POST /predict`.
    pub min_predict_prices: usize,
    /// Minimum `prices` length accepted by `POST /train`.
    pub min_train_prices: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            min_predict_prices: 60,
            min_train_prices: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub predictor: PredictorSection,
    pub training: TrainingConfig,
    pub server: ServerSection,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        info!("⚙️ Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| PredictorError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the window length and lifts the HTTP minimums so a request that
    /// passes validation always carries enough history.
    pub fn override_sequence_length(&mut self, sequence_length: usize) {
        self.predictor.sequence_length = sequence_length;
        self.server.min_predict_prices = self.server.min_predict_prices.max(sequence_length);
        self.server.min_train_prices = self.server.min_train_prices.max(sequence_length + 1);
    }

    pub fn validate(&self) -> Result<()> {
        if self.predictor.sequence_length == 0 {
            return Err(PredictorError::InvalidConfig("predictor.sequence_length must be positive".into()));
        }
        if self.server.min_predict_prices < self.predictor.sequence_length {
            return Err(PredictorError::InvalidConfig(format!(
                "server.min_predict_prices ({}) is below predictor.sequence_length ({})",
                self.server.min_predict_prices, self.predictor.sequence_length
            )));
        }
        if self.server.min_train_prices <= self.predictor.sequence_length {
            return Err(PredictorError::InvalidConfig(format!(
                "server.min_train_prices ({}) must exceed predictor.sequence_length ({})",
                self.server.min_train_prices, self.predictor.sequence_length
            )));
        }
        self.training.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.predictor.sequence_length, 60);
        assert_eq!(config.predictor.model_path, PathBuf::from("bilstm_price_model.h5"));
        assert_eq!(config.training.epochs, 50);
        assert_eq!(config.training.batch_size, 32);
        assert_eq!(config.training.validation_split, 0.2);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml(
            r#"
            [predictor]
            sequence_length = 30

            [training]
            epochs = 5
            shuffle = false

            [server]
            port = 8080
            "#,
        )
        .unwrap();
        assert_eq!(config.predictor.sequence_length, 30);
        assert_eq!(config.training.epochs, 5);
        assert!(!config.training.shuffle);
        assert_eq!(config.training.batch_size, 32);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_toml("[predictor]\nsequence_length = 0").is_err());
        assert!(AppConfig::from_toml("[training]\nvalidation_split = 1.5").is_err());
        assert!(AppConfig::from_toml("[server]\nmin_train_prices = 60").is_err());
        assert!(AppConfig::from_toml("[predictor\n").is_err());
    }

    #[test]
    fn test_sequence_length_override_lifts_minimums() {
        let mut config = AppConfig::default();
        config.override_sequence_length(120);
        assert_eq!(config.predictor.sequence_length, 120);
        assert_eq!(config.server.min_predict_prices, 120);
        assert_eq!(config.server.min_train_prices, 121);
        assert!(config.validate().is_ok());

        let mut config = AppConfig::default();
        config.override_sequence_length(10);
        assert_eq!(config.server.min_predict_prices, 60);
        assert_eq!(config.server.min_train_prices, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("bilstm_price_config_{}.toml", std::process::id()));
        fs::write(&path, "[training]\nepochs = 7\n").unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.training.epochs, 7);
        fs::remove_file(path).ok();

        assert!(matches!(AppConfig::load(Path::new("/no/such/config.toml")), Err(PredictorError::Io(_))));
    }
}
