// projeto: bilstm_price
// file: src/rna/data.rs
// Price series loading, sliding windows and the synthetic demo series

use std::fs;
use std::path::Path;

use log::{info, warn};
use ndarray::{Array1, Array2, s};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::Deserialize;

use crate::rna::utils::{PredictorError, Result, ensure_finite};

/// Sliding windows over a scaled series: row `i` of `inputs` is
/// `scaled[i..i + L]` and `targets[i]` is `scaled[i + L]`.
#[derive(Debug, Clone)]
pub struct WindowedDataset {
    pub inputs: Array2<f32>,
    pub targets: Array1<f32>,
}

impl WindowedDataset {
    pub fn from_scaled(scaled: &[f64], sequence_length: usize) -> Result<Self> {
        if sequence_length == 0 {
            return Err(PredictorError::InvalidShape("sequence length must be positive".into()));
        }
        if scaled.len() <= sequence_length {
            return Err(PredictorError::InsufficientHistory {
                required: sequence_length + 1,
                actual: scaled.len(),
            });
        }

        let n_samples = scaled.len() - sequence_length;
        let series = Array1::from_iter(scaled.iter().map(|&v| v as f32));
        let mut inputs = Array2::zeros((n_samples, sequence_length));
        for i in 0..n_samples {
            inputs.row_mut(i).assign(&series.slice(s![i..i + sequence_length]));
        }
        let targets = series.slice(s![sequence_length..]).to_owned();

        Ok(Self { inputs, targets })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn sequence_length(&self) -> usize {
        self.inputs.ncols()
    }

    /// Number of leading samples kept for training when the trailing
    /// `validation_split` fraction is held out.
    pub fn train_len(&self, validation_split: f64) -> usize {
        ((self.len() as f64) * (1.0 - validation_split)).floor() as usize
    }

    /// Flattens the selected rows into `(inputs, targets)` buffers in the order
    /// given by `indices`.
    pub fn gather(&self, indices: &[usize]) -> (Vec<f32>, Vec<f32>) {
        let mut inputs = Vec::with_capacity(indices.len() * self.sequence_length());
        let mut targets = Vec::with_capacity(indices.len());
        for &i in indices {
            inputs.extend(self.inputs.row(i).iter().copied());
            targets.push(self.targets[i]);
        }
        (inputs, targets)
    }
}

#[derive(Debug, Deserialize)]
struct PriceRecord {
    closing: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceFile {
    Plain(Vec<f64>),
    Series { prices: Vec<f64> },
    Records { records: Vec<PriceRecord> },
}

impl PriceFile {
    fn into_prices(self) -> Vec<f64> {
        match self {
            PriceFile::Plain(prices) | PriceFile::Series { prices } => prices,
            PriceFile::Records { records } => records.into_iter().map(|r| r.closing).collect(),
        }
    }
}

/// Reads a chronological price series from a `.json` or `.toml` file.
pub fn load_prices(path: &Path) -> Result<Vec<f64>> {
    info!("📥 Loading prices from {}", path.display());
    let content = fs::read_to_string(path)?;

    let file: PriceFile = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content)
            .map_err(|e| PredictorError::Serialization(format!("Failed to parse {}: {}", path.display(), e)))?,
        Some("json") => serde_json::from_str(&content)
            .map_err(|e| PredictorError::Serialization(format!("Failed to parse {}: {}", path.display(), e)))?,
        other => {
            return Err(PredictorError::InvalidConfig(format!(
                "unsupported price file extension {:?} (expected json or toml)",
                other.unwrap_or("")
            )));
        }
    };

    let prices = file.into_prices();
    if prices.is_empty() {
        warn!("⚠️ Price file {} holds no prices", path.display());
    }
    ensure_finite(&prices)?;
    info!("📊 Loaded {} prices", prices.len());
    Ok(prices)
}

/// `100 + sin(i / 10) * 10 + N(0, 2)`, reproducible for a given seed.
pub fn synthetic_series(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 2.0).expect("constant standard deviation is positive");
    (0..len)
        .map(|i| 100.0 + (i as f64 / 10.0).sin() * 10.0 + noise.sample(&mut rng))
        .collect()
}
