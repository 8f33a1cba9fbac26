// projeto: bilstm_price
// file: src/rna/metrics.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f64,
    pub mae: f64,
    pub val_loss: Option<f64>,
    pub val_mae: Option<f64>,
}

/// Per-epoch record of one `train` call. Losses are in scaled units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
    pub train_samples: usize,
    pub val_samples: usize,
    pub started_at: String,
    pub training_time: f64,
}

impl TrainingHistory {
    pub fn new(train_samples: usize, val_samples: usize, started_at: String) -> Self {
        Self {
            epochs: Vec::new(),
            train_samples,
            val_samples,
            started_at,
            training_time: 0.0,
        }
    }

    pub fn push(&mut self, metrics: EpochMetrics) {
        self.epochs.push(metrics);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    pub fn loss(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.loss).collect()
    }

    pub fn val_loss(&self) -> Vec<f64> {
        self.epochs.iter().filter_map(|m| m.val_loss).collect()
    }

    /// Epoch with the lowest validation loss, or training loss when nothing was held out.
    pub fn best_epoch(&self) -> Option<&EpochMetrics> {
        let key = |m: &EpochMetrics| m.val_loss.unwrap_or(m.loss);
        self.epochs.iter().min_by(|a, b| key(a).total_cmp(&key(b)))
    }
}

pub fn mean_squared_error(predictions: &[f32], targets: &[f32]) -> f64 {
    let n = predictions.len().max(1) as f64;
    predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (*p as f64 - *t as f64).powi(2))
        .sum::<f64>()
        / n
}

pub fn mean_absolute_error(predictions: &[f32], targets: &[f32]) -> f64 {
    let n = predictions.len().max(1) as f64;
    predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (*p as f64 - *t as f64).abs())
        .sum::<f64>()
        / n
}
