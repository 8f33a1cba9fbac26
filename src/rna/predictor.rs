// projeto: bilstm_price
// file: src/rna/predictor.rs
// PricePredictor: scaler + BiLSTM model with prepare/train/predict/save/load

use std::path::Path;
use std::time::Instant;

use burn::{
    backend::{Autodiff, NdArray},
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{Adam, AdamConfig, GradientsParams, Optimizer, adaptor::OptimizerAdaptor},
    tensor::{ElementConversion, Tensor, TensorData, backend::{AutodiffBackend, Backend}},
};
use chrono::Utc;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::rna::data::WindowedDataset;
use crate::rna::metrics::{EpochMetrics, TrainingHistory, mean_absolute_error, mean_squared_error};
use crate::rna::model::{PriceModel, PriceModelConfig};
use crate::rna::scaler::MinMaxScaler;
use crate::rna::storage::PersistedModel;
use crate::rna::utils::{PredictorError, Result, ensure_finite};

pub type TrainBackend = Autodiff<NdArray<f32>>;

pub const DEFAULT_SEQUENCE_LENGTH: usize = 60;

/// `(sequence_length, features)` of one input window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputShape {
    pub sequence_length: usize,
    pub features: usize,
}

impl InputShape {
    pub fn new(sequence_length: usize, features: usize) -> Self {
        Self { sequence_length, features }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub validation_split: f64,
    pub learning_rate: f64,
    pub seed: u64,
    pub shuffle: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            batch_size: 32,
            validation_split: 0.2,
            learning_rate: 1e-3,
            seed: 42,
            shuffle: true,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(PredictorError::InvalidConfig("epochs must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(PredictorError::InvalidConfig("batch_size must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(PredictorError::InvalidConfig(format!(
                "validation_split must lie in [0, 1), got {}",
                self.validation_split
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(PredictorError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Next-value price predictor over a fixed-length window of past prices.
///
/// The model is absent until [`build`](Self::build), [`train`](Self::train) or
/// [`load`](Self::load). The scaler is fitted only by training; `load` restores
/// it when the file carries scaler state.
pub struct PricePredictor<B: AutodiffBackend = TrainBackend> {
    sequence_length: usize,
    scaler: MinMaxScaler,
    model: Option<PriceModel<B>>,
    /// Adam moments carried across `train` calls on the same model.
    optimizer: Option<OptimizerAdaptor<Adam, PriceModel<B>, B>>,
    model_config: PriceModelConfig,
    device: B::Device,
}

impl Default for PricePredictor<TrainBackend> {
    fn default() -> Self {
        Self {
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            scaler: MinMaxScaler::default(),
            model: None,
            optimizer: None,
            model_config: PriceModelConfig::new(),
            device: Default::default(),
        }
    }
}

impl<B: AutodiffBackend> PricePredictor<B> {
    pub fn new(sequence_length: usize) -> Result<Self> {
        Self::with_device(sequence_length, Default::default())
    }

    pub fn with_device(sequence_length: usize, device: B::Device) -> Result<Self> {
        if sequence_length == 0 {
            return Err(PredictorError::InvalidShape("sequence length must be positive".into()));
        }
        Ok(Self {
            sequence_length,
            scaler: MinMaxScaler::default(),
            model: None,
            optimizer: None,
            model_config: PriceModelConfig::new(),
            device,
        })
    }

    /// Overrides the architecture used by the next `build`.
    pub fn with_model_config(mut self, config: PriceModelConfig) -> Result<Self> {
        config.validate().map_err(PredictorError::InvalidConfig)?;
        self.model_config = config;
        Ok(self)
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    pub fn model(&self) -> Option<&PriceModel<B>> {
        self.model.as_ref()
    }

    pub fn model_config(&self) -> &PriceModelConfig {
        &self.model_config
    }

    /// True once both the model and the scaler can serve predictions.
    pub fn is_ready(&self) -> bool {
        self.model.is_some() && self.scaler.is_fitted()
    }

    pub fn build(&mut self, input_shape: InputShape) -> Result<&PriceModel<B>> {
        let InputShape { sequence_length, features } = input_shape;
        if sequence_length == 0 || features == 0 {
            return Err(PredictorError::InvalidShape(format!(
                "dimensions must be positive, got ({sequence_length}, {features})"
            )));
        }
        if features != 1 {
            return Err(PredictorError::InvalidShape(format!(
                "the predictor is univariate, got {features} features per step"
            )));
        }
        if sequence_length != self.sequence_length {
            return Err(PredictorError::InvalidShape(format!(
                "window of {sequence_length} steps does not match sequence length {}",
                self.sequence_length
            )));
        }

        let config = self.model_config.clone().with_input_features(features);
        config.validate().map_err(PredictorError::InvalidShape)?;
        info!(
            "🏗️ Building BiLSTM {:?} → dense {} → 1 (dropout {:.1}) for input ({}, {})",
            config.recurrent_widths, config.dense_width, config.dropout, sequence_length, features
        );

        let model = config.init::<B>(&self.device);
        self.model_config = config;
        self.optimizer = None;
        Ok(&*self.model.insert(model))
    }

    /// Re-fits the scaler on `prices` and windows the scaled series.
    pub fn prepare_data(&mut self, prices: &[f64]) -> Result<WindowedDataset> {
        if prices.len() <= self.sequence_length {
            return Err(PredictorError::InsufficientHistory {
                required: self.sequence_length + 1,
                actual: prices.len(),
            });
        }
        let scaled = self.scaler.fit_transform(prices)?;
        let dataset = WindowedDataset::from_scaled(&scaled, self.sequence_length)?;
        debug!("🔧 Prepared {} windows of length {}", dataset.len(), self.sequence_length);
        Ok(dataset)
    }

    /// Fits the model on `prices`. The trailing `validation_split` fraction of
    /// windows is held out for reporting only.
    ///
    /// A later call continues from the current weights and Adam moments; use
    /// [`reset`](Self::reset) to start over. On error the predictor keeps the
    /// model it had before the call; the scaler has already been re-fitted.
    pub fn train(&mut self, prices: &[f64], config: &TrainingConfig) -> Result<TrainingHistory> {
        config.validate()?;
        let dataset = self.prepare_data(prices)?;

        let train_len = dataset.train_len(config.validation_split);
        if train_len == 0 {
            return Err(PredictorError::InvalidConfig(format!(
                "validation_split {} leaves no training samples out of {}",
                config.validation_split,
                dataset.len()
            )));
        }
        let val_indices: Vec<usize> = (train_len..dataset.len()).collect();

        // Weight init and dropout masks draw from the backend RNG.
        B::seed(config.seed);
        if self.model.is_none() {
            self.build(InputShape::new(self.sequence_length, 1))?;
        }
        let mut model = self
            .model
            .clone()
            .ok_or_else(|| PredictorError::ModelNotInitialized("model build failed".into()))?;

        info!(
            "🧠 Training on {} samples, validating on {} ({} epochs, batch {})",
            train_len,
            val_indices.len(),
            config.epochs,
            config.batch_size
        );

        let mut optim = self
            .optimizer
            .clone()
            .unwrap_or_else(|| AdamConfig::new().with_epsilon(1e-7).init::<B, PriceModel<B>>());
        let loss_fn = MseLoss::new();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut order: Vec<usize> = (0..train_len).collect();
        let mut history = TrainingHistory::new(train_len, val_indices.len(), Utc::now().to_rfc3339());
        let start_time = Instant::now();

        for epoch in 1..=config.epochs {
            if config.shuffle {
                order.shuffle(&mut rng);
            }

            let mut loss_sum = 0.0;
            let mut abs_sum = 0.0;
            for batch in order.chunks(config.batch_size) {
                let (inputs, targets, target_values) = self.batch::<B>(&dataset, batch);
                let output = model.forward(inputs);
                let predictions = tensor_values(output.clone())?;
                let loss = loss_fn.forward(output, targets, Reduction::Mean);

                let batch_loss = loss.clone().into_scalar().elem::<f64>();
                loss_sum += batch_loss * batch.len() as f64;
                abs_sum += mean_absolute_error(&predictions, &target_values) * batch.len() as f64;

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(config.learning_rate, model, grads);
            }

            let loss = loss_sum / train_len as f64;
            let mae = abs_sum / train_len as f64;
            if !loss.is_finite() {
                return Err(PredictorError::Training(format!("loss diverged at epoch {epoch}")));
            }

            let validation = self.evaluate(&model.valid(), &dataset, &val_indices, config.batch_size)?;
            let metrics = EpochMetrics {
                epoch,
                loss,
                mae,
                val_loss: validation.map(|(l, _)| l),
                val_mae: validation.map(|(_, m)| m),
            };

            if epoch % 5 == 0 || epoch <= 10 || epoch == config.epochs {
                info!(
                    "📈 Epoch {}/{}: loss={:.6} mae={:.6} val_loss={} val_mae={}",
                    epoch,
                    config.epochs,
                    metrics.loss,
                    metrics.mae,
                    format_optional(metrics.val_loss),
                    format_optional(metrics.val_mae)
                );
            } else {
                debug!("Epoch {}/{}: loss={:.6}", epoch, config.epochs, metrics.loss);
            }
            history.push(metrics);
        }

        history.training_time = start_time.elapsed().as_secs_f64();
        info!("✅ Training finished in {:.1}s", history.training_time);
        self.model = Some(model);
        self.optimizer = Some(optim);
        Ok(history)
    }

    /// Predicts the price that follows `recent_prices`, using only its last
    /// `sequence_length` values.
    pub fn predict(&self, recent_prices: &[f64]) -> Result<f64> {
        if recent_prices.len() < self.sequence_length {
            return Err(PredictorError::InsufficientHistory {
                required: self.sequence_length,
                actual: recent_prices.len(),
            });
        }
        let model = self.model.as_ref().ok_or_else(|| {
            PredictorError::ModelNotInitialized("train, build or load a model first".into())
        })?;
        if !self.scaler.is_fitted() {
            return Err(PredictorError::ModelNotInitialized(
                "scaler has not been fitted; train the model or load a file carrying scaler state".into(),
            ));
        }

        let window = &recent_prices[recent_prices.len() - self.sequence_length..];
        ensure_finite(window)?;
        let scaled: Vec<f32> = self.scaler.transform(window)?.into_iter().map(|v| v as f32).collect();

        let inputs = Tensor::<B::InnerBackend, 3>::from_data(
            TensorData::new(scaled, [1, self.sequence_length, 1]),
            &self.device,
        );
        let output = model.valid().forward(inputs);
        let scaled_prediction = tensor_values(output)?
            .first()
            .copied()
            .ok_or_else(|| PredictorError::Tensor("model returned an empty output".into()))?;

        self.scaler.inverse_transform_one(scaled_prediction as f64)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let Some(model) = self.model.as_ref() else {
            warn!("⚠️ No model to save to {}", path.display());
            return Err(PredictorError::ModelNotInitialized("nothing to save".into()));
        };
        let scaler = self.scaler.is_fitted().then_some(&self.scaler);
        PersistedModel::from_model(model, &self.model_config, self.sequence_length, scaler)?.write(path)
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let persisted = PersistedModel::read(path.as_ref())?;
        if persisted.sequence_length != self.sequence_length {
            return Err(PredictorError::InvalidShape(format!(
                "model was trained on windows of {} steps, predictor uses {}",
                persisted.sequence_length, self.sequence_length
            )));
        }

        let model = persisted.to_model::<B>(&self.device)?;
        self.model_config = persisted.model_config();
        match persisted.scaler {
            Some(scaler) => self.scaler = scaler,
            None => warn!("⚠️ {} carries no scaler state; keeping the current scaler", path.as_ref().display()),
        }
        self.model = Some(model);
        self.optimizer = None;
        Ok(())
    }

    /// Drops the model and its optimizer state and forgets the scaler fit.
    pub fn reset(&mut self) {
        self.model = None;
        self.optimizer = None;
        self.scaler.reset();
    }

    fn batch<BB: Backend<Device = B::Device>>(
        &self,
        dataset: &WindowedDataset,
        indices: &[usize],
    ) -> (Tensor<BB, 3>, Tensor<BB, 2>, Vec<f32>) {
        let (inputs, targets) = dataset.gather(indices);
        let inputs = Tensor::<BB, 3>::from_data(
            TensorData::new(inputs, [indices.len(), self.sequence_length, 1]),
            &self.device,
        );
        let target_tensor = Tensor::<BB, 2>::from_data(
            TensorData::new(targets.clone(), [indices.len(), 1]),
            &self.device,
        );
        (inputs, target_tensor, targets)
    }

    fn evaluate(
        &self,
        model: &PriceModel<B::InnerBackend>,
        dataset: &WindowedDataset,
        indices: &[usize],
        batch_size: usize,
    ) -> Result<Option<(f64, f64)>> {
        if indices.is_empty() {
            return Ok(None);
        }
        let mut predictions = Vec::with_capacity(indices.len());
        let mut targets = Vec::with_capacity(indices.len());
        for batch in indices.chunks(batch_size) {
            let (inputs, _, batch_targets) = self.batch::<B::InnerBackend>(dataset, batch);
            predictions.extend(tensor_values(model.forward(inputs))?);
            targets.extend(batch_targets);
        }
        Ok(Some((
            mean_squared_error(&predictions, &targets),
            mean_absolute_error(&predictions, &targets),
        )))
    }
}

fn tensor_values<BB: Backend>(tensor: Tensor<BB, 2>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| PredictorError::Tensor(format!("{:?}", e)))
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.6}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rna::data::synthetic_series;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bilstm_price_predictor_{}_{}", std::process::id(), name))
    }

    fn small_predictor(sequence_length: usize) -> PricePredictor {
        PricePredictor::new(sequence_length)
            .unwrap()
            .with_model_config(PriceModelConfig::new().with_recurrent_widths(vec![8, 4]).with_dense_width(4))
            .unwrap()
    }

    fn quick_config(epochs: usize) -> TrainingConfig {
        TrainingConfig { epochs, batch_size: 16, ..TrainingConfig::default() }
    }

    #[test]
    fn test_default_predictor() {
        let predictor: PricePredictor = PricePredictor::default();
        assert_eq!(predictor.sequence_length(), 60);
        assert!(predictor.model().is_none());
        assert!(!predictor.scaler().is_fitted());
        assert!(!predictor.is_ready());
    }

    #[test]
    fn test_zero_sequence_length_rejected() {
        assert!(matches!(PricePredictor::<TrainBackend>::new(0), Err(PredictorError::InvalidShape(_))));
    }

    #[test]
    fn test_predict_insufficient_history() {
        let predictor: PricePredictor = PricePredictor::default();
        let prices = vec![100.0; 59];
        match predictor.predict(&prices) {
            Err(PredictorError::InsufficientHistory { required, actual }) => {
                assert_eq!(required, 60);
                assert_eq!(actual, 59);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_predict_without_model() {
        let predictor: PricePredictor = PricePredictor::default();
        let prices = vec![100.0; 60];
        assert!(matches!(predictor.predict(&prices), Err(PredictorError::ModelNotInitialized(_))));
    }

    #[test]
    fn test_predict_with_built_model_but_unfit_scaler() {
        let mut predictor = small_predictor(5);
        predictor.build(InputShape::new(5, 1)).unwrap();
        assert!(matches!(predictor.predict(&[1.0; 5]), Err(PredictorError::ModelNotInitialized(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let mut predictor: PricePredictor = PricePredictor::default();
        assert!(matches!(
            predictor.load("/no/such/file"),
            Err(PredictorError::PersistedModelMissing(_))
        ));
    }

    #[test]
    fn test_save_without_model_fails() {
        let predictor: PricePredictor = PricePredictor::default();
        let path = temp_path("empty.h5");
        assert!(matches!(predictor.save(&path), Err(PredictorError::ModelNotInitialized(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_build_validates_shape() {
        let mut predictor = small_predictor(10);
        assert!(matches!(predictor.build(InputShape::new(0, 1)), Err(PredictorError::InvalidShape(_))));
        assert!(matches!(predictor.build(InputShape::new(10, 0)), Err(PredictorError::InvalidShape(_))));
        assert!(matches!(predictor.build(InputShape::new(10, 3)), Err(PredictorError::InvalidShape(_))));
        assert!(matches!(predictor.build(InputShape::new(12, 1)), Err(PredictorError::InvalidShape(_))));
        assert!(predictor.model().is_none());

        let model = predictor.build(InputShape::new(10, 1)).unwrap();
        assert_eq!(model.num_layers(), 2);
    }

    #[test]
    fn test_prepare_data_windows_scaled_series() {
        let mut predictor = small_predictor(4);
        let prices: Vec<f64> = (0..10).map(|i| 10.0 + i as f64).collect();
        let dataset = predictor.prepare_data(&prices).unwrap();

        assert_eq!(dataset.len(), 6);
        let scaled = predictor.scaler().transform(&prices).unwrap();
        for i in 0..dataset.len() {
            let expected: Vec<f32> = scaled[i..i + 4].iter().map(|&v| v as f32).collect();
            assert_eq!(dataset.inputs.row(i).to_vec(), expected);
            assert_eq!(dataset.targets[i], scaled[i + 4] as f32);
        }
    }

    #[test]
    fn test_prepare_data_refits_scaler() {
        let mut predictor = small_predictor(2);
        predictor.prepare_data(&[1.0, 2.0, 3.0]).unwrap();
        predictor.prepare_data(&[100.0, 300.0, 200.0]).unwrap();
        assert_eq!(predictor.scaler().data_min(), Some(100.0));
        assert_eq!(predictor.scaler().data_max(), Some(300.0));
    }

    #[test]
    fn test_prepare_data_insufficient_history() {
        let mut predictor = small_predictor(10);
        match predictor.prepare_data(&[1.0; 10]) {
            Err(PredictorError::InsufficientHistory { required, actual }) => {
                assert_eq!(required, 11);
                assert_eq!(actual, 10);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_train_rejects_bad_config() {
        let mut predictor = small_predictor(5);
        let prices = synthetic_series(30, 1);
        let zero_epochs = TrainingConfig { epochs: 0, ..TrainingConfig::default() };
        assert!(matches!(predictor.train(&prices, &zero_epochs), Err(PredictorError::InvalidConfig(_))));
        let bad_split = TrainingConfig { validation_split: 1.0, ..TrainingConfig::default() };
        assert!(matches!(predictor.train(&prices, &bad_split), Err(PredictorError::InvalidConfig(_))));
        assert!(predictor.model().is_none());
    }

    #[test]
    fn test_train_history_shape() {
        let mut predictor = small_predictor(5);
        let prices = synthetic_series(60, 3);
        let history = predictor.train(&prices, &quick_config(3)).unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history.train_samples, 44);
        assert_eq!(history.val_samples, 11);
        for (i, m) in history.epochs.iter().enumerate() {
            assert_eq!(m.epoch, i + 1);
            assert!(m.loss.is_finite() && m.mae.is_finite());
            assert!(m.val_loss.is_some_and(f64::is_finite));
            assert!(m.val_mae.is_some_and(f64::is_finite));
        }
        assert!(predictor.is_ready());
    }

    #[test]
    fn test_train_without_validation() {
        let mut predictor = small_predictor(5);
        let prices = synthetic_series(40, 4);
        let config = TrainingConfig { validation_split: 0.0, ..quick_config(2) };
        let history = predictor.train(&prices, &config).unwrap();
        assert_eq!(history.val_samples, 0);
        assert!(history.epochs.iter().all(|m| m.val_loss.is_none()));
    }

    #[test]
    fn test_end_to_end_train_and_predict() {
        let mut predictor: PricePredictor = PricePredictor::new(10).unwrap();
        let prices = synthetic_series(200, 42);
        predictor.train(&prices, &quick_config(2)).unwrap();

        let recent = &prices[prices.len() - 10..];
        let first = predictor.predict(recent).unwrap();
        let second = predictor.predict(recent).unwrap();
        assert!(first.is_finite());
        assert_eq!(first, second);

        // Extra leading history is ignored.
        assert_eq!(predictor.predict(&prices).unwrap(), first);
    }

    #[test]
    fn test_save_then_load_keeps_predictions() {
        let mut predictor = small_predictor(8);
        let prices = synthetic_series(80, 9);
        predictor.train(&prices, &quick_config(2)).unwrap();
        let recent = &prices[prices.len() - 8..];
        let before = predictor.predict(recent).unwrap();

        let path = temp_path("roundtrip.h5");
        predictor.save(&path).unwrap();
        predictor.load(&path).unwrap();
        let after = predictor.predict(recent).unwrap();
        assert!((before - after).abs() < 1e-6 * before.abs().max(1.0));

        // A fresh predictor gets the scaler from the file.
        let mut fresh = small_predictor(8);
        fresh.load(&path).unwrap();
        assert!(fresh.is_ready());
        assert!((fresh.predict(recent).unwrap() - before).abs() < 1e-6 * before.abs().max(1.0));

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_rejects_mismatched_sequence_length() {
        let mut predictor = small_predictor(6);
        predictor.build(InputShape::new(6, 1)).unwrap();
        let path = temp_path("mismatch.h5");
        predictor.save(&path).unwrap();

        let mut other = small_predictor(7);
        assert!(matches!(other.load(&path), Err(PredictorError::InvalidShape(_))));
        assert!(other.model().is_none());
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_validation_uses_trailing_windows_in_order() {
        let mut predictor = small_predictor(4);
        // Rising trend: the trailing windows differ clearly from the leading ones.
        let prices: Vec<f64> = (0..64).map(|i| 50.0 + i as f64 + ((i as f64) * 0.7).sin()).collect();
        let config = TrainingConfig { epochs: 2, batch_size: 8, ..TrainingConfig::default() };
        let history = predictor.train(&prices, &config).unwrap();
        let reported = history.last().and_then(|m| m.val_loss).unwrap();

        let dataset = predictor.prepare_data(&prices).unwrap();
        let n = dataset.len();
        let train_len = dataset.train_len(config.validation_split);
        assert_eq!((history.train_samples, history.val_samples), (train_len, n - train_len));

        let model = predictor.model().unwrap().valid();
        let trailing: Vec<usize> = (train_len..n).collect();
        let (val_loss, _) = predictor.evaluate(&model, &dataset, &trailing, config.batch_size).unwrap().unwrap();
        assert!((val_loss - reported).abs() < 1e-9, "{val_loss} vs {reported}");

        let leading: Vec<usize> = (0..n - train_len).collect();
        let (leading_loss, _) = predictor.evaluate(&model, &dataset, &leading, config.batch_size).unwrap().unwrap();
        assert!((leading_loss - reported).abs() > 1e-9);
    }

    #[test]
    fn test_optimizer_state_carries_over() {
        let mut predictor = small_predictor(5);
        let prices = synthetic_series(40, 6);
        assert!(predictor.optimizer.is_none());

        predictor.train(&prices, &quick_config(1)).unwrap();
        let moments = predictor.optimizer.as_ref().map(|o| o.to_record().len()).unwrap_or(0);
        assert!(moments > 0);

        predictor.train(&prices, &quick_config(1)).unwrap();
        assert_eq!(predictor.optimizer.as_ref().map(|o| o.to_record().len()), Some(moments));

        predictor.build(InputShape::new(5, 1)).unwrap();
        assert!(predictor.optimizer.is_none());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut predictor = small_predictor(5);
        predictor.train(&synthetic_series(30, 5), &quick_config(1)).unwrap();
        assert!(predictor.is_ready());
        predictor.reset();
        assert!(predictor.model().is_none());
        assert!(predictor.optimizer.is_none());
        assert!(!predictor.scaler().is_fitted());
    }
}
