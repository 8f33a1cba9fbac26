// projeto: bilstm_price
// file: src/rna/model.rs
// Stacked bidirectional LSTM regressor built on burn

use burn::{
    config::Config,
    module::Module,
    nn::{BiLstm, BiLstmConfig, Dropout, DropoutConfig, Linear, LinearConfig},
    tensor::{Tensor, activation::relu, backend::Backend},
};

/// Declarative hyper-parameters of the network.
#[derive(Config, Debug)]
pub struct PriceModelConfig {
    /// Features per time step; the predictor feeds one (the scaled price).
    #[config(default = 1)]
    pub input_features: usize,
    /// Hidden width of each bidirectional layer, outermost first.
    #[config(default = "vec![128, 64, 32]")]
    pub recurrent_widths: Vec<usize>,
    #[config(default = 0.2)]
    pub dropout: f64,
    #[config(default = 16)]
    pub dense_width: usize,
}

impl PriceModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PriceModel<B> {
        let mut recurrent = Vec::with_capacity(self.recurrent_widths.len());
        let mut d_input = self.input_features;
        for &width in &self.recurrent_widths {
            recurrent.push(BiLstmConfig::new(d_input, width, true).init(device));
            // Forward and backward outputs are concatenated.
            d_input = width * 2;
        }

        PriceModel {
            recurrent,
            dropout: DropoutConfig::new(self.dropout).init(),
            dense: LinearConfig::new(d_input, self.dense_width).init(device),
            output: LinearConfig::new(self.dense_width, 1).init(device),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.input_features == 0 {
            return Err("input_features must be positive".into());
        }
        if self.recurrent_widths.is_empty() || self.recurrent_widths.contains(&0) {
            return Err(format!("recurrent widths must be non-empty and positive, got {:?}", self.recurrent_widths));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(format!("dropout must lie in [0, 1), got {}", self.dropout));
        }
        if self.dense_width == 0 {
            return Err("dense_width must be positive".into());
        }
        Ok(())
    }
}

#[derive(Module, Debug)]
pub struct PriceModel<B: Backend> {
    recurrent: Vec<BiLstm<B>>,
    dropout: Dropout,
    dense: Linear<B>,
    output: Linear<B>,
}

impl<B: Backend> PriceModel<B> {
    /// `[batch, seq, features]` → `[batch, 1]`.
    ///
    /// Every recurrent layer but the last keeps its per-step outputs. The last
    /// one is reduced to the forward direction's final step joined with the
    /// backward direction's final step (which sits at time index 0). Each
    /// layer's output goes through dropout exactly once.
    pub fn forward(&self, inputs: Tensor<B, 3>) -> Tensor<B, 2> {
        let last = self.recurrent.len().saturating_sub(1);
        let mut x = inputs;
        for (i, layer) in self.recurrent.iter().enumerate() {
            let (outputs, _) = layer.forward(x, None);
            x = if i < last { self.dropout.forward(outputs) } else { outputs };
        }

        let [batch, seq_len, width] = x.dims();
        let hidden = width / 2;
        let forward_last = x.clone().slice([0..batch, seq_len - 1..seq_len, 0..hidden]);
        let backward_last = x.slice([0..batch, 0..1, hidden..width]);
        let summary = Tensor::cat(vec![forward_last, backward_last], 2).reshape([batch, width]);

        let summary = self.dropout.forward(summary);
        let x = relu(self.dense.forward(summary));
        self.output.forward(x)
    }

    pub fn num_layers(&self) -> usize {
        self.recurrent.len()
    }
}
