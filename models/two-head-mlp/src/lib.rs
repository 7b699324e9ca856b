use burn::{
    config::Config,
    module::Module,
    nn::{Dropout, DropoutConfig, Linear, LinearConfig, ReLU},
    tensor::{backend::Backend, Tensor},
};

mod training;
pub use training::*;

/// A classifier producing two independent sets of class logits from one shared
/// input. Training and evaluation mode are the backend duality of the module:
/// the autodiff-typed value trains, its `valid()` copy evaluates.
pub trait TwoHeadModel<B: Backend>: Module<B> {
    fn forward(&self, images: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>);
}

#[derive(Config)]
pub struct TwoHeadMlpConfig {
    num_features: usize,
    #[config(default = 10)]
    num_classes: usize,
    #[config(default = 128)]
    hidden_size: usize,
    #[config(default = 0.5)]
    dropout: f64,
}

impl TwoHeadMlpConfig {
    pub fn init<B: Backend>(&self) -> TwoHeadMlp<B> {
        TwoHeadMlp {
            hidden: LinearConfig::new(self.num_features, self.hidden_size).init(),
            activation: ReLU::new(),
            dropout: DropoutConfig::new(self.dropout).init(),
            head_upper: LinearConfig::new(self.hidden_size, self.num_classes).init(),
            head_lower: LinearConfig::new(self.hidden_size, self.num_classes).init(),
        }
    }
}

/// Shared perceptron trunk with one linear head per digit.
#[derive(Module, Debug)]
pub struct TwoHeadMlp<B: Backend> {
    hidden: Linear<B>,
    activation: ReLU,
    dropout: Dropout,
    head_upper: Linear<B>,
    head_lower: Linear<B>,
}

impl<B: Backend> TwoHeadModel<B> for TwoHeadMlp<B> {
    fn forward(&self, images: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let hidden = self.hidden.forward(images);
        let hidden = self.activation.forward(hidden);
        let hidden = self.dropout.forward(hidden);

        (
            self.head_upper.forward(hidden.clone()),
            self.head_lower.forward(hidden),
        )
    }
}
