use burn::config::Config;
use burn::module::{ADModule, Module};
use burn::nn::loss::CrossEntropyLoss;
use burn::optim::momentum::MomentumConfig;
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::record::CompactRecorder;
use burn::tensor::backend::{ADBackend, Backend};
use burn::tensor::{ElementConversion, Int, Tensor};
use digit_pairs::DigitBatch;
use log::info;

use crate::TwoHeadModel;

#[derive(Config)]
pub struct TrainingConfig {
    pub batch_size: usize,
    #[config(default = 100)]
    pub num_epochs: usize,
    #[config(default = 1.0e-2)]
    pub learning_rate: f64,
    #[config(default = 0.9)]
    pub momentum: f64,
    #[config(default = false)]
    pub nesterov: bool,
    #[config(default = 42)]
    pub seed: u64,
}

/// Per-head means over one pass of a split, indexed upper = 0, lower = 1.
#[derive(Debug, Clone, Copy)]
pub struct EpochMetrics {
    pub loss: [f64; 2],
    pub accuracy: [f64; 2],
}

#[derive(Default)]
struct Totals {
    loss: [f64; 2],
    accuracy: [f64; 2],
    batches: usize,
}

impl Totals {
    fn push(&mut self, loss: [f64; 2], accuracy: [f64; 2]) {
        for head in 0..2 {
            self.loss[head] += loss[head];
            self.accuracy[head] += accuracy[head];
        }
        self.batches += 1;
    }

    // An empty split divides by zero and means out as NaN.
    fn mean(self) -> EpochMetrics {
        let count = self.batches as f64;
        EpochMetrics {
            loss: [self.loss[0] / count, self.loss[1] / count],
            accuracy: [self.accuracy[0] / count, self.accuracy[1] / count],
        }
    }
}

/// Fraction of predicted labels exactly equal to the gold labels. Both tensors
/// are copied to the host first; integer predictions carry no autodiff graph,
/// so the comparison never disturbs gradient tracking.
pub fn accuracy<B: Backend, const D: usize>(
    predictions: Tensor<B, D, Int>,
    targets: Tensor<B, 1, Int>,
) -> f64 {
    let predicted: Vec<i64> = predictions.into_data().convert().value;
    let gold: Vec<i64> = targets.into_data().convert().value;

    let matching = predicted
        .iter()
        .zip(gold.iter())
        .filter(|(predicted, gold)| predicted == gold)
        .count();
    matching as f64 / gold.len() as f64
}

fn scalar<B: Backend>(loss: Tensor<B, 1>) -> f64 {
    loss.into_scalar().elem()
}

/// One evaluation pass: forward, per-head argmax accuracy and cross-entropy,
/// no gradient computation and no parameter mutation.
pub fn run_epoch<B: Backend, M: TwoHeadModel<B>>(
    batches: &[DigitBatch<B>],
    model: &M,
) -> EpochMetrics {
    let loss_fn = CrossEntropyLoss::new(None);
    let mut totals = Totals::default();

    for batch in batches {
        let (logits_upper, logits_lower) = model.forward(batch.images.clone());

        let acc_upper = accuracy(logits_upper.clone().argmax(1), batch.labels_upper.clone());
        let acc_lower = accuracy(logits_lower.clone().argmax(1), batch.labels_lower.clone());
        let loss_upper = loss_fn.forward(logits_upper, batch.labels_upper.clone());
        let loss_lower = loss_fn.forward(logits_lower, batch.labels_lower.clone());

        totals.push(
            [scalar(loss_upper), scalar(loss_lower)],
            [acc_upper, acc_lower],
        );
    }

    totals.mean()
}

/// One training pass: the evaluation of [`run_epoch`] plus, per batch, a
/// backward pass through the joint objective `(loss_upper + loss_lower) / 2`
/// and one optimizer step over all trainable parameters.
pub fn run_train_epoch<B, M, O>(
    batches: &[DigitBatch<B>],
    mut model: M,
    optimizer: &mut O,
    learning_rate: f64,
) -> (M, EpochMetrics)
where
    B: ADBackend,
    M: TwoHeadModel<B> + ADModule<B>,
    O: Optimizer<M, B>,
{
    let loss_fn = CrossEntropyLoss::new(None);
    let mut totals = Totals::default();

    for batch in batches {
        let (logits_upper, logits_lower) = model.forward(batch.images.clone());

        let acc_upper = accuracy(logits_upper.clone().argmax(1), batch.labels_upper.clone());
        let acc_lower = accuracy(logits_lower.clone().argmax(1), batch.labels_lower.clone());
        let loss_upper = loss_fn.forward(logits_upper, batch.labels_upper.clone());
        let loss_lower = loss_fn.forward(logits_lower, batch.labels_lower.clone());

        totals.push(
            [scalar(loss_upper.clone()), scalar(loss_lower.clone())],
            [acc_upper, acc_lower],
        );

        let joint_loss = (loss_upper + loss_lower) / 2.0;
        let grads = GradientsParams::from_grads(joint_loss.backward(), &model);
        model = optimizer.step(learning_rate, model, grads);
    }

    (model, totals.mean())
}

/// Drives `num_epochs` alternating train/eval passes, printing the four metric
/// values of each pass and overwriting the checkpoint after every epoch.
pub fn train<B, M>(
    artifact_dir: &str,
    train_split: &[DigitBatch<B>],
    dev_split: &[DigitBatch<B::InnerBackend>],
    model: M,
    config: &TrainingConfig,
) -> anyhow::Result<M>
where
    B: ADBackend,
    M: TwoHeadModel<B> + ADModule<B>,
    M::InnerModule: TwoHeadModel<B::InnerBackend>,
{
    std::fs::create_dir_all(artifact_dir)?;
    config.save(format!("{artifact_dir}/config.json"))?;

    B::seed(config.seed);

    let mut optimizer = SgdConfig::new()
        .with_momentum(Some(
            MomentumConfig::new()
                .with_momentum(config.momentum)
                .with_nesterov(config.nesterov),
        ))
        .init();
    let mut model = model;

    for epoch in 1..=config.num_epochs {
        println!("-------------\nEpoch {epoch}:\n");

        let (trained, metrics) =
            run_train_epoch(train_split, model, &mut optimizer, config.learning_rate);
        model = trained;
        print_metrics("Train", &metrics);

        let dev_metrics = run_epoch(dev_split, &model.valid());
        print_metrics("Valid", &dev_metrics);

        model
            .clone()
            .save_file(format!("{artifact_dir}/model"), &CompactRecorder::new())
            .expect("Failed to save checkpoint");
    }
    info!("--- training complete ---");

    Ok(model)
}

fn print_metrics(pass: &str, metrics: &EpochMetrics) {
    println!(
        "{pass} loss1: {:.6}  accuracy1: {:.6}  loss2: {:.6}  accuracy2: {:.6}",
        metrics.loss[0], metrics.accuracy[0], metrics.loss[1], metrics.accuracy[1]
    );
}
