use burn::{
    autodiff::ADBackendDecorator,
    backend::{
        wgpu::{AutoGraphicsApi, WgpuDevice},
        WgpuBackend,
    },
};
use clap::Parser;
use digit_pairs::{batch_split, load_split, DigitPairsBatcher, Split};
use two_head_mlp::{train, TrainingConfig, TwoHeadMlpConfig};

mod cli;


fn main() -> anyhow::Result<()> {
    type MyBackend = WgpuBackend<AutoGraphicsApi, f32, i32>;
    type MyAutodiffBackend = ADBackendDecorator<MyBackend>;

    let cmd = cli::Cli::parse();
    let device = WgpuDevice::default();

    let train_items = load_split(&cmd.data_dir, Split::Train)?;
    let dev_items = load_split(&cmd.data_dir, Split::Test)?;
    let num_features = train_items
        .first()
        .map(|item| item.image.len())
        .ok_or_else(|| anyhow::Error::msg("training split is empty"))?;

    let batcher_train = DigitPairsBatcher::<MyAutodiffBackend>::new(device.clone());
    let batcher_valid = DigitPairsBatcher::<MyBackend>::new(device.clone());
    let train_batches = batch_split(&batcher_train, &train_items, cmd.batch_size);
    let dev_batches = batch_split(&batcher_valid, &dev_items, cmd.batch_size);

    let mut config = TrainingConfig::new(cmd.batch_size);
    if let Some(epochs) = cmd.epochs {
        config.num_epochs = epochs;
    }

    let model = TwoHeadMlpConfig::new(num_features).init::<MyAutodiffBackend>();
    train(
        &cmd.artifacts_dir,
        &train_batches,
        &dev_batches,
        model,
        &config,
    )?;

    Ok(())
}
