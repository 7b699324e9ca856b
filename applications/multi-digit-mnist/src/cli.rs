use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
pub struct Cli {
    /// Directory holding the MNIST idx files.
    #[arg(long)]
    pub data_dir: PathBuf,

    /// Where the training config and the per-epoch checkpoint land.
    #[arg(long)]
    pub artifacts_dir: String,

    /// Samples per batch; the trailing remainder of each split is dropped.
    #[arg(long)]
    pub batch_size: usize,

    /// Overrides the configured epoch count.
    #[arg(long)]
    pub epochs: Option<usize>,
}
