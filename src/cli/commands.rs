// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `prepare` and `train`, and all
// their configurable flags.
//
// Scheme and architecture values are parsed through their
// FromStr impls, so an unknown name is rejected by clap before
// any work starts.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{prepare_use_case::PrepareConfig, train_use_case::TrainConfig};
use crate::domain::{architecture::Architecture, label::LabelScheme};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Partition the raw dataset into train/val/test folders for one label scheme
    Prepare(PrepareArgs),

    /// Fine-tune a CNN on a partitioned dataset
    Train(TrainArgs),
}

/// All arguments for the `prepare` command.
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Raw dataset root with one directory per subject
    #[arg(long, default_value = "awe")]
    pub source_dir: String,

    /// Output root; images land in <output-dir>/<scheme>/<split>/<label>/
    #[arg(long, default_value = "data")]
    pub output_dir: String,

    /// Index file: first line test ids, second line validation ids
    #[arg(long, default_value = "awe/test.txt")]
    pub split_file: String,

    /// Label scheme: identity, ethnicity or gender
    #[arg(long, default_value = "ethnicity")]
    pub scheme: LabelScheme,

    /// Photos per subject, used to compute global sample ids
    #[arg(long, default_value_t = 10)]
    pub photos_per_subject: u32,

    /// Delete <output-dir>/<scheme> before partitioning
    #[arg(long)]
    pub clean: bool,
}

impl From<PrepareArgs> for PrepareConfig {
    fn from(a: PrepareArgs) -> Self {
        PrepareConfig {
            source_dir: a.source_dir,
            output_dir: a.output_dir,
            split_file: a.split_file,
            scheme: a.scheme,
            photos_per_subject: a.photos_per_subject,
            clean: a.clean,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Partitioned dataset with train/, val/ and test/
    #[arg(long, default_value = "data/ethnicity")]
    pub data_dir: String,

    /// Where weights, history, metrics and config are written
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: String,

    /// resnet18, resnet34, densenet121 or densenet169
    #[arg(long, default_value = "resnet34")]
    pub architecture: Architecture,

    /// Images per batch (at least 1)
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,

    /// Number of full passes through the training split
    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Data loader worker threads; 0 loads batches on the main thread
    #[arg(long, default_value_t = 3)]
    pub num_workers: usize,

    /// Shuffle seed (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// torchvision .pth checkpoint to initialise the backbone from
    #[arg(long)]
    pub pretrained: Option<String>,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir: a.data_dir,
            artifact_dir: a.artifact_dir,
            architecture: a.architecture,
            batch_size: a.batch_size as usize,
            epochs: a.epochs,
            lr: a.lr,
            num_workers: a.num_workers,
            seed: a.seed,
            pretrained: a.pretrained,
        }
    }
}
