// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with clap.
// All work is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `prepare` - partitions the raw dataset for one label scheme
//   2. `train`   - fine-tunes a CNN on a partitioned dataset
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PrepareArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "awe-classifier",
    version = "0.1.0",
    about = "Partition the AWE ear dataset by label and fine-tune a CNN classifier on it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the use case for the chosen subcommand.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args) => run_prepare(args),
            Commands::Train(args) => run_train(args),
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    let use_case = PrepareUseCase::new(args.into());
    let report = use_case.execute()?;

    println!(
        "Prepared {} subjects ({} labels), {} images copied.",
        report.subjects,
        report.labels.len(),
        report.total_copied()
    );
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting {} training on: {}", args.architecture, args.data_dir);

    let artifact_dir = args.artifact_dir.clone();
    let history = TrainUseCase::new(args.into()).execute()?;

    if let Some((epoch, acc)) = history.best_val() {
        println!(
            "Trained {} epochs, best epoch {epoch} (val acc {acc:.4}). Artifacts saved to '{artifact_dir}'.",
            history.epochs()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{architecture::Architecture, label::LabelScheme};

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["awe-classifier", "train"]).unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.architecture, Architecture::ResNet34);
        assert_eq!(args.batch_size, 20);
        assert_eq!(args.epochs, 50);
        assert_eq!(args.num_workers, 3);
        assert_eq!(args.seed, None);
    }

    #[test]
    fn test_prepare_flags() {
        let cli = Cli::try_parse_from([
            "awe-classifier",
            "prepare",
            "--scheme",
            "identity",
            "--photos-per-subject",
            "12",
            "--clean",
        ])
        .unwrap();
        let Commands::Prepare(args) = cli.command else {
            panic!("expected prepare");
        };
        assert_eq!(args.scheme, LabelScheme::Identity);
        assert_eq!(args.photos_per_subject, 12);
        assert!(args.clean);
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let parsed = Cli::try_parse_from(["awe-classifier", "train", "--batch-size", "0"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_zero_workers_is_accepted() {
        let cli = Cli::try_parse_from(["awe-classifier", "train", "--num-workers", "0"]).unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.num_workers, 0);
    }

    #[test]
    fn test_unknown_architecture_is_rejected() {
        let parsed = Cli::try_parse_from(["awe-classifier", "train", "--architecture", "vgg16"]);
        assert!(parsed.is_err());
    }
}
