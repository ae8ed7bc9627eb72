// ============================================================
// Layer 2: TrainUseCase
// ============================================================
// Orchestrates one fine-tuning run in order:
//
//   Step 1: Discover class names from <data_dir>/test  (Layer 4 - data)
//   Step 2: Index the train and val splits             (Layer 4 - data)
//   Step 3: Resolve the shuffle seed
//   Step 4: Save config                                (Layer 6 - infra)
//   Step 5: Run training loop + save artifacts         (Layer 5 - ml)
//
// The test split is only used for its class list here; it is
// never read for images.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::image_folder::{discover_classes, ImageFolderDataset};
use crate::domain::{architecture::Architecture, history::TrainingHistory, sample::Split};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Saved next to the
// weights so a run can be traced back to its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Partitioned tree with train/, val/ and test/
    pub data_dir: String,
    pub artifact_dir: String,
    pub architecture: Architecture,
    pub batch_size: usize,
    pub epochs: usize,
    pub lr: f64,
    pub num_workers: usize,
    /// Data loader shuffle seed; drawn at random when absent
    pub seed: Option<u64>,
    /// torchvision .pth checkpoint for the backbone
    pub pretrained: Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir: "data/ethnicity".to_string(),
            artifact_dir: "artifacts".to_string(),
            architecture: Architecture::ResNet34,
            batch_size: 20,
            epochs: 50,
            lr: 1e-3,
            num_workers: 3,
            seed: None,
            pretrained: None,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainingHistory> {
        let data_dir = Path::new(&self.config.data_dir);

        // ── Step 1: Class names ───────────────────────────────────────────────
        // Sorted directory names under test/ define the label indices
        // for every split.
        let classes = discover_classes(&data_dir.join(Split::Test.dir_name()))?;
        tracing::info!("Found {} classes: {:?}", classes.len(), classes);

        // ── Step 2: Datasets ──────────────────────────────────────────────────
        let train_dataset = ImageFolderDataset::new(&data_dir.join(Split::Train.dir_name()), &classes)?;
        let val_dataset = ImageFolderDataset::new(&data_dir.join(Split::Val.dir_name()), &classes)?;

        // ── Step 3: Seed ──────────────────────────────────────────────────────
        let mut cfg = self.config.clone();
        let seed = *cfg.seed.get_or_insert_with(rand::random::<u64>);
        tracing::info!("Shuffle seed: {}", seed);

        // ── Step 4: Save config ───────────────────────────────────────────────
        // Written with the resolved seed so the run can be repeated.
        let store = CheckpointManager::new(&cfg.artifact_dir)?;
        store.save_config(&cfg)?;

        // ── Step 5: Training loop (Layer 5) ───────────────────────────────────
        run_training(&cfg, seed, train_dataset, val_dataset, &store)
    }
}
