// ============================================================
// Layer 6: Checkpoint Manager
// ============================================================
// Writes the artifacts of a training run into one directory:
//
//   artifacts/
//     resnet34_et_e_50_b_20.mpk        <- best weights (CompactRecorder)
//     hist_resnet34_et_e_50_b_20.json  <- [[train_acc...], [val_acc...]]
//     train_config.json                <- hyperparameters of the run
//
// The file stem encodes architecture, a two-letter tag of the
// data directory ("data/ethnicity" -> "et"), epoch count and
// batch size, so runs over different schemes/settings sit side
// by side without overwriting each other.
//
// Burn's CompactRecorder serialises the record to MessagePack
// (half precision) and appends its own extension.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::{architecture::Architecture, history::TrainingHistory};

// ─── ArtifactName ─────────────────────────────────────────────────────────────
/// Encodes the identity of a training run into file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    pub architecture: Architecture,
    pub data_tag: String,
    pub epochs: usize,
    pub batch_size: usize,
}

impl ArtifactName {
    pub fn new(architecture: Architecture, data_dir: &Path, epochs: usize, batch_size: usize) -> Self {
        Self {
            architecture,
            data_tag: data_tag(data_dir),
            epochs,
            batch_size,
        }
    }

    /// `<model>_<tag>_e_<epochs>_b_<batch>`
    pub fn stem(&self) -> String {
        format!(
            "{}_{}_e_{}_b_{}",
            self.architecture, self.data_tag, self.epochs, self.batch_size
        )
    }

    pub fn history_file(&self) -> String {
        format!("hist_{}.json", self.stem())
    }

    pub fn metrics_file(&self) -> String {
        format!("metrics_{}.csv", self.stem())
    }
}

/// First two characters of the data directory's last component.
pub fn data_tag(data_dir: &Path) -> String {
    data_dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.chars().take(2).collect())
        .unwrap_or_default()
}

// ─── CheckpointManager ────────────────────────────────────────────────────────
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the artifact directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create artifact directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save model weights under the run's stem. Returns the path
    /// passed to the recorder (without the recorder's extension).
    pub fn save_model<B: Backend, M: Module<B>>(&self, model: &M, name: &ArtifactName) -> Result<PathBuf> {
        let path = self.dir.join(name.stem());

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save weights to '{}'", path.display()))?;

        tracing::info!("Saved best weights to '{}'", path.display());
        Ok(path)
    }

    /// Save the per-epoch accuracy sequences as a JSON pair.
    pub fn save_history(&self, history: &TrainingHistory, name: &ArtifactName) -> Result<PathBuf> {
        let path = self.dir.join(name.history_file());
        let json = serde_json::to_string(history)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write history to '{}'", path.display()))?;

        tracing::info!("Saved accuracy history to '{}'", path.display());
        Ok(path)
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, nn::LinearConfig};

    #[test]
    fn test_data_tag_takes_two_chars() {
        assert_eq!(data_tag(Path::new("./data/ethnicity")), "et");
        assert_eq!(data_tag(Path::new("data/gender/")), "ge");
        assert_eq!(data_tag(Path::new("x")), "x");
    }

    #[test]
    fn test_artifact_names() {
        let name = ArtifactName::new(Architecture::ResNet34, Path::new("data/identity"), 50, 20);
        assert_eq!(name.stem(), "resnet34_id_e_50_b_20");
        assert_eq!(name.history_file(), "hist_resnet34_id_e_50_b_20.json");
    }

    #[test]
    fn test_history_is_written_as_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointManager::new(dir.path().join("out")).unwrap();
        let name = ArtifactName::new(Architecture::ResNet18, Path::new("data/gender"), 2, 4);
        let history = TrainingHistory { train_acc: vec![0.5, 1.0], val_acc: vec![0.25, 0.75] };

        let path = store.save_history(&history, &name).unwrap();
        let back: TrainingHistory = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, history);
    }

    #[test]
    fn test_model_record_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointManager::new(dir.path()).unwrap();
        let name = ArtifactName::new(Architecture::DenseNet121, Path::new("data/ethnicity"), 1, 1);

        let device = Default::default();
        let model = LinearConfig::new(4, 2).init::<NdArray>(&device);
        store.save_model(&model, &name).unwrap();

        assert!(dir.path().join("densenet121_et_e_1_b_1.mpk").exists());
    }
}
