// ============================================================
// Layer 6: Metrics Logger
// ============================================================
// Appends one CSV row per epoch so learning curves can be
// plotted after (or during) a run.
//
//   epoch,train_loss,train_acc,val_loss,val_acc
//   0,1.386294,0.312500,1.201337,0.450000
//   1,1.044210,0.587500,1.120054,0.500000
//
// Loss is the mean cross-entropy per sample; accuracy is the
// fraction of correct argmax predictions, both over the whole
// split.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Loss and accuracy of one phase over a whole split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseStats {
    pub loss: f64,
    pub acc: f64,
}

impl PhaseStats {
    /// Derive epoch statistics from running sums.
    ///
    /// `running_loss` is the sum of batch-mean losses weighted by batch
    /// size. An empty split yields zero loss and zero accuracy.
    pub fn from_running(running_loss: f64, corrects: usize, samples: usize) -> Self {
        if samples == 0 {
            return Self::default();
        }
        Self {
            loss: running_loss / samples as f64,
            acc: corrects as f64 / samples as f64,
        }
    }
}

/// One row of the metrics CSV
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 0-based epoch number
    pub epoch: usize,
    pub train: PhaseStats,
    pub val: PhaseStats,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train: PhaseStats, val: PhaseStats) -> Self {
        Self { epoch, train, val }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so
    /// reruns with the same name append below earlier rows.
    pub fn new(dir: &Path, file_name: &str) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join(file_name);

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "epoch,train_loss,train_acc,val_loss,val_acc")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.train.loss, m.train.acc, m.val.loss, m.val.acc,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
