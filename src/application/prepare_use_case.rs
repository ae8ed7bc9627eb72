// ============================================================
// Layer 2: PrepareUseCase
// ============================================================
// Turns the raw AWE layout into an image-folder tree for one
// label scheme:
//
//   Step 1: Clean or inspect the output directory
//   Step 2: Parse the split index file          (Layer 4 - data)
//   Step 3: Partition subjects into the tree    (Layer 4 - data)
//   Step 4: Warn when nothing was copied
//
// Re-running without --clean copies over the previous run but
// never deletes, so files from an earlier index may linger.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::{
    annotations::JsonAnnotationSource,
    partitioner::{PartitionReport, Partitioner},
    split_index::SplitIndex,
};
use crate::domain::label::LabelScheme;

// ─── Preparation Configuration ───────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareConfig {
    /// Raw dataset root with one directory per subject
    pub source_dir: String,
    /// Root under which `<scheme>/` is created
    pub output_dir: String,
    /// Two-line index file: test ids, then validation ids
    pub split_file: String,
    pub scheme: LabelScheme,
    pub photos_per_subject: u32,
    /// Remove `<output_dir>/<scheme>` before partitioning
    pub clean: bool,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            source_dir: "awe".to_string(),
            output_dir: "data".to_string(),
            split_file: "awe/test.txt".to_string(),
            scheme: LabelScheme::Ethnicity,
            photos_per_subject: 10,
            clean: false,
        }
    }
}

impl PrepareConfig {
    pub fn scheme_output_dir(&self) -> PathBuf {
        Path::new(&self.output_dir).join(self.scheme.as_str())
    }
}

// ─── PrepareUseCase ───────────────────────────────────────────────────────────
pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<PartitionReport> {
        let cfg = &self.config;
        let out_dir = cfg.scheme_output_dir();

        // ── Step 1: Stale output ──────────────────────────────────────────────
        if out_dir.exists() {
            if cfg.clean {
                fs::remove_dir_all(&out_dir)
                    .with_context(|| format!("Cannot remove '{}'", out_dir.display()))?;
                tracing::info!("Removed previous output '{}'", out_dir.display());
            } else if !is_empty_dir(&out_dir)? {
                tracing::warn!(
                    "'{}' is not empty; files from earlier runs may remain (use --clean)",
                    out_dir.display()
                );
            }
        }

        // ── Step 2: Split index ───────────────────────────────────────────────
        let index = SplitIndex::load(Path::new(&cfg.split_file))?;
        tracing::info!(
            "Split index: {} test ids, {} validation ids",
            index.test_len(),
            index.val_len()
        );

        // ── Step 3: Partition ─────────────────────────────────────────────────
        tracing::info!(
            "Partitioning '{}' by {} into '{}'",
            cfg.source_dir,
            cfg.scheme,
            out_dir.display()
        );
        let partitioner = Partitioner::new(cfg, &index, JsonAnnotationSource::new());
        let report = partitioner.run()?;

        // ── Step 4: Report ────────────────────────────────────────────────────
        if report.total_copied() == 0 {
            tracing::warn!("No images were copied from '{}'", cfg.source_dir);
        }

        Ok(report)
    }
}

fn is_empty_dir(dir: &Path) -> Result<bool> {
    let mut entries =
        fs::read_dir(dir).with_context(|| format!("Cannot read directory '{}'", dir.display()))?;
    Ok(entries.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::annotations::ANNOTATION_FILE;
    use crate::domain::sample::Split;

    fn seed_source(root: &Path) {
        let subject = root.join("01");
        fs::create_dir_all(&subject).unwrap();
        fs::write(subject.join(ANNOTATION_FILE), r#"{"gender": "m", "ethnicity": 1}"#).unwrap();
        for i in 1..=10 {
            fs::write(subject.join(format!("{i}.png")), b"png").unwrap();
        }
        fs::write(root.join("test.txt"), "1 5\n2\n").unwrap();
    }

    fn config(root: &Path, clean: bool) -> PrepareConfig {
        PrepareConfig {
            source_dir: root.join("awe").display().to_string(),
            output_dir: root.join("data").display().to_string(),
            split_file: root.join("awe").join("test.txt").display().to_string(),
            scheme: LabelScheme::Gender,
            photos_per_subject: 10,
            clean,
        }
    }

    #[test]
    fn test_scheme_output_dir() {
        let cfg = PrepareConfig::default();
        assert_eq!(cfg.scheme_output_dir(), Path::new("data").join("ethnicity"));
    }

    #[test]
    fn test_execute_reports_split_counts() {
        let dir = tempfile::tempdir().unwrap();
        seed_source(&dir.path().join("awe"));

        let report = PrepareUseCase::new(config(dir.path(), false)).execute().unwrap();
        assert_eq!(report.subjects, 1);
        assert_eq!(report.copied_to(Split::Test), 2);
        assert_eq!(report.copied_to(Split::Val), 1);
        assert_eq!(report.copied_to(Split::Train), 7);
        assert!(dir.path().join("data/gender/val/m/01_2.png").exists());
    }

    #[test]
    fn test_clean_removes_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        seed_source(&dir.path().join("awe"));

        let stale = dir.path().join("data/gender/train/x/old.png");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"old").unwrap();

        // without --clean the stale file survives
        PrepareUseCase::new(config(dir.path(), false)).execute().unwrap();
        assert!(stale.exists());

        PrepareUseCase::new(config(dir.path(), true)).execute().unwrap();
        assert!(!stale.exists());
        assert!(dir.path().join("data/gender/test/m/01_5.png").exists());
    }
}
