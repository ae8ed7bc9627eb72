// ============================================================
// Layer 4: Dataset Partitioner
// ============================================================
// Turns the raw AWE layout
//
//   awe/
//     01/annotations.json
//     01/1.png ... 01/10.png
//     02/...
//
// into an ImageFolder-style tree for one label scheme:
//
//   data/<scheme>/train/<label>/01_3.png
//   data/<scheme>/val/<label>/01_2.png
//   data/<scheme>/test/<label>/01_1.png
//
// Per subject:
//   1. load its annotation and resolve the label
//   2. create <split>/<label>/ under all three splits
//   3. for every .png, compute the global id, ask the
//      SplitIndex where it goes and copy it there, prefixing the
//      subject directory name so photo "1.png" of different
//      subjects never collide
//
// Subjects and files are visited in sorted order. There is no
// rollback: an error halfway leaves a partial tree behind.
//
// Reference: Rust Book §9 (Error Handling), §12 (File I/O)

use anyhow::{bail, Context, Result};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use crate::application::prepare_use_case::PrepareConfig;
use crate::data::split_index::SplitIndex;
use crate::domain::label::{resolve_label, LabelScheme};
use crate::domain::sample::{SampleKey, Split};
use crate::domain::traits::AnnotationSource;

/// Summary of one partitioning run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionReport {
    /// Number of subject directories processed
    pub subjects: usize,

    /// Copied images per split
    pub copied: BTreeMap<Split, usize>,

    /// Distinct label values seen across subjects
    pub labels: BTreeSet<String>,
}

impl PartitionReport {
    pub fn copied_to(&self, split: Split) -> usize {
        self.copied.get(&split).copied().unwrap_or(0)
    }

    pub fn total_copied(&self) -> usize {
        self.copied.values().sum()
    }
}

pub struct Partitioner<'a, S: AnnotationSource> {
    source_dir: PathBuf,
    output_dir: PathBuf,
    scheme: LabelScheme,
    photos_per_subject: u32,
    index: &'a SplitIndex,
    annotations: S,
}

impl<'a, S: AnnotationSource> Partitioner<'a, S> {
    pub fn new(cfg: &PrepareConfig, index: &'a SplitIndex, annotations: S) -> Self {
        Self {
            source_dir: PathBuf::from(&cfg.source_dir),
            output_dir: cfg.scheme_output_dir(),
            scheme: cfg.scheme,
            photos_per_subject: cfg.photos_per_subject,
            index,
            annotations,
        }
    }

    /// Root of the tree this partitioner writes: <output_dir>/<scheme>
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Walk every subject directory and copy its images into place.
    pub fn run(&self) -> Result<PartitionReport> {
        let mut report = PartitionReport::default();

        for (subject_dir, subject_name) in list_subjects(&self.source_dir)? {
            self.partition_subject(&subject_dir, &subject_name, &mut report)
                .with_context(|| format!("Failed to partition subject '{}'", subject_dir.display()))?;
            report.subjects += 1;
        }

        tracing::info!(
            "Partitioned {} subjects into '{}' ({} labels): {} train, {} val, {} test",
            report.subjects,
            self.output_dir().display(),
            report.labels.len(),
            report.copied_to(Split::Train),
            report.copied_to(Split::Val),
            report.copied_to(Split::Test),
        );
        Ok(report)
    }

    fn partition_subject(&self, subject_dir: &Path, subject_name: &str, report: &mut PartitionReport) -> Result<()> {
        let subject_id: u32 = subject_name
            .parse()
            .with_context(|| format!("Subject directory name '{subject_name}' is not a numeric id"))?;

        let annotation = self.annotations.load(subject_dir)?;
        let label = resolve_label(self.scheme, subject_name, &annotation)?;

        // Label directories exist under every split, even if this
        // subject contributes nothing to some of them.
        for split in Split::ALL {
            let dir = self.label_dir(split, &label);
            fs::create_dir_all(&dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }

        for (path, file_name) in list_files(subject_dir)? {
            let Some(photo_index) = parse_photo_file(&file_name)? else {
                continue;
            };

            let key = SampleKey::new(subject_id, photo_index);
            let split = self.index.assign(key.global_id(self.photos_per_subject)?);

            let dest = self
                .label_dir(split, &label)
                .join(format!("{subject_name}_{file_name}"));

            fs::copy(&path, &dest)
                .with_context(|| format!("Cannot copy '{}' to '{}'", path.display(), dest.display()))?;

            tracing::debug!("{} -> {}", path.display(), dest.display());
            *report.copied.entry(split).or_insert(0) += 1;
        }

        report.labels.insert(label);
        Ok(())
    }

    fn label_dir(&self, split: Split, label: &str) -> PathBuf {
        self.output_dir.join(split.dir_name()).join(label)
    }
}

/// Parse an image file name into its photo index.
///
/// Returns `Ok(None)` for files that are not `.png` (the annotation
/// file included). A name that is not exactly `<stem>.<ext>`, or a
/// png whose stem is not a number, is an error.
pub fn parse_photo_file(file_name: &str) -> Result<Option<u32>> {
    let parts: Vec<&str> = file_name.split('.').collect();
    let [stem, ext] = parts.as_slice() else {
        bail!("File name '{file_name}' does not split into <index>.<extension>");
    };

    if *ext != "png" {
        return Ok(None);
    }

    let index = stem
        .parse::<u32>()
        .with_context(|| format!("Photo '{file_name}' does not have a numeric index"))?;
    Ok(Some(index))
}

/// Subject directories under `root`, sorted by name. Plain files are skipped.
fn list_subjects(root: &Path) -> Result<Vec<(PathBuf, String)>> {
    let mut subjects = Vec::new();

    for entry in fs::read_dir(root)
        .with_context(|| format!("Cannot read source directory '{}'", root.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        subjects.push((path.clone(), file_name_of(&path)?));
    }

    subjects.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(subjects)
}

/// Regular files inside a subject directory, sorted by name.
fn list_files(dir: &Path) -> Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read subject directory '{}'", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() {
            files.push((path.clone(), file_name_of(&path)?));
        }
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

fn file_name_of(path: &Path) -> Result<String> {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => Ok(name.to_string()),
        None => bail!("Path '{}' has no UTF-8 file name", path.display()),
    }
}
