// ============================================================
// Layer 4: Image Folder Dataset
// ============================================================
// Reads one split of a partitioned tree:
//
//   data/ethnicity/train/<class>/<image>.png
//
// Class names are the sorted subdirectory names of a reference
// split (the trainer uses `test`). The same name -> index map is
// applied to every split so index 3 means the same class in
// train and val.
//
// Items only hold (path, label). Every image is fully decoded
// once here and dropped, so a truncated or corrupt file fails
// the run before training starts. The batcher decodes again
// per batch, so the whole dataset never sits in memory at once.
//
// Reference: Burn Book §4 (Dataset)

use anyhow::{bail, Context, Result};
use burn::data::dataset::Dataset;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// One labelled image on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageItem {
    pub path: PathBuf,
    pub label: usize,
}

pub struct ImageFolderDataset {
    items: Vec<ImageItem>,
    classes: Vec<String>,
}

impl ImageFolderDataset {
    /// Index every image under `split_dir` using the given class list.
    pub fn new(split_dir: &Path, classes: &[String]) -> Result<Self> {
        if !split_dir.is_dir() {
            bail!("Split directory '{}' does not exist", split_dir.display());
        }

        let index_map: HashMap<&str, usize> = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        let mut items = Vec::new();

        for class_dir in sorted_entries(split_dir)?.into_iter().filter(|p| p.is_dir()) {
            let Some(class_name) = class_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let Some(&label) = index_map.get(class_name) else {
                tracing::warn!(
                    "Class '{}' in '{}' is not among the known classes, skipping",
                    class_name,
                    split_dir.display()
                );
                continue;
            };

            let images: Vec<PathBuf> = sorted_entries(&class_dir)?
                .into_iter()
                .filter(|p| p.is_file() && is_image(p))
                .collect();

            for path in images {
                image::open(&path)
                    .with_context(|| format!("Cannot decode image '{}'", path.display()))?;
                items.push(ImageItem { path, label });
            }
        }

        tracing::info!(
            "Indexed {} images in '{}' ({} classes)",
            items.len(),
            split_dir.display(),
            classes.len()
        );

        Ok(Self { items, classes: classes.to_vec() })
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }
}

impl Dataset<ImageItem> for ImageFolderDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Sorted class names: the subdirectories of `split_dir`.
pub fn discover_classes(split_dir: &Path) -> Result<Vec<String>> {
    let classes: Vec<String> = sorted_entries(split_dir)
        .with_context(|| format!("Cannot list classes in '{}'", split_dir.display()))?
        .into_iter()
        .filter(|p| p.is_dir())
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect();

    if classes.is_empty() {
        bail!("No class directories found in '{}'", split_dir.display());
    }
    Ok(classes)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Cannot read directory '{}'", dir.display()))? {
        paths.push(entry?.path());
    }
    paths.sort();
    Ok(paths)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])).save(path).unwrap();
    }

    #[test]
    fn test_classes_are_sorted_directory_names() {
        let dir = tempfile::tempdir().unwrap();
        for c in ["2", "10", "1"] {
            fs::create_dir_all(dir.path().join("test").join(c)).unwrap();
        }
        fs::write(dir.path().join("test/readme.txt"), "x").unwrap();

        let classes = discover_classes(&dir.path().join("test")).unwrap();
        assert_eq!(classes, vec!["1", "10", "2"]);
    }

    #[test]
    fn test_labels_follow_shared_class_map() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("train/b/x_1.png"));
        write_png(&dir.path().join("train/b/x_2.png"));
        write_png(&dir.path().join("train/a/y_1.png"));
        fs::write(dir.path().join("train/a/notes.txt"), "x").unwrap();

        let classes = vec!["a".to_string(), "b".to_string()];
        let ds = ImageFolderDataset::new(&dir.path().join("train"), &classes).unwrap();

        assert_eq!(ds.len(), 3);
        let labels: Vec<usize> = (0..ds.len()).map(|i| ds.get(i).unwrap().label).collect();
        assert_eq!(labels, vec![0, 1, 1]);
        assert_eq!(ds.get(1).unwrap().path.file_name().unwrap(), "x_1.png");
        assert!(ds.get(3).is_none());
    }

    #[test]
    fn test_unknown_class_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("val/a/1.png"));
        write_png(&dir.path().join("val/zzz/1.png"));

        let ds = ImageFolderDataset::new(&dir.path().join("val"), &["a".to_string()]).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_unreadable_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("val/a")).unwrap();
        fs::write(dir.path().join("val/a/broken.png"), "not a png").unwrap();

        assert!(ImageFolderDataset::new(&dir.path().join("val"), &["a".to_string()]).is_err());
    }

    #[test]
    fn test_truncated_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train/a/1.png");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_fn(32, 32, |x, y| Rgb([x as u8 * 8, y as u8 * 8, 0])).save(&path).unwrap();

        // header intact, pixel data cut off
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
        assert!(image::image_dimensions(&path).is_ok());

        assert!(ImageFolderDataset::new(&dir.path().join("train"), &["a".to_string()]).is_err());
    }

    #[test]
    fn test_missing_split_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageFolderDataset::new(&dir.path().join("train"), &["a".to_string()]).is_err());
    }
}
