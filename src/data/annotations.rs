// ============================================================
// Layer 4: Annotation Loader
// ============================================================
// Reads <subject_dir>/annotations.json with serde_json.
// A missing or malformed file is an error: the partitioner
// cannot label a subject without it.

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::domain::label::Annotation;
use crate::domain::traits::AnnotationSource;

/// File name of the per-subject annotation record
pub const ANNOTATION_FILE: &str = "annotations.json";

#[derive(Debug, Clone, Default)]
pub struct JsonAnnotationSource;

impl JsonAnnotationSource {
    pub fn new() -> Self {
        Self
    }
}

impl AnnotationSource for JsonAnnotationSource {
    fn load(&self, subject_dir: &Path) -> Result<Annotation> {
        let path = subject_dir.join(ANNOTATION_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read annotation '{}'", path.display()))?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed annotation '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_annotation_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ANNOTATION_FILE), r#"{"gender": "f", "ethnicity": 2}"#).unwrap();

        let a = JsonAnnotationSource::new().load(dir.path()).unwrap();
        assert_eq!(a.field("gender").unwrap(), "f");
        assert_eq!(a.field("ethnicity").unwrap(), "2");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonAnnotationSource::new().load(dir.path()).is_err());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ANNOTATION_FILE), "{ not json").unwrap();
        assert!(JsonAnnotationSource::new().load(dir.path()).is_err());
    }
}
