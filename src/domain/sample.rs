// ============================================================
// Layer 3: Sample and Split Domain Types
// ============================================================
// A sample is one photo of one subject. On disk it lives at
// <subject_dir>/<photo_index>.png, and the split index file
// refers to it by a single "global id":
//
//   global_id = (subject_id - 1) * photos_per_subject + photo_index
//
// Both subject ids and photo indices are 1-based, so with 10
// photos per subject, subject 1 owns ids 1..=10, subject 2 owns
// 11..=20, and so on.
//
// Reference: Rust Book §5 (Structs), §6 (Enums)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one photo of one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleKey {
    /// 1-based subject id, parsed from the subject directory name
    pub subject_id: u32,

    /// Photo index, parsed from the file stem ("3.png" -> 3)
    pub photo_index: u32,
}

impl SampleKey {
    pub fn new(subject_id: u32, photo_index: u32) -> Self {
        Self { subject_id, photo_index }
    }

    /// Global sample id as used by the split index file.
    ///
    /// Fails for subject id 0, which has no place in a 1-based scheme.
    pub fn global_id(&self, photos_per_subject: u32) -> Result<u64> {
        if self.subject_id == 0 {
            bail!("subject ids are 1-based, got subject 0");
        }
        Ok((self.subject_id as u64 - 1) * photos_per_subject as u64 + self.photo_index as u64)
    }
}

// ─── Split ────────────────────────────────────────────────────────────────────
/// The three dataset partitions. Every sample belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    /// Directory name of this split inside a partitioned tree
    pub fn dir_name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_id_first_subject() {
        assert_eq!(SampleKey::new(1, 1).global_id(10).unwrap(), 1);
        assert_eq!(SampleKey::new(1, 10).global_id(10).unwrap(), 10);
    }

    #[test]
    fn test_global_id_later_subject() {
        // subject 3, photo 4 -> 2 * 10 + 4
        assert_eq!(SampleKey::new(3, 4).global_id(10).unwrap(), 24);
    }

    #[test]
    fn test_global_id_respects_declared_photo_count() {
        assert_eq!(SampleKey::new(2, 1).global_id(5).unwrap(), 6);
    }

    #[test]
    fn test_subject_zero_is_rejected() {
        assert!(SampleKey::new(0, 1).global_id(10).is_err());
    }

    #[test]
    fn test_split_dir_names() {
        let names: Vec<_> = Split::ALL.iter().map(|s| s.dir_name()).collect();
        assert_eq!(names, vec!["train", "val", "test"]);
    }
}
