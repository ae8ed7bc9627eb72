// ============================================================
// Layer 4: Split Index File
// ============================================================
// Reads the pre-computed test/validation sample lists.
//
// File format (awe/test.txt):
//   line 1: whitespace-separated global ids of TEST samples
//   line 2: whitespace-separated global ids of VALIDATION samples
//
// Every id that appears on neither line is a TRAINING sample.
// Blank lines are ignored, so a trailing newline is harmless.
//
// If an id is listed on both lines, test wins because it is
// checked first; the overlap is reported as a warning.

use anyhow::{bail, Context, Result};
use std::{collections::HashSet, fs, path::Path};

use crate::domain::sample::Split;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitIndex {
    test: HashSet<u64>,
    val: HashSet<u64>,
}

impl SplitIndex {
    pub fn new(test: impl IntoIterator<Item = u64>, val: impl IntoIterator<Item = u64>) -> Self {
        Self {
            test: test.into_iter().collect(),
            val: val.into_iter().collect(),
        }
    }

    /// Read and parse an index file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read split index file '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid split index file '{}'", path.display()))
    }

    /// Parse the two-line index format.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        let (Some(test_line), Some(val_line)) = (lines.next(), lines.next()) else {
            bail!("expected two non-empty lines (test ids, validation ids)");
        };

        let index = Self::new(
            parse_ids(test_line).context("line 1 (test ids)")?,
            parse_ids(val_line).context("line 2 (validation ids)")?,
        );

        let overlap = index.test.intersection(&index.val).count();
        if overlap > 0 {
            tracing::warn!("{} sample ids are listed as both test and validation; test wins", overlap);
        }

        tracing::debug!("Split index: {} test ids, {} validation ids", index.test.len(), index.val.len());
        Ok(index)
    }

    /// Which split a global sample id belongs to.
    pub fn assign(&self, global_id: u64) -> Split {
        if self.test.contains(&global_id) {
            Split::Test
        } else if self.val.contains(&global_id) {
            Split::Val
        } else {
            Split::Train
        }
    }

    pub fn test_len(&self) -> usize {
        self.test.len()
    }

    pub fn val_len(&self) -> usize {
        self.val.len()
    }
}

fn parse_ids(line: &str) -> Result<HashSet<u64>> {
    line.split_whitespace()
        .map(|tok| {
            tok.parse::<u64>()
                .with_context(|| format!("'{tok}' is not a sample id"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_lines() {
        let idx = SplitIndex::parse("1 5\n2\n").unwrap();
        assert_eq!(idx.test_len(), 2);
        assert_eq!(idx.val_len(), 1);
        assert_eq!(idx.assign(1), Split::Test);
        assert_eq!(idx.assign(5), Split::Test);
        assert_eq!(idx.assign(2), Split::Val);
        assert_eq!(idx.assign(3), Split::Train);
    }

    #[test]
    fn test_blank_lines_and_extra_spaces_are_ignored() {
        let idx = SplitIndex::parse("\n  7   8 \n\n9\n").unwrap();
        assert_eq!(idx.assign(8), Split::Test);
        assert_eq!(idx.assign(9), Split::Val);
    }

    #[test]
    fn test_overlap_resolves_to_test() {
        let idx = SplitIndex::parse("4\n4 6\n").unwrap();
        assert_eq!(idx.assign(4), Split::Test);
        assert_eq!(idx.assign(6), Split::Val);
    }

    #[test]
    fn test_single_line_is_rejected() {
        assert!(SplitIndex::parse("1 2 3\n").is_err());
    }

    #[test]
    fn test_non_numeric_token_is_rejected() {
        assert!(SplitIndex::parse("1 x\n2\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.txt");
        fs::write(&path, "10 20\n30\n").unwrap();
        let idx = SplitIndex::load(&path).unwrap();
        assert_eq!(idx.assign(20), Split::Test);
        assert_eq!(idx.assign(30), Split::Val);
    }
}
