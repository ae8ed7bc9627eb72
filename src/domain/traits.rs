// ============================================================
// Layer 3: Core Traits (Abstractions)
// ============================================================
// The partitioner only needs "give me the annotation of this
// subject". Keeping that behind a trait lets tests feed
// annotations from memory while the app reads them from the
// annotations.json file inside each subject directory.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use std::path::Path;

use crate::domain::label::Annotation;

// ─── AnnotationSource ─────────────────────────────────────────────────────────
/// Any component that can produce a subject's annotation record.
///
/// Implementations:
///   - JsonAnnotationSource -> reads <subject_dir>/annotations.json
pub trait AnnotationSource {
    /// Load the annotation of the subject stored in `subject_dir`.
    fn load(&self, subject_dir: &Path) -> Result<Annotation>;
}
