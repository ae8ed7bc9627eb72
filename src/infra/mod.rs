// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Everything a training run leaves on disk:
//
//   checkpoint.rs - artifact naming plus saving of the best
//                   weights (CompactRecorder), the accuracy
//                   history and the run's TrainConfig as JSON
//
//   metrics.rs    - per-epoch loss/accuracy rows appended to a
//                   CSV file for later plotting
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Artifact names and writers
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
