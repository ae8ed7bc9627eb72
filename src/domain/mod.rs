// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing the
// concepts of the pipeline: samples and splits, label schemes
// and annotations, the architecture selector and the training
// history.
//
// Rules for this layer:
//   - NO burn types
//   - NO file I/O
//   - Only plain data and the traits other layers implement

// Sample keys, global ids and the train/val/test split
pub mod sample;

// Label schemes and per-subject annotation records
pub mod label;

// The closed set of trainable backbones
pub mod architecture;

// Per-epoch accuracy sequences
pub mod history;

// Core abstractions (traits) that other layers implement
pub mod traits;
