// ============================================================
// Layer 2: Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal per command: partition the raw dataset, or fine-tune a
// classifier on a partitioned tree.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Raw dataset -> split/label image tree
pub mod prepare_use_case;

// The training workflow
pub mod train_use_case;
