// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// Everything between files on disk and tensor batches.
//
// Preparation (the `prepare` command):
//
//   awe/test.txt          -> SplitIndex        (which split each id goes to)
//   awe/<id>/annotations  -> JsonAnnotationSource
//   awe/<id>/*.png        -> Partitioner       (copies into data/<scheme>/...)
//
// Training (the `train` command):
//
//   data/<scheme>/<split>/<class>/*.png
//       │
//       ▼
//   ImageFolderDataset  -> (path, label) items, implements burn's Dataset
//       │
//       ▼
//   ImageBatcher        -> decode + resize + normalise -> tensors
//       │
//       ▼
//   DataLoader          -> feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Parses the test/validation index file
pub mod split_index;

/// Reads per-subject annotations.json files
pub mod annotations;

/// Copies raw subject folders into the split/label tree
pub mod partitioner;

/// Resize + ImageNet normalisation
pub mod transform;

/// Implements Burn's Dataset trait over a split directory
pub mod image_folder;

/// Implements Burn's Batcher trait to create image batches
pub mod batcher;
