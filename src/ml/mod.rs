// ============================================================
// Layer 5: ML / Model Layer (Burn)
// ============================================================
// The CNN backbones, torchvision weight loading and the
// fine-tuning loop.
//
//   classifier.rs - ImageClassifier trait + per-family builders
//                   (ImageNet head -> pretrained weights -> new head)
//
//   resnet.rs     - ResNet-18 / ResNet-34 (basic residual blocks)
//
//   densenet.rs   - DenseNet-121 / DenseNet-169
//
//   pretrained.rs - .pth state dict -> burn record, with key remaps
//
//   trainer.rs    - train/val epoch loop, best-epoch snapshot,
//                   architecture dispatch and artifact saving
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            He et al. (2015) Deep Residual Learning
//            Huang et al. (2017) Densely Connected Networks

pub mod classifier;

pub mod resnet;

pub mod densenet;

/// Loads torchvision checkpoints through burn-import
pub mod pretrained;

/// Fine-tuning loop with validation and best-model selection
pub mod trainer;
