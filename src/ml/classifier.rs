// ============================================================
// Layer 5: Classifier Abstraction and Construction
// ============================================================
// Every backbone maps an image batch [N, 3, H, W] to class
// logits [N, num_classes]. The training loop only relies on
// this trait, so the same loop fine-tunes ResNets and DenseNets.
//
// Both constructors build the backbone with the 1000-class
// ImageNet head, optionally load torchvision weights into it,
// then swap the head for a fresh linear layer sized to the
// dataset. The trainer picks which one to call per Architecture.

use anyhow::Result;
use burn::prelude::*;
use std::path::Path;

use crate::domain::architecture::Architecture;
use crate::ml::densenet::{DenseNet, DenseNetConfig};
use crate::ml::pretrained::load_torchvision_record;
use crate::ml::resnet::{ResNet, ResNetConfig};

/// Classes of the ImageNet head shipped with torchvision weights
pub const IMAGENET_CLASSES: usize = 1000;

pub trait ImageClassifier<B: Backend>: Module<B> {
    /// images: [batch, 3, H, W] -> logits: [batch, num_classes]
    fn classify(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;
}

/// Build a ResNet from `config` (which carries the ImageNet head).
pub fn build_resnet<B: Backend>(
    arch: Architecture,
    config: ResNetConfig,
    num_classes: usize,
    pretrained: Option<&Path>,
    device: &B::Device,
) -> Result<ResNet<B>> {
    let mut model = config.init::<B>(device);
    if let Some(path) = pretrained {
        let record = load_torchvision_record(path, &config.torchvision_key_remap(), device)?;
        model = model.load_record(record);
        tracing::info!("Loaded pretrained {} weights from '{}'", arch, path.display());
    }

    Ok(model.with_head(num_classes, device))
}

/// Build a DenseNet from `config` (which carries the ImageNet head).
pub fn build_densenet<B: Backend>(
    arch: Architecture,
    config: DenseNetConfig,
    num_classes: usize,
    pretrained: Option<&Path>,
    device: &B::Device,
) -> Result<DenseNet<B>> {
    let mut model = config.init::<B>(device);
    if let Some(path) = pretrained {
        let record = load_torchvision_record(path, &config.torchvision_key_remap(), device)?;
        model = model.load_record(record);
        tracing::info!("Loaded pretrained {} weights from '{}'", arch, path.display());
    }

    Ok(model.with_head(num_classes, device))
}
