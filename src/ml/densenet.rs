// ============================================================
// Layer 5: DenseNet-121 / DenseNet-169
// ============================================================
// Densely connected networks (Huang et al. 2017). Each dense
// layer sees the concatenation of all previous feature maps in
// its block and adds `growth_rate` new channels:
//
//   features:
//     conv0 -> norm0 -> relu -> pool0
//     blocks[0] -> transitions[0] -> blocks[1] -> ... -> blocks[3]
//     norm5
//   relu -> adaptive avg pool -> flatten -> classifier
//
// A transition halves both the channel count and the spatial size.
//
// densenet121 = [6, 12, 24, 16] layers per block  (1024 features)
// densenet169 = [6, 12, 32, 32] layers per block  (1664 features)

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{
            AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, AvgPool2d, AvgPool2dConfig, MaxPool2d,
            MaxPool2dConfig,
        },
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::classifier::ImageClassifier;

#[derive(Config, Debug)]
pub struct DenseNetConfig {
    /// Dense layers per block
    pub block_config: [usize; 4],
    pub num_classes: usize,
    #[config(default = 32)]
    pub growth_rate: usize,
    #[config(default = 64)]
    pub num_init_features: usize,
    /// Bottleneck width multiplier (bn_size * growth_rate channels)
    #[config(default = 4)]
    pub bn_size: usize,
}

impl DenseNetConfig {
    pub fn densenet121(num_classes: usize) -> Self {
        Self::new([6, 12, 24, 16], num_classes)
    }

    pub fn densenet169(num_classes: usize) -> Self {
        Self::new([6, 12, 32, 32], num_classes)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> DenseNet<B> {
        let mut channels = self.num_init_features;
        let mut blocks = Vec::with_capacity(self.block_config.len());
        let mut transitions = Vec::with_capacity(self.block_config.len() - 1);

        for (i, &layers) in self.block_config.iter().enumerate() {
            blocks.push(self.dense_block(channels, layers, device));
            channels += layers * self.growth_rate;

            if i + 1 < self.block_config.len() {
                transitions.push(Transition::new(channels, channels / 2, device));
                channels /= 2;
            }
        }

        let features = DenseFeatures {
            conv0: Conv2dConfig::new([3, self.num_init_features], [7, 7])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(3, 3))
                .with_bias(false)
                .init(device),
            norm0: BatchNormConfig::new(self.num_init_features).init(device),
            pool0: MaxPool2dConfig::new([3, 3])
                .with_strides([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(),
            blocks,
            transitions,
            norm5: BatchNormConfig::new(channels).init(device),
        };

        DenseNet {
            features,
            avgpool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            classifier: LinearConfig::new(channels, self.num_classes).init(device),
        }
    }

    fn dense_block<B: Backend>(&self, in_channels: usize, layers: usize, device: &B::Device) -> DenseBlock<B> {
        let layers = (0..layers)
            .map(|i| {
                DenseLayer::new(
                    in_channels + i * self.growth_rate,
                    self.growth_rate,
                    self.bn_size,
                    device,
                )
            })
            .collect();
        DenseBlock { layers }
    }

    /// Regex remaps from torchvision key names to this module tree.
    ///
    /// torchvision numbers blocks, layers and transitions from 1
    /// (`features.denseblock1.denselayer1.conv1.weight`); here they
    /// are Vec indices from 0 (`features.blocks.0.layers.0.conv1.weight`).
    /// Old checkpoints also spell `norm1` as `norm.1`.
    pub fn torchvision_key_remap(&self) -> Vec<(String, String)> {
        let mut remap = vec![(r"(norm|relu|conv)\.([12])\.".to_string(), "${1}${2}.".to_string())];

        for (b, &layers) in self.block_config.iter().enumerate() {
            for l in 0..layers {
                remap.push((
                    format!(r"^features\.denseblock{}\.denselayer{}\.", b + 1, l + 1),
                    format!("features.blocks.{b}.layers.{l}."),
                ));
            }
        }
        for t in 0..self.block_config.len() - 1 {
            remap.push((
                format!(r"^features\.transition{}\.", t + 1),
                format!("features.transitions.{t}."),
            ));
        }
        remap
    }
}

// ─── DenseLayer ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct DenseLayer<B: Backend> {
    pub norm1: BatchNorm<B, 2>,
    pub conv1: Conv2d<B>,
    pub norm2: BatchNorm<B, 2>,
    pub conv2: Conv2d<B>,
}

impl<B: Backend> DenseLayer<B> {
    pub fn new(in_channels: usize, growth_rate: usize, bn_size: usize, device: &B::Device) -> Self {
        let bottleneck = bn_size * growth_rate;
        Self {
            norm1: BatchNormConfig::new(in_channels).init(device),
            conv1: Conv2dConfig::new([in_channels, bottleneck], [1, 1])
                .with_bias(false)
                .init(device),
            norm2: BatchNormConfig::new(bottleneck).init(device),
            conv2: Conv2dConfig::new([bottleneck, growth_rate], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_bias(false)
                .init(device),
        }
    }

    /// Returns only the new `growth_rate` channels.
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv1.forward(relu(self.norm1.forward(x)));
        self.conv2.forward(relu(self.norm2.forward(x)))
    }
}

// ─── DenseBlock ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct DenseBlock<B: Backend> {
    pub layers: Vec<DenseLayer<B>>,
}

impl<B: Backend> DenseBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut features = x;
        for layer in &self.layers {
            let new_features = layer.forward(features.clone());
            features = Tensor::cat(vec![features, new_features], 1);
        }
        features
    }
}

// ─── Transition ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Transition<B: Backend> {
    pub norm: BatchNorm<B, 2>,
    pub conv: Conv2d<B>,
    pub pool: AvgPool2d,
}

impl<B: Backend> Transition<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        Self {
            norm: BatchNormConfig::new(in_channels).init(device),
            conv: Conv2dConfig::new([in_channels, out_channels], [1, 1])
                .with_bias(false)
                .init(device),
            pool: AvgPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.pool.forward(self.conv.forward(relu(self.norm.forward(x))))
    }
}

// ─── DenseFeatures ────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct DenseFeatures<B: Backend> {
    pub conv0: Conv2d<B>,
    pub norm0: BatchNorm<B, 2>,
    pub pool0: MaxPool2d,
    pub blocks: Vec<DenseBlock<B>>,
    pub transitions: Vec<Transition<B>>,
    pub norm5: BatchNorm<B, 2>,
}

impl<B: Backend> DenseFeatures<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.norm0.forward(self.conv0.forward(x)));
        let mut x = self.pool0.forward(x);

        for (i, block) in self.blocks.iter().enumerate() {
            x = block.forward(x);
            if let Some(transition) = self.transitions.get(i) {
                x = transition.forward(x);
            }
        }
        self.norm5.forward(x)
    }
}

// ─── DenseNet ─────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct DenseNet<B: Backend> {
    pub features: DenseFeatures<B>,
    pub avgpool: AdaptiveAvgPool2d,
    pub classifier: Linear<B>,
}

impl<B: Backend> DenseNet<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = relu(self.features.forward(x));
        let x = self.avgpool.forward(x).flatten::<2>(1, 3);
        self.classifier.forward(x)
    }

    /// Input width of the classifier (burn stores Linear weights as [in, out])
    pub fn num_features(&self) -> usize {
        self.classifier.weight.dims()[0]
    }

    /// Replace the classification layer with a fresh one.
    pub fn with_head(mut self, num_classes: usize, device: &B::Device) -> Self {
        self.classifier = LinearConfig::new(self.num_features(), num_classes).init(device);
        self
    }
}

impl<B: Backend> ImageClassifier<B> for DenseNet<B> {
    fn classify(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        self.forward(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_densenet169_feature_width() {
        let device = Default::default();
        let model = DenseNetConfig::densenet169(2).init::<TestBackend>(&device);
        assert_eq!(model.num_features(), 1664);
    }

    #[test]
    fn test_densenet121_output_shape() {
        let device = Default::default();
        let model = DenseNetConfig::densenet121(5).init::<TestBackend>(&device);
        assert_eq!(model.num_features(), 1024);
        assert_eq!(model.features.blocks.len(), 4);
        assert_eq!(model.features.transitions.len(), 3);

        let x = Tensor::<TestBackend, 4>::zeros([1, 3, 32, 32], &device);
        assert_eq!(model.forward(x).dims(), [1, 5]);
    }

    #[test]
    fn test_head_replacement_keeps_feature_width() {
        let device = Default::default();
        let model = DenseNetConfig::densenet121(1000)
            .init::<TestBackend>(&device)
            .with_head(4, &device);
        let x = Tensor::<TestBackend, 4>::zeros([1, 3, 32, 32], &device);
        assert_eq!(model.classify(x).dims(), [1, 4]);
    }

    #[test]
    fn test_key_remap_covers_every_layer() {
        let remap = DenseNetConfig::densenet169(1000).torchvision_key_remap();
        // legacy rename + 82 dense layers + 3 transitions
        assert_eq!(remap.len(), 1 + 6 + 12 + 32 + 32 + 3);
        assert!(remap.iter().any(|(_, to)| to == "features.blocks.3.layers.31."));
    }
}
