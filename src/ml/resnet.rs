// ============================================================
// Layer 5: ResNet-18 / ResNet-34
// ============================================================
// Basic-block residual networks (He et al. 2015), laid out with
// the same field names as torchvision so its state dicts map
// onto these modules with only the downsample branch renamed:
//
//   conv1 -> bn1 -> relu -> maxpool
//   layer1..layer4   (Vec<BasicBlock>, strides 1, 2, 2, 2)
//   avgpool -> flatten -> fc
//
// resnet18 = [2, 2, 2, 2] blocks, resnet34 = [3, 4, 6, 3].

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::classifier::ImageClassifier;

const STAGE_WIDTHS: [usize; 4] = [64, 128, 256, 512];

#[derive(Config, Debug)]
pub struct ResNetConfig {
    /// Basic blocks per stage
    pub blocks: [usize; 4],
    pub num_classes: usize,
}

impl ResNetConfig {
    pub fn resnet18(num_classes: usize) -> Self {
        Self::new([2, 2, 2, 2], num_classes)
    }

    pub fn resnet34(num_classes: usize) -> Self {
        Self::new([3, 4, 6, 3], num_classes)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNet<B> {
        let conv1 = Conv2dConfig::new([3, 64], [7, 7])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .with_bias(false)
            .init(device);
        let bn1 = BatchNormConfig::new(64).init(device);
        let maxpool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        let [w1, w2, w3, w4] = STAGE_WIDTHS;
        let layer1 = make_stage(64, w1, self.blocks[0], 1, device);
        let layer2 = make_stage(w1, w2, self.blocks[1], 2, device);
        let layer3 = make_stage(w2, w3, self.blocks[2], 2, device);
        let layer4 = make_stage(w3, w4, self.blocks[3], 2, device);

        ResNet {
            conv1,
            bn1,
            maxpool,
            layer1,
            layer2,
            layer3,
            layer4,
            avgpool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc: LinearConfig::new(w4, self.num_classes).init(device),
        }
    }

    /// Regex remaps from torchvision key names to this module tree.
    pub fn torchvision_key_remap(&self) -> Vec<(String, String)> {
        vec![
            (r"downsample\.0\.".to_string(), "downsample.conv.".to_string()),
            (r"downsample\.1\.".to_string(), "downsample.bn.".to_string()),
        ]
    }
}

fn make_stage<B: Backend>(
    in_channels: usize,
    out_channels: usize,
    count: usize,
    stride: usize,
    device: &B::Device,
) -> Vec<BasicBlock<B>> {
    (0..count)
        .map(|i| {
            if i == 0 {
                BasicBlock::new(in_channels, out_channels, stride, device)
            } else {
                BasicBlock::new(out_channels, out_channels, 1, device)
            }
        })
        .collect()
}

fn conv3x3<B: Backend>(in_c: usize, out_c: usize, stride: usize, device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new([in_c, out_c], [3, 3])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .with_bias(false)
        .init(device)
}

// ─── Downsample ───────────────────────────────────────────────────────────────
/// 1x1 projection on the shortcut when shape changes
#[derive(Module, Debug)]
pub struct Downsample<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn: BatchNorm<B, 2>,
}

impl<B: Backend> Downsample<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.bn.forward(self.conv.forward(x))
    }
}

// ─── BasicBlock ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    pub conv1: Conv2d<B>,
    pub bn1: BatchNorm<B, 2>,
    pub conv2: Conv2d<B>,
    pub bn2: BatchNorm<B, 2>,
    pub downsample: Option<Downsample<B>>,
}

impl<B: Backend> BasicBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        let downsample = (stride != 1 || in_channels != out_channels).then(|| Downsample {
            conv: Conv2dConfig::new([in_channels, out_channels], [1, 1])
                .with_stride([stride, stride])
                .with_bias(false)
                .init(device),
            bn: BatchNormConfig::new(out_channels).init(device),
        });

        Self {
            conv1: conv3x3(in_channels, out_channels, stride, device),
            bn1: BatchNormConfig::new(out_channels).init(device),
            conv2: conv3x3(out_channels, out_channels, 1, device),
            bn2: BatchNormConfig::new(out_channels).init(device),
            downsample,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = match &self.downsample {
            Some(d) => d.forward(x.clone()),
            None => x.clone(),
        };

        let out = relu(self.bn1.forward(self.conv1.forward(x)));
        let out = self.bn2.forward(self.conv2.forward(out));
        relu(out + identity)
    }
}

// ─── ResNet ───────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    pub conv1: Conv2d<B>,
    pub bn1: BatchNorm<B, 2>,
    pub maxpool: MaxPool2d,
    pub layer1: Vec<BasicBlock<B>>,
    pub layer2: Vec<BasicBlock<B>>,
    pub layer3: Vec<BasicBlock<B>>,
    pub layer4: Vec<BasicBlock<B>>,
    pub avgpool: AdaptiveAvgPool2d,
    pub fc: Linear<B>,
}

impl<B: Backend> ResNet<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = relu(self.bn1.forward(self.conv1.forward(x)));
        let mut x = self.maxpool.forward(x);

        for block in self
            .layer1
            .iter()
            .chain(&self.layer2)
            .chain(&self.layer3)
            .chain(&self.layer4)
        {
            x = block.forward(x);
        }

        let x = self.avgpool.forward(x).flatten::<2>(1, 3);
        self.fc.forward(x)
    }

    /// Replace the classification layer with a fresh one.
    pub fn with_head(mut self, num_classes: usize, device: &B::Device) -> Self {
        let in_features = STAGE_WIDTHS[3];
        self.fc = LinearConfig::new(in_features, num_classes).init(device);
        self
    }
}

impl<B: Backend> ImageClassifier<B> for ResNet<B> {
    fn classify(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        self.forward(images)
    }
}
