// ============================================================
// Layer 5: Training Loop
// ============================================================
// Fine-tunes an image classifier with Burn's DataLoader and Adam,
// keeping the weights of the epoch with the best validation
// accuracy.
//
// Per epoch:
//   train  - autodiff backend, forward + cross-entropy, backward,
//            one Adam step per batch
//   val    - model.valid() on the inner backend: no gradient
//            tracking, BatchNorm uses its running statistics
//
// Loss is accumulated as batch-mean loss * batch size, so the
// epoch loss is a per-sample mean even when the last batch is
// short.
//
// Burn notes:
//   - model.valid() returns the model on B::InnerBackend, so the
//     validation batcher is typed on the inner backend as well
//   - argmax(1) returns [batch, 1]; flatten before .equal()
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    backend::{wgpu::WgpuDevice, Autodiff, Wgpu},
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::{path::Path, sync::Arc, time::Instant};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    image_folder::ImageFolderDataset,
};
use crate::domain::{architecture::Architecture, history::TrainingHistory};
use crate::infra::{
    checkpoint::{ArtifactName, CheckpointManager},
    metrics::{EpochMetrics, MetricsLogger, PhaseStats},
};
use crate::ml::{
    classifier::{build_densenet, build_resnet, ImageClassifier, IMAGENET_CLASSES},
    densenet::DenseNetConfig,
    resnet::ResNetConfig,
};

type MyBackend = Autodiff<Wgpu>;

// ─── FitSettings ──────────────────────────────────────────────────────────────
/// Hyperparameters of one `fit` call.
#[derive(Debug, Clone)]
pub struct FitSettings {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Loader threads; 0 loads batches on the calling thread
    pub num_workers: usize,
    pub seed: u64,
    /// Square side length images are resized to
    pub input_size: usize,
}

impl FitSettings {
    pub fn new(cfg: &TrainConfig, seed: u64) -> Self {
        Self {
            epochs: cfg.epochs,
            batch_size: cfg.batch_size,
            learning_rate: cfg.lr,
            num_workers: cfg.num_workers,
            seed,
            input_size: cfg.architecture.input_size(),
        }
    }
}

// ─── BestSnapshot ─────────────────────────────────────────────────────────────
/// Holds the value that scored the highest accuracy so far.
///
/// Starts at 0.0 with the initial value. Only a strictly greater
/// accuracy replaces it, so on ties the earliest epoch wins.
pub struct BestSnapshot<T> {
    acc: f64,
    value: T,
}

impl<T> BestSnapshot<T> {
    pub fn new(initial: T) -> Self {
        Self { acc: 0.0, value: initial }
    }

    /// Replace the snapshot with `take()` if `acc` beats the best.
    pub fn offer(&mut self, acc: f64, take: impl FnOnce() -> T) -> bool {
        if acc > self.acc {
            self.acc = acc;
            self.value = take();
            true
        } else {
            false
        }
    }

    pub fn acc(&self) -> f64 {
        self.acc
    }

    pub fn into_inner(self) -> (T, f64) {
        (self.value, self.acc)
    }
}

pub struct FitOutcome<M> {
    /// Weights of the best validation epoch
    pub model: M,
    pub history: TrainingHistory,
    pub best_val_acc: f64,
}

// ─── Fit ──────────────────────────────────────────────────────────────────────
pub fn fit<B, M>(
    mut model: M,
    train_dataset: ImageFolderDataset,
    val_dataset: ImageFolderDataset,
    settings: &FitSettings,
    device: &B::Device,
    metrics: Option<&MetricsLogger>,
) -> Result<FitOutcome<M>>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + ImageClassifier<B>,
    M::InnerModule: ImageClassifier<B::InnerBackend>,
{
    if settings.batch_size == 0 {
        bail!("batch size must be at least 1");
    }

    let started = Instant::now();
    let train_len = train_dataset.len();
    let val_len = val_dataset.len();

    let mut optim = AdamConfig::new().init::<B, M>();
    let loss_fn = CrossEntropyLossConfig::new();

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_loader = build_loader(
        ImageBatcher::<B>::new(device.clone(), settings.input_size),
        train_dataset,
        settings,
    );
    let val_loader = build_loader(
        ImageBatcher::<B::InnerBackend>::new(device.clone(), settings.input_size),
        val_dataset,
        settings,
    );

    let mut history = TrainingHistory::new();
    let mut best = BestSnapshot::new(model.clone());

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 0..settings.epochs {
        println!("Epoch {}/{}", epoch, settings.epochs.saturating_sub(1));
        println!("{}", "-".repeat(10));

        // ── Training phase ────────────────────────────────────────────────────
        let mut running_loss = 0.0f64;
        let mut corrects = 0usize;

        for batch in train_loader.iter() {
            let batch_len = batch.targets.dims()[0];
            let logits = model.classify(batch.images);

            corrects += count_correct(logits.clone(), batch.targets.clone());
            let loss = loss_fn.init(&logits.device()).forward(logits, batch.targets);
            running_loss += loss.clone().into_scalar().elem::<f64>() * batch_len as f64;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(settings.learning_rate, model, grads);
        }

        let train = PhaseStats::from_running(running_loss, corrects, train_len);
        println!("train Loss: {:.4} Acc: {:.4}", train.loss, train.acc);

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let mut running_loss = 0.0f64;
        let mut corrects = 0usize;

        for batch in val_loader.iter() {
            let batch_len = batch.targets.dims()[0];
            let logits = model_valid.classify(batch.images);

            corrects += count_correct(logits.clone(), batch.targets.clone());
            let loss = loss_fn.init(&logits.device()).forward(logits, batch.targets);
            running_loss += loss.into_scalar().elem::<f64>() * batch_len as f64;
        }

        let val = PhaseStats::from_running(running_loss, corrects, val_len);
        println!("val Loss: {:.4} Acc: {:.4}", val.loss, val.acc);
        println!();

        history.train_acc.push(train.acc);
        history.val_acc.push(val.acc);

        if best.offer(val.acc, || model.clone()) {
            tracing::debug!("New best val accuracy {:.4} at epoch {}", val.acc, epoch);
        }

        if let Some(logger) = metrics {
            logger.log(&EpochMetrics::new(epoch, train, val))?;
        }
    }

    let elapsed = started.elapsed().as_secs();
    println!("Training complete in {}m {}s", elapsed / 60, elapsed % 60);
    println!("Best val Acc: {:.4}", best.acc());

    let (model, best_val_acc) = best.into_inner();
    Ok(FitOutcome { model, history, best_val_acc })
}

fn build_loader<B: Backend>(
    batcher: ImageBatcher<B>,
    dataset: ImageFolderDataset,
    settings: &FitSettings,
) -> Arc<dyn DataLoader<ImageBatch<B>>> {
    let builder = DataLoaderBuilder::new(batcher)
        .batch_size(settings.batch_size)
        .shuffle(settings.seed);

    // burn splits the dataset across workers, so zero workers means
    // the single-threaded loader rather than num_workers(0).
    if settings.num_workers > 0 {
        builder.num_workers(settings.num_workers).build(dataset)
    } else {
        builder.build(dataset)
    }
}

/// Number of rows whose argmax equals the target class.
fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    predicted
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}

// ─── Entry Point ──────────────────────────────────────────────────────────────
/// Build the configured backbone on the WGPU device, fit it and write
/// the best weights, the history and the metrics CSV to `store`.
pub fn run_training(
    cfg: &TrainConfig,
    seed: u64,
    train_dataset: ImageFolderDataset,
    val_dataset: ImageFolderDataset,
    store: &CheckpointManager,
) -> Result<TrainingHistory> {
    let device = WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);

    let arch = cfg.architecture;
    let num_classes = train_dataset.num_classes();
    let pretrained = cfg.pretrained.as_deref().map(Path::new);
    if pretrained.is_none() {
        tracing::warn!("No pretrained weights given, {} starts from random initialisation", arch);
    }

    let name = ArtifactName::new(arch, Path::new(&cfg.data_dir), cfg.epochs, cfg.batch_size);
    let metrics = MetricsLogger::new(store.dir(), &name.metrics_file())?;
    tracing::info!("Logging epoch metrics to '{}'", metrics.csv_path().display());
    let settings = FitSettings::new(cfg, seed);

    tracing::info!("Fine-tuning {} for {} classes", arch, num_classes);

    match arch {
        Architecture::ResNet18 => {
            let config = ResNetConfig::resnet18(IMAGENET_CLASSES);
            let model = build_resnet::<MyBackend>(arch, config, num_classes, pretrained, &device)?;
            fit_and_save(model, train_dataset, val_dataset, &settings, &device, &metrics, store, &name)
        }
        Architecture::ResNet34 => {
            let config = ResNetConfig::resnet34(IMAGENET_CLASSES);
            let model = build_resnet::<MyBackend>(arch, config, num_classes, pretrained, &device)?;
            fit_and_save(model, train_dataset, val_dataset, &settings, &device, &metrics, store, &name)
        }
        Architecture::DenseNet121 => {
            let config = DenseNetConfig::densenet121(IMAGENET_CLASSES);
            let model = build_densenet::<MyBackend>(arch, config, num_classes, pretrained, &device)?;
            fit_and_save(model, train_dataset, val_dataset, &settings, &device, &metrics, store, &name)
        }
        Architecture::DenseNet169 => {
            let config = DenseNetConfig::densenet169(IMAGENET_CLASSES);
            let model = build_densenet::<MyBackend>(arch, config, num_classes, pretrained, &device)?;
            fit_and_save(model, train_dataset, val_dataset, &settings, &device, &metrics, store, &name)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn fit_and_save<M>(
    model: M,
    train_dataset: ImageFolderDataset,
    val_dataset: ImageFolderDataset,
    settings: &FitSettings,
    device: &WgpuDevice,
    metrics: &MetricsLogger,
    store: &CheckpointManager,
    name: &ArtifactName,
) -> Result<TrainingHistory>
where
    M: AutodiffModule<MyBackend> + ImageClassifier<MyBackend>,
    M::InnerModule: ImageClassifier<Wgpu>,
{
    let outcome = fit::<MyBackend, M>(model, train_dataset, val_dataset, settings, device, Some(metrics))?;

    store.save_model::<MyBackend, M>(&outcome.model, name)?;
    store.save_history(&outcome.history, name)?;

    tracing::info!("Best val accuracy {:.4}", outcome.best_val_acc);
    Ok(outcome.history)
}
