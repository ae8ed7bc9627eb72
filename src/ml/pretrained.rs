// ============================================================
// Layer 5: Pretrained Weight Loading
// ============================================================
// Loads a torchvision state dict (.pth) into a burn record with
// burn-import's PyTorchFileRecorder.
//
// The recorder handles the layout differences on its own
// (Linear weights are transposed, BatchNorm weight/bias become
// gamma/beta). What it cannot guess is where a module lives in
// our tree, so each backbone supplies regex key remaps.
//
// Keys in the file with no counterpart (e.g. BatchNorm's
// num_batches_tracked) are ignored.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, Record, Recorder},
};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use std::path::Path;

pub fn load_torchvision_record<B, R>(
    path: &Path,
    key_remap: &[(String, String)],
    device: &B::Device,
) -> Result<R>
where
    B: Backend,
    R: Record<B>,
{
    let mut args = LoadArgs::new(path.to_path_buf());
    for (pattern, replacement) in key_remap {
        args = args.with_key_remap(pattern, replacement);
    }

    let recorder = PyTorchFileRecorder::<FullPrecisionSettings>::default();
    let record: R = Recorder::<B>::load(&recorder, args, device)
        .with_context(|| format!("Cannot load pretrained weights from '{}'", path.display()))?;

    tracing::debug!("Applied {} key remaps while loading '{}'", key_remap.len(), path.display());
    Ok(record)
}
