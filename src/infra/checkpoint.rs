// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists one durable record per save point, keyed by the
// zero-padded global step number:
//
//   checkpoints/
//     000200_model.mpk   ← model weights (CompactRecorder)
//     000200_optim.mpk   ← optimizer state (CompactRecorder)
//     000200_meta.json   ← epoch, steps, seq_len, encoder/decoder
//                          hyperparameter dictionaries
//     latest_step.json   ← step number of the most recent save
//
// A checkpoint is never mutated after write. The metadata carries
// everything needed to rebuild the exact model for inference, and
// together with the optimizer record it is sufficient to resume
// training (no resume driver ships here).
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Record, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::error::TranslateError;
use crate::ml::model::{RnnSpec, Seq2Seq};

// ─── CheckpointMeta ───────────────────────────────────────────────────────────
/// The JSON half of a checkpoint. serde(deny_unknown_fields) is not
/// used on purpose — forward-compatible extra fields are fine, but
/// every field listed here is required at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub epoch:   usize,
    pub steps:   usize,
    pub seq_len: usize,
    pub encoder_parameter: RnnSpec,
    pub decoder_parameter: RnnSpec,
}

impl CheckpointMeta {
    /// Reject a checkpoint whose architecture disagrees with the
    /// vocabularies the model is being rebuilt against.
    pub fn ensure_compatible(
        &self,
        src_vocab_size: usize,
        tar_vocab_size: usize,
    ) -> Result<(), TranslateError> {
        if self.encoder_parameter.embedding_size != src_vocab_size {
            return Err(TranslateError::CorruptCheckpoint(format!(
                "encoder vocabulary size {} does not match loaded source vocabulary size {}",
                self.encoder_parameter.embedding_size, src_vocab_size
            )));
        }
        if self.decoder_parameter.embedding_size != tar_vocab_size {
            return Err(TranslateError::CorruptCheckpoint(format!(
                "decoder vocabulary size {} does not match loaded target vocabulary size {}",
                self.decoder_parameter.embedding_size, tar_vocab_size
            )));
        }
        Ok(())
    }
}

// ─── CheckpointManager ────────────────────────────────────────────────────────
/// Saves and restores checkpoints in a single directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a manager, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    fn stem(&self, step: usize, suffix: &str) -> PathBuf {
        self.dir.join(format!("{step:06}_{suffix}"))
    }

    /// Persist model weights, optimizer state and metadata for one
    /// save point, then advance the latest-step pointer.
    pub fn save<B: Backend, R: Record<B>>(
        &self,
        model:            &Seq2Seq<B>,
        optimizer_record: R,
        meta:             &CheckpointMeta,
    ) -> Result<()> {
        let model_path = self.stem(meta.steps, "model");
        CompactRecorder::new()
            .record(model.clone().into_record(), model_path.clone())
            .with_context(|| format!("failed to save model to '{}'", model_path.display()))?;

        let optim_path = self.stem(meta.steps, "optim");
        CompactRecorder::new()
            .record(optimizer_record, optim_path.clone())
            .with_context(|| format!("failed to save optimizer to '{}'", optim_path.display()))?;

        let meta_path = self.stem(meta.steps, "meta.json");
        fs::write(&meta_path, serde_json::to_string_pretty(meta)?)
            .with_context(|| format!("failed to write '{}'", meta_path.display()))?;

        fs::write(
            self.dir.join("latest_step.json"),
            serde_json::to_string(&meta.steps)?,
        )
        .context("failed to write latest_step.json")?;

        tracing::info!("Checkpoint saved at step {} (epoch {})", meta.steps, meta.epoch);
        Ok(())
    }

    /// Read the metadata for one save point. Missing or malformed
    /// required fields surface as CorruptCheckpoint.
    pub fn load_meta(&self, step: usize) -> Result<CheckpointMeta> {
        let path = self.stem(step, "meta.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("cannot read checkpoint metadata '{}'", path.display()))?;
        let meta: CheckpointMeta = serde_json::from_str(&json).map_err(|e| {
            TranslateError::CorruptCheckpoint(format!(
                "'{}' is missing required fields: {e}",
                path.display()
            ))
        })?;
        Ok(meta)
    }

    /// Restore model weights from one save point into a freshly
    /// constructed model of the matching architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  Seq2Seq<B>,
        step:   usize,
        device: &B::Device,
    ) -> Result<Seq2Seq<B>> {
        let path = self.stem(step, "model");
        let record = CompactRecorder::new().load(path.clone(), device).map_err(|e| {
            TranslateError::CorruptCheckpoint(format!(
                "cannot load model record '{}': {e}",
                path.display()
            ))
        })?;
        Ok(model.load_record(record))
    }

    /// Restore the optimizer record from one save point. The caller
    /// feeds it to `Optimizer::load_record` on a freshly built
    /// optimizer of the matching type.
    pub fn load_optim<B: Backend, R: Record<B>>(
        &self,
        step:   usize,
        device: &B::Device,
    ) -> Result<R> {
        let path = self.stem(step, "optim");
        let record = CompactRecorder::new().load(path.clone(), device).map_err(|e| {
            TranslateError::CorruptCheckpoint(format!(
                "cannot load optimizer record '{}': {e}",
                path.display()
            ))
        })?;
        Ok(record)
    }

    /// Step number of the most recent save, from latest_step.json.
    pub fn latest_step(&self) -> Result<usize> {
        let path = self.dir.join("latest_step.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "cannot read '{}' — has a training run saved a checkpoint yet?",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}
