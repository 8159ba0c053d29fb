// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the parallel corpora   (Layer 4 - data)
//   Step 2: Load / build vocabularies   (Layer 6 - infra)
//   Step 3: Build tensor datasets       (Layer 4 - data)
//   Step 4: Wire checkpoints + metrics  (Layer 6 - infra)
//   Step 5: Arm the interrupt token     (Layer 6 - infra)
//   Step 6: Run the training loop       (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{dataset::TranslationDataset, loader::TextPairLoader};
use crate::domain::traits::ParallelCorpus;
use crate::infra::{
    checkpoint::CheckpointManager,
    interrupt::CancelToken,
    metrics_log::CsvMetricSink,
    vocab::{Vocab, VocabStore},
};
use crate::ml::model::RnnSpec;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Serialisable so a run's
// exact settings can be archived next to its checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:            String,
    pub src_train_filename:  String,
    pub tar_train_filename:  String,
    pub src_val_filename:    String,
    pub tar_val_filename:    String,
    pub checkpoint_dir:      String,
    pub seq_len:             usize,
    pub batch_size:          usize,
    pub epochs:              usize,
    pub lr:                  f64,
    pub embedding_dim:       usize,
    pub encoder_rnn_dim:     usize,
    pub encoder_n_layers:    usize,
    pub decoder_rnn_dim:     usize,
    pub decoder_n_layers:    usize,
    pub rnn_bias:            bool,
    pub vocab_size:          usize,
    pub learning_method:     String,
    pub train_log_interval:  usize,
    pub val_log_interval:    usize,
    pub checkpoint_interval: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:            "data".to_string(),
            src_train_filename:  "train.src".to_string(),
            tar_train_filename:  "train.tar".to_string(),
            src_val_filename:    "val.src".to_string(),
            tar_val_filename:    "val.tar".to_string(),
            checkpoint_dir:      "checkpoints".to_string(),
            seq_len:             50,
            batch_size:          64,
            epochs:              10,
            lr:                  1e-3,
            embedding_dim:       256,
            encoder_rnn_dim:     512,
            encoder_n_layers:    2,
            decoder_rnn_dim:     512,
            decoder_n_layers:    2,
            rnn_bias:            true,
            vocab_size:          10_000,
            learning_method:     "TeacherForcing".to_string(),
            train_log_interval:  10,
            val_log_interval:    100,
            checkpoint_interval: 200,
        }
    }
}

impl TrainConfig {
    /// Architecture spec for one side of the model, derived from the
    /// hyperparameters and the actual vocabulary it will embed.
    fn encoder_spec(&self, vocab: &Vocab) -> RnnSpec {
        RnnSpec {
            embedding_size: vocab.size(),
            embedding_dim:  self.embedding_dim,
            pad_id:         vocab.pad_id() as usize,
            rnn_dim:        self.encoder_rnn_dim,
            rnn_bias:       self.rnn_bias,
            n_layers:       self.encoder_n_layers,
        }
    }

    fn decoder_spec(&self, vocab: &Vocab) -> RnnSpec {
        RnnSpec {
            embedding_size: vocab.size(),
            embedding_dim:  self.embedding_dim,
            pad_id:         vocab.pad_id() as usize,
            rnn_dim:        self.decoder_rnn_dim,
            rnn_bias:       self.rnn_bias,
            n_layers:       self.decoder_n_layers,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;
        let data_dir = Path::new(&cfg.data_dir);
        let src_train = data_dir.join(&cfg.src_train_filename);
        let tar_train = data_dir.join(&cfg.tar_train_filename);
        let src_val = data_dir.join(&cfg.src_val_filename);
        let tar_val = data_dir.join(&cfg.tar_val_filename);

        // ── Step 1: Load the parallel corpora ─────────────────────────────────
        tracing::info!("Loading training corpus from '{}'", cfg.data_dir);
        let train_pairs = TextPairLoader::new(&src_train, &tar_train).load_all()?;
        let val_pairs = TextPairLoader::new(&src_val, &tar_val).load_all()?;

        // ── Step 2: Load / build the vocabularies ─────────────────────────────
        // Saved tokenizer artifacts are reused; a missing one is
        // rebuilt from the training corpus and saved for next time.
        let vocab_store = VocabStore::new(&cfg.checkpoint_dir, cfg.vocab_size);
        let (src_vocab, tar_vocab) = vocab_store.load_or_build(&src_train, &tar_train)?;
        tracing::info!(
            "Vocabularies ready: {} source words, {} target words",
            src_vocab.size(),
            tar_vocab.size()
        );

        // ── Step 3: Build the tensor datasets ─────────────────────────────────
        let train_dataset =
            TranslationDataset::from_pairs(&train_pairs, &src_vocab, &tar_vocab, cfg.seq_len)?;
        let val_dataset =
            TranslationDataset::from_pairs(&val_pairs, &src_vocab, &tar_vocab, cfg.seq_len)?;

        // ── Step 4: Checkpoints and the metrics file ──────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        let mut sink = CsvMetricSink::new(&cfg.checkpoint_dir)?;

        // ── Step 5: Arm the interrupt token ───────────────────────────────────
        // Ctrl-C sets the flag; the trainer checkpoints and stops at
        // the next batch boundary.
        let cancel = CancelToken::new();
        cancel.install_ctrlc_handler()?;

        // ── Step 6: Run the training loop (Layer 5) ───────────────────────────
        let outcome = run_training(
            cfg,
            train_dataset,
            val_dataset,
            cfg.encoder_spec(&src_vocab),
            cfg.decoder_spec(&tar_vocab),
            &src_vocab,
            &tar_vocab,
            &ckpt_manager,
            &mut sink,
            &cancel,
        )?;
        tracing::info!(
            "Run finished: {} steps, {} checkpoints in '{}'",
            outcome.steps_run,
            outcome.checkpoints_written,
            cfg.checkpoint_dir
        );
        Ok(())
    }
}
