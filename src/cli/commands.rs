// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `translate`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the translation model on a parallel corpus
    Train(TrainArgs),

    /// Translate sentences using a trained checkpoint
    Translate(TranslateArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing the corpus files
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Source-language training file (one sentence per line)
    #[arg(long, default_value = "train.src")]
    pub src_train: String,

    /// Target-language training file, line-aligned with the source
    #[arg(long, default_value = "train.tar")]
    pub tar_train: String,

    /// Source-language validation file
    #[arg(long, default_value = "val.src")]
    pub src_val: String,

    /// Target-language validation file
    #[arg(long, default_value = "val.tar")]
    pub tar_val: String,

    /// Directory for checkpoints, vocabularies and metrics.csv
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Fixed token length every sequence is padded/truncated to
    #[arg(long, default_value_t = 50)]
    pub seq_len: usize,

    /// Number of sentence pairs per forward pass
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Embedding vector width (both sides)
    #[arg(long, default_value_t = 256)]
    pub embedding_dim: usize,

    /// Hidden width of each encoder GRU layer
    #[arg(long, default_value_t = 512)]
    pub encoder_rnn_dim: usize,

    /// Number of stacked encoder GRU layers
    #[arg(long, default_value_t = 2)]
    pub encoder_n_layers: usize,

    /// Hidden width of each decoder GRU layer
    #[arg(long, default_value_t = 512)]
    pub decoder_rnn_dim: usize,

    /// Number of stacked decoder GRU layers
    #[arg(long, default_value_t = 2)]
    pub decoder_n_layers: usize,

    /// Maximum vocabulary size per language, special tokens included
    #[arg(long, default_value_t = 10000)]
    pub vocab_size: usize,

    /// Teacher-forcing strategy: TeacherForcing, ScheduledSampling
    /// or MixedSampling
    #[arg(long, default_value = "TeacherForcing")]
    pub learning_method: String,

    /// Emit a training metric event every N steps
    #[arg(long, default_value_t = 10)]
    pub train_log_interval: usize,

    /// Run a validation pass every N steps
    #[arg(long, default_value_t = 100)]
    pub val_log_interval: usize,

    /// Save a checkpoint every N steps
    #[arg(long, default_value_t = 200)]
    pub checkpoint_interval: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:            a.data_dir,
            src_train_filename:  a.src_train,
            tar_train_filename:  a.tar_train,
            src_val_filename:    a.src_val,
            tar_val_filename:    a.tar_val,
            checkpoint_dir:      a.checkpoint_dir,
            seq_len:             a.seq_len,
            batch_size:          a.batch_size,
            epochs:              a.epochs,
            lr:                  a.lr,
            embedding_dim:       a.embedding_dim,
            encoder_rnn_dim:     a.encoder_rnn_dim,
            encoder_n_layers:    a.encoder_n_layers,
            decoder_rnn_dim:     a.decoder_rnn_dim,
            decoder_n_layers:    a.decoder_n_layers,
            rnn_bias:            true,
            vocab_size:          a.vocab_size,
            learning_method:     a.learning_method,
            train_log_interval:  a.train_log_interval,
            val_log_interval:    a.val_log_interval,
            checkpoint_interval: a.checkpoint_interval,
        }
    }
}

/// All arguments for the `translate` command
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// The sentence to translate (omit when using --file)
    pub sentence: Option<String>,

    /// Translate every line of this file instead
    #[arg(long)]
    pub file: Option<String>,

    /// Reference translation — when given, the BLEU score is
    /// printed. Only meaningful for a single sentence.
    #[arg(long, conflicts_with = "file")]
    pub reference: Option<String>,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Checkpoint step to load (defaults to the most recent save)
    #[arg(long)]
    pub step: Option<usize>,

    /// Beam width for decoding; 1 means greedy
    #[arg(long, default_value_t = 1)]
    pub beam_width: usize,
}
