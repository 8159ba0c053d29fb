// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`     — trains the model on a parallel corpus
//   2. `translate` — loads a checkpoint and translates sentences
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, TrainArgs, TranslateArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "rnn-translate",
    version = "0.1.0",
    about = "Train a GRU seq2seq translation model on a parallel corpus, then translate."
)]
pub struct Cli {
    /// The subcommand to run (train or translate)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => Self::run_train(args),
            Commands::Translate(args) => Self::run_translate(args),
        }
    }

    /// Handles the `train` subcommand.
    /// Converts CLI args into a TrainConfig and hands off to Layer 2.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on corpus in: {}", args.data_dir);
        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Training complete. Checkpoints saved.");
        Ok(())
    }

    /// Handles the `translate` subcommand.
    /// Restores the model from a checkpoint and prints translations.
    fn run_translate(args: TranslateArgs) -> Result<()> {
        use crate::application::translate_use_case::TranslateUseCase;

        let use_case =
            TranslateUseCase::new(args.checkpoint_dir.clone(), args.step, args.beam_width)?;

        if let Some(path) = &args.file {
            for line in use_case.translate_file(path)? {
                println!("{line}");
            }
            return Ok(());
        }

        let sentence = args
            .sentence
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("provide a sentence or --file"))?;

        match &args.reference {
            Some(reference) => {
                let (translated, bleu) = use_case.evaluate(sentence, reference)?;
                println!("Translation : {translated}");
                println!("BLEU Score  : {bleu:.6}");
            }
            None => {
                let translated = use_case.translate(sentence)?;
                println!("Translation : {translated}");
            }
        }
        Ok(())
    }
}
